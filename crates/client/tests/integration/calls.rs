use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use replicant_client::memory::{CompletionOrder, MemoryCluster};
use replicant_client::{CallFlags, Client, ClientConfig, Error, Operation, Status};

use crate::common::{self, COUNTER_LIBRARY};

#[tokio::test]
async fn echo_returns_input() {
	let cluster = common::cluster();
	let (client, _errors) = common::open(&cluster);

	let out = client.call("echo", "echo", b"hello world", CallFlags::empty()).await.unwrap();
	assert_eq!(out, b"hello world");
	assert_eq!(client.outstanding(), 0);
	client.close();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_each_get_their_own_result() {
	let cluster = common::cluster().with_order(CompletionOrder::Lifo);
	let (client, _errors) = common::open(&cluster);

	let mut tasks = Vec::new();
	for i in 0u32..1000 {
		let client = client.clone();
		tasks.push(tokio::spawn(async move {
			let input = i.to_le_bytes();
			let out = client.call("echo", "echo", &input, CallFlags::IDEMPOTENT).await.unwrap();
			assert_eq!(out, input);
		}));
	}
	for task in tasks {
		task.await.unwrap();
	}
	assert_eq!(client.outstanding(), 0);
	client.close();
}

#[tokio::test]
async fn failed_call_reports_status_message_and_location() {
	let cluster = common::cluster();
	let (client, _errors) = common::open(&cluster);

	let err = client.call("missing", "echo", b"", CallFlags::empty()).await.unwrap_err();
	match err {
		Error::Status(err) => {
			assert_eq!(err.status, Status::ObjNotFound);
			assert_eq!(err.message, "object \"missing\" not found");
			assert!(!err.location.is_empty());
		}
		other => panic!("expected a status error, got {other:?}"),
	}
	client.close();
}

#[tokio::test]
async fn rejected_submission_fails_immediately() {
	let cluster = common::cluster();
	let (client, mut errors) = common::open(&cluster);
	cluster.reject_submissions(Some(Status::CommFailed));

	let err = client.poke().await.unwrap_err();
	assert_eq!(err.status(), Some(Status::CommFailed));
	assert_eq!(client.outstanding(), 0);

	cluster.reject_submissions(None);
	client.poke().await.unwrap();
	assert!(errors.try_recv().is_none());
	client.close();
}

#[tokio::test]
async fn unique_numbers_are_distinct() {
	let cluster = common::cluster();
	let (client, _errors) = common::open(&cluster);

	let mut seen = HashSet::new();
	for _ in 0..100 {
		assert!(seen.insert(client.generate_unique_number().await.unwrap()));
	}
	client.close();
}

#[tokio::test]
async fn tickets_resolve_independently() {
	let cluster = common::cluster().with_object("c", COUNTER_LIBRARY);
	let (client, _errors) = common::open(&cluster);

	let first = client.submit(Operation::Poke).unwrap();
	let second = client.submit(Operation::GenerateUniqueNumber).unwrap();
	assert_ne!(first.id(), second.id());

	let second = second.wait().await.unwrap();
	let first = first.wait().await.unwrap();
	assert_eq!(first.status, Status::Success);
	assert!(matches!(second.into_output(), Ok(replicant_client::Output::Number(_))));
	client.close();
}

#[tokio::test]
async fn abandoned_ticket_does_not_block_others() {
	let cluster = common::cluster();
	let (client, _errors) = common::open(&cluster);

	drop(client.submit(Operation::Poke).unwrap());
	client.poke().await.unwrap();
	tokio::time::timeout(Duration::from_secs(5), async {
		while client.outstanding() > 0 {
			tokio::time::sleep(Duration::from_millis(5)).await;
		}
	})
	.await
	.expect("abandoned entry should still be drained");
	client.close();
}

#[test]
fn blocking_calls_from_many_threads() {
	let cluster = common::cluster().with_object("c", COUNTER_LIBRARY);
	let (client, _errors) = common::open(&cluster);
	let client = Arc::new(client);

	let threads: Vec<_> = (0..8)
		.map(|_| {
			let client = Arc::clone(&client);
			std::thread::spawn(move || {
				for _ in 0..25 {
					client.blocking().call("c", "incr", b"", CallFlags::empty()).unwrap();
				}
			})
		})
		.collect();
	for thread in threads {
		thread.join().unwrap();
	}

	let total = client.blocking().call("c", "get", b"", CallFlags::empty()).unwrap();
	assert_eq!(common::decode(&total), 200);
	assert_eq!(client.outstanding(), 0);
	client.close();
}

#[test]
fn open_rejects_bad_configuration() {
	let cluster = MemoryCluster::new();

	let err = Client::open(&ClientConfig::new("host:notaport"), &cluster).unwrap_err();
	assert!(matches!(err, Error::InvalidConnection { .. }), "{err:?}");

	let err = Client::open(&ClientConfig::default().poll_timeout(Duration::ZERO), &cluster).unwrap_err();
	assert!(matches!(err, Error::Config(_)), "{err:?}");

	cluster.refuse_connections(Some(Status::CommFailed));
	let err = Client::open(&common::config(), &cluster).unwrap_err();
	assert!(matches!(err, Error::Connect(_)), "{err:?}");
	assert_eq!(err.status(), Some(Status::CommFailed));
	assert_eq!(cluster.released_transports(), 0);
}

#[test]
fn connection_reports_bootstrap_servers() {
	let cluster = MemoryCluster::new();
	let config = ClientConfig::new("10.0.0.1:2000, [::1]").poll_timeout(common::POLL);
	let (client, _errors) = Client::open(&config, &cluster).unwrap();

	assert_eq!(client.connection().to_string(), "10.0.0.1:2000,[::1]:1982");
	assert_eq!(client.connection().hosts().len(), 2);
	client.close();
	assert_eq!(client.connection().hosts()[0].port, 2000);
}
