use std::time::Duration;

use pretty_assertions::assert_eq;
use replicant_client::{CallFlags, DRIVER_THREAD_NAME, Error, Operation};

use crate::common;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn close_fails_outstanding_requests() {
	let cluster = common::cluster();
	let (client, mut errors) = common::open(&cluster);
	cluster.pause();

	let mut waits = Vec::new();
	for _ in 0..32 {
		let client = client.clone();
		waits.push(tokio::spawn(async move { client.call("echo", "echo", b"x", CallFlags::empty()).await }));
	}
	tokio::time::timeout(Duration::from_secs(5), async {
		while client.outstanding() < 32 {
			tokio::time::sleep(Duration::from_millis(1)).await;
		}
	})
	.await
	.expect("all calls should be submitted");

	client.close();
	for wait in waits {
		let result = tokio::time::timeout(Duration::from_secs(5), wait).await.expect("waiter released").unwrap();
		assert!(matches!(result, Err(Error::Destroyed)), "{result:?}");
	}

	assert!(client.is_closed());
	assert_eq!(client.outstanding(), 0);
	assert_eq!(cluster.released_transports(), 1);
	assert!(errors.recv().await.is_none());
}

#[tokio::test]
async fn close_is_idempotent_and_later_calls_fail() {
	let cluster = common::cluster();
	let (client, _errors) = common::open(&cluster);
	let other = client.clone();

	client.close();
	other.close();
	client.close();
	assert_eq!(cluster.released_transports(), 1);

	assert!(matches!(other.poke().await, Err(Error::Closed)));
	assert!(matches!(client.submit(Operation::ListObjects), Err(Error::Closed)));
}

#[tokio::test]
async fn submitted_ticket_fails_after_close() {
	let cluster = common::cluster();
	let (client, _errors) = common::open(&cluster);
	cluster.pause();

	let ticket = client.submit(Operation::Poke).unwrap();
	client.close();
	assert!(matches!(ticket.wait().await, Err(Error::Destroyed)));
}

#[test]
fn dropping_last_clone_releases_transport() {
	let cluster = common::cluster();
	let (client, mut errors) = common::open(&cluster);
	let other = client.clone();

	drop(client);
	assert_eq!(cluster.released_transports(), 0);
	other.blocking().poke().unwrap();

	drop(other);
	assert_eq!(cluster.released_transports(), 1);
	assert!(errors.blocking_recv().is_none());
}

#[test]
fn close_from_another_thread_wakes_blocking_waiters() {
	let cluster = common::cluster();
	let (client, _errors) = common::open(&cluster);
	cluster.pause();

	let waiter = {
		let client = client.clone();
		std::thread::spawn(move || client.blocking().call("echo", "echo", b"x", CallFlags::empty()))
	};
	while client.outstanding() == 0 {
		std::thread::sleep(Duration::from_millis(1));
	}
	client.close();
	assert!(matches!(waiter.join().unwrap(), Err(Error::Destroyed)));
}

#[test]
fn driver_runs_on_a_named_thread() {
	let cluster = common::cluster();
	let (client, _errors) = common::open(&cluster);
	assert!(format!("{client:?}").contains(DRIVER_THREAD_NAME));
	client.close();
}
