use std::time::Duration;

use pretty_assertions::assert_eq;
use replicant_client::{ClientConfig, RequestId, Status};

use crate::common;

#[tokio::test]
async fn transport_failure_reaches_the_stream() {
	let cluster = common::cluster();
	let (client, mut errors) = common::open(&cluster);

	cluster.inject_failure(Status::CommFailed, "lost contact with server");
	let err = tokio::time::timeout(Duration::from_secs(5), errors.recv()).await.unwrap().unwrap();
	assert_eq!(err.status, Status::CommFailed);
	assert_eq!(err.message, "lost contact with server");

	client.poke().await.unwrap();
	client.close();
}

#[tokio::test]
async fn stray_completion_is_reported_as_internal() {
	let cluster = common::cluster();
	let (client, mut errors) = common::open(&cluster);

	cluster.inject_stray_completion(RequestId(4242));
	let err = tokio::time::timeout(Duration::from_secs(5), errors.recv()).await.unwrap().unwrap();
	assert_eq!(err.status, Status::Internal);
	assert!(err.message.contains("req#4242"), "{}", err.message);
	assert_eq!(client.outstanding(), 0);
	client.close();
}

#[tokio::test]
async fn idle_statuses_are_not_reported() {
	let cluster = common::cluster();
	let (client, mut errors) = common::open(&cluster);

	cluster.pause();
	let ticket = client.submit(replicant_client::Operation::Poke).unwrap();
	tokio::time::sleep(common::POLL * 5).await;
	cluster.resume();
	ticket.wait().await.unwrap();

	assert!(errors.try_recv().is_none());
	client.close();
	assert!(errors.recv().await.is_none());
}

#[tokio::test]
async fn full_stream_drops_newest_errors() {
	let cluster = common::cluster();
	let config = ClientConfig::default().poll_timeout(common::POLL).error_capacity(2);
	let (client, mut errors) = replicant_client::Client::open(&config, &cluster).unwrap();

	for n in 0..5 {
		cluster.inject_failure(Status::CommFailed, format!("failure {n}"));
	}
	// A completed poke proves the driver has moved past every failure.
	client.poke().await.unwrap();

	let first = errors.try_recv().unwrap();
	let second = errors.try_recv().unwrap();
	assert_eq!((first.message.as_str(), second.message.as_str()), ("failure 0", "failure 1"));
	assert!(errors.try_recv().is_none());
	client.close();
}
