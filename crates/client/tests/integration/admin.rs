use pretty_assertions::assert_eq;
use replicant_client::{CallFlags, Status};

use crate::common::{self, COUNTER_LIBRARY};

#[tokio::test]
async fn object_lifecycle() {
	let cluster = common::cluster();
	let (client, _errors) = common::open(&cluster);

	client.new_object("c", COUNTER_LIBRARY).await.unwrap();
	assert_eq!(client.list_objects().await.unwrap(), vec!["c".to_string(), "echo".to_string()]);

	for _ in 0..3 {
		client.call("c", "incr", b"", CallFlags::ROBUST).await.unwrap();
	}
	let backup = client.backup_object("c").await.unwrap();

	client.del_object("c").await.unwrap();
	let err = client.call("c", "get", b"", CallFlags::empty()).await.unwrap_err();
	assert_eq!(err.status(), Some(Status::ObjNotFound));

	client.restore_object("c2", &backup).await.unwrap();
	let total = client.call("c2", "get", b"", CallFlags::empty()).await.unwrap();
	assert_eq!(common::decode(&total), 3);
	assert_eq!(cluster.object_names(), vec!["c2".to_string(), "echo".to_string()]);
	client.close();
}

#[tokio::test]
async fn admin_failures_keep_their_status() {
	let cluster = common::cluster();
	let (client, _errors) = common::open(&cluster);

	let err = client.new_object("echo", COUNTER_LIBRARY).await.unwrap_err();
	assert_eq!(err.status(), Some(Status::ObjExist));

	let err = client.new_object("x", "libmissing.so").await.unwrap_err();
	assert_eq!(err.status(), Some(Status::ServerError));

	let err = client.del_object("nobody").await.unwrap_err();
	assert_eq!(err.status(), Some(Status::ObjNotFound));

	let err = client.call("echo", "missing", b"", CallFlags::empty()).await.unwrap_err();
	assert_eq!(err.status(), Some(Status::FuncNotFound));

	let mut bad = COUNTER_LIBRARY.as_bytes().to_vec();
	bad.push(0);
	bad.extend_from_slice(b"short");
	let err = client.restore_object("y", &bad).await.unwrap_err();
	assert_eq!(err.status(), Some(Status::ServerError));
	client.close();
}

#[tokio::test]
async fn killed_object_is_repaired_with_its_state() {
	let cluster = common::cluster().with_object("c", COUNTER_LIBRARY);
	let (client, _errors) = common::open(&cluster);

	for _ in 0..2 {
		client.call("c", "incr", b"", CallFlags::empty()).await.unwrap();
	}
	client.kill_object("c").await.unwrap();

	let total = client.call("c", "incr", b"", CallFlags::empty()).await.unwrap();
	assert_eq!(common::decode(&total), 3);
	assert_eq!(cluster.object_names(), vec!["c".to_string(), "echo".to_string()]);
	client.close();
}

#[tokio::test]
async fn killing_a_missing_object_is_obj_not_found() {
	let cluster = common::cluster();
	let (client, _errors) = common::open(&cluster);

	let err = client.kill_object("ghost").await.unwrap_err();
	assert_eq!(err.status(), Some(Status::ObjNotFound));
	assert_eq!(client.outstanding(), 0);
	client.close();
}

#[test]
fn blocking_kill_object() {
	let cluster = common::cluster();
	let (client, _errors) = common::open(&cluster);

	client.blocking().kill_object("echo").unwrap();
	let out = client.blocking().call("echo", "echo", b"still here", CallFlags::empty()).unwrap();
	assert_eq!(out, b"still here");
	assert_eq!(client.blocking().kill_object("ghost").unwrap_err().status(), Some(Status::ObjNotFound));
	client.close();
}
