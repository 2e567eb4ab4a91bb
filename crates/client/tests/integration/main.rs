#![allow(unused_crate_dependencies)]
//! End-to-end tests for the client against the in-process cluster.

mod admin;
mod calls;
mod common;
mod teardown;
mod unsolicited;
