//! Unit tests for the skiff CLI
//!
//! These tests use in-memory fakes and run fast without external I/O.

mod helpers;
mod resolve_request;
mod workload_list_service;
