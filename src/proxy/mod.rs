//! Reverse proxy functionality
//!
//! This module implements the core proxy logic: the fixed backend pool
//! with its round-robin selection cursor, and the per-request forwarder.

pub mod backend;
pub mod forwarder;

pub use backend::{Backend, BackendPool};
pub use forwarder::ProxyHandler;
