//! Rotor - Round-Robin Reverse Proxy
//!
//! Core library: HTTP handling, backend selection, and request forwarding.

pub mod config;
pub mod http;
pub mod monitor;
pub mod proxy;
pub mod server;
