//! # Order Service Library
//!
//! The Order domain on top of the shard framework. Exposed as a library so the binary,
//! the HTTP tests and the integration tests share one wiring.

pub mod clients;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod model;
pub mod order_actor;
