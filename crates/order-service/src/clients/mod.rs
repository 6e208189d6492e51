//! Typed gateway clients.
//!
//! A client hides envelopes and reply variants behind intention-revealing methods.

pub mod order_client;

pub use order_client::OrderClient;
