//! # Observability
//!
//! Structured logging for every runtime, region and repository call.
//!
//! Log lines carry `entity_type` and the entity `id` as fields instead of relying on the
//! module path, so the target is hidden and the compact format is used.
//!
//! ```bash
//! # Lifecycle only: started, loaded, persisted, passivated
//! RUST_LOG=info cargo run
//!
//! # Every command, find and update with payloads
//! RUST_LOG=debug cargo run
//!
//! # Just the framework
//! RUST_LOG=shard_framework=debug cargo run
//! ```
//!
//! A write under `RUST_LOG=info` looks like:
//!
//! ```text
//! INFO Entity started entity_type="Order" id=4b1c...
//! INFO Loaded entity_type="Order" id=4b1c... found=false stashed=1
//! INFO Persisted entity_type="Order" id=4b1c... stashed=0
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // entity_type and id identify the source
        .compact()
        .init();
}
