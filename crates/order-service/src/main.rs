//! # Order Service
//!
//! Restaurant orders as sharded entities behind an HTTP gateway.
//!
//! ## Core Components
//!
//! - **[shard_framework]**: Entity runtime, shard router, region and rebalancing.
//! - **[model]**: Pure data structures ([`Order`](order_service::model::Order), `Server`, `Table`, `OrderItem`).
//! - **[order_actor]**: What `Open`, `AddItem` and `Get` mean for one order.
//! - **[clients]**: [`OrderClient`](order_service::clients::OrderClient), the ask-with-timeout gateway adapter.
//! - **[http]**: The axum routes.
//! - **[lifecycle]**: [`OrderSystem`], wiring and graceful shutdown.
//!
//! ## Quick Start
//!
//! ```bash
//! RUST_LOG=info cargo run -p order-service -- --max-shards 30 --http-port 8080
//!
//! curl -X POST localhost:8080/order \
//!   -H 'content-type: application/json' \
//!   -d '{"server":{"name":"Alice"},"table":{"number":4}}'
//! ```
//!
//! [model]: order_service::model
//! [order_actor]: order_service::order_actor
//! [clients]: order_service::clients
//! [http]: order_service::http
//! [lifecycle]: order_service::lifecycle

use anyhow::Context;
use clap::Parser;
use order_service::config::Settings;
use order_service::http;
use order_service::lifecycle::OrderSystem;
use shard_framework::tracing::setup_tracing;
use tokio::net::TcpListener;
use tracing::{info, info_span, Instrument};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup tracing once for the entire application
    setup_tracing();

    let settings = Settings::parse();
    settings.validate().context("invalid settings")?;
    info!(?settings, "Starting order service");

    let system = OrderSystem::new(&settings).context("failed to build order system")?;
    let app = http::router(system.order_client.clone());

    let addr = settings.http_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    info!(%addr, "Listening");

    async {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
    .instrument(info_span!("http"))
    .await
    .context("http server failure")?;

    system.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
