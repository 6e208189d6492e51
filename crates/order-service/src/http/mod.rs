//! # HTTP Gateway
//!
//! A thin axum shim over [`OrderClient`]:
//!
//! | Route | Command | Success |
//! |-------|---------|---------|
//! | `POST /order` | `Open` | 200 + order |
//! | `POST /order/:id/items` | `AddItem` | 200 + order |
//! | `GET /order/:id` | `Get` | 200 + order |
//!
//! `NotFound` maps to 404 and every other failure to 500, both with an [`ErrorBody`].
//! Request bodies that do not deserialize are rejected by axum before reaching an order.

pub mod error;

pub use error::{ApiError, ErrorBody, ErrorKind};

use crate::clients::OrderClient;
use crate::model::{Order, OrderId};
use crate::order_actor::{AddItemToOrder, OpenOrder};
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::debug;

pub fn router(client: OrderClient) -> Router {
    Router::new()
        .route("/order", post(open_order))
        .route("/order/:id", get(find_order))
        .route("/order/:id/items", post(add_item))
        .with_state(client)
}

async fn open_order(
    State(client): State<OrderClient>,
    Json(open): Json<OpenOrder>,
) -> Result<Json<Order>, ApiError> {
    let id = OrderId::new();
    debug!(%id, "POST /order");
    client
        .open_order_with_id(id, open)
        .await
        .map(Json)
        .map_err(|e| ApiError::for_order(e, id))
}

async fn add_item(
    State(client): State<OrderClient>,
    Path(raw_id): Path<String>,
    Json(body): Json<AddItemToOrder>,
) -> Result<Json<Order>, ApiError> {
    let id = parse_id(&raw_id)?;
    client
        .add_item(id, body.item)
        .await
        .map(Json)
        .map_err(|e| ApiError::for_order(e, id))
}

async fn find_order(
    State(client): State<OrderClient>,
    Path(raw_id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let id = parse_id(&raw_id)?;
    client
        .find_order(id)
        .await
        .map(Json)
        .map_err(|e| ApiError::for_order(e, id))
}

fn parse_id(raw: &str) -> Result<OrderId, ApiError> {
    OrderId::parse(raw).map_err(|e| ApiError::invalid_id(raw, &e))
}
