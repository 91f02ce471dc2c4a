//! Catalog stock endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{ItemId, Money};
use serde::{Deserialize, Serialize};
use store::{InventoryLedger, Item, Store};

use super::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct UpsertItemRequest {
    pub stock: u32,
    pub price_cents: i64,
}

#[derive(Serialize)]
pub struct ItemResponse {
    pub id: String,
    pub stock: u32,
    pub price_cents: i64,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self {
            id: item.id.to_string(),
            stock: item.stock,
            price_cents: item.price.cents(),
        }
    }
}

/// PUT /items/{id}: create an item or overwrite its stock and price.
#[tracing::instrument(skip(state, req))]
pub async fn upsert<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpsertItemRequest>,
) -> Result<Json<ItemResponse>, ApiError> {
    if req.price_cents < 0 {
        return Err(ApiError::BadRequest("price_cents must not be negative".to_string()));
    }

    let item = Item::new(id, req.stock, Money::from_cents(req.price_cents));
    state.store.upsert_item(item.clone()).await?;
    tracing::info!(item_id = %item.id, stock = item.stock, "item stocked");

    Ok(Json(item.into()))
}

/// GET /items/{id}: current stock and price.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ItemResponse>, ApiError> {
    let item = state
        .store
        .get_item(&ItemId::new(id.as_str()))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Item {id} not found")))?;

    Ok(Json(item.into()))
}
