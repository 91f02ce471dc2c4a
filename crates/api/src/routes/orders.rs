//! Order placement, lookup and fulfillment endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::CustomerIdentity;
use domain::{Order, PlaceOrder, UpdateFulfillmentStatus};
use serde::{Deserialize, Serialize};
use store::Store;

use super::{AppState, parse_order_id};
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub item_id: String,
    pub quantity: u32,
    pub email: String,
}

#[derive(Deserialize)]
pub struct ListOrdersQuery {
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub item_id: String,
    pub quantity: u32,
    pub email: String,
    pub status: String,
    pub payment_status: String,
    pub created_at: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.to_string(),
            item_id: order.item_id.to_string(),
            quantity: order.quantity,
            email: order.customer.to_string(),
            status: order.fulfillment_status.to_string(),
            payment_status: order.payment_status.to_string(),
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /orders: reserve stock and record a pending, unpaid order.
#[tracing::instrument(skip(state, req), fields(item_id = %req.item_id, quantity = req.quantity))]
pub async fn place<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    if req.email.trim().is_empty() {
        return Err(ApiError::BadRequest("email is required".to_string()));
    }

    let order = state
        .order_service
        .place_order(PlaceOrder::new(req.item_id, req.quantity, req.email))
        .await?;

    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders/{id}: load one order.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .order_service
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;

    Ok(Json(order.into()))
}

/// GET /orders?email=...: list a customer's orders, oldest first.
#[tracing::instrument(skip(state, query))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let email = query
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("email query parameter is required".to_string()))?;

    let orders = state
        .order_service
        .orders_for_customer(&CustomerIdentity::new(email))
        .await?;

    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// PATCH /orders/{id}: set the fulfillment status.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let cmd = UpdateFulfillmentStatus::parse(order_id, &req.status)
        .map_err(domain::DomainError::from)?;

    let order = state.order_service.update_fulfillment_status(cmd).await?;
    Ok(Json(order.into()))
}
