//! Checkout session and payment confirmation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{Currency, CustomerIdentity, Money, SessionRef};
use payments::{PaymentError, ReconciliationOutcome, StartCheckout};
use serde::{Deserialize, Serialize};
use store::Store;

use super::{AppState, parse_order_id};
use crate::error::ApiError;

/// A major-unit amount given either as a JSON number or a decimal string.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(serde_json::Number),
    Text(String),
}

impl AmountInput {
    fn to_money(&self) -> Result<Money, PaymentError> {
        let text = match self {
            AmountInput::Number(n) => n.to_string(),
            AmountInput::Text(s) => s.clone(),
        };
        Money::parse_decimal(&text).map_err(|e| PaymentError::InvalidAmount(e.to_string()))
    }
}

#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub order_id: String,
    pub amount: AmountInput,
    pub email: String,
    pub description: String,
    pub currency: Option<String>,
}

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
}

#[derive(Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConfirmResponse {
    Recorded {
        order_id: String,
        transaction_id: String,
        amount: String,
        currency: String,
    },
    AlreadyRecorded {
        order_id: String,
        transaction_id: String,
    },
    NotPaid {
        status: String,
    },
}

impl From<ReconciliationOutcome> for ConfirmResponse {
    fn from(outcome: ReconciliationOutcome) -> Self {
        match outcome {
            ReconciliationOutcome::Recorded {
                order_id,
                transaction_id,
                amount,
                currency,
            } => ConfirmResponse::Recorded {
                order_id: order_id.to_string(),
                transaction_id: transaction_id.to_string(),
                amount: amount.to_string(),
                currency: currency.to_string(),
            },
            ReconciliationOutcome::AlreadyRecorded {
                order_id,
                transaction_id,
            } => ConfirmResponse::AlreadyRecorded {
                order_id: order_id.to_string(),
                transaction_id: transaction_id.to_string(),
            },
            ReconciliationOutcome::NotPaid { status } => ConfirmResponse::NotPaid {
                status: status.to_string(),
            },
        }
    }
}

/// POST /checkout-sessions: open a hosted checkout session for an order.
#[tracing::instrument(skip(state, req), fields(order_id = %req.order_id))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ApiError> {
    let order_id = parse_order_id(&req.order_id)?;
    if req.email.trim().is_empty() {
        return Err(ApiError::BadRequest("email is required".to_string()));
    }
    let currency = match req.currency.as_deref() {
        Some(code) => Currency::parse(code).map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => state.currency.clone(),
    };

    let session = state
        .reconciler
        .start_checkout(StartCheckout {
            order_id,
            amount: req.amount.to_money()?,
            currency,
            customer: CustomerIdentity::new(req.email),
            description: req.description,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            session_id: session.session_id.to_string(),
            url: session.redirect_url,
        }),
    ))
}

/// POST /checkout-sessions/{session_id}/confirm: apply a paid session.
///
/// Safe to repeat; replays answer `already_recorded`.
#[tracing::instrument(skip(state))]
pub async fn confirm<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(session_id): Path<String>,
) -> Result<Json<ConfirmResponse>, ApiError> {
    let outcome = state
        .reconciler
        .confirm(&SessionRef::new(session_id))
        .await?;

    Ok(Json(outcome.into()))
}
