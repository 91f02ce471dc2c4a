//! Reqwest-backed Stripe Checkout adapter.
//!
//! This adapter owns transport details only: form encoding of the session
//! request, HTTP error mapping, and JSON decoding into gateway sessions.

use std::collections::HashMap;

use async_trait::async_trait;
use common::{Currency, Money, SessionRef, TransactionId};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{
    CreatedSession, GatewayError, GatewaySession, PaymentGateway, SessionRequest, SessionStatus,
};

const DEFAULT_API_BASE: &str = "https://api.stripe.com";
const SESSIONS_PATH: &str = "/v1/checkout/sessions";

/// Credentials and endpoint for the Stripe API.
#[derive(Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub api_base: String,
}

impl StripeConfig {
    /// Creates a config against the public Stripe API.
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Overrides the API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Stripe Checkout gateway.
///
/// Requests carry no client-side timeout and are never retried here.
pub struct StripeGateway {
    client: Client,
    sessions_url: String,
    secret_key: String,
}

impl StripeGateway {
    /// Builds a gateway with its own reqwest client.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: StripeConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            sessions_url: format!("{}{SESSIONS_PATH}", config.api_base.trim_end_matches('/')),
            secret_key: config.secret_key,
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[tracing::instrument(skip(self, request), fields(order_id = %request.metadata.order_id))]
    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<CreatedSession, GatewayError> {
        let response = self
            .client
            .post(&self.sessions_url)
            .bearer_auth(&self.secret_key)
            .form(&session_form(request))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref(), None));
        }

        let dto: SessionDto = decode(body.as_ref())?;
        let redirect_url = dto
            .url
            .ok_or_else(|| GatewayError::Decode("session has no redirect url".to_string()))?;
        Ok(CreatedSession {
            session_id: SessionRef::new(dto.id),
            redirect_url,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn get_session(&self, session_id: &SessionRef) -> Result<GatewaySession, GatewayError> {
        // The id lands in the URL path, so anything but a plain token is unknown.
        if !is_valid_session_id(session_id.as_str()) {
            return Err(GatewayError::SessionNotFound(session_id.clone()));
        }

        let response = self
            .client
            .get(format!("{}/{}", self.sessions_url, session_id))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref(), Some(session_id)));
        }

        decode::<SessionDto>(body.as_ref())?.into_session()
    }
}

fn session_form(request: &SessionRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        (
            "line_items[0][price_data][currency]".to_string(),
            request.currency.to_string(),
        ),
        (
            "line_items[0][price_data][unit_amount]".to_string(),
            request.amount.cents().to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            request.metadata.description.clone(),
        ),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        ("customer_email".to_string(), request.customer.to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
    ];

    let mut metadata: Vec<_> = request.metadata.to_map().into_iter().collect();
    metadata.sort();
    form.extend(
        metadata
            .into_iter()
            .map(|(key, value)| (format!("metadata[{key}]"), value)),
    );
    form
}

fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn decode<T: for<'de> Deserialize<'de>>(body: &[u8]) -> Result<T, GatewayError> {
    serde_json::from_slice(body)
        .map_err(|error| GatewayError::Decode(format!("invalid Stripe JSON payload: {error}")))
}

#[derive(Debug, Deserialize)]
struct SessionDto {
    id: String,
    url: Option<String>,
    status: Option<String>,
    payment_status: Option<String>,
    payment_intent: Option<PaymentIntentDto>,
    #[serde(default)]
    metadata: HashMap<String, String>,
    amount_total: Option<i64>,
    currency: Option<String>,
    customer_email: Option<String>,
    customer_details: Option<CustomerDetailsDto>,
}

/// Stripe returns the intent as a bare id unless it was expanded.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PaymentIntentDto {
    Id(String),
    Expanded { id: String },
}

#[derive(Debug, Deserialize)]
struct CustomerDetailsDto {
    email: Option<String>,
}

impl SessionDto {
    fn into_session(self) -> Result<GatewaySession, GatewayError> {
        let status = match (self.payment_status.as_deref(), self.status.as_deref()) {
            (Some("paid"), _) => SessionStatus::Paid,
            (_, Some("expired")) => SessionStatus::Expired,
            (_, Some("open")) => SessionStatus::Open,
            (payment, session) => SessionStatus::Other(
                payment.or(session).unwrap_or("unknown").to_string(),
            ),
        };

        let currency = self
            .currency
            .as_deref()
            .map(Currency::parse)
            .transpose()
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        let transaction_id = self.payment_intent.map(|intent| match intent {
            PaymentIntentDto::Id(id) | PaymentIntentDto::Expanded { id } => TransactionId::new(id),
        });

        Ok(GatewaySession {
            session_id: SessionRef::new(self.id),
            status,
            transaction_id,
            metadata: self.metadata,
            amount_total: self.amount_total.map(Money::from_cents),
            currency,
            customer_email: self
                .customer_email
                .or(self.customer_details.and_then(|d| d.email)),
        })
    }
}

fn map_transport_error(error: reqwest::Error) -> GatewayError {
    GatewayError::Unavailable(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8], session: Option<&SessionRef>) -> GatewayError {
    let message = match error_message(body) {
        Some(detail) => format!("status {}: {}", status.as_u16(), detail),
        None => format!("status {}", status.as_u16()),
    };

    match (status, session) {
        (StatusCode::NOT_FOUND, Some(session)) => GatewayError::SessionNotFound(session.clone()),
        (StatusCode::BAD_REQUEST | StatusCode::PAYMENT_REQUIRED, _) => {
            GatewayError::Rejected(message)
        }
        _ => GatewayError::Unavailable(message),
    }
}

fn error_message(body: &[u8]) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
    }

    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.message)
}
