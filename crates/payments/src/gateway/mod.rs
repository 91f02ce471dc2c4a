//! Payment gateway capability and its implementations.

pub mod memory;
pub mod stripe;

pub use memory::InMemoryPaymentGateway;
pub use stripe::{StripeConfig, StripeGateway};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{Currency, CustomerIdentity, Money, OrderId, SessionRef, TransactionId};
use thiserror::Error;

/// Metadata key carrying the order id through the gateway.
pub const METADATA_ORDER_ID: &str = "order_id";

/// Metadata key carrying the line item description through the gateway.
pub const METADATA_DESCRIPTION: &str = "description";

/// Errors reported by a payment gateway.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// No session with this reference exists.
    #[error("session not found: {0}")]
    SessionNotFound(SessionRef),

    /// The provider could not be reached or failed internally.
    #[error("gateway unavailable: {0}")]
    Unavailable(String),

    /// The provider refused the request as invalid.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The provider's response could not be decoded.
    #[error("undecodable response: {0}")]
    Decode(String),
}

/// Order identity carried through the gateway as opaque metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMetadata {
    pub order_id: OrderId,
    pub description: String,
}

impl SessionMetadata {
    /// Flattens the metadata into the key/value form the gateway stores.
    pub fn to_map(&self) -> HashMap<String, String> {
        HashMap::from([
            (METADATA_ORDER_ID.to_string(), self.order_id.to_string()),
            (METADATA_DESCRIPTION.to_string(), self.description.clone()),
        ])
    }
}

/// Everything needed to open a hosted checkout session.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    /// Amount in minor units.
    pub amount: Money,
    pub currency: Currency,
    pub customer: CustomerIdentity,
    pub metadata: SessionMetadata,
    pub success_url: String,
    pub cancel_url: String,
}

/// A newly opened checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSession {
    pub session_id: SessionRef,
    pub redirect_url: String,
}

/// Payment status of a checkout session as the gateway reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// Awaiting payment.
    Open,
    /// Payment captured.
    Paid,
    /// Abandoned; will never be paid.
    Expired,
    /// Any other provider state, kept verbatim.
    Other(String),
}

impl SessionStatus {
    /// Returns a stable name for logs and responses.
    pub fn as_str(&self) -> &str {
        match self {
            SessionStatus::Open => "open",
            SessionStatus::Paid => "paid",
            SessionStatus::Expired => "expired",
            SessionStatus::Other(s) => s,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A checkout session read back from the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySession {
    pub session_id: SessionRef,
    pub status: SessionStatus,
    /// Identifier of the completed charge; present once paid.
    pub transaction_id: Option<TransactionId>,
    /// Metadata exactly as supplied at creation.
    pub metadata: HashMap<String, String>,
    pub amount_total: Option<Money>,
    pub currency: Option<Currency>,
    pub customer_email: Option<String>,
}

/// A hosted-checkout payment provider.
///
/// Neither call is retried by callers in this crate: creating a session twice
/// is visible to the customer, and reads are cheap for the caller to repeat.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a hosted checkout session.
    async fn create_session(&self, request: &SessionRequest)
    -> Result<CreatedSession, GatewayError>;

    /// Reads a session's current state.
    async fn get_session(&self, session_id: &SessionRef) -> Result<GatewaySession, GatewayError>;
}

#[async_trait]
impl<T: PaymentGateway + ?Sized> PaymentGateway for Arc<T> {
    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<CreatedSession, GatewayError> {
        (**self).create_session(request).await
    }

    async fn get_session(&self, session_id: &SessionRef) -> Result<GatewaySession, GatewayError> {
        (**self).get_session(session_id).await
    }
}
