//! Payment session issuance and reconciliation.
//!
//! Checkout is a pass-through to the payment gateway. Confirmation reads the
//! session back from the gateway and applies a successful payment to the
//! ledger and the order exactly once:
//! 1. Fetch the session
//! 2. Insert the payment record keyed by the provider transaction id
//! 3. Mark the order paid, only if this call won the insert
//!
//! Confirmation is always safe to repeat; checkout is not.

pub mod error;
pub mod gateway;
pub mod reconciler;

pub use error::PaymentError;
pub use gateway::{
    CreatedSession, GatewayError, GatewaySession, InMemoryPaymentGateway, PaymentGateway,
    SessionMetadata, SessionRequest, SessionStatus, StripeConfig, StripeGateway,
};
pub use reconciler::{
    CheckoutSession, CheckoutUrls, PaymentReconciler, ReconciliationOutcome, StartCheckout,
};
