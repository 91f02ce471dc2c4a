//! Checkout session issuance and idempotent payment confirmation.

use common::{Currency, CustomerIdentity, Money, OrderId, SessionRef, TransactionId};
use domain::OrderService;
use store::{
    LedgerInsert, OrderStore, PaymentLedger, PaymentRecord, ReconciliationLog,
    ReconciliationTask, Store, StoreError, TaskKind,
};

use crate::error::{PaymentError, Result};
use crate::gateway::{
    GatewaySession, METADATA_ORDER_ID, PaymentGateway, SessionMetadata, SessionRequest,
    SessionStatus,
};

/// Where the hosted checkout sends the customer afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutUrls {
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutUrls {
    /// Builds the dashboard return URLs for a storefront site.
    ///
    /// The success URL carries the provider's `{CHECKOUT_SESSION_ID}`
    /// placeholder so the storefront can confirm the session on return.
    pub fn for_site(site: &str) -> Self {
        let site = site.trim_end_matches('/');
        Self {
            success_url: format!(
                "{site}/dashboard/payment-success?session_id={{CHECKOUT_SESSION_ID}}"
            ),
            cancel_url: format!("{site}/dashboard/payment-cancelled"),
        }
    }
}

/// Request to open a checkout session for an order.
#[derive(Debug, Clone)]
pub struct StartCheckout {
    pub order_id: OrderId,
    pub amount: Money,
    pub currency: Currency,
    pub customer: CustomerIdentity,
    /// Names the line item shown on the hosted page.
    pub description: String,
}

impl StartCheckout {
    fn validate(&self) -> Result<()> {
        if !self.amount.is_positive() {
            return Err(PaymentError::InvalidAmount(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        if self.description.trim().is_empty() {
            return Err(PaymentError::MissingDescription);
        }
        Ok(())
    }
}

/// A checkout session the customer can be redirected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub session_id: SessionRef,
    pub redirect_url: String,
}

/// Result of confirming a checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationOutcome {
    /// This call recorded the payment and marked the order paid.
    Recorded {
        order_id: OrderId,
        transaction_id: TransactionId,
        amount: Money,
        currency: Currency,
    },
    /// The transaction was already in the ledger; nothing changed.
    AlreadyRecorded {
        order_id: OrderId,
        transaction_id: TransactionId,
    },
    /// The session is not paid (yet); nothing changed. Callers may poll.
    NotPaid { status: SessionStatus },
}

/// Issues checkout sessions and applies confirmed payments exactly once.
#[derive(Clone)]
pub struct PaymentReconciler<S: Store, G: PaymentGateway> {
    orders: OrderService<S>,
    store: S,
    gateway: G,
    urls: CheckoutUrls,
}

impl<S: Store, G: PaymentGateway> PaymentReconciler<S, G> {
    /// Creates a new reconciler.
    pub fn new(store: S, gateway: G, urls: CheckoutUrls) -> Self {
        Self {
            orders: OrderService::new(store.clone()),
            store,
            gateway,
            urls,
        }
    }

    /// Returns the gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Opens a hosted checkout session for an unpaid order.
    ///
    /// No local state is written; a session that is never paid leaves no
    /// trace here. Not retried: a second session would be a second charge page.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id, amount = %cmd.amount))]
    pub async fn start_checkout(&self, cmd: StartCheckout) -> Result<CheckoutSession> {
        cmd.validate()?;

        let order = self.orders.require_order(cmd.order_id).await?;
        if order.payment_status.is_paid() {
            return Err(PaymentError::OrderAlreadyPaid(order.id));
        }

        let request = SessionRequest {
            amount: cmd.amount,
            currency: cmd.currency,
            customer: cmd.customer,
            metadata: SessionMetadata {
                order_id: cmd.order_id,
                description: cmd.description,
            },
            success_url: self.urls.success_url.clone(),
            cancel_url: self.urls.cancel_url.clone(),
        };

        let created = self.gateway.create_session(&request).await.map_err(|e| {
            tracing::warn!(error = %e, "checkout session creation failed");
            PaymentError::from(e)
        })?;

        metrics::counter!("checkout_sessions_created_total").increment(1);
        tracing::info!(session_id = %created.session_id, "checkout session created");
        Ok(CheckoutSession {
            session_id: created.session_id,
            redirect_url: created.redirect_url,
        })
    }

    /// Applies a paid checkout session to the ledger and its order.
    ///
    /// Safe to call any number of times, concurrently included: the ledger's
    /// unique transaction key admits one insert, and only the caller that won
    /// the insert marks the order paid.
    #[tracing::instrument(skip(self))]
    pub async fn confirm(&self, session_id: &SessionRef) -> Result<ReconciliationOutcome> {
        let start = std::time::Instant::now();
        let outcome = self.confirm_session(session_id).await;
        metrics::histogram!("payment_confirm_duration_seconds")
            .record(start.elapsed().as_secs_f64());
        outcome
    }

    async fn confirm_session(&self, session_id: &SessionRef) -> Result<ReconciliationOutcome> {
        let session = self.gateway.get_session(session_id).await?;

        if session.status != SessionStatus::Paid {
            metrics::counter!("payment_confirmations_not_paid_total").increment(1);
            tracing::info!(status = %session.status, "session not paid");
            return Ok(ReconciliationOutcome::NotPaid {
                status: session.status,
            });
        }

        let record = payment_record(&session)?;
        let order_id = record.order_id;
        let transaction_id = record.transaction_id.clone();
        let amount = record.amount;
        let currency = record.currency.clone();

        if self.store.record(record).await? == LedgerInsert::Duplicate {
            metrics::counter!("payment_confirmations_duplicate_total").increment(1);
            tracing::info!(%order_id, %transaction_id, "payment already recorded");
            return Ok(ReconciliationOutcome::AlreadyRecorded {
                order_id,
                transaction_id,
            });
        }

        if let Err(e) = self.store.mark_paid(order_id).await {
            return Err(self.report_unpaid_order(order_id, &transaction_id, e).await);
        }

        metrics::counter!("payments_recorded_total").increment(1);
        tracing::info!(%order_id, %transaction_id, %amount, "payment recorded");
        Ok(ReconciliationOutcome::Recorded {
            order_id,
            transaction_id,
            amount,
            currency,
        })
    }

    /// Logs a recorded payment whose order could not be marked paid.
    async fn report_unpaid_order(
        &self,
        order_id: OrderId,
        transaction_id: &TransactionId,
        cause: StoreError,
    ) -> PaymentError {
        let detail = format!(
            "payment {transaction_id} recorded but marking order {order_id} paid failed ({cause})"
        );
        self.store
            .report(ReconciliationTask::new(
                TaskKind::OrderPaymentUpdateFailed {
                    order_id,
                    transaction_id: transaction_id.clone(),
                },
                detail.clone(),
            ))
            .await;
        PaymentError::Inconsistency { detail }
    }
}

/// Builds the ledger record for a paid session.
fn payment_record(session: &GatewaySession) -> Result<PaymentRecord> {
    let malformed = |what: &str| {
        PaymentError::MalformedSession(format!("session {} has no {what}", session.session_id))
    };

    let transaction_id = session
        .transaction_id
        .clone()
        .ok_or_else(|| malformed("transaction id"))?;
    let order_id = session
        .metadata
        .get(METADATA_ORDER_ID)
        .and_then(|raw| OrderId::parse(raw).ok())
        .ok_or_else(|| malformed("valid order_id metadata"))?;
    let amount = session.amount_total.ok_or_else(|| malformed("amount"))?;
    let currency = session.currency.clone().ok_or_else(|| malformed("currency"))?;

    Ok(PaymentRecord::new(transaction_id, order_id, amount, currency))
}
