//! In-memory payment gateway with deterministic ids.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use common::{SessionRef, TransactionId};

use super::{
    CreatedSession, GatewayError, GatewaySession, PaymentGateway, SessionRequest, SessionStatus,
};

#[derive(Debug)]
struct FakeSession {
    request: SessionRequest,
    status: SessionStatus,
    transaction_id: Option<TransactionId>,
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    sessions: HashMap<SessionRef, FakeSession>,
    next_session: u32,
    next_transaction: u32,
    unavailable: bool,
    get_session_calls: usize,
}

/// In-memory payment gateway for testing and local runs.
///
/// Session ids are `cs_test_0001`, `cs_test_0002`, ... and transaction ids
/// `pi_test_0001`, ... in creation order. Sessions stay open until a test
/// completes or expires them.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<Mutex<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, InMemoryGatewayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every call fail as unavailable until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Marks a session paid with the next generated transaction id.
    ///
    /// Returns None, without using up an id, if the session does not exist.
    pub fn complete_session(&self, session_id: &SessionRef) -> Option<TransactionId> {
        let mut state = self.lock();
        if !state.sessions.contains_key(session_id) {
            return None;
        }

        state.next_transaction += 1;
        let transaction_id = TransactionId::new(format!("pi_test_{:04}", state.next_transaction));
        let session = state.sessions.get_mut(session_id)?;
        session.status = SessionStatus::Paid;
        session.transaction_id = Some(transaction_id.clone());
        Some(transaction_id)
    }

    /// Marks a session paid with a specific transaction id.
    pub fn complete_session_with(
        &self,
        session_id: &SessionRef,
        transaction_id: TransactionId,
    ) -> bool {
        let mut state = self.lock();
        match state.sessions.get_mut(session_id) {
            Some(session) => {
                session.status = SessionStatus::Paid;
                session.transaction_id = Some(transaction_id);
                true
            }
            None => false,
        }
    }

    /// Forces a session into an arbitrary status without a transaction.
    pub fn set_status(&self, session_id: &SessionRef, status: SessionStatus) -> bool {
        let mut state = self.lock();
        match state.sessions.get_mut(session_id) {
            Some(session) => {
                session.status = status;
                true
            }
            None => false,
        }
    }

    /// Returns the number of sessions created.
    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }

    /// Returns how many times a session has been read.
    pub fn get_session_calls(&self) -> usize {
        self.lock().get_session_calls
    }

    /// Returns the request a session was created from.
    pub fn request_for(&self, session_id: &SessionRef) -> Option<SessionRequest> {
        self.lock()
            .sessions
            .get(session_id)
            .map(|s| s.request.clone())
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<CreatedSession, GatewayError> {
        let mut state = self.lock();

        if state.unavailable {
            return Err(GatewayError::Unavailable("gateway offline".to_string()));
        }
        if !request.amount.is_positive() {
            return Err(GatewayError::Rejected(format!(
                "amount must be positive, got {}",
                request.amount.cents()
            )));
        }

        state.next_session += 1;
        let session_id = SessionRef::new(format!("cs_test_{:04}", state.next_session));
        state.sessions.insert(
            session_id.clone(),
            FakeSession {
                request: request.clone(),
                status: SessionStatus::Open,
                transaction_id: None,
            },
        );

        Ok(CreatedSession {
            redirect_url: format!("https://checkout.test/pay/{session_id}"),
            session_id,
        })
    }

    async fn get_session(&self, session_id: &SessionRef) -> Result<GatewaySession, GatewayError> {
        let mut state = self.lock();
        state.get_session_calls += 1;

        if state.unavailable {
            return Err(GatewayError::Unavailable("gateway offline".to_string()));
        }

        let session = state
            .sessions
            .get(session_id)
            .ok_or_else(|| GatewayError::SessionNotFound(session_id.clone()))?;

        Ok(GatewaySession {
            session_id: session_id.clone(),
            status: session.status.clone(),
            transaction_id: session.transaction_id.clone(),
            metadata: session.request.metadata.to_map(),
            amount_total: Some(session.request.amount),
            currency: Some(session.request.currency.clone()),
            customer_email: Some(session.request.customer.to_string()),
        })
    }
}
