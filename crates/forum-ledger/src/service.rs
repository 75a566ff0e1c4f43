//! # Forum Service
//!
//! Async front of the forum program. Serialises calls, stamps them with
//! ledger time, publishes committed events and keeps statistics.
//!
//! ## Call Flow
//!
//! 1. Build a [`CallContext`] from the envelope (caller, value) and the clock.
//! 2. Lock the program (single writer) and dispatch the payload.
//! 3. On commit, drain the call's events and optionally re-check invariants.
//! 4. Release the lock, then publish the events on the bus.
//! 5. Report an invariant violation, if any, after publishing.
//!
//! A reverted call is not a service error: it yields a response with
//! `success = false` and the revert reason.

use crate::adapters::{InMemoryConfidentialEngine, InMemoryEventBus, InMemoryTreasury};
use crate::domain::entities::{Answer, CallContext, ForumConfig, Question, UserProfile};
use crate::domain::value_objects::{
    Address, AnswerId, Handle, Plaintext, QuestionId, Timestamp, U256,
};
use crate::errors::{EngineError, ForumError, ServiceError};
use crate::events::{CallOutput, ForumRequestPayload, ForumResponsePayload};
use crate::ports::inbound::ForumApi;
use crate::ports::outbound::{ConfidentialEngine, DecryptionService, EventPublisher, ValueTransfer};
use crate::program::ForumProgram;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// Forum service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Program configuration.
    pub forum: ForumConfig,
    /// Re-check ledger invariants after every committed call.
    ///
    /// The check walks every profile, question and answer, so its cost grows
    /// with total ledger size rather than with the call.
    pub verify_invariants: bool,
    /// Per-subscriber event buffer.
    pub event_channel_capacity: usize,
    /// Log level filter (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            forum: ForumConfig::default(),
            verify_invariants: true,
            event_channel_capacity: 1000,
            log_level: "info".to_string(),
        }
    }
}

/// Statistics for the forum service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Total calls dispatched.
    pub calls_executed: u64,
    /// Calls that committed.
    pub committed_calls: u64,
    /// Calls that reverted.
    pub reverted_calls: u64,
    /// Events handed to the publisher.
    pub events_published: u64,
    /// Invariant violations detected after commits.
    pub invariant_violations: u64,
}

/// The forum service.
pub struct ForumService<E, T, P>
where
    E: ConfidentialEngine,
    T: ValueTransfer,
    P: EventPublisher,
{
    /// Service configuration.
    config: ServiceConfig,
    /// The program, behind a single-writer lock.
    program: Arc<Mutex<ForumProgram<E, T>>>,
    /// Event sink.
    publisher: Arc<P>,
    /// Service statistics.
    stats: Arc<RwLock<ServiceStats>>,
}

impl<E, T, P> ForumService<E, T, P>
where
    E: ConfidentialEngine,
    T: ValueTransfer,
    P: EventPublisher,
{
    /// Create a new forum service.
    pub fn new(engine: E, treasury: T, publisher: P, config: ServiceConfig) -> Self {
        let program = ForumProgram::new(config.forum.clone(), engine, treasury);
        Self {
            config,
            program: Arc::new(Mutex::new(program)),
            publisher: Arc::new(publisher),
            stats: Arc::new(RwLock::new(ServiceStats::default())),
        }
    }

    /// Service configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Shared handle to the event publisher.
    pub fn publisher(&self) -> Arc<P> {
        Arc::clone(&self.publisher)
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    /// Handle a forum call stamped with the current wall-clock time.
    ///
    /// # Errors
    ///
    /// [`ServiceError::InvariantViolated`] if the call committed but left
    /// the ledger inconsistent.
    pub async fn handle_request(
        &self,
        caller: Address,
        value: U256,
        correlation_id: Uuid,
        payload: ForumRequestPayload,
    ) -> Result<ForumResponsePayload, ServiceError> {
        self.handle_request_at(caller, value, now(), correlation_id, payload)
            .await
    }

    /// Handle a forum call at an explicit ledger time.
    ///
    /// # Errors
    ///
    /// See [`ForumService::handle_request`].
    #[instrument(
        skip(self, payload),
        fields(correlation_id = %correlation_id, operation = payload.operation())
    )]
    pub async fn handle_request_at(
        &self,
        caller: Address,
        value: U256,
        timestamp: Timestamp,
        correlation_id: Uuid,
        payload: ForumRequestPayload,
    ) -> Result<ForumResponsePayload, ServiceError> {
        let operation = payload.operation();
        let ctx = CallContext::with_value(caller, value, timestamp);
        debug!(caller = %caller, value = %value, "Dispatching forum call");

        let (result, events, violations) = {
            let mut program = self.program.lock().await;
            let result = dispatch(&mut *program, &ctx, payload);
            let events = program.take_events();
            let violations = if result.is_ok() && self.config.verify_invariants {
                program.check_invariants().violations().to_vec()
            } else {
                Vec::new()
            };
            (result, events, violations)
        };

        {
            let mut stats = self.stats.write().await;
            stats.calls_executed += 1;
            if result.is_ok() {
                stats.committed_calls += 1;
            } else {
                stats.reverted_calls += 1;
            }
            stats.invariant_violations += violations.len() as u64;
        }

        // Committed effects stay in the ledger, so subscribers hear about
        // them even when the post-commit check fails.
        for event in &events {
            self.publisher.publish(event.clone()).await;
        }
        self.stats.write().await.events_published += events.len() as u64;

        if !violations.is_empty() {
            let details = violations
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            error!(operation, details = %details, "Invariant violated after commit");
            return Err(ServiceError::InvariantViolated {
                operation: operation.to_string(),
                details,
            });
        }

        match result {
            Ok(output) => {
                info!(operation, events = events.len(), "Forum call committed");
                Ok(ForumResponsePayload::committed(output, events))
            }
            Err(e) => {
                debug!(operation, error = %e, "Forum call reverted");
                Ok(ForumResponsePayload::reverted(e.to_string()))
            }
        }
    }

    /// Runs a read-only closure against the program.
    pub async fn with_program<R>(&self, f: impl FnOnce(&ForumProgram<E, T>) -> R) -> R {
        let program = self.program.lock().await;
        f(&program)
    }

    /// Profile by address.
    pub async fn profile(&self, user: Address) -> Option<UserProfile> {
        self.program.lock().await.profile(&user)
    }

    /// Question by id.
    pub async fn question(&self, id: QuestionId) -> Option<Question> {
        self.program.lock().await.question(id)
    }

    /// Answer by id.
    pub async fn answer(&self, id: AnswerId) -> Option<Answer> {
        self.program.lock().await.answer(id)
    }

    /// Question ids in a category.
    pub async fn questions_by_category(&self, category: &str) -> Vec<QuestionId> {
        self.program.lock().await.questions_by_category(category)
    }

    /// Answer ids for a question.
    pub async fn answers_for_question(&self, question_id: QuestionId) -> Vec<AnswerId> {
        self.program.lock().await.answers_for_question(question_id)
    }
}

impl<E, T, P> ForumService<E, T, P>
where
    E: ConfidentialEngine + DecryptionService,
    T: ValueTransfer,
    P: EventPublisher,
{
    /// Decrypts a handle on behalf of `requester`.
    ///
    /// # Errors
    ///
    /// `AccessDenied` unless `requester` is on the handle's ACL.
    pub async fn reveal(&self, handle: Handle, requester: Address) -> Result<Plaintext, EngineError> {
        self.program.lock().await.engine().decrypt(&handle, requester)
    }
}

/// Routes a payload to the matching program operation.
fn dispatch(
    forum: &mut dyn ForumApi,
    ctx: &CallContext,
    payload: ForumRequestPayload,
) -> Result<CallOutput, ForumError> {
    match payload {
        ForumRequestPayload::InitializeUser { initial_reputation } => forum
            .initialize_user(ctx, initial_reputation)
            .map(|()| CallOutput::Unit),
        ForumRequestPayload::AddSpecialty { specialty } => forum
            .add_specialty(ctx, specialty)
            .map(|()| CallOutput::Unit),
        ForumRequestPayload::PromoteToExpert { user } => forum
            .promote_to_expert(ctx, user)
            .map(|()| CallOutput::Unit),
        ForumRequestPayload::PostQuestion {
            category,
            content,
            reputation_gate,
        } => forum
            .post_question(ctx, category, content, reputation_gate)
            .map(CallOutput::Question),
        ForumRequestPayload::SubmitAnswer {
            question_id,
            content,
        } => forum
            .submit_answer(ctx, question_id, content)
            .map(CallOutput::Answer),
        ForumRequestPayload::VoteOnAnswer { answer_id, score } => forum
            .vote_on_answer(ctx, answer_id, score)
            .map(|()| CallOutput::Unit),
        ForumRequestPayload::VerifyAnswer {
            answer_id,
            verified,
        } => forum
            .verify_answer(ctx, answer_id, verified)
            .map(|()| CallOutput::Unit),
        ForumRequestPayload::SelectBestAnswer {
            question_id,
            answer_id,
        } => forum
            .select_best_answer(ctx, question_id, answer_id)
            .map(|()| CallOutput::Unit),
        ForumRequestPayload::CloseQuestion { question_id } => forum
            .close_question(ctx, question_id)
            .map(|()| CallOutput::Unit),
        ForumRequestPayload::Deposit => forum.deposit(ctx).map(|()| CallOutput::Unit),
        ForumRequestPayload::WithdrawFunds => forum.withdraw_funds(ctx).map(CallOutput::Withdrawn),
        ForumRequestPayload::TransferPrivilege { new_admin } => forum
            .transfer_privilege(ctx, new_admin)
            .map(|()| CallOutput::Unit),
    }
}

/// Seconds since the Unix epoch; 0 if the clock is before it.
fn now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Create a service for testing, wired to in-memory adapters.
pub fn create_test_service(
) -> ForumService<InMemoryConfidentialEngine, InMemoryTreasury, InMemoryEventBus> {
    create_test_service_with(ServiceConfig::default())
}

/// Create a test service with a custom configuration.
pub fn create_test_service_with(
    config: ServiceConfig,
) -> ForumService<InMemoryConfidentialEngine, InMemoryTreasury, InMemoryEventBus> {
    ForumService::new(
        InMemoryConfidentialEngine::new(config.forum.program_address),
        InMemoryTreasury::new(),
        InMemoryEventBus::with_capacity(config.event_channel_capacity),
        config,
    )
}

// =============================================================================
// TESTS
// =============================================================================
