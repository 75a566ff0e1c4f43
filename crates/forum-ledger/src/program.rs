//! # Forum Program
//!
//! The confidential forum state machine. Owns the ledger, drives the
//! confidential engine for every aggregate update and hands bounties to the
//! value-transfer layer.
//!
//! ## Call Discipline
//!
//! Every mutating call runs inside [`ForumProgram::transact`]:
//!
//! 1. Snapshot the ledger and the pending-event mark.
//! 2. Validate in a fixed order; the first failing check wins.
//! 3. Apply effects.
//! 4. On any error restore the snapshot, so the call leaves no trace except
//!    burned ids and orphaned engine handles.
//!
//! Payouts follow checks-effects-interactions: the escrow is zeroed, the
//! vault debited and every engine update stored before control leaves the
//! program. The transfer is the last step of a call that can fail; only
//! event pushes follow it. The recipient gets `&mut dyn ForumApi` and may
//! call back in while the transfer is running.
//!
//! ## Scaling
//!
//! The snapshot is a full clone of the ledger, encrypted contents included,
//! so every call costs O(total state) before it does any work. Together with
//! the service's post-commit invariant scan this bounds the program to
//! ledgers that fit comfortably in memory several times over.

use crate::domain::entities::{Answer, CallContext, ForumConfig, Question, UserProfile};
use crate::domain::invariants::{check_all_invariants, InvariantCheckResult};
use crate::domain::ledger::{ForumLedger, IdAllocator, Vault};
use crate::domain::services::{
    validate_content, validate_score, AggregateKind, LedgerEvent, RewardTable,
};
use crate::domain::value_objects::{
    Address, AnswerId, EncryptedContent, Handle, Plaintext, QuestionId, Timestamp, U256,
};
use crate::errors::ForumError;
use crate::events::ForumEvent;
use crate::ports::inbound::ForumApi;
use crate::ports::outbound::{ConfidentialEngine, ValueTransfer};
use std::mem;
use tracing::{debug, info, warn};

/// The forum program.
pub struct ForumProgram<E: ConfidentialEngine, T: ValueTransfer> {
    /// Program-level configuration.
    config: ForumConfig,
    /// Snapshotted state.
    ledger: ForumLedger,
    /// Question ids. Not part of the snapshot.
    question_ids: IdAllocator,
    /// Answer ids. Not part of the snapshot.
    answer_ids: IdAllocator,
    /// Confidential-value backend.
    engine: E,
    /// `None` while a transfer is in flight.
    treasury: Option<T>,
    /// Events of committed calls not yet drained.
    events: Vec<ForumEvent>,
}

impl<E: ConfidentialEngine, T: ValueTransfer> ForumProgram<E, T> {
    /// Create a program with an empty ledger.
    ///
    /// The engine must grant under `config.program_address` on
    /// `owner_grant`.
    pub fn new(config: ForumConfig, engine: E, treasury: T) -> Self {
        info!(
            program = %config.program_address,
            admin = %config.admin,
            "Forum program created"
        );
        Self {
            ledger: ForumLedger::new(config.admin),
            config,
            question_ids: IdAllocator::new(),
            answer_ids: IdAllocator::new(),
            engine,
            treasury: Some(treasury),
            events: Vec::new(),
        }
    }

    /// Program configuration.
    #[must_use]
    pub fn config(&self) -> &ForumConfig {
        &self.config
    }

    /// Read access to the engine (decryption in tests and clients).
    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable engine access.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// The value-transfer adapter, or `None` during a payout.
    #[must_use]
    pub fn treasury(&self) -> Option<&T> {
        self.treasury.as_ref()
    }

    /// Mutable value-transfer access, or `None` during a payout.
    pub fn treasury_mut(&mut self) -> Option<&mut T> {
        self.treasury.as_mut()
    }

    /// Read access to the ledger.
    #[must_use]
    pub fn ledger(&self) -> &ForumLedger {
        &self.ledger
    }

    /// Current vault figures.
    #[must_use]
    pub fn vault(&self) -> Vault {
        self.ledger.vault()
    }

    /// Drains the events of every call committed since the last drain.
    pub fn take_events(&mut self) -> Vec<ForumEvent> {
        mem::take(&mut self.events)
    }

    /// Runs every ledger invariant against the current state.
    #[must_use]
    pub fn check_invariants(&self) -> InvariantCheckResult {
        check_all_invariants(&self.ledger, self.config.program_address, |handle, principal| {
            self.engine.is_granted(handle, principal)
        })
    }

    // =========================================================================
    // CALL PLUMBING
    // =========================================================================

    /// Runs `body` atomically: any error restores the ledger and drops the
    /// events it raised.
    fn transact<R>(
        &mut self,
        operation: &'static str,
        ctx: &CallContext,
        body: impl FnOnce(&mut Self) -> Result<R, ForumError>,
    ) -> Result<R, ForumError> {
        let snapshot = self.ledger.clone();
        let mark = self.events.len();

        match body(self) {
            Ok(output) => {
                debug!(
                    operation,
                    caller = %ctx.caller,
                    events = self.events.len() - mark,
                    "Call committed"
                );
                Ok(output)
            }
            Err(e) => {
                self.ledger = snapshot;
                self.events.truncate(mark);
                if e.is_validation_failure() {
                    debug!(operation, caller = %ctx.caller, error = %e, "Call reverted");
                } else {
                    warn!(operation, caller = %ctx.caller, error = %e, "Call reverted");
                }
                Err(e)
            }
        }
    }

    fn emit(&mut self, event: ForumEvent) {
        self.events.push(event);
    }

    fn require_non_payable(ctx: &CallContext) -> Result<(), ForumError> {
        if !ctx.value.is_zero() {
            return Err(ForumError::NonPayable(ctx.value));
        }
        Ok(())
    }

    /// Encodes a plaintext the program may use as an operand.
    fn encode_owned(&mut self, value: Plaintext) -> Result<Handle, ForumError> {
        let handle = self.engine.encode(value)?;
        self.engine.owner_grant(&handle)?;
        Ok(handle)
    }

    /// Encodes a plaintext readable by the program and `owner`.
    fn seal(&mut self, value: Plaintext, owner: Address) -> Result<Handle, ForumError> {
        let handle = self.encode_owned(value)?;
        self.engine.grant(&handle, owner)?;
        Ok(handle)
    }

    /// Carries access over to a handle that replaces `previous`.
    fn supersede(
        &mut self,
        previous: &Handle,
        next: &Handle,
        owner: Address,
    ) -> Result<(), ForumError> {
        self.engine.owner_grant(next)?;
        self.engine.grant(next, owner)?;
        for grantee in self.engine.grantees(previous) {
            self.engine.grant(next, grantee)?;
        }
        Ok(())
    }

    /// Adds the reward for `event` to one of `user`'s aggregates.
    fn apply_accrual(
        &mut self,
        user: Address,
        event: LedgerEvent,
        timestamp: Timestamp,
    ) -> Result<(), ForumError> {
        let kind = self.accrue(user, event)?;
        self.announce(user, kind, timestamp);
        Ok(())
    }

    /// Stores the updated aggregate without emitting anything.
    fn accrue(&mut self, user: Address, event: LedgerEvent) -> Result<AggregateKind, ForumError> {
        let accrual = RewardTable::STANDARD.accrual_for(event);
        let profile = self.ledger.require_profile(&user)?;
        let current = match accrual.kind {
            AggregateKind::Reputation => profile.reputation,
            AggregateKind::Contributions => profile.contributions,
        };

        let delta = self.encode_owned(accrual.amount)?;
        let updated = self.engine.add(&current, &delta)?;
        self.supersede(&current, &updated, user)?;

        let profile = self.ledger.profile_mut(&user)?;
        match accrual.kind {
            AggregateKind::Reputation => profile.reputation = updated,
            AggregateKind::Contributions => profile.contributions = updated,
        }
        debug!(user = %user, ?event, "Accrual applied");
        Ok(accrual.kind)
    }

    /// Reputation changes are public; contribution changes are silent.
    fn announce(&mut self, user: Address, kind: AggregateKind, timestamp: Timestamp) {
        if kind == AggregateKind::Reputation {
            self.emit(ForumEvent::ReputationUpdated { user, timestamp });
        }
    }

    /// Hands `amount` to the value-transfer layer. Bookkeeping must already
    /// be committed to the ledger.
    fn pay_out(&mut self, to: Address, amount: U256) -> Result<(), ForumError> {
        let mut treasury = self.treasury.take().ok_or(ForumError::TransferInProgress)?;
        let result = treasury.transfer(self, to, amount);
        self.treasury = Some(treasury);
        result.map_err(ForumError::from)
    }

    fn debit_vault(&mut self, amount: U256, escrowed: bool) -> Result<(), ForumError> {
        let vault = self.ledger.vault_mut();
        vault.balance = vault
            .balance
            .checked_sub(amount)
            .ok_or(ForumError::InsufficientFunds {
                required: amount,
                available: vault.balance,
            })?;
        if escrowed {
            vault.escrowed = vault.escrowed.saturating_sub(amount);
        }
        Ok(())
    }
}

// =============================================================================
// FORUM API
// =============================================================================

impl<E: ConfidentialEngine, T: ValueTransfer> ForumApi for ForumProgram<E, T> {
    fn initialize_user(
        &mut self,
        ctx: &CallContext,
        initial_reputation: Plaintext,
    ) -> Result<(), ForumError> {
        self.transact("initialize_user", ctx, |this| {
            Self::require_non_payable(ctx)?;
            let user = ctx.caller;
            if this.ledger.profile(&user).is_some() {
                return Err(ForumError::AlreadyInitialized(user));
            }

            let reputation = this.seal(initial_reputation, user)?;
            let contributions = this.seal(0, user)?;
            this.ledger.insert_profile(UserProfile {
                address: user,
                reputation,
                contributions,
                is_expert: false,
                specialties: Vec::new(),
                join_time: ctx.timestamp,
            });

            this.emit(ForumEvent::UserInitialized {
                user,
                timestamp: ctx.timestamp,
            });
            info!(user = %user, "User initialized");
            Ok(())
        })
    }

    fn add_specialty(&mut self, ctx: &CallContext, specialty: String) -> Result<(), ForumError> {
        self.transact("add_specialty", ctx, |this| {
            Self::require_non_payable(ctx)?;
            let profile = this.ledger.profile_mut(&ctx.caller)?;
            profile.specialties.push(specialty.clone());
            this.emit(ForumEvent::SpecialtyAdded {
                user: ctx.caller,
                specialty,
            });
            Ok(())
        })
    }

    fn promote_to_expert(&mut self, ctx: &CallContext, user: Address) -> Result<(), ForumError> {
        self.transact("promote_to_expert", ctx, |this| {
            Self::require_non_payable(ctx)?;
            this.ledger.require_admin(&ctx.caller)?;
            let profile = this.ledger.profile_mut(&user)?;
            if profile.is_expert {
                return Ok(());
            }
            profile.is_expert = true;
            this.emit(ForumEvent::ExpertPromoted { user });
            info!(user = %user, "User promoted to expert");
            Ok(())
        })
    }

    fn post_question(
        &mut self,
        ctx: &CallContext,
        category: String,
        content: EncryptedContent,
        reputation_gate: Plaintext,
    ) -> Result<QuestionId, ForumError> {
        self.transact("post_question", ctx, |this| {
            let author = ctx.caller;
            this.ledger.require_profile(&author)?;
            validate_content(&content)?;

            let id = QuestionId(this.question_ids.allocate()?);
            let gate = this.seal(reputation_gate, author)?;

            let bounty = ctx.value;
            if !bounty.is_zero() {
                let vault = this.ledger.vault_mut();
                vault.balance = vault.balance.saturating_add(bounty);
                vault.escrowed = vault.escrowed.saturating_add(bounty);
            }

            this.ledger.insert_question(Question {
                id,
                category: category.clone(),
                encrypted_content: content,
                author,
                created_at: ctx.timestamp,
                answer_count: 0,
                reputation_gate: gate,
                is_active: true,
                bounty,
            });

            info!(question = %id, author = %author, category = %category, bounty = %bounty, "Question posted");
            this.emit(ForumEvent::QuestionPosted {
                id,
                author,
                category,
            });
            Ok(id)
        })
    }

    fn submit_answer(
        &mut self,
        ctx: &CallContext,
        question_id: QuestionId,
        content: EncryptedContent,
    ) -> Result<AnswerId, ForumError> {
        self.transact("submit_answer", ctx, |this| {
            Self::require_non_payable(ctx)?;
            let author = ctx.caller;
            let question = this.ledger.require_question(question_id)?;
            let is_active = question.is_active;
            this.ledger.require_profile(&author)?;
            if !is_active {
                return Err(ForumError::QuestionInactive(question_id));
            }
            validate_content(&content)?;

            let id = AnswerId(this.answer_ids.allocate()?);
            let score = this.seal(0, author)?;
            this.ledger.insert_answer(Answer {
                id,
                question_id,
                encrypted_content: content,
                author,
                created_at: ctx.timestamp,
                score,
                is_verified: false,
                is_best_answer: false,
            })?;

            this.emit(ForumEvent::AnswerSubmitted {
                id,
                question_id,
                author,
            });
            this.apply_accrual(author, LedgerEvent::AnswerSubmitted, ctx.timestamp)?;
            info!(answer = %id, question = %question_id, author = %author, "Answer submitted");
            Ok(id)
        })
    }

    fn vote_on_answer(
        &mut self,
        ctx: &CallContext,
        answer_id: AnswerId,
        score: u8,
    ) -> Result<(), ForumError> {
        self.transact("vote_on_answer", ctx, |this| {
            Self::require_non_payable(ctx)?;
            let voter = ctx.caller;
            let answer = this.ledger.require_answer(answer_id)?;
            let (author, current) = (answer.author, answer.score);
            this.ledger.require_profile(&voter)?;
            validate_score(score)?;
            if voter == author {
                return Err(ForumError::SelfVote);
            }

            let vote = this.encode_owned(Plaintext::from(score))?;
            let tallied = this.engine.add(&current, &vote)?;
            this.supersede(&current, &tallied, author)?;
            this.ledger.answer_mut(answer_id)?.score = tallied;

            this.apply_accrual(voter, LedgerEvent::VoteCast, ctx.timestamp)?;
            debug!(answer = %answer_id, voter = %voter, "Vote cast");
            Ok(())
        })
    }

    fn verify_answer(
        &mut self,
        ctx: &CallContext,
        answer_id: AnswerId,
        verified: bool,
    ) -> Result<(), ForumError> {
        self.transact("verify_answer", ctx, |this| {
            Self::require_non_payable(ctx)?;
            this.ledger.require_admin(&ctx.caller)?;
            let answer = this.ledger.answer_mut(answer_id)?;
            let newly_verified = verified && !answer.is_verified;
            answer.is_verified = verified;
            let author = answer.author;

            this.emit(ForumEvent::AnswerVerified {
                id: answer_id,
                verified,
            });
            if newly_verified {
                this.apply_accrual(author, LedgerEvent::AnswerVerified, ctx.timestamp)?;
            }
            info!(answer = %answer_id, verified, "Answer verification set");
            Ok(())
        })
    }

    fn close_question(
        &mut self,
        ctx: &CallContext,
        question_id: QuestionId,
    ) -> Result<(), ForumError> {
        self.transact("close_question", ctx, |this| {
            Self::require_non_payable(ctx)?;
            let admin = this.ledger.admin();
            let question = this.ledger.question_mut(question_id)?;
            if ctx.caller != question.author && ctx.caller != admin {
                return Err(ForumError::NotAuthorized(ctx.caller));
            }
            if !question.is_active {
                return Ok(());
            }
            question.is_active = false;
            this.emit(ForumEvent::QuestionClosed { id: question_id });
            info!(question = %question_id, "Question closed");
            Ok(())
        })
    }

    fn select_best_answer(
        &mut self,
        ctx: &CallContext,
        question_id: QuestionId,
        answer_id: AnswerId,
    ) -> Result<(), ForumError> {
        self.transact("select_best_answer", ctx, |this| {
            Self::require_non_payable(ctx)?;
            let question = this.ledger.require_question(question_id)?;
            if question.author != ctx.caller {
                return Err(ForumError::NotAuthorized(ctx.caller));
            }
            let answer = this.ledger.require_answer(answer_id)?;
            if answer.question_id != question_id {
                return Err(ForumError::AnswerQuestionMismatch {
                    question_id,
                    answer_id,
                    actual: answer.question_id,
                });
            }
            let recipient = answer.author;

            this.ledger.clear_best_answers(question_id);
            this.ledger.answer_mut(answer_id)?.is_best_answer = true;
            this.emit(ForumEvent::BestAnswerSelected {
                question_id,
                answer_id,
            });

            // Nothing fallible may follow the transfer.
            let reward = this.accrue(recipient, LedgerEvent::BestAnswerSelected)?;
            let question = this.ledger.question_mut(question_id)?;
            let bounty = mem::replace(&mut question.bounty, U256::zero());
            if !bounty.is_zero() {
                this.debit_vault(bounty, true)?;
                this.pay_out(recipient, bounty)?;
                this.emit(ForumEvent::BountyPaid {
                    question_id,
                    recipient,
                    amount: bounty,
                });
                info!(question = %question_id, recipient = %recipient, amount = %bounty, "Bounty paid");
            }
            this.announce(recipient, reward, ctx.timestamp);
            info!(question = %question_id, answer = %answer_id, "Best answer selected");
            Ok(())
        })
    }

    fn deposit(&mut self, ctx: &CallContext) -> Result<(), ForumError> {
        self.transact("deposit", ctx, |this| {
            if ctx.value.is_zero() {
                return Ok(());
            }
            let vault = this.ledger.vault_mut();
            vault.balance = vault.balance.saturating_add(ctx.value);
            this.emit(ForumEvent::FundsDeposited {
                from: ctx.caller,
                amount: ctx.value,
            });
            debug!(from = %ctx.caller, amount = %ctx.value, "Funds deposited");
            Ok(())
        })
    }

    fn withdraw_funds(&mut self, ctx: &CallContext) -> Result<U256, ForumError> {
        self.transact("withdraw_funds", ctx, |this| {
            Self::require_non_payable(ctx)?;
            this.ledger.require_admin(&ctx.caller)?;

            let amount = this.ledger.vault().withdrawable();
            if amount.is_zero() {
                return Ok(amount);
            }
            this.debit_vault(amount, false)?;
            this.pay_out(ctx.caller, amount)?;
            this.emit(ForumEvent::FundsWithdrawn {
                to: ctx.caller,
                amount,
            });
            info!(to = %ctx.caller, amount = %amount, "Funds withdrawn");
            Ok(amount)
        })
    }

    fn transfer_privilege(
        &mut self,
        ctx: &CallContext,
        new_admin: Address,
    ) -> Result<(), ForumError> {
        self.transact("transfer_privilege", ctx, |this| {
            Self::require_non_payable(ctx)?;
            this.ledger.require_admin(&ctx.caller)?;
            this.ledger.set_admin(new_admin);
            this.emit(ForumEvent::PrivilegeTransferred {
                previous: ctx.caller,
                new: new_admin,
            });
            info!(previous = %ctx.caller, new = %new_admin, "Privilege transferred");
            Ok(())
        })
    }

    fn profile(&self, user: &Address) -> Option<UserProfile> {
        self.ledger.profile(user).cloned()
    }

    fn question(&self, id: QuestionId) -> Option<Question> {
        self.ledger.question(id).cloned()
    }

    fn answer(&self, id: AnswerId) -> Option<Answer> {
        self.ledger.answer(id).cloned()
    }

    fn questions_by_category(&self, category: &str) -> Vec<QuestionId> {
        self.ledger.questions_by_category(category).to_vec()
    }

    fn questions_by_author(&self, author: &Address) -> Vec<QuestionId> {
        self.ledger.questions_by_author(author).to_vec()
    }

    fn answers_by_author(&self, author: &Address) -> Vec<AnswerId> {
        self.ledger.answers_by_author(author).to_vec()
    }

    fn answers_for_question(&self, question_id: QuestionId) -> Vec<AnswerId> {
        self.ledger.answers_for_question(question_id).to_vec()
    }

    fn privileged_principal(&self) -> Address {
        self.ledger.admin()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryConfidentialEngine, InMemoryTreasury};
    use crate::errors::{EngineError, EntityKind};
    use crate::ports::outbound::DecryptionService;

    type TestProgram = ForumProgram<InMemoryConfidentialEngine, InMemoryTreasury>;

    const ADMIN: Address = Address::new([0xAD; 20]);
    const ALICE: Address = Address::new([1u8; 20]);
    const BOB: Address = Address::new([2u8; 20]);
    const CAROL: Address = Address::new([3u8; 20]);

    fn create_test_program() -> TestProgram {
        let config = ForumConfig::new(Address::new([0x42; 20]), ADMIN);
        let engine = InMemoryConfidentialEngine::with_seed(config.program_address, 11);
        ForumProgram::new(config, engine, InMemoryTreasury::new())
    }

    fn ctx(caller: Address) -> CallContext {
        CallContext::new(caller, 1_000)
    }

    fn reveal(program: &TestProgram, handle: &Handle, who: Address) -> Plaintext {
        program.engine().decrypt(handle, who).unwrap()
    }

    /// Program with ALICE and BOB initialised and one question by ALICE.
    fn seeded() -> (TestProgram, QuestionId) {
        let mut program = create_test_program();
        program.initialize_user(&ctx(ALICE), 50).unwrap();
        program.initialize_user(&ctx(BOB), 0).unwrap();
        let q = program
            .post_question(&ctx(ALICE), "Rust".into(), "q".into(), 5)
            .unwrap();
        program.take_events();
        (program, q)
    }

    #[test]
    fn test_initialize_user_grants_owner() {
        let mut program = create_test_program();
        program.initialize_user(&ctx(ALICE), 50).unwrap();

        let profile = program.profile(&ALICE).unwrap();
        assert_eq!(reveal(&program, &profile.reputation, ALICE), 50);
        assert_eq!(reveal(&program, &profile.contributions, ALICE), 0);
        assert_eq!(profile.join_time, 1_000);
        assert!(program.engine().decrypt(&profile.reputation, BOB).is_err());

        assert_eq!(
            program.take_events(),
            vec![ForumEvent::UserInitialized {
                user: ALICE,
                timestamp: 1_000
            }]
        );
    }

    #[test]
    fn test_non_payable_operations_reject_value() {
        let (mut program, q) = seeded();
        let paid = CallContext::with_value(BOB, U256::from(1), 1_000);

        assert!(matches!(
            program.submit_answer(&paid, q, "a".into()),
            Err(ForumError::NonPayable(_))
        ));
        assert!(matches!(
            program.add_specialty(&paid, "zk".into()),
            Err(ForumError::NonPayable(_))
        ));
        assert!(program.answers_for_question(q).is_empty());
    }

    #[test]
    fn test_submit_answer_validation_order() {
        let (mut program, q) = seeded();

        // Unknown question beats uninitialised caller.
        let err = program
            .submit_answer(&ctx(CAROL), QuestionId(99), EncryptedContent::default())
            .unwrap_err();
        assert_eq!(
            err,
            ForumError::NotFound {
                kind: EntityKind::Question,
                id: 99
            }
        );

        // Uninitialised caller beats empty content.
        let err = program
            .submit_answer(&ctx(CAROL), q, EncryptedContent::default())
            .unwrap_err();
        assert_eq!(err, ForumError::NotInitialized(CAROL));

        // Closed question beats empty content.
        program.close_question(&ctx(ALICE), q).unwrap();
        let err = program
            .submit_answer(&ctx(BOB), q, EncryptedContent::default())
            .unwrap_err();
        assert_eq!(err, ForumError::QuestionInactive(q));
    }

    #[test]
    fn test_submit_answer_credits_contribution() {
        let (mut program, q) = seeded();
        let a = program.submit_answer(&ctx(BOB), q, "a".into()).unwrap();

        let answer = program.answer(a).unwrap();
        assert_eq!(reveal(&program, &answer.score, BOB), 0);
        assert_eq!(program.question(q).unwrap().answer_count, 1);

        let bob = program.profile(&BOB).unwrap();
        assert_eq!(reveal(&program, &bob.contributions, BOB), 1);
        assert_eq!(reveal(&program, &bob.reputation, BOB), 0);

        // Contribution updates are silent.
        assert_eq!(
            program.take_events(),
            vec![ForumEvent::AnswerSubmitted {
                id: a,
                question_id: q,
                author: BOB
            }]
        );
    }

    #[test]
    fn test_vote_tallies_and_rewards_voter() {
        let (mut program, q) = seeded();
        program.initialize_user(&ctx(CAROL), 0).unwrap();
        let a = program.submit_answer(&ctx(BOB), q, "a".into()).unwrap();

        program.vote_on_answer(&ctx(ALICE), a, 7).unwrap();
        program.vote_on_answer(&ctx(CAROL), a, 3).unwrap();

        let answer = program.answer(a).unwrap();
        assert_eq!(reveal(&program, &answer.score, BOB), 10);
        assert_eq!(
            reveal(&program, &program.profile(&ALICE).unwrap().reputation, ALICE),
            51
        );
        // Voters cannot read the tally.
        assert!(program.engine().decrypt(&answer.score, ALICE).is_err());
    }

    #[test]
    fn test_vote_validation_order() {
        let (mut program, q) = seeded();
        let a = program.submit_answer(&ctx(BOB), q, "a".into()).unwrap();

        assert!(matches!(
            program.vote_on_answer(&ctx(CAROL), AnswerId(42), 11),
            Err(ForumError::NotFound {
                kind: EntityKind::Answer,
                ..
            })
        ));
        assert_eq!(
            program.vote_on_answer(&ctx(CAROL), a, 11),
            Err(ForumError::NotInitialized(CAROL))
        );
        assert_eq!(
            program.vote_on_answer(&ctx(BOB), a, 11),
            Err(ForumError::InvalidScore { score: 11, max: 10 })
        );
        assert_eq!(
            program.vote_on_answer(&ctx(BOB), a, 10),
            Err(ForumError::SelfVote)
        );
    }

    #[test]
    fn test_verify_rewards_only_on_transition() {
        let (mut program, q) = seeded();
        let a = program.submit_answer(&ctx(BOB), q, "a".into()).unwrap();
        program.take_events();

        assert_eq!(
            program.verify_answer(&ctx(ALICE), a, true),
            Err(ForumError::NotAuthorized(ALICE))
        );

        program.verify_answer(&ctx(ADMIN), a, true).unwrap();
        program.verify_answer(&ctx(ADMIN), a, true).unwrap();
        program.verify_answer(&ctx(ADMIN), a, false).unwrap();

        let bob = program.profile(&BOB).unwrap();
        assert_eq!(reveal(&program, &bob.reputation, BOB), 10);

        let events = program.take_events();
        assert_eq!(events.len(), 4);
        assert_eq!(
            events[0],
            ForumEvent::AnswerVerified {
                id: a,
                verified: true
            }
        );
        assert!(matches!(events[1], ForumEvent::ReputationUpdated { user, .. } if user == BOB));
        assert!(!program.answer(a).unwrap().is_verified);
    }

    #[test]
    fn test_close_question_permissions() {
        let (mut program, q) = seeded();

        assert_eq!(
            program.close_question(&ctx(BOB), q),
            Err(ForumError::NotAuthorized(BOB))
        );
        program.close_question(&ctx(ADMIN), q).unwrap();
        program.close_question(&ctx(ALICE), q).unwrap();

        assert!(!program.question(q).unwrap().is_active);
        assert_eq!(
            program.take_events(),
            vec![ForumEvent::QuestionClosed { id: q }]
        );
    }

    #[test]
    fn test_promote_to_expert_is_idempotent() {
        let (mut program, _) = seeded();

        assert_eq!(
            program.promote_to_expert(&ctx(ADMIN), CAROL),
            Err(ForumError::NotInitialized(CAROL))
        );
        program.promote_to_expert(&ctx(ADMIN), BOB).unwrap();
        program.promote_to_expert(&ctx(ADMIN), BOB).unwrap();

        assert!(program.profile(&BOB).unwrap().is_expert);
        assert_eq!(
            program.take_events(),
            vec![ForumEvent::ExpertPromoted { user: BOB }]
        );
    }

    #[test]
    fn test_specialties_keep_order_and_duplicates() {
        let (mut program, _) = seeded();
        for s in ["zk", "rust", "zk"] {
            program.add_specialty(&ctx(BOB), s.into()).unwrap();
        }
        assert_eq!(
            program.profile(&BOB).unwrap().specialties,
            vec!["zk", "rust", "zk"]
        );
        assert_eq!(
            program.add_specialty(&ctx(CAROL), "x".into()),
            Err(ForumError::NotInitialized(CAROL))
        );
    }

    #[test]
    fn test_engine_failure_reverts_everything() {
        let (mut program, q) = seeded();
        let before = program.ledger().clone();

        program.engine_mut().set_available(false);
        let result = program.submit_answer(&ctx(BOB), q, "a".into());
        assert!(matches!(
            result,
            Err(ForumError::Engine(EngineError::Unavailable(_)))
        ));

        assert_eq!(program.ledger(), &before);
        assert!(program.take_events().is_empty());
    }

    #[test]
    fn test_select_best_answer_authorization() {
        let (mut program, q) = seeded();
        let a = program.submit_answer(&ctx(BOB), q, "a".into()).unwrap();
        let other = program
            .post_question(&ctx(BOB), "Go".into(), "q2".into(), 0)
            .unwrap();

        assert_eq!(
            program.select_best_answer(&ctx(BOB), q, a),
            Err(ForumError::NotAuthorized(BOB))
        );
        assert_eq!(
            program.select_best_answer(&ctx(BOB), other, a),
            Err(ForumError::AnswerQuestionMismatch {
                question_id: other,
                answer_id: a,
                actual: q
            })
        );
        assert!(program.ledger().best_answer(q).is_none());
    }

    #[test]
    fn test_select_best_answer_unknown_ids() {
        let (mut program, q) = seeded();
        let a = program.submit_answer(&ctx(BOB), q, "a".into()).unwrap();
        program.take_events();

        assert_eq!(
            program.select_best_answer(&ctx(ALICE), QuestionId(99), a),
            Err(ForumError::question_not_found(QuestionId(99)))
        );
        assert_eq!(
            program.select_best_answer(&ctx(ALICE), q, AnswerId(99)),
            Err(ForumError::answer_not_found(AnswerId(99)))
        );
        // Unknown question is reported before the caller check.
        assert!(matches!(
            program.select_best_answer(&ctx(BOB), QuestionId(99), AnswerId(99)),
            Err(ForumError::NotFound {
                kind: EntityKind::Question,
                id: 99
            })
        ));

        assert!(program.ledger().best_answer(q).is_none());
        assert!(program.take_events().is_empty());
    }

    #[test]
    fn test_verify_answer_unknown_id() {
        let (mut program, _) = seeded();

        assert_eq!(
            program.verify_answer(&ctx(ADMIN), AnswerId(7), true),
            Err(ForumError::NotFound {
                kind: EntityKind::Answer,
                id: 7
            })
        );
        // Privilege is checked first.
        assert_eq!(
            program.verify_answer(&ctx(BOB), AnswerId(7), true),
            Err(ForumError::NotAuthorized(BOB))
        );
        assert!(program.take_events().is_empty());
    }

    #[test]
    fn test_close_question_unknown_id() {
        let (mut program, q) = seeded();

        for caller in [ALICE, ADMIN] {
            assert_eq!(
                program.close_question(&ctx(caller), QuestionId(42)),
                Err(ForumError::NotFound {
                    kind: EntityKind::Question,
                    id: 42
                })
            );
        }
        assert!(program.question(q).unwrap().is_active);
        assert!(program.take_events().is_empty());
    }

    #[test]
    fn test_deposit_and_withdraw_respect_escrow() {
        let mut program = create_test_program();
        program.initialize_user(&ctx(ALICE), 0).unwrap();
        program
            .post_question(
                &CallContext::with_value(ALICE, U256::from(100), 1),
                "Rust".into(),
                "q".into(),
                0,
            )
            .unwrap();
        program
            .deposit(&CallContext::with_value(CAROL, U256::from(30), 2))
            .unwrap();

        assert_eq!(
            program.withdraw_funds(&ctx(ALICE)),
            Err(ForumError::NotAuthorized(ALICE))
        );
        assert_eq!(program.withdraw_funds(&ctx(ADMIN)).unwrap(), U256::from(30));
        assert_eq!(program.withdraw_funds(&ctx(ADMIN)).unwrap(), U256::zero());

        let vault = program.vault();
        assert_eq!(vault.balance, U256::from(100));
        assert_eq!(vault.escrowed, U256::from(100));
        assert_eq!(
            program.treasury().unwrap().balance_of(&ADMIN),
            U256::from(30)
        );
        assert!(program.check_invariants().is_valid());
    }

    #[test]
    fn test_transfer_privilege() {
        let (mut program, _) = seeded();

        assert_eq!(
            program.transfer_privilege(&ctx(ALICE), ALICE),
            Err(ForumError::NotAuthorized(ALICE))
        );
        program.transfer_privilege(&ctx(ADMIN), CAROL).unwrap();

        assert_eq!(program.privileged_principal(), CAROL);
        assert_eq!(
            program.promote_to_expert(&ctx(ADMIN), BOB),
            Err(ForumError::NotAuthorized(ADMIN))
        );
        program.promote_to_expert(&ctx(CAROL), BOB).unwrap();
    }

    #[test]
    fn test_invariants_hold_after_activity() {
        let (mut program, q) = seeded();
        program.initialize_user(&ctx(CAROL), 0).unwrap();
        let a1 = program.submit_answer(&ctx(BOB), q, "a1".into()).unwrap();
        let a2 = program.submit_answer(&ctx(CAROL), q, "a2".into()).unwrap();
        program.vote_on_answer(&ctx(ALICE), a1, 4).unwrap();
        program.select_best_answer(&ctx(ALICE), q, a1).unwrap();
        program.select_best_answer(&ctx(ALICE), q, a2).unwrap();

        assert_eq!(program.ledger().best_answer(q), Some(a2));
        assert!(program.check_invariants().is_valid());
    }
}
