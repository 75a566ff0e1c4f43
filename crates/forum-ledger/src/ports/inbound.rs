//! # Driving Port (API - Inbound)
//!
//! The forum program's public surface. The async service drives it, and a
//! value-transfer recipient receives it as `&mut dyn ForumApi` so it can
//! call back in while a payout is in flight.
//!
//! Every mutating method either commits fully or returns an error with the
//! ledger unchanged.

use crate::domain::entities::{Answer, CallContext, Question, UserProfile};
use crate::domain::value_objects::{
    Address, AnswerId, EncryptedContent, Plaintext, QuestionId, U256,
};
use crate::errors::ForumError;

/// Primary API of the confidential forum program.
pub trait ForumApi {
    // ---- identity registry --------------------------------------------------

    /// Creates the caller's profile with an encrypted starting reputation and
    /// an encrypted zero contribution count.
    ///
    /// # Errors
    ///
    /// `AlreadyInitialized`, `NonPayable`.
    fn initialize_user(
        &mut self,
        ctx: &CallContext,
        initial_reputation: Plaintext,
    ) -> Result<(), ForumError>;

    /// Appends a specialty to the caller's profile.
    ///
    /// # Errors
    ///
    /// `NotInitialized`, `NonPayable`.
    fn add_specialty(&mut self, ctx: &CallContext, specialty: String) -> Result<(), ForumError>;

    /// Marks a user as expert. Privileged; idempotent.
    ///
    /// # Errors
    ///
    /// `NotAuthorized`, `NotInitialized`, `NonPayable`.
    fn promote_to_expert(&mut self, ctx: &CallContext, user: Address) -> Result<(), ForumError>;

    // ---- content ledger -----------------------------------------------------

    /// Posts a question. `ctx.value` becomes the escrowed bounty.
    ///
    /// # Errors
    ///
    /// `NotInitialized`, `EmptyContent`.
    fn post_question(
        &mut self,
        ctx: &CallContext,
        category: String,
        content: EncryptedContent,
        reputation_gate: Plaintext,
    ) -> Result<QuestionId, ForumError>;

    /// Answers an open question.
    ///
    /// # Errors
    ///
    /// `NotFound`, `NotInitialized`, `QuestionInactive`, `EmptyContent`,
    /// `NonPayable`.
    fn submit_answer(
        &mut self,
        ctx: &CallContext,
        question_id: QuestionId,
        content: EncryptedContent,
    ) -> Result<AnswerId, ForumError>;

    /// Adds an encrypted vote to an answer's score.
    ///
    /// # Errors
    ///
    /// `NotFound`, `NotInitialized`, `InvalidScore`, `SelfVote`, `NonPayable`.
    fn vote_on_answer(
        &mut self,
        ctx: &CallContext,
        answer_id: AnswerId,
        score: u8,
    ) -> Result<(), ForumError>;

    /// Sets an answer's verified flag. Privileged.
    ///
    /// # Errors
    ///
    /// `NotAuthorized`, `NotFound`, `NonPayable`.
    fn verify_answer(
        &mut self,
        ctx: &CallContext,
        answer_id: AnswerId,
        verified: bool,
    ) -> Result<(), ForumError>;

    /// Closes a question to new answers. Author or privileged principal.
    ///
    /// # Errors
    ///
    /// `NotFound`, `NotAuthorized`, `NonPayable`.
    fn close_question(&mut self, ctx: &CallContext, question_id: QuestionId)
        -> Result<(), ForumError>;

    // ---- bounty / best answer -----------------------------------------------

    /// Marks an answer as the question's best, paying out any escrowed
    /// bounty to its author.
    ///
    /// # Errors
    ///
    /// `NotFound`, `NotAuthorized`, `AnswerQuestionMismatch`, `NonPayable`,
    /// transfer failures.
    fn select_best_answer(
        &mut self,
        ctx: &CallContext,
        question_id: QuestionId,
        answer_id: AnswerId,
    ) -> Result<(), ForumError>;

    // ---- privileged principal & vault ---------------------------------------

    /// Credits `ctx.value` to the program's non-bounty balance.
    ///
    /// # Errors
    ///
    /// None in practice; kept fallible for uniformity.
    fn deposit(&mut self, ctx: &CallContext) -> Result<(), ForumError>;

    /// Sends the non-bounty balance to the privileged principal.
    ///
    /// # Errors
    ///
    /// `NotAuthorized`, `NonPayable`, transfer failures.
    fn withdraw_funds(&mut self, ctx: &CallContext) -> Result<U256, ForumError>;

    /// Hands the privileged role to another principal. Single step.
    ///
    /// # Errors
    ///
    /// `NotAuthorized`, `NonPayable`.
    fn transfer_privilege(&mut self, ctx: &CallContext, new_admin: Address)
        -> Result<(), ForumError>;

    // ---- read-only queries --------------------------------------------------

    /// Profile by address.
    fn profile(&self, user: &Address) -> Option<UserProfile>;

    /// Question by id.
    fn question(&self, id: QuestionId) -> Option<Question>;

    /// Answer by id.
    fn answer(&self, id: AnswerId) -> Option<Answer>;

    /// Question ids in a category, in posting order.
    fn questions_by_category(&self, category: &str) -> Vec<QuestionId>;

    /// Question ids posted by a user.
    fn questions_by_author(&self, author: &Address) -> Vec<QuestionId>;

    /// Answer ids submitted by a user.
    fn answers_by_author(&self, author: &Address) -> Vec<AnswerId>;

    /// Answer ids submitted to a question.
    fn answers_for_question(&self, question_id: QuestionId) -> Vec<AnswerId>;

    /// Current privileged principal.
    fn privileged_principal(&self) -> Address;
}
