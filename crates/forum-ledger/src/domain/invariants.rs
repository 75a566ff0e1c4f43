//! # Domain Invariants
//!
//! Properties that MUST hold between calls. The service re-checks them after
//! every committed call when `verify_invariants` is enabled.
//!
//! - INVARIANT-1: Best-answer exclusivity (at most one per question)
//! - INVARIANT-2: Answer count matches the per-question index
//! - INVARIANT-3: Index sequences are strictly increasing (append-only)
//! - INVARIANT-4: Escrow solvency (escrowed == open bounties <= balance)
//! - INVARIANT-5: ACL coverage (program + owner on every stored handle)

use crate::domain::ledger::ForumLedger;
use crate::domain::value_objects::{Address, Handle, QuestionId, U256};

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// INVARIANT-1: Best-Answer Exclusivity
#[must_use]
pub fn check_best_answer_exclusivity(ledger: &ForumLedger, question_id: QuestionId) -> bool {
    ledger
        .answers_for_question(question_id)
        .iter()
        .filter(|id| ledger.answer(**id).is_some_and(|a| a.is_best_answer))
        .count()
        <= 1
}

/// INVARIANT-2: Answer Count Consistency
#[must_use]
pub fn check_answer_count_invariant(ledger: &ForumLedger, question_id: QuestionId) -> bool {
    ledger.question(question_id).map_or(true, |q| {
        q.answer_count as usize == ledger.answers_for_question(question_id).len()
    })
}

/// INVARIANT-3: Monotonic Indices
///
/// Ids are allocated in increasing order and indices are append-only, so
/// every index sequence must be strictly increasing.
#[must_use]
pub fn check_index_monotonicity(ledger: &ForumLedger) -> bool {
    fn increasing<T: Ord>(ids: &[T]) -> bool {
        ids.windows(2).all(|w| w[0] < w[1])
    }

    let index = ledger.index();
    index.by_category.values().all(|v| increasing(v))
        && index.questions_by_author.values().all(|v| increasing(v))
        && index.answers_by_author.values().all(|v| increasing(v))
        && index.answers_by_question.values().all(|v| increasing(v))
}

/// INVARIANT-4: Escrow Solvency
#[must_use]
pub fn check_escrow_invariant(ledger: &ForumLedger) -> bool {
    let open = ledger
        .questions()
        .fold(U256::zero(), |acc, q| acc.saturating_add(q.bounty));
    let vault = ledger.vault();
    vault.escrowed == open && vault.escrowed <= vault.balance
}

/// INVARIANT-5: ACL Coverage
///
/// `is_granted` answers whether a principal may decrypt a handle.
pub fn check_acl_coverage<F>(ledger: &ForumLedger, program: Address, is_granted: F) -> Vec<Handle>
where
    F: Fn(&Handle, Address) -> bool,
{
    let covered = |handle: &Handle, owner: Address| {
        is_granted(handle, program) && is_granted(handle, owner)
    };

    let mut uncovered = Vec::new();
    for profile in ledger.profiles() {
        for handle in [profile.reputation, profile.contributions] {
            if !covered(&handle, profile.address) {
                uncovered.push(handle);
            }
        }
    }
    for question in ledger.questions() {
        if !covered(&question.reputation_gate, question.author) {
            uncovered.push(question.reputation_gate);
        }
    }
    for answer in ledger.answers() {
        if !covered(&answer.score, answer.author) {
            uncovered.push(answer.score);
        }
    }
    uncovered
}

/// Check all invariants at once.
pub fn check_all_invariants<F>(
    ledger: &ForumLedger,
    program: Address,
    is_granted: F,
) -> InvariantCheckResult
where
    F: Fn(&Handle, Address) -> bool,
{
    let mut violations = Vec::new();

    for question in ledger.questions() {
        if !check_best_answer_exclusivity(ledger, question.id) {
            violations.push(InvariantViolation::MultipleBestAnswers(question.id));
        }
        if !check_answer_count_invariant(ledger, question.id) {
            violations.push(InvariantViolation::AnswerCountMismatch {
                question_id: question.id,
                recorded: question.answer_count,
                indexed: ledger.answers_for_question(question.id).len(),
            });
        }
    }

    if !check_index_monotonicity(ledger) {
        violations.push(InvariantViolation::IndexNotMonotonic);
    }

    if !check_escrow_invariant(ledger) {
        let vault = ledger.vault();
        violations.push(InvariantViolation::EscrowMismatch {
            escrowed: vault.escrowed,
            balance: vault.balance,
        });
    }

    let uncovered = check_acl_coverage(ledger, program, is_granted);
    if !uncovered.is_empty() {
        violations.push(InvariantViolation::MissingGrants(uncovered));
    }

    if violations.is_empty() {
        InvariantCheckResult::Valid
    } else {
        InvariantCheckResult::Invalid(violations)
    }
}

// =============================================================================
// INVARIANT RESULT TYPES
// =============================================================================

/// Result of invariant checking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantCheckResult {
    /// All invariants satisfied.
    Valid,
    /// One or more invariants violated.
    Invalid(Vec<InvariantViolation>),
}

impl InvariantCheckResult {
    /// Returns true if all invariants are satisfied.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Returns the violations (empty if valid).
    #[must_use]
    pub fn violations(&self) -> &[InvariantViolation] {
        match self {
            Self::Valid => &[],
            Self::Invalid(v) => v,
        }
    }
}

/// Specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// INVARIANT-1.
    MultipleBestAnswers(QuestionId),
    /// INVARIANT-2.
    AnswerCountMismatch {
        /// Question concerned.
        question_id: QuestionId,
        /// `answer_count` on the question.
        recorded: u32,
        /// Length of the per-question index.
        indexed: usize,
    },
    /// INVARIANT-3.
    IndexNotMonotonic,
    /// INVARIANT-4.
    EscrowMismatch {
        /// Vault escrow figure.
        escrowed: U256,
        /// Vault balance.
        balance: U256,
    },
    /// INVARIANT-5.
    MissingGrants(Vec<Handle>),
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MultipleBestAnswers(id) => {
                write!(f, "INVARIANT-1: {id} has more than one best answer")
            }
            Self::AnswerCountMismatch {
                question_id,
                recorded,
                indexed,
            } => write!(
                f,
                "INVARIANT-2: {question_id} answer_count {recorded} != indexed {indexed}"
            ),
            Self::IndexNotMonotonic => write!(f, "INVARIANT-3: index not strictly increasing"),
            Self::EscrowMismatch { escrowed, balance } => write!(
                f,
                "INVARIANT-4: escrow {escrowed} inconsistent with bounties or balance {balance}"
            ),
            Self::MissingGrants(handles) => {
                write!(f, "INVARIANT-5: {} handle(s) missing grants", handles.len())
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
