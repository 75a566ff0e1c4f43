//! # Forum Ledger
//!
//! Keyed tables for profiles, questions and answers, the derived indices,
//! the native-currency vault and the id allocators.
//!
//! The tables are plain data and `Clone`, so a call can snapshot them and
//! restore on revert. The id allocators sit outside the snapshot: an id
//! handed out by a reverted call is burned, never reissued.

use crate::domain::entities::{Answer, Question, UserProfile};
use crate::domain::value_objects::{Address, AnswerId, QuestionId, U256};
use crate::errors::ForumError;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};

// =============================================================================
// ID ALLOCATION
// =============================================================================

/// Monotonic id counter scoped to one program instance.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU32,
}

impl IdAllocator {
    /// Starts at 1; 0 is never handed out.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
        }
    }

    /// Takes the next id.
    ///
    /// # Errors
    ///
    /// [`ForumError::IdSpaceExhausted`] once `u32::MAX` has been issued.
    pub fn allocate(&self) -> Result<u32, ForumError> {
        self.next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                if n == 0 {
                    None
                } else {
                    Some(n.wrapping_add(1))
                }
            })
            .map_err(|_| ForumError::IdSpaceExhausted)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// INDICES
// =============================================================================

/// Append-only lookup tables maintained alongside the content tables.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ForumIndex {
    /// category -> questions, in posting order.
    pub by_category: HashMap<String, Vec<QuestionId>>,
    /// author -> questions, in posting order.
    pub questions_by_author: HashMap<Address, Vec<QuestionId>>,
    /// author -> answers, in submission order.
    pub answers_by_author: HashMap<Address, Vec<AnswerId>>,
    /// question -> answers, in submission order.
    pub answers_by_question: HashMap<QuestionId, Vec<AnswerId>>,
}

// =============================================================================
// VAULT
// =============================================================================

/// Native currency held by the program.
///
/// `escrowed` is the part of `balance` owed to open bounties; the rest is
/// withdrawable by the privileged principal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Vault {
    /// Total held.
    pub balance: U256,
    /// Sum of open bounties.
    pub escrowed: U256,
}

impl Vault {
    /// Non-bounty funds.
    #[must_use]
    pub fn withdrawable(&self) -> U256 {
        self.balance.saturating_sub(self.escrowed)
    }
}

// =============================================================================
// LEDGER
// =============================================================================

/// All program-owned state except the id allocators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForumLedger {
    profiles: HashMap<Address, UserProfile>,
    questions: BTreeMap<QuestionId, Question>,
    answers: BTreeMap<AnswerId, Answer>,
    index: ForumIndex,
    vault: Vault,
    admin: Address,
}

impl ForumLedger {
    /// Empty ledger with the given privileged principal.
    #[must_use]
    pub fn new(admin: Address) -> Self {
        Self {
            profiles: HashMap::new(),
            questions: BTreeMap::new(),
            answers: BTreeMap::new(),
            index: ForumIndex::default(),
            vault: Vault::default(),
            admin,
        }
    }

    // ---- identity -----------------------------------------------------------

    /// Profile lookup.
    #[must_use]
    pub fn profile(&self, address: &Address) -> Option<&UserProfile> {
        self.profiles.get(address)
    }

    /// Mutable profile lookup.
    ///
    /// # Errors
    ///
    /// [`ForumError::NotInitialized`] if the principal has no profile.
    pub fn profile_mut(&mut self, address: &Address) -> Result<&mut UserProfile, ForumError> {
        self.profiles
            .get_mut(address)
            .ok_or(ForumError::NotInitialized(*address))
    }

    /// Fails unless the principal has a profile.
    ///
    /// # Errors
    ///
    /// [`ForumError::NotInitialized`].
    pub fn require_profile(&self, address: &Address) -> Result<&UserProfile, ForumError> {
        self.profiles
            .get(address)
            .ok_or(ForumError::NotInitialized(*address))
    }

    /// Stores a new profile. The caller has already checked for duplicates.
    pub fn insert_profile(&mut self, profile: UserProfile) {
        self.profiles.insert(profile.address, profile);
    }

    /// Iterates over every profile.
    pub fn profiles(&self) -> impl Iterator<Item = &UserProfile> {
        self.profiles.values()
    }

    // ---- content ------------------------------------------------------------

    /// Question lookup.
    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.get(&id)
    }

    /// Question lookup that fails with `NotFound`.
    ///
    /// # Errors
    ///
    /// [`ForumError::NotFound`] for an unknown id.
    pub fn require_question(&self, id: QuestionId) -> Result<&Question, ForumError> {
        self.questions
            .get(&id)
            .ok_or(ForumError::question_not_found(id))
    }

    /// Mutable question lookup.
    ///
    /// # Errors
    ///
    /// [`ForumError::NotFound`] for an unknown id.
    pub fn question_mut(&mut self, id: QuestionId) -> Result<&mut Question, ForumError> {
        self.questions
            .get_mut(&id)
            .ok_or(ForumError::question_not_found(id))
    }

    /// Answer lookup.
    #[must_use]
    pub fn answer(&self, id: AnswerId) -> Option<&Answer> {
        self.answers.get(&id)
    }

    /// Answer lookup that fails with `NotFound`.
    ///
    /// # Errors
    ///
    /// [`ForumError::NotFound`] for an unknown id.
    pub fn require_answer(&self, id: AnswerId) -> Result<&Answer, ForumError> {
        self.answers.get(&id).ok_or(ForumError::answer_not_found(id))
    }

    /// Mutable answer lookup.
    ///
    /// # Errors
    ///
    /// [`ForumError::NotFound`] for an unknown id.
    pub fn answer_mut(&mut self, id: AnswerId) -> Result<&mut Answer, ForumError> {
        self.answers
            .get_mut(&id)
            .ok_or(ForumError::answer_not_found(id))
    }

    /// Stores a question and appends it to the category and author indices.
    pub fn insert_question(&mut self, question: Question) {
        self.index
            .by_category
            .entry(question.category.clone())
            .or_default()
            .push(question.id);
        self.index
            .questions_by_author
            .entry(question.author)
            .or_default()
            .push(question.id);
        self.questions.insert(question.id, question);
    }

    /// Stores an answer, appends it to the question and author indices and
    /// bumps the parent's `answer_count`.
    ///
    /// # Errors
    ///
    /// [`ForumError::NotFound`] if the parent question is missing.
    pub fn insert_answer(&mut self, answer: Answer) -> Result<(), ForumError> {
        let question = self.question_mut(answer.question_id)?;
        question.answer_count = question.answer_count.saturating_add(1);

        self.index
            .answers_by_question
            .entry(answer.question_id)
            .or_default()
            .push(answer.id);
        self.index
            .answers_by_author
            .entry(answer.author)
            .or_default()
            .push(answer.id);
        self.answers.insert(answer.id, answer);
        Ok(())
    }

    /// Clears `is_best_answer` on every answer indexed under the question.
    ///
    /// Full sweep, O(answers per question).
    pub fn clear_best_answers(&mut self, question_id: QuestionId) {
        let Some(ids) = self.index.answers_by_question.get(&question_id) else {
            return;
        };
        for id in ids {
            if let Some(answer) = self.answers.get_mut(id) {
                answer.is_best_answer = false;
            }
        }
    }

    /// The answer currently flagged best for a question, if any.
    #[must_use]
    pub fn best_answer(&self, question_id: QuestionId) -> Option<AnswerId> {
        self.answers_for_question(question_id)
            .iter()
            .copied()
            .find(|id| self.answers.get(id).is_some_and(|a| a.is_best_answer))
    }

    /// Iterates over every question in id order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.values()
    }

    /// Iterates over every answer in id order.
    pub fn answers(&self) -> impl Iterator<Item = &Answer> {
        self.answers.values()
    }

    // ---- indices ------------------------------------------------------------

    /// Read access to the index tables.
    #[must_use]
    pub fn index(&self) -> &ForumIndex {
        &self.index
    }

    /// Questions posted under a category.
    #[must_use]
    pub fn questions_by_category(&self, category: &str) -> &[QuestionId] {
        self.index
            .by_category
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Questions posted by a principal.
    #[must_use]
    pub fn questions_by_author(&self, author: &Address) -> &[QuestionId] {
        self.index
            .questions_by_author
            .get(author)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Answers submitted by a principal.
    #[must_use]
    pub fn answers_by_author(&self, author: &Address) -> &[AnswerId] {
        self.index
            .answers_by_author
            .get(author)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Answers submitted to a question.
    #[must_use]
    pub fn answers_for_question(&self, question_id: QuestionId) -> &[AnswerId] {
        self.index
            .answers_by_question
            .get(&question_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // ---- vault & privilege --------------------------------------------------

    /// Current vault figures.
    #[must_use]
    pub fn vault(&self) -> Vault {
        self.vault
    }

    /// Mutable vault access.
    pub fn vault_mut(&mut self) -> &mut Vault {
        &mut self.vault
    }

    /// The privileged principal.
    #[must_use]
    pub fn admin(&self) -> Address {
        self.admin
    }

    /// Replaces the privileged principal.
    pub fn set_admin(&mut self, admin: Address) {
        self.admin = admin;
    }

    /// Fails unless `caller` is the privileged principal.
    ///
    /// # Errors
    ///
    /// [`ForumError::NotAuthorized`].
    pub fn require_admin(&self, caller: &Address) -> Result<(), ForumError> {
        if *caller != self.admin {
            return Err(ForumError::NotAuthorized(*caller));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{EncryptedContent, Handle};

    fn question(id: u32, category: &str, author: Address) -> Question {
        Question {
            id: QuestionId(id),
            category: category.to_string(),
            encrypted_content: EncryptedContent::from("q"),
            author,
            created_at: 1,
            answer_count: 0,
            reputation_gate: Handle::new([id as u8; 32]),
            is_active: true,
            bounty: U256::zero(),
        }
    }

    fn answer(id: u32, question_id: u32, author: Address) -> Answer {
        Answer {
            id: AnswerId(id),
            question_id: QuestionId(question_id),
            encrypted_content: EncryptedContent::from("a"),
            author,
            created_at: 2,
            score: Handle::new([0xA0 | id as u8; 32]),
            is_verified: false,
            is_best_answer: false,
        }
    }

    #[test]
    fn test_allocator_starts_at_one_and_increments() {
        let ids = IdAllocator::new();
        assert_eq!(ids.allocate().unwrap(), 1);
        assert_eq!(ids.allocate().unwrap(), 2);
        assert_eq!(ids.allocate().unwrap(), 3);
    }

    #[test]
    fn test_allocator_exhaustion() {
        let ids = IdAllocator {
            next: AtomicU32::new(u32::MAX),
        };
        assert_eq!(ids.allocate().unwrap(), u32::MAX);
        assert!(matches!(ids.allocate(), Err(ForumError::IdSpaceExhausted)));
        assert!(matches!(ids.allocate(), Err(ForumError::IdSpaceExhausted)));
    }

    #[test]
    fn test_insert_question_updates_indices() {
        let alice = Address::new([1u8; 20]);
        let mut ledger = ForumLedger::new(Address::ZERO);

        ledger.insert_question(question(1, "Rust", alice));
        ledger.insert_question(question(2, "Go", alice));
        ledger.insert_question(question(3, "Rust", alice));

        assert_eq!(
            ledger.questions_by_category("Rust"),
            &[QuestionId(1), QuestionId(3)]
        );
        assert_eq!(ledger.questions_by_author(&alice).len(), 3);
        assert!(ledger.questions_by_category("Haskell").is_empty());
    }

    #[test]
    fn test_insert_answer_bumps_count() {
        let alice = Address::new([1u8; 20]);
        let bob = Address::new([2u8; 20]);
        let mut ledger = ForumLedger::new(Address::ZERO);
        ledger.insert_question(question(1, "Rust", alice));

        ledger.insert_answer(answer(1, 1, bob)).unwrap();
        ledger.insert_answer(answer(2, 1, bob)).unwrap();

        assert_eq!(ledger.question(QuestionId(1)).unwrap().answer_count, 2);
        assert_eq!(
            ledger.answers_for_question(QuestionId(1)),
            &[AnswerId(1), AnswerId(2)]
        );
        assert_eq!(ledger.answers_by_author(&bob).len(), 2);
    }

    #[test]
    fn test_insert_answer_to_missing_question() {
        let mut ledger = ForumLedger::new(Address::ZERO);
        let result = ledger.insert_answer(answer(1, 9, Address::ZERO));
        assert!(matches!(result, Err(ForumError::NotFound { .. })));
        assert!(ledger.answer(AnswerId(1)).is_none());
    }

    #[test]
    fn test_clear_best_answers_sweeps_question_only() {
        let alice = Address::new([1u8; 20]);
        let mut ledger = ForumLedger::new(Address::ZERO);
        ledger.insert_question(question(1, "Rust", alice));
        ledger.insert_question(question(2, "Rust", alice));
        ledger.insert_answer(answer(1, 1, alice)).unwrap();
        ledger.insert_answer(answer(2, 2, alice)).unwrap();

        ledger.answer_mut(AnswerId(1)).unwrap().is_best_answer = true;
        ledger.answer_mut(AnswerId(2)).unwrap().is_best_answer = true;

        ledger.clear_best_answers(QuestionId(1));

        assert_eq!(ledger.best_answer(QuestionId(1)), None);
        assert_eq!(ledger.best_answer(QuestionId(2)), Some(AnswerId(2)));
    }

    #[test]
    fn test_vault_withdrawable() {
        let vault = Vault {
            balance: U256::from(150),
            escrowed: U256::from(100),
        };
        assert_eq!(vault.withdrawable(), U256::from(50));
    }

    #[test]
    fn test_require_admin() {
        let admin = Address::new([9u8; 20]);
        let ledger = ForumLedger::new(admin);
        assert!(ledger.require_admin(&admin).is_ok());
        assert!(matches!(
            ledger.require_admin(&Address::ZERO),
            Err(ForumError::NotAuthorized(_))
        ));
    }
}
