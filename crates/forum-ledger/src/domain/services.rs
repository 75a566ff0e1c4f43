//! # Domain Services
//!
//! Pure rules: the reputation accrual table and input validation.
//! Nothing here touches the confidential engine; the program turns an
//! [`Accrual`] into an encode + homomorphic add.

use crate::domain::value_objects::{EncryptedContent, Plaintext};
use crate::errors::ForumError;

// =============================================================================
// ACCRUAL RULES
// =============================================================================

/// Ledger events that accrue confidential credit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LedgerEvent {
    /// An answer was submitted; credits the submitter.
    AnswerSubmitted,
    /// A vote was cast; credits the voter.
    VoteCast,
    /// An answer went from unverified to verified; credits its author.
    AnswerVerified,
    /// An answer was chosen as best; credits its author.
    BestAnswerSelected,
}

/// Which confidential aggregate an accrual lands in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    /// `UserProfile::reputation`.
    Reputation,
    /// `UserProfile::contributions`.
    Contributions,
}

/// A positive delta to apply to one aggregate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Accrual {
    /// Target aggregate.
    pub kind: AggregateKind,
    /// Plaintext delta, encoded before it reaches the aggregate.
    pub amount: Plaintext,
}

/// Deterministic mapping from ledger events to confidential deltas.
///
/// All deltas are additive. There is no decay or penalty path. The table is
/// fixed; there is no configuration surface for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewardTable {
    answer_contribution: Plaintext,
    vote_participation: Plaintext,
    verified_answer: Plaintext,
    best_answer: Plaintext,
}

impl RewardTable {
    /// The only table the program accrues with.
    pub const STANDARD: Self = Self {
        answer_contribution: 1,
        vote_participation: 1,
        verified_answer: 10,
        best_answer: 25,
    };

    /// Looks up the accrual for an event.
    #[must_use]
    pub fn accrual_for(&self, event: LedgerEvent) -> Accrual {
        match event {
            LedgerEvent::AnswerSubmitted => Accrual {
                kind: AggregateKind::Contributions,
                amount: self.answer_contribution,
            },
            LedgerEvent::VoteCast => Accrual {
                kind: AggregateKind::Reputation,
                amount: self.vote_participation,
            },
            LedgerEvent::AnswerVerified => Accrual {
                kind: AggregateKind::Reputation,
                amount: self.verified_answer,
            },
            LedgerEvent::BestAnswerSelected => Accrual {
                kind: AggregateKind::Reputation,
                amount: self.best_answer,
            },
        }
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Rejects empty post bodies.
///
/// # Errors
///
/// [`ForumError::EmptyContent`] if the payload has no bytes.
pub fn validate_content(content: &EncryptedContent) -> Result<(), ForumError> {
    if content.is_empty() {
        return Err(ForumError::EmptyContent);
    }
    Ok(())
}

/// Upper bound of the closed vote range `[0, MAX_SCORE]`.
pub const MAX_SCORE: u8 = 10;

/// Checks a vote against the closed range `[0, MAX_SCORE]`.
///
/// # Errors
///
/// [`ForumError::InvalidScore`] if `score > MAX_SCORE`.
pub fn validate_score(score: u8) -> Result<(), ForumError> {
    if score > MAX_SCORE {
        return Err(ForumError::InvalidScore {
            score,
            max: MAX_SCORE,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_reward_table() {
        let table = RewardTable::STANDARD;

        let submitted = table.accrual_for(LedgerEvent::AnswerSubmitted);
        assert_eq!(submitted.kind, AggregateKind::Contributions);
        assert_eq!(submitted.amount, 1);

        let vote = table.accrual_for(LedgerEvent::VoteCast);
        assert_eq!(vote.kind, AggregateKind::Reputation);
        assert_eq!(vote.amount, 1);

        assert_eq!(table.accrual_for(LedgerEvent::AnswerVerified).amount, 10);
        assert_eq!(table.accrual_for(LedgerEvent::BestAnswerSelected).amount, 25);
    }

    #[test]
    fn test_best_answer_is_largest_award() {
        let table = RewardTable::STANDARD;
        let best = table.accrual_for(LedgerEvent::BestAnswerSelected).amount;
        for event in [
            LedgerEvent::AnswerSubmitted,
            LedgerEvent::VoteCast,
            LedgerEvent::AnswerVerified,
        ] {
            assert!(table.accrual_for(event).amount < best);
        }
    }

    #[test]
    fn test_validate_score_bounds() {
        assert!(validate_score(0).is_ok());
        assert!(validate_score(10).is_ok());
        assert!(matches!(
            validate_score(11),
            Err(ForumError::InvalidScore { score: 11, max: 10 })
        ));
        assert!(validate_score(u8::MAX).is_err());
    }

    #[test]
    fn test_validate_content() {
        assert!(validate_content(&EncryptedContent::from("x")).is_ok());
        assert!(matches!(
            validate_content(&EncryptedContent::default()),
            Err(ForumError::EmptyContent)
        ));
    }
}
