//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the forum program depends on. External adapters implement
//! these to provide:
//! - Confidential arithmetic and ACLs (homomorphic-encryption coprocessor)
//! - Off-ledger threshold decryption
//! - Native-currency transfers
//! - Event publication

use crate::domain::value_objects::{Address, Handle, Plaintext, U256};
use crate::errors::{EngineError, TransferError};
use crate::events::ForumEvent;
use crate::ports::inbound::ForumApi;
use async_trait::async_trait;

// =============================================================================
// CONFIDENTIAL ENGINE
// =============================================================================

/// Opaque-ciphertext capability.
///
/// ## Contract
///
/// - `add` is commutative and associative: the order deltas arrive in is
///   not observable in the result.
/// - `grant` is idempotent.
/// - The program may only pass a handle to `add` after `owner_grant` has
///   been called on it.
/// - No method returns a plaintext. Decryption lives behind
///   [`DecryptionService`], outside the program.
pub trait ConfidentialEngine: Send + Sync {
    /// Encrypts a plaintext into a fresh handle. The handle starts with an
    /// empty ACL.
    ///
    /// # Errors
    ///
    /// `Unavailable` if the backend cannot be reached.
    fn encode(&mut self, plaintext: Plaintext) -> Result<Handle, EngineError>;

    /// Homomorphic addition into a fresh handle.
    ///
    /// # Errors
    ///
    /// `UnknownHandle` for foreign handles, `AccessDenied` if the program
    /// holds no grant on an operand.
    fn add(&mut self, lhs: &Handle, rhs: &Handle) -> Result<Handle, EngineError>;

    /// Adds `principal` to the handle's ACL.
    ///
    /// # Errors
    ///
    /// `UnknownHandle`.
    fn grant(&mut self, handle: &Handle, principal: Address) -> Result<(), EngineError>;

    /// Grants the program itself.
    ///
    /// # Errors
    ///
    /// `UnknownHandle`.
    fn owner_grant(&mut self, handle: &Handle) -> Result<(), EngineError>;

    /// Returns true if `principal` is on the handle's ACL.
    fn is_granted(&self, handle: &Handle, principal: Address) -> bool;

    /// Every principal on the handle's ACL.
    fn grantees(&self, handle: &Handle) -> Vec<Address>;
}

// =============================================================================
// DECRYPTION SERVICE
// =============================================================================

/// Off-ledger threshold decryption.
///
/// Never called by the program. Clients and tests use it to read values
/// they are entitled to.
pub trait DecryptionService: Send + Sync {
    /// Reveals the plaintext behind a handle to an ACL member.
    ///
    /// # Errors
    ///
    /// `AccessDenied` if `requester` is not on the handle's ACL,
    /// `UnknownHandle` for foreign handles.
    fn decrypt(&self, handle: &Handle, requester: Address) -> Result<Plaintext, EngineError>;
}

// =============================================================================
// VALUE TRANSFER
// =============================================================================

/// Native-currency transfer out of the program.
///
/// Control leaves the program for the duration of `transfer`. The recipient
/// may call back into the program through `forum`; the program has already
/// committed its bookkeeping for this payout before handing over control.
pub trait ValueTransfer: Send {
    /// Sends `amount` to `to`.
    ///
    /// # Errors
    ///
    /// `Rejected` if the recipient refuses.
    fn transfer(
        &mut self,
        forum: &mut dyn ForumApi,
        to: Address,
        amount: U256,
    ) -> Result<(), TransferError>;
}

// =============================================================================
// EVENT PUBLISHER
// =============================================================================

/// Publishes committed forum events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one event. Returns the number of subscribers reached.
    async fn publish(&self, event: ForumEvent) -> usize;

    /// Total events published so far.
    fn events_published(&self) -> u64;
}
