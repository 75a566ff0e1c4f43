//! # Confidential Engine Adapter
//!
//! In-memory stand-in for a homomorphic-encryption coprocessor plus its
//! threshold-decryption service.
//!
//! Values are hidden with a one-time additive mask: a handle's ciphertext is
//! `plaintext + mask (mod 2^64)`. Adding two ciphertexts adds their masks,
//! so the sum decrypts correctly without either operand ever being opened.
//! Masks live in a separate key-share table that only the decryption path
//! reads, and only for ACL members.
//!
//! Not a cryptographic scheme. It exists so the program can be exercised
//! against the same contract a real coprocessor honours.

use crate::adapters::acl::InMemoryAcl;
use crate::domain::value_objects::{Address, Handle, Plaintext};
use crate::errors::EngineError;
use crate::ports::outbound::{ConfidentialEngine, DecryptionService};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha3::{Digest, Keccak256};
use std::collections::HashMap;
use tracing::trace;

/// In-memory confidential engine.
#[derive(Debug)]
pub struct InMemoryConfidentialEngine {
    /// Principal that `owner_grant` grants.
    program: Address,
    /// handle -> masked value.
    ciphertexts: HashMap<Handle, u64>,
    /// handle -> mask. Read only by decryption.
    key_shares: HashMap<Handle, u64>,
    /// Decryption rights.
    acl: InMemoryAcl,
    /// Mask source.
    rng: StdRng,
    /// Handles minted so far (feeds handle derivation).
    minted: u64,
    /// When false every operation fails with `Unavailable`.
    available: bool,
}

impl InMemoryConfidentialEngine {
    /// Engine bound to a program address, seeded from OS entropy.
    #[must_use]
    pub fn new(program: Address) -> Self {
        Self::from_rng(program, StdRng::from_entropy())
    }

    /// Engine with a fixed seed, for reproducible handles in tests.
    #[must_use]
    pub fn with_seed(program: Address, seed: u64) -> Self {
        Self::from_rng(program, StdRng::seed_from_u64(seed))
    }

    fn from_rng(program: Address, rng: StdRng) -> Self {
        Self {
            program,
            ciphertexts: HashMap::new(),
            key_shares: HashMap::new(),
            acl: InMemoryAcl::new(),
            rng,
            minted: 0,
            available: true,
        }
    }

    /// Program address this engine grants on `owner_grant`.
    #[must_use]
    pub fn program(&self) -> Address {
        self.program
    }

    /// Number of handles minted.
    #[must_use]
    pub fn handle_count(&self) -> usize {
        self.ciphertexts.len()
    }

    /// Simulates the backend going down or coming back.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    fn ensure_available(&self) -> Result<(), EngineError> {
        if self.available {
            Ok(())
        } else {
            Err(EngineError::Unavailable("confidential backend offline".to_string()))
        }
    }

    fn ensure_known(&self, handle: &Handle) -> Result<u64, EngineError> {
        self.ciphertexts
            .get(handle)
            .copied()
            .ok_or(EngineError::UnknownHandle(*handle))
    }

    fn mint(&mut self, ciphertext: u64, mask: u64) -> Handle {
        self.minted += 1;

        let mut hasher = Keccak256::new();
        hasher.update(self.program.as_bytes());
        hasher.update(self.minted.to_be_bytes());
        hasher.update(ciphertext.to_be_bytes());
        let handle = Handle::new(hasher.finalize().into());

        self.ciphertexts.insert(handle, ciphertext);
        self.key_shares.insert(handle, mask);
        trace!(handle = ?handle, minted = self.minted, "Handle minted");
        handle
    }
}

impl ConfidentialEngine for InMemoryConfidentialEngine {
    fn encode(&mut self, plaintext: Plaintext) -> Result<Handle, EngineError> {
        self.ensure_available()?;
        let mask: u64 = self.rng.gen();
        Ok(self.mint(plaintext.wrapping_add(mask), mask))
    }

    fn add(&mut self, lhs: &Handle, rhs: &Handle) -> Result<Handle, EngineError> {
        self.ensure_available()?;
        let left = self.ensure_known(lhs)?;
        let right = self.ensure_known(rhs)?;

        for operand in [lhs, rhs] {
            if !self.acl.is_granted(operand, self.program) {
                return Err(EngineError::AccessDenied {
                    handle: *operand,
                    principal: self.program,
                });
            }
        }

        let mask = self.key_shares[lhs].wrapping_add(self.key_shares[rhs]);
        Ok(self.mint(left.wrapping_add(right), mask))
    }

    fn grant(&mut self, handle: &Handle, principal: Address) -> Result<(), EngineError> {
        self.ensure_known(handle)?;
        self.acl.grant(*handle, principal);
        Ok(())
    }

    fn owner_grant(&mut self, handle: &Handle) -> Result<(), EngineError> {
        let program = self.program;
        self.grant(handle, program)
    }

    fn is_granted(&self, handle: &Handle, principal: Address) -> bool {
        self.acl.is_granted(handle, principal)
    }

    fn grantees(&self, handle: &Handle) -> Vec<Address> {
        self.acl.grantees(handle)
    }
}

impl DecryptionService for InMemoryConfidentialEngine {
    fn decrypt(&self, handle: &Handle, requester: Address) -> Result<Plaintext, EngineError> {
        let ciphertext = self.ensure_known(handle)?;
        if !self.acl.is_granted(handle, requester) {
            return Err(EngineError::AccessDenied {
                handle: *handle,
                principal: requester,
            });
        }
        let mask = self
            .key_shares
            .get(handle)
            .copied()
            .ok_or(EngineError::UnknownHandle(*handle))?;
        Ok(ciphertext.wrapping_sub(mask))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM: Address = Address::new([0x42; 20]);
    const ALICE: Address = Address::new([1u8; 20]);

    fn owned(engine: &mut InMemoryConfidentialEngine, value: u64) -> Handle {
        let handle = engine.encode(value).unwrap();
        engine.owner_grant(&handle).unwrap();
        handle
    }

    #[test]
    fn test_encode_hides_plaintext() {
        let mut engine = InMemoryConfidentialEngine::with_seed(PROGRAM, 7);
        let handle = engine.encode(50).unwrap();
        assert_ne!(engine.ciphertexts[&handle], 50);
    }

    #[test]
    fn test_add_is_homomorphic() {
        let mut engine = InMemoryConfidentialEngine::with_seed(PROGRAM, 1);
        let a = owned(&mut engine, 50);
        let b = owned(&mut engine, 25);

        let sum = engine.add(&a, &b).unwrap();
        engine.grant(&sum, ALICE).unwrap();

        assert_eq!(engine.decrypt(&sum, ALICE).unwrap(), 75);
    }

    #[test]
    fn test_add_is_order_independent() {
        let mut engine = InMemoryConfidentialEngine::with_seed(PROGRAM, 2);
        let a = owned(&mut engine, 3);
        let b = owned(&mut engine, 4);
        let c = owned(&mut engine, 5);

        let ab = engine.add(&a, &b).unwrap();
        engine.owner_grant(&ab).unwrap();
        let left = engine.add(&ab, &c).unwrap();

        let cb = engine.add(&c, &b).unwrap();
        engine.owner_grant(&cb).unwrap();
        let right = engine.add(&cb, &a).unwrap();

        assert_ne!(left, right);
        // Fresh handles start with an empty ACL.
        assert!(engine.grantees(&left).is_empty());

        engine.owner_grant(&left).unwrap();
        engine.owner_grant(&right).unwrap();
        assert_eq!(engine.decrypt(&left, PROGRAM).unwrap(), 12);
        assert_eq!(engine.decrypt(&right, PROGRAM).unwrap(), 12);
    }

    #[test]
    fn test_add_requires_program_grant() {
        let mut engine = InMemoryConfidentialEngine::with_seed(PROGRAM, 3);
        let granted = owned(&mut engine, 1);
        let ungranted = engine.encode(2).unwrap();

        let result = engine.add(&granted, &ungranted);
        assert!(matches!(
            result,
            Err(EngineError::AccessDenied { principal, .. }) if principal == PROGRAM
        ));
    }

    #[test]
    fn test_decrypt_requires_acl() {
        let mut engine = InMemoryConfidentialEngine::with_seed(PROGRAM, 4);
        let handle = owned(&mut engine, 9);

        assert!(matches!(
            engine.decrypt(&handle, ALICE),
            Err(EngineError::AccessDenied { .. })
        ));
        engine.grant(&handle, ALICE).unwrap();
        assert_eq!(engine.decrypt(&handle, ALICE).unwrap(), 9);
    }

    #[test]
    fn test_unknown_handle() {
        let mut engine = InMemoryConfidentialEngine::with_seed(PROGRAM, 5);
        let foreign = Handle::new([0xEE; 32]);
        assert!(matches!(
            engine.grant(&foreign, ALICE),
            Err(EngineError::UnknownHandle(_))
        ));
    }

    #[test]
    fn test_unavailable_backend() {
        let mut engine = InMemoryConfidentialEngine::with_seed(PROGRAM, 6);
        engine.set_available(false);
        assert!(matches!(engine.encode(1), Err(EngineError::Unavailable(_))));
        engine.set_available(true);
        assert!(engine.encode(1).is_ok());
    }

    #[test]
    fn test_handles_are_unique() {
        let mut engine = InMemoryConfidentialEngine::with_seed(PROGRAM, 8);
        let a = engine.encode(0).unwrap();
        let b = engine.encode(0).unwrap();
        assert_ne!(a, b);
        assert_eq!(engine.handle_count(), 2);
    }
}
