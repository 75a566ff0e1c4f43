//! # Access Control List Adapter
//!
//! Per-handle sets of principals allowed to request decryption.

use crate::domain::value_objects::{Address, Handle};
use std::collections::{BTreeSet, HashMap};

/// Outcome of a grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrantStatus {
    /// Principal newly added.
    Granted,
    /// Principal was already present; nothing changed.
    AlreadyGranted,
}

/// In-memory ACL.
#[derive(Clone, Debug, Default)]
pub struct InMemoryAcl {
    /// handle -> permitted principals.
    entries: HashMap<Handle, BTreeSet<Address>>,
}

impl InMemoryAcl {
    /// Create a new empty ACL.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-populated grants.
    #[must_use]
    pub fn with_grants(grants: impl IntoIterator<Item = (Handle, Address)>) -> Self {
        let mut acl = Self::new();
        for (handle, principal) in grants {
            acl.grant(handle, principal);
        }
        acl
    }

    /// Adds a principal to a handle's ACL. Idempotent.
    pub fn grant(&mut self, handle: Handle, principal: Address) -> GrantStatus {
        if self.entries.entry(handle).or_default().insert(principal) {
            GrantStatus::Granted
        } else {
            GrantStatus::AlreadyGranted
        }
    }

    /// Returns true if the principal may decrypt the handle.
    #[must_use]
    pub fn is_granted(&self, handle: &Handle, principal: Address) -> bool {
        self.entries
            .get(handle)
            .is_some_and(|principals| principals.contains(&principal))
    }

    /// Principals on the handle's ACL, in address order.
    #[must_use]
    pub fn grantees(&self, handle: &Handle) -> Vec<Address> {
        self.entries
            .get(handle)
            .map(|principals| principals.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of handles with at least one grant.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no grants exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
