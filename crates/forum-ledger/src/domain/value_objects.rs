//! # Value Objects
//!
//! Immutable domain primitives for the confidential forum.
//! These types are defined by their value, not identity.

use serde::{Deserialize, Serialize};
use std::fmt;

// Native-currency amounts (bounties, deposits, withdrawals).
pub use primitive_types::U256;

/// Unix timestamp in seconds, as supplied by the hosting ledger.
pub type Timestamp = u64;

/// Plaintext scalar accepted by the confidential engine.
///
/// Plaintexts only ever flow INTO the engine; nothing in the program reads
/// one back.
pub type Plaintext = u64;

// =============================================================================
// ADDRESS (20 bytes)
// =============================================================================

/// A 20-byte principal address (users, the program, the privileged principal).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address (0x0000...0000).
    pub const ZERO: Self = Self([0u8; 20]);

    /// Creates an address from a 20-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Creates an address from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() == 20 {
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(slice);
            Some(Self(bytes))
        } else {
            None
        }
    }

    /// Parses a hex address, with or without a `0x` prefix.
    #[must_use]
    pub fn from_hex(s: &str) -> Option<Self> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed).ok()?;
        Self::from_slice(&bytes)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns true if this is the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "...")?;
        for byte in &self.0[18..] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

// =============================================================================
// HANDLE (32 bytes, opaque)
// =============================================================================

/// Opaque reference to an encrypted scalar held by the confidential engine.
///
/// A handle carries no inspectable value. The program stores, replaces and
/// forwards handles but never branches on what they encrypt. A field that
/// receives a new handle supersedes the old one; handles are never edited
/// in place.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle(pub [u8; 32]);

impl Handle {
    /// Creates a handle from raw identifier bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the identifier bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle(0x")?;
        for byte in &self.0[..6] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "..)")
    }
}

// =============================================================================
// ENTITY IDS
// =============================================================================

/// Question identifier. Allocated sequentially from 1, never reused.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct QuestionId(pub u32);

/// Answer identifier. Independent counter from [`QuestionId`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AnswerId(pub u32);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.0)
    }
}

impl fmt::Display for AnswerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A{}", self.0)
    }
}

// =============================================================================
// ENCRYPTED CONTENT
// =============================================================================

/// Client-encrypted post body. Stored verbatim; the program never derives
/// or inspects it.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EncryptedContent(pub Vec<u8>);

impl EncryptedContent {
    /// Wraps an already-encrypted payload.
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrows the payload bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for EncryptedContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedContent({} bytes)", self.0.len())
    }
}

impl From<&str> for EncryptedContent {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for EncryptedContent {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_from_hex() {
        let addr = Address::from_hex("0x0101010101010101010101010101010101010101").unwrap();
        assert_eq!(addr, Address::new([1u8; 20]));

        let bare = Address::from_hex("0202020202020202020202020202020202020202").unwrap();
        assert_eq!(bare, Address::new([2u8; 20]));

        assert!(Address::from_hex("0x1234").is_none());
        assert!(Address::from_hex("not-hex").is_none());
    }

    #[test]
    fn test_address_display_is_abbreviated() {
        let addr = Address::new([0xAB; 20]);
        assert_eq!(addr.to_string(), "0xabababab...abab");
        assert_eq!(format!("{addr:?}").len(), 42);
    }

    #[test]
    fn test_handle_debug_hides_tail() {
        let handle = Handle::new([0xCD; 32]);
        assert_eq!(format!("{handle:?}"), "Handle(0xcdcdcdcdcdcd..)");
    }

    #[test]
    fn test_encrypted_content_debug_hides_payload() {
        let content = EncryptedContent::from("secret body");
        assert_eq!(format!("{content:?}"), "EncryptedContent(11 bytes)");
        assert!(!content.is_empty());
        assert!(EncryptedContent::default().is_empty());
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&QuestionId(7)).unwrap();
        assert_eq!(json, "7");
        let id: AnswerId = serde_json::from_str("3").unwrap();
        assert_eq!(id, AnswerId(3));
    }
}
