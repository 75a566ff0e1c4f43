//! # Treasury Adapter
//!
//! In-memory native-currency transfer layer. Credits recipients and keeps a
//! payout log. Recipients can be marked as refusing transfers.

use crate::domain::value_objects::{Address, U256};
use crate::errors::TransferError;
use crate::ports::inbound::ForumApi;
use crate::ports::outbound::ValueTransfer;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// One completed transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payout {
    /// Recipient.
    pub to: Address,
    /// Amount sent.
    pub amount: U256,
}

/// In-memory value-transfer adapter.
#[derive(Clone, Debug, Default)]
pub struct InMemoryTreasury {
    /// Credited balances per recipient.
    balances: HashMap<Address, U256>,
    /// Transfer log in order.
    payouts: Vec<Payout>,
    /// Recipients that reject incoming transfers.
    refusing: HashSet<Address>,
}

impl InMemoryTreasury {
    /// Create a new empty treasury.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every future transfer to `recipient` fail.
    pub fn refuse(&mut self, recipient: Address) {
        self.refusing.insert(recipient);
    }

    /// Total received by an address.
    #[must_use]
    pub fn balance_of(&self, address: &Address) -> U256 {
        self.balances.get(address).copied().unwrap_or_default()
    }

    /// Every transfer made, in order.
    #[must_use]
    pub fn payouts(&self) -> &[Payout] {
        &self.payouts
    }
}

impl ValueTransfer for InMemoryTreasury {
    fn transfer(
        &mut self,
        _forum: &mut dyn ForumApi,
        to: Address,
        amount: U256,
    ) -> Result<(), TransferError> {
        if self.refusing.contains(&to) {
            return Err(TransferError::Rejected(format!("{to} refuses transfers")));
        }

        let balance = self.balances.entry(to).or_default();
        *balance = balance.saturating_add(amount);
        self.payouts.push(Payout { to, amount });

        debug!(to = %to, amount = %amount, "Value transferred");
        Ok(())
    }
}
