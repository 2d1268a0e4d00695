//! The credit ledger: an append-only log of all credit transfers.
//!
//! # Design
//!
//! - **Append-only**: entries are never modified or deleted.
//! - **Double-entry**: every transfer names a paying and a receiving account.
//! - **Zero-sum**: the balances of all accounts, bank included, sum to zero.

use std::collections::BTreeMap;

use hexrail_types::PlayerId;
use tracing::trace;

use crate::conservation::{ConservationResult, verify_balances};
use crate::{Account, CreditEntry, CreditEntryKind, LedgerError};

/// Every credit transfer of one game, in the order it happened.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    /// All entries, in insertion order.
    entries: Vec<CreditEntry>,
}

impl Ledger {
    /// Create a new empty ledger.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Return the number of entries in the ledger.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return whether the ledger has no entries.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[CreditEntry] {
        &self.entries
    }

    /// Record a transfer of `amount` credits.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ZeroAmount`] for an empty transfer and
    /// [`LedgerError::SelfTransfer`] when both sides are the same account.
    pub fn record(
        &mut self,
        round: u32,
        kind: CreditEntryKind,
        from: Account,
        to: Account,
        amount: u32,
    ) -> Result<&CreditEntry, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        if from == to {
            return Err(LedgerError::SelfTransfer(from));
        }
        trace!(round, ?kind, %from, %to, amount, "Credit entry recorded");
        self.entries.push(CreditEntry {
            round,
            kind,
            from,
            to,
            amount,
        });
        self.entries.last().ok_or(LedgerError::ZeroAmount)
    }

    /// Net balance of `account` according to the recorded entries.
    ///
    /// The bank's balance is negative by the amount it has paid out net.
    pub fn balance(&self, account: Account) -> i64 {
        self.entries.iter().fold(0_i64, |balance, entry| {
            let amount = i64::from(entry.amount);
            if entry.to == account {
                balance.saturating_add(amount)
            } else if entry.from == account {
                balance.saturating_sub(amount)
            } else {
                balance
            }
        })
    }

    /// Recorded balances of every player account that appears in the log.
    pub fn player_balances(&self) -> BTreeMap<PlayerId, i64> {
        let mut balances: BTreeMap<PlayerId, i64> = BTreeMap::new();
        for entry in &self.entries {
            let amount = i64::from(entry.amount);
            if let Account::Player(id) = entry.to {
                let balance = balances.entry(id).or_insert(0);
                *balance = balance.saturating_add(amount);
            }
            if let Account::Player(id) = entry.from {
                let balance = balances.entry(id).or_insert(0);
                *balance = balance.saturating_sub(amount);
            }
        }
        balances
    }

    /// Total credits moved per entry kind.
    pub fn totals_by_kind(&self) -> BTreeMap<CreditEntryKind, u64> {
        let mut totals: BTreeMap<CreditEntryKind, u64> = BTreeMap::new();
        for entry in &self.entries {
            let total = totals.entry(entry.kind).or_insert(0);
            *total = total.saturating_add(u64::from(entry.amount));
        }
        totals
    }

    /// Compare the recorded balances with the live `balances` of the players.
    pub fn verify(&self, balances: &BTreeMap<PlayerId, u32>) -> ConservationResult {
        verify_balances(&self.entries, balances)
    }
}
