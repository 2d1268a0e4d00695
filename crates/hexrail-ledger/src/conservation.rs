//! Conservation check between the ledger and live player balances.
//!
//! Credits are only created by the bank and only destroyed into it, so
//! replaying the ledger must reproduce every player's live balance. A
//! mismatch means some code path moved credits without recording them,
//! and is reported as a [`LedgerAnomaly`].

use std::collections::{BTreeMap, BTreeSet};

use hexrail_types::PlayerId;
use tracing::error;

use crate::{Account, CreditEntry, LedgerAnomaly};

/// The result of comparing recorded and live balances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConservationResult {
    /// Every player's live balance matches the ledger.
    Balanced,
    /// At least one player diverges.
    Anomaly(LedgerAnomaly),
}

impl ConservationResult {
    /// Whether the balances matched.
    pub const fn is_balanced(&self) -> bool {
        matches!(self, Self::Balanced)
    }
}

/// Replay `entries` and compare each player's result with `live`.
///
/// Players that appear on either side are checked; a player missing from
/// one side counts as a zero balance there.
pub fn verify_balances(
    entries: &[CreditEntry],
    live: &BTreeMap<PlayerId, u32>,
) -> ConservationResult {
    let mut recorded: BTreeMap<PlayerId, i64> = BTreeMap::new();
    for entry in entries {
        let amount = i64::from(entry.amount);
        if let Account::Player(id) = entry.to {
            let balance = recorded.entry(id).or_insert(0);
            *balance = balance.saturating_add(amount);
        }
        if let Account::Player(id) = entry.from {
            let balance = recorded.entry(id).or_insert(0);
            *balance = balance.saturating_sub(amount);
        }
    }

    let players: BTreeSet<PlayerId> = recorded.keys().chain(live.keys()).copied().collect();
    let mut mismatches: BTreeMap<PlayerId, (i64, i64)> = BTreeMap::new();
    for player in players {
        let on_record = recorded.get(&player).copied().unwrap_or(0);
        let actual = live.get(&player).copied().map_or(0, i64::from);
        if on_record != actual {
            mismatches.insert(player, (on_record, actual));
        }
    }

    if mismatches.is_empty() {
        return ConservationResult::Balanced;
    }

    let details: Vec<String> = mismatches
        .iter()
        .map(|(player, (on_record, actual))| {
            format!("player {player}: recorded {on_record}, live {actual}")
        })
        .collect();
    let message = format!("LEDGER_ANOMALY: {}", details.join("; "));
    error!(mismatches = mismatches.len(), %message, "Ledger conservation violated");
    ConservationResult::Anomaly(LedgerAnomaly {
        mismatches,
        message,
    })
}
