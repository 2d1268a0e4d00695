//! Credit ledger for the hexrail board game.
//!
//! Every credit that changes hands in a game is recorded here: starting
//! grants, building costs, parallel fees, connection bonuses, rent and
//! winnings. Players' balances live on the players themselves; the ledger
//! is an independent record used to check them.
//!
//! # Architecture
//!
//! - [`ledger`] -- The [`Ledger`] struct: append-only log and balance queries.
//! - [`conservation`] -- Comparison of recorded and live balances.
//!
//! # Accounts
//!
//! Credits move between [`Account::Bank`], an unlimited source and sink,
//! and [`Account::Player`] accounts:
//!
//! | Kind | From | To |
//! |------|------|----|
//! | `StartingCredits` | Bank | Player |
//! | `BuildCost` | Player | Bank |
//! | `ParallelFee` | Player | Player |
//! | `ConnectionBonus` | Bank | Player |
//! | `Rent` | Player | Player |
//! | `Winnings` | Bank | Player |
//!
//! # Usage
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use hexrail_ledger::{Account, ConservationResult, CreditEntryKind, Ledger};
//! use hexrail_types::PlayerId;
//!
//! let mut ledger = Ledger::new();
//! let alice = Account::Player(PlayerId(1));
//! ledger.record(0, CreditEntryKind::StartingCredits, Account::Bank, alice, 20).ok();
//! ledger.record(1, CreditEntryKind::BuildCost, alice, Account::Bank, 3).ok();
//!
//! let live = BTreeMap::from([(PlayerId(1), 17)]);
//! assert_eq!(ledger.verify(&live), ConservationResult::Balanced);
//! ```

pub mod conservation;
pub mod ledger;

// Re-export primary types at crate root.
pub use conservation::ConservationResult;
pub use ledger::Ledger;

use std::collections::BTreeMap;

use hexrail_types::PlayerId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Accounts and entries
// ---------------------------------------------------------------------------

/// One side of a credit transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Account {
    /// The game itself: pays grants and winnings, collects building costs.
    Bank,
    /// A player's credit balance.
    Player(PlayerId),
}

impl core::fmt::Display for Account {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bank => f.write_str("bank"),
            Self::Player(id) => write!(f, "player {id}"),
        }
    }
}

/// Why credits moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditEntryKind {
    /// Initial balance granted at setup.
    StartingCredits,
    /// Base cost of a rail built during the driving phase.
    BuildCost,
    /// Fee paid to a rail owner for building next to their rail.
    ParallelFee,
    /// Bonus for connecting a city no rail reached before.
    ConnectionBonus,
    /// Rent paid to a rail owner for using their rail.
    Rent,
    /// Prize for reaching the target city.
    Winnings,
}

/// A single recorded transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditEntry {
    /// Round in which the transfer happened (0 during setup).
    pub round: u32,
    /// Category of the transfer.
    pub kind: CreditEntryKind,
    /// Paying account.
    pub from: Account,
    /// Receiving account.
    pub to: Account,
    /// Credits moved, always positive.
    pub amount: u32,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when recording ledger entries.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Amount must be strictly positive.
    #[error("ledger entry amount must be non-zero")]
    ZeroAmount,

    /// An account cannot pay itself.
    #[error("ledger entry from {0} to itself")]
    SelfTransfer(Account),

    /// A player tried to pay more than they hold.
    #[error("{player} cannot pay {amount} credits, balance is {balance}")]
    InsufficientCredits {
        /// The paying player.
        player: PlayerId,
        /// Amount requested.
        amount: u32,
        /// Balance at the time.
        balance: u32,
    },

    /// A player account referenced by a transfer does not exist.
    #[error("no player {0}")]
    UnknownPlayer(PlayerId),

    /// A balance left the range of `u32`.
    #[error("balance of {0} overflowed")]
    Overflow(Account),
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// Disagreement between the ledger and the live player balances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAnomaly {
    /// Per-player `(recorded, live)` balances that differ.
    pub mismatches: BTreeMap<PlayerId, (i64, i64)>,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for LedgerAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
