//! Players and their credit balances.

use hexrail_types::{AiKind, PlayerColor, PlayerId};

/// A participant of the game.
///
/// The balance is never negative: [`remove_credits`](Self::remove_credits)
/// refuses rather than overdraw. Rails are not stored here; they are a
/// view over the grid's edge owners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    id: PlayerId,
    name: String,
    color: PlayerColor,
    ai: Option<AiKind>,
    credits: u32,
}

impl Player {
    /// Create a player without credits.
    pub const fn new(id: PlayerId, name: String, color: PlayerColor, ai: Option<AiKind>) -> Self {
        Self {
            id,
            name,
            color,
            ai,
            credits: 0,
        }
    }

    /// Player identifier, also the turn order.
    pub const fn id(&self) -> PlayerId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display colour.
    pub const fn color(&self) -> PlayerColor {
        self.color
    }

    /// AI controller kind, `None` for humans.
    pub const fn ai(&self) -> Option<&AiKind> {
        self.ai.as_ref()
    }

    /// Whether an AI controls this player.
    pub const fn is_ai(&self) -> bool {
        self.ai.is_some()
    }

    /// Current balance.
    pub const fn credits(&self) -> u32 {
        self.credits
    }

    /// Add `amount` credits. Returns `false` and changes nothing on overflow.
    pub const fn add_credits(&mut self, amount: u32) -> bool {
        match self.credits.checked_add(amount) {
            Some(credits) => {
                self.credits = credits;
                true
            }
            None => false,
        }
    }

    /// Remove `amount` credits. Returns `false` and changes nothing if the
    /// balance is too small.
    pub const fn remove_credits(&mut self, amount: u32) -> bool {
        match self.credits.checked_sub(amount) {
            Some(credits) => {
                self.credits = credits;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player::new(PlayerId(1), "Ada".into(), PlayerColor::new(0, 0, 0), None)
    }

    #[test]
    fn credits_never_go_negative() {
        let mut player = player();
        assert!(player.add_credits(5));
        assert!(!player.remove_credits(6));
        assert_eq!(player.credits(), 5);
        assert!(player.remove_credits(5));
        assert_eq!(player.credits(), 0);
    }

    #[test]
    fn overflow_is_refused() {
        let mut player = player();
        assert!(player.add_credits(u32::MAX));
        assert!(!player.add_credits(1));
        assert_eq!(player.credits(), u32::MAX);
    }
}
