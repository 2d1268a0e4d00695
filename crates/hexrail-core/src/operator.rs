//! Operator control of a running game.
//!
//! The game loop runs on its own thread; the [`StopHandle`] is shared
//! with whoever may end the game early (a Ctrl-C handler, a UI). The loop
//! checks it before handing the turn to a player.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable flag requesting the game loop to stop.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stop_requested: Arc<AtomicBool>,
}

impl StopHandle {
    /// A handle with no stop requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. The game ends before the next turn starts.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let handle = StopHandle::new();
        let clone = handle.clone();
        assert!(!clone.is_stop_requested());
        handle.request_stop();
        assert!(clone.is_stop_requested());
    }
}
