//! Views the controllers can ask the caller to move to.
//!
//! Routing itself belongs to the host application; the library only says
//! *where* to go next and, for the post-upload hand-off, *when*.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A top-level screen of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    Login,
    Signup,
    Upload,
    /// The paper management view backed by [`crate::collection::PaperCollection`].
    Collection,
}

/// A one-shot, delayed request to show `target`.
///
/// Returned by a completed upload. It is not part of the workflow state:
/// awaiting it (or not) has no effect on the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingNavigation {
    pub target: View,
    pub delay: Duration,
}

impl PendingNavigation {
    pub fn new(target: View, delay: Duration) -> Self {
        Self { target, delay }
    }

    /// Sleep for `delay`, then yield the target view.
    pub async fn wait(self) -> View {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_delay_resolves_immediately() {
        let nav = PendingNavigation::new(View::Collection, Duration::ZERO);
        assert_eq!(nav.wait().await, View::Collection);
    }

    #[tokio::test]
    async fn delay_is_honoured() {
        let nav = PendingNavigation::new(View::Collection, Duration::from_millis(20));
        let start = std::time::Instant::now();
        assert_eq!(nav.wait().await, View::Collection);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
