//! Observer trait for upload workflow events.
//!
//! Inject an [`Arc<dyn UploadObserver>`] via
//! [`crate::upload::UploadWorkflow::with_observer`] to receive every stage
//! change as it happens, plus the terminal success or error text.
//!
//! # Example
//!
//! ```rust
//! use paperdesk_client::{UploadObserver, UploadStage};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct CountingObserver {
//!     changes: AtomicUsize,
//! }
//!
//! impl UploadObserver for CountingObserver {
//!     fn on_stage(&self, stage: UploadStage) {
//!         self.changes.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("stage: {}", stage.label());
//!     }
//! }
//! ```

use crate::upload::UploadStage;
use std::sync::{Arc, Mutex};

/// Called by the upload workflow as it moves through its stages.
///
/// All methods have default no-op implementations so observers only
/// override what they care about.
pub trait UploadObserver: Send + Sync {
    /// Called on every stage transition, including the terminal one.
    fn on_stage(&self, stage: UploadStage) {
        let _ = stage;
    }

    /// Called once when the upload succeeded, with the success text.
    fn on_complete(&self, message: &str) {
        let _ = message;
    }

    /// Called whenever an error message is set: validation failures and
    /// rejected uploads alike.
    fn on_error(&self, message: &str) {
        let _ = message;
    }
}

/// A no-op implementation for callers that don't need events.
pub struct NoopObserver;

impl UploadObserver for NoopObserver {}

/// Convenience alias for the type stored in the workflow.
pub type SharedObserver = Arc<dyn UploadObserver>;

/// Records every stage it sees, in order.
#[derive(Debug, Default)]
pub struct StageLog {
    stages: Mutex<Vec<UploadStage>>,
    errors: Mutex<Vec<String>>,
}

impl StageLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn stages(&self) -> Vec<UploadStage> {
        self.stages.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl UploadObserver for StageLog {
    fn on_stage(&self, stage: UploadStage) {
        self.stages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(stage);
    }

    fn on_error(&self, message: &str) {
        self.errors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_observer_does_not_panic() {
        let obs = NoopObserver;
        obs.on_stage(UploadStage::RunningOcr);
        obs.on_complete("done");
        obs.on_error("boom");
    }

    #[test]
    fn stage_log_keeps_order() {
        let log = StageLog::new();
        log.on_stage(UploadStage::FileSelected);
        log.on_stage(UploadStage::RunningOcr);
        log.on_error("nope");
        assert_eq!(
            log.stages(),
            vec![UploadStage::FileSelected, UploadStage::RunningOcr]
        );
        assert_eq!(log.errors(), vec!["nope".to_string()]);
    }

    #[test]
    fn arc_dyn_observer_works() {
        let obs: SharedObserver = StageLog::new();
        obs.on_stage(UploadStage::Submitting);
    }
}
