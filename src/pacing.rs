//! Stage pacing for the upload workflow.
//!
//! The client performs no OCR or text extraction; the service does all the
//! work inside the single upload request. The "Conducting OCR" and
//! "Extracting Text" stages are therefore a fixed script, and a
//! [`StagePacer`] decides how long each scripted stage stays visible.
//!
//! [`FixedDelayPacer`] sleeps for a configured duration per stage. A pacer
//! fed by real server progress events can replace it without changing the
//! workflow's state machine.

use crate::config::ClientConfig;
use crate::upload::UploadStage;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Stages shown, in order, before the upload request is sent.
pub const SCRIPTED_STAGES: [UploadStage; 2] = [UploadStage::RunningOcr, UploadStage::ExtractingText];

/// Decides when a scripted stage is finished.
///
/// `pace` runs to completion; there is no cancellation.
#[async_trait]
pub trait StagePacer: Send + Sync {
    async fn pace(&self, stage: UploadStage);
}

/// Sleeps a fixed duration per scripted stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelayPacer {
    pub ocr: Duration,
    pub extraction: Duration,
}

impl FixedDelayPacer {
    pub fn new(ocr: Duration, extraction: Duration) -> Self {
        Self { ocr, extraction }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.ocr_delay(), config.extraction_delay())
    }

    /// No delays at all.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    fn delay_for(&self, stage: UploadStage) -> Duration {
        match stage {
            UploadStage::RunningOcr => self.ocr,
            UploadStage::ExtractingText => self.extraction,
            _ => Duration::ZERO,
        }
    }
}

#[async_trait]
impl StagePacer for FixedDelayPacer {
    async fn pace(&self, stage: UploadStage) {
        let delay = self.delay_for(stage);
        if delay.is_zero() {
            return;
        }
        debug!("pacing {:?} for {:?}", stage, delay);
        tokio::time::sleep(delay).await;
    }
}
