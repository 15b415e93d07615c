//! Upload workflow: one PDF at a time through a fixed sequence of stages.
//!
//! ## Stages
//!
//! ```text
//! Idle ─select─▶ FileSelected ─start─▶ RunningOcr ─pace─▶ ExtractingText
//!                     ▲                                        │ pace
//!                     │ select                                 ▼
//!                  Failed ◀──────── upload rejected ───── Submitting
//!                                                              │ upload ok
//!                                                              ▼
//!                                                          Complete
//! ```
//!
//! `RunningOcr` and `ExtractingText` are paced by a [`StagePacer`]; the real
//! processing happens server-side during `Submitting`. A completed upload
//! hands back a [`PendingNavigation`] to the collection view, which is a
//! signal to the caller and not a workflow state.
//!
//! The upload trigger is only armed when a file is selected, nothing is in
//! flight, and the stage is `Idle`, `FileSelected` or `Failed`.

use crate::api::PaperService;
use crate::config::ClientConfig;
use crate::error::PaperDeskError;
use crate::navigation::{PendingNavigation, View};
use crate::pacing::{FixedDelayPacer, StagePacer, SCRIPTED_STAGES};
use crate::progress::SharedObserver;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const NO_FILE_MESSAGE: &str = "Please select a PDF file to upload.";
pub const IN_FLIGHT_MESSAGE: &str = "An upload is already in progress.";
pub const ALREADY_COMPLETE_MESSAGE: &str =
    "This file has already been uploaded. Choose another file to upload again.";

/// A visible step of the upload workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UploadStage {
    Idle,
    FileSelected,
    RunningOcr,
    ExtractingText,
    Submitting,
    Complete,
    Failed,
}

impl UploadStage {
    /// Stepper label for the stage.
    pub fn label(self) -> &'static str {
        match self {
            UploadStage::Idle | UploadStage::FileSelected => "Upload your PDF",
            UploadStage::RunningOcr => "Conducting OCR",
            UploadStage::ExtractingText | UploadStage::Submitting => "Extracting Text",
            UploadStage::Complete => "Processing Complete",
            UploadStage::Failed => "Upload failed",
        }
    }

    /// 0-based position on the four-step progress display.
    pub fn step(self) -> usize {
        match self {
            UploadStage::Idle | UploadStage::FileSelected | UploadStage::Failed => 0,
            UploadStage::RunningOcr => 1,
            UploadStage::ExtractingText | UploadStage::Submitting => 2,
            UploadStage::Complete => 3,
        }
    }

    /// Stages from which a new upload may be started.
    pub fn accepts_start(self) -> bool {
        matches!(
            self,
            UploadStage::Idle | UploadStage::FileSelected | UploadStage::Failed
        )
    }
}

/// The PDF chosen for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    name: String,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a local PDF, validating existence, permissions and magic bytes.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, PaperDeskError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PaperDeskError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => PaperDeskError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => PaperDeskError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        if bytes.len() >= 4 && &bytes[..4] != b"%PDF" {
            let mut magic = [0u8; 4];
            magic.copy_from_slice(&bytes[..4]);
            return Err(PaperDeskError::NotAPdf {
                path: path.to_path_buf(),
                magic,
            });
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.pdf".to_string());
        debug!("loaded '{}' ({} bytes)", name, bytes.len());
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn mime(&self) -> &'static str {
        "application/pdf"
    }
}

/// Result of [`UploadWorkflow::start_upload`].
#[derive(Debug)]
pub enum UploadOutcome {
    /// The trigger was not armed; nothing was sent and the stage is unchanged.
    Rejected { reason: String },
    /// The server accepted the file.
    Completed {
        message: String,
        navigation: PendingNavigation,
    },
    /// The upload request failed; the workflow is in `Failed`.
    Failed {
        message: String,
        error: PaperDeskError,
    },
}

impl UploadOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, UploadOutcome::Completed { .. })
    }
}

/// Drives a single upload through its stages.
pub struct UploadWorkflow {
    service: Arc<dyn PaperService>,
    pacer: Arc<dyn StagePacer>,
    observer: Option<SharedObserver>,
    navigation_delay: Duration,
    file: Option<UploadFile>,
    stage: UploadStage,
    message: Option<String>,
    error: Option<String>,
    in_flight: bool,
}

impl UploadWorkflow {
    /// A workflow paced by the delays in `config`.
    pub fn new(service: Arc<dyn PaperService>, config: &ClientConfig) -> Self {
        Self {
            service,
            pacer: Arc::new(FixedDelayPacer::from_config(config)),
            observer: None,
            navigation_delay: config.navigation_delay(),
            file: None,
            stage: UploadStage::Idle,
            message: None,
            error: None,
            in_flight: false,
        }
    }

    pub fn with_pacer(mut self, pacer: Arc<dyn StagePacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_navigation_delay(mut self, delay: Duration) -> Self {
        self.navigation_delay = delay;
        self
    }

    pub fn stage(&self) -> UploadStage {
        self.stage
    }

    /// Success alert text, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Error alert text, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn file(&self) -> Option<&UploadFile> {
        self.file.as_ref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Whether the upload trigger is armed.
    pub fn can_start(&self) -> bool {
        self.file.is_some() && !self.in_flight && self.stage.accepts_start()
    }

    /// Choose a file, discarding any previous job and its messages.
    pub fn select_file(&mut self, file: UploadFile) {
        debug!("selected {:?}", file);
        self.file = Some(file);
        self.message = None;
        self.error = None;
        self.in_flight = false;
        self.set_stage(UploadStage::FileSelected);
    }

    /// Run the selected file through the stages and submit it.
    ///
    /// When the trigger is not armed this only records a validation error.
    pub async fn start_upload(&mut self) -> UploadOutcome {
        let Some(file) = self.file.clone() else {
            return self.reject(NO_FILE_MESSAGE);
        };
        if self.in_flight {
            let reason = if self.stage == UploadStage::Complete {
                ALREADY_COMPLETE_MESSAGE
            } else {
                IN_FLIGHT_MESSAGE
            };
            return self.reject(reason);
        }
        if !self.stage.accepts_start() {
            return self.reject(IN_FLIGHT_MESSAGE);
        }

        info!("starting upload of '{}'", file.name());
        self.in_flight = true;
        self.message = None;
        self.error = None;

        for stage in SCRIPTED_STAGES {
            self.set_stage(stage);
            self.pacer.pace(stage).await;
        }

        self.set_stage(UploadStage::Submitting);
        match self.service.upload(&file).await {
            Ok(receipt) => {
                let message = format!("File uploaded successfully: {}", receipt.message);
                info!("upload of '{}' complete", file.name());
                self.message = Some(message.clone());
                self.error = None;
                self.set_stage(UploadStage::Complete);
                if let Some(obs) = &self.observer {
                    obs.on_complete(&message);
                }
                UploadOutcome::Completed {
                    message,
                    navigation: PendingNavigation::new(View::Collection, self.navigation_delay),
                }
            }
            Err(error) => {
                let detail = match &error {
                    PaperDeskError::Upload {
                        message: Some(m), ..
                    } => m.clone(),
                    _ => "Unknown error".to_string(),
                };
                let message = format!("Error uploading file: {detail}");
                warn!("upload of '{}' failed: {}", file.name(), error);
                self.message = None;
                self.error = Some(message.clone());
                self.in_flight = false;
                self.set_stage(UploadStage::Failed);
                if let Some(obs) = &self.observer {
                    obs.on_error(&message);
                }
                UploadOutcome::Failed { message, error }
            }
        }
    }

    fn reject(&mut self, reason: &str) -> UploadOutcome {
        debug!("upload trigger not armed: {}", reason);
        self.message = None;
        self.error = Some(reason.to_string());
        if let Some(obs) = &self.observer {
            obs.on_error(reason);
        }
        UploadOutcome::Rejected {
            reason: reason.to_string(),
        }
    }

    fn set_stage(&mut self, stage: UploadStage) {
        self.stage = stage;
        if let Some(obs) = &self.observer {
            obs.on_stage(stage);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::StageLog;
    use crate::testutil::{pdf, FakeService};
    use tokio_test::assert_ok;

    fn workflow(service: Arc<FakeService>, log: Arc<StageLog>) -> UploadWorkflow {
        let config = ClientConfig::builder()
            .base_url("http://localhost")
            .ocr_delay_ms(0)
            .extraction_delay_ms(0)
            .navigation_delay_ms(0)
            .build()
            .unwrap();
        UploadWorkflow::new(service, &config).with_observer(log)
    }

    #[tokio::test]
    async fn successful_upload_walks_every_stage() {
        let service = Arc::new(FakeService::default());
        let log = StageLog::new();
        let mut wf = workflow(Arc::clone(&service), Arc::clone(&log));
        let mut observed = vec![wf.stage()];

        wf.select_file(pdf("paper.pdf"));
        let outcome = wf.start_upload().await;
        observed.extend(log.stages());

        assert_eq!(
            observed,
            vec![
                UploadStage::Idle,
                UploadStage::FileSelected,
                UploadStage::RunningOcr,
                UploadStage::ExtractingText,
                UploadStage::Submitting,
                UploadStage::Complete,
            ]
        );
        match outcome {
            UploadOutcome::Completed {
                message,
                navigation,
            } => {
                assert_eq!(message, "File uploaded successfully: PDF uploaded successfully");
                assert_eq!(navigation.target, View::Collection);
                assert_eq!(navigation.wait().await, View::Collection);
            }
            other => panic!("expected completion, got {other:?}"),
        }
        assert_eq!(wf.error(), None);
        assert_eq!(service.calls(), vec!["upload paper.pdf".to_string()]);
    }

    #[tokio::test]
    async fn failed_upload_ends_in_failed_with_flag_cleared() {
        let service = Arc::new(FakeService::failing_upload(Some("File type not supported")));
        let log = StageLog::new();
        let mut wf = workflow(service, Arc::clone(&log));

        wf.select_file(pdf("paper.pdf"));
        let outcome = wf.start_upload().await;

        assert!(matches!(outcome, UploadOutcome::Failed { .. }));
        assert_eq!(
            log.stages(),
            vec![
                UploadStage::FileSelected,
                UploadStage::RunningOcr,
                UploadStage::ExtractingText,
                UploadStage::Submitting,
                UploadStage::Failed,
            ]
        );
        assert!(!wf.is_in_flight());
        assert_eq!(wf.error(), Some("Error uploading file: File type not supported"));
        assert_eq!(wf.message(), None);
        assert!(wf.can_start(), "a failed job can be resubmitted");
    }

    #[tokio::test]
    async fn failure_without_server_message_is_unknown_error() {
        let service = Arc::new(FakeService::failing_upload(None));
        let mut wf = workflow(service, StageLog::new());
        wf.select_file(pdf("paper.pdf"));
        wf.start_upload().await;
        assert_eq!(wf.error(), Some("Error uploading file: Unknown error"));
    }

    #[tokio::test]
    async fn start_without_file_stays_idle() {
        let service = Arc::new(FakeService::default());
        let log = StageLog::new();
        let mut wf = workflow(Arc::clone(&service), Arc::clone(&log));

        let outcome = wf.start_upload().await;

        assert!(matches!(outcome, UploadOutcome::Rejected { .. }));
        assert_eq!(wf.stage(), UploadStage::Idle);
        assert_eq!(wf.error(), Some(NO_FILE_MESSAGE));
        assert!(log.stages().is_empty());
        assert!(service.calls().is_empty());
        assert!(!wf.can_start());
    }

    #[tokio::test]
    async fn completed_job_cannot_be_resubmitted() {
        let service = Arc::new(FakeService::default());
        let mut wf = workflow(Arc::clone(&service), StageLog::new());
        wf.select_file(pdf("paper.pdf"));
        assert!(wf.start_upload().await.is_completed());
        assert!(!wf.can_start());

        let outcome = wf.start_upload().await;
        assert!(matches!(outcome, UploadOutcome::Rejected { .. }));
        assert_eq!(wf.stage(), UploadStage::Complete);
        assert_eq!(service.calls().len(), 1);
    }

    #[tokio::test]
    async fn reselecting_after_failure_resets_the_job() {
        let service = Arc::new(FakeService::failing_upload(Some("nope")));
        let mut wf = workflow(Arc::clone(&service), StageLog::new());
        wf.select_file(pdf("first.pdf"));
        wf.start_upload().await;
        assert_eq!(wf.stage(), UploadStage::Failed);

        *service.upload_result.lock().unwrap() = Ok("ok".into());
        wf.select_file(pdf("second.pdf"));
        assert_eq!(wf.stage(), UploadStage::FileSelected);
        assert_eq!(wf.error(), None);

        assert!(wf.start_upload().await.is_completed());
        assert_eq!(wf.file().map(UploadFile::name), Some("second.pdf"));
    }

    #[test]
    fn stage_steps_match_the_four_step_display() {
        assert_eq!(UploadStage::FileSelected.step(), 0);
        assert_eq!(UploadStage::RunningOcr.step(), 1);
        assert_eq!(UploadStage::Submitting.step(), 2);
        assert_eq!(UploadStage::Complete.step(), 3);
        assert_eq!(UploadStage::Failed.step(), 0);
        assert_eq!(UploadStage::RunningOcr.label(), "Conducting OCR");
    }

    #[tokio::test]
    async fn from_path_reads_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.pdf");
        std::fs::write(&path, b"%PDF-1.4 body").unwrap();

        let file = assert_ok!(UploadFile::from_path(&path).await);
        assert_eq!(file.name(), "paper.pdf");
        assert_eq!(file.len(), 13);
    }

    #[tokio::test]
    async fn from_path_rejects_non_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello world").unwrap();

        let err = UploadFile::from_path(&path).await.unwrap_err();
        assert!(matches!(err, PaperDeskError::NotAPdf { magic, .. } if &magic == b"hell"));
    }

    #[tokio::test]
    async fn from_path_missing_file() {
        let err = UploadFile::from_path("/definitely/not/here.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, PaperDeskError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn from_path_directory_is_a_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = UploadFile::from_path(dir.path()).await.unwrap_err();
        assert!(
            matches!(err, PaperDeskError::ReadFailed { ref path, .. } if path == dir.path()),
            "got: {err:?}"
        );
    }
}
