//! # paperdesk-client
//!
//! Client library for the PaperDesk service: sign in, upload a research
//! paper PDF for server-side extraction, and manage the resulting collection
//! of paper records (view, filter, delete, export to a spreadsheet).
//!
//! ## Components
//!
//! ```text
//! Session ──▶ ApiClient (PaperService) ◀── UploadWorkflow
//!                  ▲                            │ completed
//!                  │                            ▼
//!                  └──────────────────── PaperCollection ──▶ ExportArtifact
//! ```
//!
//! * [`session`]    — bearer token, persisted under a fixed key
//! * [`api`]        — the six remote operations, one request each, no retry
//! * [`upload`]     — the staged upload state machine
//! * [`collection`] — fetch/sort/filter/delete over the held paper list
//! * [`export`]     — spreadsheet bytes → named, typed file
//! * [`auth`]       — login / signup / logout flows over the session
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use paperdesk_client::{ApiClient, ClientConfig, PaperCollection, Session, UploadFile, UploadWorkflow};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::from_env()?; // PAPERDESK_API_URL
//!     let session = Session::open_file(&config.session_path)?;
//!     let api = Arc::new(ApiClient::new(config.clone(), session)?);
//!
//!     let mut upload = UploadWorkflow::new(api.clone(), &config);
//!     upload.select_file(UploadFile::from_path("paper.pdf").await?);
//!     let outcome = upload.start_upload().await;
//!     println!("{:?}", outcome);
//!
//!     let mut papers = PaperCollection::new(api);
//!     papers.refresh().await;
//!     for p in papers.filter("transformer") {
//!         println!("{}  {}", p.title, p.authors_display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `paperdesk` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod auth;
pub mod collection;
pub mod config;
pub mod error;
pub mod export;
pub mod navigation;
pub mod pacing;
pub mod paper;
pub mod progress;
pub mod session;
pub mod upload;

#[cfg(test)]
pub(crate) mod testutil;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use api::{ApiClient, AuthResponse, PaperService, UploadReceipt};
pub use auth::AuthOutcome;
pub use collection::{PaperCollection, RefreshStatus};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::PaperDeskError;
pub use export::{to_downloadable, ExportArtifact, EXPORT_FILENAME, XLSX_MIME};
pub use navigation::{PendingNavigation, View};
pub use pacing::{FixedDelayPacer, StagePacer};
pub use paper::{decode_id_timestamp, filter_papers, sort_by_id_desc, Authors, Paper};
pub use progress::{NoopObserver, SharedObserver, StageLog, UploadObserver};
pub use session::{FileStore, KeyValueStore, MemoryStore, Session, TOKEN_KEY};
pub use upload::{UploadFile, UploadOutcome, UploadStage, UploadWorkflow};
