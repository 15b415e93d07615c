//! Error types for the paperdesk-client library.
//!
//! Every remote operation has its own variant so callers can tell *which*
//! step failed without parsing message text:
//!
//! * [`PaperDeskError::Auth`]   — signup or login rejected
//! * [`PaperDeskError::Upload`] — transport failure or server rejection on upload
//! * [`PaperDeskError::Fetch`]  — the paper list could not be retrieved
//! * [`PaperDeskError::Delete`] — a paper could not be deleted
//! * [`PaperDeskError::Export`] — the spreadsheet export failed
//!
//! The controllers in [`crate::upload`] and [`crate::collection`] catch these
//! at their boundary and turn them into alert text; the variants stay
//! available for callers (and tests) that need the structured cause.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the paperdesk-client library.
#[derive(Debug, Error)]
pub enum PaperDeskError {
    // ── Remote operation errors ───────────────────────────────────────────
    /// Signup or login was rejected (bad credentials, duplicate account).
    #[error("Authentication failed: {detail}")]
    Auth {
        status: Option<u16>,
        detail: String,
    },

    /// The upload request failed in transport or was rejected by the server.
    ///
    /// `message` is the server-supplied `message` field when the response
    /// carried one, otherwise `None`.
    #[error("Upload failed: {}", message.as_deref().unwrap_or("Unknown error"))]
    Upload {
        status: Option<u16>,
        message: Option<String>,
    },

    /// The paper list could not be fetched or decoded.
    #[error("Failed to fetch papers: {detail}")]
    Fetch {
        status: Option<u16>,
        detail: String,
    },

    /// Deleting paper `id` failed.
    #[error("Failed to delete paper '{id}': {detail}")]
    Delete {
        id: String,
        status: Option<u16>,
        detail: String,
    },

    /// The spreadsheet export failed.
    #[error("Failed to export papers: {detail}")]
    Export {
        status: Option<u16>,
        detail: String,
    },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Upload file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The path exists but could not be read as a file (a directory, an
    /// I/O fault).
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Local storage errors ──────────────────────────────────────────────
    /// The persisted session file could not be read or written.
    #[error("Session storage error at '{path}': {detail}")]
    SessionStorage { path: PathBuf, detail: String },

    /// Could not write an exported file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PaperDeskError {
    /// HTTP status of the failed remote call, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            PaperDeskError::Auth { status, .. }
            | PaperDeskError::Upload { status, .. }
            | PaperDeskError::Fetch { status, .. }
            | PaperDeskError::Delete { status, .. }
            | PaperDeskError::Export { status, .. } => *status,
            _ => None,
        }
    }
}
