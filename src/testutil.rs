//! In-memory [`PaperService`] for unit tests.

use crate::api::{AuthResponse, PaperService, UploadReceipt};
use crate::error::PaperDeskError;
use crate::paper::{Authors, Paper};
use crate::upload::UploadFile;
use async_trait::async_trait;
use std::sync::Mutex;

/// Scripted responses for each operation, plus a log of calls made.
pub struct FakeService {
    pub auth_token: Mutex<Option<String>>,
    pub auth_fails: Mutex<bool>,
    pub upload_result: Mutex<Result<String, Option<String>>>,
    pub papers: Mutex<Option<Vec<Paper>>>,
    pub export_bytes: Mutex<Option<Vec<u8>>>,
    pub delete_fails: Mutex<bool>,
    pub calls: Mutex<Vec<String>>,
}

impl Default for FakeService {
    fn default() -> Self {
        Self {
            auth_token: Mutex::new(Some("T".into())),
            auth_fails: Mutex::new(false),
            upload_result: Mutex::new(Ok("PDF uploaded successfully".into())),
            papers: Mutex::new(Some(Vec::new())),
            export_bytes: Mutex::new(Some(b"PK\x03\x04xlsx".to_vec())),
            delete_fails: Mutex::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeService {
    pub fn with_papers(papers: Vec<Paper>) -> Self {
        let svc = Self::default();
        *svc.papers.lock().unwrap() = Some(papers);
        svc
    }

    pub fn failing_upload(message: Option<&str>) -> Self {
        let svc = Self::default();
        *svc.upload_result.lock().unwrap() = Err(message.map(str::to_string));
        svc
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn auth(&self) -> Result<AuthResponse, PaperDeskError> {
        if *self.auth_fails.lock().unwrap() {
            return Err(PaperDeskError::Auth {
                status: Some(401),
                detail: "Invalid credentials".into(),
            });
        }
        Ok(AuthResponse {
            access_token: self.auth_token.lock().unwrap().clone(),
            token_type: Some("bearer".into()),
        })
    }
}

#[async_trait]
impl PaperService for FakeService {
    async fn signup(&self, email: &str, _password: &str) -> Result<AuthResponse, PaperDeskError> {
        self.record(format!("signup {email}"));
        self.auth()
    }

    async fn login(&self, email: &str, _password: &str) -> Result<AuthResponse, PaperDeskError> {
        self.record(format!("login {email}"));
        self.auth()
    }

    async fn upload(&self, file: &UploadFile) -> Result<UploadReceipt, PaperDeskError> {
        self.record(format!("upload {}", file.name()));
        match self.upload_result.lock().unwrap().clone() {
            Ok(message) => Ok(UploadReceipt {
                message,
                paper: None,
            }),
            Err(message) => Err(PaperDeskError::Upload {
                status: Some(400),
                message,
            }),
        }
    }

    async fn list_papers(&self) -> Result<Vec<Paper>, PaperDeskError> {
        self.record("list");
        self.papers.lock().unwrap().clone().ok_or(PaperDeskError::Fetch {
            status: Some(500),
            detail: "HTTP 500 Internal Server Error".into(),
        })
    }

    async fn export_papers(&self) -> Result<Vec<u8>, PaperDeskError> {
        self.record("export");
        self.export_bytes
            .lock()
            .unwrap()
            .clone()
            .ok_or(PaperDeskError::Export {
                status: Some(404),
                detail: "No papers found to export.".into(),
            })
    }

    async fn delete_paper(&self, id: &str) -> Result<(), PaperDeskError> {
        self.record(format!("delete {id}"));
        if *self.delete_fails.lock().unwrap() {
            return Err(PaperDeskError::Delete {
                id: id.to_string(),
                status: Some(404),
                detail: "Paper not found".into(),
            });
        }
        if let Some(papers) = self.papers.lock().unwrap().as_mut() {
            papers.retain(|p| p.id != id);
        }
        Ok(())
    }
}

pub fn paper(id: &str, title: &str, authors: &[&str]) -> Paper {
    Paper {
        id: id.to_string(),
        title: title.to_string(),
        authors: Authors::List(authors.iter().map(|a| a.to_string()).collect()),
        date: None,
        doi: None,
        summary: None,
    }
}

pub fn pdf(name: &str) -> UploadFile {
    UploadFile::new(name, b"%PDF-1.7\n%fake\n".to_vec())
}
