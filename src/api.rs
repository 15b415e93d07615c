//! API gateway: the six remote operations of the PaperDesk service.
//!
//! [`PaperService`] is the seam the controllers depend on; [`ApiClient`] is
//! its reqwest implementation. Each call is exactly one request/response
//! cycle. There is no retry and no timeout beyond the transport default.
//! A failure never touches local state; it only comes back as a
//! [`PaperDeskError`] variant named after the operation.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | signup    | `POST /signup` `{email, password}` |
//! | login     | `POST /login` `{email, password}` |
//! | upload    | `POST /upload` multipart field `file` |
//! | list      | `GET /papers` |
//! | export    | `GET /papers/export` |
//! | delete    | `DELETE /papers/{id}` |
//!
//! Every call except signup and login sends `Authorization: Bearer <token>`
//! when the [`Session`] holds a token, and no header otherwise.

use crate::config::ClientConfig;
use crate::error::PaperDeskError;
use crate::paper::Paper;
use crate::session::Session;
use crate::upload::UploadFile;
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Body of a successful signup or login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Body of a successful upload.
///
/// Read leniently: any 2xx is an accepted upload, whatever the body holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub message: String,
    /// The raw stored record, when the server echoes one back.
    #[serde(default)]
    pub paper: Option<serde_json::Value>,
}

impl UploadReceipt {
    /// Pull `message` and `paper` out of a success body. Bodies that are not
    /// a JSON object yield an empty receipt.
    pub fn from_body(body: &str) -> Self {
        let value: serde_json::Value = match serde_json::from_str(body) {
            Ok(v) => v,
            Err(_) => return Self::default(),
        };
        Self {
            message: json_field(body, "message").unwrap_or_default(),
            paper: value.get("paper").filter(|p| !p.is_null()).cloned(),
        }
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// The remote operations the workflow and collection controllers rely on.
#[async_trait]
pub trait PaperService: Send + Sync {
    async fn signup(&self, email: &str, password: &str) -> Result<AuthResponse, PaperDeskError>;

    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, PaperDeskError>;

    async fn upload(&self, file: &UploadFile) -> Result<UploadReceipt, PaperDeskError>;

    async fn list_papers(&self) -> Result<Vec<Paper>, PaperDeskError>;

    /// Raw spreadsheet bytes.
    async fn export_papers(&self) -> Result<Vec<u8>, PaperDeskError>;

    async fn delete_paper(&self, id: &str) -> Result<(), PaperDeskError>;
}

/// reqwest-backed [`PaperService`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(config: ClientConfig, session: Arc<Session>) -> Result<Self, PaperDeskError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| PaperDeskError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            config,
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn post_credentials(
        &self,
        path: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, PaperDeskError> {
        let url = self.config.endpoint(path);
        info!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .json(&Credentials { email, password })
            .send()
            .await
            .map_err(|e| PaperDeskError::Auth {
                status: None,
                detail: e.to_string(),
            })?;

        if !response.status().is_success() {
            let (status, detail) = failure_detail(response).await;
            return Err(PaperDeskError::Auth {
                status: Some(status),
                detail,
            });
        }

        response
            .json::<AuthResponse>()
            .await
            .map_err(|e| PaperDeskError::Auth {
                status: None,
                detail: format!("malformed response: {e}"),
            })
    }

    fn paper_url(&self, id: &str) -> Result<Url, PaperDeskError> {
        let mut url = Url::parse(&self.config.endpoint("papers"))
            .map_err(|e| PaperDeskError::InvalidConfig(format!("base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| PaperDeskError::InvalidConfig("base URL cannot carry a path".into()))?
            .push(id);
        Ok(url)
    }
}

#[async_trait]
impl PaperService for ApiClient {
    async fn signup(&self, email: &str, password: &str) -> Result<AuthResponse, PaperDeskError> {
        self.post_credentials("signup", email, password).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, PaperDeskError> {
        self.post_credentials("login", email, password).await
    }

    async fn upload(&self, file: &UploadFile) -> Result<UploadReceipt, PaperDeskError> {
        let url = self.config.endpoint("upload");
        info!("POST {} ({} bytes, '{}')", url, file.len(), file.name());

        let part = reqwest::multipart::Part::bytes(file.bytes().to_vec())
            .file_name(file.name().to_string())
            .mime_str(file.mime())
            .map_err(|e| PaperDeskError::Internal(format!("multipart: {e}")))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .authorize(self.http.post(&url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                debug!("upload transport failure: {e}");
                PaperDeskError::Upload {
                    status: None,
                    message: None,
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("upload rejected with {}: {}", status, body);
            return Err(PaperDeskError::Upload {
                status: Some(status.as_u16()),
                message: json_field(&body, "message"),
            });
        }

        let body = response.text().await.unwrap_or_else(|e| {
            debug!("upload accepted but body unreadable: {e}");
            String::new()
        });
        let receipt = UploadReceipt::from_body(&body);
        debug!("upload accepted with {}: {}", status, receipt.message);
        Ok(receipt)
    }

    async fn list_papers(&self) -> Result<Vec<Paper>, PaperDeskError> {
        let url = self.config.endpoint("papers");
        info!("GET {}", url);

        let response = self
            .authorize(self.http.get(&url))
            .send()
            .await
            .map_err(|e| PaperDeskError::Fetch {
                status: None,
                detail: e.to_string(),
            })?;

        if !response.status().is_success() {
            let (status, detail) = failure_detail(response).await;
            return Err(PaperDeskError::Fetch {
                status: Some(status),
                detail,
            });
        }

        let papers = response
            .json::<Vec<Paper>>()
            .await
            .map_err(|e| PaperDeskError::Fetch {
                status: None,
                detail: format!("malformed paper list: {e}"),
            })?;
        debug!("fetched {} papers", papers.len());
        Ok(papers)
    }

    async fn export_papers(&self) -> Result<Vec<u8>, PaperDeskError> {
        let url = self.config.endpoint("papers/export");
        info!("GET {}", url);

        let response = self
            .authorize(self.http.get(&url))
            .send()
            .await
            .map_err(|e| PaperDeskError::Export {
                status: None,
                detail: e.to_string(),
            })?;

        if !response.status().is_success() {
            let (status, detail) = failure_detail(response).await;
            return Err(PaperDeskError::Export {
                status: Some(status),
                detail,
            });
        }

        let bytes = response.bytes().await.map_err(|e| PaperDeskError::Export {
            status: None,
            detail: e.to_string(),
        })?;
        debug!("export returned {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }

    async fn delete_paper(&self, id: &str) -> Result<(), PaperDeskError> {
        let url = self.paper_url(id)?;
        info!("DELETE {}", url);

        let response = self
            .authorize(self.http.delete(url))
            .send()
            .await
            .map_err(|e| PaperDeskError::Delete {
                id: id.to_string(),
                status: None,
                detail: e.to_string(),
            })?;

        if !response.status().is_success() {
            let (status, detail) = failure_detail(response).await;
            return Err(PaperDeskError::Delete {
                id: id.to_string(),
                status: Some(status),
                detail,
            });
        }
        Ok(())
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────────

/// Status code plus the most useful text the error body offers.
async fn failure_detail(response: Response) -> (u16, String) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    (status.as_u16(), describe_failure(status, &body))
}

fn describe_failure(status: StatusCode, body: &str) -> String {
    ["detail", "message", "error"]
        .iter()
        .find_map(|key| json_field(body, key))
        .unwrap_or_else(|| format!("HTTP {status}"))
}

/// String value of top-level `key` in a JSON object body.
fn json_field(body: &str, key: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get(key)?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
