//! Paper collection: the in-memory list behind the management view.
//!
//! The collection is only ever replaced wholesale (on refresh) or shrunk by
//! id (on delete); records are never edited in place. Filtering is a pure
//! view over the held list and never changes it.
//!
//! ## Fetch failures
//!
//! A failed refresh leaves the collection empty, the same as an account with
//! no papers. The failure is not returned as an error, but it is not lost
//! either: [`RefreshStatus::FetchFailed`] and
//! [`PaperCollection::last_fetch_error`] let callers tell the two apart.

use crate::api::PaperService;
use crate::error::PaperDeskError;
use crate::export::{to_downloadable, ExportArtifact};
use crate::paper::{filter_papers, sort_by_id_desc, Paper};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete paper.";
pub const EXPORT_FAILED_MESSAGE: &str = "Error exporting data";
pub const EMPTY_COLLECTION_MESSAGE: &str = "No papers uploaded yet.";

/// What the last [`PaperCollection::refresh`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStatus {
    /// No refresh has run yet.
    NotLoaded,
    /// The list was fetched; holds the number of papers.
    Loaded(usize),
    /// The fetch failed and the collection was emptied.
    FetchFailed,
}

/// Owns the fetched papers, sorted by id descending.
pub struct PaperCollection {
    service: Arc<dyn PaperService>,
    papers: Vec<Paper>,
    status: RefreshStatus,
    last_fetch_error: Option<PaperDeskError>,
    alert: Option<String>,
}

impl PaperCollection {
    pub fn new(service: Arc<dyn PaperService>) -> Self {
        Self {
            service,
            papers: Vec::new(),
            status: RefreshStatus::NotLoaded,
            last_fetch_error: None,
            alert: None,
        }
    }

    /// The held papers, in display order.
    pub fn papers(&self) -> &[Paper] {
        &self.papers
    }

    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    pub fn status(&self) -> RefreshStatus {
        self.status
    }

    /// The error behind the most recent failed refresh, cleared by a
    /// successful one.
    pub fn last_fetch_error(&self) -> Option<&PaperDeskError> {
        self.last_fetch_error.as_ref()
    }

    /// Alert text from the last failed delete or export.
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// A held paper by id, for the detail view.
    pub fn get(&self, id: &str) -> Option<&Paper> {
        self.papers.iter().find(|p| p.id == id)
    }

    /// Replace the collection with a fresh fetch, sorted by id descending.
    ///
    /// On failure the collection becomes empty; see the module docs.
    pub async fn refresh(&mut self) -> RefreshStatus {
        match self.service.list_papers().await {
            Ok(mut papers) => {
                sort_by_id_desc(&mut papers);
                info!("collection refreshed: {} papers", papers.len());
                self.status = RefreshStatus::Loaded(papers.len());
                self.papers = papers;
                self.last_fetch_error = None;
            }
            Err(e) => {
                warn!("paper fetch failed, showing empty collection: {}", e);
                self.papers.clear();
                self.status = RefreshStatus::FetchFailed;
                self.last_fetch_error = Some(e);
            }
        }
        self.status
    }

    /// Papers whose title or authors contain `query`, case-insensitively.
    pub fn filter(&self, query: &str) -> Vec<&Paper> {
        filter_papers(&self.papers, query)
    }

    /// Delete paper `id` on the server, then drop it locally.
    ///
    /// Confirmation is the caller's job. On failure the collection is left
    /// untouched and the alert is set.
    pub async fn remove(&mut self, id: &str) -> Result<(), PaperDeskError> {
        match self.service.delete_paper(id).await {
            Ok(()) => {
                let before = self.papers.len();
                self.papers.retain(|p| p.id != id);
                debug!("removed {} local record(s) for {}", before - self.papers.len(), id);
                self.alert = None;
                Ok(())
            }
            Err(e) => {
                warn!("delete of {} failed: {}", id, e);
                self.alert = Some(DELETE_FAILED_MESSAGE.to_string());
                Err(e)
            }
        }
    }

    /// Fetch the spreadsheet export for the current account.
    pub async fn export_current(&mut self) -> Result<ExportArtifact, PaperDeskError> {
        match self.service.export_papers().await {
            Ok(bytes) => {
                self.alert = None;
                Ok(to_downloadable(bytes))
            }
            Err(e) => {
                warn!("export failed: {}", e);
                self.alert = Some(EXPORT_FAILED_MESSAGE.to_string());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{paper, FakeService};
    use std::collections::BTreeSet;
    use tokio_test::{assert_err, assert_ok};

    fn ids(c: &PaperCollection) -> BTreeSet<String> {
        c.papers().iter().map(|p| p.id.clone()).collect()
    }

    fn titles(papers: &[Paper]) -> Vec<&str> {
        papers.iter().map(|p| p.title.as_str()).collect()
    }

    #[tokio::test]
    async fn refresh_sorts_by_id_descending() {
        let service = Arc::new(FakeService::with_papers(vec![
            paper("ccc111", "B", &[]),
            paper("aaa111", "A", &[]),
            paper("bbb111", "M", &[]),
        ]));
        let mut c = PaperCollection::new(service);

        assert_eq!(c.status(), RefreshStatus::NotLoaded);
        assert_eq!(c.refresh().await, RefreshStatus::Loaded(3));
        assert_eq!(titles(c.papers()), ["B", "M", "A"]);
        assert!(c.last_fetch_error().is_none());
    }

    #[tokio::test]
    async fn refresh_failure_empties_but_is_distinguishable() {
        let service = Arc::new(FakeService::with_papers(vec![paper("a", "A", &[])]));
        let mut c = PaperCollection::new(Arc::clone(&service) as Arc<dyn PaperService>);
        c.refresh().await;
        assert_eq!(c.len(), 1);

        *service.papers.lock().unwrap() = None;
        assert_eq!(c.refresh().await, RefreshStatus::FetchFailed);
        assert!(c.is_empty());
        assert!(matches!(
            c.last_fetch_error(),
            Some(PaperDeskError::Fetch { status: Some(500), .. })
        ));

        // An empty account is a successful, empty load.
        *service.papers.lock().unwrap() = Some(Vec::new());
        assert_eq!(c.refresh().await, RefreshStatus::Loaded(0));
        assert!(c.last_fetch_error().is_none());
    }

    #[tokio::test]
    async fn filter_is_a_pure_view() {
        let service = Arc::new(FakeService::with_papers(vec![
            paper("2", "Graph Attention Networks", &["Velickovic"]),
            paper("1", "Dropout", &["Srivastava", "Hinton"]),
        ]));
        let mut c = PaperCollection::new(service);
        c.refresh().await;

        let hits = c.filter("hinton");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");
        assert_eq!(c.filter("").len(), 2);
        assert_eq!(c.len(), 2);
    }

    #[tokio::test]
    async fn remove_success_drops_exactly_that_id() {
        let service = Arc::new(FakeService::with_papers(vec![
            paper("3", "C", &[]),
            paper("2", "B", &[]),
            paper("1", "A", &[]),
        ]));
        let mut c = PaperCollection::new(Arc::clone(&service) as Arc<dyn PaperService>);
        c.refresh().await;
        let mut expected = ids(&c);
        expected.remove("2");

        assert_ok!(c.remove("2").await);
        assert_eq!(ids(&c), expected);
        assert_eq!(c.alert(), None);
        assert!(service.calls().contains(&"delete 2".to_string()));
    }

    #[tokio::test]
    async fn remove_failure_leaves_collection_unchanged() {
        let service = Arc::new(FakeService::with_papers(vec![
            paper("2", "B", &[]),
            paper("1", "A", &[]),
        ]));
        let mut c = PaperCollection::new(Arc::clone(&service) as Arc<dyn PaperService>);
        c.refresh().await;
        let before = ids(&c);

        *service.delete_fails.lock().unwrap() = true;
        let err = assert_err!(c.remove("1").await);
        assert!(matches!(err, PaperDeskError::Delete { .. }));
        assert_eq!(ids(&c), before);
        assert_eq!(c.alert(), Some(DELETE_FAILED_MESSAGE));

        c.dismiss_alert();
        assert_eq!(c.alert(), None);
    }

    #[tokio::test]
    async fn export_wraps_bytes_unchanged() {
        let service = Arc::new(FakeService::default());
        let mut c = PaperCollection::new(service);
        let artifact = assert_ok!(c.export_current().await);
        assert_eq!(artifact.bytes(), b"PK\x03\x04xlsx");
        assert_eq!(artifact.filename(), "extracted_papers.xlsx");
    }

    #[tokio::test]
    async fn export_failure_sets_alert() {
        let service = Arc::new(FakeService::default());
        *service.export_bytes.lock().unwrap() = None;
        let mut c = PaperCollection::new(service);
        assert_err!(c.export_current().await);
        assert_eq!(c.alert(), Some(EXPORT_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn get_finds_held_paper() {
        let service = Arc::new(FakeService::with_papers(vec![paper("abc", "Found", &[])]));
        let mut c = PaperCollection::new(service);
        c.refresh().await;
        assert_eq!(c.get("abc").map(|p| p.title.as_str()), Some("Found"));
        assert!(c.get("missing").is_none());
    }
}
