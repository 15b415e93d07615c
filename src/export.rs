//! Export transformer: wrap spreadsheet bytes as a named, typed file.
//!
//! The bytes are never inspected or modified; this module only attaches the
//! fixed filename and MIME type and knows how to save the result.

use crate::error::PaperDeskError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Filename every export is saved under.
pub const EXPORT_FILENAME: &str = "extracted_papers.xlsx";

/// MIME type of the export.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// A downloadable export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    bytes: Vec<u8>,
}

/// Wrap raw export bytes as an [`ExportArtifact`].
pub fn to_downloadable(bytes: Vec<u8>) -> ExportArtifact {
    ExportArtifact { bytes }
}

impl ExportArtifact {
    pub fn filename(&self) -> &'static str {
        EXPORT_FILENAME
    }

    pub fn mime(&self) -> &'static str {
        XLSX_MIME
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Save into `dir` as [`EXPORT_FILENAME`], replacing any previous export.
    ///
    /// The bytes go to a uniquely named temp file in `dir` which is then
    /// renamed over the target; the temp file is removed if anything fails.
    pub async fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf, PaperDeskError> {
        let dir = dir.as_ref().to_path_buf();
        let path = dir.join(EXPORT_FILENAME);

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| PaperDeskError::OutputWriteFailed {
                path: path.clone(),
                source: e,
            })?;

        let bytes = self.bytes.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
            tmp.write_all(&bytes)?;
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| PaperDeskError::Internal(format!("export save task: {e}")))?
        .map_err(|e| PaperDeskError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

        info!("saved {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn naming_is_fixed() {
        let a = to_downloadable(vec![1, 2, 3]);
        assert_eq!(a.filename(), "extracted_papers.xlsx");
        assert_eq!(
            a.mime(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(a.into_bytes(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn save_writes_bytes_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("downloads");
        let artifact = to_downloadable(b"PK\x03\x04 spreadsheet".to_vec());

        let path = artifact.save(&target).await.unwrap();

        assert_eq!(path, target.join(EXPORT_FILENAME));
        assert_eq!(std::fs::read(&path).unwrap(), artifact.bytes());
        assert_eq!(entries(&target), vec![EXPORT_FILENAME.to_string()]);
    }

    #[tokio::test]
    async fn failed_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A directory squatting on the target name makes the final rename fail.
        std::fs::create_dir(dir.path().join(EXPORT_FILENAME)).unwrap();

        let err = to_downloadable(b"data".to_vec())
            .save(dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, PaperDeskError::OutputWriteFailed { .. }), "got: {err:?}");
        assert_eq!(entries(dir.path()), vec![EXPORT_FILENAME.to_string()]);
    }

    #[tokio::test]
    async fn concurrent_saves_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let a = to_downloadable(vec![b'a'; 64 * 1024]);
        let b = to_downloadable(vec![b'b'; 64 * 1024]);

        let (ra, rb) = tokio::join!(a.save(dir.path()), b.save(dir.path()));
        ra.unwrap();
        rb.unwrap();

        let saved = std::fs::read(dir.path().join(EXPORT_FILENAME)).unwrap();
        assert!(saved == a.bytes() || saved == b.bytes());
        assert_eq!(entries(dir.path()), vec![EXPORT_FILENAME.to_string()]);
    }

    #[tokio::test]
    async fn save_overwrites_previous_export() {
        let dir = tempfile::tempdir().unwrap();
        to_downloadable(b"old".to_vec()).save(dir.path()).await.unwrap();
        let path = to_downloadable(b"new".to_vec()).save(dir.path()).await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"new");
    }
}
