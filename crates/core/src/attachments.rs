//! Attachment storage by reference.
//!
//! Section images are stored as bytes through an [`AttachmentStore`] and the
//! returned reference string is what a record carries in its `image_urls`
//! field. Rows never embed file content, so record payloads stay small and
//! the files live wherever the deployment mounts them.

use crate::error::{RecordError, RecordResult};
use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

/// Stores attachment bytes and hands back the reference to persist.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Store `bytes` under the patient's scope and return its reference.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidInput`] for unusable filenames and
    /// [`RecordError::Attachment`] when the backing storage fails.
    async fn store(&self, patient_id: Uuid, filename: &str, bytes: &[u8])
        -> RecordResult<String>;
}

/// Filesystem-backed attachment store.
///
/// Writes to `<base_dir>/<patient_id>/<uuid>-<filename>` and returns the
/// path relative to the base directory as the reference, so the base can
/// move between deployments without rewriting stored records.
pub struct DirAttachmentStore {
    base_dir: PathBuf,
}

impl DirAttachmentStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

#[async_trait]
impl AttachmentStore for DirAttachmentStore {
    async fn store(
        &self,
        patient_id: Uuid,
        filename: &str,
        bytes: &[u8],
    ) -> RecordResult<String> {
        let filename = filename.trim();
        if filename.is_empty() {
            return Err(RecordError::InvalidInput(
                "attachment filename cannot be empty".into(),
            ));
        }
        // The filename is a single path component, never a path.
        if filename.contains(['/', '\\']) || filename.contains("..") {
            return Err(RecordError::InvalidInput(
                "attachment filename cannot contain path separators".into(),
            ));
        }

        let stored_name = format!("{}-{filename}", Uuid::new_v4());
        let patient_dir = self.base_dir.join(patient_id.to_string());
        tokio::fs::create_dir_all(&patient_dir)
            .await
            .map_err(RecordError::Attachment)?;
        tokio::fs::write(patient_dir.join(&stored_name), bytes)
            .await
            .map_err(RecordError::Attachment)?;

        let reference = format!("{patient_id}/{stored_name}");
        tracing::debug!(%patient_id, %reference, size = bytes.len(), "stored attachment");
        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_bytes_under_a_patient_scoped_reference() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let store = DirAttachmentStore::new(dir.path());
        let patient_id = Uuid::new_v4();

        let reference = store
            .store(patient_id, "wound.png", b"not really a png")
            .await
            .expect("store should succeed");

        assert!(
            reference.starts_with(&format!("{patient_id}/")),
            "reference should be patient-scoped: {reference}"
        );
        assert!(reference.ends_with("-wound.png"));
        let written = std::fs::read(dir.path().join(&reference))
            .expect("the referenced file should exist");
        assert_eq!(written, b"not really a png");
    }

    #[tokio::test]
    async fn the_same_filename_never_collides() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let store = DirAttachmentStore::new(dir.path());
        let patient_id = Uuid::new_v4();

        let first = store
            .store(patient_id, "scan.jpg", b"first")
            .await
            .expect("first store should succeed");
        let second = store
            .store(patient_id, "scan.jpg", b"second")
            .await
            .expect("second store should succeed");

        assert_ne!(first, second, "each upload gets its own reference");
        assert_eq!(
            std::fs::read(dir.path().join(&first)).expect("first file exists"),
            b"first"
        );
        assert_eq!(
            std::fs::read(dir.path().join(&second)).expect("second file exists"),
            b"second"
        );
    }

    #[tokio::test]
    async fn path_like_filenames_are_rejected() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let store = DirAttachmentStore::new(dir.path());
        let patient_id = Uuid::new_v4();

        for name in ["../escape.png", "a/b.png", "a\\b.png", "", "   "] {
            let result = store.store(patient_id, name, b"payload").await;
            assert!(
                matches!(result, Err(RecordError::InvalidInput(_))),
                "{name:?} must be rejected"
            );
        }
    }
}
