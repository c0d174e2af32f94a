use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tokio::fs;

use crate::errors::{ExportError, ExportResult};

/// Directory receiving one base64 field's decoded payloads, one file per
/// record named by the record id: `<output>/<Object>.<Field>/<Id>`.
#[derive(Debug, Clone)]
pub struct BlobDirectory {
    object: String,
    field: String,
    path: PathBuf,
}

impl BlobDirectory {
    pub fn new(output_dir: &Path, object: &str, field: &str) -> Self {
        Self {
            object: object.to_string(),
            field: field.to_string(),
            path: output_dir.join(format!("{}.{}", object, field)),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn create(&self) -> ExportResult<()> {
        fs::create_dir_all(&self.path)
            .await
            .map_err(|source| ExportError::CreateDir {
                path: self.path.display().to_string(),
                source,
            })
    }

    /// Record ids become file names, so they must be a single plain path component.
    fn file_name<'a>(&self, record_id: &'a str) -> ExportResult<&'a str> {
        if record_id.is_empty()
            || record_id.contains('/')
            || record_id.contains('\\')
            || record_id == "."
            || record_id == ".."
        {
            return Err(ExportError::InvalidRecordId {
                object: self.object.clone(),
                field: self.field.clone(),
                id: record_id.to_string(),
            });
        }
        Ok(record_id)
    }

    /// Decode `encoded` and write it for `record_id`, replacing any previous
    /// file. Returns the number of bytes written.
    pub async fn write(&self, record_id: &str, encoded: &str) -> ExportResult<usize> {
        let file_name = self.file_name(record_id)?;
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|source| ExportError::Decode {
                object: self.object.clone(),
                field: self.field.clone(),
                source,
            })?;

        fs::write(self.path.join(file_name), &bytes)
            .await
            .map_err(|source| ExportError::BlobWrite {
                object: self.object.clone(),
                field: self.field.clone(),
                source,
            })?;
        Ok(bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_decodes_payload() {
        let dir = TempDir::new().unwrap();
        let blobs = BlobDirectory::new(dir.path(), "Attachment", "Body");
        blobs.create().await.unwrap();

        let written = blobs.write("00P000000000001", "aGVsbG8gd29ybGQ=").await.unwrap();

        assert_eq!(written, 11);
        let path = dir.path().join("Attachment.Body").join("00P000000000001");
        assert_eq!(std::fs::read(path).unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn test_rerun_overwrites() {
        let dir = TempDir::new().unwrap();
        let blobs = BlobDirectory::new(dir.path(), "Document", "Body");
        blobs.create().await.unwrap();

        blobs.write("015A", "Zmlyc3Q=").await.unwrap();
        blobs.write("015A", "c2Vjb25k").await.unwrap();

        assert_eq!(std::fs::read(blobs.path().join("015A")).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_invalid_base64_is_an_error() {
        let dir = TempDir::new().unwrap();
        let blobs = BlobDirectory::new(dir.path(), "Attachment", "Body");
        blobs.create().await.unwrap();

        let err = blobs.write("00P1", "not base64!").await.unwrap_err();
        assert!(matches!(err, ExportError::Decode { .. }));
        assert!(!blobs.path().join("00P1").exists());
    }

    #[tokio::test]
    async fn test_path_like_ids_are_rejected() {
        let dir = TempDir::new().unwrap();
        let blobs = BlobDirectory::new(dir.path(), "Attachment", "Body");
        blobs.create().await.unwrap();

        for id in ["", "..", "a/b", "a\\b"] {
            let err = blobs.write(id, "aGk=").await.unwrap_err();
            assert!(matches!(err, ExportError::InvalidRecordId { .. }), "id {:?}", id);
        }
    }
}
