use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// A document written to the upload directory.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUpload {
    pub path: PathBuf,
    pub original_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub size: usize,
}

/// Raw uploaded documents, stored as `<unix millis>-<file name>`.
pub struct UploadStore {
    directory: PathBuf,
}

impl UploadStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<StoredUpload> {
        let file_name = sanitize_file_name(original_name)?;
        let uploaded_at = Utc::now();
        let stored_name = format!("{}-{}", uploaded_at.timestamp_millis(), file_name);

        fs::create_dir_all(&self.directory).await.with_context(|| {
            format!("Failed to create upload directory {}", self.directory.display())
        })?;

        let path = self.directory.join(stored_name);
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write upload {}", path.display()))?;

        info!("Stored upload {} ({} bytes)", path.display(), bytes.len());

        Ok(StoredUpload {
            path,
            original_name: original_name.to_string(),
            uploaded_at,
            size: bytes.len(),
        })
    }
}

/// Keep only the final path component so uploads cannot escape the directory.
fn sanitize_file_name(original_name: &str) -> Result<String> {
    let name = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "." || name == ".." {
        anyhow::bail!("Invalid upload file name '{}'", original_name);
    }
    Ok(name.to_string())
}
