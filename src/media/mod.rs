use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::Result;

pub mod crop;

/// URL prefix the upload directory is served under.
pub const UPLOADS_PREFIX: &str = "/uploads";

/// Durable storage for uploaded media. Returns the public URL of the stored file.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn store(&self, file_name: &str, bytes: Vec<u8>) -> Result<String>;
}

/// Writes uploads to a directory that the router serves under [`UPLOADS_PREFIX`].
pub struct LocalMediaStore {
    root: PathBuf,
}

impl LocalMediaStore {
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn store(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        let stored_name = format!("{}.{}", Uuid::now_v7().simple(), extension_of(file_name));
        let path = self.root.join(&stored_name);

        tokio::fs::write(&path, &bytes).await?;
        tracing::info!(file = %path.display(), size = bytes.len(), "Stored upload");

        Ok(format!("{UPLOADS_PREFIX}/{stored_name}"))
    }
}

/// Lower-cased extension of the client-supplied name, `bin` when absent or odd.
fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "bin".to_string())
}
