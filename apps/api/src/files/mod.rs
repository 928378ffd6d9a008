//! File directory: uploads, listings and deletions over the single working directory.
//!
//! Naming conventions are what the merge pipeline relies on to find its inputs:
//! the template has one reserved name, resumes are `resume-file-<id><ext>`, everything
//! else is `<stem>-<id><ext>`.

pub mod handlers;

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::documents::{SCRATCH_PREFIX, TEMPLATE_FILE_NAME};

pub const RESUME_PREFIX: &str = "resume-file-";

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("missing file id")]
    MissingId,

    #[error("invalid file name '{0}'")]
    InvalidName(String),

    #[error("file '{0}' not found")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which upload endpoint a file arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Resume,
    Template,
    Other,
}

/// Listing buckets, derived from stored names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Resumes,
    Template,
    Other,
}

impl FileCategory {
    pub fn of(name: &str) -> Self {
        if name == TEMPLATE_FILE_NAME {
            FileCategory::Template
        } else if name.starts_with(RESUME_PREFIX) {
            FileCategory::Resumes
        } else {
            FileCategory::Other
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub uid: String,
    pub name: String,
    pub file_path: String,
}

/// Rejects anything that could escape the working directory.
fn validate_component(value: &str) -> Result<(), FileStoreError> {
    let bad = value.is_empty()
        || value == "."
        || value.contains("..")
        || value.contains(['/', '\\', '\0']);
    if bad {
        return Err(FileStoreError::InvalidName(value.to_string()));
    }
    Ok(())
}

/// Computes the stored name for an upload.
///
/// Template uploads (or any file carrying the reserved template name) replace the template.
/// Every other upload needs an id. Resume uploads, and other uploads whose name contains
/// `Resume`, become `resume-file-<id><ext>`; the rest keep their stem: `<stem>-<id><ext>`.
pub fn stored_name(
    kind: UploadKind,
    id: Option<&str>,
    original_name: &str,
) -> Result<String, FileStoreError> {
    // Browsers may send a full client path; only the final component matters.
    let original = Path::new(original_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    validate_component(original)?;

    if kind == UploadKind::Template || original == TEMPLATE_FILE_NAME {
        return Ok(TEMPLATE_FILE_NAME.to_string());
    }

    let id = id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(FileStoreError::MissingId)?;
    validate_component(id)?;

    let ext = Path::new(original)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    if kind == UploadKind::Resume || original.contains("Resume") {
        return Ok(format!("{RESUME_PREFIX}{id}{ext}"));
    }

    let stem = original.split('.').next().unwrap_or_default();
    let stem = if stem.is_empty() { "file" } else { stem };
    let name = format!("{stem}-{id}{ext}");
    // Merge scratch files share this prefix; listings and discovery skip them.
    if name.starts_with(SCRATCH_PREFIX) {
        return Err(FileStoreError::InvalidName(original.to_string()));
    }
    Ok(name)
}

/// The working directory as a file store.
#[derive(Debug, Clone)]
pub struct FileDirectory {
    root: PathBuf,
}

impl FileDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_exists(&self) -> Result<(), FileStoreError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn describe(&self, name: &str) -> StoredFile {
        StoredFile {
            uid: name.to_string(),
            name: name.to_string(),
            file_path: self.root.join(name).display().to_string(),
        }
    }

    /// Stores an upload under its conventional name, replacing any file of that name.
    pub async fn store_upload(
        &self,
        kind: UploadKind,
        id: Option<&str>,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, FileStoreError> {
        let name = stored_name(kind, id, original_name)?;
        tokio::fs::write(self.root.join(&name), bytes).await?;
        info!("Stored upload '{original_name}' as {name} ({} bytes)", bytes.len());
        Ok(self.describe(&name))
    }

    /// Regular files in `category`, sorted by name. Merge scratch files are never listed.
    pub async fn list(&self, category: FileCategory) -> Result<Vec<StoredFile>, FileStoreError> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with(SCRATCH_PREFIX) || FileCategory::of(&name) != category {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names.iter().map(|n| self.describe(n)).collect())
    }

    pub async fn delete(&self, name: &str) -> Result<(), FileStoreError> {
        validate_component(name)?;
        match tokio::fs::remove_file(self.root.join(name)).await {
            Ok(()) => {
                info!("Deleted {name}");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FileStoreError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
