//! File storage abstraction layer.
//!
//! Uploaded avatars and material files go through [`FileStorage`], so the
//! backend (local filesystem, S3, MinIO) can change without touching services.
//! Keys are relative paths such as `users/avatars/{uuid}_photo.png`; the
//! public URL of a key is what gets persisted in the database.
//!
//! # Example
//!
//! ```ignore
//! use classhero_core::file_storage::{FileStorage, LocalFileStorage};
//! use std::path::PathBuf;
//!
//! let storage = LocalFileStorage::new(
//!     PathBuf::from("./storage/uploads"),
//!     "http://localhost:3000/files".to_string(),
//!     20 * 1024 * 1024,
//! );
//!
//! let key = storage.save("materials/pdfs/abc_notes.pdf", &bytes).await?;
//! let url = storage.get_url(&key)?;
//!
//! // Later, from the persisted URL
//! if let Some(key) = storage.key_from_url(&url) {
//!     storage.delete(&key).await?;
//! }
//! ```

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use tokio::fs;

use crate::errors::AppError;

pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Abstract trait for file storage backends.
pub trait FileStorage: Send + Sync {
    /// Save file content under `key` and return the key.
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String>;

    /// Delete a file by key. Missing files are not an error.
    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()>;

    /// Public URL for a key.
    fn get_url(&self, key: &str) -> Result<String, StorageError>;

    /// Reverse of [`FileStorage::get_url`]. Returns `None` for URLs this
    /// backend did not produce (external links, YouTube URLs, plain text).
    fn key_from_url(&self, url: &str) -> Option<String>;
}

/// Error type for file storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// File exceeds maximum allowed size.
    InvalidFileSize { max_bytes: usize },

    /// MIME type not allowed.
    InvalidMimeType {
        received: String,
        allowed: Vec<String>,
    },

    /// I/O error (file system or similar).
    IoError(std::io::Error),

    /// Invalid storage key format.
    InvalidKey(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFileSize { max_bytes } => {
                write!(f, "File exceeds maximum size of {} bytes", max_bytes)
            }
            Self::InvalidMimeType { received, allowed } => {
                write!(
                    f,
                    "MIME type '{}' not allowed. Allowed types: {}",
                    received,
                    allowed.join(", ")
                )
            }
            Self::IoError(e) => write!(f, "I/O error: {}", e),
            Self::InvalidKey(msg) => write!(f, "Invalid storage key: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e)
    }
}

impl StorageError {
    /// Whether the error was caused by the uploaded content rather than the backend.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::IoError(_))
    }

    /// 400 for rejected uploads, 500 for backend failures.
    pub fn into_app_error(self) -> AppError {
        if self.is_client_error() {
            AppError::bad_request(self)
        } else {
            AppError::internal(self)
        }
    }
}

/// Checks `content_type` against an allow-list.
pub fn ensure_mime_type(content_type: &str, allowed: &[&str]) -> Result<(), StorageError> {
    if allowed.iter().any(|a| a.eq_ignore_ascii_case(content_type)) {
        return Ok(());
    }

    Err(StorageError::InvalidMimeType {
        received: content_type.to_string(),
        allowed: allowed.iter().map(|s| s.to_string()).collect(),
    })
}

/// Reduces a client-supplied filename to characters accepted in storage keys.
///
/// Directory components are dropped and anything outside `[A-Za-z0-9._-]`
/// becomes `_`. An empty result falls back to `"file"`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.').replace("..", "_");

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Local filesystem-based file storage implementation.
///
/// Files are written below `base_dir` and served by the HTTP layer under
/// `base_url`.
#[derive(Clone, Debug)]
pub struct LocalFileStorage {
    base_dir: PathBuf,
    base_url: String,
    max_file_size: usize,
}

impl LocalFileStorage {
    pub fn new(base_dir: PathBuf, base_url: String, max_file_size: usize) -> Self {
        Self {
            base_dir,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_file_size,
        }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Validate storage key format to prevent path traversal.
    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Key must not be empty, contain '..', or start with '/'".to_string(),
            ));
        }

        if !key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '/' || c == '.')
        {
            return Err(StorageError::InvalidKey(
                "Key contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }
}

impl FileStorage for LocalFileStorage {
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String> {
        Box::pin(async move {
            Self::validate_key(key)?;

            if content.len() > self.max_file_size {
                return Err(StorageError::InvalidFileSize {
                    max_bytes: self.max_file_size,
                });
            }

            let file_path = self.base_dir.join(key);

            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).await?;
            }

            fs::write(&file_path, content).await?;

            Ok(key.to_string())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            Self::validate_key(key)?;

            let file_path = self.base_dir.join(key);

            match fs::remove_file(&file_path).await {
                Ok(_) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn get_url(&self, key: &str) -> Result<String, StorageError> {
        Self::validate_key(key)?;

        Ok(format!("{}/{}", self.base_url, key))
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        let key = url.strip_prefix(&self.base_url)?.strip_prefix('/')?;
        Self::validate_key(key).ok()?;
        Some(key.to_string())
    }
}
