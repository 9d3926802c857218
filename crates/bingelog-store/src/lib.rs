use std::path::PathBuf;

use error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod error;
pub mod file_store;

pub use file_store::FileStore;

const MAX_PATH_LEN: usize = 4095;
const MAX_SEGMENT_LEN: usize = 255;
const MAX_PATH_DEPTH: usize = 10;
const PATH_INVALID_CHARS: &str = r#"\:"#;

fn validate_path(path: &str) -> StoreResult<()> {
    if path.is_empty() {
        return Err(StoreError::InvalidPath);
    }
    if path.starts_with('/') || path.ends_with('/') {
        return Err(StoreError::InvalidPath);
    }
    if path.len() > MAX_PATH_LEN {
        return Err(StoreError::InvalidPath);
    }
    let segments = path.split('/').collect::<Vec<_>>();
    if segments.len() > MAX_PATH_DEPTH {
        return Err(StoreError::InvalidPath);
    }
    let invalid_path = segments.into_iter().any(|s| {
        s.is_empty()
            || s.starts_with('.')
            || s.len() > MAX_SEGMENT_LEN
            || s.chars()
                .any(|c| PATH_INVALID_CHARS.contains(c) || c.is_ascii_control())
    });
    if invalid_path {
        Err(StoreError::InvalidPath)
    } else {
        Ok(())
    }
}

/// Relative path within the store, checked against traversal and junk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPath(String);

impl ValidPath {
    pub fn new(path: impl Into<String>) -> StoreResult<Self> {
        let path = path.into();
        validate_path(path.as_str()).inspect_err(|_| debug!("Invalid path: {path}"))?;
        Ok(ValidPath(path))
    }
}

impl AsRef<str> for ValidPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ValidPath> for String {
    fn from(value: ValidPath) -> Self {
        value.0
    }
}

pub const IMAGES_PREFIX: &str = "images";

/// Fresh random target path for an uploaded image - never derived from the
/// content, never reused.
pub fn image_path(ext: &str) -> StoreResult<ValidPath> {
    let name = uuid::Uuid::new_v4();
    ValidPath::new(format!("{IMAGES_PREFIX}/{name}.{ext}"))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreInfo {
    /// final path the file was stored under, relative to the store root
    pub final_path: PathBuf,
    pub size: u64,
    /// SHA256 hash
    pub hash: String,
}
