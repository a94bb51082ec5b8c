use std::path::Path;

use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// Uploaded files
// ---------------------------------------------------------------------------

/// One uploaded file: its declared name and a `"<metadata>,<base64>"`
/// content descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub name: String,
    pub contents: String,
}

impl UploadedFile {
    /// Wrap raw bytes in a content descriptor.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Self {
        UploadedFile {
            name: name.into(),
            contents: format!("data:application/octet-stream;base64,{}", STANDARD.encode(bytes)),
        }
    }

    /// Read a file picked in a dialog or dropped on the window.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::from_bytes(name, &bytes))
    }

    /// Split on the first comma and base64-decode the remainder.
    pub fn decode(&self) -> Result<Vec<u8>> {
        let (_, encoded) = self
            .contents
            .split_once(',')
            .ok_or_else(|| DashboardError::InvalidPayload {
                file: self.name.clone(),
                reason: "missing ',' separator".into(),
            })?;
        STANDARD
            .decode(encoded.trim())
            .map_err(|e| DashboardError::InvalidPayload {
                file: self.name.clone(),
                reason: e.to_string(),
            })
    }
}

/// Files that arrived together for one upload slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadBatch {
    pub files: Vec<UploadedFile>,
}

impl UploadBatch {
    pub fn new(files: Vec<UploadedFile>) -> Self {
        UploadBatch { files }
    }

    pub fn names(&self) -> Vec<String> {
        self.files.iter().map(|f| f.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
