//! Recent uploads: the externally owned, append-only list of extracted
//! documents handed back at session start.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::types::Document;

pub trait RecentUploads {
    /// Stored documents, oldest first.
    fn load(&self) -> Result<Vec<Document>, StoreError>;

    fn append(&mut self, document: &Document) -> Result<(), StoreError>;

    fn clear(&mut self) -> Result<(), StoreError>;
}

/// List persisted as JSON Lines, one document per line, so saving a
/// document appends to the file instead of rewriting it.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecentUploads for JsonFileStore {
    /// Lines that do not parse are skipped with a warning, so one damaged
    /// entry does not hide the rest of the list.
    fn load(&self) -> Result<Vec<Document>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;

        let mut documents = Vec::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(document) => documents.push(document),
                Err(e) => tracing::warn!(
                    path = %self.path.display(),
                    line = number + 1,
                    error = %e,
                    "skipping unreadable recent upload"
                ),
            }
        }
        Ok(documents)
    }

    fn append(&mut self, document: &Document) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let line = serde_json::to_string(document)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        tracing::debug!(path = %self.path.display(), file = %document.name, "saved recent upload");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// Session-only list; nothing outlives the process.
#[derive(Default)]
pub struct MemoryStore {
    documents: Vec<Document>,
}

impl MemoryStore {
    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self { documents }
    }
}

impl RecentUploads for MemoryStore {
    fn load(&self) -> Result<Vec<Document>, StoreError> {
        Ok(self.documents.clone())
    }

    fn append(&mut self, document: &Document) -> Result<(), StoreError> {
        self.documents.push(document.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.documents.clear();
        Ok(())
    }
}
