use std::path::PathBuf;

use crate::error::StoreError;
use crate::recent::{JsonFileStore, MemoryStore, RecentUploads};

/// Runtime settings resolved from command-line flags and environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub store_path: PathBuf,
    pub save_recent: bool,
    pub quiet: bool,
    pub verbosity: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: Self::default_store_path(),
            save_recent: true,
            quiet: false,
            verbosity: 0,
        }
    }
}

impl Config {
    /// `<data dir>/quickread/recent.jsonl`, or `./.quickread/recent.jsonl`
    /// when the platform has no data directory.
    pub fn default_store_path() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("quickread"))
            .unwrap_or_else(|| PathBuf::from(".quickread"))
            .join("recent.jsonl")
    }

    /// Default `tracing` filter when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        match self.verbosity {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }

    /// The recent-uploads store. Without saving, the stored list is still
    /// read but new documents only live for this process.
    pub fn open_store(&self) -> Result<Box<dyn RecentUploads>, StoreError> {
        let file = JsonFileStore::new(self.store_path.clone());
        if self.save_recent {
            Ok(Box::new(file))
        } else {
            Ok(Box::new(MemoryStore::with_documents(file.load()?)))
        }
    }
}
