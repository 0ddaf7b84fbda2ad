//! Conversation store
//!
//! Writes completed runs to timestamped JSON files in the configured data
//! directory, using the persistence shapes consumed by external tooling:
//! `{mode: "debate", rounds, synthesis}` and
//! `{mode: "ranking", stage1, stage2, synthesis, metadata}`.

use std::path::{Path, PathBuf};

use council_domain::{DebateOutcome, RankingOutcome};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// On-disk store for completed runs
pub struct ConversationStore {
    dir: PathBuf,
}

impl ConversationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a debate run; returns the file written
    pub fn save_debate(&self, outcome: &DebateOutcome) -> Result<PathBuf, StorageError> {
        self.save("debate", outcome.to_stored())
    }

    /// Persist a ranking run; returns the file written
    pub fn save_ranking(&self, outcome: &RankingOutcome) -> Result<PathBuf, StorageError> {
        self.save("ranking", outcome.to_stored())
    }

    fn save(&self, mode: &str, value: serde_json::Value) -> Result<PathBuf, StorageError> {
        std::fs::create_dir_all(&self.dir)?;

        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let path = self
            .dir
            .join(format!("{mode}-{stamp}-{}.json", std::process::id()));
        std::fs::write(&path, serde_json::to_vec_pretty(&value)?)?;

        info!(path = %path.display(), "conversation saved");
        Ok(path)
    }
}
