//! Conversation snapshots.
//!
//! A snapshot is a pretty-printed JSON copy of one caller's history,
//! written wherever the caller asks.

use crate::error::SnapshotError;
use crate::exchange::Exchange;
use crate::history::ConversationHistory;
use chrono::{DateTime, Utc};
use pidgin_tutor_core::CallerId;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, instrument};

/// File name used when only a directory is configured.
pub const DEFAULT_SNAPSHOT_FILE: &str = "conversation_log.json";

/// A saved copy of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSnapshot {
    /// Whose conversation this is.
    pub caller: CallerId,
    /// When the snapshot was taken.
    pub saved_at: DateTime<Utc>,
    /// The exchanges, oldest first.
    pub exchanges: Vec<Exchange>,
}

impl ConversationSnapshot {
    /// Copies the exchanges currently held in `history`.
    #[must_use]
    pub fn from_history(caller: CallerId, history: &ConversationHistory) -> Self {
        Self {
            caller,
            saved_at: Utc::now(),
            exchanges: history.all().to_vec(),
        }
    }

    /// Writes the snapshot to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the file cannot be written.
    #[instrument(skip(self), fields(caller = %self.caller, exchanges = self.exchanges.len()))]
    pub async fn save(&self, path: &Path) -> Result<(), Report<SnapshotError>> {
        let json = serde_json::to_string_pretty(self).map_err(|e| SnapshotError::Encoding {
            reason: e.to_string(),
        })?;

        let write_failed = |e: std::io::Error| SnapshotError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
        }
        tokio::fs::write(path, json).await.map_err(write_failed)?;

        debug!("snapshot written");
        Ok(())
    }

    /// Reads a snapshot back from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a snapshot.
    #[instrument]
    pub async fn load(path: &Path) -> Result<Self, Report<SnapshotError>> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SnapshotError::ReadFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        Ok(serde_json::from_str(&json).map_err(|e| SnapshotError::Encoding {
            reason: e.to_string(),
        })?)
    }
}
