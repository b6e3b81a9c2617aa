//! Conversation history store
//!
//! Thin file-system wrapper over a directory of JSON conversation files.

use super::filename;
use super::models::Message;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

/// Number of messages included in each listing preview
pub const PREVIEW_MESSAGES: usize = 5;

/// Errors raised by history operations
#[derive(Error, Debug)]
pub enum HistoryError {
    /// Filename is empty, not `.json`, or points outside the history directory
    #[error("Invalid conversation filename: {0}")]
    InvalidFilename(String),

    /// No conversation with this name
    #[error("Conversation not found: {0}")]
    NotFound(String),

    /// The file exists but could not be read or parsed
    #[error("Conversation {filename} is unreadable: {reason}")]
    Unreadable {
        /// Requested filename
        filename: String,
        /// Underlying cause
        reason: String,
    },

    /// Directory-level I/O failure
    #[error("History I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transcript could not be serialized
    #[error("Failed to encode conversation: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One entry of the history listing
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    /// Opaque identifier (the file name)
    pub filename: String,
    /// Display title derived from the filename
    pub title: String,
    /// Save time encoded in the filename, when it follows the naming pattern
    pub title_date: Option<NaiveDateTime>,
    /// Last modification time (Unix seconds)
    pub date: f64,
    /// First messages of the conversation
    pub messages: Vec<Message>,
}

/// Directory of saved conversations
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    /// Create a store over `dir` (created lazily on first save)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, HistoryError> {
        if !filename::is_valid(name) {
            return Err(HistoryError::InvalidFilename(name.to_string()));
        }
        Ok(self.dir.join(name))
    }

    /// List conversations, newest first
    ///
    /// Files that cannot be parsed are skipped. A missing directory lists as
    /// empty.
    pub async fn list(&self) -> Result<Vec<ConversationSummary>, HistoryError> {
        if !fs::try_exists(&self.dir).await? {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&self.dir).await?;
        let mut found: Vec<(SystemTime, ConversationSummary)> = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if !filename::is_valid(&name) {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let modified = metadata.modified().unwrap_or(UNIX_EPOCH);

            let messages = match read_messages(&entry.path()).await {
                Ok(messages) => messages,
                Err(reason) => {
                    warn!(filename = %name, %reason, "Skipping unreadable conversation");
                    continue;
                }
            };

            let date = modified
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs_f64())
                .unwrap_or_default();

            found.push((
                modified,
                ConversationSummary {
                    title: filename::display_title(&name),
                    title_date: filename::display_date(&name),
                    filename: name,
                    date,
                    messages: messages.into_iter().take(PREVIEW_MESSAGES).collect(),
                },
            ));
        }

        found.sort_by(|(a_time, a), (b_time, b)| {
            b_time.cmp(a_time).then_with(|| b.filename.cmp(&a.filename))
        });

        Ok(found.into_iter().map(|(_, summary)| summary).collect())
    }

    /// Load every message of a conversation, in order
    pub async fn load(&self, name: &str) -> Result<Vec<Message>, HistoryError> {
        let path = self.path_for(name)?;
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(HistoryError::NotFound(name.to_string()));
        }

        read_messages(&path)
            .await
            .map_err(|reason| HistoryError::Unreadable {
                filename: name.to_string(),
                reason,
            })
    }

    /// Save a transcript under a generated name and return that name
    pub async fn save(&self, messages: &[Message]) -> Result<String, HistoryError> {
        let first = messages
            .iter()
            .find(|m| !m.content.trim().is_empty())
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        let now = chrono::Local::now();

        let mut name = filename::conversation_filename(first, &now);
        let mut attempt = 1;
        while fs::try_exists(self.dir.join(&name)).await.unwrap_or(false) {
            attempt += 1;
            let slug = format!("{}_{}", filename::title_slug(first), attempt);
            name = filename::conversation_filename(&slug, &now);
        }

        self.save_as(&name, messages).await?;
        Ok(name)
    }

    /// Save a transcript under a caller-chosen name, replacing any existing file
    pub async fn save_as(&self, name: &str, messages: &[Message]) -> Result<(), HistoryError> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir).await?;

        let json = serde_json::to_vec_pretty(messages)?;
        fs::write(&path, json).await?;

        info!(
            filename = %name,
            message_count = messages.len(),
            "Conversation saved"
        );
        Ok(())
    }

    /// Delete one conversation. Deleting a missing file succeeds.
    pub async fn delete(&self, name: &str) -> Result<(), HistoryError> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!(filename = %name, "Conversation deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(filename = %name, "Delete of missing conversation ignored");
                Ok(())
            }
            Err(e) => Err(HistoryError::Io(e)),
        }
    }

    /// Delete every conversation file and return how many were removed
    pub async fn delete_all(&self) -> Result<usize, HistoryError> {
        if !fs::try_exists(&self.dir).await? {
            return Ok(0);
        }

        let mut entries = fs::read_dir(&self.dir).await?;
        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if !filename::is_valid(&name) {
                continue;
            }
            match fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(HistoryError::Io(e)),
            }
        }

        info!(removed, "All conversations deleted");
        Ok(removed)
    }
}

async fn read_messages(path: &Path) -> Result<Vec<Message>, String> {
    let bytes = fs::read(path).await.map_err(|e| e.to_string())?;
    serde_json::from_slice(&bytes).map_err(|e| e.to_string())
}
