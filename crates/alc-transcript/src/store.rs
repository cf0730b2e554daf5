// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session transcript storage: one jsonl file per session, one entry
//! per line, appended from the stream ingestor as messages/tool calls
//! land.
//!
//! Writes for a given session are serialized through a per-session lock
//! so concurrent appends can't interleave partial lines; sessions don't
//! contend with each other.

use alc_core::{Error, Result, SessionId, TranscriptEntry};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Default base directory for transcript files, `~/.kandev/sessions/`.
///
/// Falls back to `./.kandev/sessions` if the home directory can't be
/// resolved (e.g. no `HOME` set).
fn default_base_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".kandev")
        .join("sessions")
}

pub struct TranscriptStore {
    base_dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl TranscriptStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into(), locks: Mutex::new(HashMap::new()) }
    }

    pub fn with_default_base_dir() -> Self {
        Self::new(default_base_dir())
    }

    pub fn path_for(&self, session_id: &SessionId) -> PathBuf {
        self.base_dir.join(format!("{}.jsonl", session_id.sanitized()))
    }

    fn lock_for(&self, session_id: &SessionId) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .lock()
            .entry(session_id.as_str().to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Append one entry as a line of JSON to the session's transcript
    /// file, creating the file and its parent directory if needed.
    pub async fn append(&self, session_id: &SessionId, entry: &TranscriptEntry) -> Result<()> {
        let lock = self.lock_for(session_id);
        let _guard = lock.lock().await;

        let path = self.path_for(session_id);
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }

    /// Read back every entry recorded for a session, in append order.
    ///
    /// A missing transcript file is not an error — it just means no
    /// entries have been appended yet — and yields an empty history.
    pub async fn read_history(&self, session_id: &SessionId) -> Result<Vec<TranscriptEntry>> {
        let lock = self.lock_for(session_id);
        let _guard = lock.lock().await;
        read_history_unlocked(&self.path_for(session_id)).await
    }
}

async fn read_history_unlocked(path: &Path) -> Result<Vec<TranscriptEntry>> {
    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(Error::Io(err)),
    };
    let mut lines = BufReader::new(file).lines();
    let mut entries = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(&line)?);
    }
    Ok(entries)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
