//! Dictation history: one JSON object per completed session, appended to a
//! JSONL file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// HistorySink
// ---------------------------------------------------------------------------

/// Receives completed sessions. Infallible from the controller's point of
/// view; implementations log their own failures.
#[async_trait]
pub trait HistorySink: Send + Sync {
    async fn accept(&self, original: &str, final_text: &str, duration_secs: f64);
}

// ---------------------------------------------------------------------------
// FileHistorySink
// ---------------------------------------------------------------------------

/// One line of the history file.
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unix timestamp in seconds.
    pub ts: u64,
    /// Raw transcript as returned by the transcription service.
    pub original: String,
    /// Text that was actually injected.
    #[serde(rename = "final")]
    pub final_text: String,
    /// Recording length implied by the captured audio.
    pub duration_secs: f64,
}

/// Appends [`HistoryEntry`] lines to a JSONL file, creating it (and parent
/// directories) on first write.
pub struct FileHistorySink {
    path: Arc<PathBuf>,
}

impl FileHistorySink {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path: Arc::new(path),
        }
    }
}

#[async_trait]
impl HistorySink for FileHistorySink {
    async fn accept(&self, original: &str, final_text: &str, duration_secs: f64) {
        let entry = HistoryEntry {
            ts: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            original: original.to_owned(),
            final_text: final_text.to_owned(),
            duration_secs,
        };

        let path = Arc::clone(&self.path);
        let result = tokio::task::spawn_blocking(move || append_line(&path, &entry)).await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(err)) => log::warn!("failed to append history entry: {err}"),
            Err(err) => log::warn!("history write task failed: {err}"),
        }
    }
}

fn append_line(path: &std::path::Path, entry: &HistoryEntry) -> anyhow::Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let line = serde_json::to_string(entry)?;
    writeln!(file, "{line}")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn appends_one_json_line_per_session() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("history.jsonl");
        let sink = FileHistorySink::new(path.clone());

        sink.accept("helo world", "Hello, world.", 2.5).await;
        sink.accept("second", "second", 1.0).await;

        let content = std::fs::read_to_string(&path).expect("read history");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: HistoryEntry = serde_json::from_str(lines[0]).expect("parse entry");
        assert_eq!(first.original, "helo world");
        assert_eq!(first.final_text, "Hello, world.");
        assert!((first.duration_secs - 2.5).abs() < f64::EPSILON);
        assert!(first.ts > 0);
    }

    #[tokio::test]
    async fn creates_missing_parent_directories() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nested/dir/history.jsonl");
        let sink = FileHistorySink::new(path.clone());

        sink.accept("a", "b", 0.1).await;
        assert!(path.exists());
    }

    #[test]
    fn entry_serializes_final_under_its_wire_name() {
        let entry = HistoryEntry {
            ts: 1,
            original: "o".into(),
            final_text: "f".into(),
            duration_secs: 1.0,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["final"], "f");
        assert!(json.get("final_text").is_none());
    }
}
