//! JSONL file writer for deliberation decisions.
//!
//! Each [`Decision`] is serialized as a single JSON line with a `type` field
//! and a `recorded_at` timestamp, appended to the file via a buffered writer.

use council_application::DecisionSink;
use council_domain::Decision;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// JSONL decision log that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. The file is opened in append
/// mode so decisions accumulate across runs. Flushes on `Drop`.
pub struct JsonlDecisionLog {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlDecisionLog {
    /// Open (or create) the log at the given path.
    ///
    /// Creates parent directories if they don't exist.
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create decision log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open decision log {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DecisionSink for JsonlDecisionLog {
    fn record(&self, decision: &Decision) {
        let recorded_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let record = match serde_json::to_value(decision) {
            Ok(serde_json::Value::Object(mut map)) => {
                map.insert("type".to_string(), "decision".into());
                map.insert("recorded_at".to_string(), recorded_at.into());
                serde_json::Value::Object(map)
            }
            Ok(other) => serde_json::json!({
                "type": "decision",
                "recorded_at": recorded_at,
                "data": other,
            }),
            Err(e) => {
                warn!(topic = %decision.topic, "Could not serialize decision: {}", e);
                return;
            }
        };

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        let mut writer = self.writer.lock().unwrap_or_else(|p| p.into_inner());
        if let Err(e) = writeln!(writer, "{}", line) {
            warn!("Could not write to decision log {}: {}", self.path.display(), e);
            return;
        }
        // Append-only; flush each record so a crash loses at most one line
        let _ = writer.flush();
    }
}

impl Drop for JsonlDecisionLog {
    fn drop(&mut self) {
        let mut writer = self.writer.lock().unwrap_or_else(|p| p.into_inner());
        let _ = writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::Vote;

    fn decision(topic: &str) -> Decision {
        Decision::new(
            topic,
            vec![
                Vote::new("a", "X", 0.9),
                Vote::new("b", "X", 0.8),
                Vote::new("c", "Y", 0.3),
            ],
            "X",
            0.85,
        )
    }

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_valid_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decisions.jsonl");
        let log = JsonlDecisionLog::new(&path).unwrap();

        log.record(&decision("Best approach?"));
        log.record(&decision("Second topic").mark_no_consensus());
        drop(log);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        for value in &lines {
            assert_eq!(value["type"], "decision");
            assert!(value["recorded_at"].is_string());
        }
        assert_eq!(lines[0]["topic"], "Best approach?");
        assert_eq!(lines[0]["consensus"], "X");
        assert_eq!(lines[0]["votes"].as_array().unwrap().len(), 3);
        assert_eq!(lines[1]["no_consensus"], true);
    }

    #[test]
    fn test_appends_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decisions.jsonl");

        JsonlDecisionLog::new(&path).unwrap().record(&decision("one"));
        JsonlDecisionLog::new(&path).unwrap().record(&decision("two"));

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["topic"], "two");
    }

    #[test]
    fn test_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dir").join("decisions.jsonl");
        let log = JsonlDecisionLog::new(&path).unwrap();
        assert_eq!(log.path(), path.as_path());
        assert!(path.exists());
    }
}
