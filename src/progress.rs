use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::models::{TaskProgress, Verdict};

const PROGRESS_FILENAME: &str = "progress.json";

/// Read-only view of the stored progress, keyed by task name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressSnapshot {
    records: BTreeMap<String, TaskProgress>,
}

impl ProgressSnapshot {
    /// Case-insensitive lookup by task name.
    pub fn get(&self, task_name: &str) -> Option<&TaskProgress> {
        self.records
            .get(task_name)
            .or_else(|| {
                self.records
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(task_name))
                    .map(|(_, record)| record)
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TaskProgress)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// JSON-backed progress store. Each write rewrites the whole file.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store `progress.json` inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(PROGRESS_FILENAME))
    }

    /// `<platform data dir>/pianist`, falling back to the working directory.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("pianist"))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored progress. A missing file is an empty snapshot; an
    /// unreadable one is logged and treated the same way.
    pub fn load(&self) -> ProgressSnapshot {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return ProgressSnapshot::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not read progress file");
                return ProgressSnapshot::default();
            }
        };
        match serde_json::from_str(&data) {
            Ok(records) => ProgressSnapshot { records },
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unparseable progress file");
                ProgressSnapshot::default()
            }
        }
    }

    /// Write one record, replacing any record stored under the same name
    /// (compared case-insensitively).
    pub fn save(&self, task_name: &str, record: &TaskProgress) -> io::Result<()> {
        let mut records = self.load().records;
        records.retain(|key, _| !key.eq_ignore_ascii_case(task_name));
        records.insert(task_name.to_string(), record.clone());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&records)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        std::fs::write(&self.path, json)
    }

    /// Count one more completion of `task_name` with the given verdict.
    pub fn record_completion(
        &self,
        task_name: &str,
        verdict: Verdict,
        now: DateTime<Utc>,
    ) -> io::Result<TaskProgress> {
        let mut record = self.load().get(task_name).cloned().unwrap_or_default();
        record.times_completed += 1;
        record.last_verdict = verdict.to_string();
        record.last_completed_utc = Some(now);
        self.save(task_name, &record)?;
        info!(task = task_name, verdict = %verdict, times = record.times_completed, "progress recorded");
        Ok(record)
    }
}
