use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::PracticeTask;

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TocItem {
    pub label: String,
    pub task: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TocGroup {
    pub title: String,
    pub items: Vec<TocItem>,
}

/// The practice plan: an ordered task list plus an optional grouping of
/// those tasks for navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub tasks: Vec<PracticeTask>,
    #[serde(default)]
    pub toc: Vec<TocGroup>,
}

impl Catalog {
    /// The default plan shipped with the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for task in &self.tasks {
            validate_task(task)?;
            if !names.insert(task.name.to_lowercase()) {
                return Err(invalid(task, "duplicate task name"));
            }
        }

        for group in &self.toc {
            for item in &group.items {
                if self.get(&item.task).is_none() {
                    return Err(Error::UnknownTocTask {
                        label: item.label.clone(),
                        task: item.task.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Exact (case-insensitive) name lookup.
    pub fn get(&self, name: &str) -> Option<&PracticeTask> {
        self.tasks
            .iter()
            .find(|task| task.name.eq_ignore_ascii_case(name))
    }

    /// Resolve a user query: exact name, then 1-based index, then a unique
    /// case-insensitive substring.
    pub fn find(&self, query: &str) -> Result<&PracticeTask> {
        if let Some(task) = self.get(query) {
            return Ok(task);
        }

        if let Ok(index) = query.trim().parse::<usize>() {
            return index
                .checked_sub(1)
                .and_then(|i| self.tasks.get(i))
                .ok_or_else(|| Error::TaskNotFound(query.to_string()));
        }

        let needle = query.to_lowercase();
        let matches: Vec<&PracticeTask> = self
            .tasks
            .iter()
            .filter(|task| task.name.to_lowercase().contains(&needle))
            .collect();

        match matches.as_slice() {
            [] => Err(Error::TaskNotFound(query.to_string())),
            [task] => Ok(*task),
            many => Err(Error::AmbiguousTask {
                query: query.to_string(),
                candidates: many.iter().map(|t| t.name.clone()).collect(),
            }),
        }
    }

    /// 1-based position of a task, as accepted by [`Catalog::find`].
    pub fn number_of(&self, name: &str) -> Option<usize> {
        self.tasks
            .iter()
            .position(|task| task.name.eq_ignore_ascii_case(name))
            .map(|i| i + 1)
    }

    /// TOC groups, or a single group with every task when the catalog has
    /// no TOC.
    pub fn groups(&self) -> Vec<TocGroup> {
        if !self.toc.is_empty() {
            return self.toc.clone();
        }
        vec![TocGroup {
            title: "Tasks".to_string(),
            items: self
                .tasks
                .iter()
                .map(|task| TocItem {
                    label: task.name.clone(),
                    task: task.name.clone(),
                })
                .collect(),
        }]
    }
}

fn invalid(task: &PracticeTask, message: impl Into<String>) -> Error {
    Error::InvalidTask {
        task: task.name.clone(),
        message: message.into(),
    }
}

fn validate_task(task: &PracticeTask) -> Result<()> {
    if task.name.trim().is_empty() {
        return Err(invalid(task, "name must not be empty"));
    }
    if task.require_metronome && task.tempo_bpm == 0 {
        return Err(invalid(task, "tempo must be positive when a metronome is required"));
    }
    for threshold in [task.min_note_accuracy, task.min_metronome_accuracy] {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(invalid(
                task,
                format!("accuracy threshold {} is outside 0..1", threshold),
            ));
        }
    }
    if let Some(bad) = task.fingering.iter().find(|f| !(1..=5).contains(&f.finger)) {
        return Err(invalid(
            task,
            format!("finger {} on note {} is not 1-5", bad.finger, bad.midi_note),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.tasks.len(), 41);
        assert_eq!(catalog.toc.len(), 7);
        assert_eq!(catalog.tasks[0].name, "Warmup: 5-finger C position");
        assert_eq!(catalog.tasks[0].min_note_accuracy, 1.0);

        let scales = &catalog.toc[1];
        assert_eq!(scales.title, "Scales");
        assert_eq!(scales.items.len(), 27);

        let rhythm = catalog.get("Rhythm: quarter notes @ 70 bpm").unwrap();
        assert!(rhythm.require_metronome);
        assert!(!rhythm.requires_midi_input);
        assert_eq!(rhythm.tempo_bpm, 70);
    }

    #[test]
    fn test_find_by_name_index_and_substring() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(
            catalog.find("scales: g major (rh)").unwrap().name,
            "Scales: G major (RH)"
        );
        assert_eq!(catalog.find("1").unwrap().name, "Warmup: 5-finger C position");
        assert_eq!(catalog.find("broken").unwrap().name, "Chords: C-G-Am-F broken");
        assert_eq!(catalog.number_of("Chords: C-G-Am-F broken"), Some(31));
    }

    #[test]
    fn test_find_errors() {
        let catalog = Catalog::builtin().unwrap();
        assert!(matches!(catalog.find("0"), Err(Error::TaskNotFound(_))));
        assert!(matches!(catalog.find("999"), Err(Error::TaskNotFound(_))));
        assert!(matches!(catalog.find("polka"), Err(Error::TaskNotFound(_))));
        assert!(matches!(
            catalog.find("major"),
            Err(Error::AmbiguousTask { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_tempo_metronome() {
        let json = r#"{"tasks": [{"name": "Bad", "require_metronome": true, "tempo_bpm": 0}]}"#;
        let err = Catalog::from_json(json).unwrap_err();
        assert!(err.to_string().contains("tempo must be positive"));
    }

    #[test]
    fn test_rejects_bad_finger_and_duplicates() {
        let json = r#"{"tasks": [{"name": "Bad", "fingering": [{"midi_note": 60, "finger": 6, "hand": "right"}]}]}"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(Error::InvalidTask { .. })
        ));

        let json = r#"{"tasks": [{"name": "Same"}, {"name": "same"}]}"#;
        let err = Catalog::from_json(json).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_rejects_unknown_toc_task() {
        let json = r#"{
            "tasks": [{"name": "One"}],
            "toc": [{"title": "G", "items": [{"label": "Two", "task": "Two"}]}]
        }"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(Error::UnknownTocTask { .. })
        ));
    }

    #[test]
    fn test_groups_without_toc() {
        let catalog = Catalog::from_json(r#"{"tasks": [{"name": "One"}, {"name": "Two"}]}"#).unwrap();
        let groups = catalog.groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].items.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Catalog::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
