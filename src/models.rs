use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Right,
    Left,
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hand::Right => write!(f, "RH"),
            Hand::Left => write!(f, "LH"),
        }
    }
}

/// A finger annotation for one key of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingeredNote {
    pub midi_note: i32,
    pub finger: u8,
    pub hand: Hand,
}

impl FingeredNote {
    pub fn new(midi_note: i32, finger: u8, hand: Hand) -> Self {
        Self {
            midi_note,
            finger,
            hand,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_tempo() -> u32 {
    60
}

fn default_tolerance() -> u32 {
    120
}

fn default_note_accuracy() -> f64 {
    0.95
}

fn default_metronome_accuracy() -> f64 {
    0.9
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeTask {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub expected_notes: Vec<i32>,
    #[serde(default)]
    pub fingering: Vec<FingeredNote>,
    #[serde(default = "default_true")]
    pub requires_midi_input: bool,
    #[serde(default)]
    pub require_metronome: bool,
    #[serde(default = "default_tempo")]
    pub tempo_bpm: u32,
    #[serde(default = "default_tolerance")]
    pub beat_tolerance_ms: u32,
    #[serde(default = "default_note_accuracy")]
    pub min_note_accuracy: f64,
    #[serde(default = "default_metronome_accuracy")]
    pub min_metronome_accuracy: f64,
}

impl PracticeTask {
    /// A task with the catalog defaults and the given expected notes.
    pub fn new(name: impl Into<String>, expected_notes: Vec<i32>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            expected_notes,
            fingering: Vec::new(),
            requires_midi_input: true,
            require_metronome: false,
            tempo_bpm: default_tempo(),
            beat_tolerance_ms: default_tolerance(),
            min_note_accuracy: default_note_accuracy(),
            min_metronome_accuracy: default_metronome_accuracy(),
        }
    }

    /// Whether a run of this task is scored by the evaluator.
    pub fn is_evaluated(&self) -> bool {
        self.requires_midi_input && !self.expected_notes.is_empty()
    }
}

/// Point-in-time snapshot of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PracticeResult {
    pub expected_notes: usize,
    pub processed_notes: usize,
    pub correct_notes: usize,
    pub wrong_notes: usize,
    pub metronome_on_beat: usize,
    pub metronome_total: usize,
    pub is_complete: bool,
}

impl PracticeResult {
    pub fn note_accuracy(&self) -> f64 {
        if self.expected_notes == 0 {
            0.0
        } else {
            self.correct_notes as f64 / self.expected_notes as f64
        }
    }

    pub fn metronome_accuracy(&self) -> f64 {
        if self.metronome_total == 0 {
            0.0
        } else {
            self.metronome_on_beat as f64 / self.metronome_total as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Pass,
    NeedsWork,
    /// A lesson without MIDI evaluation, marked done by hand.
    Completed,
}

impl Verdict {
    /// Pass iff the note accuracy meets the task threshold and, when the task
    /// requires a metronome, the metronome accuracy meets its threshold too.
    pub fn for_result(task: &PracticeTask, result: &PracticeResult) -> Self {
        let note_pass = result.note_accuracy() >= task.min_note_accuracy;
        let metronome_pass = !task.require_metronome
            || result.metronome_accuracy() >= task.min_metronome_accuracy;
        if note_pass && metronome_pass {
            Verdict::Pass
        } else {
            Verdict::NeedsWork
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "Pass",
            Verdict::NeedsWork => "Needs work",
            Verdict::Completed => "Completed",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_verdict() -> String {
    "Not started".to_string()
}

/// Persisted per-task progress record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskProgress {
    #[serde(default)]
    pub times_completed: u32,
    #[serde(default = "default_verdict")]
    pub last_verdict: String,
    #[serde(default)]
    pub last_completed_utc: Option<DateTime<Utc>>,
}

impl Default for TaskProgress {
    fn default() -> Self {
        Self {
            times_completed: 0,
            last_verdict: default_verdict(),
            last_completed_utc: None,
        }
    }
}

/// A note-on from any note source, stamped relative to the session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteOn {
    pub note: i32,
    pub time_ms: i64,
}

impl NoteOn {
    pub fn new(note: i32, time_ms: i64) -> Self {
        Self { note, time_ms }
    }
}
