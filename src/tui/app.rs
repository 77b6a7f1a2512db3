use std::time::Instant;

use chrono::Utc;

use crate::catalog::Catalog;
use crate::format::format_percent;
use crate::models::{NoteOn, PracticeTask, Verdict};
use crate::notes::note_name;
use crate::progress::{ProgressSnapshot, ProgressStore};
use crate::session::{NoteFeedback, PracticeSession};

/// Computer keys mapped to semitones above the octave's C.
const NOTE_KEYS: [char; 13] = [
    'a', 'w', 's', 'e', 'd', 'f', 't', 'g', 'y', 'h', 'u', 'j', 'k',
];
const BASE_NOTE: i32 = 60;
const MAX_OCTAVE_SHIFT: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View {
    Main,
    About,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListEntry {
    Group(String),
    Task { label: String, index: usize },
}

pub struct App {
    pub catalog: Catalog,
    pub entries: Vec<ListEntry>,
    /// Index into `entries`; always points at a task entry.
    pub selected: usize,
    pub scroll_offset: usize,
    /// Visible height of the task list (updated each frame by the renderer)
    pub visible_rows: usize,
    pub session: PracticeSession,
    pub store: ProgressStore,
    pub progress: ProgressSnapshot,
    pub record: bool,
    pub octave_shift: i32,
    pub view: View,
    pub should_quit: bool,
    pub message: Option<String>,
    clock: Instant,
}

fn build_entries(catalog: &Catalog) -> Vec<ListEntry> {
    let mut entries = Vec::new();
    for group in catalog.groups() {
        entries.push(ListEntry::Group(group.title));
        for item in group.items {
            if let Some(number) = catalog.number_of(&item.task) {
                entries.push(ListEntry::Task {
                    label: item.label,
                    index: number - 1,
                });
            }
        }
    }
    entries
}

impl App {
    /// `initial` is a task index into the catalog; it falls back to the
    /// first task in the list.
    pub fn new(catalog: Catalog, store: ProgressStore, initial: Option<usize>, record: bool) -> Self {
        let entries = build_entries(&catalog);
        let selected = entries
            .iter()
            .position(|e| matches!(e, ListEntry::Task { index, .. } if Some(*index) == initial))
            .or_else(|| entries.iter().position(|e| matches!(e, ListEntry::Task { .. })))
            .unwrap_or(0);
        let task = task_at(&catalog, &entries, selected)
            .cloned()
            .unwrap_or_else(|| PracticeTask::new("", Vec::new()));
        let progress = store.load();

        let mut app = Self {
            catalog,
            entries,
            selected,
            scroll_offset: 0,
            visible_rows: 20,
            session: PracticeSession::new(task),
            store,
            progress,
            record,
            octave_shift: 0,
            view: View::Main,
            should_quit: false,
            message: None,
            clock: Instant::now(),
        };
        app.ensure_visible();
        app
    }

    pub fn task(&self) -> &PracticeTask {
        self.session.task()
    }

    fn now_ms(&self) -> i64 {
        self.clock.elapsed().as_millis() as i64
    }

    pub fn select_next(&mut self) {
        if let Some(next) = (self.selected + 1..self.entries.len()).find(|&i| self.is_task(i)) {
            self.select(next);
        }
    }

    pub fn select_prev(&mut self) {
        if let Some(prev) = (0..self.selected).rev().find(|&i| self.is_task(i)) {
            self.select(prev);
        }
    }

    fn is_task(&self, entry: usize) -> bool {
        matches!(self.entries.get(entry), Some(ListEntry::Task { .. }))
    }

    fn select(&mut self, entry: usize) {
        self.selected = entry;
        if let Some(task) = task_at(&self.catalog, &self.entries, entry) {
            self.session = PracticeSession::new(task.clone());
        }
        self.message = None;
        self.ensure_visible();
    }

    /// Adjust scroll_offset so that self.selected is within the visible window.
    pub fn ensure_visible(&mut self) {
        if self.visible_rows == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + self.visible_rows {
            self.scroll_offset = self.selected - self.visible_rows + 1;
        }
    }

    pub fn start(&mut self) {
        let now = self.now_ms();
        self.session.start(now);
        self.message = Some(if self.task().is_evaluated() {
            "Running: play the notes".to_string()
        } else if self.task().requires_midi_input {
            "Running (nothing to evaluate)".to_string()
        } else {
            "Running: press [c] when the lesson is done".to_string()
        });
    }

    pub fn stop(&mut self) {
        if self.session.is_running() {
            self.session.stop();
            self.message = Some("Stopped".to_string());
        }
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.message = None;
    }

    pub fn complete_lesson(&mut self) {
        match self.session.complete_lesson() {
            Some(verdict) => self.record(verdict),
            None if self.task().requires_midi_input => {
                self.message = Some("This task is scored from played notes".to_string());
            }
            None => {
                self.message = Some("Start the lesson first ([Enter])".to_string());
            }
        }
    }

    /// Computer key to note, honouring the octave shift.
    pub fn key_note(&self, key: char) -> Option<i32> {
        let offset = NOTE_KEYS.iter().position(|&k| k == key)? as i32;
        Some(BASE_NOTE + self.octave_shift * 12 + offset)
    }

    pub fn shift_octave(&mut self, delta: i32) {
        self.octave_shift = (self.octave_shift + delta).clamp(-MAX_OCTAVE_SHIFT, MAX_OCTAVE_SHIFT);
    }

    pub fn play(&mut self, note: i32) -> NoteFeedback {
        let event = NoteOn::new(note, self.now_ms());
        let feedback = self.session.handle_note(event);
        if let Some(outcome) = feedback.outcome {
            self.record(outcome.verdict);
        }
        feedback
    }

    fn record(&mut self, verdict: Verdict) {
        if !self.record {
            self.message = Some(format!("Verdict: {}", verdict));
            return;
        }
        let name = self.task().name.clone();
        match self.store.record_completion(&name, verdict, Utc::now()) {
            Ok(_) => {
                self.progress = self.store.load();
                self.message = Some(format!("Verdict: {} (saved)", verdict));
            }
            Err(e) => {
                self.message = Some(format!("Verdict: {} (could not save progress: {})", verdict, e));
            }
        }
    }

    pub fn progress_text(&self) -> String {
        match self.session.result() {
            Some(result) => format!(
                "Progress: {} / {}",
                result.processed_notes, result.expected_notes
            ),
            None => format!("Progress: 0 / {}", self.task().expected_notes.len()),
        }
    }

    pub fn accuracy_text(&self) -> String {
        let target = format!("{:.0}%", self.task().min_note_accuracy * 100.0);
        match self.session.result() {
            Some(result) if result.processed_notes > 0 => format!(
                "Accuracy: {} (target {})",
                format_percent(result.note_accuracy()),
                target
            ),
            _ => format!("Accuracy: -- (target {})", target),
        }
    }

    pub fn metronome_text(&self) -> String {
        let task = self.task();
        if !task.require_metronome {
            return "Metronome: off".to_string();
        }
        let target = format!(
            "target {:.0}% at {} bpm",
            task.min_metronome_accuracy * 100.0,
            task.tempo_bpm
        );
        match self.session.result() {
            Some(result) => format!(
                "Metronome: {} / {} on-beat ({})",
                result.metronome_on_beat, result.metronome_total, target
            ),
            None => format!("Metronome: -- ({})", target),
        }
    }

    pub fn octave_text(&self) -> String {
        let low = BASE_NOTE + self.octave_shift * 12;
        format!(
            "Keys: {}..{}",
            note_name(low),
            note_name(low + 12)
        )
    }
}

fn task_at<'a>(catalog: &'a Catalog, entries: &[ListEntry], entry: usize) -> Option<&'a PracticeTask> {
    match entries.get(entry)? {
        ListEntry::Task { index, .. } => catalog.tasks.get(*index),
        ListEntry::Group(_) => None,
    }
}
