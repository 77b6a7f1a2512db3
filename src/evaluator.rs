use tracing::debug;

use crate::models::{PracticeResult, PracticeTask};

/// Timing parameters copied from a task that requires a metronome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Metronome {
    beat_ms: i64,
    tolerance_ms: i64,
}

impl Metronome {
    fn for_task(task: &PracticeTask) -> Option<Self> {
        if !task.require_metronome {
            return None;
        }
        // tempo 0 is rejected by catalog validation
        let tempo = task.tempo_bpm.max(1) as f64;
        Some(Self {
            beat_ms: (60_000.0 / tempo).round() as i64,
            tolerance_ms: i64::from(task.beat_tolerance_ms),
        })
    }

    fn is_on_beat(&self, start_ms: i64, beat_index: usize, time_ms: i64) -> bool {
        let offset = i64::try_from(beat_index)
            .unwrap_or(i64::MAX)
            .saturating_mul(self.beat_ms);
        let expected = start_ms.saturating_add(offset);
        time_ms.abs_diff(expected) <= self.tolerance_ms.unsigned_abs()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Counters {
    cursor: usize,
    correct: usize,
    wrong: usize,
    on_beat: usize,
    beats: usize,
    start_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluatorState {
    Idle,
    Active,
    Complete,
}

/// Positional evaluator for one task: the n-th note played is compared with
/// the n-th expected note, nothing else.
#[derive(Debug, Clone)]
pub struct PracticeEvaluator {
    expected: Vec<i32>,
    metronome: Option<Metronome>,
    counters: Option<Counters>,
}

impl PracticeEvaluator {
    pub fn new(task: &PracticeTask) -> Self {
        Self {
            expected: task.expected_notes.clone(),
            metronome: Metronome::for_task(task),
            counters: None,
        }
    }

    /// Begin (or restart) a session. All prior counts are discarded.
    pub fn start(&mut self, start_ms: i64) {
        self.counters = Some(Counters {
            start_ms,
            ..Counters::default()
        });
    }

    /// Score one note-on. Events after the last expected note are dropped.
    ///
    /// # Panics
    ///
    /// Panics if called before [`PracticeEvaluator::start`].
    pub fn process_note(&mut self, midi_note: i32, time_ms: i64) {
        let counters = self
            .counters
            .as_mut()
            .expect("PracticeEvaluator::process_note called before start");

        let Some(&expected) = self.expected.get(counters.cursor) else {
            return;
        };

        if midi_note == expected {
            counters.correct += 1;
        } else {
            counters.wrong += 1;
        }

        if let Some(metronome) = self.metronome {
            counters.beats += 1;
            if metronome.is_on_beat(counters.start_ms, counters.cursor, time_ms) {
                counters.on_beat += 1;
            }
        }

        debug!(
            index = counters.cursor,
            expected,
            played = midi_note,
            time_ms,
            "note evaluated"
        );
        counters.cursor += 1;
    }

    pub fn result(&self) -> PracticeResult {
        let counters = self.counters.unwrap_or_default();
        PracticeResult {
            expected_notes: self.expected.len(),
            processed_notes: counters.cursor,
            correct_notes: counters.correct,
            wrong_notes: counters.wrong,
            metronome_on_beat: counters.on_beat,
            metronome_total: counters.beats,
            is_complete: counters.cursor >= self.expected.len(),
        }
    }

    pub fn state(&self) -> EvaluatorState {
        match self.counters {
            None => EvaluatorState::Idle,
            Some(c) if c.cursor >= self.expected.len() => EvaluatorState::Complete,
            Some(_) => EvaluatorState::Active,
        }
    }

    /// The note the cursor is waiting for, if the session is still running.
    pub fn expected_note(&self) -> Option<i32> {
        let cursor = self.counters.map(|c| c.cursor)?;
        self.expected.get(cursor).copied()
    }
}
