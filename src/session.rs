use std::sync::mpsc::{self, Receiver};
use std::thread;

use tracing::info;

use crate::evaluator::PracticeEvaluator;
use crate::models::{NoteOn, PracticeResult, PracticeTask, Verdict};

/// Capacity of the note feed between a note source and its session.
pub const FEED_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Correct,
    /// Played something else; carries the note that was due.
    Expected(i32),
    /// Evaluated run, but nothing was left to compare against.
    Unscored,
    /// No run in progress, or the task is a lesson without evaluation.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteFeedback {
    pub note: i32,
    pub kind: FeedbackKind,
    /// Set on the note that completes the run.
    pub outcome: Option<Outcome>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub result: PracticeResult,
    pub verdict: Verdict,
}

/// One run of one task. Owns the evaluator; every method must be called from
/// the thread that owns the session.
#[derive(Debug, Clone)]
pub struct PracticeSession {
    task: PracticeTask,
    evaluator: Option<PracticeEvaluator>,
    running: bool,
    last_feedback: Option<NoteFeedback>,
}

impl PracticeSession {
    pub fn new(task: PracticeTask) -> Self {
        Self {
            task,
            evaluator: None,
            running: false,
            last_feedback: None,
        }
    }

    pub fn task(&self) -> &PracticeTask {
        &self.task
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn last_feedback(&self) -> Option<&NoteFeedback> {
        self.last_feedback.as_ref()
    }

    /// Begin a run. Tasks that need MIDI input and have expected notes are
    /// evaluated; anything else runs as an unscored lesson.
    pub fn start(&mut self, start_ms: i64) {
        self.evaluator = self.task.is_evaluated().then(|| {
            let mut evaluator = PracticeEvaluator::new(&self.task);
            evaluator.start(start_ms);
            evaluator
        });
        self.running = true;
        self.last_feedback = None;
        info!(task = %self.task.name, evaluated = self.evaluator.is_some(), "session started");
    }

    pub fn handle_note(&mut self, event: NoteOn) -> NoteFeedback {
        let feedback = self.evaluate(event);
        self.last_feedback = Some(feedback);
        feedback
    }

    fn evaluate(&mut self, event: NoteOn) -> NoteFeedback {
        let ignored = NoteFeedback {
            note: event.note,
            kind: FeedbackKind::Ignored,
            outcome: None,
        };
        if !self.running {
            return ignored;
        }
        let Some(evaluator) = self.evaluator.as_mut() else {
            return ignored;
        };

        let expected = evaluator.expected_note();
        evaluator.process_note(event.note, event.time_ms);
        let result = evaluator.result();

        let kind = match expected {
            Some(note) if note == event.note => FeedbackKind::Correct,
            Some(note) => FeedbackKind::Expected(note),
            None => FeedbackKind::Unscored,
        };

        let outcome = if result.is_complete {
            Some(self.finish(result))
        } else {
            None
        };

        NoteFeedback {
            note: event.note,
            kind,
            outcome,
        }
    }

    fn finish(&mut self, result: PracticeResult) -> Outcome {
        self.running = false;
        let verdict = Verdict::for_result(&self.task, &result);
        info!(
            task = %self.task.name,
            correct = result.correct_notes,
            expected = result.expected_notes,
            verdict = %verdict,
            "session complete"
        );
        Outcome { result, verdict }
    }

    /// The note due next while a scored run is in progress.
    pub fn expected_note(&self) -> Option<i32> {
        if !self.running {
            return None;
        }
        self.evaluator.as_ref()?.expected_note()
    }

    /// Current snapshot, `None` for unscored runs.
    pub fn result(&self) -> Option<PracticeResult> {
        self.evaluator.as_ref().map(PracticeEvaluator::result)
    }

    /// Stop without completing; the last snapshot stays readable.
    pub fn stop(&mut self) -> Option<PracticeResult> {
        self.running = false;
        self.result()
    }

    /// Drop the run entirely.
    pub fn reset(&mut self) {
        self.running = false;
        self.evaluator = None;
        self.last_feedback = None;
    }

    /// Mark a running lesson as done. Only tasks that do not take MIDI input
    /// can be completed by hand.
    pub fn complete_lesson(&mut self) -> Option<Verdict> {
        if !self.running || self.task.requires_midi_input {
            return None;
        }
        self.running = false;
        Some(Verdict::Completed)
    }

    /// Verdict for the run as it stands, used when a note source ends before
    /// the last expected note.
    pub fn verdict(&self) -> Option<Outcome> {
        let result = self.result()?;
        Some(Outcome {
            result,
            verdict: Verdict::for_result(&self.task, &result),
        })
    }
}

/// Replay note-ons from a producer thread through a bounded channel.
pub fn spawn_feed(events: Vec<NoteOn>) -> Receiver<NoteOn> {
    let (tx, rx) = mpsc::sync_channel(FEED_CAPACITY);
    thread::spawn(move || {
        for event in events {
            if tx.send(event).is_err() {
                // consumer finished early
                break;
            }
        }
    });
    rx
}

/// Feed a started session from `rx` until it completes or the feed closes.
/// Returns the final outcome, or `None` for unscored runs.
pub fn drive(session: &mut PracticeSession, rx: Receiver<NoteOn>) -> Option<Outcome> {
    for event in rx {
        if let Some(outcome) = session.handle_note(event).outcome {
            return Some(outcome);
        }
    }
    session.stop();
    session.verdict()
}
