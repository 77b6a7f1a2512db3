use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::catalog::Catalog;
use crate::fingering::FingeringDiagram;
use crate::geometry::KeyboardLayout;
use crate::models::{FingeredNote, Hand, PracticeResult, PracticeTask, TaskProgress};
use crate::notes::{note_name, pitch_class};
use crate::progress::ProgressSnapshot;
use crate::session::{FeedbackKind, NoteFeedback, Outcome};

const SEPARATOR_WIDTH: usize = 58;
const KEY_CELL_WIDTH: f32 = 4.0;
const KEY_ROWS: f32 = 8.0;

fn separator() -> String {
    "\u{2500}".repeat(SEPARATOR_WIDTH)
}

/// Format a ratio as a percentage with one decimal, e.g. 0.6667 -> "66.7%".
pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// Format a UTC timestamp in local time as "YYYY-MM-DD HH:MM".
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

pub fn format_progress_summary(progress: Option<&TaskProgress>) -> String {
    match progress {
        Some(p) if p.times_completed > 0 => format!(
            "{} completion{} ({})",
            p.times_completed,
            if p.times_completed == 1 { "" } else { "s" },
            p.last_verdict
        ),
        _ => "--".to_string(),
    }
}

fn task_flags(task: &PracticeTask) -> String {
    let mut flags = Vec::new();
    if !task.requires_midi_input {
        flags.push("lesson".to_string());
    }
    if task.require_metronome {
        flags.push(format!("metronome {} bpm", task.tempo_bpm));
    }
    if flags.is_empty() {
        String::new()
    } else {
        format!("[{}]", flags.join(", "))
    }
}

fn metronome_line(task: &PracticeTask, result: &PracticeResult) -> String {
    if !task.require_metronome {
        return "not required".to_string();
    }
    format!(
        "{} / {} on-beat ({}, target {:.0}%, \u{00b1}{} ms @ {} bpm)",
        result.metronome_on_beat,
        result.metronome_total,
        format_percent(result.metronome_accuracy()),
        task.min_metronome_accuracy * 100.0,
        task.beat_tolerance_ms,
        task.tempo_bpm,
    )
}

/// One-line feedback for the last played note.
pub fn format_feedback(feedback: &NoteFeedback) -> String {
    let played = note_name(feedback.note);
    match feedback.kind {
        FeedbackKind::Correct => format!("Last note: {} (correct)", played),
        FeedbackKind::Expected(due) => {
            format!("Last note: {} (expected {})", played, note_name(due))
        }
        FeedbackKind::Unscored | FeedbackKind::Ignored => {
            format!("Last note: {} (ignored)", played)
        }
    }
}

/// Format an evaluated take as a table.
pub fn format_outcome_table(task: &PracticeTask, outcome: &Outcome) -> String {
    let result = &outcome.result;
    let mut output = String::new();
    output.push_str(&format!("Task: {}\n", task.name));
    output.push_str(&separator());
    output.push('\n');
    output.push_str(&format!(
        "{:<12}{} / {}{}\n",
        "Played",
        result.processed_notes,
        result.expected_notes,
        if result.is_complete { "" } else { " (incomplete)" }
    ));
    output.push_str(&format!("{:<12}{}\n", "Correct", result.correct_notes));
    output.push_str(&format!("{:<12}{}\n", "Wrong", result.wrong_notes));
    output.push_str(&format!(
        "{:<12}{} (target {:.0}%)\n",
        "Accuracy",
        format_percent(result.note_accuracy()),
        task.min_note_accuracy * 100.0
    ));
    output.push_str(&format!("{:<12}{}\n", "Metronome", metronome_line(task, result)));
    output.push_str(&separator());
    output.push('\n');
    output.push_str(&format!("Verdict: {}", outcome.verdict));
    output
}

#[derive(Debug, Serialize)]
struct OutcomeReport<'a> {
    task: &'a str,
    #[serde(flatten)]
    result: &'a PracticeResult,
    note_accuracy: f64,
    metronome_accuracy: f64,
    require_metronome: bool,
    verdict: &'static str,
}

/// Format an evaluated take as pretty-printed JSON.
pub fn format_outcome_json(task: &PracticeTask, outcome: &Outcome) -> serde_json::Result<String> {
    let report = OutcomeReport {
        task: &task.name,
        result: &outcome.result,
        note_accuracy: outcome.result.note_accuracy(),
        metronome_accuracy: outcome.result.metronome_accuracy(),
        require_metronome: task.require_metronome,
        verdict: outcome.verdict.as_str(),
    };
    serde_json::to_string_pretty(&report)
}

/// The catalog's table of contents, numbered for `pianist <N>`.
pub fn format_toc(catalog: &Catalog, progress: &ProgressSnapshot) -> String {
    let mut output = String::new();
    for group in catalog.groups() {
        output.push_str(&group.title);
        output.push('\n');
        for item in &group.items {
            let number = catalog.number_of(&item.task).unwrap_or(0);
            let flags = catalog.get(&item.task).map(task_flags).unwrap_or_default();
            let label = if flags.is_empty() {
                item.label.clone()
            } else {
                format!("{} {}", item.label, flags)
            };
            output.push_str(&format!(
                "{:>4}. {:<48} {}\n",
                number,
                label,
                format_progress_summary(progress.get(&item.task))
            ));
        }
    }
    output.trim_end().to_string()
}

/// Every task that has been completed at least once.
pub fn format_progress_table(catalog: &Catalog, progress: &ProgressSnapshot) -> String {
    let mut output = format!(
        "{:<48} {:>5}  {:<12} {}\n",
        "Task", "Done", "Last verdict", "Last completed"
    );
    output.push_str(&separator());
    output.push('\n');

    let mut rows = 0;
    for task in &catalog.tasks {
        let Some(record) = progress.get(&task.name) else {
            continue;
        };
        rows += 1;
        output.push_str(&format!(
            "{:<48} {:>5}  {:<12} {}\n",
            task.name,
            record.times_completed,
            record.last_verdict,
            record
                .last_completed_utc
                .as_ref()
                .map(format_timestamp)
                .unwrap_or_else(|| "--".to_string()),
        ));
    }

    output.push_str(&separator());
    output.push('\n');
    output.push_str(&format!(
        "Tasks practiced: {} of {}",
        rows,
        catalog.tasks.len()
    ));
    output
}

fn fingering_line(fingering: &[FingeredNote], hand: Hand) -> Option<String> {
    let entries: Vec<String> = fingering
        .iter()
        .filter(|f| f.hand == hand)
        .map(|f| format!("{}={}", note_name(f.midi_note), f.finger))
        .collect();
    if entries.is_empty() {
        None
    } else {
        Some(format!("{}: {}", hand, entries.join(" ")))
    }
}

/// Draw a fingering diagram as text: one row per layout unit, four columns
/// per white key.
pub fn render_fingering_text(fingering: &[FingeredNote]) -> Option<String> {
    // First pass only counts the white keys so each one gets a whole cell.
    let probe = KeyboardLayout::compute(fingering.iter().map(|f| f.midi_note), 1.0, KEY_ROWS)?;
    let width = probe.white_keys.len() as f32 * KEY_CELL_WIDTH;
    let diagram = FingeringDiagram::for_fingering(fingering, width, KEY_ROWS)?;
    let keyboard = &diagram.keyboard;

    let rows = keyboard.white_key_height.round() as usize;
    let cols = width as usize + 1;
    let mut grid = vec![vec![' '; cols]; rows + 1];

    for key in keyboard.white_key_rects() {
        let col = key.x.round() as usize;
        for row in grid.iter_mut().take(rows) {
            row[col] = '\u{2502}';
        }
    }
    for row in grid.iter_mut().take(rows) {
        row[cols - 1] = '\u{2502}';
    }
    for cell in grid[rows].iter_mut() {
        *cell = '\u{2500}';
    }
    for key in keyboard.black_key_rects() {
        let from = key.x.round() as usize;
        let to = ((key.x + key.width).round() as usize).min(cols - 1);
        let depth = (key.height.round() as usize).min(rows);
        for row in grid.iter_mut().take(depth) {
            for cell in &mut row[from..to] {
                *cell = '\u{2588}';
            }
        }
    }
    for marker in &diagram.markers {
        let col = (marker.center_x.round() as usize).min(cols - 1);
        let row = (marker.center_y.floor() as usize).min(rows.saturating_sub(1));
        if let Some(c) = marker.label.chars().next() {
            grid[row][col] = c;
        }
    }

    let mut lines: Vec<String> = grid.into_iter().map(|row| row.into_iter().collect()).collect();

    // Octave labels under each C
    let mut names = vec![' '; cols + 4];
    for key in keyboard.white_key_rects() {
        if pitch_class(key.note) == 0 {
            let col = key.x.round() as usize + 1;
            for (i, c) in note_name(key.note).chars().enumerate() {
                if let Some(slot) = names.get_mut(col + i) {
                    *slot = c;
                }
            }
        }
    }
    lines.push(names.into_iter().collect::<String>().trim_end().to_string());

    for hand in [Hand::Right, Hand::Left] {
        if let Some(line) = fingering_line(fingering, hand) {
            lines.push(line);
        }
    }
    Some(lines.join("\n"))
}

/// Full description of one task.
pub fn format_task_detail(
    task: &PracticeTask,
    number: Option<usize>,
    progress: Option<&TaskProgress>,
) -> String {
    let mut output = String::new();
    match number {
        Some(n) => output.push_str(&format!("{}. {}\n", n, task.name)),
        None => output.push_str(&format!("{}\n", task.name)),
    }
    output.push_str(&separator());
    output.push('\n');
    if !task.description.is_empty() {
        output.push_str(&task.description);
        output.push_str("\n\n");
    }

    if task.expected_notes.is_empty() {
        output.push_str("Notes:      none (lesson)\n");
    } else {
        let names: Vec<String> = task.expected_notes.iter().map(|&n| note_name(n)).collect();
        output.push_str(&format!("Notes:      {}\n", names.join(" ")));
    }
    output.push_str(&format!(
        "MIDI input: {}\n",
        if task.requires_midi_input { "required" } else { "not required" }
    ));
    if task.require_metronome {
        output.push_str(&format!(
            "Metronome:  {} bpm, \u{00b1}{} ms (target {:.0}%)\n",
            task.tempo_bpm,
            task.beat_tolerance_ms,
            task.min_metronome_accuracy * 100.0
        ));
    } else {
        output.push_str("Metronome:  not required\n");
    }
    if task.is_evaluated() {
        output.push_str(&format!(
            "Target:     {:.0}% note accuracy\n",
            task.min_note_accuracy * 100.0
        ));
    }
    output.push_str(&format!("Progress:   {}\n", format_progress_summary(progress)));
    if let Some(at) = progress.and_then(|p| p.last_completed_utc.as_ref()) {
        output.push_str(&format!("Last done:  {}\n", format_timestamp(at)));
    }

    if let Some(diagram) = render_fingering_text(&task.fingering) {
        output.push('\n');
        output.push_str(&diagram);
        output.push('\n');
    }
    output.trim_end().to_string()
}
