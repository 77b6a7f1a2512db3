//! Recorded takes: a note stream captured from any note source, one note-on
//! per line as `<time_ms> <note>`.
//!
//! ```text
//! # C major warmup, first three notes
//! 0     C4
//! 480   62
//! 1010  E4
//! ```

use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::NoteOn;
use crate::notes::parse_note;

/// Cut a trailing comment. A `#` starts a comment only at the beginning of
/// the line or after whitespace, so sharps like `C#4` survive.
fn strip_comment(line: &str) -> &str {
    let mut after_space = true;
    for (i, c) in line.char_indices() {
        if c == '#' && after_space {
            return &line[..i];
        }
        after_space = c.is_whitespace();
    }
    line
}

pub fn parse_take(text: &str) -> Result<Vec<NoteOn>> {
    let mut events = Vec::new();
    let mut last_time: Option<i64> = None;

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        let parse_error = |message: String| Error::TakeParse {
            line: line_no,
            message,
        };

        let mut fields = line.split_whitespace();
        let (Some(time_text), Some(note_text), None) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(parse_error(format!(
                "expected '<time_ms> <note>', got '{}'",
                line
            )));
        };

        let time_ms: i64 = time_text
            .parse()
            .map_err(|_| parse_error(format!("invalid timestamp '{}'", time_text)))?;
        if let Some(previous) = last_time {
            if time_ms < previous {
                return Err(parse_error(format!(
                    "timestamp {} goes backwards (previous {})",
                    time_ms, previous
                )));
            }
        }
        let note = parse_note(note_text)
            .ok_or_else(|| parse_error(format!("invalid note '{}'", note_text)))?;

        last_time = Some(time_ms);
        events.push(NoteOn::new(note, time_ms));
    }

    Ok(events)
}

/// Read a take from a file, or from stdin when `path` is "-".
pub fn read_take(path: &str) -> Result<Vec<NoteOn>> {
    let mut text = String::new();
    if path == "-" {
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|source| Error::Io {
                path: "<stdin>".into(),
                source,
            })?;
    } else {
        text = std::fs::read_to_string(Path::new(path)).map_err(|source| Error::Io {
            path: path.into(),
            source,
        })?;
    }
    parse_take(&text)
}
