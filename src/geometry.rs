//! Keyboard geometry for fingering diagrams.
//!
//! Units are whatever the renderer draws in (pixels, canvas units, terminal
//! cells); keys run left to right with y = 0 at the top edge.

use crate::notes::{is_accidental, pitch_class};

pub const MAX_WHITE_KEY_HEIGHT: f32 = 120.0;
pub const BLACK_KEY_WIDTH_RATIO: f32 = 0.65;
pub const BLACK_KEY_HEIGHT_RATIO: f32 = 0.62;

/// Inclusive note range, always starting on a C and ending on a B.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardRange {
    pub start: i32,
    pub end: i32,
}

impl KeyboardRange {
    /// Round the lowest note down to its C and the highest up to its B.
    pub fn covering(min_note: i32, max_note: i32) -> Self {
        Self {
            start: min_note - pitch_class(min_note),
            end: max_note + (11 - pitch_class(max_note)),
        }
    }

    pub fn contains(&self, note: i32) -> bool {
        (self.start..=self.end).contains(&note)
    }

    pub fn octaves(&self) -> i32 {
        (self.end - self.start + 1) / 12
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyRect {
    pub note: i32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyboardLayout {
    pub range: KeyboardRange,
    pub white_keys: Vec<i32>,
    pub white_key_width: f32,
    pub white_key_height: f32,
    pub black_key_width: f32,
    pub black_key_height: f32,
}

impl KeyboardLayout {
    /// Lay out the octaves covering `notes` across `width`.
    ///
    /// Returns `None` when there is nothing to draw: no notes, or a range
    /// without white keys.
    pub fn compute<I>(notes: I, width: f32, available_height: f32) -> Option<Self>
    where
        I: IntoIterator<Item = i32>,
    {
        let mut bounds: Option<(i32, i32)> = None;
        for note in notes {
            bounds = Some(match bounds {
                Some((lo, hi)) => (lo.min(note), hi.max(note)),
                None => (note, note),
            });
        }
        let (min_note, max_note) = bounds?;
        let range = KeyboardRange::covering(min_note, max_note);

        let white_keys: Vec<i32> = (range.start..=range.end)
            .filter(|&note| !is_accidental(note))
            .collect();
        if white_keys.is_empty() {
            return None;
        }

        let white_key_width = width / white_keys.len() as f32;
        let white_key_height = available_height.min(MAX_WHITE_KEY_HEIGHT);
        Some(Self {
            range,
            white_keys,
            white_key_width,
            white_key_height,
            black_key_width: white_key_width * BLACK_KEY_WIDTH_RATIO,
            black_key_height: white_key_height * BLACK_KEY_HEIGHT_RATIO,
        })
    }

    pub fn contains(&self, note: i32) -> bool {
        self.range.contains(note)
    }

    pub fn total_width(&self) -> f32 {
        self.white_key_width * self.white_keys.len() as f32
    }

    fn white_index(&self, note: i32) -> Option<usize> {
        self.white_keys.iter().position(|&n| n == note)
    }

    /// Horizontal anchor for a note: the middle of a white key, or for a
    /// black key the right edge of the white key below it.
    pub fn center_x(&self, note: i32) -> Option<f32> {
        if !self.contains(note) {
            return None;
        }
        if !is_accidental(note) {
            let index = self.white_index(note)? as f32;
            return Some(index * self.white_key_width + self.white_key_width / 2.0);
        }

        let mut below = note - 1;
        while below >= self.range.start && is_accidental(below) {
            below -= 1;
        }
        let index = self.white_index(below)? as f32;
        Some(index * self.white_key_width + self.white_key_width)
    }

    pub fn white_key_rects(&self) -> Vec<KeyRect> {
        self.white_keys
            .iter()
            .enumerate()
            .map(|(i, &note)| KeyRect {
                note,
                x: i as f32 * self.white_key_width,
                y: 0.0,
                width: self.white_key_width,
                height: self.white_key_height,
            })
            .collect()
    }

    /// Black keys straddle the boundary between a white key and its upper
    /// neighbour.
    pub fn black_key_rects(&self) -> Vec<KeyRect> {
        self.white_keys
            .iter()
            .enumerate()
            .filter_map(|(i, &white)| {
                let black = white + 1;
                if black > self.range.end || !is_accidental(black) {
                    return None;
                }
                Some(KeyRect {
                    note: black,
                    x: i as f32 * self.white_key_width + self.white_key_width
                        - self.black_key_width / 2.0,
                    y: 0.0,
                    width: self.black_key_width,
                    height: self.black_key_height,
                })
            })
            .collect()
    }
}
