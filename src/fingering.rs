use crate::geometry::KeyboardLayout;
use crate::models::{FingeredNote, Hand};
use crate::notes::is_accidental;

/// Radius of a finger marker, in layout units.
pub const MARKER_RADIUS: f32 = 9.0;

#[derive(Debug, Clone, PartialEq)]
pub struct FingerMarker {
    pub note: i32,
    pub center_x: f32,
    pub center_y: f32,
    pub hand: Hand,
    pub label: String,
}

/// Vertical marker position as a fraction of the white key height.
fn vertical_offset(accidental: bool, hand: Hand) -> f32 {
    match (accidental, hand) {
        (true, Hand::Right) => 0.25,
        (true, Hand::Left) => 0.38,
        (false, Hand::Right) => 0.75,
        (false, Hand::Left) => 0.58,
    }
}

/// Place markers for the annotations that fall inside `layout`; the rest are
/// skipped.
pub fn place_markers(layout: &KeyboardLayout, fingering: &[FingeredNote]) -> Vec<FingerMarker> {
    fingering
        .iter()
        .filter_map(|fingered| {
            let center_x = layout.center_x(fingered.midi_note)?;
            let offset = vertical_offset(is_accidental(fingered.midi_note), fingered.hand);
            Some(FingerMarker {
                note: fingered.midi_note,
                center_x,
                center_y: offset * layout.white_key_height,
                hand: fingered.hand,
                label: fingered.finger.to_string(),
            })
        })
        .collect()
}

/// Everything a renderer needs to draw a task's fingering.
#[derive(Debug, Clone, PartialEq)]
pub struct FingeringDiagram {
    pub keyboard: KeyboardLayout,
    pub markers: Vec<FingerMarker>,
}

impl FingeringDiagram {
    /// Keyboard sized to the annotations themselves; `None` without any.
    pub fn for_fingering(fingering: &[FingeredNote], width: f32, height: f32) -> Option<Self> {
        let keyboard =
            KeyboardLayout::compute(fingering.iter().map(|f| f.midi_note), width, height)?;
        let markers = place_markers(&keyboard, fingering);
        Some(Self { keyboard, markers })
    }
}
