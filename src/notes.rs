const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Pitch classes of the black keys (C#, D#, F#, G#, A#).
const ACCIDENTAL_CLASSES: [i32; 5] = [1, 3, 6, 8, 10];

pub const UNKNOWN_NOTE: &str = "Unknown";

/// Pitch class (0-11) of any integer note, including negative values.
pub fn pitch_class(midi: i32) -> i32 {
    midi.rem_euclid(12)
}

/// True for black keys.
pub fn is_accidental(midi: i32) -> bool {
    ACCIDENTAL_CLASSES.contains(&pitch_class(midi))
}

/// Name a MIDI note using sharps, e.g. 60 -> "C4", 70 -> "A#4".
/// Notes outside 0..=127 yield "Unknown".
pub fn note_name(midi: i32) -> String {
    if !(0..=127).contains(&midi) {
        return UNKNOWN_NOTE.to_string();
    }
    let octave = midi / 12 - 1;
    format!("{}{}", NOTE_NAMES[pitch_class(midi) as usize], octave)
}

/// Parse a MIDI number ("61") or a note name ("C#4", "Db4", "b-1").
/// Returns `None` for anything that is not a note in 0..=127.
pub fn parse_note(text: &str) -> Option<i32> {
    let text = text.trim();
    if let Ok(midi) = text.parse::<i32>() {
        return (0..=127).contains(&midi).then_some(midi);
    }

    let mut chars = text.chars();
    let base = match chars.next()?.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest = chars.as_str();
    let (shift, octave_text) = if let Some(stripped) = rest.strip_prefix('#') {
        (1, stripped)
    } else if let Some(stripped) = rest.strip_prefix('b') {
        (-1, stripped)
    } else {
        (0, rest)
    };

    let octave: i32 = octave_text.parse().ok()?;
    let midi = octave
        .checked_add(1)?
        .checked_mul(12)?
        .checked_add(base + shift)?;
    (0..=127).contains(&midi).then_some(midi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_name() {
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(69), "A4");
        assert_eq!(note_name(61), "C#4");
        assert_eq!(note_name(0), "C-1");
        assert_eq!(note_name(127), "G9");
    }

    #[test]
    fn test_note_name_out_of_range() {
        assert_eq!(note_name(-1), "Unknown");
        assert_eq!(note_name(128), "Unknown");
    }

    #[test]
    fn test_accidentals() {
        let black: Vec<i32> = (60..72).filter(|&n| is_accidental(n)).collect();
        assert_eq!(black, vec![61, 63, 66, 68, 70]);
        // Negative notes still map onto the right pitch class
        assert_eq!(pitch_class(-1), 11);
        assert!(!is_accidental(-1));
        assert!(is_accidental(-2));
    }

    #[test]
    fn test_parse_note() {
        assert_eq!(parse_note("60"), Some(60));
        assert_eq!(parse_note("C4"), Some(60));
        assert_eq!(parse_note("c#4"), Some(61));
        assert_eq!(parse_note("Db4"), Some(61));
        assert_eq!(parse_note("Bb3"), Some(58));
        assert_eq!(parse_note("C-1"), Some(0));
        assert_eq!(parse_note(" A4 "), Some(69));
    }

    #[test]
    fn test_parse_note_rejects_garbage() {
        assert_eq!(parse_note(""), None);
        assert_eq!(parse_note("H4"), None);
        assert_eq!(parse_note("C"), None);
        assert_eq!(parse_note("128"), None);
        assert_eq!(parse_note("Cb-1"), None);
        assert_eq!(parse_note("G#9"), None);
    }

    #[test]
    fn test_parse_note_extreme_octaves() {
        assert_eq!(parse_note("C2147483647"), None);
        assert_eq!(parse_note("B#2147483646"), None);
        assert_eq!(parse_note("C-2147483648"), None);
    }
}
