use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use pianist::catalog::Catalog;
use pianist::fingering::FingeringDiagram;
use pianist::geometry::KeyboardLayout;
use pianist::models::{FingeredNote, Hand, NoteOn, PracticeTask, Verdict};
use pianist::progress::ProgressStore;
use pianist::session::{drive, spawn_feed, PracticeSession};
use pianist::take::parse_take;

const WARMUP_TAKE: &str = "\
# 5-finger C position, up and down
0    C4
450  D4
900  E4
1350 F4
1800 G4
2250 F4
2700 E4
3150 D4
3600 C4
";

fn write_take(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

// --- Library tests ---

#[test]
fn test_take_through_session_with_metronome() {
    let mut task = PracticeTask::new("Steady", vec![60, 62, 64, 65]);
    task.require_metronome = true;
    task.tempo_bpm = 60;
    task.beat_tolerance_ms = 120;
    task.min_note_accuracy = 1.0;
    task.min_metronome_accuracy = 0.75;

    // Third note lands 200 ms late
    let events = parse_take("0 C4\n1000 D4\n2200 E4\n3050 F4\n").unwrap();
    let mut session = PracticeSession::new(task);
    session.start(0);
    let outcome = drive(&mut session, spawn_feed(events)).unwrap();

    assert_eq!(outcome.result.correct_notes, 4);
    assert_eq!(outcome.result.metronome_total, 4);
    assert_eq!(outcome.result.metronome_on_beat, 3);
    assert_eq!(outcome.verdict, Verdict::Pass);
}

#[test]
fn test_builtin_warmup_passes_with_clean_take() {
    let catalog = Catalog::builtin().unwrap();
    let task = catalog.find("warmup").unwrap().clone();
    let mut session = PracticeSession::new(task);
    session.start(0);
    let events = parse_take(WARMUP_TAKE).unwrap();
    let outcome = drive(&mut session, spawn_feed(events)).unwrap();
    assert_eq!(outcome.verdict, Verdict::Pass);
    assert_eq!(outcome.result.processed_notes, 9);
}

#[test]
fn test_stopped_session_ignores_notes() {
    let mut session = PracticeSession::new(PracticeTask::new("Two", vec![60, 62]));
    session.start(0);
    session.handle_note(NoteOn::new(60, 0));
    session.stop();
    session.handle_note(NoteOn::new(62, 10));
    assert_eq!(session.result().unwrap().processed_notes, 1);
}

#[test]
fn test_c4_octave_geometry() {
    let layout = KeyboardLayout::compute([60, 64], 700.0, 300.0).unwrap();
    assert_eq!(layout.range.start, 60);
    assert_eq!(layout.range.end, 71);
    assert_eq!(layout.white_keys.len(), 7);
    assert!((layout.white_key_width - 100.0).abs() < 1e-4);
    assert!((layout.white_key_height - 120.0).abs() < 1e-4);
    assert_eq!(layout.black_key_rects().len(), 5);
}

#[test]
fn test_fingering_diagram_for_builtin_scale() {
    let catalog = Catalog::builtin().unwrap();
    for task in catalog.tasks.iter().filter(|t| !t.fingering.is_empty()) {
        let diagram = FingeringDiagram::for_fingering(&task.fingering, 600.0, 200.0).unwrap();
        assert_eq!(diagram.markers.len(), task.fingering.len(), "{}", task.name);
    }

    let both = [
        FingeredNote::new(48, 5, Hand::Left),
        FingeredNote::new(72, 1, Hand::Right),
    ];
    let diagram = FingeringDiagram::for_fingering(&both, 300.0, 100.0).unwrap();
    assert_eq!(diagram.keyboard.range.start, 48);
    assert_eq!(diagram.keyboard.range.end, 83);
}

#[test]
fn test_progress_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = ProgressStore::in_dir(dir.path());
    store
        .record_completion("Warmup: 5-finger C position", Verdict::Pass, chrono::Utc::now())
        .unwrap();
    let snapshot = ProgressStore::in_dir(dir.path()).load();
    assert_eq!(
        snapshot.get("warmup: 5-finger c position").unwrap().last_verdict,
        "Pass"
    );
}

// --- CLI tests ---

#[test]
fn test_list_shows_plan() {
    let data = tempfile::tempdir().unwrap();
    cargo_bin_cmd!("pianist")
        .args(["--list", "--data-dir", data.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicates::str::contains("Warmup"))
        .stdout(predicates::str::contains("1. 5-finger C position"))
        .stdout(predicates::str::contains("Ear Training"));
}

#[test]
fn test_show_task_detail() {
    let data = tempfile::tempdir().unwrap();
    cargo_bin_cmd!("pianist")
        .args(["1", "--show", "--data-dir", data.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicates::str::contains("Notes:      C4 D4 E4 F4 G4"))
        .stdout(predicates::str::contains("RH: C4=1 D4=2 E4=3 F4=4 G4=5"));
}

#[test]
fn test_take_records_progress() {
    let data = tempfile::tempdir().unwrap();
    let take = write_take(data.path(), "warmup.take", WARMUP_TAKE);

    cargo_bin_cmd!("pianist")
        .args([
            "1",
            "--take",
            take.to_str().unwrap(),
            "--data-dir",
            data.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicates::str::contains("9 / 9"))
        .stdout(predicates::str::contains("Verdict: Pass"));

    let json = std::fs::read_to_string(data.path().join("progress.json")).unwrap();
    let records: serde_json::Value = serde_json::from_str(&json).unwrap();
    let record = &records["Warmup: 5-finger C position"];
    assert_eq!(record["times_completed"], 1);
    assert_eq!(record["last_verdict"], "Pass");

    cargo_bin_cmd!("pianist")
        .args(["--progress", "--data-dir", data.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicates::str::contains("Tasks practiced: 1 of 41"));
}

#[test]
fn test_take_json_from_stdin() {
    let data = tempfile::tempdir().unwrap();
    let output = cargo_bin_cmd!("pianist")
        .args([
            "warmup",
            "--take",
            "-",
            "--json",
            "--no-record",
            "--data-dir",
            data.path().to_str().unwrap(),
        ])
        .write_stdin("0 C4\n500 D4\n1000 D4\n")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["task"], "Warmup: 5-finger C position");
    assert_eq!(report["processed_notes"], 3);
    assert_eq!(report["wrong_notes"], 1);
    assert_eq!(report["is_complete"], false);
    assert_eq!(report["verdict"], "Needs work");
}

#[test]
fn test_no_record_leaves_data_dir_empty() {
    let data = tempfile::tempdir().unwrap();
    let take = write_take(data.path(), "warmup.take", WARMUP_TAKE);
    cargo_bin_cmd!("pianist")
        .args([
            "1",
            "--take",
            take.to_str().unwrap(),
            "--no-record",
            "--data-dir",
            data.path().to_str().unwrap(),
        ])
        .assert()
        .success();
    assert!(!data.path().join("progress.json").exists());
}

#[test]
fn test_take_parse_error_names_line() {
    let data = tempfile::tempdir().unwrap();
    let take = write_take(data.path(), "bad.take", "0 C4\n100 H4\n");
    cargo_bin_cmd!("pianist")
        .args([
            "1",
            "--take",
            take.to_str().unwrap(),
            "--data-dir",
            data.path().to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicates::str::contains("line 2"));
}

#[test]
fn test_lesson_cannot_take() {
    let data = tempfile::tempdir().unwrap();
    let take = write_take(data.path(), "any.take", "0 C4\n");
    cargo_bin_cmd!("pianist")
        .args([
            "Rhythm: quarter notes @ 70 bpm",
            "--take",
            take.to_str().unwrap(),
            "--data-dir",
            data.path().to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicates::str::contains("has no notes to evaluate"));
}

#[test]
fn test_custom_catalog() {
    let data = tempfile::tempdir().unwrap();
    let catalog = data.path().join("plan.json");
    std::fs::write(
        &catalog,
        r#"{"tasks": [{"name": "Thirds", "expected_notes": [60, 64, 67]}]}"#,
    )
    .unwrap();
    cargo_bin_cmd!("pianist")
        .args([
            "--list",
            "--catalog",
            catalog.to_str().unwrap(),
            "--data-dir",
            data.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicates::str::contains("1. Thirds"));
}

#[test]
fn test_invalid_catalog() {
    let data = tempfile::tempdir().unwrap();
    let catalog = data.path().join("plan.json");
    std::fs::write(&catalog, r#"{"tasks": [{"name": ""}]}"#).unwrap();
    cargo_bin_cmd!("pianist")
        .args(["--list", "--catalog", catalog.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicates::str::contains("Failed to load catalog"));
}

// --- CLI validation tests ---

#[test]
fn test_take_and_tui_conflict() {
    cargo_bin_cmd!("pianist")
        .args(["1", "--take", "x.take", "--tui"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("--take and --tui cannot be used together"));
}

#[test]
fn test_take_requires_task() {
    cargo_bin_cmd!("pianist")
        .args(["--take", "x.take"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("--take requires a TASK"));
}

#[test]
fn test_show_requires_task() {
    cargo_bin_cmd!("pianist")
        .args(["--show"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("--show requires a TASK"));
}

#[test]
fn test_unknown_task() {
    let data = tempfile::tempdir().unwrap();
    cargo_bin_cmd!("pianist")
        .args(["polka", "--data-dir", data.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicates::str::contains("No task matches 'polka'"));
}

#[test]
fn test_ambiguous_task() {
    cargo_bin_cmd!("pianist")
        .args(["major", "--show"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("matches several tasks"));
}

#[test]
fn test_take_with_sharp_names() {
    let data = tempfile::tempdir().unwrap();
    let catalog = data.path().join("plan.json");
    std::fs::write(
        &catalog,
        r#"{"tasks": [{"name": "Black keys", "expected_notes": [61, 66]}]}"#,
    )
    .unwrap();
    let take = write_take(data.path(), "sharps.take", "0 C#4\n500 F#4 # second\n");
    cargo_bin_cmd!("pianist")
        .args([
            "1",
            "--take",
            take.to_str().unwrap(),
            "--catalog",
            catalog.to_str().unwrap(),
            "--no-record",
        ])
        .assert()
        .success()
        .stdout(predicates::str::contains("Correct     2"))
        .stdout(predicates::str::contains("Verdict: Pass"));
}
