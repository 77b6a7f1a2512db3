use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Circle, Line as CanvasLine, Rectangle};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

use super::app::{App, ListEntry, View};
use crate::fingering::{FingeringDiagram, MARKER_RADIUS};
use crate::format::format_feedback;
use crate::geometry::KeyboardLayout;
use crate::models::{Hand, PracticeTask};
use crate::session::FeedbackKind;

const ACCENT: Color = Color::Cyan;
const DIM: Color = Color::DarkGray;
const CORRECT_COLOR: Color = Color::Green;
const WRONG_COLOR: Color = Color::Red;
const RIGHT_HAND_COLOR: Color = Color::Yellow;
const LEFT_HAND_COLOR: Color = Color::Magenta;

/// Canvas units for the keyboard; the widget scales them to the area.
const KEYBOARD_WIDTH: f32 = 100.0;
const KEYBOARD_HEIGHT: f32 = 100.0;
const BLACK_KEY_STROKES: usize = 6;

pub fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Tasks + keyboard
            Constraint::Length(6), // Status
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(44), Constraint::Min(30)])
        .split(chunks[1]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(5)])
        .split(middle[1]);

    render_header(frame, app, chunks[0]);
    render_task_list(frame, app, middle[0]);
    render_keyboard(frame, app, right[0]);
    render_description(frame, app, right[1]);
    render_status(frame, app, chunks[2]);
    render_footer(frame, app, chunks[3]);

    if app.view == View::About {
        render_about_overlay(frame);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let state = if app.session.is_running() {
        Span::styled("running", Style::default().fg(CORRECT_COLOR))
    } else {
        Span::styled("idle", Style::default().fg(DIM))
    };

    let text = vec![Line::from(vec![
        Span::styled("Task: ", Style::default().fg(DIM)),
        Span::styled(
            app.task().name.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        state,
        Span::raw("  "),
        Span::styled(app.octave_text(), Style::default().fg(DIM)),
    ])];

    let block = Block::default()
        .title(Span::styled(
            " Pianist ",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));

    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn render_task_list(frame: &mut Frame, app: &mut App, area: Rect) {
    // 2 for borders
    let inner_height = area.height.saturating_sub(2) as usize;
    app.visible_rows = inner_height;
    app.ensure_visible();

    let total = app.entries.len();
    let scroll_info = if total > inner_height {
        format!(
            " [{}-{}/{}] ",
            app.scroll_offset + 1,
            (app.scroll_offset + inner_height).min(total),
            total
        )
    } else {
        String::new()
    };

    let end = (app.scroll_offset + inner_height).min(total);
    let rows: Vec<Row> = app.entries[app.scroll_offset..end]
        .iter()
        .enumerate()
        .map(|(vi, entry)| {
            let actual_index = app.scroll_offset + vi;
            match entry {
                ListEntry::Group(title) => Row::new(vec![
                    Cell::from(title.as_str())
                        .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
                    Cell::from(""),
                ]),
                ListEntry::Task { label, index } => {
                    let done = app
                        .catalog
                        .tasks
                        .get(*index)
                        .and_then(|task| app.progress.get(&task.name))
                        .filter(|record| record.times_completed > 0);
                    let mark = match done {
                        Some(record) if record.last_verdict == "Needs work" => {
                            Cell::from("\u{00b7}").style(Style::default().fg(WRONG_COLOR))
                        }
                        Some(_) => Cell::from("\u{2713}").style(Style::default().fg(CORRECT_COLOR)),
                        None => Cell::from(""),
                    };
                    let style = if actual_index == app.selected {
                        Style::default().bg(Color::DarkGray)
                    } else {
                        Style::default()
                    };
                    Row::new(vec![Cell::from(format!("  {}", label)), mark]).style(style)
                }
            }
        })
        .collect();

    let widths = [Constraint::Min(20), Constraint::Length(2)];
    let block = Block::default()
        .title(Span::styled(scroll_info, Style::default().fg(DIM)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));

    frame.render_widget(Table::new(rows, widths).block(block), area);
}

/// The task's fingering diagram; tasks without fingering get a plain
/// keyboard over their notes, and lessons the middle octave.
fn diagram_for(task: &PracticeTask) -> Option<FingeringDiagram> {
    FingeringDiagram::for_fingering(&task.fingering, KEYBOARD_WIDTH, KEYBOARD_HEIGHT).or_else(|| {
        let notes = if task.expected_notes.is_empty() {
            vec![60]
        } else {
            task.expected_notes.clone()
        };
        KeyboardLayout::compute(notes, KEYBOARD_WIDTH, KEYBOARD_HEIGHT).map(|keyboard| {
            FingeringDiagram {
                keyboard,
                markers: Vec::new(),
            }
        })
    })
}

fn hand_color(hand: Hand) -> Color {
    match hand {
        Hand::Right => RIGHT_HAND_COLOR,
        Hand::Left => LEFT_HAND_COLOR,
    }
}

fn render_keyboard(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(" Keyboard ", Style::default().fg(DIM)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));

    let Some(diagram) = diagram_for(app.task()) else {
        frame.render_widget(block, area);
        return;
    };

    let keyboard = &diagram.keyboard;
    let height = keyboard.white_key_height as f64;
    let radius = (keyboard.white_key_width * 0.3).min(MARKER_RADIUS) as f64;
    let expected = app.session.expected_note();
    let last = app.session.last_feedback().copied();

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([0.0, keyboard.total_width() as f64])
        .y_bounds([0.0, height])
        .paint(|ctx| {
            // Layout y grows downwards; the canvas y grows upwards.
            for key in keyboard.white_key_rects() {
                ctx.draw(&Rectangle {
                    x: key.x as f64,
                    y: height - (key.y + key.height) as f64,
                    width: key.width as f64,
                    height: key.height as f64,
                    color: Color::White,
                });
            }
            ctx.layer();
            for key in keyboard.black_key_rects() {
                let bottom = height - (key.y + key.height) as f64;
                for stroke in 0..=BLACK_KEY_STROKES {
                    let x = key.x as f64
                        + key.width as f64 * stroke as f64 / BLACK_KEY_STROKES as f64;
                    ctx.draw(&CanvasLine {
                        x1: x,
                        y1: bottom,
                        x2: x,
                        y2: height,
                        color: Color::Gray,
                    });
                }
            }
            ctx.layer();
            for marker in &diagram.markers {
                ctx.draw(&Circle {
                    x: marker.center_x as f64,
                    y: height - marker.center_y as f64,
                    radius,
                    color: hand_color(marker.hand),
                });
                ctx.print(
                    marker.center_x as f64,
                    height - marker.center_y as f64,
                    Span::styled(
                        marker.label.clone(),
                        Style::default()
                            .fg(hand_color(marker.hand))
                            .add_modifier(Modifier::BOLD),
                    ),
                );
            }
            if let Some(x) = expected.and_then(|note| keyboard.center_x(note)) {
                ctx.print(
                    x as f64,
                    height * 0.05,
                    Span::styled("\u{25b2}", Style::default().fg(ACCENT)),
                );
            }
            if let Some(feedback) = last {
                if let Some(x) = keyboard.center_x(feedback.note) {
                    let color = match feedback.kind {
                        FeedbackKind::Correct => CORRECT_COLOR,
                        FeedbackKind::Expected(_) => WRONG_COLOR,
                        FeedbackKind::Unscored | FeedbackKind::Ignored => DIM,
                    };
                    ctx.print(
                        x as f64,
                        height * 0.15,
                        Span::styled("\u{25cf}", Style::default().fg(color)),
                    );
                }
            }
        });

    frame.render_widget(canvas, area);
}

fn render_description(frame: &mut Frame, app: &App, area: Rect) {
    let paragraph = Paragraph::new(app.task().description.clone())
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT)),
        );
    frame.render_widget(paragraph, area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let feedback = app
        .session
        .last_feedback()
        .map(format_feedback)
        .unwrap_or_else(|| "Last note: --".to_string());
    let feedback_color = match app.session.last_feedback().map(|f| f.kind) {
        Some(FeedbackKind::Correct) => CORRECT_COLOR,
        Some(FeedbackKind::Expected(_)) => WRONG_COLOR,
        _ => DIM,
    };

    let mut text = vec![
        Line::from(vec![
            Span::raw(app.progress_text()),
            Span::raw("    "),
            Span::raw(app.accuracy_text()),
        ]),
        Line::from(app.metronome_text()),
        Line::from(Span::styled(feedback, Style::default().fg(feedback_color))),
    ];
    if let Some(ref message) = app.message {
        text.push(Line::from(Span::styled(
            message.as_str(),
            Style::default().fg(ACCENT),
        )));
    }

    let paragraph = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ACCENT)),
    );
    frame.render_widget(paragraph, area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let keys = match app.view {
        View::Main => {
            "[\u{2191}\u{2193}] task  [Enter] start  [Space] stop  [r]eset  [c]omplete  [z/x] octave  [?] about  [q]uit"
        }
        View::About => "[Esc] close",
    };
    let footer = Paragraph::new(keys)
        .style(Style::default().fg(DIM))
        .alignment(Alignment::Center);
    frame.render_widget(footer, area);
}

fn render_about_overlay(frame: &mut Frame) {
    let area = centered_rect(48, 12, frame.area());
    frame.render_widget(Clear, area);

    let text = vec![
        Line::from(Span::styled(
            "Pianist",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("Version {}", env!("CARGO_PKG_VERSION"))),
        Line::from(""),
        Line::from("Piano practice companion."),
        Line::from("Keys a w s e d f t g y h u j k play one octave."),
        Line::from(vec![
            Span::styled("RH", Style::default().fg(RIGHT_HAND_COLOR)),
            Span::raw(" / "),
            Span::styled("LH", Style::default().fg(LEFT_HAND_COLOR)),
            Span::raw(" finger numbers on the keyboard."),
        ]),
        Line::from(""),
        Line::from(Span::styled("[Esc] close", Style::default().fg(DIM))),
    ];

    let block = Block::default()
        .title(" About ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));

    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(paragraph, area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use crate::catalog::Catalog;
    use crate::progress::ProgressStore;

    fn screen_text(app: &mut App) -> String {
        let backend = TestBackend::new(120, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_diagram_falls_back_to_notes_then_middle_octave() {
        let mut task = PracticeTask::new("Plain", vec![48, 50]);
        let diagram = diagram_for(&task).unwrap();
        assert_eq!(diagram.keyboard.range.start, 48);
        assert!(diagram.markers.is_empty());

        task.expected_notes.clear();
        let diagram = diagram_for(&task).unwrap();
        assert_eq!(diagram.keyboard.range.start, 60);
        assert_eq!(diagram.keyboard.range.end, 71);
    }

    #[test]
    fn test_render_main_screen() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::builtin().unwrap();
        let mut app = App::new(catalog, ProgressStore::in_dir(dir.path()), None, false);
        app.start();
        app.play(61);

        let text = screen_text(&mut app);
        assert!(text.contains("Pianist"));
        assert!(text.contains("Warmup: 5-finger C position"));
        assert!(text.contains("Progress: 1 / 9"));
        assert!(text.contains("Last note: C#4 (expected C4)"));
        assert!(app.visible_rows > 0);
    }

    #[test]
    fn test_render_about_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::builtin().unwrap();
        let mut app = App::new(catalog, ProgressStore::in_dir(dir.path()), None, false);
        app.view = View::About;
        let text = screen_text(&mut app);
        assert!(text.contains("Piano practice companion."));
    }
}
