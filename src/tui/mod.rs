pub mod app;
pub mod ui;

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::catalog::Catalog;
use crate::progress::ProgressStore;

use app::{App, View};

pub fn run(catalog: Catalog, store: ProgressStore, initial: Option<usize>, record: bool) -> Result<()> {
    let mut app = App::new(catalog, store, initial, record);

    // Setup terminal
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match app.view {
                    View::Main => handle_main_key(app, key.code),
                    View::About => {
                        if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
                            app.view = View::Main;
                        }
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_main_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('?') => app.view = View::About,
        KeyCode::Down => app.select_next(),
        KeyCode::Up => app.select_prev(),
        KeyCode::Enter => app.start(),
        KeyCode::Char(' ') => app.stop(),
        KeyCode::Char('r') => app.reset(),
        KeyCode::Char('c') => app.complete_lesson(),
        KeyCode::Char('z') => app.shift_octave(-1),
        KeyCode::Char('x') => app.shift_octave(1),
        KeyCode::Char(c) => {
            if let Some(note) = app.key_note(c) {
                app.play(note);
            }
        }
        _ => {}
    }
}
