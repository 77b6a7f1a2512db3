use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pianist::catalog::Catalog;
use pianist::format;
use pianist::models::PracticeTask;
use pianist::progress::ProgressStore;
use pianist::session::{self, PracticeSession};
use pianist::take;

#[derive(Parser)]
#[command(name = "pianist", about = "Piano practice companion")]
struct Cli {
    /// Task name, 1-based number, or a unique part of the name
    task: Option<String>,

    /// List the practice plan
    #[arg(long)]
    list: bool,

    /// Show a task's notes and fingering
    #[arg(long)]
    show: bool,

    /// Evaluate a recorded take ("<time_ms> <note>" per line), or "-" for STDIN
    #[arg(long, value_name = "FILE")]
    take: Option<String>,

    /// Output take results as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Launch interactive TUI
    #[arg(long)]
    tui: bool,

    /// Load the practice plan from a JSON file instead of the built-in one
    #[arg(long, value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// Directory holding progress.json (default: platform data directory)
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Show recorded progress for every task
    #[arg(long)]
    progress: bool,

    /// Do not record verdicts
    #[arg(long)]
    no_record: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_catalog(path: Option<&PathBuf>) -> Result<Catalog> {
    match path {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("Failed to load catalog: {}", path.display())),
        None => Catalog::builtin().context("Built-in catalog is invalid"),
    }
}

fn run_take(task: &PracticeTask, source: &str, store: Option<&ProgressStore>, json: bool) -> Result<()> {
    if !task.is_evaluated() {
        anyhow::bail!("'{}' has no notes to evaluate", task.name);
    }
    let events =
        take::read_take(source).with_context(|| format!("Failed to read take: {}", source))?;
    if events.is_empty() {
        anyhow::bail!("Take '{}' contains no notes", source);
    }

    let mut session = PracticeSession::new(task.clone());
    session.start(events[0].time_ms);
    let outcome = session::drive(&mut session, session::spawn_feed(events))
        .context("Take produced no result")?;

    if json {
        println!(
            "{}",
            format::format_outcome_json(task, &outcome).context("Failed to serialize result")?
        );
    } else {
        println!("{}", format::format_outcome_table(task, &outcome));
    }

    if let Some(store) = store {
        if let Err(e) = store.record_completion(&task.name, outcome.verdict, Utc::now()) {
            eprintln!("Warning: failed to save progress: {}", e);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    if cli.take.is_some() && cli.tui {
        anyhow::bail!("--take and --tui cannot be used together");
    }
    if cli.take.is_some() && cli.task.is_none() {
        anyhow::bail!("--take requires a TASK");
    }
    if cli.show && cli.task.is_none() {
        anyhow::bail!("--show requires a TASK");
    }

    let catalog = load_catalog(cli.catalog.as_ref())?;
    let data_dir = cli.data_dir.clone().unwrap_or_else(ProgressStore::default_dir);
    let store = ProgressStore::in_dir(&data_dir);

    let task = match cli.task.as_deref() {
        Some(query) => Some(catalog.find(query)?),
        None => None,
    };

    if cli.tui {
        let initial = task.and_then(|t| catalog.number_of(&t.name)).map(|n| n - 1);
        return pianist::tui::run(catalog, store, initial, !cli.no_record);
    }

    if let Some(source) = cli.take.as_deref() {
        if let Some(task) = task {
            let store = (!cli.no_record).then_some(&store);
            return run_take(task, source, store, cli.json);
        }
    }

    if cli.progress {
        println!("{}", format::format_progress_table(&catalog, &store.load()));
        return Ok(());
    }

    match task {
        Some(task) if !cli.list => {
            let snapshot = store.load();
            println!(
                "{}",
                format::format_task_detail(task, catalog.number_of(&task.name), snapshot.get(&task.name))
            );
        }
        _ => {
            println!("{}", format::format_toc(&catalog, &store.load()));
        }
    }

    Ok(())
}
