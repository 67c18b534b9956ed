use clap::Parser;
use ratatui::DefaultTerminal;
use ratatui::crossterm::{execute, terminal::SetTitle};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

mod coercion;
mod columns;
mod compare;
mod controller;
mod dataset;
mod domain;
mod filter;
mod format;
mod grid;
mod inputter;
mod logging;
mod model;
mod ui;

use controller::Controller;
use dataset::Dataset;
use domain::{NeoConfig, NeoError};
use model::{Model, Status};
use ui::TableUI;

/// Overview table of near-Earth asteroids.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Load records from this file instead of the bundled dataset (json, csv, parquet, arrow)
    #[arg(short, long)]
    data: Option<String>,

    /// Start with rows grouped by orbit class
    #[arg(short, long)]
    group_by_orbit_class: bool,

    /// Maximum width of a column in characters
    #[arg(long, default_value_t = 24)]
    max_column_width: usize,

    /// Event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Log file, defaults to neogrid.log in the temp directory
    #[arg(long)]
    log_file: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn expand_path(path: &str) -> Result<PathBuf, NeoError> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.into_owned()))
        .map_err(|e| NeoError::LoadingFailed(e.to_string()))
}

fn run(args: Args) -> Result<(), NeoError> {
    let log_file = match &args.log_file {
        Some(path) => expand_path(path)?,
        None => std::env::temp_dir().join("neogrid.log"),
    };
    logging::init(&log_file)?;

    let config = NeoConfig::default()
        .with_event_poll_time(args.poll_ms)
        .with_max_column_width(args.max_column_width)
        .with_group_by_orbit_class(args.group_by_orbit_class);
    info!("Starting with {config:?}");

    let dataset = match &args.data {
        Some(path) => Dataset::load(expand_path(path)?)?,
        None => Dataset::bundled()?,
    };
    if dataset.is_empty() {
        warn!("Dataset {} has no records", dataset.name());
    }

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &config, dataset);
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    config: &NeoConfig,
    dataset: Dataset,
) -> Result<(), NeoError> {
    execute!(std::io::stdout(), SetTitle(&config.title))?;

    let size = terminal.size()?;
    let mut model = Model::init(config, dataset, size.width as usize, size.height as usize)?;
    let mut ui = TableUI::new(config);
    let controller = Controller::new(config);

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        let message = controller.handle_event(&model)?;
        model.update(message)?;
    }

    info!("Quitting");
    Ok(())
}
