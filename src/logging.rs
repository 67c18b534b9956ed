use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::domain::NeoError;

/// Sends all tracing output to `path`. The terminal belongs to the table view.
pub fn init(path: &Path) -> Result<(), NeoError> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let fmt_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_target(true)
        .with_level(true)
        .with_ansi(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| NeoError::Logging(e.to_string()))?;

    tracing::info!("Logging to {}", path.display());
    Ok(())
}
