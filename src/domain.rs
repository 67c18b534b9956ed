use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;
use std::io::Error;
use thiserror::Error;

pub const TITLE: &str = "Near-Earth Object Overview";

pub const HELP_TEXT: &str = "\
Navigation
  ←↓↑→ / hjkl   move cursor
  PgUp / PgDn   move one page
  Home / End    first / last row
  0 / $         first / last column

Sort, filter, group
  s             cycle sort on column (none → asc → desc)
  f             filter column (empty input removes the filter)
  c             clear filters and sorters
  g             group rows by column (orbit class)
  Enter         expand / collapse group

Filter input
  text          contains, =x equals, !=x not equal,
                !x not contains, ^x starts with, x$ ends with
  number/date   =, !=, <, <=, >, >=, a..b (exclusive range)
  flag          yes / no
  any           (blank), (notblank)

Clipboard
  v             start / stop range selection
  y             copy selection with headers

  ?             this help
  Esc           close popup / cancel selection
  q             quit";

#[derive(Debug, Error)]
pub enum NeoError {
    #[error("IO error: {0}")]
    IoError(#[from] Error),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Invalid JSON dataset: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Loading failed: {0}")]
    LoadingFailed(String),
    #[error("File not found")]
    FileNotFound,
    #[error("Permission denied")]
    PermissionDenied,
    #[error("Unknown file type")]
    UnknownFileType,
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct NeoConfig {
    pub event_poll_time: u64,
    pub max_column_width: usize,
    #[setters(into)]
    pub title: String,
    pub group_by_orbit_class: bool,
}

impl Default for NeoConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            max_column_width: 24,
            title: TITLE.to_string(),
            group_by_orbit_class: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CMDMode {
    Filter,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    MoveToFirstColumn,
    MoveToLastColumn,
    Resize(usize, usize),
    CycleSort,
    Filter,
    ClearFiltersAndSort,
    ToggleGroup,
    Enter,
    ToggleSelection,
    CopySelection,
    Help,
    Exit,
    RawKey(KeyEvent),
}
