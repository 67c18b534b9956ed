use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use rayon::prelude::*;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::columns::{ColumnSpec, column_index, neo_columns};
use crate::dataset::{Dataset, Field};
use crate::domain::{CMDMode, HELP_TEXT, Message, NeoConfig, NeoError};
use crate::filter::FilterCondition;
use crate::grid::{GridRow, GridState, SortDirection};
use crate::inputter::{InputResult, Inputter};
use crate::ui::{
    CMDLINE_HEIGHT, COLUMN_WIDTH_MARGIN, GROUP_PANEL_HEIGHT, SCROLLBAR_WIDTH, SORT_INDICATOR_WIDTH,
    TABLE_HEADER_HEIGHT, TITLE_HEIGHT,
};

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    POPUP,
    CMDINPUT,
}

#[derive(Clone, Debug)]
pub struct HeaderView {
    pub label: String,
    pub width: usize,
    pub sortable: bool,
    pub sort: Option<SortDirection>,
    pub filtered: bool,
    pub grouped: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RowView {
    Group { label: String, expanded: bool },
    Cells(Vec<String>),
}

/// Everything the UI needs to draw one frame.
pub struct UIData {
    pub title: String,
    pub name: String,
    pub headers: Vec<HeaderView>,
    pub rows: Vec<RowView>,
    pub visible_columns: Vec<usize>, // Absolute column index of each header
    pub offset_row: usize,
    pub nrows: usize, // Rows after filtering and grouping
    pub nrecords: usize,
    pub nfilters: usize,
    pub selected_row: usize,
    pub selected_column: usize,
    pub abs_selected_row: usize,
    // ((row0, row1), (col0, col1)), absolute and inclusive
    pub selection: Option<((usize, usize), (usize, usize))>,
    pub group_panel: String,
    pub show_popup: bool,
    pub popup_message: String,
    pub cmdinput: InputResult,
    pub active_cmdinput: bool,
    pub status_message: String,
    pub last_status_message_update: Instant,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            title: String::new(),
            name: String::new(),
            headers: Vec::new(),
            rows: Vec::new(),
            visible_columns: Vec::new(),
            offset_row: 0,
            nrows: 0,
            nrecords: 0,
            nfilters: 0,
            selected_row: 0,
            selected_column: 0,
            abs_selected_row: 0,
            selection: None,
            group_panel: String::new(),
            show_popup: false,
            popup_message: String::new(),
            cmdinput: InputResult::default(),
            active_cmdinput: false,
            status_message: String::new(),
            last_status_message_update: Instant::now(),
        }
    }
}

#[derive(Default, Clone, Debug)]
pub struct UILayout {
    pub width: usize,
    pub height: usize,
    pub table_width: usize,
    pub table_height: usize,
}

impl UILayout {
    pub fn from_values(ui_width: usize, ui_height: usize) -> Self {
        let layout = UILayout {
            width: ui_width,
            height: ui_height,
            table_width: ui_width.saturating_sub(SCROLLBAR_WIDTH),
            table_height: ui_height.saturating_sub(
                TITLE_HEIGHT + GROUP_PANEL_HEIGHT + TABLE_HEADER_HEIGHT + CMDLINE_HEIGHT,
            ),
        };
        trace!("Build UILayout: {:?}", layout);
        layout
    }
}

pub struct Model {
    config: NeoConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    dataset: Dataset,
    columns: Vec<ColumnSpec>,
    widths: Vec<usize>,
    grid: GridState,
    rows: Vec<GridRow>,
    filter_inputs: HashMap<usize, String>,
    visible_columns: Vec<usize>,
    cursor_row: usize,    // Index into rows
    cursor_column: usize, // Index into columns
    offset_row: usize,
    offset_column: usize,
    selection_anchor: Option<(usize, usize)>,
    uilayout: UILayout,
    uidata: UIData,
    input: Inputter,
    cmd_mode: Option<CMDMode>,
    filter_column: usize,
    last_input: InputResult,
    active_cmdinput: bool,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn init(
        config: &NeoConfig,
        dataset: Dataset,
        ui_width: usize,
        ui_height: usize,
    ) -> Result<Self, NeoError> {
        let columns = neo_columns();
        let start_time = Instant::now();
        let widths = Self::column_widths(&columns, &dataset, config.max_column_width);
        debug!(
            "Column widths {:?} took {}ms",
            widths,
            start_time.elapsed().as_millis()
        );

        let mut model = Self {
            config: config.clone(),
            status: Status::READY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            dataset,
            columns,
            widths,
            grid: GridState::default(),
            rows: Vec::new(),
            filter_inputs: HashMap::new(),
            visible_columns: Vec::new(),
            cursor_row: 0,
            cursor_column: 0,
            offset_row: 0,
            offset_column: 0,
            selection_anchor: None,
            uilayout: UILayout::from_values(ui_width, ui_height),
            uidata: UIData::empty(),
            input: Inputter::default(),
            cmd_mode: None,
            filter_column: 0,
            last_input: InputResult::default(),
            active_cmdinput: false,
            status_message: String::new(),
            last_status_message_update: Instant::now(),
        };

        if config.group_by_orbit_class {
            let oc = column_index(&model.columns, Field::OrbitClass);
            model.grid.set_group_by(oc, &model.columns);
        }
        model.refresh_rows();
        model.set_status_message(format!(
            "Loaded {} records from {}",
            model.dataset.len(),
            model.dataset.name()
        ));
        info!("Model ready with {} records", model.dataset.len());
        Ok(model)
    }

    // Widths are measured once over the whole dataset, one rayon task per column.
    fn column_widths(
        columns: &[ColumnSpec],
        dataset: &Dataset,
        max_column_width: usize,
    ) -> Vec<usize> {
        columns
            .par_iter()
            .map(|spec| {
                let content = dataset
                    .records()
                    .iter()
                    .map(|r| spec.display(r).chars().count())
                    .max()
                    .unwrap_or(0);
                let header = spec.header.chars().count() + SORT_INDICATOR_WIDTH;
                std::cmp::min(std::cmp::max(header, content), max_column_width)
                    + COLUMN_WIDTH_MARGIN
            })
            .collect()
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn raw_keyevents(&self) -> bool {
        self.active_cmdinput
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), NeoError> {
        if let Some(msg) = message {
            match self.modus {
                Modus::TABLE => match msg {
                    Message::Quit => self.quit(),
                    Message::MoveDown => self.move_down(1),
                    Message::MoveUp => self.move_up(1),
                    Message::MoveLeft => self.move_left(),
                    Message::MoveRight => self.move_right(),
                    Message::MovePageUp => self.move_up(self.uilayout.table_height.max(1)),
                    Message::MovePageDown => self.move_down(self.uilayout.table_height.max(1)),
                    Message::MoveBeginning => self.move_to_row(0),
                    Message::MoveEnd => self.move_to_row(self.rows.len().saturating_sub(1)),
                    Message::MoveToFirstColumn => self.move_to_column(0),
                    Message::MoveToLastColumn => {
                        self.move_to_column(self.columns.len().saturating_sub(1))
                    }
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    Message::CycleSort => self.cycle_sort(),
                    Message::Filter => self.enter_filter_mode(),
                    Message::ClearFiltersAndSort => self.clear_filters_and_sort(),
                    Message::ToggleGroup => self.toggle_group(),
                    Message::Enter => self.enter(),
                    Message::ToggleSelection => self.toggle_selection(),
                    Message::CopySelection => self.copy_selection(),
                    Message::Help => self.show_help(),
                    Message::Exit => self.exit(),
                    Message::RawKey(_) => (),
                },
                Modus::POPUP => match msg {
                    Message::Quit => self.quit(),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    Message::Exit | Message::Help | Message::Enter => self.exit(),
                    _ => (),
                },
                Modus::CMDINPUT => match msg {
                    Message::RawKey(key) => self.raw_input(key),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    _ => (),
                },
            }
        }
        Ok(())
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
        self.uidata.status_message = self.status_message.clone();
        self.uidata.last_status_message_update = self.last_status_message_update;
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.uilayout.width, width, self.uilayout.height, height
        );
        self.uilayout = UILayout::from_values(width, height);
        self.update_table_data();
    }

    // -------------------- Grid state ---------------------- //

    /// Re-runs filter, sort and grouping and keeps the cursor inside the result.
    fn refresh_rows(&mut self) {
        let start_time = Instant::now();
        self.rows = self.grid.project(self.dataset.records(), &self.columns);
        trace!(
            "Projected {} rows in {}ms",
            self.rows.len(),
            start_time.elapsed().as_millis()
        );

        let last_row = self.rows.len().saturating_sub(1);
        self.cursor_row = self.cursor_row.min(last_row);
        if let Some((row, column)) = self.selection_anchor {
            self.selection_anchor = Some((row.min(last_row), column));
        }
        self.update_table_data();
    }

    fn cycle_sort(&mut self) {
        let column = self.cursor_column;
        let header = self.columns[column].header;
        if !self.columns[column].sortable {
            self.set_status_message(format!("{header} can't be sorted"));
            return;
        }
        let message = match self.grid.cycle_sort(column) {
            Some(SortDirection::Ascending) => format!("Sorted by {header} ascending"),
            Some(SortDirection::Descending) => format!("Sorted by {header} descending"),
            None => "Sort cleared".to_string(),
        };
        self.refresh_rows();
        self.set_status_message(message);
    }

    fn clear_filters_and_sort(&mut self) {
        self.grid.clear_filters_and_sort();
        self.filter_inputs.clear();
        self.refresh_rows();
        info!("Cleared filters and sorters");
        self.set_status_message("Cleared filters and sorters");
    }

    fn toggle_group(&mut self) {
        // Group by the current column if it can, otherwise by the first column that can.
        let target = if self.columns[self.cursor_column].groupable {
            Some(self.cursor_column)
        } else {
            self.columns.iter().position(|c| c.groupable)
        };
        let Some(target) = target else {
            self.set_status_message("No column can group rows");
            return;
        };

        let header = self.columns[target].header;
        let message = if self.grid.group_by() == Some(target) {
            self.grid.set_group_by(None, &self.columns);
            "Removed row grouping".to_string()
        } else if self.grid.set_group_by(Some(target), &self.columns) {
            format!("Grouped rows by {header}")
        } else {
            format!("{header} can't group rows")
        };
        self.cursor_row = 0;
        self.offset_row = 0;
        self.selection_anchor = None;
        self.refresh_rows();
        self.set_status_message(message);
    }

    fn enter(&mut self) {
        if let Some(GridRow::Group { key, .. }) = self.rows.get(self.cursor_row) {
            let key = key.clone();
            let expanded = self.grid.toggle_group_expanded(&key);
            trace!("Group {key} expanded: {expanded}");
            self.refresh_rows();
        }
    }

    // -------------------- Command input ---------------------- //

    fn enter_filter_mode(&mut self) {
        trace!("Entering filter input ...");
        let spec = &self.columns[self.cursor_column];
        let prompt = format!("Filter {} ({:?})", spec.header, spec.filter);
        let initial = self
            .filter_inputs
            .get(&self.cursor_column)
            .cloned()
            .unwrap_or_default();

        self.filter_column = self.cursor_column;
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.cmd_mode = Some(CMDMode::Filter);
        self.active_cmdinput = true;
        self.input.start(&prompt, &initial);
        self.last_input = self.input.get();

        self.uidata.cmdinput = self.last_input.clone();
        self.uidata.active_cmdinput = self.active_cmdinput;
    }

    fn raw_input(&mut self, key: KeyEvent) {
        if self.active_cmdinput {
            self.last_input = self.input.read(key);
            if self.last_input.finished {
                self.handle_cmd_input();
            }
            self.uidata.cmdinput = self.last_input.clone();
            self.uidata.active_cmdinput = self.active_cmdinput;
        }
    }

    fn handle_cmd_input(&mut self) {
        trace!("Handle cmd input {:?}", self.last_input);
        self.active_cmdinput = false;
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CMDINPUT;

        match self.cmd_mode.take() {
            Some(CMDMode::Filter) if self.last_input.canceled => {
                self.set_status_message("Filter unchanged");
            }
            Some(CMDMode::Filter) => {
                let input = self.last_input.input.clone();
                self.apply_filter(self.filter_column, &input);
            }
            None => info!("Cmd mode is none!"),
        }
    }

    fn apply_filter(&mut self, column: usize, input: &str) {
        let spec = &self.columns[column];
        let header = spec.header;
        match FilterCondition::parse(spec.filter, input) {
            Ok(Some(condition)) => {
                let message = format!("{header} {condition}");
                self.grid.set_filter(column, Some(condition));
                self.filter_inputs.insert(column, input.trim().to_string());
                self.refresh_rows();
                self.set_status_message(format!("{message}: {} rows", self.rows.len()));
            }
            Ok(None) => {
                self.grid.set_filter(column, None);
                self.filter_inputs.remove(&column);
                self.refresh_rows();
                self.set_status_message(format!("Removed filter on {header}"));
            }
            Err(e) => {
                debug!("Rejected filter {input:?} on {header}: {e}");
                self.set_status_message(format!("Invalid filter for {header}: {e}"));
            }
        }
    }

    // -------------------- Popup ---------------------- //

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.uidata.popup_message = HELP_TEXT.to_string();
        self.uidata.show_popup = true;
    }

    fn exit(&mut self) {
        match self.modus {
            Modus::TABLE => {
                if self.selection_anchor.take().is_some() {
                    self.set_status_message("Selection canceled");
                    self.update_table_data();
                }
            }
            Modus::POPUP => {
                trace!("Close popup ...");
                self.modus = self.previous_modus;
                self.previous_modus = Modus::POPUP;
                self.uidata.show_popup = false;
            }
            Modus::CMDINPUT => {}
        }
    }

    // -------------------- Clipboard ---------------------- //

    fn toggle_selection(&mut self) {
        self.selection_anchor = match self.selection_anchor {
            Some(_) => None,
            None => Some((self.cursor_row, self.cursor_column)),
        };
        let message = if self.selection_anchor.is_some() {
            "Selecting range, press y to copy"
        } else {
            "Selection canceled"
        };
        self.set_status_message(message);
        self.update_table_data();
    }

    /// Selected range as ((row0, row1), (col0, col1)), inclusive. Falls back to the cursor cell.
    fn selection_range(&self) -> ((usize, usize), (usize, usize)) {
        let (arow, acol) = self
            .selection_anchor
            .unwrap_or((self.cursor_row, self.cursor_column));
        (
            (arow.min(self.cursor_row), arow.max(self.cursor_row)),
            (acol.min(self.cursor_column), acol.max(self.cursor_column)),
        )
    }

    fn selection_row_count(&self) -> usize {
        let ((row0, row1), _) = self.selection_range();
        row1 - row0 + 1
    }

    /// Tab separated copy of the selected range, header labels first.
    fn selection_text(&self) -> String {
        let ((row0, row1), (col0, col1)) = self.selection_range();
        let specs = &self.columns[col0..=col1];

        let mut lines = Vec::with_capacity(row1 - row0 + 2);
        lines.push(specs.iter().map(|c| c.header).collect::<Vec<_>>().join("\t"));
        for row in self.rows.iter().take(row1 + 1).skip(row0) {
            let cells: Vec<String> = match row {
                GridRow::Record(idx) => {
                    let record = &self.dataset.records()[*idx];
                    specs.iter().map(|c| c.display(record)).collect()
                }
                GridRow::Group { key, count, .. } => {
                    let mut cells = vec![String::new(); specs.len()];
                    cells[0] = format!("{key} ({count})");
                    cells
                }
            };
            lines.push(cells.join("\t"));
        }
        lines.join("\n")
    }

    fn copy_selection(&mut self) {
        if self.rows.is_empty() {
            self.set_status_message("Nothing to copy");
            return;
        }
        let text = self.selection_text();
        let nlines = self.selection_row_count();

        let result = Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text));
        match result {
            Ok(_) => {
                trace!("Copied {nlines} rows to clipboard.");
                self.selection_anchor = None;
                self.set_status_message(format!("Copied {nlines} rows with headers"));
                self.update_table_data();
            }
            Err(e) => {
                warn!("Error copying to clipboard: {:?}", e);
                self.set_status_message(format!("Failed to copy to clipboard: {e}"));
            }
        }
    }

    // -------------------- Navigation ---------------------- //

    fn move_to_row(&mut self, row: usize) {
        self.cursor_row = row.min(self.rows.len().saturating_sub(1));
        self.update_table_data();
    }

    fn move_up(&mut self, size: usize) {
        self.move_to_row(self.cursor_row.saturating_sub(size));
    }

    fn move_down(&mut self, size: usize) {
        self.move_to_row(self.cursor_row.saturating_add(size));
    }

    fn move_to_column(&mut self, column: usize) {
        self.cursor_column = column.min(self.columns.len().saturating_sub(1));
        self.update_table_data();
    }

    fn move_left(&mut self) {
        self.move_to_column(self.cursor_column.saturating_sub(1));
    }

    fn move_right(&mut self) {
        self.move_to_column(self.cursor_column + 1);
    }

    // -------------------- View projection ---------------------- //

    fn fit_columns(&self, offset: usize) -> Vec<usize> {
        let mut used = 0;
        let mut visible = Vec::new();
        for cidx in offset..self.columns.len() {
            let width = self.widths[cidx] + 1; // 1 spacer character
            if !visible.is_empty() && used + width > self.uilayout.table_width {
                break;
            }
            visible.push(cidx);
            used += width;
        }
        visible
    }

    fn layout_columns(&mut self) {
        if self.cursor_column < self.offset_column {
            self.offset_column = self.cursor_column;
        }
        let mut visible = self.fit_columns(self.offset_column);
        while !visible.contains(&self.cursor_column) && self.offset_column < self.cursor_column {
            self.offset_column += 1;
            visible = self.fit_columns(self.offset_column);
        }
        self.visible_columns = visible;
    }

    fn layout_rows(&mut self) {
        let height = self.uilayout.table_height.max(1);
        if self.cursor_row < self.offset_row {
            self.offset_row = self.cursor_row;
        } else if self.cursor_row >= self.offset_row + height {
            self.offset_row = self.cursor_row + 1 - height;
        }
        self.offset_row = self.offset_row.min(self.rows.len().saturating_sub(1));
    }

    fn update_table_data(&mut self) {
        self.layout_columns();
        self.layout_rows();

        let rbegin = self.offset_row;
        let rend = std::cmp::min(rbegin + self.uilayout.table_height, self.rows.len());
        trace!(
            "Table: Cr {}, Cc {}, Or {}, Oc {}, Rb {}, Re {}, tw: {}, th: {}",
            self.cursor_row,
            self.cursor_column,
            self.offset_row,
            self.offset_column,
            rbegin,
            rend,
            self.uilayout.table_width,
            self.uilayout.table_height,
        );

        let group_by = self.grid.group_by();
        let headers = self
            .visible_columns
            .iter()
            .map(|&cidx| {
                let spec = &self.columns[cidx];
                HeaderView {
                    label: spec.header.to_string(),
                    width: self.widths[cidx],
                    sortable: spec.sortable,
                    sort: self.grid.sort_direction(cidx),
                    filtered: self.grid.filters().is_filtered(cidx),
                    grouped: group_by == Some(cidx),
                }
            })
            .collect();

        let records = self.dataset.records();
        let rows = self.rows[rbegin..rend]
            .iter()
            .map(|row| match row {
                GridRow::Record(idx) => RowView::Cells(
                    self.visible_columns
                        .iter()
                        .map(|&cidx| self.columns[cidx].display(&records[*idx]))
                        .collect(),
                ),
                GridRow::Group { key, count, expanded } => RowView::Group {
                    label: format!("{key} ({count})"),
                    expanded: *expanded,
                },
            })
            .collect();

        let group_panel = match group_by {
            Some(cidx) => format!("Row groups: {}", self.columns[cidx].header),
            None => "Row groups: none".to_string(),
        };

        self.uidata = UIData {
            title: self.config.title.clone(),
            name: self.dataset.name().to_string(),
            headers,
            rows,
            visible_columns: self.visible_columns.clone(),
            offset_row: self.offset_row,
            nrows: self.rows.len(),
            nrecords: self.dataset.len(),
            nfilters: self.grid.filters().len(),
            selected_row: self.cursor_row - self.offset_row.min(self.cursor_row),
            selected_column: self
                .visible_columns
                .iter()
                .position(|&c| c == self.cursor_column)
                .unwrap_or(0),
            abs_selected_row: self.cursor_row,
            selection: self.selection_anchor.map(|_| self.selection_range()),
            group_panel,
            show_popup: self.uidata.show_popup,
            popup_message: self.uidata.popup_message.clone(),
            cmdinput: self.last_input.clone(),
            active_cmdinput: self.active_cmdinput,
            status_message: self.status_message.clone(),
            last_status_message_update: self.last_status_message_update,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Record;
    use ratatui::crossterm::event::KeyCode;

    fn record(designation: &str, discovery_date: &str, h_mag: &str, orbit_class: &str) -> Record {
        Record {
            designation: Some(designation.into()),
            discovery_date: Some(discovery_date.into()),
            h_mag: Some(h_mag.into()),
            pha: Some("N".into()),
            orbit_class: Some(orbit_class.into()),
            ..Default::default()
        }
    }

    fn model() -> Model {
        let dataset = Dataset::new(
            "test",
            vec![
                record("(2010 AB)", "2010-01-04", "18.3", "Apollo"),
                record("(2011 CD)", "", "", "Amor"),
                record("(2020 EF)", "2020-05-01", "5.1", "Apollo"),
            ],
        );
        Model::init(&NeoConfig::default(), dataset, 200, 40).unwrap()
    }

    fn column(model: &Model, field: Field) -> usize {
        column_index(&model.columns, field).unwrap()
    }

    fn cells(model: &Model, field: Field) -> Vec<String> {
        let pos = model
            .uidata
            .visible_columns
            .iter()
            .position(|&c| c == column(model, field))
            .unwrap();
        model
            .uidata
            .rows
            .iter()
            .filter_map(|r| match r {
                RowView::Cells(cells) => Some(cells[pos].clone()),
                RowView::Group { .. } => None,
            })
            .collect()
    }

    fn send(model: &mut Model, msg: Message) {
        model.update(Some(msg)).unwrap();
    }

    fn type_filter(model: &mut Model, text: &str) {
        send(model, Message::Filter);
        assert!(model.raw_keyevents());
        for c in text.chars() {
            send(model, Message::RawKey(KeyEvent::from(KeyCode::Char(c))));
        }
        send(model, Message::RawKey(KeyEvent::from(KeyCode::Enter)));
        assert!(!model.raw_keyevents());
    }

    #[test]
    fn dates_are_formatted() {
        let model = model();
        assert_eq!(
            cells(&model, Field::DiscoveryDate),
            vec!["Jan 4, 2010", "", "May 1, 2020"]
        );
    }

    #[test]
    fn sort_h_mag_puts_absent_first() {
        let mut model = model();
        model.cursor_column = column(&model, Field::HMag);
        send(&mut model, Message::CycleSort);
        assert_eq!(cells(&model, Field::HMag), vec!["", "5.1", "18.3"]);
    }

    #[test]
    fn clear_filters_and_sort_resets_everything() {
        let mut model = model();
        type_filter(&mut model, "2020");
        assert_eq!(cells(&model, Field::Designation), vec!["(2020 EF)"]);

        model.cursor_column = column(&model, Field::HMag);
        send(&mut model, Message::CycleSort);
        let hmag = model.uidata.headers.iter().find(|h| h.label == "H (mag)").unwrap();
        assert_eq!(hmag.sort, Some(SortDirection::Ascending));
        assert!(model.uidata.headers[0].filtered);

        send(&mut model, Message::ClearFiltersAndSort);
        assert_eq!(model.uidata.nrows, 3);
        assert_eq!(model.uidata.nfilters, 0);
        assert!(model.uidata.headers.iter().all(|h| h.sort.is_none() && !h.filtered));
        assert_eq!(cells(&model, Field::HMag), vec!["18.3", "", "5.1"]);
    }

    #[test]
    fn invalid_filter_keeps_state() {
        let mut model = model();
        model.cursor_column = column(&model, Field::HMag);
        type_filter(&mut model, ">abc");
        assert_eq!(model.uidata.nrows, 3);
        assert_eq!(model.uidata.nfilters, 0);
        assert!(model.status_message.starts_with("Invalid filter"));
    }

    #[test]
    fn empty_filter_input_removes_filter() {
        let mut model = model();
        model.cursor_column = column(&model, Field::HMag);
        type_filter(&mut model, ">10");
        assert_eq!(model.uidata.nrows, 1);

        // The previous input is prefilled, erase it
        send(&mut model, Message::Filter);
        for _ in 0..3 {
            send(&mut model, Message::RawKey(KeyEvent::from(KeyCode::Backspace)));
        }
        send(&mut model, Message::RawKey(KeyEvent::from(KeyCode::Enter)));
        assert_eq!(model.uidata.nrows, 3);
        assert_eq!(model.uidata.nfilters, 0);
    }

    #[test]
    fn grouping_by_orbit_class() {
        let mut model = model();
        send(&mut model, Message::ToggleGroup);
        assert_eq!(
            model.uidata.rows,
            vec![
                RowView::Group { label: "Amor (1)".into(), expanded: false },
                RowView::Group { label: "Apollo (2)".into(), expanded: false },
            ]
        );

        send(&mut model, Message::MoveDown);
        send(&mut model, Message::Enter);
        assert_eq!(model.uidata.nrows, 4);
        assert_eq!(cells(&model, Field::Designation), vec!["(2010 AB)", "(2020 EF)"]);

        send(&mut model, Message::ToggleGroup);
        assert_eq!(model.uidata.nrows, 3);
    }

    #[test]
    fn copied_range_has_headers() {
        let mut model = model();
        send(&mut model, Message::ToggleSelection);
        send(&mut model, Message::MoveDown);
        send(&mut model, Message::MoveRight);
        assert_eq!(
            model.selection_text(),
            "Designation\tDiscovery Date\n(2010 AB)\tJan 4, 2010\n(2011 CD)\t"
        );
    }

    #[test]
    fn single_cell_copy_has_header() {
        let mut model = model();
        model.cursor_column = column(&model, Field::Pha);
        assert_eq!(model.selection_text(), "Potentially Hazardous\nNo");
    }

    #[test]
    fn blank_cell_copy_counts_one_row() {
        let mut model = model();
        model.cursor_row = 1;
        model.cursor_column = column(&model, Field::HMag);
        assert_eq!(model.selection_text(), "H (mag)\n");
        assert_eq!(model.selection_row_count(), 1);

        send(&mut model, Message::ToggleSelection);
        send(&mut model, Message::MoveUp);
        assert_eq!(model.selection_text(), "H (mag)\n18.3\n");
        assert_eq!(model.selection_row_count(), 2);
    }

    #[test]
    fn help_popup_opens_and_closes() {
        let mut model = model();
        send(&mut model, Message::Help);
        assert!(model.uidata.show_popup);
        send(&mut model, Message::Quit);
        assert_eq!(model.status, Status::QUITTING);

        let mut model = self::model();
        send(&mut model, Message::Help);
        send(&mut model, Message::Exit);
        assert!(!model.uidata.show_popup);
    }

    #[test]
    fn narrow_terminal_scrolls_columns() {
        let mut model = Model::init(&NeoConfig::default(), self::model().dataset, 40, 20).unwrap();
        send(&mut model, Message::MoveToLastColumn);
        let last = model.columns.len() - 1;
        assert!(model.uidata.visible_columns.contains(&last));
        assert!(!model.uidata.visible_columns.contains(&0));
        send(&mut model, Message::MoveToFirstColumn);
        assert_eq!(model.uidata.visible_columns[0], 0);
    }
}
