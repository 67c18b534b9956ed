use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{
        Block, Cell, Clear, Paragraph, Row, Scrollbar, ScrollbarOrientation, ScrollbarState,
        Table, Wrap,
    },
};

use crate::domain::NeoConfig;
use crate::grid::SortDirection;
use crate::model::{HeaderView, Model, RowView, UIData};

pub const TITLE_HEIGHT: usize = 1;
pub const GROUP_PANEL_HEIGHT: usize = 1;
pub const TABLE_HEADER_HEIGHT: usize = 1;
pub const CMDLINE_HEIGHT: usize = 1;
pub const SCROLLBAR_WIDTH: usize = 1;
pub const COLUMN_WIDTH_MARGIN: usize = 1;
/// Room for " ↑*" behind a header label.
pub const SORT_INDICATOR_WIDTH: usize = 3;

const STATUS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct TableUI {
    clear_hint: String,
}

impl TableUI {
    pub fn new(_config: &NeoConfig) -> Self {
        Self {
            clear_hint: " [c] Clear Filters and Sorters  [?] Help ".to_string(),
        }
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();
        let [title_area, group_area, table_area, status_area] = Layout::vertical([
            Constraint::Length(TITLE_HEIGHT as u16),
            Constraint::Length(GROUP_PANEL_HEIGHT as u16),
            Constraint::Min(0),
            Constraint::Length(CMDLINE_HEIGHT as u16),
        ])
        .areas(frame.area());

        self.render_title(uidata, frame, title_area);
        Self::render_group_panel(uidata, frame, group_area);
        Self::render_table(uidata, frame, table_area);
        Self::render_statusline(uidata, frame, status_area);

        if uidata.show_popup {
            Self::render_popup(&uidata.popup_message, frame);
        }
    }

    fn render_title(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let [left, right] = Layout::horizontal([
            Constraint::Min(0),
            Constraint::Length(self.clear_hint.chars().count() as u16),
        ])
        .areas(area);

        let title = Line::from(vec![
            Span::from(format!(" {} ", uidata.title)).bold(),
            Span::from(format!("[{}]", uidata.name)).dark_gray(),
        ]);
        frame.render_widget(Paragraph::new(title), left);
        frame.render_widget(
            Paragraph::new(Line::from(self.clear_hint.as_str()).right_aligned()).reversed(),
            right,
        );
    }

    fn render_group_panel(uidata: &UIData, frame: &mut Frame, area: Rect) {
        let style = Style::new().fg(Color::Cyan);
        let panel = Line::from(vec![
            Span::styled(format!(" {} ", uidata.group_panel), style),
            Span::from("(g to toggle)").dark_gray(),
        ]);
        frame.render_widget(Paragraph::new(panel), area);
    }

    fn header_label(header: &HeaderView) -> String {
        let indicator = match (header.sort, header.sortable) {
            (Some(SortDirection::Ascending), _) => " ↑",
            (Some(SortDirection::Descending), _) => " ↓",
            (None, true) => " ⇅",
            (None, false) => "",
        };
        let filter_mark = if header.filtered { "*" } else { "" };
        format!("{}{}{}", header.label, indicator, filter_mark)
    }

    fn render_table(uidata: &UIData, frame: &mut Frame, area: Rect) {
        let [table_area, scrollbar_area] = Layout::horizontal([
            Constraint::Min(0),
            Constraint::Length(SCROLLBAR_WIDTH as u16),
        ])
        .areas(area);

        let header = Row::new(uidata.headers.iter().map(|h| {
            let mut style = Style::new().add_modifier(Modifier::BOLD);
            if h.sort.is_some() || h.filtered {
                style = style.fg(Color::Yellow);
            }
            if h.grouped {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            Cell::from(Self::header_label(h)).style(style)
        }))
        .style(Style::new().bg(Color::DarkGray));

        let rows = uidata.rows.iter().enumerate().map(|(ridx, row)| {
            let abs_row = uidata.offset_row + ridx;
            let is_cursor_row = ridx == uidata.selected_row;
            match row {
                RowView::Group { label, expanded } => {
                    let marker = if *expanded { "▾" } else { "▸" };
                    let mut style = Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);
                    if is_cursor_row {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    Row::new(vec![Cell::from(format!("{marker} {label}"))]).style(style)
                }
                RowView::Cells(cells) => Row::new(cells.iter().enumerate().map(|(cidx, value)| {
                    let abs_column = uidata.visible_columns.get(cidx).copied().unwrap_or(0);
                    let mut style = Style::new();
                    if Self::in_selection(uidata, abs_row, abs_column) {
                        style = style.bg(Color::Blue);
                    }
                    if is_cursor_row && cidx == uidata.selected_column {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    Cell::from(value.as_str()).style(style)
                }))
                .style(if is_cursor_row {
                    Style::new().add_modifier(Modifier::BOLD)
                } else {
                    Style::new()
                }),
            }
        });

        let widths: Vec<Constraint> = uidata
            .headers
            .iter()
            .map(|h| Constraint::Length(h.width as u16))
            .collect();

        let table = Table::new(rows, widths).header(header).column_spacing(1);
        frame.render_widget(table, table_area);

        let mut scrollbar_state =
            ScrollbarState::new(uidata.nrows).position(uidata.abs_selected_row);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            scrollbar_area,
            &mut scrollbar_state,
        );
    }

    fn in_selection(uidata: &UIData, row: usize, column: usize) -> bool {
        uidata.selection.is_some_and(|((r0, r1), (c0, c1))| {
            (r0..=r1).contains(&row) && (c0..=c1).contains(&column)
        })
    }

    fn render_statusline(uidata: &UIData, frame: &mut Frame, area: Rect) {
        if uidata.active_cmdinput {
            let prompt = format!("{}: ", uidata.cmdinput.prompt);
            let line = Line::from(vec![
                Span::from(prompt.clone()).bold(),
                Span::from(uidata.cmdinput.input.as_str()),
            ]);
            frame.render_widget(Paragraph::new(line), area);
            let x = area.x + (prompt.chars().count() + uidata.cmdinput.cursor_pos) as u16;
            frame.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y));
            return;
        }

        let position = format!(
            " {}/{} rows | {} records | {} filters ",
            (uidata.abs_selected_row + 1).min(uidata.nrows),
            uidata.nrows,
            uidata.nrecords,
            uidata.nfilters
        );
        let [left, right] = Layout::horizontal([
            Constraint::Min(0),
            Constraint::Length(position.chars().count() as u16),
        ])
        .areas(area);

        if uidata.last_status_message_update.elapsed() < STATUS_MESSAGE_TIMEOUT {
            frame.render_widget(
                Paragraph::new(format!(" {}", uidata.status_message)).yellow(),
                left,
            );
        }
        frame.render_widget(
            Paragraph::new(Line::from(position).right_aligned()).dark_gray(),
            right,
        );
    }

    fn render_popup(message: &str, frame: &mut Frame) {
        let area = Self::popup_area(frame.area(), 60, 80);
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(message)
                .wrap(Wrap { trim: false })
                .block(Block::bordered().title(" Help (Esc to close) ")),
            area,
        );
    }

    fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
        let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
        let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
        let [area] = vertical.areas(area);
        let [area] = horizontal.areas(area);
        area
    }
}
