use std::fs::OpenOptions;
use std::io::Write;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;

use crate::config::Config;
use crate::debounce::Debouncer;
use crate::state::TableState;
use crate::theme::{self, Theme};

/// An open info panel: dataset row index plus the info column it shows.
pub type PanelKey = (usize, String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Filtering,
}

/// Screen regions recorded during draw so mouse clicks can be resolved
/// against what is actually on screen.
#[derive(Default, Clone)]
pub struct ClickRegions {
    pub view_tabs: Vec<(Rect, String)>,
    pub header_cells: Vec<(Rect, String)>,
    pub info_cells: Vec<(Rect, PanelKey)>,
    pub panels: Vec<(Rect, PanelKey)>,
}

impl ClickRegions {
    pub fn clear(&mut self) {
        self.view_tabs.clear();
        self.header_cells.clear();
        self.info_cells.clear();
        self.panels.clear();
    }
}

pub struct App {
    pub cfg: Config,
    pub theme: Theme,
    pub table: TableState,
    pub input_mode: InputMode,
    pub filter_buf: String,
    pub selected: usize,
    pub scroll_offset: usize,
    pub page_height: usize,
    pub col_cursor: usize,
    pub open_panels: Vec<PanelKey>,
    pub error: Option<String>,
    pub loading: bool,
    pub quit: bool,
    pub regions: ClickRegions,
    search_debounce: Debouncer,
    sort_debounce: Debouncer,
    pending_sort: Option<String>,
}

impl App {
    pub fn new(cfg: Config) -> Self {
        let loaded_theme = theme::by_name(&cfg.theme);
        let search_debounce = Debouncer::new(Duration::from_millis(cfg.search_debounce_ms));
        let sort_debounce = Debouncer::new(Duration::from_millis(cfg.sort_debounce_ms));
        Self {
            table: TableState::new(cfg.clone()),
            cfg,
            theme: loaded_theme,
            input_mode: InputMode::Normal,
            filter_buf: String::new(),
            selected: 0,
            scroll_offset: 0,
            page_height: 20,
            col_cursor: 0,
            open_panels: Vec::new(),
            error: None,
            loading: true,
            quit: false,
            regions: ClickRegions::default(),
            search_debounce,
            sort_debounce,
            pending_sort: None,
        }
    }

    // -- Selection & scrolling --

    pub fn selected_dataset_row(&self) -> Option<usize> {
        self.table.display_rows().get(self.selected).copied()
    }

    pub fn clamp_selection(&mut self) {
        let len = self.table.display_len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
        let cols = self.table.visible_columns().len();
        if cols == 0 {
            self.col_cursor = 0;
        } else if self.col_cursor >= cols {
            self.col_cursor = cols - 1;
        }
        self.adjust_scroll();
    }

    pub fn adjust_scroll(&mut self) {
        if self.page_height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + self.page_height {
            self.scroll_offset = self.selected - self.page_height + 1;
        }
    }

    pub fn move_row(&mut self, delta: isize) {
        let len = self.table.display_len();
        if len == 0 {
            return;
        }
        self.blur_focused_panel();
        let next = self.selected as isize + delta;
        self.selected = next.clamp(0, len as isize - 1) as usize;
        self.adjust_scroll();
    }

    pub fn jump_row(&mut self, last: bool) {
        let len = self.table.display_len();
        if len == 0 {
            return;
        }
        self.blur_focused_panel();
        self.selected = if last { len - 1 } else { 0 };
        self.adjust_scroll();
    }

    pub fn move_col(&mut self, delta: isize) {
        let cols = self.table.visible_columns().len();
        if cols == 0 {
            return;
        }
        self.blur_focused_panel();
        let next = self.col_cursor as isize + delta;
        self.col_cursor = next.clamp(0, cols as isize - 1) as usize;
    }

    // -- Views --

    pub fn cycle_view(&mut self) {
        let names = self.cfg.view_names();
        let current = names
            .iter()
            .position(|n| *n == self.table.view())
            .unwrap_or(0);
        let next = names[(current + 1) % names.len()].to_string();
        self.select_view(&next);
    }

    pub fn select_view(&mut self, name: &str) {
        self.close_all_panels();
        self.table.set_view(name);
        self.col_cursor = 0;
        self.clamp_selection();
    }

    pub fn select_view_index(&mut self, idx: usize) {
        let names = self.cfg.view_names();
        if let Some(name) = names.get(idx) {
            let name = name.to_string();
            self.select_view(&name);
        }
    }

    // -- Debounced search & sort --

    pub fn filter_keystroke(&mut self, now: Instant) {
        self.search_debounce.trigger(now);
    }

    /// Apply the filter buffer immediately, discarding any pending schedule.
    pub fn apply_search_now(&mut self) {
        self.search_debounce.cancel();
        self.table.set_search(&self.filter_buf);
        self.clamp_selection();
    }

    pub fn request_sort(&mut self, column: String, now: Instant) {
        self.pending_sort = Some(column);
        self.sort_debounce.trigger(now);
    }

    /// Column name under the cursor, if any column is visible.
    pub fn cursor_column(&self) -> Option<String> {
        let cols = self.table.visible_columns();
        let idx = *cols.get(self.col_cursor)?;
        Some(self.table.dataset().columns[idx].clone())
    }

    /// Fire any debounce window that has elapsed. Called once per tick.
    pub fn pump_debounce(&mut self, now: Instant) {
        if self.search_debounce.fire(now) {
            self.table.set_search(&self.filter_buf);
            self.clamp_selection();
        }
        if self.sort_debounce.fire(now) {
            if let Some(column) = self.pending_sort.take() {
                self.table.toggle_sort(&column);
                self.clamp_selection();
            }
        }
    }

    // -- Info panels --

    /// The panel the focused cell exposes: the cell's own info column, or
    /// the row's primary info text when the cursor sits on the first
    /// visible column and that text is non-empty.
    pub fn focused_panel_key(&self) -> Option<PanelKey> {
        let row = self.selected_dataset_row()?;
        let cols = self.table.visible_columns();
        let col_idx = *cols.get(self.col_cursor)?;
        let name = &self.table.dataset().columns[col_idx];
        if self.cfg.is_info_column(name) {
            return Some((row, name.clone()));
        }
        if self.col_cursor == 0 {
            if let Some(primary) = self.cfg.primary_info_column() {
                if let Some(pi) = self.table.dataset().column_index(primary) {
                    if !self.table.dataset().rows[row][pi].is_empty() {
                        return Some((row, primary.to_string()));
                    }
                }
            }
        }
        None
    }

    pub fn toggle_panel(&mut self, key: PanelKey) {
        if let Some(pos) = self.open_panels.iter().position(|k| *k == key) {
            self.open_panels.remove(pos);
        } else {
            self.open_panels.push(key);
        }
    }

    pub fn toggle_focused_panel(&mut self) {
        if let Some(key) = self.focused_panel_key() {
            self.toggle_panel(key);
        }
    }

    pub fn close_all_panels(&mut self) {
        self.open_panels.clear();
    }

    pub fn panel_text(&self, key: &PanelKey) -> String {
        let text = self
            .table
            .dataset()
            .column_index(&key.1)
            .map(|col| self.table.dataset().rows[key.0][col].text())
            .unwrap_or_default();
        if text.trim().is_empty() {
            "No additional information.".to_string()
        } else {
            text
        }
    }

    /// Losing focus closes the focused cell's panel, leaving others open.
    fn blur_focused_panel(&mut self) {
        if let Some(key) = self.focused_panel_key() {
            if let Some(pos) = self.open_panels.iter().position(|k| *k == key) {
                self.open_panels.remove(pos);
            }
        }
    }

    // -- Errors --

    pub fn set_error(&mut self, msg: String) {
        log_error(&msg);
        self.error = Some(msg);
    }
}

fn log_path() -> std::path::PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    path.push("screener");
    path.push("errors.log");
    path
}

pub fn log_error(msg: &str) {
    let path = log_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&path) {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let _ = writeln!(f, "[{}] {}", now, msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use serde_json::json;

    fn fixture() -> App {
        let cfg = Config::default();
        let mut dataset = Dataset::from_columnar(
            vec![
                "Symbol".into(),
                "Company Name".into(),
                "Relevance".into(),
                "1D Change".into(),
            ],
            &[
                vec![json!("AAA"), json!("Alpha Co"), json!("Core holding"), json!("5.23")],
                vec![json!("BBB"), json!("Beta Co"), json!(""), json!("-0.4")],
            ],
        );
        dataset.normalize(|c| cfg.column_kind(c));
        let mut app = App::new(cfg);
        app.table.set_dataset(dataset);
        app.loading = false;
        app
    }

    #[test]
    fn panel_toggles_open_and_closed() {
        let mut app = fixture();
        app.col_cursor = 2; // Relevance
        let key = app.focused_panel_key().expect("info column focused");
        app.toggle_panel(key.clone());
        assert_eq!(app.open_panels, vec![key.clone()]);
        app.toggle_panel(key);
        assert!(app.open_panels.is_empty());
    }

    #[test]
    fn first_column_exposes_primary_info_text() {
        let mut app = fixture();
        app.col_cursor = 0;
        app.selected = 0;
        assert_eq!(app.focused_panel_key(), Some((0, "Relevance".into())));

        // Row without relevance text exposes nothing from the first column.
        app.selected = 1;
        assert_eq!(app.focused_panel_key(), None);
    }

    #[test]
    fn moving_focus_blurs_the_focused_panel_only() {
        let mut app = fixture();
        app.col_cursor = 2;
        app.toggle_focused_panel();
        let other: PanelKey = (1, "Relevance".into());
        app.toggle_panel(other.clone());
        assert_eq!(app.open_panels.len(), 2);

        app.move_row(1);
        // The focused (0, Relevance) panel closed; the other stayed open.
        assert_eq!(app.open_panels, vec![other]);
    }

    #[test]
    fn sort_requests_collapse_inside_the_window() {
        let mut app = fixture();
        let t0 = Instant::now();
        app.request_sort("Symbol".into(), t0);
        app.request_sort("Symbol".into(), t0 + Duration::from_millis(100));
        app.pump_debounce(t0 + Duration::from_millis(150));
        assert!(app.table.sort().is_none());

        // One trailing application: a rapid double press toggles once.
        app.pump_debounce(t0 + Duration::from_millis(301));
        let sort = app.table.sort().expect("sort applied");
        assert_eq!(sort.column, "Symbol");
        assert_eq!(sort.direction, crate::state::SortDirection::Ascending);
    }

    #[test]
    fn search_applies_after_quiet_window() {
        let mut app = fixture();
        let t0 = Instant::now();
        app.filter_buf.push_str("beta");
        app.filter_keystroke(t0);
        app.pump_debounce(t0 + Duration::from_millis(100));
        assert_eq!(app.table.display_len(), 2);
        app.pump_debounce(t0 + Duration::from_millis(300));
        assert_eq!(app.table.display_len(), 1);
    }

    #[test]
    fn view_switch_resets_column_cursor_and_panels() {
        let mut app = fixture();
        app.col_cursor = 2;
        app.toggle_focused_panel();
        app.select_view("performance");
        assert!(app.open_panels.is_empty());
        assert_eq!(app.col_cursor, 0);
    }
}
