use crate::config::{Config, ALL_VIEW};
use crate::dataset::{Cell, ColumnKind, Dataset};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortConfig {
    pub column: String,
    pub direction: SortDirection,
}

/// Owns the dataset plus the three pieces of session UI state (view,
/// search term, sort config) and derives the displayed row order from
/// them. Rows are referenced by their index in the dataset so the fetch
/// order is never lost.
pub struct TableState {
    cfg: Config,
    dataset: Dataset,
    kinds: Vec<ColumnKind>,
    view: String,
    search: String,
    sort: Option<SortConfig>,
    display: Vec<usize>,
}

impl TableState {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            dataset: Dataset::empty(),
            kinds: Vec::new(),
            view: ALL_VIEW.to_string(),
            search: String::new(),
            sort: None,
            display: Vec::new(),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn view(&self) -> &str {
        &self.view
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn sort(&self) -> Option<&SortConfig> {
        self.sort.as_ref()
    }

    pub fn column_kind(&self, col: usize) -> ColumnKind {
        self.kinds.get(col).copied().unwrap_or(ColumnKind::Text)
    }

    /// Replace the dataset wholesale. The active view, search term and
    /// sort order all persist; only the derived rows are recomputed.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.kinds = dataset
            .columns
            .iter()
            .map(|c| self.cfg.column_kind(c))
            .collect();
        self.dataset = dataset;
        self.recompute();
    }

    /// Re-filter the full dataset; keystrokes never stack filters.
    pub fn set_search(&mut self, term: &str) {
        self.search = term.to_string();
        self.recompute();
    }

    pub fn set_view(&mut self, name: &str) {
        self.view = name.to_string();
    }

    /// Header-click semantics: same column flips direction, a new column
    /// starts ascending.
    pub fn toggle_sort(&mut self, column: &str) {
        self.sort = match self.sort.take() {
            Some(prev) if prev.column == column => Some(SortConfig {
                column: prev.column,
                direction: match prev.direction {
                    SortDirection::Ascending => SortDirection::Descending,
                    SortDirection::Descending => SortDirection::Ascending,
                },
            }),
            _ => Some(SortConfig {
                column: column.to_string(),
                direction: SortDirection::Ascending,
            }),
        };
        self.recompute();
    }

    /// Dataset row indices in display order.
    pub fn display_rows(&self) -> &[usize] {
        &self.display
    }

    pub fn display_len(&self) -> usize {
        self.display.len()
    }

    /// Indices of the columns the active view exposes, in dataset order.
    /// A view name with no config entry exposes nothing.
    pub fn visible_columns(&self) -> Vec<usize> {
        if self.view == ALL_VIEW {
            return (0..self.dataset.columns.len()).collect();
        }
        match self.cfg.view_columns(&self.view) {
            Some(subset) => self
                .dataset
                .columns
                .iter()
                .enumerate()
                .filter(|(_, name)| subset.iter().any(|s| s == *name))
                .map(|(i, _)| i)
                .collect(),
            None => Vec::new(),
        }
    }

    fn recompute(&mut self) {
        let term = self.search.to_lowercase();
        let mut rows: Vec<usize> = (0..self.dataset.rows.len())
            .filter(|&i| term.is_empty() || self.row_matches(&self.dataset.rows[i], &term))
            .collect();

        if let Some(sort) = &self.sort {
            if let Some(col) = self.dataset.column_index(&sort.column) {
                let kind = self.kinds[col];
                let dataset = &self.dataset;
                // Vec::sort_by is stable, so ties keep fetch order.
                rows.sort_by(|&a, &b| {
                    let ord = compare_cells(kind, &dataset.rows[a][col], &dataset.rows[b][col]);
                    match sort.direction {
                        SortDirection::Ascending => ord,
                        SortDirection::Descending => ord.reverse(),
                    }
                });
            }
        }
        self.display = rows;
    }

    fn row_matches(&self, row: &[Cell], term: &str) -> bool {
        row.iter().zip(&self.kinds).any(|(cell, kind)| {
            !kind.is_numeric() && cell.text().to_lowercase().contains(term)
        })
    }
}

fn compare_cells(kind: ColumnKind, a: &Cell, b: &Cell) -> std::cmp::Ordering {
    if kind.is_numeric() {
        let a = a.as_number().unwrap_or(0.0);
        let b = b.as_number().unwrap_or(0.0);
        a.total_cmp(&b)
    } else {
        a.text().to_lowercase().cmp(&b.text().to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> TableState {
        let cfg = Config::default();
        let mut dataset = Dataset::from_columnar(
            vec![
                "Symbol".into(),
                "Company Name".into(),
                "Market Cap".into(),
                "1D Change".into(),
            ],
            &[
                vec![json!("BBB"), json!("Beta Co"), json!("5 B"), json!("-1.2")],
                vec![json!("AAA"), json!("Alpha Co"), json!("2,000 B"), json!("5.23")],
                vec![json!("CCC"), json!("Gamma Co"), json!(""), json!("0")],
            ],
        );
        dataset.normalize(|c| cfg.column_kind(c));
        let mut state = TableState::new(cfg);
        state.set_dataset(dataset);
        state
    }

    fn symbols(state: &TableState) -> Vec<String> {
        state
            .display_rows()
            .iter()
            .map(|&i| state.dataset().rows[i][0].text())
            .collect()
    }

    #[test]
    fn unsorted_preserves_fetch_order() {
        let state = fixture();
        assert_eq!(symbols(&state), vec!["BBB", "AAA", "CCC"]);
    }

    #[test]
    fn sort_is_a_true_toggle() {
        let mut state = fixture();
        state.toggle_sort("Symbol");
        assert_eq!(state.sort().unwrap().direction, SortDirection::Ascending);
        assert_eq!(symbols(&state), vec!["AAA", "BBB", "CCC"]);

        state.toggle_sort("Symbol");
        assert_eq!(state.sort().unwrap().direction, SortDirection::Descending);
        assert_eq!(symbols(&state), vec!["CCC", "BBB", "AAA"]);

        // A different column always resets to ascending.
        state.toggle_sort("Market Cap");
        assert_eq!(state.sort().unwrap().direction, SortDirection::Ascending);
    }

    #[test]
    fn sort_is_idempotent() {
        let mut state = fixture();
        state.toggle_sort("1D Change");
        let once = symbols(&state);
        state.toggle_sort("1D Change");
        state.toggle_sort("1D Change");
        assert_eq!(symbols(&state), once);
    }

    #[test]
    fn market_cap_descending() {
        let mut state = fixture();
        state.toggle_sort("Market Cap");
        state.toggle_sort("Market Cap");
        let caps: Vec<f64> = state
            .display_rows()
            .iter()
            .map(|&i| state.dataset().rows[i][2].as_number().unwrap())
            .collect();
        assert_eq!(caps, vec![2.0e12, 5.0e9, 0.0]);
    }

    #[test]
    fn textual_sort_handles_missing_values() {
        let cfg = Config::default();
        let dataset = Dataset::from_columnar(
            vec!["Company Name".into()],
            &[vec![json!("beta")], vec![], vec![json!("Alpha")]],
        );
        let mut state = TableState::new(cfg);
        state.set_dataset(dataset);
        state.toggle_sort("Company Name");
        let names: Vec<String> = state
            .display_rows()
            .iter()
            .map(|&i| state.dataset().rows[i][0].text())
            .collect();
        assert_eq!(names, vec!["", "Alpha", "beta"]);
    }

    #[test]
    fn search_filters_textual_fields_only() {
        let mut state = fixture();
        state.set_search("alpha");
        assert_eq!(symbols(&state), vec!["AAA"]);

        // Numeric columns never match, even for numeric-looking terms.
        state.set_search("5.23");
        assert!(symbols(&state).is_empty());

        state.set_search("zzz");
        assert!(symbols(&state).is_empty());
    }

    #[test]
    fn empty_search_restores_last_sorted_order() {
        let mut state = fixture();
        state.toggle_sort("Symbol");
        state.set_search("co");
        state.set_search("");
        assert_eq!(symbols(&state), vec!["AAA", "BBB", "CCC"]);
    }

    #[test]
    fn view_subset_keeps_dataset_column_order() {
        let mut state = fixture();
        state.set_view("fundamentals");
        let cols: Vec<&str> = state
            .visible_columns()
            .into_iter()
            .map(|i| state.dataset().columns[i].as_str())
            .collect();
        assert_eq!(cols, vec!["Symbol", "Company Name", "Market Cap"]);
    }

    #[test]
    fn unknown_view_shows_no_columns() {
        let mut state = fixture();
        state.set_view("holdings");
        assert!(state.visible_columns().is_empty());
    }

    #[test]
    fn new_dataset_keeps_view_selection() {
        let mut state = fixture();
        state.set_view("performance");
        let mut next = Dataset::from_columnar(
            vec!["Symbol".into(), "1D Change".into()],
            &[vec![json!("DDD"), json!("1.0")]],
        );
        next.normalize(|c| Config::default().column_kind(c));
        state.set_dataset(next);
        assert_eq!(state.view(), "performance");
        let cols: Vec<&str> = state
            .visible_columns()
            .into_iter()
            .map(|i| state.dataset().columns[i].as_str())
            .collect();
        assert_eq!(cols, vec!["Symbol", "1D Change"]);
    }
}
