use serde_json::Value;

/// How a column's values are interpreted for parsing, sorting and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    MarketCap,
    Change,
    Text,
}

impl ColumnKind {
    pub fn is_numeric(self) -> bool {
        !matches!(self, ColumnKind::Text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => Cell::Missing,
            Value::Number(n) => match n.as_f64() {
                Some(f) => Cell::Number(f),
                None => Cell::Text(n.to_string()),
            },
            Value::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// String representation used for searching and textual sorting.
    pub fn text(&self) -> String {
        match self {
            Cell::Number(n) => format!("{}", n),
            Cell::Text(s) => s.clone(),
            Cell::Missing => String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Missing => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }
}

/// The full table as last fetched: ordered column names plus rows of cells.
/// Every row holds exactly one cell per column, in column order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Dataset {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from an array of flat objects. The column list is taken from
    /// the first object's keys; later objects are aligned by key, with
    /// absent keys becoming missing cells.
    pub fn from_records(records: &[serde_json::Map<String, Value>]) -> Self {
        let columns: Vec<String> = match records.first() {
            Some(first) => first.keys().cloned().collect(),
            None => Vec::new(),
        };
        let rows = records
            .iter()
            .map(|rec| {
                columns
                    .iter()
                    .map(|col| rec.get(col).map(Cell::from_json).unwrap_or(Cell::Missing))
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    /// Build from the `{columns, rows}` wire shape. Short row arrays are
    /// padded with missing cells; surplus trailing values have no column
    /// and are dropped.
    pub fn from_columnar(columns: Vec<String>, rows: &[Vec<Value>]) -> Self {
        let width = columns.len();
        let rows = rows
            .iter()
            .map(|values| {
                (0..width)
                    .map(|i| values.get(i).map(Cell::from_json).unwrap_or(Cell::Missing))
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Coerce every cell of a numeric column to a finite number so later
    /// sorting and formatting never re-parse. Unparseable, empty and
    /// missing values become 0. Textual columns pass through untouched.
    pub fn normalize(&mut self, kind_of: impl Fn(&str) -> ColumnKind) {
        let kinds: Vec<ColumnKind> = self.columns.iter().map(|c| kind_of(c)).collect();
        for row in &mut self.rows {
            for (cell, kind) in row.iter_mut().zip(&kinds) {
                match kind {
                    ColumnKind::MarketCap => {
                        let n = match cell {
                            Cell::Number(n) => *n,
                            Cell::Text(s) => parse_market_cap(s),
                            Cell::Missing => 0.0,
                        };
                        *cell = Cell::Number(n);
                    }
                    ColumnKind::Change => {
                        let n = match cell {
                            Cell::Number(n) => *n,
                            Cell::Text(s) => leading_f64(s).unwrap_or(0.0),
                            Cell::Missing => 0.0,
                        };
                        *cell = Cell::Number(n);
                    }
                    ColumnKind::Text => {}
                }
            }
        }
    }
}

/// Parse a market-cap string like "1,815.6 B" into a plain number.
/// A single trailing T/B/M suffix scales by 1e12/1e9/1e6; thousands
/// separators are stripped; anything unparseable yields 0.
pub fn parse_market_cap(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() {
        return 0.0;
    }
    let (body, scale) = match s.as_bytes().last() {
        Some(b'T') => (&s[..s.len() - 1], 1e12),
        Some(b'B') => (&s[..s.len() - 1], 1e9),
        Some(b'M') => (&s[..s.len() - 1], 1e6),
        _ => (s, 1.0),
    };
    let cleaned: String = body.chars().filter(|c| *c != ',').collect();
    leading_f64(&cleaned).unwrap_or(0.0) * scale
}

/// Parse the longest numeric prefix of a string, ignoring leading
/// whitespace, so "5.23%" yields 5.23. Returns None when no digits lead.
pub fn leading_f64(s: &str) -> Option<f64> {
    let t = s.trim_start();
    let bytes = t.as_bytes();
    let start = match bytes.first() {
        Some(b'+') | Some(b'-') => 1,
        _ => 0,
    };
    let mut end = start;
    let mut seen_digit = false;
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }
    if !seen_digit {
        return None;
    }
    // Optional exponent tail, only when complete.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut j = end + 1;
        if matches!(bytes.get(j), Some(b'+') | Some(b'-')) {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            end = j;
        }
    }
    t[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}
