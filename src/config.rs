use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::dataset::ColumnKind;

/// Name of the implicit view showing every fetched column.
pub const ALL_VIEW: &str = "all";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewSpec {
    pub name: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoint_url: String,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_search_debounce")]
    pub search_debounce_ms: u64,
    #[serde(default = "default_sort_debounce")]
    pub sort_debounce_ms: u64,
    #[serde(default = "default_views")]
    pub views: Vec<ViewSpec>,
    #[serde(default = "default_info_columns")]
    pub info_columns: Vec<String>,
    #[serde(default = "default_numeric_columns")]
    pub numeric_columns: Vec<String>,
    #[serde(default = "default_market_cap_columns")]
    pub market_cap_columns: Vec<String>,
}

fn default_theme() -> String {
    "dark".to_string()
}

fn default_search_debounce() -> u64 {
    300
}

fn default_sort_debounce() -> u64 {
    200
}

const CHANGE_COLUMNS: &[&str] = &[
    "1D Change",
    "1W Change",
    "1M Change",
    "3M Change",
    "6M Change",
    "YTD Change",
    "1Y Change",
    "3Y Change",
    "5Y Change",
    "10Y Change",
    "15Y Change",
    "20Y Change",
];

fn default_views() -> Vec<ViewSpec> {
    let mut performance: Vec<String> = vec!["Symbol".into(), "Company Name".into()];
    performance.extend(CHANGE_COLUMNS.iter().map(|c| c.to_string()));
    vec![
        ViewSpec {
            name: "performance".into(),
            columns: performance,
        },
        ViewSpec {
            name: "fundamentals".into(),
            columns: [
                "Symbol",
                "Company Name",
                "Market Cap",
                "Exchange",
                "Industry",
                "Sector",
                "Country",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        },
    ]
}

fn default_info_columns() -> Vec<String> {
    ["Relevance", "Relevance (Ext)", "Inclusion", "Description"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn default_numeric_columns() -> Vec<String> {
    let mut cols = vec!["Market Cap".to_string()];
    cols.extend(CHANGE_COLUMNS.iter().map(|c| c.to_string()));
    cols
}

fn default_market_cap_columns() -> Vec<String> {
    vec!["Market Cap".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            theme: default_theme(),
            search_debounce_ms: default_search_debounce(),
            sort_debounce_ms: default_sort_debounce(),
            views: default_views(),
            info_columns: default_info_columns(),
            numeric_columns: default_numeric_columns(),
            market_cap_columns: default_market_cap_columns(),
        }
    }
}

impl Config {
    pub fn load(path_override: Option<PathBuf>) -> Result<Self> {
        let path = path_override.unwrap_or_else(Self::config_path);
        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let mut cfg: Config = serde_yaml::from_str(&contents)?;
            cfg.search_debounce_ms = cfg.search_debounce_ms.min(5_000);
            cfg.sort_debounce_ms = cfg.sort_debounce_ms.min(5_000);
            Ok(cfg)
        } else {
            let cfg = Config::default();
            cfg.save(&path)?;
            Ok(cfg)
        }
    }

    pub fn save(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("screener");
        path.push("config.yaml");
        path
    }

    pub fn column_kind(&self, name: &str) -> ColumnKind {
        if self.market_cap_columns.iter().any(|c| c == name) {
            ColumnKind::MarketCap
        } else if self.numeric_columns.iter().any(|c| c == name) {
            ColumnKind::Change
        } else {
            ColumnKind::Text
        }
    }

    pub fn is_info_column(&self, name: &str) -> bool {
        self.info_columns.iter().any(|c| c == name)
    }

    /// The info column surfaced next to the first visible cell of each row.
    pub fn primary_info_column(&self) -> Option<&str> {
        self.info_columns.first().map(|s| s.as_str())
    }

    /// Selectable view names, the dynamic "all" view first.
    pub fn view_names(&self) -> Vec<&str> {
        let mut names = vec![ALL_VIEW];
        names.extend(self.views.iter().map(|v| v.name.as_str()));
        names
    }

    pub fn view_columns(&self, name: &str) -> Option<&[String]> {
        self.views
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.columns.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_default_columns() {
        let cfg = Config::default();
        assert_eq!(cfg.column_kind("Market Cap"), ColumnKind::MarketCap);
        assert_eq!(cfg.column_kind("1D Change"), ColumnKind::Change);
        assert_eq!(cfg.column_kind("Company Name"), ColumnKind::Text);
        assert!(cfg.is_info_column("Description"));
        assert!(!cfg.is_info_column("Symbol"));
    }

    #[test]
    fn all_view_is_listed_first() {
        let cfg = Config::default();
        let names = cfg.view_names();
        assert_eq!(names[0], ALL_VIEW);
        assert!(names.contains(&"performance"));
        assert!(names.contains(&"fundamentals"));
        assert!(cfg.view_columns(ALL_VIEW).is_none());
        assert!(cfg.view_columns("nope").is_none());
    }
}
