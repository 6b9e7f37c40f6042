//! MLB player statistics scraper
//!
//! Fetches ESPN team rosters and player split tables, normalizes them to a
//! fixed column schema and appends them to a SQLite table.

pub mod data;
pub mod pipeline;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Placeholder used when a roster page has no team heading
pub const TEAM_NAME_NOT_FOUND: &str = "Team name not found";

/// An MLB club and the roster page it is scraped from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub roster_url: String,
}

impl Team {
    pub fn new(name: impl Into<String>, roster_url: impl Into<String>) -> Self {
        Team {
            name: name.into(),
            roster_url: roster_url.into(),
        }
    }
}

/// A player found on a roster page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub name: String,
    pub profile_url: String,
    pub position: String,
}

/// Result of looking up the team heading on a roster page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamName {
    Found(String),
    NotFound,
}

impl TeamName {
    /// The extracted name, or the placeholder text
    pub fn as_str(&self) -> &str {
        match self {
            TeamName::Found(name) => name,
            TeamName::NotFound => TEAM_NAME_NOT_FOUND,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, TeamName::Found(_))
    }
}

impl fmt::Display for TeamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single scalar cell from a stats table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl StatValue {
    /// Interpret a table cell the way the table presents it: blank is null,
    /// whole numbers are integers, decimals are reals, the rest stays text.
    /// Thousands separators are ignored when reading numbers.
    pub fn from_cell(raw: &str) -> Self {
        let text = raw.trim();
        if text.is_empty() {
            return StatValue::Null;
        }
        let digits = text.replace(',', "");
        if let Ok(n) = digits.parse::<i64>() {
            return StatValue::Integer(n);
        }
        if digits.contains('.') {
            if let Ok(x) = digits.parse::<f64>() {
                if x.is_finite() {
                    return StatValue::Real(x);
                }
            }
        }
        StatValue::Text(text.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StatValue::Null)
    }
}

impl From<&str> for StatValue {
    fn from(s: &str) -> Self {
        StatValue::Text(s.to_string())
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Null => write!(f, "NULL"),
            StatValue::Integer(n) => write!(f, "{}", n),
            StatValue::Real(x) => write!(f, "{}", x),
            StatValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One split line of a player's stats table, keyed by column name.
///
/// Columns keep the order they were first inserted in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatRow {
    columns: Vec<(String, StatValue)>,
}

impl StatRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&StatValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|(name, _)| name == column)
    }

    /// Set a column, replacing any existing value in place
    pub fn insert(&mut self, column: impl Into<String>, value: StatValue) {
        let column = column.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.columns.push((column, value)),
        }
    }

    pub fn remove(&mut self, column: &str) -> Option<StatValue> {
        let idx = self.columns.iter().position(|(name, _)| name == column)?;
        Some(self.columns.remove(idx).1)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StatValue)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, StatValue)> for StatRow {
    fn from_iter<I: IntoIterator<Item = (K, StatValue)>>(iter: I) -> Self {
        let mut row = StatRow::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Fetch failed for {url}: HTTP {status}")]
    Fetch { url: String, status: u16 },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub scraper: ScraperConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub database_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                database_path: "mlb_stats.db".to_string(),
            },
            scraper: ScraperConfig {
                base_url: "https://www.espn.com".to_string(),
                user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                             (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                    .to_string(),
                timeout_secs: 30,
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScrapeError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| ScrapeError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ScrapeError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_values() {
        assert_eq!(StatValue::from_cell(""), StatValue::Null);
        assert_eq!(StatValue::from_cell("  "), StatValue::Null);
        assert_eq!(StatValue::from_cell("32"), StatValue::Integer(32));
        assert_eq!(StatValue::from_cell("172.1"), StatValue::Real(172.1));
        assert_eq!(StatValue::from_cell(".245"), StatValue::Real(0.245));
        assert_eq!(StatValue::from_cell("vs. Left"), StatValue::from("vs. Left"));
        assert_eq!(StatValue::from_cell("--"), StatValue::from("--"));
        assert_eq!(StatValue::from_cell("2024"), StatValue::Integer(2024));
    }

    #[test]
    fn test_cell_thousands_separators() {
        assert_eq!(StatValue::from_cell("1,234"), StatValue::Integer(1234));
        assert_eq!(StatValue::from_cell("2,001.2"), StatValue::Real(2001.2));
        assert_eq!(StatValue::from_cell(","), StatValue::from(","));
        assert_eq!(StatValue::from_cell("Smith, J."), StatValue::from("Smith, J."));
    }

    #[test]
    fn test_stat_row_insert_replaces() {
        let mut row = StatRow::new();
        row.insert("GP", StatValue::Integer(3));
        row.insert("IP", StatValue::Real(9.0));
        row.insert("GP", StatValue::Integer(4));

        assert_eq!(row.len(), 2);
        assert_eq!(row.get("GP"), Some(&StatValue::Integer(4)));
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["GP", "IP"]);
    }

    #[test]
    fn test_team_name_placeholder() {
        assert_eq!(TeamName::NotFound.as_str(), "Team name not found");
        assert!(!TeamName::NotFound.is_found());
        let found = TeamName::Found("Atlanta Braves".to_string());
        assert_eq!(found.to_string(), "Atlanta Braves");
    }

    #[test]
    fn test_config_round_trip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.data.database_path, "mlb_stats.db");
        assert_eq!(parsed.scraper.base_url, "https://www.espn.com");
        assert_eq!(parsed.scraper.timeout_secs, 30);
    }
}
