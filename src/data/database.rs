//! SQLite storage for player split statistics

use super::normalize::CANONICAL_COLUMNS;
use crate::{Result, ScrapeError, StatRow, StatValue};
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OpenFlags, ToSql};
use serde::Serialize;
use std::path::Path;

const TABLE: &str = "player_stats";

/// Append-only destination for normalized stat rows
pub trait StatSink {
    /// Append one player's rows. Either all rows are stored or none are.
    fn append(&mut self, rows: &[StatRow]) -> Result<usize>;
}

/// Database connection and operations
pub struct Database {
    conn: Connection,
    /// Columns present in the `player_stats` table, in table order
    columns: Vec<String>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an existing database read-only, without creating the file or
    /// the table
    pub fn open_existing<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScrapeError::Config(format!(
                "Database {} not found; run a sync first",
                path.display()
            )));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let mut db = Database {
            conn,
            columns: Vec::new(),
        };
        db.columns = db.table_columns()?;
        if db.columns.is_empty() {
            return Err(ScrapeError::Config(format!(
                "Database {} has no {} table",
                path.display(),
                TABLE
            )));
        }
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    /// Wrap an existing connection, creating the table if it is missing.
    /// An existing table is used as is, whatever columns it declares.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        let mut db = Database {
            conn,
            columns: Vec::new(),
        };
        db.init_schema()?;
        db.columns = db.table_columns()?;
        log::debug!("{} columns: {}", TABLE, db.columns.join(", "));
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS player_stats (
                "Split" TEXT,
                "GP" INTEGER,
                "GS" INTEGER,
                "CG" INTEGER,
                "SHO" INTEGER,
                "IP" REAL,
                "H" INTEGER,
                "R" INTEGER,
                "ER" INTEGER,
                "HR" INTEGER,
                "BB" INTEGER,
                "K" INTEGER,
                "AB" INTEGER,
                "2B" INTEGER,
                "3B" INTEGER,
                "RBI" INTEGER,
                "SO" INTEGER,
                "PlayerName" TEXT,
                "TeamName" TEXT,
                "Position" TEXT
            );
            "#,
        )?;
        Ok(())
    }

    fn table_columns(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", TABLE))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    /// Columns rows are written to
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn insert_sql(&self) -> String {
        let names: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("\"{}\"", c.replace('"', "\"\"")))
            .collect();
        let placeholders: Vec<String> = (1..=self.columns.len()).map(|i| format!("?{}", i)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            TABLE,
            names.join(", "),
            placeholders.join(", ")
        )
    }

    /// Insert rows in one transaction. Row columns the table does not have
    /// are not written; table columns the row lacks are written as NULL.
    pub fn insert_rows(&mut self, rows: &[StatRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let sql = self.insert_sql();
        let columns = &self.columns;

        let dropped: Vec<&str> = rows[0]
            .columns()
            .filter(|c| !columns.iter().any(|t| t == c))
            .collect();
        if !dropped.is_empty() {
            log::debug!("Columns not stored in {}: {}", TABLE, dropped.join(", "));
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in rows {
                let values = columns
                    .iter()
                    .map(|c| row.get(c).unwrap_or(&StatValue::Null));
                stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;

        Ok(rows.len())
    }

    /// Stored rows for a player, in insertion order
    pub fn player_rows(&self, player_name: &str) -> Result<Vec<StatRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT * FROM {} WHERE \"PlayerName\" = ?1 ORDER BY rowid",
            TABLE
        ))?;
        let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

        let rows = stmt
            .query_map(params![player_name], |row| {
                let mut stat_row = StatRow::new();
                for (idx, name) in names.iter().enumerate() {
                    let value: Value = row.get(idx)?;
                    stat_row.insert(name.clone(), StatValue::from(value));
                }
                Ok(stat_row)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    // ==================== Statistics ====================

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let (row_count, player_count, team_count): (i64, i64, i64) = self.conn.query_row(
            &format!(
                "SELECT COUNT(*), COUNT(DISTINCT \"PlayerName\"), COUNT(DISTINCT \"TeamName\") FROM {}",
                TABLE
            ),
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(DatabaseStats {
            row_count: row_count as usize,
            player_count: player_count as usize,
            team_count: team_count as usize,
            missing_columns: CANONICAL_COLUMNS
                .iter()
                .filter(|c| !self.columns.iter().any(|t| t == *c))
                .map(|c| c.to_string())
                .collect(),
        })
    }
}

impl StatSink for Database {
    fn append(&mut self, rows: &[StatRow]) -> Result<usize> {
        self.insert_rows(rows)
    }
}

impl ToSql for StatValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            StatValue::Null => ToSqlOutput::Owned(Value::Null),
            StatValue::Integer(n) => ToSqlOutput::Owned(Value::Integer(*n)),
            StatValue::Real(x) => ToSqlOutput::Owned(Value::Real(*x)),
            StatValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

impl From<Value> for StatValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => StatValue::Null,
            Value::Integer(n) => StatValue::Integer(n),
            Value::Real(x) => StatValue::Real(x),
            Value::Text(s) => StatValue::Text(s),
            Value::Blob(b) => StatValue::Text(String::from_utf8_lossy(&b).into_owned()),
        }
    }
}

/// Database statistics
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    pub row_count: usize,
    pub player_count: usize,
    pub team_count: usize,
    /// Canonical columns the existing table does not declare
    pub missing_columns: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::normalize::normalize_row;

    fn sample_row(player: &str) -> StatRow {
        let row: StatRow = [
            ("Splits", StatValue::from("Total")),
            ("GP", StatValue::Integer(30)),
            ("IP", StatValue::Real(180.1)),
            ("ERA", StatValue::Real(3.2)),
            ("PlayerName", StatValue::from(player)),
            ("TeamName", StatValue::from("Seattle Mariners")),
            ("Position", StatValue::from("SP")),
        ]
        .into_iter()
        .collect();
        normalize_row(row)
    }

    #[test]
    fn test_create_database() {
        let db = Database::in_memory().unwrap();
        let stats = db.get_stats().unwrap();
        assert_eq!(stats.row_count, 0);
        assert_eq!(stats.player_count, 0);
        assert!(stats.missing_columns.is_empty());
        assert_eq!(db.columns().len(), CANONICAL_COLUMNS.len());
    }

    #[test]
    fn test_insert_rows() {
        let mut db = Database::in_memory().unwrap();
        let count = db.append(&[sample_row("Luis Castillo")]).unwrap();
        assert_eq!(count, 1);

        let rows = db.player_rows("Luis Castillo").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Split"), Some(&StatValue::from("Total")));
        assert_eq!(rows[0].get("GP"), Some(&StatValue::Integer(30)));
        assert_eq!(rows[0].get("IP"), Some(&StatValue::Real(180.1)));
        assert_eq!(rows[0].get("AB"), Some(&StatValue::Null));
        assert_eq!(rows[0].get("Position"), Some(&StatValue::from("SP")));
        assert!(!rows[0].contains("ERA"));
    }

    #[test]
    fn test_append_duplicates_rows() {
        let mut db = Database::in_memory().unwrap();
        db.append(&[sample_row("George Kirby")]).unwrap();
        db.append(&[sample_row("George Kirby")]).unwrap();

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.row_count, 2);
        assert_eq!(stats.player_count, 1);
        assert_eq!(stats.team_count, 1);
    }

    #[test]
    fn test_non_numeric_text_in_integer_column() {
        let mut db = Database::in_memory().unwrap();
        let mut row = sample_row("Logan Gilbert");
        row.insert("GS", StatValue::from("--"));
        db.append(&[row]).unwrap();

        let rows = db.player_rows("Logan Gilbert").unwrap();
        assert_eq!(rows[0].get("GS"), Some(&StatValue::from("--")));
    }

    #[test]
    fn test_existing_narrow_table_is_kept() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE player_stats (
                Split TEXT, GP INTEGER, GS INTEGER, CG INTEGER, SHO INTEGER, IP REAL,
                H INTEGER, R INTEGER, ER INTEGER, HR INTEGER, BB INTEGER, K INTEGER,
                PlayerName TEXT, TeamName TEXT
            )",
        )
        .unwrap();

        let mut db = Database::from_connection(conn).unwrap();
        assert_eq!(db.columns().len(), 14);

        db.append(&[sample_row("Bryce Miller")]).unwrap();
        let rows = db.player_rows("Bryce Miller").unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].contains("Position"));

        let stats = db.get_stats().unwrap();
        assert_eq!(
            stats.missing_columns,
            vec!["AB", "2B", "3B", "RBI", "SO", "Position"]
        );
    }

    fn temp_db_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("mlb_stats_{}_{}.db", name, std::process::id()))
    }

    #[test]
    fn test_open_existing_does_not_create_file() {
        let path = temp_db_path("missing");
        let _ = std::fs::remove_file(&path);

        assert!(Database::open_existing(&path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_open_existing_reads_stats() {
        let path = temp_db_path("existing");
        let _ = std::fs::remove_file(&path);

        {
            let mut db = Database::open(&path).unwrap();
            db.append(&[sample_row("Julio Rodriguez")]).unwrap();
        }

        let db = Database::open_existing(&path).unwrap();
        let stats = db.get_stats().unwrap();
        assert_eq!(stats.row_count, 1);
        assert_eq!(stats.player_count, 1);

        drop(db);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_insert_nothing() {
        let mut db = Database::in_memory().unwrap();
        assert_eq!(db.append(&[]).unwrap(), 0);
    }
}
