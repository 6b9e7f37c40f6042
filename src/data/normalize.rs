//! Reconcile extracted stat rows with the canonical column schema

use crate::{StatRow, StatValue};

/// Columns every normalized row carries
pub const CANONICAL_COLUMNS: [&str; 20] = [
    "Split",
    "GP",
    "GS",
    "CG",
    "SHO",
    "IP",
    "H",
    "R",
    "ER",
    "HR",
    "BB",
    "K",
    "AB",
    "2B",
    "3B",
    "RBI",
    "SO",
    "PlayerName",
    "TeamName",
    "Position",
];

/// Source column names and the canonical column they map to
const SYNONYMS: [(&str, &str); 1] = [("Splits", "Split")];

/// Normalize one extracted row.
///
/// Synonym columns are renamed, and every canonical column the row lacks is
/// added as null. Columns outside the schema are kept as they are.
pub fn normalize_row(mut row: StatRow) -> StatRow {
    for (source, canonical) in SYNONYMS {
        if let Some(value) = row.remove(source) {
            row.insert(canonical, value);
        }
    }

    for column in CANONICAL_COLUMNS {
        if !row.contains(column) {
            row.insert(column, StatValue::Null);
        }
    }

    row
}

pub fn normalize_rows(rows: Vec<StatRow>) -> Vec<StatRow> {
    rows.into_iter().map(normalize_row).collect()
}

pub fn is_canonical(column: &str) -> bool {
    CANONICAL_COLUMNS.contains(&column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_become_null() {
        let row: StatRow = [
            ("Split", StatValue::from("Home")),
            ("GP", StatValue::Integer(14)),
        ]
        .into_iter()
        .collect();

        let row = normalize_row(row);

        for column in CANONICAL_COLUMNS {
            assert!(row.contains(column), "missing {}", column);
        }
        assert_eq!(row.get("GP"), Some(&StatValue::Integer(14)));
        assert_eq!(row.get("ER"), Some(&StatValue::Null));
        assert_eq!(row.get("Position"), Some(&StatValue::Null));
    }

    #[test]
    fn test_splits_renamed_to_split() {
        let row: StatRow = [("Splits", StatValue::from("2024"))].into_iter().collect();

        let row = normalize_row(row);

        assert_eq!(row.get("Split"), Some(&StatValue::from("2024")));
        assert!(!row.contains("Splits"));
    }

    #[test]
    fn test_splits_value_wins_over_split() {
        let row: StatRow = [
            ("Split", StatValue::from("stale")),
            ("Splits", StatValue::from("vs. Right")),
        ]
        .into_iter()
        .collect();

        let row = normalize_row(row);

        assert_eq!(row.get("Split"), Some(&StatValue::from("vs. Right")));
        assert!(!row.contains("Splits"));
    }

    #[test]
    fn test_extra_columns_ride_along() {
        let row: StatRow = [
            ("ERA", StatValue::Real(3.65)),
            ("WHIP", StatValue::Real(1.1)),
        ]
        .into_iter()
        .collect();

        let row = normalize_row(row);

        assert_eq!(row.len(), CANONICAL_COLUMNS.len() + 2);
        assert_eq!(row.get("ERA"), Some(&StatValue::Real(3.65)));
        assert!(!is_canonical("ERA"));
        assert!(is_canonical("2B"));
    }

    #[test]
    fn test_existing_values_not_coerced() {
        let row: StatRow = [("IP", StatValue::from("12.1*"))].into_iter().collect();
        let row = normalize_row(row);
        assert_eq!(row.get("IP"), Some(&StatValue::from("12.1*")));
    }
}
