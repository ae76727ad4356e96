//! Rendering of listings as table, JSON or CSV

use serde::Serialize;

use super::{DatabaseError, DatabaseResult};

/// Output format for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// ASCII table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Serialized records with an explicit column order
#[derive(Debug, Clone)]
pub struct RecordTable {
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Value>,
}

impl RecordTable {
    /// Serialize `records`, showing `columns` in the given order
    pub fn from_records<T: Serialize>(columns: &[&str], records: &[T]) -> DatabaseResult<Self> {
        let rows = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;

        Ok(Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Format records for display
pub fn format_records(table: &RecordTable, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&table.rows).unwrap_or_else(|_| "[]".to_string())
        }
        OutputFormat::Csv => format_as_csv(table),
        OutputFormat::Table => format_as_table(table),
    }
}

fn cell(row: &serde_json::Value, column: &str) -> String {
    match row.get(column).unwrap_or(&serde_json::Value::Null) {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn format_as_csv(table: &RecordTable) -> String {
    let mut output = String::new();

    output.push_str(&table.columns.join(","));
    output.push('\n');

    for row in &table.rows {
        let values: Vec<String> = table
            .columns
            .iter()
            .map(|col| {
                let s = cell(row, col);
                if s.contains(',') || s.contains('"') || s.contains('\n') {
                    format!("\"{}\"", s.replace('"', "\"\""))
                } else {
                    s
                }
            })
            .collect();
        output.push_str(&values.join(","));
        output.push('\n');
    }

    output
}

fn format_as_table(table: &RecordTable) -> String {
    if table.is_empty() {
        return "(0 rows)".to_string();
    }

    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| table.columns.iter().map(|col| cell(row, col)).collect())
        .collect();

    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.len()).collect();
    for row in &cells {
        for (i, value) in row.iter().enumerate() {
            widths[i] = widths[i].max(value.chars().count());
        }
    }

    let mut output = String::new();

    let header: Vec<String> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{:width$}", c, width = widths[i]))
        .collect();
    output.push_str(&header.join(" | "));
    output.push('\n');

    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    output.push_str(&separator.join("-+-"));
    output.push('\n');

    for row in &cells {
        let values: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{:width$}", s, width = widths[i]))
            .collect();
        output.push_str(&values.join(" | "));
        output.push('\n');
    }

    output.push_str(&format!("({} rows)", table.row_count()));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[derive(Serialize)]
    struct Item {
        name: String,
        note: Option<String>,
        count: u32,
    }

    fn items() -> Vec<Item> {
        vec![
            Item {
                name: "customers".to_string(),
                note: None,
                count: 3,
            },
            Item {
                name: "orders".to_string(),
                note: Some("has, comma".to_string()),
                count: 3,
            },
        ]
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("table").unwrap(), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("csv").unwrap(), OutputFormat::Csv);
        assert!(OutputFormat::from_str("yaml").is_err());
    }

    #[test]
    fn test_format_as_table() {
        let table = RecordTable::from_records(&["name", "count"], &items()).unwrap();
        let output = format_records(&table, OutputFormat::Table);
        assert!(output.starts_with("name"));
        assert!(output.contains("customers | 3"));
        assert!(output.ends_with("(2 rows)"));
    }

    #[test]
    fn test_format_as_csv_quotes_and_nulls() {
        let table = RecordTable::from_records(&["name", "note"], &items()).unwrap();
        let output = format_records(&table, OutputFormat::Csv);
        assert!(output.starts_with("name,note\n"));
        assert!(output.contains("customers,\n"));
        assert!(output.contains("orders,\"has, comma\""));
    }

    #[test]
    fn test_format_empty() {
        let table = RecordTable::from_records::<Item>(&["name"], &[]).unwrap();
        assert_eq!(format_records(&table, OutputFormat::Table), "(0 rows)");
        assert_eq!(format_records(&table, OutputFormat::Json), "[]");
    }
}
