use crate::domain::model::{Cell, Table};
use crate::utils::error::{DashboardError, Result};
use std::path::Path;

pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["csv", "tsv", "json"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Tsv,
    Json,
}

impl InputFormat {
    /// Picks the format from the file extension.
    pub fn from_path(path: &str) -> Result<Self> {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(InputFormat::Csv),
            Some("tsv") => Ok(InputFormat::Tsv),
            Some("json") => Ok(InputFormat::Json),
            _ => Err(DashboardError::LoadError {
                message: format!(
                    "Unsupported input file '{}'. Supported extensions: {}",
                    path,
                    SUPPORTED_EXTENSIONS.join(", ")
                ),
            }),
        }
    }
}

pub fn load_table(bytes: &[u8], format: InputFormat) -> Result<Table> {
    let table = match format {
        InputFormat::Csv => load_delimited(bytes, b',')?,
        InputFormat::Tsv => load_delimited(bytes, b'\t')?,
        InputFormat::Json => load_json(bytes)?,
    };
    tracing::debug!(
        "Loaded {} rows with columns {:?}",
        table.row_count(),
        table.column_names()
    );
    Ok(table)
}

fn load_delimited(bytes: &[u8], delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            // Excel 匯出的 CSV 常帶 BOM
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Cell::infer).collect());
    }

    Table::from_rows(headers, rows)
}

fn json_cell(value: &serde_json::Value) -> Cell {
    match value {
        serde_json::Value::Null => Cell::Missing,
        serde_json::Value::Number(n) => n.as_f64().map_or(Cell::Missing, Cell::from),
        serde_json::Value::String(s) => Cell::Text(s.clone()),
        other => Cell::Text(other.to_string()),
    }
}

/// Array of flat objects. Columns appear in order of first sight; keys a
/// record does not have are missing for that row.
fn load_json(bytes: &[u8]) -> Result<Table> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    let serde_json::Value::Array(items) = value else {
        return Err(DashboardError::LoadError {
            message: "JSON input must be an array of objects".to_string(),
        });
    };

    let mut headers: Vec<String> = Vec::new();
    let mut objects = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let serde_json::Value::Object(object) = item else {
            return Err(DashboardError::LoadError {
                message: format!("JSON item {} is not an object", index),
            });
        };
        for key in object.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
        objects.push(object);
    }

    let rows: Vec<Vec<Cell>> = objects
        .iter()
        .map(|object| {
            headers
                .iter()
                .map(|h| object.get(h).map_or(Cell::Missing, json_cell))
                .collect()
        })
        .collect();

    Table::from_rows(headers, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(InputFormat::from_path("data/travel.csv").unwrap(), InputFormat::Csv);
        assert_eq!(InputFormat::from_path("EXPENSES.TSV").unwrap(), InputFormat::Tsv);
        assert_eq!(InputFormat::from_path("roster.json").unwrap(), InputFormat::Json);
        assert!(InputFormat::from_path("roster.xlsx").is_err());
        assert!(InputFormat::from_path("roster").is_err());
    }

    #[test]
    fn test_load_csv_infers_cells() {
        let data = "\u{feff}Trip ID, Duration ,Travel Distance\n1,5,1200 miles\n2,,800\n";
        let table = load_table(data.as_bytes(), InputFormat::Csv).unwrap();

        assert_eq!(table.column_names(), vec!["Trip ID", "Duration", "Travel Distance"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column("Duration").unwrap(), &[Cell::Number(5.0), Cell::Missing]);
        assert_eq!(
            table.column("Travel Distance").unwrap(),
            &[Cell::text("1200 miles"), Cell::Number(800.0)]
        );
    }

    #[test]
    fn test_load_tsv() {
        let data = "Location\tTrip ID\nParis\t1\nTokyo\t2\n";
        let table = load_table(data.as_bytes(), InputFormat::Tsv).unwrap();
        assert_eq!(table.column("Location").unwrap(), &[Cell::text("Paris"), Cell::text("Tokyo")]);
    }

    #[test]
    fn test_load_csv_rejects_duplicate_headers() {
        let data = "Location,Location\nParis,Rome\n";
        assert!(matches!(
            load_table(data.as_bytes(), InputFormat::Csv),
            Err(DashboardError::LoadError { .. })
        ));
    }

    #[test]
    fn test_load_json() {
        let data = serde_json::json!([
            {"Trip ID": 1, "Location": "Paris", "Duration": null},
            {"Trip ID": 2, "Location": "Tokyo", "Duration": 4, "Travel Insurance": true}
        ]);
        let table = load_table(data.to_string().as_bytes(), InputFormat::Json).unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column("Duration").unwrap(), &[Cell::Missing, Cell::Number(4.0)]);
        assert_eq!(
            table.column("Travel Insurance").unwrap(),
            &[Cell::Missing, Cell::text("true")]
        );
    }

    #[test]
    fn test_load_json_rejects_non_array() {
        let data = br#"{"Trip ID": 1}"#;
        assert!(matches!(
            load_table(data, InputFormat::Json),
            Err(DashboardError::LoadError { .. })
        ));
    }
}
