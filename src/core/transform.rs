//! Per-row derivations that add a column to a table: digit extraction, month
//! keys and synthetic sums. Inputs are never modified.

use crate::core::aggregate::coerce_numeric;
use crate::domain::model::{Cell, Table};
use crate::utils::error::AggregationError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

type AggResult<T> = std::result::Result<T, AggregationError>;

/// Name of the month key column added by [`month_bucketing`].
pub const MONTH_COLUMN: &str = "Month";

// ASCII only; `\d` would also match other Unicode digits.
static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("digit pattern is valid"));

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

// %y 要排在 %Y 前面，否則 "1/15/24" 會被當成西元 24 年
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d.%m.%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%d-%b-%Y",
    "%Y%m%d",
];

// 只有年月的字串視為該月 1 日
const MONTH_FORMATS: &[&str] = &["%Y-%m", "%Y/%m", "%B %Y", "%b %Y"];

/// First maximal run of ASCII digits in `text`, or 0 when there is none.
/// Runs too long for a `u64` saturate.
pub fn extract_leading_integer(text: &str) -> u64 {
    DIGIT_RUN
        .find(text)
        .map(|m| m.as_str().parse::<u64>().unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Adds `target` holding [`extract_leading_integer`] of every `source` cell.
/// Missing cells read as empty text and yield 0.
pub fn extract_integer_column(table: &Table, source: &str, target: &str) -> AggResult<Table> {
    let cells = table.column(source)?;
    let extracted = cells
        .iter()
        .map(|cell| Cell::Number(extract_leading_integer(&cell.to_string()) as f64))
        .collect();
    table.with_column(target, extracted)
}

/// Flexible date parsing: RFC 3339, RFC 2822, ISO dates and datetimes and
/// the common month-first and spelled-out forms. Year-month strings such as
/// `2024-01` or `January 2024` read as the first of the month.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok().map(|dt| dt.date()))
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        })
        .or_else(|| {
            let first_of_month = format!("01 {}", s);
            MONTH_FORMATS.iter().find_map(|fmt| {
                NaiveDate::parse_from_str(&first_of_month, &format!("%d {}", fmt)).ok()
            })
        })
}

/// Dates of one column. Blank cells are `None` without being rejected.
#[derive(Debug, Clone)]
pub struct ParsedDates {
    pub dates: Vec<Option<NaiveDate>>,
    pub rejected: Vec<AggregationError>,
}

pub fn parse_date_column(table: &Table, column: &str) -> AggResult<ParsedDates> {
    let cells = table.column(column)?;
    let mut dates = Vec::with_capacity(cells.len());
    let mut rejected = Vec::new();

    for (row, cell) in cells.iter().enumerate() {
        if cell.is_blank() {
            dates.push(None);
            continue;
        }
        let raw = cell.to_string();
        match parse_date(&raw) {
            Some(date) => dates.push(Some(date)),
            None => {
                dates.push(None);
                rejected.push(AggregationError::UnparseableDate {
                    column: column.to_string(),
                    row,
                    value: raw,
                });
            }
        }
    }

    if !rejected.is_empty() {
        tracing::warn!(
            "⚠️ {} value(s) in '{}' are not dates and are left out of monthly views",
            rejected.len(),
            column
        );
    }
    Ok(ParsedDates { dates, rejected })
}

/// Table with the [`MONTH_COLUMN`] added, plus the rows whose date did not
/// parse. Those rows carry a missing month and fall out of month groupings.
#[derive(Debug, Clone)]
pub struct MonthBuckets {
    pub table: Table,
    pub rejected: Vec<AggregationError>,
}

pub fn month_bucketing(table: &Table, date_column: &str) -> AggResult<MonthBuckets> {
    let parsed = parse_date_column(table, date_column)?;
    let months = parsed
        .dates
        .iter()
        .map(|date| match date {
            Some(date) => Cell::Text(date.format("%Y-%m").to_string()),
            None => Cell::Missing,
        })
        .collect();

    Ok(MonthBuckets {
        table: table.with_column(MONTH_COLUMN, months)?,
        rejected: parsed.rejected,
    })
}

/// Adds `target` as the row-wise sum of `sources`. A row with any blank
/// source gets a missing total.
pub fn synthetic_sum_column(table: &Table, sources: &[&str], target: &str) -> AggResult<Table> {
    if sources.is_empty() {
        return Err(AggregationError::InvalidGrouping {
            reason: format!("'{}' needs at least one source column", target),
        });
    }

    let columns = sources
        .iter()
        .map(|name| table.column(name).map(|cells| (*name, cells)))
        .collect::<AggResult<Vec<_>>>()?;

    let mut totals = Vec::with_capacity(table.row_count());
    for row in 0..table.row_count() {
        let mut total = Some(0.0);
        for (name, cells) in &columns {
            match coerce_numeric(name, row, &cells[row])? {
                Some(value) => total = total.map(|t| t + value),
                None => total = None,
            }
        }
        totals.push(total.map_or(Cell::Missing, Cell::Number));
    }

    table.with_column(target, totals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_leading_integer() {
        assert_eq!(extract_leading_integer("12 miles"), 12);
        assert_eq!(extract_leading_integer("approx. 1500 mi (2400 km)"), 1500);
        assert_eq!(extract_leading_integer("miles"), 0);
        assert_eq!(extract_leading_integer(""), 0);
        assert_eq!(extract_leading_integer("$%&*"), 0);
        assert_eq!(extract_leading_integer("١٢٣ km"), 0);
        assert_eq!(extract_leading_integer("12.75"), 12);
        assert_eq!(extract_leading_integer("99999999999999999999999"), u64::MAX);
    }

    #[test]
    fn test_extract_integer_column() {
        let table = Table::from_columns([(
            "Travel Distance",
            vec![Cell::text("120 miles"), Cell::Missing, Cell::Number(45.0), Cell::text("n/a")],
        )])
        .unwrap();
        let derived = extract_integer_column(&table, "Travel Distance", "Distance (miles)").unwrap();
        let distances = derived.column("Distance (miles)").unwrap();

        assert_eq!(
            distances,
            &[Cell::Number(120.0), Cell::Number(0.0), Cell::Number(45.0), Cell::Number(0.0)]
        );
        assert!(!table.has_column("Distance (miles)"));
    }

    #[test]
    fn test_parse_date_formats() {
        let jan_15 = NaiveDate::from_ymd_opt(2024, 1, 15);
        assert_eq!(parse_date("2024-01-15"), jan_15);
        assert_eq!(parse_date("2024/01/15"), jan_15);
        assert_eq!(parse_date("01/15/2024"), jan_15);
        assert_eq!(parse_date("1/15/24"), jan_15);
        assert_eq!(parse_date("Jan 15, 2024"), jan_15);
        assert_eq!(parse_date("15 January 2024"), jan_15);
        assert_eq!(parse_date("2024-01-15 08:30:00"), jan_15);
        assert_eq!(parse_date("2024-01-15T08:30:00Z"), jan_15);
        assert_eq!(parse_date("1/15/2024 8:30 AM"), jan_15);
        assert_eq!(parse_date("01/15/2024 08:30:15 PM"), jan_15);
        assert_eq!(parse_date("15-Jan-2024"), jan_15);

        let jan_1 = NaiveDate::from_ymd_opt(2024, 1, 1);
        assert_eq!(parse_date("2024-01"), jan_1);
        assert_eq!(parse_date("January 2024"), jan_1);
        assert_eq!(parse_date("Jan 2024"), jan_1);

        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2024-13"), None);
        assert_eq!(parse_date("2024-13-40"), None);
        assert_eq!(parse_date("   "), None);
    }

    #[test]
    fn test_month_bucketing() {
        let table = Table::from_columns([(
            "Start date",
            vec![Cell::text("2024-01-15"), Cell::text("2024-01-31"), Cell::text("2024-02-01")],
        )])
        .unwrap();
        let buckets = month_bucketing(&table, "Start date").unwrap();

        assert!(buckets.rejected.is_empty());
        assert_eq!(
            buckets.table.column(MONTH_COLUMN).unwrap(),
            &[Cell::text("2024-01"), Cell::text("2024-01"), Cell::text("2024-02")]
        );
    }

    #[test]
    fn test_month_bucketing_rejects_bad_rows() {
        let table = Table::from_columns([(
            "Start date",
            vec![Cell::text("2024-03-02"), Cell::text("someday"), Cell::Missing],
        )])
        .unwrap();
        let buckets = month_bucketing(&table, "Start date").unwrap();

        assert_eq!(
            buckets.rejected,
            vec![AggregationError::UnparseableDate {
                column: "Start date".to_string(),
                row: 1,
                value: "someday".to_string(),
            }]
        );
        assert_eq!(
            buckets.table.column(MONTH_COLUMN).unwrap(),
            &[Cell::text("2024-03"), Cell::Missing, Cell::Missing]
        );
    }

    #[test]
    fn test_month_bucketing_missing_column() {
        let table = Table::from_columns([("End date", vec![Cell::text("2024-01-01")])]).unwrap();
        assert!(matches!(
            month_bucketing(&table, "Start date"),
            Err(AggregationError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_synthetic_sum_column() {
        let table = Table::from_columns([
            ("A", vec![Cell::Number(1.0), Cell::Number(2.0)]),
            ("B", vec![Cell::Number(3.0), Cell::Number(4.0)]),
        ])
        .unwrap();
        let derived = synthetic_sum_column(&table, &["A", "B"], "Total").unwrap();
        assert_eq!(derived.column("Total").unwrap(), &[Cell::Number(4.0), Cell::Number(6.0)]);
    }

    #[test]
    fn test_synthetic_sum_column_missing_and_text() {
        let table = Table::from_columns([
            ("A", vec![Cell::Number(1.0), Cell::Missing]),
            ("B", vec![Cell::text("2.5"), Cell::Number(4.0)]),
        ])
        .unwrap();
        let derived = synthetic_sum_column(&table, &["A", "B"], "Total").unwrap();
        assert_eq!(derived.column("Total").unwrap(), &[Cell::Number(3.5), Cell::Missing]);

        let table = Table::from_columns([("A", vec![Cell::text("free")]), ("B", vec![Cell::Number(1.0)])]).unwrap();
        assert!(matches!(
            synthetic_sum_column(&table, &["A", "B"], "Total"),
            Err(AggregationError::NonNumericColumn { .. })
        ));
    }
}
