use crate::utils::error::{AggregationError, DashboardError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

/// A single value of the raw table.
///
/// Equality is exact and type-sensitive: `Number(1.0)` and `Text("1")` are
/// different values. Loaders never store NaN; `-0.0` equals `0.0`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Missing,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Missing, or text with nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Missing => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Numeric reading of the cell: numbers as-is, trimmed text when it
    /// parses as a finite float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            Cell::Missing => None,
        }
    }

    /// Type inference used by the delimited loaders.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Cell::Number(v),
            _ => Cell::Text(raw.to_string()),
        }
    }

    fn normalized_bits(v: f64) -> u64 {
        if v == 0.0 {
            0.0f64.to_bits()
        } else {
            v.to_bits()
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Cell::Missing => 0,
            Cell::Number(_) => 1,
            Cell::Text(_) => 2,
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        if value.is_nan() {
            Cell::Missing
        } else {
            Cell::Number(value)
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cell::Missing, Cell::Missing) => true,
            (Cell::Number(a), Cell::Number(b)) => {
                Self::normalized_bits(*a) == Self::normalized_bits(*b)
            }
            (Cell::Text(a), Cell::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Cell::Missing => {}
            Cell::Number(v) => Self::normalized_bits(*v).hash(state),
            Cell::Text(s) => s.hash(state),
        }
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Cell::Number(a), Cell::Number(b)) => {
                let a = if *a == 0.0 { 0.0 } else { *a };
                let b = if *b == 0.0 { 0.0 } else { *b };
                a.total_cmp(&b)
            }
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => Ok(()),
            Cell::Number(v) => write!(f, "{}", v),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone)]
struct Column {
    name: String,
    cells: Arc<Vec<Cell>>,
}

/// Raw input table. Columns are shared between a table and the tables derived
/// from it, so adding a column never copies the existing data.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Builds a table from a header row and data rows (row-major).
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for header in &headers {
            if !seen.insert(header.as_str()) {
                return Err(DashboardError::LoadError {
                    message: format!("Duplicate column header '{}'", header),
                });
            }
        }

        let row_count = rows.len();
        let mut columns: Vec<Vec<Cell>> = headers
            .iter()
            .map(|_| Vec::with_capacity(row_count))
            .collect();

        for (index, row) in rows.into_iter().enumerate() {
            if row.len() > headers.len() {
                return Err(DashboardError::LoadError {
                    message: format!(
                        "Row {} has {} fields but the header has {}",
                        index,
                        row.len(),
                        headers.len()
                    ),
                });
            }
            let width = row.len();
            for (column, cell) in columns.iter_mut().zip(row) {
                column.push(cell);
            }
            // 短列補上缺值
            for column in columns.iter_mut().skip(width) {
                column.push(Cell::Missing);
            }
        }

        Ok(Self {
            columns: headers
                .into_iter()
                .zip(columns)
                .map(|(name, cells)| Column {
                    name,
                    cells: Arc::new(cells),
                })
                .collect(),
            row_count,
        })
    }

    /// Builds a table column by column. Every column must have the same length.
    pub fn from_columns<N, I>(columns: I) -> Result<Self>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Vec<Cell>)>,
    {
        let mut table = Table::default();
        for (index, (name, cells)) in columns.into_iter().enumerate() {
            let name = name.into();
            if index > 0 && cells.len() != table.row_count {
                return Err(DashboardError::LoadError {
                    message: format!(
                        "Column '{}' has {} values, expected {}",
                        name,
                        cells.len(),
                        table.row_count
                    ),
                });
            }
            if table.has_column(&name) {
                return Err(DashboardError::LoadError {
                    message: format!("Duplicate column header '{}'", name),
                });
            }
            table.row_count = cells.len();
            table.columns.push(Column {
                name,
                cells: Arc::new(cells),
            });
        }
        Ok(table)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> std::result::Result<&[Cell], AggregationError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.cells.as_slice())
            .ok_or_else(|| AggregationError::column_not_found(name))
    }

    /// Returns a new table with `name` set to `cells`, replacing an existing
    /// column of the same name. The receiver is left untouched.
    pub fn with_column(
        &self,
        name: &str,
        cells: Vec<Cell>,
    ) -> std::result::Result<Table, AggregationError> {
        if !self.columns.is_empty() && cells.len() != self.row_count {
            return Err(AggregationError::ColumnLengthMismatch {
                column: name.to_string(),
                expected: self.row_count,
                actual: cells.len(),
            });
        }

        let mut table = self.clone();
        let column = Column {
            name: name.to_string(),
            cells: Arc::new(cells),
        };
        match table.columns.iter().position(|c| c.name == name) {
            Some(index) => table.columns[index] = column,
            None => {
                if table.columns.is_empty() {
                    table.row_count = column.cells.len();
                }
                table.columns.push(column);
            }
        }
        Ok(table)
    }
}

/// Histogram bucket layout: half-open buckets of `width` covering
/// `[start, end)`, the last one clipped to `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketSpec {
    pub width: f64,
    pub start: f64,
    pub end: f64,
}

impl BucketSpec {
    /// Number of buckets needed to reach `end`. A ratio within float noise
    /// of a whole number counts as that number, so no empty bucket starts
    /// at or past `end`.
    pub fn bucket_count(&self) -> usize {
        let ratio = (self.end - self.start) / self.width;
        let whole = ratio.round();
        if whole >= 1.0 && (self.start + whole * self.width - self.end).abs() <= self.width * 1e-9 {
            whole as usize
        } else {
            ratio.ceil() as usize
        }
    }
}

impl Default for BucketSpec {
    fn default() -> Self {
        Self {
            width: 2.0,
            start: 20.0,
            end: 58.0,
        }
    }
}

/// Data category selected for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Employee,
    Travel,
    Expense,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Employee, Category::Travel, Category::Expense];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Employee => "employee",
            Category::Travel => "travel",
            Category::Expense => "expense",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Category::Employee => "Employee Data Dashboard",
            Category::Travel => "Travel Data Dashboard",
            Category::Expense => "Travel Spending",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "employee" | "employee data" => Ok(Category::Employee),
            "travel" | "travel data" => Ok(Category::Travel),
            "expense" | "expense data" => Ok(Category::Expense),
            other => Err(DashboardError::InvalidConfigValueError {
                field: "category".to_string(),
                value: other.to_string(),
                reason: "Valid categories: employee, travel, expense".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_equality_is_type_sensitive() {
        assert_ne!(Cell::Number(1.0), Cell::text("1"));
        assert_eq!(Cell::Number(-0.0), Cell::Number(0.0));
        assert_eq!(Cell::Missing, Cell::Missing);
    }

    #[test]
    fn test_cell_inference() {
        assert_eq!(Cell::infer("  "), Cell::Missing);
        assert_eq!(Cell::infer("42"), Cell::Number(42.0));
        assert_eq!(Cell::infer(" 3.5 "), Cell::Number(3.5));
        assert_eq!(Cell::infer("NaN"), Cell::text("NaN"));
        assert_eq!(Cell::infer("120 miles"), Cell::text("120 miles"));
    }

    #[test]
    fn test_cell_ordering() {
        let mut cells = vec![Cell::text("b"), Cell::Number(2.0), Cell::Missing, Cell::text("a"), Cell::Number(-1.0)];
        cells.sort();
        assert_eq!(
            cells,
            vec![Cell::Missing, Cell::Number(-1.0), Cell::Number(2.0), Cell::text("a"), Cell::text("b")]
        );
    }

    #[test]
    fn test_table_from_rows_pads_short_rows() {
        let table = Table::from_rows(
            vec!["Trip ID".to_string(), "Location".to_string()],
            vec![vec![Cell::Number(1.0), Cell::text("Paris")], vec![Cell::Number(2.0)]],
        )
        .unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column("Location").unwrap()[1], Cell::Missing);
    }

    #[test]
    fn test_table_rejects_duplicate_headers() {
        let result = Table::from_rows(vec!["A".to_string(), "A".to_string()], vec![]);
        assert!(matches!(result, Err(DashboardError::LoadError { .. })));
    }

    #[test]
    fn test_with_column_leaves_source_untouched() {
        let table = Table::from_columns([("A", vec![Cell::Number(1.0)])]).unwrap();
        let derived = table.with_column("B", vec![Cell::Number(2.0)]).unwrap();

        assert!(!table.has_column("B"));
        assert_eq!(derived.column_names(), vec!["A", "B"]);
        assert_eq!(derived.column("B").unwrap(), &[Cell::Number(2.0)]);
    }

    #[test]
    fn test_with_column_rejects_wrong_length() {
        let table = Table::from_columns([("A", vec![Cell::Number(1.0), Cell::Number(2.0)])]).unwrap();

        let err = table.with_column("B", vec![Cell::Number(3.0)]).unwrap_err();

        assert_eq!(
            err,
            AggregationError::ColumnLengthMismatch {
                column: "B".to_string(),
                expected: 2,
                actual: 1,
            }
        );
        assert!(table.with_column("A", vec![Cell::Missing; 3]).is_err());
    }

    #[test]
    fn test_bucket_count_ignores_float_noise() {
        let spec = BucketSpec {
            width: 0.3,
            start: 0.0,
            end: 2.1,
        };
        assert_eq!(spec.bucket_count(), 7);
        assert_eq!(BucketSpec::default().bucket_count(), 19);

        let clipped = BucketSpec {
            width: 2.0,
            start: 0.0,
            end: 5.0,
        };
        assert_eq!(clipped.bucket_count(), 3);
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("Travel Data".parse::<Category>().unwrap(), Category::Travel);
        assert_eq!("expense".parse::<Category>().unwrap(), Category::Expense);
        assert!("payroll".parse::<Category>().is_err());
    }
}
