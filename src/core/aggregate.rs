//! Numeric rollups and groupings over a [`Table`].
//!
//! Every function here is a pure, single-pass read of the table. Errors are
//! returned immediately; nothing is retried or partially reported.

use crate::domain::model::{BucketSpec, Cell, Table};
use crate::domain::series::{Series, SeriesPoint};
use crate::utils::error::AggregationError;
use std::collections::{HashMap, HashSet};

type AggResult<T> = std::result::Result<T, AggregationError>;

/// Upper bound on the number of histogram buckets.
pub const MAX_BUCKETS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Count,
    Sum,
    Mean,
}

/// Output order of a grouped series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeriesOrder {
    #[default]
    FirstAppearance,
    KeyAscending,
    /// Largest value first; ties keep first-appearance order.
    ValueDescending,
}

#[derive(Debug, Clone, Copy)]
pub struct GroupSpec<'a> {
    pub by: &'a [&'a str],
    pub value: Option<&'a str>,
    pub op: AggregateOp,
    pub order: SeriesOrder,
}

impl<'a> GroupSpec<'a> {
    pub fn count(by: &'a [&'a str]) -> Self {
        Self {
            by,
            value: None,
            op: AggregateOp::Count,
            order: SeriesOrder::FirstAppearance,
        }
    }

    pub fn sum(by: &'a [&'a str], value: &'a str) -> Self {
        Self {
            by,
            value: Some(value),
            op: AggregateOp::Sum,
            order: SeriesOrder::FirstAppearance,
        }
    }

    pub fn mean(by: &'a [&'a str], value: &'a str) -> Self {
        Self {
            by,
            value: Some(value),
            op: AggregateOp::Mean,
            order: SeriesOrder::FirstAppearance,
        }
    }

    pub fn ordered(mut self, order: SeriesOrder) -> Self {
        self.order = order;
        self
    }
}

/// Several value columns aggregated over the same groups and stacked into a
/// single "long" series keyed by `(group…, value column name)`.
#[derive(Debug, Clone, Copy)]
pub struct MeltSpec<'a> {
    pub by: &'a [&'a str],
    pub values: &'a [&'a str],
    pub op: AggregateOp,
    pub variable: &'a str,
    pub measure: &'a str,
    pub order: SeriesOrder,
}

/// Reads a cell as a number. Blank cells are `None`; anything else that is
/// not numeric is an error naming the offending row.
pub fn coerce_numeric(column: &str, row: usize, cell: &Cell) -> AggResult<Option<f64>> {
    if cell.is_blank() {
        return Ok(None);
    }
    cell.as_f64()
        .map(Some)
        .ok_or_else(|| AggregationError::NonNumericColumn {
            column: column.to_string(),
            row,
            value: cell.to_string(),
        })
}

/// Number of distinct values in `column`, by exact equality.
pub fn distinct_count(table: &Table, column: &str) -> AggResult<usize> {
    let cells = table.column(column)?;
    Ok(cells.iter().collect::<HashSet<&Cell>>().len())
}

/// Every non-blank value of `column`, coerced to a number.
pub fn numeric_values(table: &Table, column: &str) -> AggResult<Vec<f64>> {
    let cells = table.column(column)?;
    let mut values = Vec::with_capacity(cells.len());
    for (row, cell) in cells.iter().enumerate() {
        if let Some(value) = coerce_numeric(column, row, cell)? {
            values.push(value);
        }
    }
    Ok(values)
}

pub fn sum(table: &Table, column: &str) -> AggResult<f64> {
    Ok(numeric_values(table, column)?.iter().sum())
}

pub fn mean(table: &Table, column: &str) -> AggResult<f64> {
    let values = numeric_values(table, column)?;
    if values.is_empty() {
        return Err(AggregationError::NoNumericValues {
            column: column.to_string(),
        });
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

#[derive(Debug, Default)]
struct Accumulator {
    rows: usize,
    count: usize,
    sum: f64,
}

impl Accumulator {
    fn finish(&self, op: AggregateOp, counts_values: bool) -> f64 {
        match op {
            AggregateOp::Count if counts_values => self.count as f64,
            AggregateOp::Count => self.rows as f64,
            AggregateOp::Sum => self.sum,
            AggregateOp::Mean if self.count == 0 => f64::NAN,
            AggregateOp::Mean => self.sum / self.count as f64,
        }
    }
}

/// Partitions rows by the values of `spec.by` and aggregates each partition.
///
/// Rows with a missing group value are left out. Each key combination that
/// occurs appears exactly once; absent combinations are not zero-filled.
pub fn group_aggregate(table: &Table, spec: &GroupSpec<'_>) -> AggResult<Series> {
    if spec.by.is_empty() || spec.by.len() > 2 {
        return Err(AggregationError::InvalidGrouping {
            reason: format!("expected 1 or 2 group columns, got {}", spec.by.len()),
        });
    }

    let key_columns = spec
        .by
        .iter()
        .map(|name| table.column(name))
        .collect::<AggResult<Vec<_>>>()?;

    let value_column = match (spec.op, spec.value) {
        (_, Some(name)) => Some((name, table.column(name)?)),
        (AggregateOp::Count, None) => None,
        (_, None) => {
            return Err(AggregationError::InvalidGrouping {
                reason: "sum and mean need a value column".to_string(),
            })
        }
    };

    let mut index: HashMap<Vec<Cell>, usize> = HashMap::new();
    let mut groups: Vec<(Vec<Cell>, Accumulator)> = Vec::new();

    for row in 0..table.row_count() {
        let key: Vec<Cell> = key_columns.iter().map(|cells| cells[row].clone()).collect();
        if key.iter().any(Cell::is_missing) {
            continue;
        }

        let slot = match index.get(&key) {
            Some(slot) => *slot,
            None => {
                groups.push((key.clone(), Accumulator::default()));
                index.insert(key, groups.len() - 1);
                groups.len() - 1
            }
        };
        let acc = &mut groups[slot].1;
        acc.rows += 1;

        if let Some((name, cells)) = value_column {
            let cell = &cells[row];
            if spec.op == AggregateOp::Count {
                if !cell.is_blank() {
                    acc.count += 1;
                }
            } else if let Some(value) = coerce_numeric(name, row, cell)? {
                acc.count += 1;
                acc.sum += value;
            }
        }
    }

    let measure = match value_column {
        Some((name, _)) if spec.op != AggregateOp::Count => name.to_string(),
        _ => "Count".to_string(),
    };

    let mut series = Series::new(spec.by.iter().map(|s| s.to_string()).collect(), measure);
    let counts_values = value_column.is_some();
    series.points = groups
        .into_iter()
        .map(|(key, acc)| SeriesPoint {
            value: acc.finish(spec.op, counts_values),
            key,
        })
        .collect();
    sort_points(&mut series.points, spec.order);

    tracing::debug!(
        "Grouped {:?} into {} partitions ({:?})",
        spec.by,
        series.len(),
        spec.op
    );
    Ok(series)
}

/// Aggregates each of `spec.values` over the same groups and stacks the
/// results, one block per value column in the order given.
pub fn melt_aggregate(table: &Table, spec: &MeltSpec<'_>) -> AggResult<Series> {
    let distinct: HashSet<&&str> = spec.values.iter().collect();
    if distinct.len() != spec.values.len() {
        return Err(AggregationError::InvalidGrouping {
            reason: "value columns must be distinct".to_string(),
        });
    }

    let mut dimensions: Vec<String> = spec.by.iter().map(|s| s.to_string()).collect();
    dimensions.push(spec.variable.to_string());
    let mut melted = Series::new(dimensions, spec.measure);

    for value in spec.values {
        let group = GroupSpec {
            by: spec.by,
            value: Some(value),
            op: spec.op,
            order: spec.order,
        };
        for point in group_aggregate(table, &group)?.points {
            let mut key = point.key;
            key.push(Cell::text(*value));
            melted.points.push(SeriesPoint {
                key,
                value: point.value,
            });
        }
    }
    Ok(melted)
}

/// One point per column holding the column's sum.
pub fn column_totals(
    table: &Table,
    columns: &[&str],
    dimension: &str,
    measure: &str,
) -> AggResult<Series> {
    let mut series = Series::new(vec![dimension.to_string()], measure);
    for column in columns {
        series.points.push(SeriesPoint {
            key: vec![Cell::text(*column)],
            value: sum(table, column)?,
        });
    }
    Ok(series)
}

/// Counts the values of `column` per bucket. Every bucket is emitted, keyed
/// by its midpoint; values outside `[start, end)` are ignored.
pub fn histogram(table: &Table, column: &str, buckets: &BucketSpec) -> AggResult<Series> {
    let BucketSpec { width, start, end } = *buckets;
    if !(width.is_finite() && width > 0.0) {
        return Err(AggregationError::InvalidBuckets {
            reason: format!("bucket width must be positive, got {}", width),
        });
    }
    if !(start.is_finite() && end.is_finite() && start < end) {
        return Err(AggregationError::InvalidBuckets {
            reason: format!("range start {} must be below range end {}", start, end),
        });
    }
    let bucket_count = buckets.bucket_count();
    if bucket_count > MAX_BUCKETS {
        return Err(AggregationError::InvalidBuckets {
            reason: format!("{} buckets exceeds the limit of {}", bucket_count, MAX_BUCKETS),
        });
    }

    let mut counts = vec![0usize; bucket_count];
    for value in numeric_values(table, column)? {
        if value < start || value >= end {
            continue;
        }
        let slot = (((value - start) / width).floor() as usize).min(bucket_count - 1);
        counts[slot] += 1;
    }

    let mut series = Series::new(vec![column.to_string()], "Count");
    series.points = counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let lo = start + i as f64 * width;
            let hi = (lo + width).min(end);
            SeriesPoint {
                key: vec![Cell::Number((lo + hi) / 2.0)],
                value: count as f64,
            }
        })
        .collect();
    Ok(series)
}

fn sort_points(points: &mut [SeriesPoint], order: SeriesOrder) {
    match order {
        SeriesOrder::FirstAppearance => {}
        SeriesOrder::KeyAscending => points.sort_by(|a, b| a.key.cmp(&b.key)),
        SeriesOrder::ValueDescending => points.sort_by(|a, b| b.value.total_cmp(&a.value)),
    }
}
