use crate::domain::model::Cell;
use serde::Serialize;
use std::fmt;

/// How a scalar is shown. The engine keeps the exact value; truncation only
/// happens when formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Count,
    Days,
    Miles,
    Dollars,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scalar {
    pub label: String,
    pub value: f64,
    pub unit: Unit,
}

impl Scalar {
    pub fn new(label: impl Into<String>, value: f64, unit: Unit) -> Self {
        Self {
            label: label.into(),
            value,
            unit,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.value.trunc() as i64;
        match self.unit {
            Unit::Count | Unit::Days => write!(f, "{}", whole),
            Unit::Miles => write!(f, "{} miles", whole),
            Unit::Dollars => write!(f, "$ {}", whole),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub key: Vec<Cell>,
    pub value: f64,
}

/// Grouped values ready for charting. `dimensions` names each element of a
/// point's key, `measure` names the value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub dimensions: Vec<String>,
    pub measure: String,
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn new(dimensions: Vec<String>, measure: impl Into<String>) -> Self {
        Self {
            dimensions,
            measure: measure.into(),
            points: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, key: &[Cell]) -> Option<f64> {
        self.points
            .iter()
            .find(|p| p.key.as_slice() == key)
            .map(|p| p.value)
    }

    /// Looks a point up by the display form of its key.
    pub fn find(&self, key: &[&str]) -> Option<f64> {
        self.points
            .iter()
            .find(|p| {
                p.key.len() == key.len()
                    && p.key.iter().zip(key).all(|(cell, wanted)| cell.to_string() == *wanted)
            })
            .map(|p| p.value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &[Cell]> {
        self.points.iter().map(|p| p.key.as_slice())
    }

    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.value).sum()
    }
}

/// One derived value of a dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum View {
    Scalar(Scalar),
    Series(Series),
}

impl View {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            View::Scalar(scalar) => Some(scalar),
            View::Series(_) => None,
        }
    }

    pub fn as_series(&self) -> Option<&Series> {
        match self {
            View::Series(series) => Some(series),
            View::Scalar(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_display_truncates() {
        assert_eq!(Scalar::new("Average Cost Per Trip", 1234.99, Unit::Dollars).to_string(), "$ 1234");
        assert_eq!(Scalar::new("Total Distance Travelled", 5300.0, Unit::Miles).to_string(), "5300 miles");
        assert_eq!(Scalar::new("Average Duration of trips", 6.8, Unit::Days).to_string(), "6");
    }

    #[test]
    fn test_series_lookup() {
        let mut series = Series::new(vec!["Department".to_string()], "Count");
        series.points.push(SeriesPoint {
            key: vec![Cell::text("Sales")],
            value: 3.0,
        });
        series.points.push(SeriesPoint {
            key: vec![Cell::Number(21.0)],
            value: 2.0,
        });

        assert_eq!(series.find(&["Sales"]), Some(3.0));
        assert_eq!(series.find(&["21"]), Some(2.0));
        assert_eq!(series.get(&[Cell::text("Sales")]), Some(3.0));
        assert_eq!(series.find(&["HR"]), None);
        assert_eq!(series.total(), 5.0);
    }

    #[test]
    fn test_view_serializes_with_type_tag() {
        let view = View::Scalar(Scalar::new("Number of Trips", 4.0, Unit::Count));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["type"], "scalar");
        assert_eq!(json["unit"], "count");
        assert_eq!(json["value"], 4.0);
    }
}
