use crate::core::aggregate::MAX_BUCKETS;
use crate::domain::model::BucketSpec;
use crate::utils::error::{DashboardError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(DashboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(DashboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_file_extension(field_name: &str, file: &str, allowed_extensions: &[&str]) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    match std::path::Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(extension) if allowed_set.contains(extension.to_ascii_lowercase().as_str()) => Ok(()),
        Some(extension) => Err(DashboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                extension,
                allowed_extensions.join(", ")
            ),
        }),
        None => Err(DashboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| DashboardError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DashboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_one_of(field_name: &str, values: &[String], allowed: &[&str]) -> Result<()> {
    for value in values {
        if !allowed.contains(&value.as_str()) {
            return Err(DashboardError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: value.clone(),
                reason: format!("Unsupported value. Valid values: {}", allowed.join(", ")),
            });
        }
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(DashboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// Histogram settings: positive width, `start < end`, and a bounded bucket count.
pub fn validate_bucket_spec(field_prefix: &str, spec: &BucketSpec) -> Result<()> {
    if !(spec.width.is_finite() && spec.width > 0.0) {
        return Err(DashboardError::InvalidConfigValueError {
            field: format!("{}.bucket_width", field_prefix),
            value: spec.width.to_string(),
            reason: "Bucket width must be a positive number".to_string(),
        });
    }
    if !(spec.start.is_finite() && spec.end.is_finite() && spec.start < spec.end) {
        return Err(DashboardError::InvalidConfigValueError {
            field: format!("{}.range_end", field_prefix),
            value: spec.end.to_string(),
            reason: format!("Range end must be greater than range start ({})", spec.start),
        });
    }
    validate_range(
        &format!("{}.bucket_count", field_prefix),
        spec.bucket_count() as f64,
        1.0,
        MAX_BUCKETS as f64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("output.path", "./output").is_ok());
        assert!(validate_path("output.path", "").is_err());
        assert!(validate_path("output.path", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension("input.path", "travel.csv", &["csv", "tsv", "json"]).is_ok());
        assert!(validate_file_extension("input.path", "TRAVEL.CSV", &["csv"]).is_ok());
        assert!(validate_file_extension("input.path", "travel.xlsx", &["csv", "tsv"]).is_err());
        assert!(validate_file_extension("input.path", "travel", &["csv"]).is_err());
    }

    #[test]
    fn test_validate_one_of() {
        let formats = vec!["json".to_string(), "csv".to_string()];
        assert!(validate_one_of("output.formats", &formats, &["json", "csv"]).is_ok());

        let formats = vec!["xml".to_string()];
        assert!(validate_one_of("output.formats", &formats, &["json", "csv"]).is_err());
    }

    #[test]
    fn test_validate_bucket_spec() {
        assert!(validate_bucket_spec("histogram", &BucketSpec::default()).is_ok());

        let zero_width = BucketSpec { width: 0.0, ..BucketSpec::default() };
        assert!(validate_bucket_spec("histogram", &zero_width).is_err());

        let inverted = BucketSpec { width: 2.0, start: 58.0, end: 20.0 };
        assert!(validate_bucket_spec("histogram", &inverted).is_err());

        let too_many = BucketSpec { width: 0.0001, start: 0.0, end: 100.0 };
        assert!(validate_bucket_spec("histogram", &too_many).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("histogram.bucket_width", 2.0, 0.001, 1000.0).is_ok());
        assert!(validate_range("histogram.bucket_width", 0.0, 0.001, 1000.0).is_err());
    }
}
