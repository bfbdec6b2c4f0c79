use serde::Serialize;
use thiserror::Error;

/// Failures of a single aggregation. One view failing never stops the others.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregationError {
    #[error("Column not found: '{column}'")]
    ColumnNotFound { column: String },

    #[error("Column '{column}' is not numeric: row {row} holds '{value}'")]
    NonNumericColumn {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Unparseable date in column '{column}', row {row}: '{value}'")]
    UnparseableDate {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Column '{column}' has no numeric values to average")]
    NoNumericValues { column: String },

    #[error("Invalid grouping: {reason}")]
    InvalidGrouping { reason: String },

    #[error("Invalid histogram buckets: {reason}")]
    InvalidBuckets { reason: String },

    #[error("Column '{column}' has {actual} values, the table has {expected} rows")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
}

impl AggregationError {
    pub fn column_not_found(column: &str) -> Self {
        Self::ColumnNotFound {
            column: column.to_string(),
        }
    }

    /// 短代碼，供報表與 CSV 輸出使用
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ColumnNotFound { .. } => "column_not_found",
            Self::NonNumericColumn { .. } => "non_numeric_column",
            Self::UnparseableDate { .. } => "unparseable_date",
            Self::NoNumericValues { .. } => "no_numeric_values",
            Self::InvalidGrouping { .. } => "invalid_grouping",
            Self::InvalidBuckets { .. } => "invalid_buckets",
            Self::ColumnLengthMismatch { .. } => "column_length_mismatch",
        }
    }
}

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Aggregation error: {0}")]
    AggregationError(#[from] AggregationError),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: '{field}'")]
    MissingConfigError { field: String },

    #[error("Failed to load table: {message}")]
    LoadError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Aggregation,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DashboardError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::CsvError(_) | Self::LoadError { .. } => ErrorCategory::Input,
            Self::AggregationError(_) => ErrorCategory::Aggregation,
            Self::ZipError(_) | Self::IoError(_) | Self::SerializationError(_) => {
                ErrorCategory::Output
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單一視圖失敗不影響整份報表
            Self::AggregationError(AggregationError::UnparseableDate { .. }) => ErrorSeverity::Low,
            Self::AggregationError(_) => ErrorSeverity::Medium,
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::CsvError(_)
            | Self::LoadError { .. } => ErrorSeverity::High,
            Self::ZipError(_) | Self::IoError(_) | Self::SerializationError(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::ZipError(_) => "Check free disk space or disable compression".to_string(),
            Self::CsvError(_) => {
                "Make sure the file is valid CSV/TSV with a single header row".to_string()
            }
            Self::IoError(_) => "Check that the input file exists and the output path is writable"
                .to_string(),
            Self::SerializationError(_) => "Report the data that triggered this failure".to_string(),
            Self::AggregationError(AggregationError::ColumnNotFound { column }) => format!(
                "Add a '{}' column to the input or pick the matching data category",
                column
            ),
            Self::AggregationError(AggregationError::NonNumericColumn { column, row, .. }) => {
                format!("Fix the value at row {} of '{}' so it is a number", row, column)
            }
            Self::AggregationError(AggregationError::UnparseableDate { column, .. }) => format!(
                "Use ISO dates (YYYY-MM-DD) in '{}' to include every row in monthly views",
                column
            ),
            Self::AggregationError(_) => "Check the dashboard settings".to_string(),
            Self::ConfigValidationError { field, .. }
            | Self::InvalidConfigValueError { field, .. } => {
                format!("Correct '{}' in the configuration", field)
            }
            Self::MissingConfigError { field } => format!("Provide a value for '{}'", field),
            Self::LoadError { .. } => {
                "Upload a .csv, .tsv or .json file containing the expected columns".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Input => format!("Could not read the uploaded data: {}", self),
            ErrorCategory::Aggregation => format!("Could not compute a dashboard view: {}", self),
            ErrorCategory::Output => format!("Could not write the dashboard output: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
