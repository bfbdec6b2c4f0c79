use crate::core::export::OUTPUT_FORMATS;
use crate::core::loader::SUPPORTED_EXTENSIONS;
use crate::domain::model::{BucketSpec, Category};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{DashboardError, Result};
use crate::utils::validation::{
    validate_bucket_spec, validate_file_extension, validate_one_of, validate_path, Validate,
};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "voyage-value")]
#[command(about = "Aggregate employee, travel and expense tables into dashboard views")]
pub struct CliConfig {
    /// Input table (.csv, .tsv or .json)
    #[arg(short, long)]
    pub input: String,

    #[arg(short, long, value_enum, default_value = "employee")]
    pub category: Category,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, value_delimiter = ',', default_value = "json,csv")]
    pub formats: Vec<String>,

    /// Bundle every output file into one ZIP archive
    #[arg(long)]
    pub zip: bool,

    #[arg(long, default_value_t = 2.0)]
    pub age_bucket_width: f64,

    #[arg(long, default_value_t = 20.0)]
    pub age_range_start: f64,

    #[arg(long, default_value_t = 58.0)]
    pub age_range_end: f64,

    /// Log output: text or json
    #[arg(long, default_value = "text")]
    pub log_format: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn category(&self) -> Category {
        self.category
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.formats
    }

    fn compress(&self) -> bool {
        self.zip
    }

    fn age_histogram(&self) -> BucketSpec {
        BucketSpec {
            width: self.age_bucket_width,
            start: self.age_range_start,
            end: self.age_range_end,
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input", &self.input)?;
        validate_file_extension("input", &self.input, &SUPPORTED_EXTENSIONS)?;
        validate_path("output_path", &self.output_path)?;

        if self.formats.is_empty() {
            return Err(DashboardError::MissingConfigError {
                field: "formats".to_string(),
            });
        }
        validate_one_of("formats", &self.formats, &OUTPUT_FORMATS)?;
        validate_one_of("log_format", std::slice::from_ref(&self.log_format), &["text", "json"])?;
        validate_bucket_spec("age", &self.age_histogram())
    }
}
