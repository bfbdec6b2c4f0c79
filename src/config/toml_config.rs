use crate::core::export::OUTPUT_FORMATS;
use crate::core::loader::SUPPORTED_EXTENSIONS;
use crate::core::ConfigProvider;
use crate::domain::model::{BucketSpec, Category};
use crate::utils::error::{DashboardError, Result};
use crate::utils::logger::LOG_LEVELS;
use crate::utils::validation::{
    validate_bucket_spec, validate_file_extension, validate_non_empty_string, validate_one_of,
    validate_path, validate_required_field, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub dashboard: DashboardSection,
    pub input: InputSection,
    pub histogram: Option<HistogramSection>,
    pub output: OutputSection,
    pub logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSection {
    pub name: Option<String>,
    pub category: Category,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSection {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramSection {
    pub bucket_width: Option<f64>,
    pub range_start: Option<f64>,
    pub range_end: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    pub path: String,
    pub formats: Vec<String>,
    pub compression: Option<CompressionSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionSection {
    pub enabled: bool,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    pub level: Option<String>,
    pub format: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DashboardError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| DashboardError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})，未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        if let Some(name) = &self.dashboard.name {
            validate_non_empty_string("dashboard.name", name)?;
        }

        validate_path("input.path", &self.input.path)?;
        validate_file_extension("input.path", &self.input.path, &SUPPORTED_EXTENSIONS)?;

        validate_path("output.path", &self.output.path)?;
        if self.output.formats.is_empty() {
            return Err(DashboardError::MissingConfigError {
                field: "output.formats".to_string(),
            });
        }
        validate_one_of("output.formats", &self.output.formats, &OUTPUT_FORMATS)?;

        if let Some(compression) = self.output.compression.as_ref().filter(|c| c.enabled) {
            let filename = validate_required_field("output.compression.filename", &compression.filename)?;
            validate_file_extension("output.compression.filename", filename, &["zip"])?;
        }

        if let Some(logging) = &self.logging {
            if let Some(format) = &logging.format {
                validate_one_of("logging.format", std::slice::from_ref(format), &["text", "json"])?;
            }
            if let Some(level) = &logging.level {
                validate_one_of(
                    "logging.level",
                    std::slice::from_ref(level),
                    &LOG_LEVELS,
                )?;
            }
        }

        validate_bucket_spec("histogram", &self.age_histogram())
    }

    /// 取得儀表板名稱，未設定時使用類別標題
    pub fn dashboard_name(&self) -> String {
        self.dashboard
            .name
            .clone()
            .unwrap_or_else(|| self.dashboard.category.title().to_string())
    }

    pub fn log_format(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.format.as_deref())
            .unwrap_or("text")
    }

    /// 日誌等級，未設定時為 info
    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or("info")
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn category(&self) -> Category {
        self.dashboard.category
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn output_formats(&self) -> &[String] {
        &self.output.formats
    }

    fn compress(&self) -> bool {
        self.output
            .compression
            .as_ref()
            .map(|c| c.enabled)
            .unwrap_or(false)
    }

    fn archive_name(&self) -> String {
        self.output
            .compression
            .as_ref()
            .and_then(|c| c.filename.clone())
            .unwrap_or_else(|| format!("{}_dashboard.zip", self.dashboard.category))
    }

    fn age_histogram(&self) -> BucketSpec {
        let defaults = BucketSpec::default();
        match &self.histogram {
            Some(h) => BucketSpec {
                width: h.bucket_width.unwrap_or(defaults.width),
                start: h.range_start.unwrap_or(defaults.start),
                end: h.range_end.unwrap_or(defaults.end),
            },
            None => defaults,
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
