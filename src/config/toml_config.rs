use crate::adapters::http::DEFAULT_TIMEOUT;
use crate::config::DEFAULT_BASE_URL;
use crate::core::aggregate::DEFAULT_TOP_N;
use crate::core::collector::{DEFAULT_CONCURRENCY, DEFAULT_PROGRESS_EVERY};
use crate::domain::ports::{ConfigProvider, OutputFiles};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_settings, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub source: SourceConfig,
    pub extract: Option<ExtractConfig>,
    pub report: Option<ReportConfig>,
    pub load: LoadConfig,
    pub logging: Option<LoggingConfig>,

    #[serde(skip)]
    files: OutputFiles,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub base_url: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    pub concurrency: Option<usize>,
    pub progress_every: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub top_n: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_dir: String,
    pub chart_file: Option<String>,
    pub top_file: Option<String>,
    pub stats_file: Option<String>,
    /// 空字串表示不輸出完整資料表
    pub dataset_file: Option<String>,
    /// 空字串表示不輸出執行摘要
    pub summary_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub file: Option<String>,
    pub level: Option<String>,
    pub json: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        let mut config: TomlConfig =
            toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;
        config.files = config.resolve_output_files();
        Ok(config)
    }

    /// 替換環境變數 (例如 ${POKEAPI_BASE_URL})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    fn resolve_output_files(&self) -> OutputFiles {
        let defaults = OutputFiles::default();
        let optional = |value: &Option<String>, default: Option<String>| match value {
            Some(name) if name.is_empty() => None,
            Some(name) => Some(name.clone()),
            None => default,
        };

        OutputFiles {
            chart: self.load.chart_file.clone().unwrap_or(defaults.chart),
            top: self.load.top_file.clone().unwrap_or(defaults.top),
            stats: self.load.stats_file.clone().unwrap_or(defaults.stats),
            dataset: optional(&self.load.dataset_file, defaults.dataset),
            summary: optional(&self.load.summary_file, defaults.summary),
            log: self
                .logging
                .as_ref()
                .and_then(|l| l.file.clone())
                .unwrap_or(defaults.log),
        }
    }
}

impl ConfigProvider for TomlConfig {
    fn base_url(&self) -> &str {
        self.source.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    fn catalog_limit(&self) -> u32 {
        self.source.limit.unwrap_or(100)
    }

    fn catalog_offset(&self) -> u32 {
        self.source.offset.unwrap_or(0)
    }

    fn request_timeout(&self) -> Duration {
        self.source
            .timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    fn concurrency(&self) -> usize {
        self.extract
            .as_ref()
            .and_then(|e| e.concurrency)
            .unwrap_or(DEFAULT_CONCURRENCY)
    }

    fn progress_every(&self) -> usize {
        self.extract
            .as_ref()
            .and_then(|e| e.progress_every)
            .unwrap_or(DEFAULT_PROGRESS_EVERY)
    }

    fn top_n(&self) -> usize {
        self.report.as_ref().and_then(|r| r.top_n).unwrap_or(DEFAULT_TOP_N)
    }

    fn output_dir(&self) -> &str {
        &self.load.output_dir
    }

    fn output_files(&self) -> &OutputFiles {
        &self.files
    }

    fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_settings(self)
    }
}
