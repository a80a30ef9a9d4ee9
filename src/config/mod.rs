pub mod toml_config;

use crate::adapters::http::DEFAULT_TIMEOUT;
use crate::core::aggregate::DEFAULT_TOP_N;
use crate::core::collector::{DEFAULT_CONCURRENCY, DEFAULT_PROGRESS_EVERY};
use crate::domain::ports::{ConfigProvider, OutputFiles};
use crate::utils::error::Result;
use crate::utils::validation::{validate_settings, Validate};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[cfg(feature = "cli")]
use clap::Parser;

pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

#[cfg_attr(feature = "cli", derive(Parser))]
#[cfg_attr(feature = "cli", command(name = "poke-etl"))]
#[cfg_attr(
    feature = "cli",
    command(about = "Fetch the PokeAPI catalog, aggregate stats by type and export reports")
)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Path to a TOML configuration file; replaces the options below
    #[cfg_attr(feature = "cli", arg(short, long))]
    pub config: Option<String>,

    #[cfg_attr(feature = "cli", arg(long, default_value = DEFAULT_BASE_URL))]
    pub base_url: String,

    #[cfg_attr(feature = "cli", arg(long, default_value = "100"))]
    pub limit: u32,

    #[cfg_attr(feature = "cli", arg(long, default_value = "0"))]
    pub offset: u32,

    #[cfg_attr(feature = "cli", arg(long, default_value = "5"))]
    pub concurrency: usize,

    #[cfg_attr(feature = "cli", arg(long, default_value = "15"))]
    pub timeout_secs: u64,

    #[cfg_attr(feature = "cli", arg(long, default_value = "./output"))]
    pub output_dir: String,

    #[cfg_attr(feature = "cli", arg(long, default_value = "5"))]
    pub top_n: usize,

    /// Log a progress line every N completed detail fetches
    #[cfg_attr(feature = "cli", arg(long, default_value = "25"))]
    pub progress_every: usize,

    #[cfg_attr(feature = "cli", arg(long, help = "Emit console logs as JSON"))]
    pub json_logs: bool,

    #[cfg_attr(feature = "cli", arg(short, long, help = "Enable verbose output"))]
    pub verbose: bool,

    #[cfg_attr(feature = "cli", arg(long, help = "Validate configuration without fetching"))]
    pub dry_run: bool,

    #[cfg_attr(feature = "cli", arg(skip))]
    #[serde(default)]
    pub output_files: OutputFiles,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            config: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            limit: 100,
            offset: 0,
            concurrency: DEFAULT_CONCURRENCY,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            output_dir: "./output".to_string(),
            top_n: DEFAULT_TOP_N,
            progress_every: DEFAULT_PROGRESS_EVERY,
            json_logs: false,
            verbose: false,
            dry_run: false,
            output_files: OutputFiles::default(),
        }
    }
}

impl ConfigProvider for CliConfig {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn catalog_limit(&self) -> u32 {
        self.limit
    }

    fn catalog_offset(&self) -> u32 {
        self.offset
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn concurrency(&self) -> usize {
        self.concurrency
    }

    fn progress_every(&self) -> usize {
        self.progress_every
    }

    fn top_n(&self) -> usize {
        self.top_n
    }

    fn output_dir(&self) -> &str {
        &self.output_dir
    }

    fn output_files(&self) -> &OutputFiles {
        &self.output_files
    }

    fn json_logs(&self) -> bool {
        self.json_logs
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_settings(self)
    }
}
