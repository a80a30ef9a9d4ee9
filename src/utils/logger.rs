use crate::utils::error::{EtlError, Result};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::dispatcher::DefaultGuard;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

#[derive(Debug, Clone, Default)]
pub struct LoggerConfig {
    /// 日誌檔位置；`None` 時只輸出到 console
    pub log_path: Option<PathBuf>,
    pub verbose: bool,
    pub json: bool,
    /// EnvFilter 語法，例如 `"poke_etl=debug,info"`
    pub level: Option<String>,
}

/// 執行期間有效的日誌 handle。
///
/// 建立後成為目前執行緒的預設 subscriber；drop 時恢復原本設定並把日誌檔寫入磁碟。
/// 需要跨 task 記錄時，spawn 的 future 要搭配 `with_current_subscriber()`。
pub struct LoggerGuard {
    _default: DefaultGuard,
    file: Option<Arc<File>>,
    log_path: Option<PathBuf>,
}

impl LoggerGuard {
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            let _ = file.sync_all();
        }
    }
}

fn build_filter(config: &LoggerConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directives = match (&config.level, config.verbose) {
        (Some(level), _) => level.clone(),
        (None, true) => "poke_etl=debug,info".to_string(),
        (None, false) => "poke_etl=info".to_string(),
    };

    EnvFilter::try_new(&directives).map_err(|e| EtlError::ConfigValidationError {
        field: "logging.level".to_string(),
        message: format!("Invalid log filter '{}': {}", directives, e),
    })
}

/// 建立 console + 檔案雙輸出的日誌 handle
pub fn init_pipeline_logger(config: &LoggerConfig) -> Result<LoggerGuard> {
    let filter = build_filter(config)?;

    let file = match &config.log_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(Arc::new(file))
        }
        None => None,
    };

    let file_layer = file.clone().map(|file| {
        tracing_subscriber::fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(false)
    });

    let console_layer = (!config.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
    });

    let json_layer = config.json.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .json()
    });

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .with(file_layer);

    let default = tracing::subscriber::set_default(subscriber);

    Ok(LoggerGuard {
        _default: default,
        file,
        log_path: config.log_path.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_logger_writes_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("logs").join("pipeline.log");
        let config = LoggerConfig {
            log_path: Some(log_path.clone()),
            level: Some("info".to_string()),
            ..LoggerConfig::default()
        };

        {
            let guard = init_pipeline_logger(&config).unwrap();
            assert_eq!(guard.log_path(), Some(log_path.as_path()));
            tracing::info!("logger smoke test");
            tracing::debug!("filtered out");
        }

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("logger smoke test"));
        if std::env::var("RUST_LOG").is_err() {
            assert!(!content.contains("filtered out"));
        }
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        let config = LoggerConfig {
            level: Some("poke_etl=notalevel".to_string()),
            ..LoggerConfig::default()
        };
        if std::env::var("RUST_LOG").is_err() {
            assert!(init_pipeline_logger(&config).is_err());
        }
    }
}
