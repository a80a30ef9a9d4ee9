use thiserror::Error;

/// 單次 HTTP 擷取的失敗原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Connection to {url} failed: {message}")]
    Connection { url: String, message: String },

    #[error("Malformed response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Response from {url} is missing required field '{field}'")]
    PartialRecord { url: String, field: String },
}

impl FetchError {
    /// 將 reqwest 錯誤歸類到對應的失敗原因
    pub fn from_reqwest(url: &str, err: &reqwest::Error) -> Self {
        let url = url.to_string();
        if err.is_timeout() {
            FetchError::Timeout { url }
        } else if let Some(status) = err.status() {
            FetchError::Http {
                url,
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            FetchError::Decode {
                url,
                message: err.to_string(),
            }
        } else {
            FetchError::Connection {
                url,
                message: err.to_string(),
            }
        }
    }

    /// 讀取回應 body 時的錯誤；連線中斷與逾時之外都視為連線失敗
    pub fn from_body_read(url: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Connection {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }

    pub fn url(&self) -> &str {
        match self {
            FetchError::Http { url, .. }
            | FetchError::Timeout { url }
            | FetchError::Connection { url, .. }
            | FetchError::Decode { url, .. }
            | FetchError::PartialRecord { url, .. } => url,
        }
    }

    /// 簡短的原因標籤，用於日誌
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Http { .. } => "http",
            FetchError::Timeout { .. } => "timeout",
            FetchError::Connection { .. } => "connection",
            FetchError::Decode { .. } => "decode",
            FetchError::PartialRecord { .. } => "partial_record",
        }
    }
}

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Catalog fetch failed: {0}")]
    CatalogFetch(#[source] FetchError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Chart rendering error: {message}")]
    ChartError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::CatalogFetch(FetchError::Timeout { .. })
            | EtlError::CatalogFetch(FetchError::Connection { .. }) => ErrorSeverity::Medium,
            EtlError::CatalogFetch(_) => ErrorSeverity::High,
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ChartError { .. } => ErrorSeverity::High,
            EtlError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::CatalogFetch(FetchError::Timeout { .. }) => {
                "The catalog endpoint is slow; raise --timeout-secs or try again later"
            }
            EtlError::CatalogFetch(FetchError::Connection { .. }) => {
                "Check network connectivity and the --base-url value"
            }
            EtlError::CatalogFetch(_) => {
                "Verify that --base-url points at a PokeAPI-compatible server"
            }
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => "Fix the configuration value and rerun",
            EtlError::IoError(_) => "Check that the output directory is writable",
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ChartError { .. } => "Rerun with --verbose and inspect the log file",
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
