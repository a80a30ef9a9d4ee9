use crate::domain::model::{CatalogEntry, Extraction, FetchOutcome, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// 輸出檔案的寫入端；路徑相對於輸出目錄
pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn catalog_limit(&self) -> u32;
    fn catalog_offset(&self) -> u32;
    fn request_timeout(&self) -> Duration;
    fn concurrency(&self) -> usize;
    fn progress_every(&self) -> usize;
    fn top_n(&self) -> usize;
    fn output_dir(&self) -> &str;
    fn output_files(&self) -> &OutputFiles;

    /// 日誌等級覆寫，例如 `"poke_etl=debug"`
    fn log_level(&self) -> Option<&str> {
        None
    }

    fn json_logs(&self) -> bool {
        false
    }

    /// 目錄頁 URL，例如 `{base_url}/pokemon?limit=100&offset=0`
    fn catalog_url(&self) -> String {
        format!(
            "{}/pokemon?limit={}&offset={}",
            self.base_url().trim_end_matches('/'),
            self.catalog_limit(),
            self.catalog_offset()
        )
    }
}

/// 輸出檔名，皆相對於輸出目錄
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OutputFiles {
    pub chart: String,
    pub top: String,
    pub stats: String,
    pub dataset: Option<String>,
    pub summary: Option<String>,
    pub log: String,
}

impl Default for OutputFiles {
    fn default() -> Self {
        Self {
            chart: "type_distribution.png".to_string(),
            top: "top5_base_experience.csv".to_string(),
            stats: "type_stats.csv".to_string(),
            dataset: Some("pokemon.csv".to_string()),
            summary: Some("run_summary.json".to_string()),
            log: "pipeline.log".to_string(),
        }
    }
}

/// 單筆詳細資料的來源；Collector 透過它分派工作
#[async_trait]
pub trait DetailSource: Send + Sync + 'static {
    async fn fetch(&self, entry: &CatalogEntry) -> FetchOutcome;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Extraction>;
    async fn transform(&self, data: Extraction) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<Vec<String>>;
}
