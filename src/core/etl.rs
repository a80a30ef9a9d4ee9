use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// 依序執行 extract → transform → load，回傳寫出的檔案路徑
    pub async fn run(&self) -> Result<Vec<String>> {
        let started = Instant::now();
        tracing::info!("🚀 Starting ETL process...");

        // Extract
        let phase = Instant::now();
        let extraction = self.pipeline.extract().await?;
        tracing::info!(
            "📥 Extracted {} of {} catalog entries in {:.2?}",
            extraction.records.len(),
            extraction.catalog_entries,
            phase.elapsed()
        );

        // Transform
        let phase = Instant::now();
        let transformed = self.pipeline.transform(extraction).await?;
        tracing::info!(
            "🔄 Aggregated {} rows into {} types in {:.2?}",
            transformed.aggregation.table.len(),
            transformed.aggregation.type_count.len(),
            phase.elapsed()
        );

        // Load
        let phase = Instant::now();
        let outputs = self.pipeline.load(transformed).await?;
        tracing::info!("💾 Load finished in {:.2?}", phase.elapsed());
        for path in &outputs {
            tracing::debug!("Output saved to: {}", path);
        }

        tracing::info!("✅ ETL process completed in {:.2?}", started.elapsed());
        Ok(outputs)
    }
}
