use crate::adapters::http::PokeApiClient;
use crate::core::aggregate::aggregate;
use crate::core::collector::{collect, CollectorOptions};
use crate::core::report;
use crate::core::{ConfigProvider, Extraction, Pipeline, Storage, TransformResult};
use crate::domain::model::RunSummary;
use crate::utils::error::{EtlError, Result};
use std::sync::Arc;

/// 目錄 → 併發擷取 → 彙整 → 報表輸出
pub struct PokemonPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: Arc<PokeApiClient>,
}

impl<S: Storage, C: ConfigProvider> PokemonPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        let client = PokeApiClient::new(config.request_timeout());
        Self::with_client(storage, config, client)
    }

    pub fn with_client(storage: S, config: C, client: PokeApiClient) -> Self {
        Self {
            storage,
            config,
            client: Arc::new(client),
        }
    }

    fn output_path(&self, file_name: &str) -> String {
        format!(
            "{}/{}",
            self.config.output_dir().trim_end_matches('/'),
            file_name
        )
    }

    async fn write_output(
        &self,
        file_name: &str,
        data: &[u8],
        written: &mut Vec<String>,
    ) -> Result<()> {
        tracing::debug!("Writing {} ({} bytes) to storage", file_name, data.len());
        self.storage.write_file(file_name, data).await?;
        written.push(self.output_path(file_name));
        Ok(())
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for PokemonPipeline<S, C> {
    async fn extract(&self) -> Result<Extraction> {
        let started_at = chrono::Utc::now();
        let catalog_url = self.config.catalog_url();
        tracing::info!("🚀 Listing catalog from: {}", catalog_url);

        let entries = self.client.list_catalog(&catalog_url).await.map_err(|e| {
            tracing::error!(
                "❌ Catalog listing failed ({}) for {}: {}",
                e.kind(),
                e.url(),
                e
            );
            EtlError::CatalogFetch(e)
        })?;

        let catalog_entries = entries.len();
        let options = CollectorOptions {
            concurrency: self.config.concurrency(),
            progress_every: self.config.progress_every(),
        };
        let records = collect(Arc::clone(&self.client), entries, options).await;

        Ok(Extraction {
            catalog_entries,
            records,
            started_at,
        })
    }

    async fn transform(&self, data: Extraction) -> Result<TransformResult> {
        let catalog_entries = data.catalog_entries;
        let failed = data.failed();
        let started_at = data.started_at;

        let aggregation = aggregate(data.records, self.config.top_n());
        report::log_report(&aggregation);

        Ok(TransformResult {
            aggregation,
            catalog_entries,
            failed,
            started_at,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<Vec<String>> {
        let files = self.config.output_files();
        let aggregation = &result.aggregation;
        let mut written = Vec::new();

        let chart = report::render_chart(&aggregation.type_distribution())?;
        self.write_output(&files.chart, &chart, &mut written).await?;

        let top = report::top_csv(&aggregation.top)?;
        self.write_output(&files.top, &top, &mut written).await?;

        let stats = report::type_stats_csv(&aggregation.type_stats)?;
        self.write_output(&files.stats, &stats, &mut written).await?;

        if let Some(dataset_file) = &files.dataset {
            let dataset = report::dataset_csv(&aggregation.table)?;
            self.write_output(dataset_file, &dataset, &mut written).await?;
        }

        if let Some(summary_file) = &files.summary {
            let summary = RunSummary {
                started_at: result.started_at,
                finished_at: chrono::Utc::now(),
                catalog_entries: result.catalog_entries,
                succeeded: result.catalog_entries - result.failed,
                failed: result.failed,
                table_rows: aggregation.table.len(),
                distinct_types: aggregation.type_count.len(),
                type_count: aggregation.type_count.clone(),
                category_count: aggregation
                    .category_count
                    .iter()
                    .map(|(category, count)| (category.to_string(), *count))
                    .collect(),
                outputs: written.clone(),
            };
            let json = report::run_summary_json(&summary)?;
            self.write_output(summary_file, &json, &mut written).await?;
        }

        tracing::info!(
            "💾 Wrote {} output files to {}",
            written.len(),
            self.config.output_dir()
        );
        Ok(written)
    }
}
