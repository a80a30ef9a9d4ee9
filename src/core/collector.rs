use crate::domain::model::{CatalogEntry, FetchOutcome, PokemonRecord};
use crate::domain::ports::DetailSource;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::instrument::WithSubscriber;

pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_PROGRESS_EVERY: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorOptions {
    /// 同時進行的擷取數上限
    pub concurrency: usize,
    /// 每完成幾筆記錄一次進度；0 表示只記錄最終摘要
    pub progress_every: usize,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }
}

/// 併發擷取所有項目的詳細資料，只回傳成功的記錄。
///
/// 每個項目一個 task，全部先派出去，由 semaphore 限制同時執行的數量；
/// 結果經 mpsc channel 回到這裡彙整。單筆失敗只記錄日誌，不會中止整批。
/// 回傳順序不保證，排序交給 aggregator。
pub async fn collect<D: DetailSource>(
    source: Arc<D>,
    entries: Vec<CatalogEntry>,
    options: CollectorOptions,
) -> Vec<PokemonRecord> {
    let total = entries.len();
    if total == 0 {
        tracing::warn!("🔶 No catalog entries to collect");
        return Vec::new();
    }

    let width = options.concurrency.max(1);
    tracing::info!(
        "📡 Dispatching {} detail fetches with concurrency={}",
        total,
        width
    );

    let semaphore = Arc::new(Semaphore::new(width));
    let (tx, mut rx) = mpsc::channel::<FetchOutcome>(total);

    for entry in entries {
        let semaphore = Arc::clone(&semaphore);
        let source = Arc::clone(&source);
        let tx = tx.clone();

        let task = async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::error!(
                        "Failed to acquire worker slot for {}: {}",
                        entry.detail_url,
                        e
                    );
                    return;
                }
            };

            let outcome = source.fetch(&entry).await;
            // 接收端只會在 collect 被取消時關閉
            let _ = tx.send(outcome).await;
        };

        tokio::spawn(task.with_current_subscriber());
    }
    drop(tx);

    let mut records = Vec::with_capacity(total);
    let mut completed = 0usize;
    let mut failed = 0usize;

    while let Some(outcome) = rx.recv().await {
        completed += 1;

        match outcome {
            FetchOutcome::Success(record) => records.push(record),
            FetchOutcome::Failure { reason, source_url } => {
                failed += 1;
                tracing::error!(
                    "❌ Detail fetch failed ({}) for {}: {}",
                    reason.kind(),
                    source_url,
                    reason
                );
            }
        }

        if options.progress_every > 0 && completed % options.progress_every == 0 {
            tracing::info!(
                "📡 Progress: {}/{} detail fetches completed ({} failed)",
                completed,
                total,
                failed
            );
        }
    }

    if completed < total {
        tracing::warn!(
            "🔶 {} of {} fetch tasks ended without reporting an outcome",
            total - completed,
            total
        );
    }

    tracing::info!(
        "✅ Collection finished: {} succeeded, {} failed, {} dispatched",
        records.len(),
        failed,
        total
    );

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::FetchError;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// 依 URL 決定成功或失敗的假資料來源，並記錄同時執行數與完成順序
    struct StubSource {
        failing: HashSet<String>,
        slow: HashSet<String>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        completion_order: Mutex<Vec<String>>,
    }

    impl StubSource {
        fn new() -> Self {
            Self {
                failing: HashSet::new(),
                slow: HashSet::new(),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                completion_order: Mutex::new(Vec::new()),
            }
        }

        fn failing(mut self, urls: &[&str]) -> Self {
            self.failing.extend(urls.iter().map(|u| u.to_string()));
            self
        }

        fn slow(mut self, urls: &[&str]) -> Self {
            self.slow.extend(urls.iter().map(|u| u.to_string()));
            self
        }
    }

    #[async_trait::async_trait]
    impl DetailSource for StubSource {
        async fn fetch(&self, entry: &CatalogEntry) -> FetchOutcome {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let delay = if self.slow.contains(&entry.detail_url) { 200 } else { 10 };
            tokio::time::sleep(Duration::from_millis(delay)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.completion_order
                .lock()
                .unwrap()
                .push(entry.detail_url.clone());

            if self.failing.contains(&entry.detail_url) {
                return FetchOutcome::Failure {
                    reason: FetchError::Http {
                        url: entry.detail_url.clone(),
                        status: 500,
                    },
                    source_url: entry.detail_url.clone(),
                };
            }

            let id: u32 = entry.name.trim_start_matches("mon-").parse().unwrap();
            FetchOutcome::Success(PokemonRecord {
                id,
                name: entry.name.clone(),
                base_experience: id * 10,
                types: vec!["normal".to_string()],
                hp: Some(id),
                attack: Some(id),
                defense: Some(id),
            })
        }
    }

    fn entries(n: u32) -> Vec<CatalogEntry> {
        (1..=n)
            .map(|i| CatalogEntry {
                name: format!("mon-{}", i),
                detail_url: format!("u{}", i),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_partial_failures_are_dropped() {
        let source = Arc::new(StubSource::new().failing(&["u2", "u5", "u9"]));

        let mut records = collect(source, entries(10), CollectorOptions::default()).await;

        assert_eq!(records.len(), 7);
        records.sort_by_key(|r| r.id);
        let ids: Vec<u32> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3, 4, 6, 7, 8, 10]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let source = Arc::new(StubSource::new());
        let options = CollectorOptions {
            concurrency: 3,
            progress_every: 5,
        };

        let records = collect(Arc::clone(&source), entries(20), options).await;

        assert_eq!(records.len(), 20);
        let max = source.max_in_flight.load(Ordering::SeqCst);
        assert!(max <= 3, "max in flight was {}", max);
        assert!(max >= 1);
    }

    #[tokio::test]
    async fn test_slow_fetch_does_not_block_later_entries() {
        let source = Arc::new(StubSource::new().slow(&["u1"]));
        let options = CollectorOptions {
            concurrency: 2,
            progress_every: 0,
        };

        let records = collect(Arc::clone(&source), entries(6), options).await;

        assert_eq!(records.len(), 6);
        let order = source.completion_order.lock().unwrap().clone();
        assert_eq!(order.len(), 6);
        assert_eq!(order.last().map(String::as_str), Some("u1"));
    }

    #[tokio::test]
    async fn test_empty_catalog_collects_nothing() {
        let source = Arc::new(StubSource::new());
        let records = collect(source, Vec::new(), CollectorOptions::default()).await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_progress_and_summary_are_logged() {
        use crate::utils::logger::{init_pipeline_logger, LoggerConfig};

        let temp_dir = tempfile::TempDir::new().unwrap();
        let log_path = temp_dir.path().join("pipeline.log");
        let config = LoggerConfig {
            log_path: Some(log_path.clone()),
            level: Some("info".to_string()),
            ..LoggerConfig::default()
        };

        let source = Arc::new(StubSource::new().failing(&["u7", "u21", "u42"]));
        let options = CollectorOptions {
            concurrency: 10,
            progress_every: DEFAULT_PROGRESS_EVERY,
        };

        let records = {
            let _guard = init_pipeline_logger(&config).unwrap();
            collect(source, entries(60), options).await
        };
        assert_eq!(records.len(), 57);

        if std::env::var("RUST_LOG").is_err() {
            let content = std::fs::read_to_string(&log_path).unwrap();
            let progress: Vec<&str> = content
                .lines()
                .filter(|line| line.contains("Progress:"))
                .collect();
            assert_eq!(progress.len(), 2, "progress lines: {:?}", progress);
            assert!(progress[0].contains("25/60"));
            assert!(progress[1].contains("50/60"));
            assert!(content.contains("Collection finished: 57 succeeded, 3 failed"));
            assert_eq!(content.matches("Detail fetch failed").count(), 3);
        }
    }
}
