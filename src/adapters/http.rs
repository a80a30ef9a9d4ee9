use crate::domain::model::{CatalogEntry, FetchOutcome, PokemonRecord};
use crate::domain::ports::DetailSource;
use crate::utils::error::FetchError;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// PokeAPI 用戶端：目錄頁與詳細資料都走同一個 reqwest Client
#[derive(Debug, Clone)]
pub struct PokeApiClient {
    client: Client,
    timeout: Duration,
}

impl PokeApiClient {
    pub fn new(timeout: Duration) -> Self {
        Self::with_client(Client::new(), timeout)
    }

    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// 取得目錄頁並轉成待擷取清單。不重試。
    pub async fn list_catalog(&self, page_url: &str) -> Result<Vec<CatalogEntry>, FetchError> {
        tracing::debug!("Making catalog request to: {}", page_url);
        let body = self.get_json(page_url).await?;
        let entries = parse_catalog(page_url, &body)?;
        tracing::info!("📋 Catalog listed {} entries", entries.len());
        Ok(entries)
    }

    /// 擷取單筆詳細資料，失敗一律轉成 `FetchOutcome::Failure`
    pub async fn fetch_outcome(&self, url: &str) -> FetchOutcome {
        let result = match self.get_json(url).await {
            Ok(body) => parse_detail(url, &body),
            Err(e) => Err(e),
        };

        match result {
            Ok(record) => FetchOutcome::Success(record),
            Err(reason) => FetchOutcome::Failure {
                reason,
                source_url: url.to_string(),
            },
        }
    }

    /// 與 `fetch_outcome` 相同，但失敗時記錄錯誤並回傳 `None`
    pub async fn fetch_detail(&self, url: &str) -> Option<PokemonRecord> {
        match self.fetch_outcome(url).await {
            FetchOutcome::Success(record) => Some(record),
            FetchOutcome::Failure { reason, source_url } => {
                tracing::error!(
                    "❌ Detail fetch failed ({}) for {}: {}",
                    reason.kind(),
                    source_url,
                    reason
                );
                None
            }
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e))?;

        let status = response.status();
        tracing::debug!("API response status: {} ({})", status, url);

        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // 讀取 body 失敗屬於傳輸問題；JSON 格式錯誤才是 Decode
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_body_read(url, &e))?;

        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl DetailSource for PokeApiClient {
    async fn fetch(&self, entry: &CatalogEntry) -> FetchOutcome {
        self.fetch_outcome(&entry.detail_url).await
    }
}

/// 解析 `{results: [{name, url}, ...]}`；缺少 name 或 url 的項目直接略過
pub fn parse_catalog(url: &str, body: &Value) -> Result<Vec<CatalogEntry>, FetchError> {
    let results = body
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::Decode {
            url: url.to_string(),
            message: "missing 'results' array".to_string(),
        })?;

    let mut entries = Vec::with_capacity(results.len());
    for item in results {
        let name = item.get("name").and_then(Value::as_str);
        let detail_url = item
            .get("url")
            .and_then(Value::as_str)
            .filter(|u| !u.is_empty());

        match (name, detail_url) {
            (Some(name), Some(detail_url)) => entries.push(CatalogEntry {
                name: name.to_string(),
                detail_url: detail_url.to_string(),
            }),
            (None, _) => tracing::debug!("Skipping catalog entry without name: {:?}", item),
            (_, None) => tracing::debug!("Skipping catalog entry without url: {:?}", item),
        }
    }

    Ok(entries)
}

/// 解析單筆詳細資料。
///
/// `id`、`name`、`base_experience` 缺一即視為 `PartialRecord`；
/// 找不到的 hp/attack/defense 保留為 `None`。
pub fn parse_detail(url: &str, body: &Value) -> Result<PokemonRecord, FetchError> {
    if !body.is_object() {
        return Err(FetchError::Decode {
            url: url.to_string(),
            message: "expected a JSON object".to_string(),
        });
    }

    let missing = |field: &str| FetchError::PartialRecord {
        url: url.to_string(),
        field: field.to_string(),
    };

    let id = body
        .get("id")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| missing("id"))?;

    let name = body
        .get("name")
        .and_then(Value::as_str)
        .map(title_case)
        .ok_or_else(|| missing("name"))?;

    let base_experience = body
        .get("base_experience")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| missing("base_experience"))?;

    let types = body
        .get("types")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|t| t.pointer("/type/name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let mut hp = None;
    let mut attack = None;
    let mut defense = None;
    if let Some(stats) = body.get("stats").and_then(Value::as_array) {
        for stat in stats {
            let value = stat
                .get("base_stat")
                .and_then(Value::as_u64)
                .and_then(|v| u32::try_from(v).ok());
            match stat.pointer("/stat/name").and_then(Value::as_str) {
                Some("hp") => hp = value,
                Some("attack") => attack = value,
                Some("defense") => defense = value,
                _ => {}
            }
        }
    }

    Ok(PokemonRecord {
        id,
        name,
        base_experience,
        types,
        hp,
        attack,
        defense,
    })
}

/// "PIKACHU" -> "Pikachu"
pub fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
