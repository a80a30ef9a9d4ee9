use crate::utils::error::FetchError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 目錄頁中的一筆待擷取項目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub detail_url: String,
}

/// 正規化後的寶可夢資料。
///
/// `hp`、`attack`、`defense` 為 `None` 代表來源沒有提供該數值（未知），
/// 不會被當作 0 參與平均計算。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonRecord {
    pub id: u32,
    pub name: String,
    pub base_experience: u32,
    pub types: Vec<String>,
    pub hp: Option<u32>,
    pub attack: Option<u32>,
    pub defense: Option<u32>,
}

/// 單次詳細資料擷取的結果
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Success(PokemonRecord),
    Failure {
        reason: FetchError,
        source_url: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Weak,
    Medium,
    Strong,
}

impl Category {
    /// 50 與 100 都屬於 Medium
    pub fn from_base_experience(base_experience: u32) -> Self {
        if base_experience < 50 {
            Category::Weak
        } else if base_experience <= 100 {
            Category::Medium
        } else {
            Category::Strong
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Weak => "Weak",
            Category::Medium => "Medium",
            Category::Strong => "Strong",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PokemonRow {
    pub record: PokemonRecord,
    pub category: Category,
}

/// 依 id 遞增排序且 id 唯一的資料表
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PokemonTable {
    rows: Vec<PokemonRow>,
}

impl PokemonTable {
    pub(crate) fn from_sorted_rows(rows: Vec<PokemonRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[PokemonRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// 各屬性出現次數
pub type TypeCount = BTreeMap<String, usize>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatMeans {
    pub mean_hp: Option<f64>,
    pub mean_attack: Option<f64>,
    pub mean_defense: Option<f64>,
}

/// 各屬性的平均數值，依屬性名稱排序
pub type TypeStats = BTreeMap<String, StatMeans>;

pub type CategoryCount = BTreeMap<Category, usize>;

/// Aggregator 的輸出
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    pub table: PokemonTable,
    pub type_count: TypeCount,
    pub type_stats: TypeStats,
    pub category_count: CategoryCount,
    pub top: Vec<PokemonRow>,
}

impl Aggregation {
    /// 依數量遞減排列的屬性分布，數量相同時依名稱排序
    pub fn type_distribution(&self) -> Vec<(String, usize)> {
        let mut distribution: Vec<(String, usize)> = self
            .type_count
            .iter()
            .map(|(name, count)| (name.clone(), *count))
            .collect();
        distribution.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        distribution
    }
}

/// Extract 階段的結果
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub catalog_entries: usize,
    pub records: Vec<PokemonRecord>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl Extraction {
    pub fn failed(&self) -> usize {
        self.catalog_entries.saturating_sub(self.records.len())
    }
}

/// Transform 階段的結果，帶著擷取統計給 load 使用
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub aggregation: Aggregation,
    pub catalog_entries: usize,
    pub failed: usize,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
    pub catalog_entries: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub table_rows: usize,
    pub distinct_types: usize,
    pub type_count: BTreeMap<String, usize>,
    pub category_count: BTreeMap<String, usize>,
    pub outputs: Vec<String>,
}
