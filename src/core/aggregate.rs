use crate::domain::model::{
    Aggregation, Category, CategoryCount, PokemonRecord, PokemonRow, PokemonTable, StatMeans,
    TypeCount, TypeStats,
};
use std::collections::BTreeMap;

pub const DEFAULT_TOP_N: usize = 5;

/// 將收集到的記錄整理成排序後的資料表與各項統計。
///
/// 結果只取決於記錄內容，與輸入順序無關。
pub fn aggregate(records: Vec<PokemonRecord>, top_n: usize) -> Aggregation {
    let table = build_table(records);
    let type_count = count_types(&table);
    let type_stats = compute_type_stats(&table);
    let category_count = count_categories(&table);
    let top = top_by_base_experience(&table, top_n);

    tracing::info!(
        "🔄 Aggregated {} rows, {} distinct types",
        table.len(),
        type_count.len()
    );

    Aggregation {
        table,
        type_count,
        type_stats,
        category_count,
        top,
    }
}

/// 依 id 穩定排序並加上分類欄位；重複的 id 只保留第一筆
pub fn build_table(mut records: Vec<PokemonRecord>) -> PokemonTable {
    records.sort_by_key(|r| r.id);

    let mut rows: Vec<PokemonRow> = Vec::with_capacity(records.len());
    for record in records {
        if rows.last().map(|row| row.record.id) == Some(record.id) {
            tracing::warn!("🔶 Dropping duplicate record for id {}", record.id);
            continue;
        }
        rows.push(PokemonRow {
            category: Category::from_base_experience(record.base_experience),
            record,
        });
    }

    PokemonTable::from_sorted_rows(rows)
}

pub fn count_types(table: &PokemonTable) -> TypeCount {
    let mut counts = TypeCount::new();
    for row in table.rows() {
        for type_name in &row.record.types {
            *counts.entry(type_name.clone()).or_insert(0) += 1;
        }
    }
    counts
}

pub fn count_categories(table: &PokemonTable) -> CategoryCount {
    let mut counts = CategoryCount::new();
    for row in table.rows() {
        *counts.entry(row.category).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Default, Clone, Copy)]
struct MeanAccumulator {
    sum: u64,
    count: u64,
}

impl MeanAccumulator {
    fn add(&mut self, value: Option<u32>) {
        // 未知數值不計入分子與分母
        if let Some(v) = value {
            self.sum += u64::from(v);
            self.count += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| rounded_mean(self.sum, self.count))
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct GroupAccumulator {
    hp: MeanAccumulator,
    attack: MeanAccumulator,
    defense: MeanAccumulator,
}

/// 以屬性展開後分組平均：k 個屬性的記錄會完整計入 k 個群組
pub fn compute_type_stats(table: &PokemonTable) -> TypeStats {
    let mut groups: BTreeMap<String, GroupAccumulator> = BTreeMap::new();

    for row in table.rows() {
        let record = &row.record;
        for type_name in &record.types {
            let group = groups.entry(type_name.clone()).or_default();
            group.hp.add(record.hp);
            group.attack.add(record.attack);
            group.defense.add(record.defense);
        }
    }

    groups
        .into_iter()
        .map(|(type_name, group)| {
            (
                type_name,
                StatMeans {
                    mean_hp: group.hp.mean(),
                    mean_attack: group.attack.mean(),
                    mean_defense: group.defense.mean(),
                },
            )
        })
        .collect()
}

/// 經驗值最高的前 n 筆；同分時維持 id 遞增
pub fn top_by_base_experience(table: &PokemonTable, n: usize) -> Vec<PokemonRow> {
    let mut rows = table.rows().to_vec();
    rows.sort_by(|a, b| b.record.base_experience.cmp(&a.record.base_experience));
    rows.truncate(n);
    rows
}

/// `sum / count` 四捨五入到小數點後兩位（half away from zero）。
///
/// 以整數計算百分位，剛好落在 .xx5 的平均值不受浮點誤差影響。
/// `count` 必須大於 0。
pub fn rounded_mean(sum: u64, count: u64) -> f64 {
    let hundredths = (sum * 200 + count) / (2 * count);
    hundredths as f64 / 100.0
}
