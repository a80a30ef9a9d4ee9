use crate::domain::model::{Aggregation, PokemonRow, PokemonTable, RunSummary, TypeStats};
use crate::utils::error::{EtlError, Result};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use std::sync::OnceLock;

const CHART_SIZE: (u32, u32) = (1200, 700);
const CHART_FONT_FAMILY: &str = "sans-serif";
static CHART_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// 註冊內嵌字型；plotters 以 ab_glyph 繪字，不依賴系統字型
fn ensure_chart_font() -> Result<()> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();

    let registered = *REGISTERED.get_or_init(|| {
        plotters::style::register_font(
            CHART_FONT_FAMILY,
            plotters::style::FontStyle::Normal,
            CHART_FONT,
        )
        .is_ok()
    });

    if registered {
        Ok(())
    } else {
        Err(EtlError::ChartError {
            message: "embedded chart font could not be loaded".to_string(),
        })
    }
}

/// 以 plotters 繪製屬性分布長條圖（PNG），長條依數量遞減排列
pub fn render_chart(distribution: &[(String, usize)]) -> Result<Vec<u8>> {
    ensure_chart_font()?;

    let (width, height) = CHART_SIZE;
    let mut pixels = vec![0u8; (width * height * 3) as usize];
    draw_type_chart(&mut pixels, distribution).map_err(|e| EtlError::ChartError {
        message: e.to_string(),
    })?;

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EtlError::ChartError {
            message: format!("Failed to encode PNG: {}", e),
        })?;
    Ok(png)
}

fn draw_type_chart(
    pixels: &mut [u8],
    distribution: &[(String, usize)],
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    use plotters::prelude::*;

    let names: Vec<&str> = distribution.iter().map(|(name, _)| name.as_str()).collect();
    let bars = distribution.len().max(1) as u32;
    let max_count = distribution
        .iter()
        .map(|(_, count)| *count)
        .max()
        .unwrap_or(0) as u32;

    let root = BitMapBackend::with_buffer(pixels, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Pokemon by type", (CHART_FONT_FAMILY, 30))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d((0u32..bars).into_segmented(), 0u32..max_count + 1)?;

    let label = |value: &SegmentValue<u32>| match value {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => names
            .get(*i as usize)
            .map(|s| s.to_string())
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(bars as usize)
        .x_label_formatter(&label)
        .x_desc("Type")
        .y_desc("Count")
        .label_style((CHART_FONT_FAMILY, 14))
        .axis_desc_style((CHART_FONT_FAMILY, 18))
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BLUE.mix(0.7).filled())
            .margin(8)
            .data(
                distribution
                    .iter()
                    .enumerate()
                    .map(|(i, (_, count))| (i as u32, *count as u32)),
            ),
    )?;

    root.present()?;
    Ok(())
}

/// 前 N 名報表：name,base_experience,types,hp,attack,defense
pub fn top_csv(rows: &[PokemonRow]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["name", "base_experience", "types", "hp", "attack", "defense"])?;

    for row in rows {
        let record = &row.record;
        writer.write_record([
            record.name.clone(),
            record.base_experience.to_string(),
            record.types.join("|"),
            format_stat(record.hp),
            format_stat(record.attack),
            format_stat(record.defense),
        ])?;
    }

    finish(writer)
}

/// 各屬性平均報表，依屬性名稱排序，數值固定兩位小數
pub fn type_stats_csv(stats: &TypeStats) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["type", "mean_hp", "mean_attack", "mean_defense"])?;

    for (type_name, means) in stats {
        writer.write_record([
            type_name.clone(),
            format_mean(means.mean_hp),
            format_mean(means.mean_attack),
            format_mean(means.mean_defense),
        ])?;
    }

    finish(writer)
}

/// 完整資料表（含分類欄位）
pub fn dataset_csv(table: &PokemonTable) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "id",
        "name",
        "base_experience",
        "category",
        "types",
        "hp",
        "attack",
        "defense",
    ])?;

    for row in table.rows() {
        let record = &row.record;
        writer.write_record([
            record.id.to_string(),
            record.name.clone(),
            record.base_experience.to_string(),
            row.category.to_string(),
            record.types.join("|"),
            format_stat(record.hp),
            format_stat(record.attack),
            format_stat(record.defense),
        ])?;
    }

    finish(writer)
}

pub fn run_summary_json(summary: &RunSummary) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(summary)?)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}

/// 未知數值輸出為空欄位
fn format_stat(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn format_mean(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_default()
}

/// 將報表內容輸出到日誌
pub fn log_report(aggregation: &Aggregation) {
    tracing::info!("🏆 Top {} by base experience:", aggregation.top.len());
    for (rank, row) in aggregation.top.iter().enumerate() {
        tracing::info!(
            "   {}. {} (#{}) - {} xp [{}]",
            rank + 1,
            row.record.name,
            row.record.id,
            row.record.base_experience,
            row.record.types.join(", ")
        );
    }

    tracing::info!("📊 Mean stats by type:");
    for (type_name, means) in &aggregation.type_stats {
        tracing::info!(
            "   {:<10} hp={:>6} attack={:>6} defense={:>6}",
            type_name,
            format_mean(means.mean_hp),
            format_mean(means.mean_attack),
            format_mean(means.mean_defense)
        );
    }

    for (category, count) in &aggregation.category_count {
        tracing::info!("   {}: {}", category, count);
    }
}
