use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::compare::Comparison;
use crate::data::Direction;
use crate::layout::RESISTANCE_SERIES;
use crate::pipeline::ChartBundle;

#[derive(Tabled)]
struct PanelRow {
    #[tabled(rename = "Panel")]
    index: usize,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Height")]
    ratio: String,
    #[tabled(rename = "Series")]
    series: String,
}

#[derive(Tabled)]
struct SeriesRow {
    #[tabled(rename = "Series")]
    name: String,
    #[tabled(rename = "Latest")]
    latest: String,
    #[tabled(rename = "Defined")]
    defined: String,
}

fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

pub fn print_chart_report(bundle: &ChartBundle) {
    println!("\n=== ATR Level Chart: {} ({}) ===\n", bundle.symbol, bundle.period);
    if let (Some(first), Some(last)) = (bundle.bars.first(), bundle.bars.last()) {
        println!(
            "Showing {} of {} bars from {} to {}",
            bundle.bars.len(),
            bundle.total_bars,
            first.timestamp.format("%Y-%m-%d"),
            last.timestamp.format("%Y-%m-%d"),
        );
    }

    match &bundle.levels {
        Some(summary) => {
            let arrow = match summary.change.direction {
                Direction::Up => "▲",
                Direction::Down => "▼",
            };
            let colour = bundle
                .change_color
                .map(|c| c.as_str())
                .unwrap_or_default();
            println!("{} Open: {:.2}", bundle.period.latest_label(), summary.latest.open);
            println!(
                "Latest Close: {:.2} {arrow} {:+.2} ({:+.2}%) [{colour}]",
                summary.latest.close, summary.change.absolute, summary.change.percent,
            );
            println!("ATR: {:.2}", summary.atr);
            if bundle.plan.panel_of(RESISTANCE_SERIES).is_some() {
                println!("Resistance (green): {:.2}", summary.levels.resistance);
                println!("Support (red): {:.2}", summary.levels.support);
            }
        }
        None => println!("Not enough data to compute levels."),
    }

    if !bundle.series.is_empty() {
        let rows: Vec<SeriesRow> = bundle
            .series
            .iter()
            .map(|series| SeriesRow {
                name: series.name.clone(),
                latest: format_value(series.last()),
                defined: format!(
                    "{}/{}",
                    series.values.iter().flatten().count(),
                    series.len()
                ),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("\n{table}");
    }

    let plan = &bundle.plan;
    let rows: Vec<PanelRow> = plan
        .panel_titles
        .iter()
        .enumerate()
        .map(|(index, title)| PanelRow {
            index,
            title: title.clone(),
            ratio: format!("{:.3}", plan.row_height_ratios.get(index).copied().unwrap_or(0.0)),
            series: plan
                .series_in_panel(index)
                .map(|style| match style.color {
                    Some(color) => format!("{} ({color})", style.name),
                    None => style.name.clone(),
                })
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("\n{table}");
    println!(
        "Candles: up {} / down {}\n",
        plan.palette.up, plan.palette.down
    );
}

#[derive(Tabled)]
struct ComparisonRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "First")]
    first: String,
    #[tabled(rename = "Second")]
    second: String,
}

/// Print correlation plus a sample of the rebased series.
pub fn print_comparison_report(comparison: &Comparison, sample_rows: usize) {
    println!(
        "\n=== {} vs {} ===\n",
        comparison.first_symbol, comparison.second_symbol
    );
    println!("Common dates: {}", comparison.normalized.len());
    let correlation = comparison
        .correlation
        .map_or_else(|| "-".to_string(), |value| format!("{value:.4}"));
    println!("Correlation: {correlation}");

    let step = (comparison.normalized.len() / sample_rows.max(1)).max(1);
    let mut rows: Vec<ComparisonRow> = comparison
        .normalized
        .iter()
        .step_by(step)
        .map(|point| ComparisonRow {
            date: point.date.format("%Y-%m-%d").to_string(),
            first: format!("{:.2}", point.first),
            second: format!("{:.2}", point.second),
        })
        .collect();
    if let Some(last) = comparison.normalized.last() {
        let last_date = last.date.format("%Y-%m-%d").to_string();
        if rows.last().map(|row| row.date != last_date).unwrap_or(true) {
            rows.push(ComparisonRow {
                date: last_date,
                first: format!("{:.2}", last.first),
                second: format!("{:.2}", last.second),
            });
        }
    }

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!(
        "\nRebased to 100 ({} = First, {} = Second)\n{table}\n",
        comparison.first_symbol, comparison.second_symbol
    );
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("failed to write JSON to {:?}", path))?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::testing::{daily_bars, date};
    use crate::pipeline::{build_bundle, RenderRequest};

    #[test]
    fn bundle_serializes_for_renderer() {
        let rows: Vec<_> = (0..30)
            .map(|i| {
                let c = 10.0 + i as f64 * 0.1;
                (c, c + 0.5, c - 0.5, c, 100.0)
            })
            .collect();
        let bundle = build_bundle(
            &RenderRequest::new("NVDA"),
            "NVDA",
            &daily_bars(date(2024, 1, 1), &rows),
        );

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bundle.json");
        write_json(&path, &bundle).unwrap();
        let json: serde_json::Value =
            serde_json::from_reader(File::open(&path).unwrap()).unwrap();

        assert_eq!(json["symbol"], "NVDA");
        assert_eq!(json["period"], "daily");
        assert_eq!(json["plan"]["panel_count"], 4);
        assert_eq!(json["plan"]["palette"]["up"], "green");
        assert_eq!(json["plan"]["panel_assignments"]["atr"], 2);
        assert_eq!(json["change_color"], "green");
        let stoch = json["series"]
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["name"] == "stoch_k")
            .unwrap();
        assert!(stoch["values"][0].is_null());
    }

    #[test]
    fn atr_colour_serializes_as_hex() {
        let value = serde_json::to_value(crate::data::Color::Cyan).unwrap();
        assert_eq!(value, "#00bcd4");
    }
}
