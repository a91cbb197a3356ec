use std::collections::BTreeMap;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::analysis::{pearson, rebase};
use crate::error::PipelineError;
use crate::loader::{BarSource, PricePoint};

pub const REBASE_LEVEL: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonPoint {
    pub date: NaiveDate,
    pub first: f64,
    pub second: f64,
}

/// Two instruments aligned on their common dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub first_symbol: String,
    pub second_symbol: String,
    /// Both legs rebased to 100 at the first common date.
    pub normalized: Vec<ComparisonPoint>,
    /// Pearson correlation of the raw closes over the overlap.
    pub correlation: Option<f64>,
}

/// Inner join on calendar date; each side keeps its own exchange's dating.
pub fn align(first: &[PricePoint], second: &[PricePoint]) -> Vec<(NaiveDate, f64, f64)> {
    let lookup: BTreeMap<NaiveDate, f64> = second
        .iter()
        .map(|point| (point.timestamp.date_naive(), point.value))
        .collect();
    first
        .iter()
        .filter_map(|point| {
            let date = point.timestamp.date_naive();
            lookup.get(&date).map(|&other| (date, point.value, other))
        })
        .collect()
}

pub fn compare_series(
    first_symbol: &str,
    first: &[PricePoint],
    second_symbol: &str,
    second: &[PricePoint],
) -> Option<Comparison> {
    let aligned = align(first, second);
    if aligned.is_empty() {
        return None;
    }
    let raw_first: Vec<f64> = aligned.iter().map(|(_, a, _)| *a).collect();
    let raw_second: Vec<f64> = aligned.iter().map(|(_, _, b)| *b).collect();

    let normalized = aligned
        .iter()
        .zip(rebase(&raw_first, REBASE_LEVEL))
        .zip(rebase(&raw_second, REBASE_LEVEL))
        .map(|((&(date, _, _), first), second)| ComparisonPoint {
            date,
            first,
            second,
        })
        .collect();

    Some(Comparison {
        first_symbol: first_symbol.to_string(),
        second_symbol: second_symbol.to_string(),
        normalized,
        correlation: pearson(&raw_first, &raw_second),
    })
}

/// Fetch both symbols independently and compare their overlap.
pub fn compare(
    source: &dyn BarSource,
    first_symbol: &str,
    second_symbol: &str,
    start: NaiveDate,
) -> Result<Comparison> {
    let first = source.fetch_closes(first_symbol, start)?;
    let second = source.fetch_closes(second_symbol, start)?;
    info!(
        first = first_symbol,
        first_points = first.len(),
        second = second_symbol,
        second_points = second.len(),
        "fetched comparison closes"
    );

    for (symbol, points) in [(first_symbol, &first), (second_symbol, &second)] {
        if points.is_empty() {
            return Err(PipelineError::FetchEmpty {
                symbol: symbol.to_string(),
            }
            .into());
        }
    }

    compare_series(first_symbol, &first, second_symbol, &second).ok_or_else(|| {
        PipelineError::NoOverlap {
            first: first_symbol.to_string(),
            second: second_symbol.to_string(),
        }
        .into()
    })
}
