use statrs::statistics::Statistics;

use crate::data::{Bar, IndicatorSeries};

/// Apply `reduce` to every full trailing window; indices before the first
/// full window, and windows where `reduce` gives a non-finite value, are `None`.
pub fn rolling<F>(values: &[f64], window: usize, reduce: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }
    for (offset, slice) in values.windows(window).enumerate() {
        let value = reduce(slice);
        if value.is_finite() {
            out[offset + window - 1] = Some(value);
        }
    }
    out
}

pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |slice| slice.iter().mean())
}

pub fn moving_average_name(window: usize) -> String {
    format!("ma_{window}")
}

/// Simple moving average of close, drawn as a price-panel overlay.
pub fn compute_sma(bars: &[Bar], window: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
    IndicatorSeries::new(moving_average_name(window), rolling_mean(&closes, window))
}
