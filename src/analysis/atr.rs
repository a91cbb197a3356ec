use crate::analysis::ewm::{ewm_mean, Ewm};
use crate::data::{Bar, IndicatorSeries};

pub const ATR_SERIES: &str = "atr";

/// True range per bar; the first bar has no previous close and uses high - low.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(idx, bar)| {
            let high_low = bar.high - bar.low;
            if idx == 0 {
                return high_low;
            }
            let prev_close = bars[idx - 1].close;
            let high_close = (bar.high - prev_close).abs();
            let low_close = (bar.low - prev_close).abs();
            high_low.max(high_close).max(low_close)
        })
        .collect()
}

/// Average True Range as an unadjusted exponential mean with `alpha = 1 / period`.
///
/// Seeded with the first true range, so every index is defined.
pub fn compute_atr(bars: &[Bar], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::new(ATR_SERIES, vec![None; bars.len()]);
    }

    let true_ranges: Vec<Option<f64>> = true_range(bars).into_iter().map(Some).collect();
    let smoothing = Ewm::new(1.0 / period as f64, false);
    IndicatorSeries::new(ATR_SERIES, ewm_mean(&true_ranges, smoothing))
}
