use statrs::statistics::Statistics;

use crate::analysis::moving_average::{rolling, rolling_mean};
use crate::data::{Bar, IndicatorSeries};

pub const UPPER_SERIES: &str = "bollinger_upper";
pub const MIDDLE_SERIES: &str = "bollinger_middle";
pub const LOWER_SERIES: &str = "bollinger_lower";

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub upper: IndicatorSeries,
    pub middle: IndicatorSeries,
    pub lower: IndicatorSeries,
}

/// Bollinger Bands over close: SMA ± `k` sample standard deviations.
pub fn compute_bollinger(bars: &[Bar], period: usize, k: f64) -> BollingerBands {
    let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
    let middle = rolling_mean(&closes, period);
    let std_dev = rolling(&closes, period, |slice| slice.iter().std_dev());

    let band = |sign: f64| -> Vec<Option<f64>> {
        middle
            .iter()
            .zip(&std_dev)
            .map(|(&m, &s)| Some(m? + sign * k * s?))
            .collect()
    };
    let upper = band(1.0);
    let lower = band(-1.0);

    BollingerBands {
        upper: IndicatorSeries::new(UPPER_SERIES, upper),
        middle: IndicatorSeries::new(MIDDLE_SERIES, middle),
        lower: IndicatorSeries::new(LOWER_SERIES, lower),
    }
}
