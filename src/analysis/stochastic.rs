use crate::analysis::ewm::{ewm_mean, Ewm};
use crate::data::{Bar, IndicatorSeries};

pub const K_SERIES: &str = "stoch_k";
pub const D_SERIES: &str = "stoch_d";

/// Center of mass used to smooth RSV into K and K into D.
pub const SMOOTHING_COM: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticSeries {
    pub rsv: Vec<Option<f64>>,
    pub k: IndicatorSeries,
    pub d: IndicatorSeries,
}

/// Position of each close inside the trailing `period`-bar high/low range, in percent.
///
/// Undefined until `period` bars are available and wherever the window is flat.
pub fn raw_stochastic_value(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    let mut rsv = vec![None; bars.len()];
    if period == 0 || bars.len() < period {
        return rsv;
    }

    for (offset, window) in bars.windows(period).enumerate() {
        let highest = window.iter().map(|bar| bar.high).fold(f64::MIN, f64::max);
        let lowest = window.iter().map(|bar| bar.low).fold(f64::MAX, f64::min);
        let range = highest - lowest;
        if range > 0.0 && range.is_finite() {
            let close = window[period - 1].close;
            rsv[offset + period - 1] = Some((close - lowest) / range * 100.0);
        }
    }
    rsv
}

/// Stochastic K/D where both lines are exponential means with center of mass 2,
/// not the simple-average %K/%D of the classic oscillator.
pub fn compute_stochastic(bars: &[Bar], period: usize) -> StochasticSeries {
    let rsv = raw_stochastic_value(bars, period);
    let k = ewm_mean(&rsv, Ewm::center_of_mass(SMOOTHING_COM));
    let d = ewm_mean(&k, Ewm::center_of_mass(SMOOTHING_COM));
    StochasticSeries {
        rsv,
        k: IndicatorSeries::new(K_SERIES, k),
        d: IndicatorSeries::new(D_SERIES, d),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::testing::{daily_bars, date};

    fn ramp(len: usize) -> Vec<Bar> {
        let rows: Vec<_> = (0..len)
            .map(|i| {
                let c = 20.0 + i as f64 + if i % 2 == 0 { 0.3 } else { -0.4 };
                (c, c + 1.0, c - 1.0, c, 100.0)
            })
            .collect();
        daily_bars(date(2024, 1, 1), &rows)
    }

    #[test]
    fn warm_up_is_undefined_and_lengths_align() {
        let bars = ramp(20);
        let stoch = compute_stochastic(&bars, 9);
        assert_eq!(stoch.rsv.len(), 20);
        assert_eq!(stoch.k.len(), 20);
        assert_eq!(stoch.d.len(), 20);
        assert!(stoch.rsv[..8].iter().all(Option::is_none));
        assert!(stoch.k.values[..8].iter().all(Option::is_none));
        assert!(stoch.d.values[..8].iter().all(Option::is_none));
        assert!(stoch.rsv[8].is_some());
        assert_eq!(stoch.k.get(8), stoch.rsv[8]);
        assert_eq!(stoch.d.get(8), stoch.rsv[8]);
    }

    #[test]
    fn rsv_matches_window_position() {
        let bars = daily_bars(
            date(2024, 1, 1),
            &[
                (10.0, 12.0, 8.0, 11.0, 1.0),
                (11.0, 14.0, 10.0, 13.0, 1.0),
                (13.0, 13.5, 9.0, 10.0, 1.0),
            ],
        );
        let rsv = raw_stochastic_value(&bars, 3);
        assert_eq!(rsv[..2], [None, None]);
        // highest 14, lowest 8, close 10
        assert!((rsv[2].unwrap() - 100.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn flat_window_yields_undefined_rsv() {
        let mut rows = vec![(10.0, 10.0, 10.0, 10.0, 1.0); 5];
        rows.push((10.0, 12.0, 9.0, 11.0, 1.0));
        let bars = daily_bars(date(2024, 1, 1), &rows);
        let stoch = compute_stochastic(&bars, 3);
        assert_eq!(stoch.rsv[2], None);
        assert_eq!(stoch.rsv[3], None);
        assert_eq!(stoch.rsv[4], None);
        assert!(stoch.rsv[5].is_some());
        assert!(stoch.k.values[..5].iter().all(Option::is_none));
        assert!(stoch.k.get(5).unwrap().is_finite());
    }

    #[test]
    fn k_and_d_follow_center_of_mass_two() {
        let bars = ramp(12);
        let stoch = compute_stochastic(&bars, 3);
        let alpha = 1.0 / 3.0;
        let first = stoch.rsv[2].unwrap();
        let second = stoch.rsv[3].unwrap();
        let decay = 1.0 - alpha;
        let expected_k = (decay * first + second) / (decay + 1.0);
        assert!((stoch.k.get(3).unwrap() - expected_k).abs() < 1e-9);

        let expected_d = (decay * first + expected_k) / (decay + 1.0);
        assert!((stoch.d.get(3).unwrap() - expected_d).abs() < 1e-9);
    }

    #[test]
    fn values_stay_within_bounds() {
        let bars = ramp(40);
        let stoch = compute_stochastic(&bars, 9);
        for value in stoch.k.values.iter().chain(stoch.d.values.iter()).flatten() {
            assert!((0.0..=100.0).contains(value));
        }
    }

    #[test]
    fn short_series_is_all_undefined() {
        let bars = ramp(4);
        let stoch = compute_stochastic(&bars, 9);
        assert!(stoch.k.values.iter().all(Option::is_none));
        assert_eq!(compute_stochastic(&bars, 0).rsv, vec![None; 4]);
    }
}
