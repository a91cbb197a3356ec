use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::{
    compute_atr, compute_bollinger, compute_levels, compute_sma, compute_stochastic,
};
use crate::data::{Bar, ChartPlan, Color, IndicatorSeries, LevelSummary, Period};
use crate::layout::{market_palette, plan_chart, IndicatorToggles};
use crate::resample::resample;

/// Minimum calendar days of history requested regardless of display size.
pub const MIN_FETCH_DAYS: i64 = 800;

/// Everything one chart request needs, with no ambient state.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    /// Canonical data-source symbol.
    pub symbol: String,
    pub period: Period,
    pub display_count: usize,
    pub toggles: IndicatorToggles,
    pub focus_mode: bool,
    pub atr_period: usize,
    pub stochastic_period: usize,
    pub bollinger_period: usize,
    pub bollinger_k: f64,
    pub moving_averages: Vec<usize>,
}

#[cfg(test)]
impl RenderRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            period: Period::Daily,
            display_count: 120,
            toggles: IndicatorToggles::default(),
            focus_mode: false,
            atr_period: 14,
            stochastic_period: 9,
            bollinger_period: 20,
            bollinger_k: 2.0,
            moving_averages: vec![20, 60],
        }
    }
}

/// Prepared chart data for the renderer: the display window of bars, the
/// series the plan designates, the levels and the plan itself.
#[derive(Debug, Clone, Serialize)]
pub struct ChartBundle {
    pub symbol: String,
    pub period: Period,
    /// Bars available after resampling, before trimming to the display window.
    pub total_bars: usize,
    pub bars: Vec<Bar>,
    pub series: Vec<IndicatorSeries>,
    pub levels: Option<LevelSummary>,
    /// Colour for directional text about the latest change.
    pub change_color: Option<Color>,
    pub plan: ChartPlan,
}

#[cfg(test)]
impl ChartBundle {
    pub fn series(&self, name: &str) -> Option<&IndicatorSeries> {
        self.series.iter().find(|series| series.name == name)
    }
}

/// First calendar day to request so the display window is filled after resampling.
pub fn fetch_start(period: Period, display_count: usize, today: NaiveDate) -> NaiveDate {
    let wanted = i64::try_from(display_count)
        .ok()
        .and_then(|count| count.checked_mul(period.padding_days()))
        .unwrap_or(i64::MAX);
    days_before(today, wanted.max(MIN_FETCH_DAYS))
}

/// `today` minus `days`, clamped to the earliest representable date.
pub fn days_before(today: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days)
        .and_then(|span| today.checked_sub_signed(span))
        .unwrap_or(NaiveDate::MIN)
}

/// Resample daily bars and derive indicators, levels and layout.
///
/// Indicators are computed over the whole resampled history and then trimmed
/// to the last `display_count` bars so the visible window carries no warm-up
/// gaps it does not need.
pub fn build_bundle(request: &RenderRequest, symbol: &str, daily: &[Bar]) -> ChartBundle {
    let bars = resample(daily, request.period);
    info!(
        symbol,
        period = %request.period,
        daily = daily.len(),
        resampled = bars.len(),
        "resampled series"
    );

    let atr = compute_atr(&bars, request.atr_period);
    let levels = match compute_levels(&bars, &atr) {
        Ok(summary) => Some(summary),
        Err(err) => {
            warn!(symbol, %err, "skipping level calculation");
            None
        }
    };

    let palette = market_palette(symbol);
    let plan = plan_chart(
        request.toggles,
        request.focus_mode,
        &request.moving_averages,
        palette,
    );

    let mut series = Vec::new();
    for &window in &request.moving_averages {
        series.push(compute_sma(&bars, window));
    }
    if request.toggles.show_bollinger {
        let bands = compute_bollinger(&bars, request.bollinger_period, request.bollinger_k);
        series.extend([bands.upper, bands.middle, bands.lower]);
    }
    if request.toggles.show_stochastic {
        let stochastic = compute_stochastic(&bars, request.stochastic_period);
        series.extend([stochastic.k, stochastic.d]);
    }
    series.push(atr);
    // Hidden panels still compute their inputs; only designated series ship.
    series.retain(|s| plan.panel_of(&s.name).is_some());

    let display_count = request.display_count.max(1);
    let start = bars.len().saturating_sub(display_count);
    let change_color = levels
        .as_ref()
        .map(|summary| palette.color_for(summary.change.direction));

    ChartBundle {
        symbol: symbol.to_string(),
        period: request.period,
        total_bars: bars.len(),
        series: series.iter().map(|s| s.tail(display_count)).collect(),
        bars: bars[start..].to_vec(),
        levels,
        change_color,
        plan,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::atr::ATR_SERIES;
    use crate::analysis::bollinger::UPPER_SERIES;
    use crate::analysis::stochastic::K_SERIES;
    use crate::data::testing::{daily_bars, date};
    use crate::data::Direction;

    fn history(len: usize) -> Vec<Bar> {
        let rows: Vec<_> = (0..len)
            .map(|i| {
                let c = 100.0 + (i as f64 * 0.3).sin() * 4.0;
                (c - 0.5, c + 1.0, c - 1.0, c, 1_000.0)
            })
            .collect();
        daily_bars(date(2024, 1, 1), &rows)
    }

    #[test]
    fn fetch_window_scales_with_period() {
        let today = date(2025, 1, 1);
        assert_eq!(fetch_start(Period::Daily, 120, today), today - Duration::days(800));
        assert_eq!(fetch_start(Period::Weekly, 120, today), today - Duration::days(3600));
        assert_eq!(fetch_start(Period::Monthly, 10, today), today - Duration::days(1000));
    }

    #[test]
    fn oversized_windows_clamp_to_earliest_date() {
        let today = date(2025, 1, 1);
        assert_eq!(fetch_start(Period::Monthly, 1_000_000_000, today), NaiveDate::MIN);
        assert_eq!(fetch_start(Period::Weekly, usize::MAX, today), NaiveDate::MIN);
        assert_eq!(days_before(today, i64::MAX), NaiveDate::MIN);
        assert_eq!(days_before(today, 365), date(2024, 1, 2));
    }

    #[test]
    fn bundle_trims_to_display_window() {
        let mut request = RenderRequest::new("NVDA");
        request.display_count = 50;
        request.toggles.show_bollinger = true;
        let bundle = build_bundle(&request, "NVDA", &history(200));

        assert_eq!(bundle.total_bars, 200);
        assert_eq!(bundle.bars.len(), 50);
        for series in &bundle.series {
            assert_eq!(series.len(), 50, "{}", series.name);
        }
        // Computed on full history, so the window has no warm-up gaps.
        let upper = bundle.series(UPPER_SERIES).unwrap();
        assert!(upper.values.iter().all(Option::is_some));
        assert!(bundle.series("ma_60").unwrap().values.iter().all(Option::is_some));
    }

    #[test]
    fn levels_follow_the_latest_bar() {
        let request = RenderRequest::new("NVDA");
        let daily = history(40);
        let bundle = build_bundle(&request, "NVDA", &daily);
        let summary = bundle.levels.as_ref().unwrap();
        let atr = compute_atr(&daily, 14).last().unwrap();
        assert_eq!(summary.latest, daily[39]);
        assert_eq!(summary.levels.resistance, daily[39].high + atr);
        let expected_color = match summary.change.direction {
            Direction::Up => Color::Green,
            Direction::Down => Color::Red,
        };
        assert_eq!(bundle.change_color, Some(expected_color));
    }

    #[test]
    fn domestic_symbol_flips_change_colour() {
        let request = RenderRequest::new("2330.TW");
        let bundle = build_bundle(&request, "2330.TW", &history(40));
        let summary = bundle.levels.as_ref().unwrap();
        let expected = match summary.change.direction {
            Direction::Up => Color::Red,
            Direction::Down => Color::Green,
        };
        assert_eq!(bundle.change_color, Some(expected));
        assert_eq!(bundle.plan.palette.up, Color::Red);
    }

    #[test]
    fn single_bar_degrades_without_levels() {
        let request = RenderRequest::new("NVDA");
        let bundle = build_bundle(&request, "NVDA", &history(1));
        assert!(bundle.levels.is_none());
        assert_eq!(bundle.change_color, None);
        assert_eq!(bundle.bars.len(), 1);
        assert!(bundle.series(K_SERIES).unwrap().values.iter().all(Option::is_none));
    }

    #[test]
    fn focus_mode_ships_only_price_panel_series() {
        let mut request = RenderRequest::new("NVDA");
        request.focus_mode = true;
        let bundle = build_bundle(&request, "NVDA", &history(60));
        assert_eq!(bundle.plan.panel_count, 2);
        assert!(bundle.series(ATR_SERIES).is_none());
        assert!(bundle.series(K_SERIES).is_none());
        assert!(bundle.series("ma_20").is_some());
        assert!(bundle.levels.is_some());
    }

    #[test]
    fn weekly_request_resamples_first() {
        let mut request = RenderRequest::new("NVDA");
        request.period = Period::Weekly;
        let bundle = build_bundle(&request, "NVDA", &history(70));
        assert_eq!(bundle.total_bars, 11);
        assert_eq!(bundle.period, Period::Weekly);
    }
}
