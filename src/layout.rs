use std::collections::BTreeMap;

use crate::analysis::atr::ATR_SERIES;
use crate::analysis::bollinger::{LOWER_SERIES, UPPER_SERIES};
use crate::analysis::moving_average::moving_average_name;
use crate::analysis::stochastic::{D_SERIES, K_SERIES};
use crate::data::{
    ChartPlan, Color, LineStyle, MarketPalette, ReferenceLine, SeriesKind, SeriesStyle,
};
use crate::symbol::is_domestic_equity;

pub const CANDLE_SERIES: &str = "candles";
pub const VOLUME_SERIES: &str = "volume";
pub const RESISTANCE_SERIES: &str = "resistance";
pub const SUPPORT_SERIES: &str = "support";

/// Price panel share of the height when secondary panels are suppressed.
pub const FOCUS_PRICE_RATIO: f64 = 0.8;

const PRICE_WEIGHT: f64 = 3.0;
const SECONDARY_WEIGHT: f64 = 1.0;

pub const STOCH_OVERBOUGHT: f64 = 80.0;
pub const STOCH_OVERSOLD: f64 = 20.0;

/// Domestic equities quote rising prices in red.
const DOMESTIC_PALETTE: MarketPalette = MarketPalette {
    up: Color::Red,
    down: Color::Green,
};
const INTERNATIONAL_PALETTE: MarketPalette = MarketPalette {
    up: Color::Green,
    down: Color::Red,
};

static MOVING_AVERAGE_COLORS: &[Color] = &[Color::Blue, Color::Magenta, Color::Brown, Color::Olive];

/// Which optional indicators the chart should draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorToggles {
    pub show_bollinger: bool,
    pub show_stochastic: bool,
    pub show_atr: bool,
    pub show_support_resistance: bool,
}

impl Default for IndicatorToggles {
    fn default() -> Self {
        Self {
            show_bollinger: false,
            show_stochastic: true,
            show_atr: true,
            show_support_resistance: true,
        }
    }
}

pub fn market_palette(symbol: &str) -> MarketPalette {
    if is_domestic_equity(symbol) {
        DOMESTIC_PALETTE
    } else {
        INTERNATIONAL_PALETTE
    }
}

#[derive(Default)]
struct PlanBuilder {
    titles: Vec<String>,
    weights: Vec<f64>,
    series: Vec<SeriesStyle>,
    assignments: BTreeMap<String, usize>,
    reference_lines: Vec<ReferenceLine>,
}

impl PlanBuilder {
    fn panel(&mut self, title: &str, weight: f64) -> usize {
        self.titles.push(title.to_string());
        self.weights.push(weight);
        self.titles.len() - 1
    }

    fn series(
        &mut self,
        name: &str,
        panel: usize,
        kind: SeriesKind,
        color: Option<Color>,
        line_style: LineStyle,
    ) {
        self.assignments.insert(name.to_string(), panel);
        self.series.push(SeriesStyle {
            name: name.to_string(),
            panel,
            kind,
            color,
            line_style,
        });
    }

    fn line(&mut self, name: &str, panel: usize, color: Color, line_style: LineStyle) {
        self.series(name, panel, SeriesKind::Line, Some(color), line_style);
    }

    fn reference(&mut self, panel: usize, value: f64) {
        self.reference_lines.push(ReferenceLine {
            panel,
            value,
            color: Color::Gray,
            line_style: LineStyle::Dotted,
        });
    }
}

/// Decide panels, height ratios and series placement for one chart request.
///
/// Overlays (moving averages, Bollinger Bands, support/resistance) always sit
/// on the price panel. ATR and stochastic get their own rows unless
/// `focus_mode` is set, which keeps only price and volume.
pub fn plan_chart(
    toggles: IndicatorToggles,
    focus_mode: bool,
    moving_averages: &[usize],
    palette: MarketPalette,
) -> ChartPlan {
    let mut plan = PlanBuilder::default();
    let price = plan.panel("Price", PRICE_WEIGHT);
    let volume = plan.panel("Volume", SECONDARY_WEIGHT);
    plan.series(CANDLE_SERIES, price, SeriesKind::Candles, None, LineStyle::Solid);
    plan.series(VOLUME_SERIES, volume, SeriesKind::VolumeBars, None, LineStyle::Solid);

    for (window, color) in moving_averages
        .iter()
        .zip(MOVING_AVERAGE_COLORS.iter().cycle())
    {
        plan.line(&moving_average_name(*window), price, *color, LineStyle::Solid);
    }

    if toggles.show_bollinger {
        plan.line(UPPER_SERIES, price, Color::Gray, LineStyle::Dashed);
        plan.line(LOWER_SERIES, price, Color::Gray, LineStyle::Dashed);
    }

    if toggles.show_support_resistance {
        let level = SeriesKind::HorizontalLevel;
        plan.series(RESISTANCE_SERIES, price, level, Some(Color::Green), LineStyle::Dashed);
        plan.series(SUPPORT_SERIES, price, level, Some(Color::Red), LineStyle::Dashed);
    }

    if !focus_mode {
        if toggles.show_atr {
            let panel = plan.panel("ATR", SECONDARY_WEIGHT);
            plan.line(ATR_SERIES, panel, Color::Cyan, LineStyle::Solid);
        }
        if toggles.show_stochastic {
            let panel = plan.panel("KD", SECONDARY_WEIGHT);
            plan.reference(panel, STOCH_OVERBOUGHT);
            plan.reference(panel, STOCH_OVERSOLD);
            plan.line(K_SERIES, panel, Color::Orange, LineStyle::Solid);
            plan.line(D_SERIES, panel, Color::Purple, LineStyle::Solid);
        }
    }

    let row_height_ratios = if focus_mode {
        vec![FOCUS_PRICE_RATIO, 1.0 - FOCUS_PRICE_RATIO]
    } else {
        let total: f64 = plan.weights.iter().sum();
        plan.weights.iter().map(|weight| weight / total).collect()
    };

    ChartPlan {
        panel_count: plan.titles.len(),
        row_height_ratios,
        panel_titles: plan.titles,
        panel_assignments: plan.assignments,
        series: plan.series,
        reference_lines: plan.reference_lines,
        palette,
    }
}
