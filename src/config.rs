use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use itertools::Itertools;

use crate::data::Period;
use crate::layout::IndicatorToggles;
use crate::pipeline::RenderRequest;
use crate::symbol::normalize_symbol;

/// Command-line configuration for the ATR level chart tool.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct AppConfig {
    /// Directory holding one `<SYMBOL>.csv` OHLCV export per instrument.
    #[arg(short = 'd', long = "data-dir", value_name = "DIR", default_value = "data", global = true)]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Prepare a candlestick chart with indicators and ATR levels.
    Chart(ChartArgs),
    /// Compare two instruments over a common window.
    Compare(CompareArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ChartArgs {
    /// Instrument code or alias (e.g. 2330, DXY, GOLD, NVDA).
    #[arg(default_value = "2330")]
    pub symbol: String,

    /// Bar period to resample the daily series into.
    #[arg(short, long, value_enum, default_value_t = Period::Daily)]
    pub period: Period,

    /// Number of bars shown on the chart.
    #[arg(short = 'n', long, default_value_t = 120)]
    pub display_count: usize,

    /// First date to fetch; derived from the display window when omitted.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub start: Option<NaiveDate>,

    /// ATR period.
    #[arg(long, default_value_t = 14)]
    pub atr_period: usize,

    /// Stochastic RSV window.
    #[arg(long, default_value_t = 9)]
    pub stochastic_period: usize,

    /// Bollinger Band window.
    #[arg(long, default_value_t = 20)]
    pub bollinger_period: usize,

    /// Bollinger Band width in standard deviations.
    #[arg(long, default_value_t = 2.0)]
    pub bollinger_k: f64,

    /// Moving-average windows drawn over price, comma separated.
    #[arg(long = "ma", value_delimiter = ',', default_value = "20,60")]
    pub moving_averages: Vec<usize>,

    /// Overlay Bollinger Bands on the price panel.
    #[arg(long, action = ArgAction::SetTrue)]
    pub bollinger: bool,

    /// Hide the stochastic K/D panel.
    #[arg(long, action = ArgAction::SetTrue)]
    pub hide_stochastic: bool,

    /// Hide the ATR panel.
    #[arg(long, action = ArgAction::SetTrue)]
    pub hide_atr: bool,

    /// Hide the ATR support/resistance lines.
    #[arg(long, action = ArgAction::SetTrue)]
    pub hide_levels: bool,

    /// Keep only price and volume panels.
    #[arg(long, action = ArgAction::SetTrue)]
    pub focus: bool,

    /// Write the render bundle as JSON to this file.
    #[arg(long, value_name = "FILE")]
    pub json: Option<PathBuf>,
}

impl ChartArgs {
    pub fn render_request(&self) -> RenderRequest {
        RenderRequest {
            symbol: normalize_symbol(&self.symbol),
            period: self.period,
            display_count: self.display_count.max(1),
            toggles: IndicatorToggles {
                show_bollinger: self.bollinger,
                show_stochastic: !self.hide_stochastic,
                show_atr: !self.hide_atr,
                show_support_resistance: !self.hide_levels,
            },
            focus_mode: self.focus,
            atr_period: self.atr_period,
            stochastic_period: self.stochastic_period,
            bollinger_period: self.bollinger_period,
            bollinger_k: self.bollinger_k,
            moving_averages: self.moving_averages.iter().copied().unique().collect(),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct CompareArgs {
    /// First instrument code or alias.
    pub first: String,

    /// Second instrument code or alias.
    #[arg(default_value = "^TWII")]
    pub second: String,

    /// Calendar days of history to compare.
    #[arg(long, default_value_t = 365)]
    pub lookback_days: i64,

    /// Write the comparison as JSON to this file.
    #[arg(long, value_name = "FILE")]
    pub json: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        AppConfig::command().debug_assert();
    }

    #[test]
    fn chart_defaults_build_request() {
        let config = AppConfig::parse_from(["atr-levels", "chart", "dxy"]);
        let Command::Chart(args) = config.command else {
            panic!("expected chart command");
        };
        let request = args.render_request();
        assert_eq!(request.symbol, "DX-Y.NYB");
        assert_eq!(request.period, Period::Daily);
        assert_eq!(request.display_count, 120);
        assert_eq!(request.moving_averages, vec![20, 60]);
        assert_eq!(request.toggles, IndicatorToggles::default());
        assert!(!request.focus_mode);
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn chart_flags_map_onto_toggles() {
        let config = AppConfig::parse_from([
            "atr-levels",
            "--data-dir",
            "/tmp/bars",
            "chart",
            "2330",
            "--period",
            "weekly",
            "--ma",
            "5,10",
            "--bollinger",
            "--hide-atr",
            "--focus",
            "--start",
            "2023-01-31",
        ]);
        let Command::Chart(args) = config.command else {
            panic!("expected chart command");
        };
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2023, 1, 31));
        let request = args.render_request();
        assert_eq!(request.symbol, "2330.TW");
        assert_eq!(request.period, Period::Weekly);
        assert_eq!(request.moving_averages, vec![5, 10]);
        assert!(request.toggles.show_bollinger);
        assert!(!request.toggles.show_atr);
        assert!(request.toggles.show_stochastic);
        assert!(request.focus_mode);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/bars"));
    }

    #[test]
    fn repeated_moving_average_windows_collapse() {
        let config = AppConfig::parse_from(["atr-levels", "chart", "NVDA", "--ma", "20,60,20,5"]);
        let Command::Chart(args) = config.command else {
            panic!("expected chart command");
        };
        let request = args.render_request();
        assert_eq!(request.moving_averages, vec![20, 60, 5]);

        let plan = crate::layout::plan_chart(
            request.toggles,
            request.focus_mode,
            &request.moving_averages,
            crate::layout::market_palette(&request.symbol),
        );
        assert_eq!(plan.series.iter().filter(|s| s.name == "ma_20").count(), 1);
    }

    #[test]
    fn compare_defaults_to_taiex() {
        let config = AppConfig::parse_from(["atr-levels", "compare", "NVDA"]);
        let Command::Compare(args) = config.command else {
            panic!("expected compare command");
        };
        assert_eq!(args.second, "^TWII");
        assert_eq!(args.lookback_days, 365);
    }
}
