use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use clap::ValueEnum;
use serde::Serialize;

/// Single OHLCV bar sampled at a uniform interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub timestamp: DateTime<Tz>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Calendar date of the bar in its exchange time zone.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Attach an exchange time zone to a wall-clock timestamp.
///
/// Ambiguous local times resolve to the earlier instant; times that fall in a
/// DST gap are read as UTC.
pub fn localize(tz: Tz, datetime: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&datetime) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(dt, _) => dt,
        LocalResult::None => tz.from_utc_datetime(&datetime),
    }
}

/// Bar period the chart is drawn at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    /// Calendar days fetched per displayed bar.
    pub fn padding_days(self) -> i64 {
        match self {
            Period::Daily => 5,
            Period::Weekly => 30,
            Period::Monthly => 100,
        }
    }

    /// Label used for the most recent bar in the report.
    pub fn latest_label(self) -> &'static str {
        match self {
            Period::Daily => "Today",
            Period::Weekly => "This week",
            Period::Monthly => "This month",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
        };
        f.write_str(name)
    }
}

/// Named indicator values aligned one-to-one with a bar series.
///
/// `None` marks indices inside the lookback window or where the value is
/// otherwise undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<f64> {
        self.values.get(idx).copied().flatten()
    }

    pub fn last(&self) -> Option<f64> {
        self.values.last().copied().flatten()
    }

    /// Trailing `count` values, keeping alignment with the trailing bars.
    pub fn tail(&self, count: usize) -> Self {
        let start = self.values.len().saturating_sub(count);
        Self {
            name: self.name.clone(),
            values: self.values[start..].to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelPair {
    pub resistance: f64,
    pub support: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChangeDescriptor {
    pub absolute: f64,
    pub percent: f64,
    pub direction: Direction,
}

/// Levels and change of the latest bar against the one before it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelSummary {
    pub levels: LevelPair,
    pub change: ChangeDescriptor,
    pub atr: f64,
    pub latest: Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
    Gray,
    Orange,
    Purple,
    Blue,
    Magenta,
    Brown,
    Olive,
    #[serde(rename = "#00bcd4")]
    Cyan,
}

impl Color {
    pub fn as_str(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Gray => "gray",
            Color::Orange => "orange",
            Color::Purple => "purple",
            Color::Blue => "blue",
            Color::Magenta => "magenta",
            Color::Brown => "brown",
            Color::Olive => "olive",
            Color::Cyan => "#00bcd4",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    Solid,
    Dashed,
    Dotted,
}

/// How the renderer should draw a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Candles,
    VolumeBars,
    Line,
    HorizontalLevel,
}

/// Up/down colour pair used for candles, volume bars and change text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarketPalette {
    pub up: Color,
    pub down: Color,
}

impl MarketPalette {
    pub fn color_for(&self, direction: Direction) -> Color {
        match direction {
            Direction::Up => self.up,
            Direction::Down => self.down,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesStyle {
    pub name: String,
    pub panel: usize,
    pub kind: SeriesKind,
    /// `None` for series coloured per bar by the market palette.
    pub color: Option<Color>,
    pub line_style: LineStyle,
}

/// Constant-valued guide line drawn across a panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub panel: usize,
    pub value: f64,
    pub color: Color,
    pub line_style: LineStyle,
}

/// Panel layout handed to the renderer, rebuilt per request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPlan {
    pub panel_count: usize,
    /// Top-to-bottom, summing to 1.0.
    pub row_height_ratios: Vec<f64>,
    pub panel_titles: Vec<String>,
    pub panel_assignments: BTreeMap<String, usize>,
    pub series: Vec<SeriesStyle>,
    pub reference_lines: Vec<ReferenceLine>,
    pub palette: MarketPalette,
}

impl ChartPlan {
    pub fn panel_of(&self, series: &str) -> Option<usize> {
        self.panel_assignments.get(series).copied()
    }

    pub fn series_in_panel(&self, panel: usize) -> impl Iterator<Item = &SeriesStyle> + '_ {
        self.series.iter().filter(move |style| style.panel == panel)
    }
}
