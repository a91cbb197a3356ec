use crate::data::{Bar, ChangeDescriptor, Direction, IndicatorSeries, LevelPair, LevelSummary};
use crate::error::PipelineError;

/// Resistance one ATR above the bar's high, support one ATR below its low.
pub fn level_pair(bar: &Bar, atr: f64) -> LevelPair {
    LevelPair {
        resistance: bar.high + atr,
        support: bar.low - atr,
    }
}

pub fn change_descriptor(latest: &Bar, previous: &Bar) -> ChangeDescriptor {
    let absolute = latest.close - previous.close;
    let direction = if latest.close >= previous.close {
        Direction::Up
    } else {
        Direction::Down
    };
    ChangeDescriptor {
        absolute,
        percent: absolute / previous.close * 100.0,
        direction,
    }
}

/// Levels and change for the last bar of `bars`, using the aligned ATR value.
pub fn compute_levels(bars: &[Bar], atr: &IndicatorSeries) -> Result<LevelSummary, PipelineError> {
    let insufficient = || PipelineError::InsufficientBars {
        required: 2,
        got: bars.len(),
    };
    let [.., previous, latest] = bars else {
        return Err(insufficient());
    };
    let current_atr = atr.get(bars.len() - 1).ok_or_else(insufficient)?;

    Ok(LevelSummary {
        levels: level_pair(latest, current_atr),
        change: change_descriptor(latest, previous),
        atr: current_atr,
        latest: latest.clone(),
    })
}
