use thiserror::Error;

/// Conditions the chart pipeline reports to the user instead of failing on.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no data returned for {symbol}")]
    FetchEmpty { symbol: String },

    #[error("{first} and {second} share no trading dates")]
    NoOverlap { first: String, second: String },

    #[error("not enough bars to compute levels (need {required}, got {got})")]
    InsufficientBars { required: usize, got: usize },
}
