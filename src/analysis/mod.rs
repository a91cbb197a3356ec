pub mod atr;
pub mod bollinger;
pub mod correlation;
pub mod ewm;
pub mod levels;
pub mod moving_average;
pub mod stochastic;

pub use atr::compute_atr;
pub use bollinger::compute_bollinger;
pub use correlation::{pearson, rebase};
pub use levels::compute_levels;
pub use moving_average::compute_sma;
pub use stochastic::compute_stochastic;
