//! Streaming analytics primitives
//!
//! Rolling history windows, exponential moving averages and the descriptive
//! statistics shared by the detectors.

mod ema;
mod stats;
mod window;

pub use ema::{Ema, DEFAULT_ALPHA, DEFAULT_SLOPE_HISTORY};
pub use stats::{mean, stddev};
pub use window::RollingWindow;
