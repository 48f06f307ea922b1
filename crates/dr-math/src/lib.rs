//! Device Risk math utilities.

pub mod error;
pub mod math;

pub use error::{MathError, Result};
pub use math::correlation::*;
pub use math::decay::*;
pub use math::holt_winters::*;
pub use math::population::*;
pub use math::smoothing::*;
pub use math::transform::*;
pub use math::zscore::*;
