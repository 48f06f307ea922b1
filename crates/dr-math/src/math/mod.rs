//! Core math modules.

pub mod correlation;
pub mod decay;
pub mod holt_winters;
mod keys;
pub mod population;
pub mod smoothing;
pub mod transform;
pub mod zscore;
