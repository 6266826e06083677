//! Recommendation computation
//!
//! - `stats`: percentile and peak helpers
//! - `computer`: duration-windowed sizing with notifications
//! - `defaults`: completing partial config maps before summarizing

pub mod computer;
pub mod defaults;
pub mod stats;

pub use computer::{
    ComputedRecommendations, RecommendationComputer, CPU_FORMATS, CPU_IDLE_THRESHOLD_CORES,
    MEMORY_FORMATS, REQUEST_PERCENTILE,
};
pub use stats::{max_value, percentile};
