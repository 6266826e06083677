//! Summaries and scope rollups
//!
//! A `Recommendation` is converted into a summable `RecommendationSummary`;
//! summaries merge by summing config amounts, adding severity counters and
//! unioning action-bucket workload sets. The rollup folds every summary of
//! every workload in a scope into one `SummarizeResult`, which the cache
//! memoizes per cluster or per namespace.

mod action;
mod cache;
mod request;
mod rollup;
mod summarizer;

#[cfg(test)]
mod tests;

pub use action::{ActionSummary, ResourceInfo};
pub use cache::{CacheStats, SummaryCache};
pub use request::{ScopeSelection, SummarizeQuery, SummarizeRequest, SummarizeType};
pub use rollup::{
    NameSet, RollupAccumulator, RollupAggregator, Scope, SummarizeResult, SummaryTree,
};
pub use summarizer::{
    convert_to_summary, merge_summaries, ChangeKind, NotificationsSummary, RecommendationSummary,
};
