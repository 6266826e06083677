//! Right-sizing recommendation engine
//!
//! This crate provides:
//! - Duration-windowed CPU/memory sizing from aggregated interval metrics
//! - A closed notification registry mapped to severities and action buckets
//! - Commutative summary merges and cluster/namespace rollups
//! - A read-through summary cache and the service that drives it
//! - Health checks and observability

pub mod error;
pub mod health;
pub mod models;
pub mod notification;
pub mod observability;
pub mod recommendation;
pub mod service;
pub mod source;
pub mod summary;

pub use error::{EngineError, Result};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use notification::{
    classify_actions, ActionBucket, ActionResource, NotificationCode, RecommendationNotification,
    Severity,
};
pub use observability::{EngineMetrics, StructuredLogger};
pub use recommendation::{ComputedRecommendations, RecommendationComputer};
pub use service::SummarizeService;
pub use source::{InMemorySource, RecommendationFilter, SourceDocument, WorkloadSource};
pub use summary::{
    ActionSummary, RecommendationSummary, RollupAggregator, Scope, SummarizeQuery, SummarizeResult,
    SummaryCache,
};
