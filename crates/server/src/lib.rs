//! Rightsizer HTTP server
//!
//! Exposes the summarize service, stored recommendations, health probes
//! and Prometheus metrics over axum.

pub mod api;
pub mod config;
