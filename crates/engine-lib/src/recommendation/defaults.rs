//! Completing partial config maps
//!
//! Every consumer downstream of the computer expects a full
//! `{requests, limits} × {cpu, memory}` grid with numeric amounts.

use crate::models::{
    Recommendation, RecommendationConfig, RecommendationConfigItem, RESOURCES, SETTINGS,
};

impl RecommendationConfig {
    /// Fill every missing item, amount or format with its default
    pub fn with_defaults(&self) -> RecommendationConfig {
        let mut out = self.clone();
        for setting in SETTINGS {
            for kind in RESOURCES {
                let item = out.0.entry(setting).or_default().entry(kind).or_default();
                if item.amount.is_none() {
                    item.amount = Some(0.0);
                }
                if item.format.as_deref().map(str::trim).unwrap_or("").is_empty() {
                    item.format = Some(kind.default_format().to_string());
                }
            }
        }
        out
    }

    /// Defaulted copy of an optional map
    pub fn defaulted(config: Option<&RecommendationConfig>) -> RecommendationConfig {
        config.cloned().unwrap_or_default().with_defaults()
    }
}

impl Recommendation {
    /// Copy with `config`, `currentConfig` and `variation` completed
    pub fn with_defaults(&self) -> Recommendation {
        Recommendation {
            config: Some(RecommendationConfig::defaulted(self.config.as_ref())),
            current_config: Some(RecommendationConfig::defaulted(self.current_config.as_ref())),
            variation: Some(RecommendationConfig::defaulted(self.variation.as_ref())),
            ..self.clone()
        }
    }
}

impl RecommendationConfigItem {
    /// Item stripped of error text, as used in summaries
    pub fn without_error(&self) -> RecommendationConfigItem {
        RecommendationConfigItem {
            error_msg: None,
            ..self.clone()
        }
    }
}
