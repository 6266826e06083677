//! Summarize request parsing and scope resolution

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::rollup::Scope;
use crate::error::{EngineError, Result};

/// Raw query parameters, validated by [`SummarizeQuery::validate`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeQuery {
    #[serde(default)]
    pub summarize_type: Option<String>,
    #[serde(default)]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub namespace_name: Option<String>,
    #[serde(default, rename = "fetchFromDB")]
    pub fetch_from_db: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarizeType {
    Cluster,
    Namespace,
}

impl FromStr for SummarizeType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cluster" => Ok(SummarizeType::Cluster),
            "namespace" => Ok(SummarizeType::Namespace),
            other => Err(EngineError::InvalidScopeRequest(format!(
                "summarizeType must be `cluster` or `namespace`, got `{}`",
                other
            ))),
        }
    }
}

impl fmt::Display for SummarizeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummarizeType::Cluster => write!(f, "cluster"),
            SummarizeType::Namespace => write!(f, "namespace"),
        }
    }
}

fn parse_flag(raw: Option<&str>) -> Result<bool> {
    match raw.map(str::trim) {
        None | Some("") => Ok(false),
        Some(v) if v.eq_ignore_ascii_case("true") => Ok(true),
        Some(v) if v.eq_ignore_ascii_case("false") => Ok(false),
        Some(v) => Err(EngineError::InvalidScopeRequest(format!(
            "fetchFromDB must be `true` or `false`, got `{}`",
            v
        ))),
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// A validated summarize request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizeRequest {
    pub summarize_type: SummarizeType,
    pub cluster_name: Option<String>,
    pub namespace_name: Option<String>,
    pub fetch_fresh: bool,
}

/// What a request asks to summarize
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeSelection {
    One(Scope),
    AllClusters,
    AllNamespaces,
}

impl ScopeSelection {
    /// Expand to concrete scopes given the names a source knows about
    pub fn expand(&self, known: impl IntoIterator<Item = String>) -> Vec<Scope> {
        match self {
            ScopeSelection::One(scope) => vec![scope.clone()],
            ScopeSelection::AllClusters => known.into_iter().map(Scope::Cluster).collect(),
            ScopeSelection::AllNamespaces => known.into_iter().map(Scope::Namespace).collect(),
        }
    }
}

impl SummarizeQuery {
    pub fn validate(&self) -> Result<SummarizeRequest> {
        let summarize_type: SummarizeType = self
            .summarize_type
            .as_deref()
            .ok_or_else(|| EngineError::InvalidScopeRequest("summarizeType is required".to_string()))?
            .parse()?;
        let request = SummarizeRequest {
            summarize_type,
            cluster_name: non_empty(&self.cluster_name),
            namespace_name: non_empty(&self.namespace_name),
            fetch_fresh: parse_flag(self.fetch_from_db.as_deref())?,
        };
        request.selection()?;
        Ok(request)
    }
}

impl SummarizeRequest {
    pub fn selection(&self) -> Result<ScopeSelection> {
        let cluster = self.cluster_name.clone();
        let namespace = self.namespace_name.clone();
        match (self.summarize_type, cluster, namespace) {
            (_, Some(cluster), Some(namespace)) => {
                Ok(ScopeSelection::One(Scope::ClusterNamespace { cluster, namespace }))
            }
            (SummarizeType::Cluster, Some(cluster), None) => Ok(ScopeSelection::One(Scope::Cluster(cluster))),
            (SummarizeType::Cluster, None, None) => Ok(ScopeSelection::AllClusters),
            (SummarizeType::Cluster, None, Some(_)) => Err(EngineError::InvalidScopeRequest(
                "a cluster summary filtered by namespace needs clusterName".to_string(),
            )),
            (SummarizeType::Namespace, None, Some(namespace)) => {
                Ok(ScopeSelection::One(Scope::Namespace(namespace)))
            }
            (SummarizeType::Namespace, None, None) => Ok(ScopeSelection::AllNamespaces),
            (SummarizeType::Namespace, Some(_), None) => Err(EngineError::InvalidScopeRequest(
                "a namespace summary filtered by cluster needs namespaceName".to_string(),
            )),
        }
    }
}
