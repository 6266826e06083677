//! Integration tests for the server API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use engine_lib::{
    health::{components, HealthRegistry},
    ContainerRecommendations, InMemorySource, NotificationCode, Recommendation,
    RecommendationConfig, RecommendationConfigItem, RecommendationTree, ResourceKind,
    ResourceSetting, SummarizeService, SummaryCache, WorkloadRecommendations, DURATION_BASED,
};
use rightsizer_server::api::{create_router, AppState};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::ServiceExt;

fn workload(cluster: &str, namespace: &str, name: &str, codes: &[NotificationCode]) -> WorkloadRecommendations {
    let ts = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
    let mut config = RecommendationConfig::new();
    config.set(
        ResourceSetting::Requests,
        ResourceKind::Cpu,
        RecommendationConfigItem::new(0.5, "cores"),
    );
    let mut rec = Recommendation {
        monitoring_start_time: None,
        monitoring_end_time: ts,
        duration_in_hours: 24.0,
        config: Some(config),
        current_config: None,
        variation: None,
        notifications: BTreeMap::new(),
    };
    for code in codes {
        rec.notify(*code);
    }

    let mut periods = BTreeMap::new();
    periods.insert("short_term".to_string(), rec);
    let mut categories = BTreeMap::new();
    categories.insert(DURATION_BASED.to_string(), periods);
    let mut tree = RecommendationTree::new();
    tree.insert(ts, categories);

    WorkloadRecommendations {
        cluster_name: cluster.to_string(),
        namespace: namespace.to_string(),
        workload_name: name.to_string(),
        workload_type: "deployment".to_string(),
        containers: vec![ContainerRecommendations {
            container_name: "app".to_string(),
            container_image: None,
            recommendations: tree,
        }],
    }
}

async fn setup_test_app() -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    health_registry.register(components::SOURCE).await;
    health_registry.register(components::CACHE).await;

    let source = InMemorySource::new(vec![
        workload("prod", "default", "api", &[NotificationCode::CriticalCpuRequestNotSet]),
        workload("prod", "default", "web", &[]),
        workload("staging", "jobs", "batch", &[]),
    ])
    .unwrap();
    let service = Arc::new(SummarizeService::new(
        Arc::new(source),
        Arc::new(SummaryCache::new()),
        health_registry.clone(),
        "api-tests",
    ));
    let state = Arc::new(AppState::new(health_registry, service));
    let router = create_router(state.clone());

    (router, state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_summarize_cluster() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = get(app, "/summarize?summarizeType=cluster&clusterName=prod").await;

    assert_eq!(status, StatusCode::OK);
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["clusterName"], "prod");
    assert_eq!(results[0]["workloads"]["count"], 2);
    assert_eq!(results[0]["namespaces"]["count"], 1);
    assert_eq!(results[0]["actionSummaryTopLevel"]["critical"]["cpu"]["count"], 1);
    assert_eq!(results[0]["actionSummaryTopLevel"]["optimizable"]["cpu"]["count"], 1);
}

#[tokio::test]
async fn test_summarize_all_namespaces() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = get(app, "/summarize?summarizeType=NAMESPACE").await;

    assert_eq!(status, StatusCode::OK);
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["namespaceName"], "default");
    assert_eq!(results[1]["clusters"]["count"], 1);
}

#[tokio::test]
async fn test_summarize_invalid_type_is_400() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = get(app, "/summarize?summarizeType=pod").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "ERROR");
    assert_eq!(body["httpcode"], 400);
    assert!(body["message"].as_str().unwrap().contains("summarizeType"));
}

#[tokio::test]
async fn test_summarize_invalid_fetch_flag_is_400() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = get(app, "/summarize?summarizeType=cluster&fetchFromDB=sometimes").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("fetchFromDB"));
}

#[tokio::test]
async fn test_summarize_unknown_cluster_is_empty_array() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = get(app, "/summarize?summarizeType=cluster&clusterName=nowhere").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_fresh_clears_cache() {
    let (app, state) = setup_test_app().await;

    get(app.clone(), "/summarize?summarizeType=cluster&clusterName=prod").await;
    get(app.clone(), "/summarize?summarizeType=namespace&namespaceName=jobs").await;
    assert_eq!(state.service.cache().stats().namespace_entries, 1);

    let (status, _) = get(app, "/summarize?summarizeType=cluster&clusterName=prod&fetchFromDB=true").await;

    assert_eq!(status, StatusCode::OK);
    let stats = state.service.cache().stats();
    assert_eq!(stats.clears, 1);
    assert_eq!(stats.cluster_entries, 1);
    assert_eq!(stats.namespace_entries, 0);
}

#[tokio::test]
async fn test_recommendations_filtered() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = get(app, "/recommendations?clusterName=prod&workloadName=web").await;

    assert_eq!(status, StatusCode::OK);
    let workloads = body.as_array().unwrap();
    assert_eq!(workloads.len(), 1);
    assert_eq!(workloads[0]["workloadName"], "web");
    assert!(workloads[0]["containers"][0]["recommendations"].is_object());
}

#[tokio::test]
async fn test_healthz_returns_ok_when_degraded() {
    let (app, state) = setup_test_app().await;

    state
        .health_registry
        .set_degraded(components::SOURCE, "no data path")
        .await;

    let (status, body) = get(app, "/healthz").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert!(body["components"]["workload_source"].is_object());
    assert!(body["components"]["summary_cache"].is_object());
}

#[tokio::test]
async fn test_healthz_returns_503_when_unhealthy() {
    let (app, state) = setup_test_app().await;

    state
        .health_registry
        .set_unhealthy(components::SOURCE, "read failed")
        .await;

    let (status, body) = get(app, "/healthz").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
}

#[tokio::test]
async fn test_readyz_follows_startup_flag() {
    let (app, state) = setup_test_app().await;

    let (status, body) = get(app.clone(), "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["ready"], false);

    state.health_registry.set_ready(true).await;
    let (status, body) = get(app, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, _state) = setup_test_app().await;

    // populate the summarize histogram first
    get(app.clone(), "/summarize?summarizeType=cluster&clusterName=prod").await;

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("rightsizer_summarize_latency_seconds_bucket"));
    assert!(metrics_text.contains("rightsizer_summary_cache_misses_total"));
}
