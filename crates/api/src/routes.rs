use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::Method,
    routing::{get, post},
    Json, Router,
};
use graph::GraphData;
use query::{RetrievalConfig, RetrievalResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::cache::CacheStats;
use crate::catalog::GraphMeta;
use crate::error::ApiError;
use crate::metrics::MetricsSnapshot;
use crate::service::{GraphService, KnowledgeGraphView};

type AppState = Arc<GraphService>;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    cache: Option<CacheStats>,
}

#[derive(Debug, Deserialize)]
struct SubgraphRequest {
    #[serde(default)]
    entity_name: String,
    depth: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RetrievalRequest {
    #[serde(default)]
    question: String,
    similarity_threshold: Option<f64>,
    subgraph_depth: Option<usize>,
}

pub fn router(service: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/graphs", get(list_graphs))
        .route("/graphs/:graph_id", get(graph_detail))
        .route("/graphs/:graph_id/knowledge_graph", get(knowledge_graph))
        .route("/graphs/:graph_id/subgraph", post(subgraph))
        .route("/graphs/:graph_id/retrieval", post(retrieval))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service)
}

/// Count the request outcome and wrap the body.
fn finish<T>(service: &GraphService, result: Result<T, ApiError>) -> Result<Json<T>, ApiError> {
    service.metrics().record_request(result.is_ok());
    result.map(Json)
}

async fn health_check(State(service): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        cache: service.cache_stats(),
    })
}

async fn list_graphs(State(service): State<AppState>) -> Result<Json<Vec<GraphMeta>>, ApiError> {
    let result = service.list_graphs().await;
    finish(&service, result)
}

async fn graph_detail(
    State(service): State<AppState>,
    Path(graph_id): Path<String>,
) -> Result<Json<GraphMeta>, ApiError> {
    let result = service.meta(&graph_id).await;
    finish(&service, result)
}

async fn knowledge_graph(
    State(service): State<AppState>,
    Path(graph_id): Path<String>,
) -> Result<Json<KnowledgeGraphView>, ApiError> {
    let result = service.knowledge_graph(&graph_id).await;
    finish(&service, result)
}

async fn subgraph(
    State(service): State<AppState>,
    Path(graph_id): Path<String>,
    body: Result<Json<SubgraphRequest>, JsonRejection>,
) -> Result<Json<GraphData>, ApiError> {
    let result = match request_body(body) {
        Ok(req) if req.entity_name.trim().is_empty() => {
            Err(ApiError::InvalidRequest("entity_name is required".to_string()))
        }
        Ok(req) => {
            let depth = req.depth.unwrap_or(service.defaults().subgraph_depth);
            service.subgraph(&graph_id, &req.entity_name, depth).await
        }
        Err(e) => Err(e),
    };
    finish(&service, result)
}

async fn retrieval(
    State(service): State<AppState>,
    Path(graph_id): Path<String>,
    body: Result<Json<RetrievalRequest>, JsonRejection>,
) -> Result<Json<RetrievalResult>, ApiError> {
    let result = match request_body(body).and_then(|req| {
        let config = retrieval_config(&service, &req)?;
        Ok((req, config))
    }) {
        Ok((req, config)) => service.retrieve(&graph_id, &req.question, config).await,
        Err(e) => Err(e),
    };
    finish(&service, result)
}

/// Unwrap a JSON body, turning extractor rejections into the API error shape.
fn request_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(req)| req)
        .map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))
}

fn retrieval_config(
    service: &GraphService,
    req: &RetrievalRequest,
) -> Result<RetrievalConfig, ApiError> {
    if req.question.trim().is_empty() {
        return Err(ApiError::InvalidRequest("question is required".to_string()));
    }

    let defaults = service.defaults();
    let similarity_threshold = req
        .similarity_threshold
        .unwrap_or(defaults.similarity_threshold);
    if !(0.0..=1.0).contains(&similarity_threshold) {
        return Err(ApiError::InvalidRequest(format!(
            "similarity_threshold must be between 0.0 and 1.0, got {}",
            similarity_threshold
        )));
    }

    Ok(RetrievalConfig {
        similarity_threshold,
        subgraph_depth: req.subgraph_depth.unwrap_or(defaults.subgraph_depth),
    })
}

async fn metrics(State(service): State<AppState>) -> Json<MetricsSnapshot> {
    Json(service.metrics().snapshot())
}
