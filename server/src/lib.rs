use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tiersearch_core::persist::load_index;
use tiersearch_core::tokenizer::tokenize;
use tiersearch_core::{Hit, InvertedIndex, Postings, QueryEngine};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_ms: u128,
    pub total_hits: usize,
    pub results: Vec<Hit>,
}

#[derive(Serialize)]
pub struct TermResponse {
    pub term: String,
    pub postings: BTreeMap<String, Postings>,
}

#[derive(Serialize)]
pub struct ReloadResponse {
    pub pages: usize,
    pub terms: usize,
}

/// Shared handle to the served index.
///
/// Readers clone the inner `Arc` and query that snapshot; a reload swaps in a
/// new index without touching one a query may still be reading.
#[derive(Clone)]
pub struct AppState {
    pub index_path: PathBuf,
    pub index: Arc<RwLock<Arc<InvertedIndex>>>,
}

impl AppState {
    pub fn load(index_path: PathBuf) -> Result<Self> {
        let index = load_index(&index_path)?;
        tracing::info!(path = %index_path.display(), pages = index.num_pages(), terms = index.num_terms(), "index loaded");
        Ok(Self { index_path, index: Arc::new(RwLock::new(Arc::new(index))) })
    }

    fn snapshot(&self) -> Arc<InvertedIndex> {
        self.index.read().clone()
    }
}

pub fn build_app(index_path: PathBuf) -> Result<Router> {
    let app_state = AppState::load(index_path)?;

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/term/:word", get(term_handler))
        .route("/reload", post(reload_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let index = state.snapshot();
    let mut hits = QueryEngine::new(&index).query(&params.q);
    let total_hits = hits.len();
    hits.truncate(params.k.clamp(1, 100));
    let took_ms = start.elapsed().as_millis();
    tracing::debug!(query = %params.q, total_hits, took_ms = took_ms as u64, "search");
    Json(SearchResponse { query: params.q, took_ms, total_hits, results: hits })
}

pub async fn term_handler(
    State(state): State<AppState>,
    Path(word): Path<String>,
) -> Result<Json<TermResponse>, (StatusCode, String)> {
    let term = tokenize(&word).concat();
    let index = state.snapshot();
    let postings = index
        .postings(&term)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("no entry found for '{term}'")))?;
    let postings = postings.iter().map(|(page, p)| (page.clone(), p.clone())).collect();
    Ok(Json(TermResponse { term, postings }))
}

pub async fn reload_handler(State(state): State<AppState>) -> Result<Json<ReloadResponse>, (StatusCode, String)> {
    let index = load_index(&state.index_path).map_err(|e| {
        tracing::warn!(error = %e, "reload failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    let resp = ReloadResponse { pages: index.num_pages(), terms: index.num_terms() };
    *state.index.write() = Arc::new(index);
    tracing::info!(pages = resp.pages, terms = resp.terms, "index reloaded");
    Ok(Json(resp))
}
