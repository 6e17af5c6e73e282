//! REST API for semdb.
//!
//! Exposes a shared [`CorpusService`] over JSON endpoints. The service is
//! registered as `web::Data` and every handler goes straight to it, so each
//! request sees the latest committed store contents.
//!
//! ## Endpoints
//!
//! - `GET /health` - Liveness plus the number of stored vectors
//! - `POST /insert` - Insert or update vectors
//! - `POST /search` - Search for similar vectors
//! - `POST /get` - Retrieve vectors by ID
//! - `POST /delete` - Delete vectors by ID
//!
//! Per-item validation failures are reported inside the response body with
//! `status: "error"`. A store failure stops the request with 503. For
//! `/insert` and `/delete` the 503 body still carries `error` plus the
//! items handled so far, so the caller knows which writes were applied;
//! items after the failing one were not attempted.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use actix_web::{web, App, HttpServer};
//! use semdb::{CorpusService, MemoryStore, SimilarityEngine};
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!     let service = CorpusService::new(Arc::new(MemoryStore::new()), SimilarityEngine::default());
//!     let data = web::Data::new(service);
//!     HttpServer::new(move || App::new().app_data(data.clone()).configure(semdb::server::config))
//!         .bind("127.0.0.1:7878")?
//!         .run()
//!         .await
//! }
//! ```

use actix_web::http::StatusCode;
use actix_web::{web, App, HttpResponse, HttpServer, ResponseError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Error;
use crate::service::{CorpusService, SearchOptions};


// --- Request structs ---

#[derive(Deserialize)]
struct VectorEntry {
    id: String,
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct Query {
    value: Vec<f32>,
    top_k: Option<usize>,
}

#[derive(Deserialize)]
struct InsertRequest {
    vectors: Vec<VectorEntry>,
}

#[derive(Deserialize)]
struct SearchRequest {
    queries: Vec<Query>,
    #[serde(default)]
    require_results: bool,
}

#[derive(Deserialize)]
struct IdsRequest {
    ids: Vec<String>,
}

// --- Response structs ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    count: usize,
}

#[derive(Serialize)]
struct InsertResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    inserted: usize,
    results: Vec<ItemResult>,
}

#[derive(Serialize)]
struct ItemResult {
    id: String,
    status: &'static str,
    message: String,
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchResultGroup>,
}

#[derive(Serialize)]
struct SearchResultGroup {
    status: &'static str,
    message: String,
    matches: Vec<MatchResult>,
}

#[derive(Serialize)]
struct MatchResult {
    id: String,
    score: f32,
}

#[derive(Serialize)]
struct GetResponse {
    results: Vec<GetResult>,
}

#[derive(Serialize)]
struct GetResult {
    id: String,
    values: Option<Vec<f32>>,
}

#[derive(Serialize)]
struct DeleteResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    deleted: usize,
    results: Vec<ItemResult>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::EmptyCorpus => StatusCode::NOT_FOUND,
            Error::InvalidArgument(_) | Error::DimensionMismatch { .. } | Error::ZeroVector => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse { error: self.to_string() })
    }
}

// --- Handlers ---

async fn health_handler(service: web::Data<CorpusService>) -> Result<HttpResponse, Error> {
    let count = service.count()?;
    Ok(HttpResponse::Ok().json(HealthResponse { status: "ok", count }))
}

async fn insert_handler(
    service: web::Data<CorpusService>,
    body: web::Json<InsertRequest>,
) -> Result<HttpResponse, Error> {
    let mut results = Vec::new();
    let mut inserted = 0;

    for entry in body.into_inner().vectors {
        match service.add(entry.id.clone(), entry.values) {
            Ok(()) => {
                inserted += 1;
                results.push(ItemResult {
                    id: entry.id,
                    status: "ok",
                    message: "Upserted".to_string(),
                });
            }
            Err(e @ Error::StoreUnavailable(_)) => {
                warn!(id = %entry.id, inserted, error = %e, "insert batch stopped by store failure");
                results.push(ItemResult {
                    id: entry.id,
                    status: "error",
                    message: e.to_string(),
                });
                return Ok(HttpResponse::build(e.status_code()).json(InsertResponse {
                    error: Some(e.to_string()),
                    inserted,
                    results,
                }));
            }
            Err(e) => {
                results.push(ItemResult {
                    id: entry.id,
                    status: "error",
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(HttpResponse::Ok().json(InsertResponse { error: None, inserted, results }))
}

async fn search_handler(
    service: web::Data<CorpusService>,
    body: web::Json<SearchRequest>,
) -> Result<HttpResponse, Error> {
    let mut results = Vec::new();

    for query in &body.queries {
        let options = SearchOptions {
            k: query.top_k.unwrap_or(service.default_k()),
            require_results: body.require_results,
        };

        match service.search_with(&query.value, options) {
            Ok(hits) => {
                results.push(SearchResultGroup {
                    status: "ok",
                    message: format!("{} matches", hits.len()),
                    matches: hits
                        .into_iter()
                        .map(|hit| MatchResult { id: hit.id, score: hit.score })
                        .collect(),
                });
            }
            Err(e @ Error::StoreUnavailable(_)) => return Err(e),
            Err(e) => {
                results.push(SearchResultGroup {
                    status: "error",
                    message: e.to_string(),
                    matches: Vec::new(),
                });
            }
        }
    }

    Ok(HttpResponse::Ok().json(SearchResponse { results }))
}

async fn get_handler(
    service: web::Data<CorpusService>,
    body: web::Json<IdsRequest>,
) -> Result<HttpResponse, Error> {
    let mut results = Vec::new();

    for id in body.into_inner().ids {
        let values = service.get(&id)?;
        results.push(GetResult { id, values });
    }

    Ok(HttpResponse::Ok().json(GetResponse { results }))
}

async fn delete_handler(
    service: web::Data<CorpusService>,
    body: web::Json<IdsRequest>,
) -> Result<HttpResponse, Error> {
    let mut results = Vec::new();

    let mut deleted = 0;

    for id in body.into_inner().ids {
        if let Err(e) = service.remove(&id) {
            warn!(id = %id, deleted, error = %e, "delete batch stopped by store failure");
            results.push(ItemResult {
                id,
                status: "error",
                message: e.to_string(),
            });
            return Ok(HttpResponse::build(e.status_code()).json(DeleteResponse {
                error: Some(e.to_string()),
                deleted,
                results,
            }));
        }
        deleted += 1;
        results.push(ItemResult {
            id,
            status: "ok",
            message: "Deleted".to_string(),
        });
    }

    Ok(HttpResponse::Ok().json(DeleteResponse { error: None, deleted, results }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health_handler)))
       .service(web::resource("/insert").route(web::post().to(insert_handler)))
       .service(web::resource("/search").route(web::post().to(search_handler)))
       .service(web::resource("/get").route(web::post().to(get_handler)))
       .service(web::resource("/delete").route(web::post().to(delete_handler)));
}

/// Serves `service` on `host:port` until the server is stopped.
pub async fn run(service: CorpusService, host: &str, port: u16) -> std::io::Result<()> {
    let data = web::Data::new(service);

    info!(host, port, "starting http server");
    HttpServer::new(move || App::new().app_data(data.clone()).configure(config))
        .bind((host, port))?
        .run()
        .await
}
