//! In-process fake REST backend for integration tests.
//!
//! Serves the generic resource routes the dispatcher targets
//! (`/api/v1/{Resource}` and `/api/v1/{Resource}/{id}`) over an in-memory
//! store, plus a few deliberately awkward routes for failure-path tests:
//! a fixed-status endpoint, a slow endpoint, and optional bearer-auth
//! enforcement.

use anyhow::Context as _;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use parking_lot::RwLock;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

#[derive(Clone)]
struct AppState {
    /// Entities per resource collection name (e.g. "Books").
    store: Arc<RwLock<HashMap<String, Vec<Value>>>>,
    /// When set, every `/api/v1/*` route demands `Authorization: Bearer <t>`.
    require_bearer: Option<Arc<str>>,
}

/// A running fake API bound to an ephemeral localhost port.
pub struct FakeRestApi {
    pub base_url: String,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<std::io::Result<()>>,
}

#[derive(Default)]
pub struct FakeRestApiBuilder {
    require_bearer: Option<String>,
}

impl FakeRestApiBuilder {
    /// Demand a bearer token on every resource route (401 otherwise).
    #[must_use]
    pub fn require_bearer(mut self, token: &str) -> Self {
        self.require_bearer = Some(token.to_string());
        self
    }

    /// Bind an ephemeral port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn spawn(self) -> anyhow::Result<FakeRestApi> {
        let state = AppState {
            store: Arc::new(RwLock::new(HashMap::new())),
            require_bearer: self.require_bearer.map(Arc::from),
        };

        let app = Router::new()
            .route(
                "/api/v1/Authors/authors/books/{idBook}",
                get(list_authors_for_book),
            )
            .route("/api/v1/{resource}", get(list_entities).post(create_entity))
            .route(
                "/api/v1/{resource}/{id}",
                get(get_entity).put(update_entity).delete(delete_entity),
            )
            .route("/__status/{code}", any(fixed_status))
            .route("/__slow", get(slow))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind ephemeral port for fake API")?;
        let addr = listener.local_addr().context("local_addr")?;
        let base_url = format!("http://{addr}");

        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        let handle = tokio::spawn(async move { server.await });

        Ok(FakeRestApi {
            base_url,
            shutdown,
            handle,
        })
    }
}

impl FakeRestApi {
    #[must_use]
    pub fn builder() -> FakeRestApiBuilder {
        FakeRestApiBuilder::default()
    }

    /// Spawn with default settings (no auth).
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::builder().spawn().await
    }

    /// Stop the server and wait for it to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the server task panicked or failed.
    pub async fn stop(self) -> anyhow::Result<()> {
        let _ = self.shutdown.send(());
        self.handle.await.context("join fake API task")??;
        Ok(())
    }
}

fn check_auth(state: &AppState, headers: &HeaderMap) -> Result<(), Response> {
    let Some(expected) = &state.require_bearer else {
        return Ok(());
    };
    let ok = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {expected}"));
    if ok {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({ "message": "missing or invalid bearer token" })),
        )
            .into_response())
    }
}

fn entity_id(entity: &Value) -> Option<i64> {
    entity.get("id").and_then(Value::as_i64)
}

async fn list_entities(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = check_auth(&state, &headers) {
        return resp;
    }
    let store = state.store.read();
    let entities = store.get(&resource).cloned().unwrap_or_default();
    axum::Json(Value::Array(entities)).into_response()
}

async fn create_entity(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<Value>,
) -> Response {
    if let Err(resp) = check_auth(&state, &headers) {
        return resp;
    }
    state
        .store
        .write()
        .entry(resource)
        .or_default()
        .push(body.clone());
    axum::Json(body).into_response()
}

async fn get_entity(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, i64)>,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = check_auth(&state, &headers) {
        return resp;
    }
    let store = state.store.read();
    let found = store
        .get(&resource)
        .and_then(|entities| entities.iter().find(|e| entity_id(e) == Some(id)))
        .cloned();
    match found {
        Some(entity) => axum::Json(entity).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "message": format!("{resource} id {id} not found") })),
        )
            .into_response(),
    }
}

async fn update_entity(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, i64)>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<Value>,
) -> Response {
    if let Err(resp) = check_auth(&state, &headers) {
        return resp;
    }
    let mut store = state.store.write();
    let Some(slot) = store
        .get_mut(&resource)
        .and_then(|entities| entities.iter_mut().find(|e| entity_id(e) == Some(id)))
    else {
        return (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "message": format!("{resource} id {id} not found") })),
        )
            .into_response();
    };
    *slot = body.clone();
    axum::Json(body).into_response()
}

async fn delete_entity(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, i64)>,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = check_auth(&state, &headers) {
        return resp;
    }
    if let Some(entities) = state.store.write().get_mut(&resource) {
        entities.retain(|e| entity_id(e) != Some(id));
    }
    // Empty 204, the shape that trips parsers expecting a body.
    StatusCode::NO_CONTENT.into_response()
}

async fn list_authors_for_book(
    State(state): State<AppState>,
    Path(id_book): Path<i64>,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = check_auth(&state, &headers) {
        return resp;
    }
    let store = state.store.read();
    let matching: Vec<Value> = store
        .get("Authors")
        .map(|entities| {
            entities
                .iter()
                .filter(|e| e.get("idBook").and_then(Value::as_i64) == Some(id_book))
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    axum::Json(Value::Array(matching)).into_response()
}

async fn fixed_status(Path(code): Path<u16>) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        axum::Json(json!({ "message": format!("forced status {code}") })),
    )
        .into_response()
}

async fn slow() -> Response {
    tokio::time::sleep(Duration::from_secs(30)).await;
    axum::Json(json!({ "late": true })).into_response()
}
