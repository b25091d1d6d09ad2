//! ==============================================================================
//! server.rs - http surface
//! ==============================================================================
//!
//! routes:
//!     GET      /registo_lixo    device ingest, always "OK" (no auth)
//!     GET/POST /                login form / credential check
//!     GET      /dashboard       live dashboard (session cookie required)
//!     GET      /historico_lixo  20 most recent events as json (no auth)
//!
//! relationships:
//!     - uses: store.rs (EventStore), auth.rs (AuthGate), pages.rs (html)
//!     - used by: main.rs (run_server), tests/http.rs
//!
//! ==============================================================================

use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, Form, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::AuthGate;
use crate::domain::Event;
use crate::pages;
use crate::store::{EventStore, Recorded, HISTORY_LIMIT};

// ==============================================================================
// shared state
// ==============================================================================
// cloned into every handler. the store does its own locking, the gate is
// immutable after startup.

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EventStore>,
    pub auth: Arc<AuthGate>,
    /// render the fill-level flavour of the dashboard
    pub track_level: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(login_page).post(login_handler))
        .route("/dashboard", get(dashboard_handler))
        .route("/registo_lixo", get(ingest_handler))
        .route("/historico_lixo", get(history_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ==============================================================================
// ingest
// ==============================================================================

/// device ping: GET /registo_lixo?deposito=7&nivel=42
///
/// parameters are optional and never validated. a query string that cannot
/// be decoded is treated as empty. repeated keys: first value wins.
async fn ingest_handler(
    State(state): State<AppState>,
    query: Option<Query<Vec<(String, String)>>>,
) -> Response {
    let params = query.map(|Query(params)| params).unwrap_or_default();
    let param = |name: &str| {
        params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    };
    let count = param("deposito").unwrap_or_default();
    let level = param("nivel");

    // the file-backed store does blocking i/o
    let store = state.store.clone();
    let outcome = tokio::task::spawn_blocking(move || store.record(count, level)).await;

    match outcome {
        Ok(Ok(Recorded::Stored(event))) => {
            tracing::info!(
                hora = %event.timestamp,
                deposito = %event.count,
                nivel = event.level.as_deref().unwrap_or("-"),
                "event stored"
            );
            (StatusCode::OK, "OK").into_response()
        }
        Ok(Ok(Recorded::Duplicate)) => {
            tracing::debug!("duplicate count, event suppressed");
            (StatusCode::OK, "OK").into_response()
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "failed to persist event");
            (StatusCode::INTERNAL_SERVER_ERROR, "erro ao gravar").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "ingest task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// ==============================================================================
// history api
// ==============================================================================

/// json api consumed by the dashboard polling loop
///
/// reads can wait on the store lock while a file write is in flight, so
/// they run on the blocking pool like ingest does.
async fn history_handler(State(state): State<AppState>) -> Response {
    let store = state.store.clone();
    match tokio::task::spawn_blocking(move || store.recent(HISTORY_LIMIT)).await {
        Ok(events) => Json::<Vec<Event>>(events).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "history task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// ==============================================================================
// login + dashboard
// ==============================================================================

#[derive(Deserialize)]
struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

async fn login_page() -> Html<String> {
    Html(pages::login(None))
}

/// a body that is not a urlencoded form is just a failed login
async fn login_handler(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::warn!(%rejection, "unreadable login form");
            return Html(pages::login(Some(pages::LOGIN_ERROR))).into_response();
        }
    };

    if state.auth.authenticate(&form.username, &form.password) {
        tracing::info!("dashboard login");
        return (
            [(header::SET_COOKIE, state.auth.session_cookie())],
            Redirect::to("/dashboard"),
        )
            .into_response();
    }

    tracing::warn!("rejected dashboard login");
    Html(pages::login(Some(pages::LOGIN_ERROR))).into_response()
}

async fn dashboard_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !state.auth.is_authenticated(&headers) {
        return Redirect::to("/").into_response();
    }
    Html(pages::dashboard(state.track_level)).into_response()
}
