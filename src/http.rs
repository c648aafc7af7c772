use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
};

use axum::{
    body::Bytes,
    extract::{ConnectInfo, Query, Request, State},
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN},
        HeaderMap, HeaderName, Method,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    request::{AddRequest, ContentQuery, InfoQuery, KeyRequest, UpdateRequest},
    response::ErrorResponse,
    timelock::TimeLockStore,
};

pub type SharedStore = Arc<Mutex<TimeLockStore>>;

const API_PREFIX: &str = "/api/timelock";

/// Builds the service. In test mode the store is reloaded from its backend
/// before every request, so a harness can rewrite the document in between.
pub fn router(store: SharedStore, test_mode: bool) -> Router {
    let api = Router::new()
        .route("/", get(hello))
        .route("/ping", get(ping))
        .route("/getContent", get(get_content))
        .route("/add", post(add))
        .route("/update", put(update))
        .route("/requestToUnblockContent", patch(request_unblock))
        .route("/blockContent", patch(block))
        .route("/getInfo", get(get_info));

    let mut app = Router::new()
        .route(&format!("{API_PREFIX}/"), get(hello))
        .nest(API_PREFIX, api)
        .fallback(not_found);
    if test_mode {
        app = app.layer(middleware::from_fn_with_state(
            store.clone(),
            reload_before_request,
        ));
    }
    app.layer(middleware::from_fn(log_request))
        .layer(cors())
        .with_state(store)
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::PUT,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::GET,
        ])
        .allow_headers([
            ORIGIN,
            HeaderName::from_static("x-requested-with"),
            CONTENT_TYPE,
            ACCEPT,
            AUTHORIZATION,
        ])
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    tracing::info!("METHOD: [{}] - URL: [{}] - IP: [{}]", method, uri, ip);
    let response = next.run(request).await;
    tracing::info!(
        "METHOD: [{}] - URL: [{}] - STATUS: [{}] - IP: [{}]",
        method,
        uri,
        response.status().as_u16(),
        ip
    );
    response
}

async fn reload_before_request(
    State(store): State<SharedStore>,
    request: Request,
    next: Next,
) -> Result<Response, ErrorResponse> {
    {
        let mut store = lock(&store)?;
        store.reload().map_err(internal)?;
    }
    Ok(next.run(request).await)
}

fn lock(store: &SharedStore) -> Result<MutexGuard<'_, TimeLockStore>, ErrorResponse> {
    store
        .lock()
        .map_err(|_| ErrorResponse::Internal("store lock poisoned".to_string()))
}

fn bad_request(e: anyhow::Error) -> ErrorResponse {
    ErrorResponse::BadRequest(e.to_string())
}

/// Unblock and block accept either JSON or an urlencoded form, picked by
/// content type.
fn key_request(headers: &HeaderMap, body: &[u8]) -> Result<KeyRequest, ErrorResponse> {
    let is_form = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| {
            mime.trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        });
    let request = if is_form {
        KeyRequest::from_form(body)
    } else {
        KeyRequest::deserialize(body)
    };
    request.map_err(bad_request)
}

fn internal(e: anyhow::Error) -> ErrorResponse {
    tracing::error!("{:#}", e);
    ErrorResponse::Internal("Internal Server Error".to_string())
}

async fn hello() -> &'static str {
    "Hello from time-lock service"
}

async fn ping() -> Json<serde_json::Value> {
    Json(json!({ "message": "pong" }))
}

async fn not_found() -> ErrorResponse {
    ErrorResponse::NotFound
}

async fn get_content(
    State(store): State<SharedStore>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ErrorResponse> {
    let query = ContentQuery::from_params(&params).map_err(bad_request)?;
    let store = lock(&store)?;
    Ok(store.get_content(&query.key).into_response())
}

async fn add(State(store): State<SharedStore>, body: Bytes) -> Result<Response, ErrorResponse> {
    let request = AddRequest::deserialize(&body).map_err(bad_request)?;
    let mut store = lock(&store)?;
    let response = store
        .add(&request.key, &request.content, request.time_to_wait)
        .map_err(internal)?;
    Ok(response.into_response())
}

async fn update(State(store): State<SharedStore>, body: Bytes) -> Result<Response, ErrorResponse> {
    let request = UpdateRequest::deserialize(&body).map_err(bad_request)?;
    let mut store = lock(&store)?;
    let response = store
        .update(
            &request.key,
            &request.content,
            request.time_to_wait,
            request.release_date,
        )
        .map_err(internal)?;
    Ok(response.into_response())
}

async fn request_unblock(
    State(store): State<SharedStore>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ErrorResponse> {
    let request = key_request(&headers, &body)?;
    let mut store = lock(&store)?;
    let response = store.request_unblock(&request.key).map_err(internal)?;
    Ok(response.into_response())
}

async fn block(
    State(store): State<SharedStore>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ErrorResponse> {
    let request = key_request(&headers, &body)?;
    let mut store = lock(&store)?;
    let response = store.block(&request.key).map_err(internal)?;
    Ok(response.into_response())
}

async fn get_info(
    State(store): State<SharedStore>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ErrorResponse> {
    let query = InfoQuery::from_params(&params).map_err(bad_request)?;
    let store = lock(&store)?;
    Ok(store.info(&query.key, &query.content).into_response())
}
