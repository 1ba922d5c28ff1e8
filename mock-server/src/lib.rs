//! In-memory stand-in for the Feedly v3 subscriptions and categories API.
//!
//! Every route under `/v3` requires `Authorization: OAuth <token>` and
//! answers with Feedly's `X-Ratelimit-*` headers. Errors use Feedly's error
//! document (`errorCode`, `errorId`, `errorMessage`).

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;

use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Token accepted by [`app`].
pub const TOKEN: &str = "sandbox-token";

pub const RATE_LIMIT: u64 = 250;

/// How long `GET /v3/slow` stalls before answering.
pub const SLOW_DELAY: Duration = Duration::from_millis(1500);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<Category>,
}

#[derive(Deserialize)]
struct Label {
    label: String,
}

/// Subscriptions in insertion order.
pub type Db = Arc<RwLock<Vec<Subscription>>>;

#[derive(Clone)]
pub struct AppState {
    db: Db,
    token: Arc<str>,
    requests: Arc<AtomicU64>,
}

pub fn app() -> Router {
    app_with_token(TOKEN)
}

pub fn app_with_token(token: &str) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Vec::new())),
        token: Arc::from(token),
        requests: Arc::new(AtomicU64::new(0)),
    };
    let api = Router::new()
        .route("/subscriptions", get(list_subscriptions).post(add_subscription))
        .route("/subscriptions/{id}", delete(delete_subscription))
        .route("/categories", get(list_categories))
        .route("/categories/{id}", post(rename_category).delete(delete_category))
        .route("/slow", get(slow))
        .layer(middleware::from_fn_with_state(state.clone(), authorize))
        .with_state(state);
    Router::new().nest("/v3", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn feedly_error(status: StatusCode, message: &str) -> Response {
    let body = json!({
        "errorCode": status.as_u16(),
        "errorId": Uuid::new_v4().to_string(),
        "errorMessage": message,
    });
    (status, Json(body)).into_response()
}

async fn authorize(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let count = state.requests.fetch_add(1, Ordering::Relaxed) + 1;
    let expected = format!("OAuth {}", state.token);
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);

    let mut response = if authorized {
        next.run(request).await
    } else {
        tracing::debug!(uri = %request.uri(), "rejecting unauthenticated request");
        feedly_error(StatusCode::UNAUTHORIZED, "token required")
    };
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(RATE_LIMIT));
    headers.insert("x-ratelimit-count", HeaderValue::from(count));
    headers.insert("x-ratelimit-reset", HeaderValue::from(3600u64));
    response
}

async fn list_subscriptions(State(state): State<AppState>) -> Json<Vec<Subscription>> {
    Json(state.db.read().await.clone())
}

/// Accepts Feedly's `id` field or the `feedId` spelling. Posting an existing
/// id updates it in place.
async fn add_subscription(State(state): State<AppState>, body: String) -> Response {
    let input: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(_) => return feedly_error(StatusCode::BAD_REQUEST, "malformed JSON body"),
    };
    let Some(id) = input
        .get("id")
        .or_else(|| input.get("feedId"))
        .and_then(Value::as_str)
        .filter(|id| id.starts_with("feed/"))
    else {
        return feedly_error(StatusCode::BAD_REQUEST, "missing or invalid feed id");
    };
    let categories = match input.get("categories") {
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(c) => c,
            Err(_) => return feedly_error(StatusCode::BAD_REQUEST, "invalid categories"),
        },
        None => Vec::new(),
    };
    let subscription = Subscription {
        id: id.to_string(),
        title: input.get("title").and_then(Value::as_str).map(str::to_string),
        categories,
    };

    let mut subs = state.db.write().await;
    match subs.iter().position(|s| s.id == subscription.id) {
        Some(i) => subs[i] = subscription.clone(),
        None => subs.push(subscription.clone()),
    }
    tracing::info!(id = %subscription.id, "subscribed");
    Json(subscription).into_response()
}

async fn delete_subscription(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let mut subs = state.db.write().await;
    let before = subs.len();
    subs.retain(|s| s.id != id);
    if subs.len() == before {
        return feedly_error(StatusCode::NOT_FOUND, "subscription not found");
    }
    StatusCode::OK.into_response()
}

async fn list_categories(State(state): State<AppState>) -> Json<Vec<Category>> {
    let subs = state.db.read().await;
    let mut categories: Vec<Category> = Vec::new();
    for category in subs.iter().flat_map(|s| s.categories.iter()) {
        if !categories.iter().any(|c| c.id == category.id) {
            categories.push(category.clone());
        }
    }
    Json(categories)
}

async fn rename_category(State(state): State<AppState>, Path(id): Path<String>, body: String) -> Response {
    let Ok(Label { label }) = serde_json::from_str::<Label>(&body) else {
        return feedly_error(StatusCode::BAD_REQUEST, "label required");
    };
    let mut subs = state.db.write().await;
    let mut found = false;
    for category in subs.iter_mut().flat_map(|s| s.categories.iter_mut()) {
        if category.id == id {
            category.label = label.clone();
            found = true;
        }
    }
    if !found {
        return feedly_error(StatusCode::NOT_FOUND, "category not found");
    }
    StatusCode::OK.into_response()
}

async fn delete_category(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let mut subs = state.db.write().await;
    let mut found = false;
    for sub in subs.iter_mut() {
        let before = sub.categories.len();
        sub.categories.retain(|c| c.id != id);
        found |= sub.categories.len() != before;
    }
    if !found {
        return feedly_error(StatusCode::NOT_FOUND, "category not found");
    }
    StatusCode::OK.into_response()
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(SLOW_DELAY).await;
    Json(json!({}))
}
