//! HTTP surface (spec.md §6.4): a handful of thin handlers over
//! [`AppState`], each of which returns immediately and (where the spec
//! calls for it) hands the actual work to a spawned background task that
//! delivers its result asynchronously over the bus.

mod rate_limit;

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use rand::RngCore;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::state::AppState;

pub use rate_limit::{notifs_rate_limit, RateLimiter};

const SEED_POLL_INTERVAL: Duration = Duration::from_secs(5);
const SEED_POLL_TIMEOUT: Duration = Duration::from_secs(120);
const TEST_SEED_DELAY: Duration = Duration::from_secs(10);

pub async fn info() -> Json<serde_json::Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Debug, Deserialize)]
pub struct RandomNumberQuery {
    #[serde(rename = "boxId")]
    box_id: String,
    #[serde(rename = "walletAddr")]
    wallet_addr: String,
}

pub async fn random_number(
    State(state): State<AppState>,
    Path(game): Path<String>,
    Query(q): Query<RandomNumberQuery>,
    headers: HeaderMap,
) -> StatusCode {
    let session_id = headers
        .get("owl-session-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    tokio::spawn(async move {
        deliver_seed_when_ready(state, game, q.box_id, q.wallet_addr, session_id).await;
    });

    StatusCode::OK
}

async fn deliver_seed_when_ready(
    state: AppState,
    game: String,
    box_id: String,
    wallet_addr: String,
    session_id: String,
) {
    let deadline = tokio::time::Instant::now() + SEED_POLL_TIMEOUT;
    loop {
        if let Some(seed) = state.seed_window.get(&box_id) {
            publish_seed(&state, &game, &wallet_addr, &seed).await;
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            warn!(box_id, wallet_addr, session_id, "seed poll timed out, no publish");
            return;
        }
        tokio::time::sleep(SEED_POLL_INTERVAL).await;
    }
}

async fn publish_seed(state: &AppState, game: &str, wallet_addr: &str, seed: &str) {
    let subject = format!("{game}.{wallet_addr}");
    let payload = json!({ "seed": seed }).to_string().into_bytes();
    if let Err(e) = state.bus.publish(&subject, payload).await {
        warn!(subject, error = %e, "failed to publish seed");
    } else {
        info!(subject, "seed delivered");
    }
}

#[derive(Debug, Deserialize)]
pub struct TestRandomNumberQuery {
    #[serde(rename = "walletAddr")]
    wallet_addr: String,
}

/// Test hook standing in for the real oracle round trip: same delivery
/// path, a seed conjured locally instead of read off the chain.
pub async fn test_random_number(
    State(state): State<AppState>,
    Query(q): Query<TestRandomNumberQuery>,
) -> StatusCode {
    tokio::spawn(async move {
        tokio::time::sleep(TEST_SEED_DELAY).await;
        let mut bytes = [0u8; 4];
        rand::thread_rng().fill_bytes(&mut bytes);
        let seed = hex::encode(bytes);
        publish_seed(&state, "roulette", &q.wallet_addr, &seed).await;
    });

    StatusCode::OK
}

pub async fn notifs(
    State(state): State<AppState>,
    Path(wallet_addr): Path<String>,
) -> (StatusCode, Json<serde_json::Value>) {
    match crate::notify::republish_parked(&state.kv, &state.bus, &wallet_addr).await {
        Ok(counts) => (
            StatusCode::OK,
            Json(json!({ "succeeded": counts.succeeded, "failed": counts.failed })),
        ),
        Err(e) => {
            warn!(wallet_addr, error = %e, "notifs retrieval failed");
            (StatusCode::OK, Json(json!({ "succeeded": 0, "failed": 0 })))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VerbosityQuery {
    v: Option<String>,
}

pub async fn get_verbosity(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let current = state
        .log_filter
        .with_current(|f| f.to_string())
        .unwrap_or_default();
    (StatusCode::OK, Json(json!({ "verbosity": current })))
}

pub async fn put_verbosity(
    State(state): State<AppState>,
    Query(q): Query<VerbosityQuery>,
) -> (StatusCode, Json<serde_json::Value>) {
    let Some(level) = q.v else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": "missing v" })),
        );
    };
    match level.parse::<tracing_subscriber::EnvFilter>() {
        Ok(filter) => {
            if state.log_filter.reload(filter).is_err() {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "ok": false, "error": "reload failed" })),
                );
            }
            info!(level, "log verbosity updated");
            (StatusCode::OK, Json(json!({ "ok": true, "verbosity": level })))
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": e.to_string() })),
        ),
    }
}
