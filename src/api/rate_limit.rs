//! Hand-rolled per-IP rate limiter for `GET /api/v1/notifs/:walletAddr`
//! (spec.md §6.6: 1 request / 10 s). No rate-limiting crate appears
//! anywhere in the retrieval pack, so this stays a small `HashMap<String,
//! Instant>` guarded by a mutex rather than reaching for one.
//!
//! Resolves spec.md §9 open question (iii): `X-Forwarded-For` may carry a
//! comma-separated proxy chain; only the leftmost token (the original
//! client) is used as the rate-limit key.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

const WINDOW: Duration = Duration::from_secs(10);

#[derive(Clone, Default)]
pub struct RateLimiter {
    last_seen: Arc<Mutex<HashMap<String, Instant>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut last_seen = self.last_seen.lock().unwrap();
        match last_seen.get(key) {
            Some(last) if now.duration_since(*last) < WINDOW => false,
            _ => {
                last_seen.insert(key.to_string(), now);
                true
            }
        }
    }
}

fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = xff.split(',').next() {
            let token = first.trim();
            if !token.is_empty() {
                return token.to_string();
            }
        }
    }
    peer.map(|a| a.ip().to_string()).unwrap_or_default()
}

pub async fn notifs_rate_limit(
    State(limiter): State<RateLimiter>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    request: axum::extract::Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let key = client_key(&headers, Some(peer));
    if limiter.check(&key) {
        Ok(next.run(request).await)
    } else {
        Err(StatusCode::TOO_MANY_REQUESTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_request_within_window_is_denied() {
        let limiter = RateLimiter::new();
        assert!(limiter.check("1.2.3.4"));
        assert!(!limiter.check("1.2.3.4"));
    }

    #[test]
    fn distinct_keys_are_independent() {
        let limiter = RateLimiter::new();
        assert!(limiter.check("1.2.3.4"));
        assert!(limiter.check("5.6.7.8"));
    }

    #[test]
    fn leftmost_forwarded_for_token_is_used() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "9.9.9.9, 10.0.0.1".parse().unwrap());
        assert_eq!(client_key(&headers, None), "9.9.9.9");
    }
}
