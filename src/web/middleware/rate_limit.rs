//! Per-client rate limiting.
//!
//! Two independent budgets are kept per client IP: a tight one for the
//! credential endpoints (login, send-code, register) and a loose one for
//! the rest of the API.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    num::NonZeroU32,
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use crate::web::error::ApiError;

/// Governor limiter for one client.
pub type IpRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// How often idle limiters are dropped.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Limiters of one budget, keyed by client IP.
struct LimiterTable {
    quota: Quota,
    clients: RwLock<HashMap<String, Arc<IpRateLimiter>>>,
}

impl LimiterTable {
    fn per_minute(requests: u32) -> Self {
        Self {
            quota: Quota::per_minute(NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN)),
            clients: RwLock::new(HashMap::new()),
        }
    }

    fn limiter(&self, ip: &str) -> Arc<IpRateLimiter> {
        if let Some(limiter) = self
            .clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(ip)
        {
            return limiter.clone();
        }

        self.clients
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(ip.to_string())
            .or_insert_with(|| Arc::new(RateLimiter::direct(self.quota)))
            .clone()
    }

    fn allow(&self, ip: &str) -> bool {
        self.limiter(ip).check().is_ok()
    }

    /// Drop limiters no request is holding.
    fn prune(&self) {
        self.clients
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, limiter| Arc::strong_count(limiter) > 1);
    }

    fn len(&self) -> usize {
        self.clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Rate limit budgets shared by the router layers.
#[derive(Clone)]
pub struct RateLimitState {
    credentials: Arc<LimiterTable>,
    api: Arc<LimiterTable>,
}

impl RateLimitState {
    /// Budgets in requests per minute per client IP.
    pub fn new(login_rate_limit: u32, api_rate_limit: u32) -> Self {
        Self {
            credentials: Arc::new(LimiterTable::per_minute(login_rate_limit)),
            api: Arc::new(LimiterTable::per_minute(api_rate_limit)),
        }
    }

    /// Whether `ip` may call a credential endpoint now.
    pub fn check_login(&self, ip: &str) -> bool {
        self.credentials.allow(ip)
    }

    /// Whether `ip` may call the general API now.
    pub fn check_api(&self, ip: &str) -> bool {
        self.api.allow(ip)
    }

    pub fn cleanup(&self) {
        self.credentials.prune();
        self.api.prune();
    }

    /// Prune idle limiters in the background for the life of the process.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(CLEANUP_INTERVAL);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.cleanup();
            }
        });
    }
}

/// Client IP: first `X-Forwarded-For` hop, then `X-Real-IP`, then the socket.
fn client_ip(req: &Request<Body>) -> String {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(first) = header("X-Forwarded-For").and_then(|v| v.split(',').next()) {
        return first.trim().to_string();
    }
    if let Some(real_ip) = header("X-Real-IP") {
        return real_ip.to_string();
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Layer for login, send-code and register.
pub async fn login_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(&req);
    if !state.check_login(&ip) {
        tracing::warn!(ip = %ip, path = %req.uri().path(), "Credential rate limit exceeded");
        return ApiError::too_many_requests("Too many attempts. Please try again later.")
            .into_response();
    }
    next.run(req).await
}

/// Layer for every other API route.
pub async fn api_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(&req);
    if !state.check_api(&ip) {
        tracing::warn!(ip = %ip, path = %req.uri().path(), "API rate limit exceeded");
        return ApiError::too_many_requests("Too many requests. Please try again later.")
            .into_response();
    }
    next.run(req).await
}
