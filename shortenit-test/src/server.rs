//! Exposes an in-process stand-in for the shortener API for use in integration tests.
//!
//! ```
//! use shortenit_test::server::TestServer;
//!
//! #[tokio::main]
//! async fn main() {
//!    let server = TestServer::new().await;
//!    let url = server.url("/healthz");
//!    // use the URL in tests...
//! }
//! ```

use std::collections::HashMap;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Router, routing};
use serde::Deserialize;
use serde_json::json;

/// Alphabet used to encode short URL ids.
const BASE62: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// The endpoints served by the [`TestServer`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Route {
    /// `POST /forward`
    Forward,
    /// `POST /backward`
    Backward,
    /// `GET /healthz`
    Healthz,
}

impl Route {
    fn index(self) -> usize {
        match self {
            Route::Forward => 0,
            Route::Backward => 1,
            Route::Healthz => 2,
        }
    }
}

#[derive(Clone, Debug)]
struct CannedResponse {
    status: StatusCode,
    body: String,
}

#[derive(Debug, Default)]
struct Store {
    counter: u64,
    forward: HashMap<String, String>,
    backward: HashMap<String, String>,
}

impl Store {
    fn shorten(&mut self, long_url: &str) -> String {
        if let Some(short_url) = self.forward.get(long_url) {
            return short_url.clone();
        }

        self.counter += 1;
        let short_url = base62(self.counter);
        self.forward.insert(long_url.to_owned(), short_url.clone());
        self.backward.insert(short_url.clone(), long_url.to_owned());
        short_url
    }
}

#[derive(Debug, Default)]
struct ServerState {
    store: Mutex<Store>,
    overrides: Mutex<HashMap<Route, CannedResponse>>,
    hits: [AtomicUsize; 3],
}

impl ServerState {
    /// Counts a hit on `route` and returns the canned response, if one is configured.
    fn hit(&self, route: Route) -> Option<Response> {
        self.hits[route.index()].fetch_add(1, Ordering::SeqCst);

        let overrides = self.overrides.lock().unwrap();
        overrides
            .get(&route)
            .map(|canned| json_response(canned.status, canned.body.clone()))
    }
}

/// An in-process shortener for use in integration tests.
///
/// By default the server behaves like the real service: `/forward` hands out base62 ids from a
/// counter and deduplicates long URLs, `/backward` resolves known ids or answers with
/// `{"status":"not_found"}`, and `/healthz` reports healthy. Any route can be switched to a canned
/// response with [`TestServer::respond_with`].
///
/// The server listens on a random available port on localhost and stops when dropped.
#[derive(Debug)]
pub struct TestServer {
    handle: tokio::task::JoinHandle<()>,
    socket: SocketAddr,
    state: Arc<ServerState>,
}

impl TestServer {
    /// Starts a new server.
    pub async fn new() -> Self {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = TcpListener::bind(addr).unwrap();
        listener.set_nonblocking(true).unwrap();
        let socket = listener.local_addr().unwrap();

        let state = Arc::new(ServerState::default());
        let app = Router::new()
            .route("/forward", routing::post(forward))
            .route("/backward", routing::post(backward))
            .route("/healthz", routing::get(healthz))
            .with_state(Arc::clone(&state));

        let handle = tokio::spawn(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            handle,
            socket,
            state,
        }
    }

    /// Returns a full URL pointing to the given path.
    ///
    /// This URL uses `localhost` as hostname.
    pub fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("http://localhost:{}/{}", self.socket.port(), path)
    }

    /// Returns the base URL of the server, without a trailing slash.
    pub fn base_url(&self) -> String {
        format!("http://localhost:{}", self.socket.port())
    }

    /// Makes `route` answer every request with `status` and `body`.
    pub fn respond_with(&self, route: Route, status: u16, body: impl Into<String>) {
        let canned = CannedResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.into(),
        };
        self.state.overrides.lock().unwrap().insert(route, canned);
    }

    /// Restores the regular behavior of `route`.
    pub fn reset(&self, route: Route) {
        self.state.overrides.lock().unwrap().remove(&route);
    }

    /// Number of requests received on `route`, including canned responses.
    pub fn hits(&self, route: Route) -> usize {
        self.state.hits[route.index()].load(Ordering::SeqCst)
    }

    /// Number of distinct short URLs handed out so far.
    pub fn stored(&self) -> usize {
        self.state.store.lock().unwrap().backward.len()
    }

    /// The long URL stored for `short_url`, if any.
    pub fn long_url(&self, short_url: &str) -> Option<String> {
        self.state
            .store
            .lock()
            .unwrap()
            .backward
            .get(short_url)
            .cloned()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Debug, Deserialize)]
struct ForwardBody {
    #[serde(default)]
    long_url: String,
}

#[derive(Debug, Deserialize)]
struct BackwardBody {
    #[serde(default)]
    short_url: String,
}

async fn forward(State(state): State<Arc<ServerState>>, body: String) -> Response {
    if let Some(response) = state.hit(Route::Forward) {
        return response;
    }

    let Ok(request) = serde_json::from_str::<ForwardBody>(&body) else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to unmarshal body");
    };
    if request.long_url.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "long_url is required");
    }
    if !is_valid_long_url(&request.long_url) {
        return error_response(StatusCode::BAD_REQUEST, "invalid long_url");
    }

    let short_url = state.store.lock().unwrap().shorten(&request.long_url);
    json_response(StatusCode::OK, json!({ "short_url": short_url }).to_string())
}

async fn backward(State(state): State<Arc<ServerState>>, body: String) -> Response {
    if let Some(response) = state.hit(Route::Backward) {
        return response;
    }

    let Ok(request) = serde_json::from_str::<BackwardBody>(&body) else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to unmarshal body");
    };

    let long_url = state
        .store
        .lock()
        .unwrap()
        .backward
        .get(&request.short_url)
        .cloned();

    let body = match long_url {
        Some(long_url) => json!({ "long_url": long_url }),
        None => json!({ "status": "not_found" }),
    };
    json_response(StatusCode::OK, body.to_string())
}

async fn healthz(State(state): State<Arc<ServerState>>) -> Response {
    if let Some(response) = state.hit(Route::Healthz) {
        return response;
    }

    json_response(StatusCode::OK, json!({ "status": "healthy" }).to_string())
}

fn json_response(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn error_response(status: StatusCode, error: &str) -> Response {
    json_response(
        status,
        json!({ "status": "error", "error": error }).to_string(),
    )
}

fn is_valid_long_url(long_url: &str) -> bool {
    let Some(rest) = long_url
        .strip_prefix("https://")
        .or_else(|| long_url.strip_prefix("http://"))
    else {
        return false;
    };
    let host = rest.split('/').next().unwrap_or_default();
    host.contains('.') && !host.starts_with('.') && !host.ends_with('.')
}

fn base62(mut n: u64) -> String {
    let mut digits = Vec::new();
    loop {
        digits.push(BASE62[(n % 62) as usize]);
        n /= 62;
        if n == 0 {
            break;
        }
    }
    digits.reverse();
    String::from_utf8(digits).unwrap()
}
