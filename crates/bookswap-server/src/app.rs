//! HTTP router for the host process.
//!
//! The chat upgrade route shares the listener with the plain HTTP routes and
//! is mounted only when the chat server starts cleanly.

use std::time::Duration;

use axum::extract::State;
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::{HeaderMap, Method};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use bookswap_chat::{ChatHandle, ChatServer};
use bookswap_config::{BookswapConfig, ServerConfig};

const SERVICE_NAME: &str = "Book Store API";

/// Paths the host serves itself; the chat route may not take them.
pub const HOST_ROUTES: [&str; 3] = ["/", "/api/health", "/api/debug-cors"];

#[derive(Clone)]
struct AppState {
    chat: Option<ChatHandle>,
    chat_path: Option<String>,
    allowed_origins: Vec<String>,
}

/// Router plus the chat server it mounted, if any.
pub struct App {
    pub router: Router,
    pub chat: Option<ChatServer>,
}

impl App {
    /// Build routes from `config`. A chat server that fails to start is
    /// logged and left out; everything else is still served.
    pub fn build(config: &BookswapConfig) -> Self {
        let chat = if config.chat.enabled {
            match ChatServer::with_reserved_paths(config.chat.clone(), &HOST_ROUTES) {
                Ok(server) => Some(server),
                Err(e) => {
                    warn!(error = %e, "Chat initialization failed, running without chat");
                    None
                }
            }
        } else {
            info!("Chat disabled by config");
            None
        };

        let state = AppState {
            chat: chat.as_ref().map(ChatServer::handle),
            chat_path: chat.as_ref().map(|c| c.path().to_string()),
            allowed_origins: config.server.allowed_origins.clone(),
        };

        let mut router = Router::new()
            .route(HOST_ROUTES[0], get(root))
            .route(HOST_ROUTES[1], get(health))
            .route(HOST_ROUTES[2], get(debug_cors))
            .with_state(state);

        if let Some(server) = &chat {
            router = router.merge(server.router());
        }

        let router = router
            .layer(SetResponseHeaderLayer::overriding(
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-store"),
            ))
            .layer(cors_layer(&config.server))
            .layer(TraceLayer::new_for_http());

        Self { router, chat }
    }
}

/// CORS for the configured browser origins. Requests without an `Origin`
/// header pass through untouched.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "Skipping invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(600))
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "Book Store Server is running successfully!",
        "api": "/api/health",
        "chat": state.chat_path,
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let sessions = match &state.chat {
        Some(chat) => chat.session_count().await.ok(),
        None => None,
    };
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "chat": if state.chat.is_some() { "enabled" } else { "disabled" },
        "sessions": sessions,
    }))
}

async fn debug_cors(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (HeaderMap, Json<Value>) {
    let origin = headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none")
        .to_string();

    let mut out = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&origin) {
        out.insert(HeaderName::from_static("x-debug-origin"), value);
    }
    (
        out,
        Json(json!({
            "ok": true,
            "originReceived": origin,
            "allowedOrigins": state.allowed_origins,
        })),
    )
}
