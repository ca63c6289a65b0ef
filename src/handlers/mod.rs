// handlers/mod.rs - HTTP surface
//
// Public (no auth) → session (any valid token) → supplier / constructor
// (token must carry the matching capability). Everything but /health lives
// under /api/v1.

pub mod company;
pub mod constructor;
pub mod features;
pub mod health;
pub mod supplier;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::context::AppContext;
use crate::middleware::session_auth;

/// Build the complete application router with its global layers
pub fn app(ctx: AppContext) -> Router {
    let api = Router::new()
        .merge(public_auth_routes())
        .merge(session_routes(ctx.clone()))
        .merge(supplier::routes(ctx.clone()))
        .merge(constructor::routes(ctx.clone()));

    let mut router = Router::new()
        .route("/health", get(health::health))
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(ctx.config.api.max_request_size_bytes))
                .layer(cors_layer(&ctx.config.security)),
        );
    if ctx.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router.with_state(ctx)
}

fn public_auth_routes() -> Router<AppContext> {
    Router::new()
        .route("/auth/signup", post(company::signup))
        .route("/auth/login", post(company::login))
        .route("/auth/token/refresh", post(company::refresh))
}

fn session_routes(ctx: AppContext) -> Router<AppContext> {
    Router::new()
        .route("/auth/logout", delete(company::logout))
        .route_layer(middleware::from_fn_with_state(ctx, session_auth))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}
