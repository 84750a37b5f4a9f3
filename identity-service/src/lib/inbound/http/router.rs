use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::errors::handle_panic;
use super::handlers::health::health;
use super::handlers::login::login;
use super::handlers::method_not_allowed;
use super::handlers::profile::profile;
use super::handlers::register::register;
use super::handlers::route_not_found;
use super::middleware::authenticate as auth_middleware;
use super::request_context::track_request;
use crate::config::Environment;
use crate::identity::ports::IdentityServicePort;

#[derive(Clone)]
pub struct AppState {
    pub identity_service: Arc<dyn IdentityServicePort>,
}

/// Build the HTTP application.
///
/// # Arguments
/// * `identity_service` - Registration, login and token resolution
/// * `environment` - Decides whether error bodies may carry internal detail
pub fn create_router(
    identity_service: Arc<dyn IdentityServicePort>,
    environment: Environment,
) -> Router {
    let state = AppState { identity_service };

    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login));

    let protected_routes = Router::new()
        .route("/api/auth/profile", get(profile))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Headers are left out of the span: they carry bearer tokens.
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn_with_state(environment, track_request))
        .with_state(state)
}
