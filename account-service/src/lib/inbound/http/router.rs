use std::sync::Arc;
use std::time::Duration;

use auth::TokenCodec;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::get_account::get_account;
use super::handlers::login::login;
use super::handlers::new_password::new_password;
use super::handlers::register::register;
use super::handlers::request_password_reset::request_password_reset;
use super::middleware::authorize;
use crate::domain::account::service::AccountService;
use crate::outbound::notifications::SmtpNotifier;
use crate::outbound::repositories::PostgresAccountRepository;

#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<AccountService<PostgresAccountRepository, SmtpNotifier>>,
    pub token_codec: Arc<TokenCodec>,
}

pub fn create_router(
    account_service: Arc<AccountService<PostgresAccountRepository, SmtpNotifier>>,
    token_codec: Arc<TokenCodec>,
) -> Router {
    let state = AppState {
        account_service,
        token_codec,
    };

    let public_routes = Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route(
            "/api/auth/reset-password-request",
            post(request_password_reset),
        )
        .route("/api/auth/new-password", post(new_password));

    let protected_routes = Router::new()
        .route("/api/account", get(get_account))
        .route_layer(middleware::from_fn_with_state(state.clone(), authorize));

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
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
