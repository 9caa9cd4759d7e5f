// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    extract::FromRef,
    middleware as axum_middleware,
    routing::{delete, get, post},
};
use lumo_config::model::ServerConfig;
use lumo_core::LumoError;
use lumo_evaluation::EvaluationService;
use lumo_interview::SessionService;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub sessions: Arc<SessionService>,
    pub evaluation: Arc<EvaluationService>,
    pub auth: AuthConfig,
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(sessions: Arc<SessionService>, config: &ServerConfig) -> Self {
        Self {
            evaluation: sessions.evaluation().clone(),
            sessions,
            auth: AuthConfig {
                bearer_token: config.bearer_token.clone(),
                user_header: config.user_header.clone(),
            },
            start_time: Instant::now(),
        }
    }
}

impl FromRef<GatewayState> for AuthConfig {
    fn from_ref(state: &GatewayState) -> Self {
        state.auth.clone()
    }
}

/// Builds the application router.
///
/// `/health` is public; every `/v1` route passes the bearer-token middleware
/// and resolves the caller from the user identity header.
pub fn build_router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route(
            "/v1/sessions",
            post(handlers::create_session)
                .get(handlers::list_sessions)
                .delete(handlers::delete_all_sessions),
        )
        .route("/v1/sessions/bulk-delete", post(handlers::bulk_delete_sessions))
        .route("/v1/sessions/{id}", delete(handlers::delete_session))
        .route(
            "/v1/sessions/{id}/messages",
            get(handlers::get_session_messages).post(handlers::post_chat_message),
        )
        .route("/v1/messages/{id}", get(handlers::get_message))
        .route("/v1/sessions/{id}/timer", get(handlers::get_timer))
        .route("/v1/sessions/{id}/timer/start", post(handlers::start_timer))
        .route("/v1/sessions/{id}/timer/pause", post(handlers::pause_timer))
        .route("/v1/sessions/{id}/timer/resume", post(handlers::resume_timer))
        .route("/v1/sessions/{id}/timer/tick", post(handlers::tick_timer))
        .route("/v1/sessions/{id}/timer/finish", post(handlers::finish_timer))
        .route("/v1/sessions/{id}/evaluate", post(handlers::evaluate_session))
        .route("/v1/sessions/{id}/feedback", get(handlers::get_feedback))
        .route("/v1/user/analytics", get(handlers::get_user_analytics))
        .route("/v1/user/competencies", get(handlers::get_competency_analysis))
        .route("/v1/competencies", get(handlers::list_competencies))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Binds `host:port` and serves until `shutdown` resolves.
pub async fn serve(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), LumoError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| LumoError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| LumoError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
