use std::sync::Arc;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
#[cfg(debug_assertions)]
use tower_http::cors::CorsLayer;

use crate::{
    AppState,
    middleware::{RateLimiter, auth_middleware, log_errors, rate_limit},
    routes,
};

// 登录和注册，按客户端 IP 限流
fn public_routes(limiter: Arc<RateLimiter>) -> Router<AppState> {
    Router::new()
        .route("/register", post(routes::user::register))
        .route("/login", post(routes::user::login))
        .route_layer(from_fn_with_state(limiter, rate_limit))
}

// 需要会话的路由
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/logout", post(routes::user::logout))
        .route("/user", get(routes::user::current_user))
        .route("/files", get(routes::files::list_files))
        .route("/files/{file_id}", get(routes::files::get_file))
        .route_layer(from_fn_with_state(state, auth_middleware))
}

// 创建主路由
pub fn create_router(state: AppState, limiter: Arc<RateLimiter>) -> Router {
    let api = Router::new()
        .merge(public_routes(limiter))
        .merge(protected_routes(state.clone()));

    let base = state.config.api_base_uri.trim_end_matches('/');
    let router = if base.is_empty() {
        api
    } else {
        Router::new().nest(base, api)
    };

    let router = router.layer(from_fn(log_errors));

    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(CorsLayer::permissive())
    };

    router.with_state(state)
}
