use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use cookie::time::Duration as CookieDuration;

use crate::{
    AppState,
    cache::SessionCacheOperations,
    config::Config,
    error::AppError,
    middleware::{CurrentUser, SESSION_COOKIE},
    utils::{hash_password, success_to_api_response, verify_password},
};

use super::model::{LoginRequest, RegisterRequest, UserView};

fn session_cookie(session_id: String, config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(config.session_ttl_secs as i64))
        .build()
}

async fn open_session(state: &AppState, jar: CookieJar, user_id: i64) -> Result<CookieJar, AppError> {
    let session_id =
        SessionCacheOperations::create_session(&state.redis, user_id, state.config.session_ttl_secs)
            .await?;
    Ok(jar.add(session_cookie(session_id, &state.config)))
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate().map_err(AppError::Validation)?;

    if state.users.find_by_username(&req.username).await?.is_some() {
        return Err(AppError::UserExists);
    }

    // 先开通远程账户，失败时不留下本地用户
    let remote_user_id = state
        .provisioner
        .provision_user(&req.username)
        .await
        .map_err(|e| {
            tracing::error!("Remote provisioning failed for {}: {}", req.username, e);
            AppError::Provisioning
        })?;

    let password_hash = hash_password(&req.password).await.map_err(|e| {
        tracing::error!(
            "Failed to hash password, remote user {} left unlinked: {}",
            remote_user_id,
            e
        );
        AppError::InternalServerError
    })?;

    let user = state
        .users
        .create(&req.username, &password_hash, Some(remote_user_id.as_str()))
        .await
        .map_err(|e| {
            // 并发注册同名用户时远程账户已开通，需要人工清理
            tracing::error!(
                "Failed to store user {}, remote user {} left unlinked: {}",
                req.username,
                remote_user_id,
                e
            );
            AppError::from(e)
        })?;

    let jar = open_session(&state, jar, user.id).await?;
    Ok((
        StatusCode::CREATED,
        jar,
        success_to_api_response(UserView::from(&user)),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .users
        .find_by_username(&req.username)
        .await?
        .ok_or(AppError::AuthFailed)?;

    let valid = verify_password(&req.password, &user.password_hash)
        .await
        .map_err(|e| {
            tracing::error!("Failed to verify password for {}: {}", user.id, e);
            AppError::InternalServerError
        })?;
    if !valid {
        return Err(AppError::AuthFailed);
    }

    let jar = open_session(&state, jar, user.id).await?;
    tracing::info!("User {} logged in", user.id);
    Ok((jar, success_to_api_response(UserView::from(&user))))
}

#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    SessionCacheOperations::remove_session(&state.redis, &current.session_id).await?;

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    Ok((jar, StatusCode::OK))
}

#[axum::debug_handler]
pub async fn current_user(Extension(current): Extension<CurrentUser>) -> impl IntoResponse {
    success_to_api_response(UserView::from(&current.account))
}
