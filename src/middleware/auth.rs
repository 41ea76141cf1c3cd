use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    extract::CookieJar,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};

use crate::{
    AppState,
    cache::SessionCacheOperations,
    database::{UserAccount, UserStore},
    error::AppError,
};

pub const SESSION_COOKIE: &str = "sid";

/// 已认证的请求上下文，每次请求都从用户表重新加载
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub session_id: String,
    pub account: UserAccount,
}

/// 优先读取会话 Cookie，其次是 Bearer 头
fn session_id(jar: &CookieJar, bearer: Option<&Authorization<Bearer>>) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| bearer.map(|auth| auth.token().to_string()))
        .filter(|sid| !sid.is_empty())
}

/// 会话指向的用户已删除时视为未登录
async fn load_account(users: &dyn UserStore, user_id: i64) -> Result<UserAccount, AppError> {
    match users.get(user_id).await? {
        Some(account) => Ok(account),
        None => {
            tracing::warn!("Session refers to missing user {}", user_id);
            Err(AppError::Unauthorized)
        }
    }
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // 非 Bearer 的 Authorization 头（如代理加的 Basic）不影响 Cookie 会话
    let bearer = bearer.ok();
    let session_id = session_id(&jar, bearer.as_ref().map(|TypedHeader(auth)| auth))
        .ok_or(AppError::Unauthorized)?;

    let session = SessionCacheOperations::get_session(&state.redis, &session_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let account = load_account(state.users.as_ref(), session.user_id).await?;

    request.extensions_mut().insert(CurrentUser {
        session_id,
        account,
    });
    Ok(next.run(request).await)
}
