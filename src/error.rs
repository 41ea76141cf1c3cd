use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::database::StoreError;
use crate::remote::{RemoteError, TokenError};
use crate::utils::{error_codes, error_to_api_response};

#[derive(Debug)]
pub enum AppError {
    Validation(String),
    UserExists,
    AuthFailed,
    Unauthorized,
    NotFound(String),
    /// 远程存储调用失败，对外只给出通用提示
    Remote,
    Provisioning,
    InternalServerError,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, msg) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, error_codes::VALIDATION_ERROR, msg),
            AppError::UserExists => (
                StatusCode::BAD_REQUEST,
                error_codes::USER_EXISTS,
                "用户名已存在".to_string(),
            ),
            AppError::AuthFailed => (
                StatusCode::UNAUTHORIZED,
                error_codes::AUTH_FAILED,
                "用户名或密码错误".to_string(),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                error_codes::AUTH_FAILED,
                "未授权访问".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, error_codes::NOT_FOUND, msg),
            AppError::Remote => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::REMOTE_ERROR,
                "获取文件列表失败".to_string(),
            ),
            AppError::Provisioning => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::REMOTE_ERROR,
                "远程账户开通失败".to_string(),
            ),
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
                "内部服务器错误".to_string(),
            ),
        };

        (status, error_to_api_response::<()>(code, msg)).into_response()
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        tracing::error!("Failed to obtain remote client: {}", err);
        AppError::Remote
    }
}

impl From<RemoteError> for AppError {
    fn from(err: RemoteError) -> Self {
        tracing::error!("Remote storage call failed: {}", err);
        match err {
            RemoteError::Api { status: 404, .. } => AppError::NotFound("文件不存在".to_string()),
            _ => AppError::Remote,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        tracing::error!("User store failure: {}", err);
        match err {
            StoreError::UsernameTaken => AppError::UserExists,
            _ => AppError::InternalServerError,
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        tracing::error!("Session store failure: {}", err);
        AppError::InternalServerError
    }
}
