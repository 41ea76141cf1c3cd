use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request to remote storage failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("remote storage returned {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("failed to sign auth assertion: {0}")]
    Assertion(#[from] jsonwebtoken::errors::Error),
    #[error("unexpected response from remote storage: {0}")]
    Unexpected(String),
}

/// 接口错误和 OAuth 错误的字段不同，这里统一收集
#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    code: Option<String>,
    message: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// 非 2xx 响应转换为 `RemoteError::Api`，并记录服务端返回的细节
pub(crate) async fn check_response(
    response: reqwest::Response,
) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail: ProviderErrorBody = serde_json::from_str(&body).unwrap_or_default();
    let code = detail
        .code
        .or(detail.error)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
    let message = detail
        .message
        .or(detail.error_description)
        .unwrap_or(body);

    tracing::error!(
        status = status.as_u16(),
        code = %code,
        "Remote storage API error: {}",
        message
    );

    Err(RemoteError::Api {
        status: status.as_u16(),
        code,
        message,
    })
}
