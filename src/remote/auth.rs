use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::BoxConfig;
use crate::remote::client::{BoxClient, ClientFactory, FolderApi};
use crate::remote::error::{RemoteError, check_response};
use crate::remote::models::{ExchangedToken, TokenResponse};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_EXCHANGE_GRANT: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
const ACCESS_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:access_token";
/// 断言的有效期，服务端上限为 60 秒
const ASSERTION_LIFETIME_SECS: i64 = 45;

/// 把远程用户 ID 换成限定权限的访问令牌
#[async_trait]
pub trait CredentialExchange: Send + Sync {
    async fn exchange(
        &self,
        remote_user_id: &str,
        scopes: &[&str],
    ) -> Result<ExchangedToken, RemoteError>;
}

/// 令牌代表的主体
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    Enterprise(&'a str),
    User(&'a str),
}

impl Subject<'_> {
    fn id(&self) -> &str {
        match self {
            Subject::Enterprise(id) | Subject::User(id) => *id,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Subject::Enterprise(_) => "enterprise",
            Subject::User(_) => "user",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AssertionClaims {
    pub iss: String,
    pub sub: String,
    pub box_sub_type: String,
    pub aud: String,
    pub jti: String,
    pub exp: i64,
}

/// 应用级 JWT 认证
pub struct BoxAuth {
    http: reqwest::Client,
    config: BoxConfig,
    key: EncodingKey,
}

impl BoxAuth {
    pub fn new(http: reqwest::Client, config: BoxConfig) -> Result<Self, RemoteError> {
        let key = EncodingKey::from_rsa_pem(config.private_key.as_bytes())?;
        Ok(Self { http, config, key })
    }

    pub fn enterprise_id(&self) -> &str {
        &self.config.enterprise_id
    }

    fn assertion(&self, subject: Subject<'_>) -> Result<String, RemoteError> {
        let claims = AssertionClaims {
            iss: self.config.client_id.clone(),
            sub: subject.id().to_string(),
            box_sub_type: subject.kind().to_string(),
            aud: self.config.auth_url.clone(),
            jti: Uuid::new_v4().to_string(),
            exp: Utc::now().timestamp() + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.config.public_key_id.clone());

        Ok(encode(&header, &claims, &self.key)?)
    }

    /// 用签名断言换取主体的完整权限令牌
    pub async fn grant(&self, subject: Subject<'_>) -> Result<TokenResponse, RemoteError> {
        let assertion = self.assertion(subject)?;
        tracing::debug!("Requesting {} token for {}", subject.kind(), subject.id());

        let response = self
            .http
            .post(&self.config.auth_url)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        Ok(check_response(response).await?.json().await?)
    }

    /// 以主体身份构造客户端，供开通流程使用
    pub async fn client_as(&self, subject: Subject<'_>) -> Result<BoxClient, RemoteError> {
        let token = self.grant(subject).await?;
        Ok(BoxClient::new(
            self.http.clone(),
            &self.config.api_url,
            &token.access_token,
        ))
    }
}

#[async_trait]
impl CredentialExchange for BoxAuth {
    async fn exchange(
        &self,
        remote_user_id: &str,
        scopes: &[&str],
    ) -> Result<ExchangedToken, RemoteError> {
        let user_token = self.grant(Subject::User(remote_user_id)).await?;
        let scope = scopes.join(" ");

        let response = self
            .http
            .post(&self.config.auth_url)
            .form(&[
                ("grant_type", TOKEN_EXCHANGE_GRANT),
                ("subject_token", user_token.access_token.as_str()),
                ("subject_token_type", ACCESS_TOKEN_TYPE),
                ("scope", scope.as_str()),
            ])
            .send()
            .await?;

        let token: TokenResponse = check_response(response).await?.json().await?;
        Ok(token.into())
    }
}

impl ClientFactory for BoxAuth {
    fn client(&self, access_token: &str) -> Arc<dyn FolderApi> {
        Arc::new(BoxClient::new(
            self.http.clone(),
            &self.config.api_url,
            access_token,
        ))
    }
}
