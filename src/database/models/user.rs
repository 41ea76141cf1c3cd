use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// 用户数据库实体
#[derive(Debug, Clone, FromRow)]
pub struct UserAccount {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    /// 远程存储侧的用户 ID，开通远程账户之前为空
    pub remote_user_id: Option<String>,
    pub remote_access_token: Option<String>,
    pub remote_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    /// 缓存的远程令牌及其过期时间，二者缺一即视为没有缓存
    pub fn cached_token(&self) -> Option<(&str, DateTime<Utc>)> {
        match (&self.remote_access_token, self.remote_token_expires_at) {
            (Some(token), Some(expires_at)) => Some((token.as_str(), expires_at)),
            _ => None,
        }
    }
}
