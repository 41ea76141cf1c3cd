use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;

use crate::database::models::user::UserAccount;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("username already taken")]
    UsernameTaken,
    #[error("user {0} not found")]
    NotFound(i64),
}

/// 用户记录存储，路由和令牌管理共用
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<UserAccount>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, StoreError>;

    /// 用户名重复时返回 `UsernameTaken`
    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        remote_user_id: Option<&str>,
    ) -> Result<UserAccount, StoreError>;

    /// 令牌和过期时间总是一起写入
    async fn update_remote_token(
        &self,
        id: i64,
        access_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

const USER_COLUMNS: &str = "id, username, password_hash, remote_user_id, remote_access_token, \
                            remote_token_expires_at, created_at";

/// Postgres 用户存储库实现
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    /// 创建注册用户
    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        remote_user_id: Option<&str>,
    ) -> Result<UserAccount, StoreError> {
        let result = sqlx::query_as::<_, UserAccount>(&format!(
            "INSERT INTO users (username, password_hash, remote_user_id) \
             VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(password_hash)
        .bind(remote_user_id)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => {
                tracing::info!("Created user {} ({})", user.username, user.id);
                Ok(user)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::UsernameTaken)
            }
            Err(e) => {
                tracing::error!("Failed to create user {}: {:?}", username, e);
                Err(e.into())
            }
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, StoreError> {
        let user = sqlx::query_as::<_, UserAccount>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get(&self, id: i64) -> Result<Option<UserAccount>, StoreError> {
        let user = sqlx::query_as::<_, UserAccount>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_remote_token(
        &self,
        id: i64,
        access_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE users SET remote_access_token = $1, remote_token_expires_at = $2 WHERE id = $3",
        )
        .bind(access_token)
        .bind(expires_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}
