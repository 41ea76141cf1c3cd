use std::sync::Arc;

use redis::{AsyncCommands, Client as RedisClient};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::cache::models::session::SessionPayload;

/// 会话缓存操作
pub struct SessionCacheOperations;

/// Redis 中只保存会话 ID 的摘要
fn session_key(session_id: &str) -> String {
    format!("session:{:x}", Sha256::digest(session_id.as_bytes()))
}

impl SessionCacheOperations {
    /// 创建会话，返回新的会话 ID
    pub async fn create_session(
        redis: &Arc<RedisClient>,
        user_id: i64,
        ttl: u64,
    ) -> Result<String, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let session_id = Uuid::new_v4().to_string();
        let json = serde_json::to_string(&SessionPayload { user_id }).map_err(|e| {
            redis::RedisError::from((redis::ErrorKind::IoError, "serialize error", e.to_string()))
        })?;

        let _: () = conn.set_ex(session_key(&session_id), json, ttl).await?;
        tracing::debug!("Created session for user {}", user_id);

        Ok(session_id)
    }

    /// 获取会话
    pub async fn get_session(
        redis: &Arc<RedisClient>,
        session_id: &str,
    ) -> Result<Option<SessionPayload>, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let result: Option<String> = conn.get(session_key(session_id)).await?;

        match result {
            Some(json) => {
                let payload = serde_json::from_str(&json).map_err(|e| {
                    redis::RedisError::from((
                        redis::ErrorKind::IoError,
                        "deserialize error",
                        e.to_string(),
                    ))
                })?;
                Ok(Some(payload))
            }
            None => Ok(None),
        }
    }

    /// 删除会话
    pub async fn remove_session(
        redis: &Arc<RedisClient>,
        session_id: &str,
    ) -> Result<(), redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let _: () = conn.del(session_key(session_id)).await?;

        Ok(())
    }
}
