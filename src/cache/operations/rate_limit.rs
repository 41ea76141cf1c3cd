use std::sync::Arc;

use redis::{AsyncCommands, Client as RedisClient};

/// 速率限制计数操作
pub struct RateLimitOperations;

impl RateLimitOperations {
    /// 在固定窗口内计数一次请求，返回窗口内的累计次数
    pub async fn hit(
        redis: &Arc<RedisClient>,
        client: &str,
        window_secs: u64,
    ) -> Result<u32, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let key = format!("rate_limit:{}", client);
        let count: u32 = conn.incr(&key, 1).await?;

        if count == 1 {
            // 窗口从第一次请求开始计时
            let _: () = conn.expire(&key, window_secs as i64).await?;
        }

        Ok(count)
    }
}
