// 缓存模块
// 会话和限流计数都保存在 Redis 中

pub mod models;
pub mod operations;

pub use models::SessionPayload;
pub use operations::{RateLimitOperations, SessionCacheOperations};
