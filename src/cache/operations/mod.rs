/// 缓存操作
pub mod rate_limit;
pub mod session;

pub use rate_limit::RateLimitOperations;
pub use session::SessionCacheOperations;
