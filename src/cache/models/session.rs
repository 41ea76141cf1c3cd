use serde::{Deserialize, Serialize};

/// 会话缓存数据模型，只保存本地用户 ID
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionPayload {
    pub user_id: i64,
}
