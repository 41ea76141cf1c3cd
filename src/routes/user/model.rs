use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::UserAccount;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), String> {
        let username = self.username.trim();
        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(format!("用户名至少需要{}个字符", MIN_USERNAME_LEN));
        }
        if username != self.username {
            return Err("用户名首尾不能包含空白字符".to_string());
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(format!("密码至少需要{}个字符", MIN_PASSWORD_LEN));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// 对外展示的用户信息，不含密码和远程令牌
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub remote_linked: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&UserAccount> for UserView {
    fn from(user: &UserAccount) -> Self {
        UserView {
            id: user.id,
            username: user.username.clone(),
            remote_linked: user.remote_user_id.is_some(),
            created_at: user.created_at,
        }
    }
}
