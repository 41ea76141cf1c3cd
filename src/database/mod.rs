// 数据库模块
// 用户记录的实体定义与存储库

pub mod models;
pub mod repositories;

pub use models::user::UserAccount;
pub use repositories::user::{PgUserStore, StoreError, UserStore};
