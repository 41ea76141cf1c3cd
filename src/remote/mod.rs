// 远程存储集成
// 凭据交换、令牌缓存、文件夹接口和用户开通

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod provision;
pub mod token_manager;

pub use auth::{BoxAuth, CredentialExchange};
pub use client::{BoxClient, ClientFactory, FolderApi};
pub use error::RemoteError;
pub use provision::Provisioner;
pub use token_manager::{TokenError, TokenManager};
