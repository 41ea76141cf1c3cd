use std::sync::Arc;

use config::Config;
use database::UserStore;
use redis::Client as RedisClient;

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod remote;
pub mod router;
pub mod routes;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub redis: Arc<RedisClient>,
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<remote::TokenManager>,
    pub provisioner: remote::Provisioner,
}
