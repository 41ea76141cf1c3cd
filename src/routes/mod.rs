pub mod files;
pub mod user;
