mod handler;
mod model;

pub use handler::{current_user, login, logout, register};
pub use model::{LoginRequest, RegisterRequest, UserView};
