mod auth;
mod clients;
mod logs;
mod services;

pub use auth::*;
pub use clients::*;
pub use logs::*;
pub use services::*;
