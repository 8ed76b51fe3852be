pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod infra;
pub mod logging;

pub use auth::{AuthService, JwtService, RefreshTokenStore};
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use http::{AppState, HttpServer};
pub use infra::{KvStore, MemoryKvStore, RedisKvStore};
