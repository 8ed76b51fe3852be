// HTTP 模块 - 认证接口的对外边界

pub mod middleware;
pub mod routes;
pub mod server;

pub use server::{AppState, HttpServer};
