//! HTTP 路由模块
//!
//! 路由结构：
//! - `/api/auth/*` - 认证接口（注册、登录、刷新、登出、身份查询）
//! - `/healthz`    - 健康检查

pub mod auth;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::http::server::AppState;

/// 创建所有路由
pub fn create_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .merge(auth::create_route(state))
}

/// 健康检查
async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
