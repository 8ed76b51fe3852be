//! HTTP 服务器 - 使用 Axum 提供认证接口

use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::auth::{AuthService, JwtService};
use crate::error::{Result, ServerError};
use crate::http::routes;

/// HTTP 服务器共享状态
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub jwt_service: Arc<JwtService>,
}

/// HTTP 认证服务器
pub struct HttpServer {
    state: AppState,
    host: String,
    port: u16,
}

impl HttpServer {
    /// 创建新的 HTTP 服务器
    pub fn new(
        auth_service: Arc<AuthService>,
        jwt_service: Arc<JwtService>,
        host: String,
        port: u16,
    ) -> Self {
        Self {
            state: AppState {
                auth_service,
                jwt_service,
            },
            host,
            port,
        }
    }

    /// 启动 HTTP 服务器
    pub async fn start(&self) -> Result<()> {
        // 构建路由
        let app = Router::new()
            .merge(routes::create_routes(self.state.clone()))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone());

        // 绑定地址
        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Internal(format!("绑定地址 {} 失败: {}", addr, e)))?;

        info!("🌐 HTTP 认证服务启动在 {}", addr);

        // 启动服务器
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(format!("HTTP 服务器异常退出: {}", e)))?;

        Ok(())
    }
}
