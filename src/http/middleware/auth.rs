//! 认证中间件

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::error::{Result, ServerError};
use crate::http::server::AppState;

/// 访问令牌认证中间件
///
/// 1. 从 Authorization header 提取 Bearer token
/// 2. 验证签名和过期时间
/// 3. 把 claims 注入 request extensions 供处理函数使用
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ServerError::Unauthorized("缺少 Authorization 请求头".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ServerError::Unauthorized("Authorization 必须是 Bearer 格式".to_string()))?;

    let claims = state.jwt_service.verify(token)?;

    debug!("🔐 访问令牌验证通过: sub={}", claims.sub);

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
