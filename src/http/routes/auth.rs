//! 认证路由模块
//!
//! - `POST /api/auth/register`   - 注册（201 + 令牌对）
//! - `POST /api/auth/login`      - 登录（200 + 令牌对）
//! - `POST /api/auth/refresh`    - 刷新令牌轮换（200 + 新令牌对）
//! - `POST /api/auth/logout`     - 登出，幂等（永远 200）
//! - `POST /api/auth/logout-all` - 全部登出（需要 Bearer 访问令牌）
//! - `GET  /api/auth/me`         - 当前用户身份（需要 Bearer 访问令牌）

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use serde_json::{json, Value};

use crate::auth::{
    AccessTokenClaims, LoginRequest, LogoutRequest, RefreshRequest, RegisterRequest,
    TokenPairResponse, UserProfile,
};
use crate::error::Result;
use crate::http::middleware::require_auth;
use crate::http::server::AppState;

/// 创建认证路由
pub fn create_route(state: AppState) -> Router<AppState> {
    // 需要访问令牌的接口
    let protected = Router::new()
        .route("/api/auth/logout-all", post(logout_all))
        .route("/api/auth/me", get(me))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout))
        .merge(protected)
}

/// 注册
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenPairResponse>)> {
    let pair = state
        .auth_service
        .register(&req.email, &req.password, &req.name)
        .await?;

    Ok((StatusCode::CREATED, Json(pair)))
}

/// 登录
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenPairResponse>> {
    let pair = state.auth_service.login(&req.email, &req.password).await?;
    Ok(Json(pair))
}

/// 刷新令牌轮换
async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenPairResponse>> {
    let pair = state.auth_service.refresh(&req.refresh_token).await?;
    Ok(Json(pair))
}

/// 登出（幂等，令牌不存在也返回成功）
async fn logout(
    State(state): State<AppState>,
    Json(req): Json<LogoutRequest>,
) -> Result<Json<Value>> {
    state.auth_service.logout(&req.refresh_token).await?;
    Ok(Json(json!({ "message": "已登出" })))
}

/// 全部登出
async fn logout_all(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessTokenClaims>,
) -> Result<Json<Value>> {
    state.auth_service.logout_all(claims.user_id()?).await?;
    Ok(Json(json!({ "message": "已在所有设备登出" })))
}

/// 当前用户身份
async fn me(Extension(claims): Extension<AccessTokenClaims>) -> Result<Json<UserProfile>> {
    Ok(Json(UserProfile::from(&claims)))
}
