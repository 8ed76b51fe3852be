use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 访问令牌声明（JWT claims）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// 签发者
    pub iss: String,
    /// 用户 ID（字符串形式）
    pub sub: String,
    /// 受众
    pub aud: String,
    /// 过期时间（Unix 秒）
    pub exp: i64,
    /// 签发时间（Unix 秒）
    pub iat: i64,
    /// 令牌唯一标识
    pub jti: String,
    /// 用户邮箱
    pub email: String,
    /// 用户显示名
    pub name: String,
}

impl AccessTokenClaims {
    /// 解析 sub 中的用户 ID
    pub fn user_id(&self) -> Result<u64, crate::error::ServerError> {
        self.sub
            .parse::<u64>()
            .map_err(|_| crate::error::ServerError::InvalidToken)
    }
}

/// 刷新令牌记录
///
/// 以 JSON 形式写入 `refresh_token:<token>`，身份信息是创建时的快照。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    /// 用户 ID
    pub user_id: u64,
    /// 用户邮箱
    pub email: String,
    /// 用户显示名
    pub name: String,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

/// 用户身份信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// 用户 ID
    pub user_id: u64,
    /// 用户邮箱
    pub email: String,
    /// 用户显示名
    pub name: String,
}

impl From<&AccessTokenClaims> for UserProfile {
    fn from(claims: &AccessTokenClaims) -> Self {
        Self {
            user_id: claims.sub.parse().unwrap_or(0),
            email: claims.email.clone(),
            name: claims.name.clone(),
        }
    }
}

/// 注册请求
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// 登录请求
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 刷新请求（刷新令牌只通过请求体传输）
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// 登出请求
#[derive(Debug, Clone, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

/// 令牌对响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPairResponse {
    /// 访问令牌（JWT）
    pub access_token: String,
    /// 刷新令牌（不透明随机串）
    pub refresh_token: String,
    /// 令牌类型
    pub token_type: String,
    /// 访问令牌有效期（秒）
    pub expires_in: i64,
}
