use std::fmt;
use std::error::Error as StdError;
use serde::{Serialize, Deserialize};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response, Json},
};

/// 服务器错误类型
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServerError {
    /// 内部错误
    Internal(String),
    /// 验证错误（请求参数不合法）
    Validation(String),
    /// 未授权
    Unauthorized(String),
    /// 无效访问令牌
    InvalidToken,
    /// 访问令牌已过期
    ExpiredToken,
    /// 无效刷新令牌（不存在、已过期或已轮换，不作区分）
    InvalidRefreshToken,
    /// 重复条目
    DuplicateEntry(String),
    /// 令牌存储错误
    Storage(String),
    /// 序列化错误
    Serialization(String),
    /// 配置错误
    Configuration(String),
    /// 超时错误
    Timeout(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Internal(msg) => write!(f, "Internal error: {}", msg),
            ServerError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ServerError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ServerError::InvalidToken => write!(f, "Invalid token"),
            ServerError::ExpiredToken => write!(f, "Token expired"),
            ServerError::InvalidRefreshToken => write!(f, "Invalid refresh token"),
            ServerError::DuplicateEntry(msg) => write!(f, "Duplicate entry: {}", msg),
            ServerError::Storage(msg) => write!(f, "Storage error: {}", msg),
            ServerError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            ServerError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            ServerError::Timeout(msg) => write!(f, "Timeout error: {}", msg),
        }
    }
}

impl StdError for ServerError {}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status_code = match &self {
            ServerError::Unauthorized(_)
            | ServerError::InvalidToken
            | ServerError::ExpiredToken
            | ServerError::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
            ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::DuplicateEntry(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let error_response = ErrorResponse::new(&self);
        (status_code, Json(error_response)).into_response()
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::Serialization(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for ServerError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        ServerError::Timeout(err.to_string())
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, ServerError>;

/// 错误代码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// 成功
    Success = 0,
    /// 内部错误
    Internal = 1000,
    /// 未授权
    Unauthorized = 1001,
    /// 验证错误
    Validation = 1003,
    /// 存储错误
    Storage = 2000,
    /// 序列化错误
    Serialization = 2002,
    /// 配置错误
    Configuration = 2003,
    /// 超时错误
    Timeout = 3002,
    /// 无效访问令牌
    InvalidToken = 5002,
    /// 访问令牌已过期
    ExpiredToken = 5003,
    /// 无效刷新令牌
    InvalidRefreshToken = 5004,
    /// 重复条目
    DuplicateEntry = 5009,
}

impl From<&ServerError> for ErrorCode {
    fn from(error: &ServerError) -> Self {
        match error {
            ServerError::Internal(_) => ErrorCode::Internal,
            ServerError::Validation(_) => ErrorCode::Validation,
            ServerError::Unauthorized(_) => ErrorCode::Unauthorized,
            ServerError::InvalidToken => ErrorCode::InvalidToken,
            ServerError::ExpiredToken => ErrorCode::ExpiredToken,
            ServerError::InvalidRefreshToken => ErrorCode::InvalidRefreshToken,
            ServerError::DuplicateEntry(_) => ErrorCode::DuplicateEntry,
            ServerError::Storage(_) => ErrorCode::Storage,
            ServerError::Serialization(_) => ErrorCode::Serialization,
            ServerError::Configuration(_) => ErrorCode::Configuration,
            ServerError::Timeout(_) => ErrorCode::Timeout,
        }
    }
}

/// 错误响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: ErrorCode,
    /// 错误消息
    pub message: String,
    /// 时间戳
    pub timestamp: u64,
}

impl ErrorResponse {
    /// 创建错误响应
    pub fn new(error: &ServerError) -> Self {
        Self {
            code: ErrorCode::from(error),
            message: error.to_string(),
            timestamp: chrono::Utc::now().timestamp() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        assert_eq!(
            ErrorCode::from(&ServerError::InvalidRefreshToken),
            ErrorCode::InvalidRefreshToken
        );
        assert_eq!(
            ErrorCode::from(&ServerError::DuplicateEntry("email".to_string())),
            ErrorCode::DuplicateEntry
        );
    }

    #[test]
    fn test_error_display() {
        let err = ServerError::Unauthorized("邮箱或密码错误".to_string());
        assert!(err.to_string().starts_with("Unauthorized"));

        // 刷新令牌错误不携带具体原因
        assert_eq!(
            ServerError::InvalidRefreshToken.to_string(),
            "Invalid refresh token"
        );
    }
}
