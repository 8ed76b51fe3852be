// 认证模块 - 访问令牌签发/验证、刷新令牌存储与轮换、认证编排

pub mod jwt_service;
pub mod models;
pub mod password;
pub mod refresh_store;
pub mod service;
pub mod user_store;

// 重新导出主要类型
pub use jwt_service::JwtService;
pub use models::{
    AccessTokenClaims, LoginRequest, LogoutRequest, RefreshRequest, RefreshTokenRecord,
    RegisterRequest, TokenPairResponse, UserProfile,
};
pub use password::{hash_password, validate_email, validate_password_strength, verify_password};
pub use refresh_store::RefreshTokenStore;
pub use service::AuthService;
pub use user_store::{MemoryUserStore, UserStore};
