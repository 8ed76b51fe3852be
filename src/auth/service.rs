use crate::auth::jwt_service::JwtService;
use crate::auth::models::{TokenPairResponse, UserProfile};
use crate::auth::password::{validate_email, validate_password_strength};
use crate::auth::refresh_store::RefreshTokenStore;
use crate::auth::user_store::UserStore;
use crate::error::{Result, ServerError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 认证服务（整合凭证校验、访问令牌签发和刷新令牌存储）
///
/// 所有依赖在构造时显式传入，组件本身不持有跨请求的可变状态。
/// 凭证库或令牌存储的失败原样上抛，这一层从不静默重试。
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt_service: Arc<JwtService>,
    refresh_tokens: Arc<RefreshTokenStore>,
}

impl AuthService {
    /// 创建认证服务
    pub fn new(
        users: Arc<dyn UserStore>,
        jwt_service: Arc<JwtService>,
        refresh_tokens: Arc<RefreshTokenStore>,
    ) -> Self {
        Self {
            users,
            jwt_service,
            refresh_tokens,
        }
    }

    /// 注册新用户并签发令牌对
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<TokenPairResponse> {
        // 1. 校验请求参数
        validate_email(email)?;
        validate_password_strength(password)?;
        if name.trim().is_empty() {
            return Err(ServerError::Validation("显示名不能为空".to_string()));
        }

        // 2. 创建用户（邮箱冲突由凭证库报告）
        let profile = self.users.create(email, password, name).await?;

        info!("✅ 用户注册成功: user_id={}", profile.user_id);

        // 3. 签发令牌对
        self.issue_token_pair(&profile).await
    }

    /// 登录
    ///
    /// 用户不存在和密码错误返回同一个错误，不泄露是哪个因素失败。
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPairResponse> {
        let profile = self
            .users
            .verify_credentials(email, password)
            .await?
            .ok_or_else(|| {
                warn!("❌ 登录失败: email={}", email);
                ServerError::Unauthorized("邮箱或密码错误".to_string())
            })?;

        info!("✅ 用户登录成功: user_id={}", profile.user_id);

        self.issue_token_pair(&profile).await
    }

    /// 用刷新令牌换取新的令牌对
    ///
    /// 旧刷新令牌在本次调用后永久失效（轮换）。
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPairResponse> {
        let (new_refresh_token, record) = self.refresh_tokens.rotate(refresh_token).await?;

        let access_token = self
            .jwt_service
            .issue(record.user_id, &record.email, &record.name)?;

        debug!("刷新令牌轮换完成: user_id={}", record.user_id);

        Ok(TokenPairResponse {
            access_token,
            refresh_token: new_refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.token_ttl(),
        })
    }

    /// 登出（撤销单个刷新令牌）
    ///
    /// 幂等：令牌不存在也算成功，重复登出的最终状态一致。
    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        self.refresh_tokens.revoke(refresh_token).await
    }

    /// 全部登出（撤销用户所有刷新令牌）
    ///
    /// 调用方身份由 HTTP 层的访问令牌校验保证。
    pub async fn logout_all(&self, user_id: u64) -> Result<()> {
        self.refresh_tokens.revoke_all(user_id).await?;
        info!("✅ 用户已在所有设备登出: user_id={}", user_id);
        Ok(())
    }

    /// 查询当前用户身份（只读投影，无任何写入）
    pub async fn me(&self, access_token: &str) -> Result<UserProfile> {
        let claims = self.jwt_service.verify(access_token)?;

        Ok(UserProfile {
            user_id: claims.user_id()?,
            email: claims.email,
            name: claims.name,
        })
    }

    /// 签发访问令牌 + 刷新令牌对
    async fn issue_token_pair(&self, profile: &UserProfile) -> Result<TokenPairResponse> {
        let access_token = self
            .jwt_service
            .issue(profile.user_id, &profile.email, &profile.name)?;

        let refresh_token = RefreshTokenStore::generate_token();
        self.refresh_tokens
            .store(&refresh_token, profile.user_id, &profile.email, &profile.name)
            .await?;

        Ok(TokenPairResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.token_ttl(),
        })
    }
}
