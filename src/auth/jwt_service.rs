use crate::auth::models::AccessTokenClaims;
use crate::error::{Result, ServerError};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

/// JWT 签发和验证服务
///
/// 访问令牌是无状态的：有效性完全由签名和过期时间决定，不落库、不可单独撤销。
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    token_ttl: i64,
}

impl JwtService {
    /// 创建 JWT 服务 (HS256 对称加密)
    pub fn new(secret: &str, issuer: String, token_ttl: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience: "promboard-web".to_string(),
            token_ttl,
        }
    }

    /// 签发访问令牌
    ///
    /// 身份信息（邮箱、显示名）随 claims 携带，Me 接口不需要回查凭证库。
    pub fn issue(&self, user_id: u64, email: &str, name: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        let jti = Uuid::new_v4().to_string();

        let claims = AccessTokenClaims {
            iss: self.issuer.clone(),
            sub: user_id.to_string(),
            aud: self.audience.clone(),
            exp: now + self.token_ttl,
            iat: now,
            jti,
            email: email.to_string(),
            name: name.to_string(),
        };

        let header = Header::new(Algorithm::HS256);
        let token = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| ServerError::Internal(format!("JWT 签发失败: {}", e)))?;

        Ok(token)
    }

    /// 验证访问令牌
    ///
    /// 过期判定不留容差（leeway = 0），到期即失效。
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.leeway = 0;

        let token_data =
            decode::<AccessTokenClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => ServerError::ExpiredToken,
                    _ => ServerError::InvalidToken,
                }
            })?;

        Ok(token_data.claims)
    }

    /// 获取令牌有效期（秒）
    pub fn token_ttl(&self) -> i64 {
        self.token_ttl
    }
}
