use crate::auth::models::RefreshTokenRecord;
use crate::error::{Result, ServerError};
use crate::infra::kv::KvStore;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::Arc;
use tracing::{debug, warn};

/// 刷新令牌的随机字节数（256 位熵）
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// 用户索引的 TTL 在令牌 TTL 之上的余量（秒）
///
/// 索引必须比其中最长寿的令牌活得久，每次插入都重新设置到同一个前瞻值。
const INDEX_TTL_MARGIN_SECS: u64 = 24 * 3600;

fn record_key(token: &str) -> String {
    format!("refresh_token:{}", token)
}

fn index_key(user_id: u64) -> String {
    format!("user_tokens:{}", user_id)
}

fn used_key(token: &str) -> String {
    format!("refresh_token_used:{}", token)
}

/// 刷新令牌存储
///
/// 每个存活令牌对应一条 `refresh_token:<token>` 记录（TTL 30 天），
/// 同时登记在 `user_tokens:<user_id>` 集合里以支持"全部登出"。
/// 集合只是清理用的元数据，令牌有效性永远以记录本身为准。
pub struct RefreshTokenStore {
    kv: Arc<dyn KvStore>,
    /// 令牌有效期（秒）
    token_ttl_secs: u64,
}

impl RefreshTokenStore {
    /// 创建刷新令牌存储
    pub fn new(kv: Arc<dyn KvStore>, token_ttl_secs: u64) -> Self {
        Self { kv, token_ttl_secs }
    }

    /// 生成刷新令牌
    ///
    /// 32 字节 CSPRNG 随机数据，URL 安全 Base64 编码（43 字符）。
    /// 唯一性是统计意义上的，不做碰撞检查。
    pub fn generate_token() -> String {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    fn index_ttl_secs(&self) -> u64 {
        self.token_ttl_secs + INDEX_TTL_MARGIN_SECS
    }

    /// 写入刷新令牌记录并登记到用户索引
    pub async fn store(&self, token: &str, user_id: u64, email: &str, name: &str) -> Result<()> {
        let record = RefreshTokenRecord {
            user_id,
            email: email.to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        let payload = serde_json::to_string(&record)?;

        self.kv
            .set_ex(&record_key(token), &payload, self.token_ttl_secs)
            .await?;

        // 登记到用户索引并重设索引 TTL
        let index = index_key(user_id);
        self.kv.sadd(&index, token).await?;
        self.kv.expire(&index, self.index_ttl_secs()).await?;

        Ok(())
    }

    /// 查找刷新令牌记录
    ///
    /// 键不存在统一返回 InvalidRefreshToken：存储层无法区分
    /// 自然过期和从未存在，调用方也不应假设能区分。
    pub async fn get(&self, token: &str) -> Result<RefreshTokenRecord> {
        match self.kv.get(&record_key(token)).await? {
            Some(payload) => Ok(serde_json::from_str(&payload)?),
            None => Err(ServerError::InvalidRefreshToken),
        }
    }

    /// 撤销单个刷新令牌（幂等）
    ///
    /// 记录已不存在时直接成功：此时无从得知属主，索引也无从清理。
    pub async fn revoke(&self, token: &str) -> Result<()> {
        let Some(payload) = self.kv.get_del(&record_key(token)).await? else {
            return Ok(());
        };

        let record: RefreshTokenRecord = serde_json::from_str(&payload)?;
        self.kv.srem(&index_key(record.user_id), token).await?;

        debug!("刷新令牌已撤销: user_id={}", record.user_id);
        Ok(())
    }

    /// 撤销用户的全部刷新令牌（"全部登出"，幂等）
    pub async fn revoke_all(&self, user_id: u64) -> Result<()> {
        let index = index_key(user_id);
        let tokens = self.kv.smembers(&index).await?;

        for token in &tokens {
            self.kv.del(&record_key(token)).await?;
        }
        self.kv.del(&index).await?;

        debug!(
            "用户全部刷新令牌已撤销: user_id={}, count={}",
            user_id,
            tokens.len()
        );
        Ok(())
    }

    /// 轮换刷新令牌
    ///
    /// 通过原子的读取并删除（GETDEL）获取旧记录：并发轮换同一令牌时
    /// 只有一个调用者成功，其余走失败路径，会话不会悄悄分叉。
    /// 旧令牌先失效、新令牌后写入，中途崩溃只会让会话登出，不会复制。
    ///
    /// 已轮换过的令牌再次出现视为令牌被窃取的信号，撤销该用户的
    /// 全部令牌族。
    pub async fn rotate(&self, old_token: &str) -> Result<(String, RefreshTokenRecord)> {
        let Some(payload) = self.kv.get_del(&record_key(old_token)).await? else {
            return self.handle_missing_rotation(old_token).await;
        };

        let record: RefreshTokenRecord = serde_json::from_str(&payload)?;

        // 清理索引，并留下轮换墓碑用于重放检测
        self.kv.srem(&index_key(record.user_id), old_token).await?;
        self.kv
            .set_ex(
                &used_key(old_token),
                &record.user_id.to_string(),
                self.token_ttl_secs,
            )
            .await?;

        let new_token = Self::generate_token();
        self.store(&new_token, record.user_id, &record.email, &record.name)
            .await?;

        debug!("刷新令牌已轮换: user_id={}", record.user_id);
        Ok((new_token, record))
    }

    /// 旧令牌缺失时的轮换处理
    ///
    /// 墓碑存在说明该令牌已经用过一次——窃取者或受害者正在重放
    /// 轮换链上的旧令牌，此时撤销整个令牌族。
    async fn handle_missing_rotation(
        &self,
        old_token: &str,
    ) -> Result<(String, RefreshTokenRecord)> {
        if let Some(owner) = self.kv.get_del(&used_key(old_token)).await? {
            if let Ok(user_id) = owner.parse::<u64>() {
                warn!(
                    "⚠️ 检测到已轮换刷新令牌的重放，撤销用户全部会话: user_id={}",
                    user_id
                );
                self.revoke_all(user_id).await?;
            }
        }
        Err(ServerError::InvalidRefreshToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_length_and_uniqueness() {
        let t1 = RefreshTokenStore::generate_token();
        let t2 = RefreshTokenStore::generate_token();

        // 32 字节 Base64 URL 编码为 43 字符
        assert_eq!(t1.len(), 43);
        assert!(t1.len() >= 40);
        assert_ne!(t1, t2);
    }

    #[test]
    fn test_generate_token_url_safe() {
        let token = RefreshTokenStore::generate_token();
        assert!(!token.contains('+'));
        assert!(!token.contains('/'));
        assert!(!token.contains('='));
    }
}
