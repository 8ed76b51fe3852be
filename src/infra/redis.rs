// RedisKvStore - KvStore 的 Redis 实现
// 基于 bb8-redis 连接池

use async_trait::async_trait;
use bb8::Pool;
use bb8_redis::RedisConnectionManager;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RedisConfig;
use crate::error::{Result, ServerError};
use crate::infra::kv::KvStore;

/// Redis 键值存储（基于连接池）
pub struct RedisKvStore {
    pool: Arc<Pool<RedisConnectionManager>>,
    /// 单条 Redis 命令的执行超时
    command_timeout: Duration,
}

impl RedisKvStore {
    /// 创建新的 Redis 存储（从 RedisConfig 配置）
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let manager = RedisConnectionManager::new(config.url.clone())
            .map_err(|e| ServerError::Storage(format!("Failed to create Redis manager: {}", e)))?;

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .min_idle(Some(config.min_idle))
            .connection_timeout(config.connection_timeout())
            .idle_timeout(Some(config.idle_timeout()))
            .build(manager)
            .await
            .map_err(|e| ServerError::Storage(format!("Failed to create Redis pool: {}", e)))?;

        let command_timeout = config.command_timeout();

        // 测试连接
        {
            let mut conn = pool.get().await.map_err(|e| {
                ServerError::Storage(format!("Failed to get Redis connection: {}", e))
            })?;

            let _: String = conn
                .ping()
                .await
                .map_err(|e| ServerError::Storage(format!("Redis ping failed: {}", e)))?;
        }

        tracing::info!(
            "✅ Redis 连接池已创建 (pool_size={}, min_idle={}, conn_timeout={}s, cmd_timeout={}ms, idle_timeout={}s)",
            config.pool_size,
            config.min_idle,
            config.connection_timeout_secs,
            config.command_timeout_ms,
            config.idle_timeout_secs,
        );

        Ok(Self {
            pool: Arc::new(pool),
            command_timeout,
        })
    }

    /// 获取连接池状态（活跃连接数、空闲连接数）
    pub fn pool_state(&self) -> bb8::State {
        self.pool.state()
    }

    /// 从连接池获取连接
    async fn get_conn(&self) -> Result<bb8::PooledConnection<'_, RedisConnectionManager>> {
        self.pool
            .get()
            .await
            .map_err(|e| ServerError::Storage(format!("Failed to get Redis connection: {}", e)))
    }

    /// 执行带超时的 Redis 操作
    ///
    /// 超时返回 Timeout 错误，调用方不会在存储延迟上无限阻塞。
    async fn with_timeout<F, T>(&self, op: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.command_timeout, op)
            .await
            .map_err(|_| {
                ServerError::Timeout(format!(
                    "Redis command timeout ({}ms)",
                    self.command_timeout.as_millis()
                ))
            })?
    }
}

#[async_trait]
impl KvStore for RedisKvStore {
    /// SETEX key seconds value
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        self.with_timeout(async {
            let mut conn = self.get_conn().await?;
            conn.set_ex::<_, _, ()>(key, value, ttl_secs)
                .await
                .map_err(|e| ServerError::Storage(format!("Redis SETEX failed: {}", e)))?;
            Ok(())
        })
        .await
    }

    /// GET key
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_timeout(async {
            let mut conn = self.get_conn().await?;
            let result: Option<String> = conn
                .get(key)
                .await
                .map_err(|e| ServerError::Storage(format!("Redis GET failed: {}", e)))?;
            Ok(result)
        })
        .await
    }

    /// GETDEL key - 原子地读取并删除
    ///
    /// 并发轮换同一刷新令牌时只有一个调用者能观察到旧值。
    async fn get_del(&self, key: &str) -> Result<Option<String>> {
        self.with_timeout(async {
            let mut conn = self.get_conn().await?;
            let result: Option<String> = conn
                .get_del(key)
                .await
                .map_err(|e| ServerError::Storage(format!("Redis GETDEL failed: {}", e)))?;
            Ok(result)
        })
        .await
    }

    /// DEL key
    async fn del(&self, key: &str) -> Result<()> {
        self.with_timeout(async {
            let mut conn = self.get_conn().await?;
            conn.del::<_, ()>(key)
                .await
                .map_err(|e| ServerError::Storage(format!("Redis DEL failed: {}", e)))?;
            Ok(())
        })
        .await
    }

    /// SADD key member
    async fn sadd(&self, key: &str, member: &str) -> Result<()> {
        self.with_timeout(async {
            let mut conn = self.get_conn().await?;
            conn.sadd::<_, _, ()>(key, member)
                .await
                .map_err(|e| ServerError::Storage(format!("Redis SADD failed: {}", e)))?;
            Ok(())
        })
        .await
    }

    /// SREM key member
    async fn srem(&self, key: &str, member: &str) -> Result<()> {
        self.with_timeout(async {
            let mut conn = self.get_conn().await?;
            conn.srem::<_, _, ()>(key, member)
                .await
                .map_err(|e| ServerError::Storage(format!("Redis SREM failed: {}", e)))?;
            Ok(())
        })
        .await
    }

    /// SMEMBERS key
    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        self.with_timeout(async {
            let mut conn = self.get_conn().await?;
            let result: Vec<String> = conn
                .smembers(key)
                .await
                .map_err(|e| ServerError::Storage(format!("Redis SMEMBERS failed: {}", e)))?;
            Ok(result)
        })
        .await
    }

    /// EXPIRE key seconds
    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<()> {
        self.with_timeout(async {
            let mut conn = self.get_conn().await?;
            conn.expire::<_, ()>(key, ttl_secs as i64)
                .await
                .map_err(|e| ServerError::Storage(format!("Redis EXPIRE failed: {}", e)))?;
            Ok(())
        })
        .await
    }

    /// TTL key
    async fn ttl(&self, key: &str) -> Result<Option<i64>> {
        self.with_timeout(async {
            let mut conn = self.get_conn().await?;
            let result: i64 = conn
                .ttl(key)
                .await
                .map_err(|e| ServerError::Storage(format!("Redis TTL failed: {}", e)))?;
            // -2 表示键不存在，-1 表示键存在但没有过期时间
            if result == -2 {
                Ok(None)
            } else {
                Ok(Some(result))
            }
        })
        .await
    }
}
