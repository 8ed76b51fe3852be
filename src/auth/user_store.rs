use crate::auth::models::UserProfile;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{Result, ServerError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// 用户凭证存储接口
///
/// 凭证数据由外部关系库持有，认证核心只依赖这两个能力。
/// 邮箱比较不区分大小写。
#[async_trait]
pub trait UserStore: Send + Sync {
    /// 创建用户，邮箱已存在时返回 DuplicateEntry
    async fn create(&self, email: &str, password: &str, name: &str) -> Result<UserProfile>;

    /// 校验凭证
    ///
    /// 用户不存在和密码错误统一返回 None，不向调用方泄露具体原因。
    async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<UserProfile>>;
}

struct StoredUser {
    user_id: u64,
    email: String,
    password_hash: String,
    name: String,
}

/// 进程内用户存储
///
/// 开发环境与测试使用；生产环境由外部凭证服务实现 UserStore。
pub struct MemoryUserStore {
    // email（小写）-> 用户记录
    users: DashMap<String, StoredUser>,
    next_id: AtomicU64,
}

impl MemoryUserStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, email: &str, password: &str, name: &str) -> Result<UserProfile> {
        let key = email.to_lowercase();

        match self.users.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(ServerError::DuplicateEntry(
                format!("邮箱已注册: {}", email),
            )),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                let user_id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let password_hash = hash_password(password)?;

                entry.insert(StoredUser {
                    user_id,
                    email: email.to_string(),
                    password_hash,
                    name: name.to_string(),
                });

                Ok(UserProfile {
                    user_id,
                    email: email.to_string(),
                    name: name.to_string(),
                })
            }
        }
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<UserProfile>> {
        let key = email.to_lowercase();

        let Some(user) = self.users.get(&key) else {
            return Ok(None);
        };

        if !verify_password(password, &user.password_hash)? {
            return Ok(None);
        }

        Ok(Some(UserProfile {
            user_id: user.user_id,
            email: user.email.clone(),
            name: user.name.clone(),
        }))
    }
}
