use crate::error::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// TTL 键值存储接口
///
/// 刷新令牌的持久化层：字符串键带过期时间，集合键用于用户索引。
/// 生产环境由 Redis 实现，开发和测试环境由进程内实现承担。
#[async_trait]
pub trait KvStore: Send + Sync {
    /// 写入字符串值并设置过期时间
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;

    /// 读取字符串值，不存在返回 None
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// 原子地读取并删除字符串值
    ///
    /// 并发调用同一个 key 时至多一个调用者能拿到值，其余得到 None。
    async fn get_del(&self, key: &str) -> Result<Option<String>>;

    /// 删除键（字符串或集合），不存在时静默成功
    async fn del(&self, key: &str) -> Result<()>;

    /// 向集合添加成员
    async fn sadd(&self, key: &str, member: &str) -> Result<()>;

    /// 从集合移除成员
    async fn srem(&self, key: &str, member: &str) -> Result<()>;

    /// 读取集合全部成员，不存在返回空列表
    async fn smembers(&self, key: &str) -> Result<Vec<String>>;

    /// 重设键的过期时间
    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<()>;

    /// 查询键的剩余存活时间（秒），键不存在返回 None
    async fn ttl(&self, key: &str) -> Result<Option<i64>>;
}

/// 带过期时间的字符串条目
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// 带过期时间的集合条目
struct SetEntry {
    members: HashSet<String>,
    /// None 表示尚未设置过期时间
    expires_at: Option<Instant>,
}

impl SetEntry {
    fn expired(&self) -> bool {
        match self.expires_at {
            Some(at) => Instant::now() >= at,
            None => false,
        }
    }
}

/// 进程内 TTL 键值存储
///
/// 过期采用惰性清理：读到已过期的条目视同不存在并顺手删除。
pub struct MemoryKvStore {
    strings: RwLock<HashMap<String, Entry>>,
    sets: RwLock<HashMap<String, SetEntry>>,
}

impl MemoryKvStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self {
            strings: RwLock::new(HashMap::new()),
            sets: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let mut strings = self.strings.write().await;
        strings.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + Duration::from_secs(ttl_secs),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        {
            let strings = self.strings.read().await;
            match strings.get(key) {
                Some(entry) if !entry.expired() => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // 条目已过期，清理后按不存在处理
        let mut strings = self.strings.write().await;
        if strings.get(key).map(|e| e.expired()).unwrap_or(false) {
            strings.remove(key);
        }
        Ok(None)
    }

    async fn get_del(&self, key: &str) -> Result<Option<String>> {
        // 单次写锁内完成读取和删除，保证原子性
        let mut strings = self.strings.write().await;
        match strings.remove(key) {
            Some(entry) if !entry.expired() => Ok(Some(entry.value)),
            _ => Ok(None),
        }
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.strings.write().await.remove(key);
        self.sets.write().await.remove(key);
        Ok(())
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<()> {
        let mut sets = self.sets.write().await;
        let entry = sets.entry(key.to_string()).or_insert_with(|| SetEntry {
            members: HashSet::new(),
            expires_at: None,
        });
        if entry.expired() {
            entry.members.clear();
            entry.expires_at = None;
        }
        entry.members.insert(member.to_string());
        Ok(())
    }

    async fn srem(&self, key: &str, member: &str) -> Result<()> {
        let mut sets = self.sets.write().await;
        let drop_key = match sets.get_mut(key) {
            Some(entry) if entry.expired() => true,
            Some(entry) => {
                entry.members.remove(member);
                entry.members.is_empty()
            }
            None => false,
        };
        if drop_key {
            sets.remove(key);
        }
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        {
            let sets = self.sets.read().await;
            match sets.get(key) {
                Some(entry) if !entry.expired() => {
                    return Ok(entry.members.iter().cloned().collect());
                }
                Some(_) => {}
                None => return Ok(Vec::new()),
            }
        }

        let mut sets = self.sets.write().await;
        if sets.get(key).map(|e| e.expired()).unwrap_or(false) {
            sets.remove(key);
        }
        Ok(Vec::new())
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<()> {
        let deadline = Instant::now() + Duration::from_secs(ttl_secs);

        let mut strings = self.strings.write().await;
        if let Some(entry) = strings.get_mut(key) {
            if !entry.expired() {
                entry.expires_at = deadline;
            }
            return Ok(());
        }
        drop(strings);

        let mut sets = self.sets.write().await;
        if let Some(entry) = sets.get_mut(key) {
            if !entry.expired() {
                entry.expires_at = Some(deadline);
            }
        }
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<Option<i64>> {
        let now = Instant::now();

        let strings = self.strings.read().await;
        if let Some(entry) = strings.get(key) {
            if !entry.expired() {
                return Ok(Some(entry.expires_at.duration_since(now).as_secs() as i64));
            }
            return Ok(None);
        }
        drop(strings);

        let sets = self.sets.read().await;
        match sets.get(key) {
            Some(entry) if !entry.expired() => match entry.expires_at {
                Some(at) => Ok(Some(at.duration_since(now).as_secs() as i64)),
                // 集合存在但尚未设置过期时间
                None => Ok(Some(-1)),
            },
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let store = MemoryKvStore::new();

        store.set_ex("k1", "v1", 60).await.unwrap();
        assert_eq!(store.get("k1").await.unwrap(), Some("v1".to_string()));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_gone() {
        let store = MemoryKvStore::new();

        store.set_ex("k1", "v1", 0).await.unwrap();
        assert_eq!(store.get("k1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_del_removes_value() {
        let store = MemoryKvStore::new();

        store.set_ex("k1", "v1", 60).await.unwrap();
        assert_eq!(store.get_del("k1").await.unwrap(), Some("v1".to_string()));
        // 第二次读取应该为空
        assert_eq!(store.get_del("k1").await.unwrap(), None);
        assert_eq!(store.get("k1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_operations() {
        let store = MemoryKvStore::new();

        store.sadd("s1", "a").await.unwrap();
        store.sadd("s1", "b").await.unwrap();
        store.sadd("s1", "a").await.unwrap();

        let mut members = store.smembers("s1").await.unwrap();
        members.sort();
        assert_eq!(members, vec!["a".to_string(), "b".to_string()]);

        store.srem("s1", "a").await.unwrap();
        assert_eq!(store.smembers("s1").await.unwrap(), vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_del_covers_both_kinds() {
        let store = MemoryKvStore::new();

        store.set_ex("k1", "v1", 60).await.unwrap();
        store.sadd("s1", "a").await.unwrap();

        store.del("k1").await.unwrap();
        store.del("s1").await.unwrap();

        assert_eq!(store.get("k1").await.unwrap(), None);
        assert!(store.smembers("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ttl_reflects_expiry() {
        let store = MemoryKvStore::new();

        store.set_ex("k1", "v1", 3600).await.unwrap();
        let ttl = store.ttl("k1").await.unwrap().unwrap();
        assert!(ttl > 3590 && ttl <= 3600);

        assert_eq!(store.ttl("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expire_rearms_set_ttl() {
        let store = MemoryKvStore::new();

        store.sadd("s1", "a").await.unwrap();
        assert_eq!(store.ttl("s1").await.unwrap(), Some(-1));

        store.expire("s1", 600).await.unwrap();
        let ttl = store.ttl("s1").await.unwrap().unwrap();
        assert!(ttl > 590 && ttl <= 600);
    }
}
