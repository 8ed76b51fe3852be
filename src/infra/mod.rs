// 基础设施模块 - TTL 键值存储抽象与实现

pub mod kv;
pub mod redis;

pub use kv::{KvStore, MemoryKvStore};
pub use redis::RedisKvStore;
