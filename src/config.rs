use crate::cli::Cli;
use crate::error::{Result, ServerError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP 服务监听地址
    pub host: String,
    /// HTTP 服务端口
    pub http_port: u16,
    /// 日志级别
    pub log_level: String,
    /// 认证配置
    pub auth: AuthConfig,
    /// Redis 配置（可选，未配置时使用进程内存储）
    pub redis: Option<RedisConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            http_port: 9090,
            log_level: "info".to_string(),
            auth: AuthConfig::default(),
            redis: None,
        }
    }
}

impl ServerConfig {
    /// 加载配置（按优先级：命令行 > 环境变量 > 配置文件 > 默认值）
    pub fn load(cli: &Cli) -> Result<Self> {
        // 1. 默认值
        let mut config = if let Some(path) = &cli.config_file {
            // 2. 配置文件
            Self::from_toml_file(path)?
        } else if Path::new("config.toml").exists() {
            Self::from_toml_file("config.toml")?
        } else {
            Self::default()
        };

        // 3. 环境变量
        config.apply_env();

        // 4. 命令行参数
        config.apply_cli(cli);

        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载配置
    pub fn from_toml_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ServerError::Configuration(format!("无法读取配置文件 {}: {}", path, e))
        })?;

        let toml_config: TomlConfig = toml::from_str(&content).map_err(|e| {
            ServerError::Configuration(format!("配置文件解析失败 {}: {}", path, e))
        })?;

        Ok(toml_config.into())
    }

    /// 应用环境变量
    fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("PROMBOARD_HOST") {
            self.host = host;
        }
        if let Ok(port) = std::env::var("PROMBOARD_HTTP_PORT") {
            if let Ok(port) = port.parse() {
                self.http_port = port;
            }
        }
        if let Ok(level) = std::env::var("PROMBOARD_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(url) = std::env::var("REDIS_URL") {
            match &mut self.redis {
                Some(redis) => redis.url = url,
                None => self.redis = Some(RedisConfig::with_url(url)),
            }
        }
    }

    /// 应用命令行参数
    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(port) = cli.http_port {
            self.http_port = port;
        }
        if let Some(level) = cli.get_log_level() {
            self.log_level = level;
        }
        if let Some(secret) = &cli.jwt_secret {
            self.auth.jwt_secret = secret.clone();
        }
        if let Some(url) = &cli.redis_url {
            match &mut self.redis {
                Some(redis) => redis.url = url.clone(),
                None => self.redis = Some(RedisConfig::with_url(url.clone())),
            }
        }
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.http_port == 0 {
            return Err(ServerError::Configuration(
                "http_port 不能为 0".to_string(),
            ));
        }
        self.auth.validate()?;
        Ok(())
    }

    /// 检查是否配置了 Redis
    pub fn has_redis(&self) -> bool {
        self.redis.is_some()
    }
}

/// 认证配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// JWT 签名密钥（至少 32 字符）
    pub jwt_secret: String,
    /// JWT 签发者
    pub jwt_issuer: String,
    /// 访问令牌有效期（秒）
    pub access_token_ttl_secs: i64,
    /// 刷新令牌有效期（天）
    pub refresh_token_ttl_days: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_issuer: "promboard".to_string(),
            access_token_ttl_secs: 15 * 60,
            refresh_token_ttl_days: 30,
        }
    }
}

impl AuthConfig {
    /// 刷新令牌有效期（秒）
    pub fn refresh_token_ttl_secs(&self) -> u64 {
        self.refresh_token_ttl_days * 24 * 3600
    }

    /// 校验认证配置
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.len() < 32 {
            return Err(ServerError::Configuration(
                "jwt_secret 长度至少 32 字符（可通过 JWT_SECRET 环境变量设置）".to_string(),
            ));
        }
        if self.access_token_ttl_secs < 60 {
            return Err(ServerError::Configuration(
                "access_token_ttl_secs 不能小于 60 秒".to_string(),
            ));
        }
        if self.refresh_token_ttl_days == 0 {
            return Err(ServerError::Configuration(
                "refresh_token_ttl_days 不能为 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Redis 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis 连接 URL
    pub url: String,
    /// 连接池大小
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    /// 最小空闲连接数
    #[serde(default = "default_min_idle")]
    pub min_idle: u32,
    /// 建立连接超时时间（秒）
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,
    /// 单条命令执行超时时间（毫秒）
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
    /// 空闲连接回收时间（秒）
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

fn default_pool_size() -> u32 {
    16
}

fn default_min_idle() -> u32 {
    2
}

fn default_connection_timeout_secs() -> u64 {
    5
}

fn default_command_timeout_ms() -> u64 {
    1000
}

fn default_idle_timeout_secs() -> u64 {
    300
}

impl RedisConfig {
    /// 使用默认池参数创建配置
    pub fn with_url(url: String) -> Self {
        Self {
            url,
            pool_size: default_pool_size(),
            min_idle: default_min_idle(),
            connection_timeout_secs: default_connection_timeout_secs(),
            command_timeout_ms: default_command_timeout_ms(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }

    /// 获取建立连接超时时间
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// 获取命令执行超时时间
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// 获取空闲连接回收时间
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// TOML 配置文件结构（与运行时配置解耦，字段全部可选）
#[derive(Debug, Deserialize)]
struct TomlConfig {
    server: Option<TomlServerSection>,
    auth: Option<TomlAuthSection>,
    redis: Option<RedisConfig>,
    logging: Option<TomlLoggingSection>,
}

#[derive(Debug, Deserialize)]
struct TomlServerSection {
    host: Option<String>,
    http_port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct TomlAuthSection {
    jwt_secret: Option<String>,
    jwt_issuer: Option<String>,
    access_token_ttl_secs: Option<i64>,
    refresh_token_ttl_days: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlLoggingSection {
    pub level: Option<String>,
    pub format: Option<String>,
}

impl From<TomlConfig> for ServerConfig {
    fn from(toml: TomlConfig) -> Self {
        let mut config = ServerConfig::default();

        if let Some(server) = toml.server {
            if let Some(host) = server.host {
                config.host = host;
            }
            if let Some(port) = server.http_port {
                config.http_port = port;
            }
        }

        if let Some(auth) = toml.auth {
            if let Some(secret) = auth.jwt_secret {
                config.auth.jwt_secret = secret;
            }
            if let Some(issuer) = auth.jwt_issuer {
                config.auth.jwt_issuer = issuer;
            }
            if let Some(ttl) = auth.access_token_ttl_secs {
                config.auth.access_token_ttl_secs = ttl;
            }
            if let Some(days) = auth.refresh_token_ttl_days {
                config.auth.refresh_token_ttl_days = days;
            }
        }

        if let Some(logging) = toml.logging {
            if let Some(level) = logging.level {
                config.log_level = level;
            }
        }

        config.redis = toml.redis;
        config
    }
}

/// 快速读取配置文件的 [logging] 段（在完整配置加载前初始化日志用）
pub fn load_early_logging_config(config_file: Option<&str>) -> TomlLoggingSection {
    let path = config_file.unwrap_or("config.toml");

    let empty = TomlLoggingSection {
        level: None,
        format: None,
    };

    let Ok(content) = fs::read_to_string(path) else {
        return empty;
    };

    #[derive(Deserialize)]
    struct LoggingOnly {
        logging: Option<TomlLoggingSection>,
    }

    toml::from_str::<LoggingOnly>(&content)
        .ok()
        .and_then(|c| c.logging)
        .unwrap_or(empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_port, 9090);
        assert_eq!(config.auth.access_token_ttl_secs, 900);
        assert_eq!(config.auth.refresh_token_ttl_days, 30);
        assert!(!config.has_redis());
    }

    #[test]
    fn test_refresh_ttl_secs() {
        let auth = AuthConfig::default();
        assert_eq!(auth.refresh_token_ttl_secs(), 30 * 24 * 3600);
    }

    #[test]
    fn test_validate_rejects_short_secret() {
        let mut config = ServerConfig::default();
        config.auth.jwt_secret = "too-short".to_string();
        assert!(config.validate().is_err());

        config.auth.jwt_secret = "test-secret-key-at-least-32-chars".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_parse() {
        let toml_str = r#"
[server]
host = "127.0.0.1"
http_port = 9191

[auth]
jwt_secret = "test-secret-key-at-least-32-chars"
access_token_ttl_secs = 600

[redis]
url = "redis://127.0.0.1:6379"

[logging]
level = "debug"
"#;

        let toml_config: TomlConfig = toml::from_str(toml_str).unwrap();
        let config: ServerConfig = toml_config.into();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.http_port, 9191);
        assert_eq!(config.auth.access_token_ttl_secs, 600);
        assert_eq!(config.log_level, "debug");

        let redis = config.redis.expect("redis 段应该被解析");
        assert_eq!(redis.url, "redis://127.0.0.1:6379");
        // 未显式配置的池参数使用默认值
        assert_eq!(redis.pool_size, 16);
    }
}
