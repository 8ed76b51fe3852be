use anyhow::{Context, Result};
use promboard::{
    auth::{AuthService, JwtService, MemoryUserStore, RefreshTokenStore, UserStore},
    cli::Cli,
    config::{self, ServerConfig},
    infra::{KvStore, MemoryKvStore, RedisKvStore},
    logging, HttpServer,
};
use std::fs;
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载 .env 文件（如果存在）
    let _ = dotenvy::dotenv();

    // 解析命令行参数
    let cli = Cli::parse();

    // 处理子命令
    if let Some(command) = &cli.command {
        match command {
            promboard::cli::Commands::GenerateConfig { path } => {
                return generate_config(path);
            }
            promboard::cli::Commands::ValidateConfig { path } => {
                return validate_config(path);
            }
            promboard::cli::Commands::ShowConfig => {
                return show_config(&cli);
            }
        }
    }

    // 快速读取 config.toml 的 [logging] 段（不加载完整配置）
    let early_log = config::load_early_logging_config(cli.config_file.as_deref());

    // 合并日志配置（优先级：CLI > config.toml > 默认值）
    let log_level = cli
        .get_log_level()
        .or(early_log.level)
        .unwrap_or_else(|| "info".to_string());
    let log_format = cli.get_log_format().or(early_log.format);

    logging::init_logging(&log_level, log_format.as_deref(), cli.quiet)?;

    tracing::info!("🚀 Promboard Auth Server starting...");

    // 加载配置（按优先级：命令行 > 环境变量 > 配置文件 > 默认值）
    let config = ServerConfig::load(&cli).context("加载配置失败")?;

    if cli.dev {
        tracing::info!("🔧 开发模式已启用");
    }

    // 显示配置信息
    tracing::info!("📊 Server Configuration:");
    tracing::info!("  - Host: {}", config.host);
    tracing::info!("  - HTTP Port: {}", config.http_port);
    tracing::info!("  - Access Token TTL: {}s", config.auth.access_token_ttl_secs);
    tracing::info!(
        "  - Refresh Token TTL: {}d",
        config.auth.refresh_token_ttl_days
    );
    tracing::info!("  - Redis: {}", config.has_redis());
    tracing::info!("  - Log Level: {}", config.log_level);

    // 创建服务器（Redis 连接失败等会打印错误并退出）
    let server = match build_server(&config).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("❌ 服务器初始化失败: {}", e);
            tracing::error!("💡 请检查配置和 Redis 连接后重试");
            process::exit(1);
        }
    };

    // 运行服务器
    if let Err(e) = server.start().await {
        tracing::error!("❌ 服务器运行失败: {}", e);
        process::exit(1);
    }

    Ok(())
}

/// 组装服务组件
async fn build_server(config: &ServerConfig) -> promboard::Result<HttpServer> {
    // 令牌存储后端：配置了 Redis 用 Redis，否则退回进程内存储
    let kv: Arc<dyn KvStore> = match &config.redis {
        Some(redis_config) => Arc::new(RedisKvStore::new(redis_config).await?),
        None => {
            tracing::warn!("⚠️ 未配置 Redis，刷新令牌使用进程内存储（重启即失效，仅适合开发环境）");
            Arc::new(MemoryKvStore::new())
        }
    };

    // 凭证库：生产环境由外部用户服务实现 UserStore
    let users: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());

    let jwt_service = Arc::new(JwtService::new(
        &config.auth.jwt_secret,
        config.auth.jwt_issuer.clone(),
        config.auth.access_token_ttl_secs,
    ));

    let refresh_tokens = Arc::new(RefreshTokenStore::new(
        kv,
        config.auth.refresh_token_ttl_secs(),
    ));

    let auth_service = Arc::new(AuthService::new(
        users,
        jwt_service.clone(),
        refresh_tokens,
    ));

    Ok(HttpServer::new(
        auth_service,
        jwt_service,
        config.host.clone(),
        config.http_port,
    ))
}

/// 生成默认配置文件
fn generate_config(path: &str) -> Result<()> {
    let default_config = r#"# Promboard Auth Server 配置文件
# 此文件由 promboard generate-config 生成

[server]
host = "0.0.0.0"
http_port = 9090

[auth]
# 至少 32 字符，生产环境请通过 JWT_SECRET 环境变量注入
jwt_secret = ""
jwt_issuer = "promboard"
access_token_ttl_secs = 900
refresh_token_ttl_days = 30

[redis]
url = "redis://127.0.0.1:6379"
pool_size = 16
min_idle = 2
connection_timeout_secs = 5
command_timeout_ms = 1000
idle_timeout_secs = 300

[logging]
level = "info"
format = "compact"
"#;

    fs::write(path, default_config).with_context(|| format!("无法写入配置文件: {}", path))?;

    println!("✅ 配置文件已生成: {}", path);
    Ok(())
}

/// 验证配置文件
fn validate_config(path: &str) -> Result<()> {
    let config = ServerConfig::from_toml_file(path)
        .with_context(|| format!("配置文件验证失败: {}", path))?;

    println!("✅ 配置文件有效: {}", path);
    println!("📊 配置摘要:");
    println!("  - Host: {}", config.host);
    println!("  - HTTP Port: {}", config.http_port);
    println!("  - Redis: {}", config.has_redis());

    Ok(())
}

/// 显示最终配置（合并后的配置）
fn show_config(cli: &Cli) -> Result<()> {
    // 初始化基本日志（用于显示配置）
    logging::init_logging("info", None, false)?;

    let config = ServerConfig::load(cli).context("加载配置失败")?;

    println!("📊 最终配置（合并后的配置）:");
    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}
