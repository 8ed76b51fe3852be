use clap::{Parser, Subcommand};

// 确保 Parser trait 被使用
impl Cli {
    /// 解析命令行参数
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

/// Promboard Server - 指标仪表盘的认证与会话服务
#[derive(Parser, Debug)]
#[command(name = "promboard")]
#[command(version)]
#[command(about = "Promboard 仪表盘认证服务", long_about = None)]
pub struct Cli {
    /// 配置文件路径
    #[arg(long, value_name = "FILE", help = "指定配置文件路径")]
    pub config_file: Option<String>,

    /// 服务器监听地址
    #[arg(long, value_name = "ADDRESS", help = "HTTP 服务监听地址")]
    pub host: Option<String>,

    /// HTTP 端口
    #[arg(long, value_name = "PORT", help = "HTTP 服务端口")]
    pub http_port: Option<u16>,

    /// Redis 连接 URL
    #[arg(long, value_name = "URL", help = "Redis 连接字符串")]
    pub redis_url: Option<String>,

    /// JWT 密钥
    #[arg(long, value_name = "SECRET", help = "JWT 签名密钥")]
    pub jwt_secret: Option<String>,

    /// 日志级别
    #[arg(
        long,
        value_name = "LEVEL",
        help = "日志级别: trace, debug, info, warn, error"
    )]
    pub log_level: Option<String>,

    /// 日志格式
    #[arg(long, value_name = "FORMAT", help = "日志格式: pretty, json, compact")]
    pub log_format: Option<String>,

    /// 详细输出（可重复使用：-v, -vv）
    #[arg(short, action = clap::ArgAction::Count, help = "详细输出级别")]
    pub verbose: u8,

    /// 静默模式
    #[arg(long, short = 'q', help = "静默模式（不输出日志）")]
    pub quiet: bool,

    /// 开发模式（等同于 --log-level debug --log-format pretty）
    #[arg(long, help = "启用开发模式")]
    pub dev: bool,

    /// 子命令
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// 计算生效的日志级别（优先级：--log-level > -v 计数 > --dev）
    pub fn get_log_level(&self) -> Option<String> {
        if let Some(level) = &self.log_level {
            return Some(level.clone());
        }
        match self.verbose {
            0 => {
                if self.dev {
                    Some("debug".to_string())
                } else {
                    None
                }
            }
            1 => Some("debug".to_string()),
            _ => Some("trace".to_string()),
        }
    }

    /// 计算生效的日志格式
    pub fn get_log_format(&self) -> Option<String> {
        if let Some(format) = &self.log_format {
            return Some(format.clone());
        }
        if self.dev {
            Some("pretty".to_string())
        } else {
            None
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 生成默认配置文件
    GenerateConfig {
        /// 输出文件路径
        #[arg(value_name = "PATH", default_value = "config.toml")]
        path: String,
    },
    /// 验证配置文件
    ValidateConfig {
        /// 配置文件路径
        #[arg(value_name = "PATH", default_value = "config.toml")]
        path: String,
    },
    /// 显示最终配置（合并后的配置）
    ShowConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_priority() {
        let cli = Cli {
            config_file: None,
            host: None,
            http_port: None,
            redis_url: None,
            jwt_secret: None,
            log_level: Some("warn".to_string()),
            log_format: None,
            verbose: 2,
            quiet: false,
            dev: true,
            command: None,
        };

        // 显式 --log-level 优先于 -vv 和 --dev
        assert_eq!(cli.get_log_level(), Some("warn".to_string()));
    }

    #[test]
    fn test_dev_mode_defaults() {
        let cli = Cli {
            config_file: None,
            host: None,
            http_port: None,
            redis_url: None,
            jwt_secret: None,
            log_level: None,
            log_format: None,
            verbose: 0,
            quiet: false,
            dev: true,
            command: None,
        };

        assert_eq!(cli.get_log_level(), Some("debug".to_string()));
        assert_eq!(cli.get_log_format(), Some("pretty".to_string()));
    }
}
