//! 统一配置中心
//!
//! 从环境变量加载应用配置：数据库连接、HTTP 服务地址和
//! 清理任务的周期/阈值。

use std::env;

use serde::{Deserialize, Serialize};

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 数据库配置
    pub database: DatabaseConfig,
    /// 服务器配置
    pub server: ServerConfig,
    /// 清理任务配置
    pub sweeper: SweeperSettings,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 清理任务配置，单位为秒
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweeperSettings {
    pub interval_secs: u64,
    pub threshold_secs: u64,
}

impl AppConfig {
    /// 从环境变量加载配置。
    /// DATABASE_URL 缺失时 panic，避免生产环境落到不安全的默认值。
    pub fn from_env() -> Self {
        Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .expect("DATABASE_URL environment variable is required"),
                max_connections: env_or("DB_MAX_CONNECTIONS", 5),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: env_or("SERVER_PORT", 5000),
            },
            sweeper: SweeperSettings {
                interval_secs: env_or("SWEEP_INTERVAL_SECS", 1),
                threshold_secs: env_or("INACTIVITY_THRESHOLD_SECS", 10),
            },
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
