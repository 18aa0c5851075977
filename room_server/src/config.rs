//! 服务端配置的加载与默认值。
//!
//! 配置来源按优先级从低到高：内置默认值 → `app_settings.json` → 环境变量（`PORT`、`APP_ENV`）。

use crate::error::AppError;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// 服务默认监听的主机地址
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// 服务默认监听的端口号
pub const DEFAULT_PORT: u16 = 3500;
/// 配置文件名
pub const CONFIG_FILE_NAME: &str = "app_settings.json";
/// 可用于指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "APP_SETTINGS";

/// 聊天服务端详细配置
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// 绑定的主机地址
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// WebSocket 升级路径
    pub ws_path: String,
    /// 静态资源目录；目录不存在时不挂载静态文件服务
    pub static_dir: PathBuf,
    /// 生产模式下不允许任何跨域访问
    pub production: bool,
    /// 非生产模式下允许的跨域来源
    pub allowed_origins: Vec<String>,
    /// 协调器入站事件队列的容量（条）
    pub event_queue_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            ws_path: "/ws".to_string(),
            static_dir: PathBuf::from("public"),
            production: false,
            allowed_origins: vec!["http://localhost:5500".to_string(), "http://127.0.0.1:5500".to_string()],
            event_queue_capacity: 1024,
        }
    }
}

impl ServerConfig {
    /// 解析监听地址。
    pub fn listen_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::ConfigError(format!("无效的监听地址 {}:{}: {}", self.host, self.port, e)))
    }

    /// 当前模式下实际放行的跨域来源。
    pub fn effective_origins(&self) -> &[String] {
        if self.production {
            &[]
        } else {
            &self.allowed_origins
        }
    }
}

/// 应用的主配置结构体
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
}

impl AppConfig {
    /// 用环境变量覆盖配置项。
    ///
    /// `lookup` 通常是 `|key| std::env::var(key).ok()`，测试中可以传入固定的映射。
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|e| AppError::ConfigError(format!("环境变量 PORT 的值 '{}' 不是合法端口: {}", port, e)))?;
            info!("[配置模块] 端口已被环境变量 PORT 覆盖为 {}", self.server.port);
        }
        if let Some(app_env) = lookup("APP_ENV") {
            self.server.production = app_env.eq_ignore_ascii_case("production");
            info!("[配置模块] APP_ENV={}，生产模式: {}", app_env, self.server.production);
        }
        Ok(())
    }
}

/// 加载配置：读取文件（缺失或损坏时使用默认值并尝试写回），再应用环境变量覆盖。
pub fn load_config() -> Result<AppConfig, AppError> {
    let path = config_file_path();
    let mut config = load_or_create_config(&path);
    config.apply_env_overrides(|key| env::var(key).ok())?;
    Ok(config)
}

/// 获取配置文件路径：优先 `APP_SETTINGS` 环境变量，其次当前目录。
pub fn config_file_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join(CONFIG_FILE_NAME)
}

/// 从指定路径读取配置文件。
pub fn load_or_create_config(path: &Path) -> AppConfig {
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => {
                info!("[配置模块] 已从配置文件 {:?} 加载应用配置。", path);
                config
            }
            Err(e) => {
                warn!("[配置模块] 从 {:?} 反序列化配置失败: {}。将使用默认配置并覆盖该文件。", path, e);
                let default_config = AppConfig::default();
                save_config(&default_config, path);
                default_config
            }
        },
        Err(e) => {
            info!("[配置模块] 未能读取配置文件 {:?} ({})，将使用默认配置并尝试创建新文件。", path, e);
            let default_config = AppConfig::default();
            save_config(&default_config, path);
            default_config
        }
    }
}

/// 保存配置到文件。失败只记录警告。
fn save_config(config: &AppConfig, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("[配置模块] 创建配置目录 {:?} 失败: {}", parent, e);
                return;
            }
        }
    }

    match serde_json::to_string_pretty(config) {
        Ok(content) => {
            if let Err(e) = fs::write(path, content) {
                warn!("[配置模块] 将配置写入文件 {:?} 时失败: {}", path, e);
            } else {
                info!("[配置模块] 已将当前配置保存到 {:?}。", path);
            }
        }
        Err(e) => warn!("[配置模块] 序列化配置失败: {}", e),
    }
}
