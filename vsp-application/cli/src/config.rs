//! CLI 配置管理
//!
//! 支持从多个源加载连接配置:
//! - 环境变量 (优先级最高): `VSP_SERVER` / `VSP_USERNAME` / `VSP_PASSWORD`
//!   / `VSP_ROOT_URL`
//! - 配置文件 (TOML)
//!
//! 配置文件搜索路径 (按优先级):
//! 1. `VSP_CONFIG` 环境变量指定的路径
//! 2. `./vsp.toml` (当前目录)
//! 3. `~/.config/vsp/config.toml` (用户配置目录)

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

fn default_true() -> bool {
    true
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    60
}

/// CLI 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// vSphere 连接配置
    pub server: ServerConfig,

    /// 流水线宿主根 URL (注入 guest-info 已知变量)
    pub root_url: Option<String>,

    /// 附加变量 (以节点属性的形式参与 guest-info 解析)
    #[serde(default)]
    pub vars: HashMap<String, String>,
}

/// vSphere 连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// vCenter 地址
    pub url: String,

    /// 用户名
    pub username: String,

    /// 密码 (建议改用 VSP_PASSWORD 环境变量注入)
    pub password: Option<String>,

    /// 是否验证 SSL 证书
    #[serde(default = "default_true")]
    pub verify_ssl: bool,

    /// 连接超时（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// 请求超时（秒）
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl ServerConfig {
    /// 取得登录密码: 环境变量优先, 其次配置文件
    pub fn password(&self) -> Result<String> {
        if let Ok(password) = env::var("VSP_PASSWORD") {
            return Ok(password);
        }
        self.password
            .clone()
            .context("未配置密码: 请设置 VSP_PASSWORD 环境变量或 server.password 配置项")
    }
}

impl CliConfig {
    /// 按搜索路径加载配置并应用环境变量覆盖
    pub fn load() -> Result<Self> {
        let Some(path) = Self::find_config() else {
            bail!(
                "未找到配置文件: 请创建 ./vsp.toml 或 ~/.config/vsp/config.toml, \
                 或通过 VSP_CONFIG 指定路径"
            );
        };
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// 从指定文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("加载配置文件: {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))
    }

    /// 搜索配置文件路径
    fn find_config() -> Option<PathBuf> {
        if let Ok(path) = env::var("VSP_CONFIG") {
            return Some(PathBuf::from(path));
        }

        let local = PathBuf::from("./vsp.toml");
        if local.exists() {
            return Some(local);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user = config_dir.join("vsp").join("config.toml");
            if user.exists() {
                return Some(user);
            }
        }

        None
    }

    /// 应用环境变量覆盖
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var("VSP_SERVER") {
            self.server.url = url;
        }
        if let Ok(username) = env::var("VSP_USERNAME") {
            self.server.username = username;
        }
        if let Ok(root_url) = env::var("VSP_ROOT_URL") {
            self.root_url = Some(root_url);
        }
    }
}
