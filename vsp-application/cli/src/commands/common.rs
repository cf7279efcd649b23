//! 命令公共逻辑

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use vsp_common::VarContext;
use vsp_executor::{BuildEnvironment, GuestInfoProperty, StaticVars};
use vsp_platform::{ClientConfig, VSphereClient};

use crate::config::CliConfig;

/// 创建并登录 vSphere 客户端
pub async fn create_client(config: &CliConfig) -> Result<VSphereClient> {
    let server = &config.server;
    let client_config = ClientConfig {
        connect_timeout: server.connect_timeout,
        request_timeout: server.request_timeout,
        verify_ssl: server.verify_ssl,
    };

    let client = VSphereClient::new(&server.url, client_config).context("创建 vSphere 客户端失败")?;
    let password = server.password()?;
    client
        .login(&server.username, &password)
        .await
        .context("vSphere 登录失败")?;
    Ok(client)
}

/// 构建流水线宿主环境
///
/// 进程环境变量打底, 配置文件里的附加变量注册为节点属性,
/// `--param` 作为构建参数覆盖。根 URL 取配置项, 其次回落到
/// 宿主注入的 `JENKINS_URL`。
pub fn build_environment(config: &CliConfig, params: &[String]) -> Result<BuildEnvironment> {
    let mut build = BuildEnvironment::from_process_env();

    let root_url = config
        .root_url
        .clone()
        .or_else(|| std::env::var("JENKINS_URL").ok());
    if let Some(url) = root_url {
        build = build.with_root_url(url);
    }

    if !config.vars.is_empty() {
        let mut vars = VarContext::new();
        vars.extend_from(config.vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        build = build.with_node_property_source(Box::new(StaticVars::new(vars)));
    }

    for pair in params {
        let (name, value) = split_pair(pair)?;
        build.set_param(name, value);
    }

    Ok(build)
}

/// 解析 `KEY=VALUE` 形式的参数
pub fn split_pair(pair: &str) -> Result<(&str, &str)> {
    match pair.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name, value)),
        _ => bail!("非法的键值对 \"{}\", 期望 KEY=VALUE 形式", pair),
    }
}

/// 解析 `--guest-info NAME=VALUE` 声明列表
pub fn parse_guest_info(items: &[String]) -> Result<Vec<GuestInfoProperty>> {
    items
        .iter()
        .map(|item| {
            let (name, value) = split_pair(item)?;
            Ok(GuestInfoProperty {
                name: name.to_string(),
                value: value.to_string(),
            })
        })
        .collect()
}

/// 解析环境文件路径: 命令行参数优先, 其次 `VSP_ENV_FILE` 环境变量
pub fn resolve_env_out(env_out: Option<String>) -> Option<String> {
    env_out.or_else(|| std::env::var("VSP_ENV_FILE").ok())
}

/// 输出发布的环境变量: 打印到标准输出, 并按需追加写入文件
pub fn report_published(build: &BuildEnvironment, env_out: Option<&str>) -> Result<()> {
    for (name, value) in build.published() {
        println!("{}={}", name, value);
    }

    if let Some(path) = env_out {
        if !build.published().is_empty() {
            append_env_file(Path::new(path), build.published())?;
            info!("发布变量已写入: {}", path);
        }
    }
    Ok(())
}

/// 以 `KEY=VALUE` 行追加写入环境文件
fn append_env_file(path: &Path, published: &[(String, String)]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("打开环境文件失败: {}", path.display()))?;
    for (name, value) in published {
        writeln!(file, "{}={}", name, value)
            .with_context(|| format!("写入环境文件失败: {}", path.display()))?;
    }
    Ok(())
}
