//! 流水线宿主环境
//!
//! 宿主以显式协作者的形式注入: 根 URL、构建环境变量、构建参数覆盖
//! 以及节点属性提供者, 不存在进程级单例查找。

use std::io;

use async_trait::async_trait;
use tracing::debug;

use vsp_common::VarContext;

use crate::{ExecutorError, Result};

/// 节点属性提供者
///
/// 每个提供者向已知变量表贡献零个或多个变量; 失败以 IO 错误上报,
/// 由调用方决定重试。
#[async_trait]
pub trait NodePropertySource: Send + Sync {
    async fn contribute(&self, vars: &mut VarContext) -> io::Result<()>;
}

/// 静态变量提供者
///
/// 把一组固定键值贡献为节点属性, 用于配置文件中声明的附加变量。
#[derive(Debug, Clone, Default)]
pub struct StaticVars {
    vars: VarContext,
}

impl StaticVars {
    pub fn new(vars: VarContext) -> Self {
        Self { vars }
    }
}

#[async_trait]
impl NodePropertySource for StaticVars {
    async fn contribute(&self, vars: &mut VarContext) -> io::Result<()> {
        vars.override_all(&self.vars);
        Ok(())
    }
}

/// 流水线宿主环境
///
/// 每次步骤调用独占一份实例; 执行上下文在每次尝试前重新构建,
/// 因此上游步骤对参数的修改能在后续重试中生效。
pub struct BuildEnvironment {
    /// 流水线宿主根 URL
    root_url: Option<String>,

    /// 构建环境变量
    env: VarContext,

    /// 构建参数覆盖 (优先于环境变量)
    params: VarContext,

    /// 节点属性提供者
    node_properties: Vec<Box<dyn NodePropertySource>>,

    /// 已发布的派生值 (按发布顺序)
    published: Vec<(String, String)>,
}

impl BuildEnvironment {
    /// 创建空的宿主环境
    pub fn new() -> Self {
        Self {
            root_url: None,
            env: VarContext::new(),
            params: VarContext::new(),
            node_properties: Vec::new(),
            published: Vec::new(),
        }
    }

    /// 以当前进程环境变量作为构建环境
    pub fn from_process_env() -> Self {
        let mut build = Self::new();
        build.env.extend_from(std::env::vars());
        build
    }

    /// 设置流水线宿主根 URL
    pub fn with_root_url(mut self, url: impl Into<String>) -> Self {
        self.root_url = Some(url.into());
        self
    }

    /// 注册节点属性提供者
    pub fn with_node_property_source(mut self, source: Box<dyn NodePropertySource>) -> Self {
        self.node_properties.push(source);
        self
    }

    pub fn root_url(&self) -> Option<&str> {
        self.root_url.as_deref()
    }

    /// 写入构建环境变量
    pub fn set_env(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.env.set(name, value);
    }

    /// 写入构建参数覆盖
    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.set(name, value);
    }

    /// 构建本次尝试的执行上下文: 环境变量打底, 参数覆盖 (后写优先)
    ///
    /// 每次调用都重新合并, 不缓存。
    pub fn execution_context(&self) -> VarContext {
        let mut ctx = self.env.clone();
        ctx.override_all(&self.params);
        ctx
    }

    /// 收集节点属性提供者贡献的变量
    pub async fn contribute_node_properties(&self, vars: &mut VarContext) -> Result<()> {
        for source in &self.node_properties {
            source
                .contribute(vars)
                .await
                .map_err(|e| ExecutorError::EnvironmentResolution(e.to_string()))?;
        }
        Ok(())
    }

    /// 向流水线环境追加发布一个派生值
    ///
    /// 只新增/更新自己的键, 不触碰任何无关的既有变量。
    pub fn publish(&mut self, name: &str, value: &str) {
        debug!("发布环境变量: {}={}", name, value);
        self.env.set(name, value);
        match self.published.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.published.push((name.to_string(), value.to_string())),
        }
    }

    /// 本次调用已发布的派生值
    pub fn published(&self) -> &[(String, String)] {
        &self.published
    }
}

impl Default for BuildEnvironment {
    fn default() -> Self {
        Self::new()
    }
}
