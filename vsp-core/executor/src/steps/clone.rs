//! 克隆步骤

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use vsp_platform::{CloneOptions, VSphere, VSphereError};

use crate::environment::BuildEnvironment;
use crate::guest_info::{resolve_guest_info_properties, GuestInfoProperty};
use crate::ip_wait::IpWaiter;
use crate::steps::{default_timeout, StepOutcome};
use crate::{ExecutorError, Result};

/// 从既有虚拟机克隆的步骤参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneStep {
    /// 来源虚拟机名称
    pub source_name: String,

    /// 新虚拟机名称
    pub clone_name: String,

    /// 是否链接克隆
    #[serde(default)]
    pub linked_clone: bool,

    /// 资源池
    #[serde(default)]
    pub resource_pool: String,

    /// 集群
    pub cluster: String,

    /// 数据存储
    #[serde(default)]
    pub datastore: String,

    /// 目标文件夹
    #[serde(default)]
    pub folder: String,

    /// 自定义规范名称
    #[serde(default)]
    pub customization_spec: String,

    /// 克隆后是否开机
    #[serde(default)]
    pub power_on: bool,

    /// 等待 IP 的超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_in_seconds: u64,

    /// guest-info 属性声明
    #[serde(default)]
    pub guest_info_properties: Vec<GuestInfoProperty>,
}

impl CloneStep {
    pub fn validate(&self) -> Result<()> {
        if self.source_name.is_empty() {
            return Err(ExecutorError::ConfigError("克隆来源名称不能为空".to_string()));
        }
        if self.clone_name.is_empty() {
            return Err(ExecutorError::ConfigError("新虚拟机名称不能为空".to_string()));
        }
        if self.cluster.is_empty() {
            return Err(ExecutorError::ConfigError("集群名称不能为空".to_string()));
        }
        Ok(())
    }

    pub async fn execute(
        &self,
        vsphere: &dyn VSphere,
        build: &BuildEnvironment,
    ) -> Result<StepOutcome> {
        // 每次执行重新构建上下文并展开参数, 上游对参数的修改在重试中生效
        let ctx = build.execution_context();
        let source_name = ctx.expand(&self.source_name);
        let clone_name = ctx.expand(&self.clone_name);
        let cluster = ctx.expand(&self.cluster);
        let datastore = ctx.expand(&self.datastore);

        let options = CloneOptions {
            linked_clone: self.linked_clone,
            resource_pool: ctx.expand(&self.resource_pool),
            cluster: cluster.clone(),
            datastore: datastore.clone(),
            folder: ctx.expand(&self.folder),
            power_on: self.power_on,
            customization_spec: ctx.expand(&self.customization_spec),
        };

        info!("克隆虚拟机: {} -> {}", source_name, clone_name);
        vsphere.clone_vm(&source_name, &clone_name, &options).await?;

        let mut outcome = StepOutcome::success();

        if !self.guest_info_properties.is_empty() {
            let resolved = resolve_guest_info_properties(
                &clone_name,
                &cluster,
                &datastore,
                &self.guest_info_properties,
                build,
                &ctx,
            )
            .await?;
            if !resolved.is_empty() {
                vsphere.inject_guest_properties(&clone_name, &resolved).await?;
            }
        }

        if self.power_on {
            info!(
                "尝试在 {} 秒内获取 \"{}\" 的 IP 地址",
                self.timeout_in_seconds, clone_name
            );
            let handle = vsphere
                .find_vm(&clone_name)
                .await?
                .ok_or_else(|| VSphereError::NotFound(format!("虚拟机 {}", clone_name)))?;
            let ip = IpWaiter::default()
                .wait_for_ip(vsphere, &handle, Duration::from_secs(self.timeout_in_seconds))
                .await?;
            match ip {
                Some(ip) => {
                    info!("成功获取 \"{}\" 的 IP: {}", clone_name, ip);
                    info!("将 {} 发布为环境变量 VSPHERE_IP", ip);
                    outcome.published.add("VSPHERE_IP", &ip);
                    outcome.ip = Some(ip);
                }
                None => {
                    warn!(
                        "等待 {} 秒后仍未获取到 \"{}\" 的 IP 地址",
                        self.timeout_in_seconds, clone_name
                    );
                }
            }
        }

        info!("\"{}\" 克隆完成", clone_name);
        Ok(outcome)
    }
}
