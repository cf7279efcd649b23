//! 模板部署步骤

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use vsp_platform::{CloneOptions, VSphere, VSphereError};

use crate::environment::BuildEnvironment;
use crate::guest_info::{resolve_guest_info_properties, GuestInfoProperty};
use crate::ip_wait::IpWaiter;
use crate::steps::{default_timeout, StepOutcome};
use crate::{ExecutorError, Result};

/// 平台保留的根资源池名称
///
/// 并非所有环境都配置资源池, 但平台始终存在这个隐藏的根资源池,
/// 即使在客户端界面中不可见。
const DEFAULT_RESOURCE_POOL: &str = "Resources";

/// 从模板部署的步骤参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployStep {
    /// 模板名称
    pub template: String,

    /// 新虚拟机名称
    pub clone_name: String,

    /// 是否链接克隆
    #[serde(default)]
    pub linked_clone: bool,

    /// 资源池 (留空时执行期落到平台保留的根资源池)
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

    /// 部署后是否开机
    #[serde(default)]
    pub power_on: bool,

    /// 等待 IP 的超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_in_seconds: u64,

    /// guest-info 属性声明
    #[serde(default)]
    pub guest_info_properties: Vec<GuestInfoProperty>,
}

impl DeployStep {
    pub fn validate(&self) -> Result<()> {
        if self.template.is_empty() {
            return Err(ExecutorError::ConfigError("模板名称不能为空".to_string()));
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
        let ctx = build.execution_context();
        let template = ctx.expand(&self.template);
        let clone_name = ctx.expand(&self.clone_name);
        let cluster = ctx.expand(&self.cluster);
        let datastore = ctx.expand(&self.datastore);

        // 默认资源池只在执行期落地, 声明的配置保持原样
        let resource_pool = if self.resource_pool.is_empty() {
            DEFAULT_RESOURCE_POOL.to_string()
        } else {
            ctx.expand(&self.resource_pool)
        };

        let options = CloneOptions {
            linked_clone: self.linked_clone,
            resource_pool,
            cluster: cluster.clone(),
            datastore: datastore.clone(),
            folder: ctx.expand(&self.folder),
            power_on: self.power_on,
            customization_spec: ctx.expand(&self.customization_spec),
        };

        info!("从模板部署虚拟机: {} -> {}", template, clone_name);
        vsphere.deploy_vm(&template, &clone_name, &options).await?;

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

        info!("\"{}\" 部署完成", clone_name);

        if !self.power_on {
            // 不开机就不等待 IP
            return Ok(outcome);
        }

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

        Ok(outcome)
    }
}
