//! 虚拟机生命周期步骤
//!
//! 每种步骤是带标签的声明式变体, 共享同一组能力:
//! `describe` / `validate` / `execute`。参数在配置期创建后不可变,
//! 宏展开推迟到每次执行时进行, 重试之间不缓存展开结果。

mod annotate;
mod clone;
mod deploy;

pub use annotate::AnnotationStep;
pub use clone::CloneStep;
pub use deploy::DeployStep;

use serde::{Deserialize, Serialize};

use vsp_platform::VSphere;

use crate::environment::BuildEnvironment;
use crate::publish::PublishedEnv;
use crate::Result;

/// 等待 IP 的默认超时（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub(crate) fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// 步骤执行结果
///
/// 执行产生的一切输出都通过此值显式返回, 步骤自身不保留任何
/// 跨执行的可变状态。
#[derive(Debug, Clone, Default)]
pub struct StepOutcome {
    /// 是否成功
    pub success: bool,

    /// 获取到的 IP 地址 (仅开机等待成功时存在)
    pub ip: Option<String>,

    /// 待发布的派生环境变量 (确认成功后由执行器应用)
    pub published: PublishedEnv,
}

impl StepOutcome {
    /// 创建成功结果
    pub fn success() -> Self {
        Self {
            success: true,
            ip: None,
            published: PublishedEnv::new(),
        }
    }
}

/// 虚拟机生命周期步骤
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum VmStep {
    /// 从既有虚拟机克隆
    Clone(CloneStep),

    /// 从模板部署
    Deploy(DeployStep),

    /// 更新备注
    AddAnnotation(AnnotationStep),
}

impl VmStep {
    /// 步骤显示名称
    pub fn describe(&self) -> &'static str {
        match self {
            VmStep::Clone(_) => "克隆虚拟机",
            VmStep::Deploy(_) => "模板部署虚拟机",
            VmStep::AddAnnotation(_) => "更新虚拟机备注",
        }
    }

    /// 校验声明式参数
    ///
    /// 配置错误立即上报, 步骤不会被执行。
    pub fn validate(&self) -> Result<()> {
        match self {
            VmStep::Clone(step) => step.validate(),
            VmStep::Deploy(step) => step.validate(),
            VmStep::AddAnnotation(step) => step.validate(),
        }
    }

    /// 执行步骤
    ///
    /// 平台侧的任何失败都包装为单个步骤级错误; 失败的执行对流水线
    /// 而言视为未发生 (远端可能已产生的副作用不做回滚)。
    pub async fn execute(
        &self,
        vsphere: &dyn VSphere,
        build: &BuildEnvironment,
    ) -> Result<StepOutcome> {
        match self {
            VmStep::Clone(step) => step.execute(vsphere, build).await,
            VmStep::Deploy(step) => step.execute(vsphere, build).await,
            VmStep::AddAnnotation(step) => step.execute(vsphere, build).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_yaml_tagged_parse() {
        let yaml = r#"
action: clone
source_name: tmpl-base
clone_name: vm-${BUILD_NUMBER}
cluster: cluster-01
power_on: true
guest_info_properties:
  - name: ENV
    value: ${cluster}
"#;
        let step: VmStep = serde_yaml::from_str(yaml).unwrap();
        match &step {
            VmStep::Clone(clone) => {
                assert_eq!(clone.source_name, "tmpl-base");
                assert_eq!(clone.clone_name, "vm-${BUILD_NUMBER}");
                assert!(clone.power_on);
                assert!(!clone.linked_clone);
                assert_eq!(clone.timeout_in_seconds, DEFAULT_TIMEOUT_SECS);
                assert_eq!(clone.guest_info_properties.len(), 1);
            }
            other => panic!("解析出意外的步骤变体: {:?}", other),
        }
        assert_eq!(step.describe(), "克隆虚拟机");
    }

    #[test]
    fn test_annotation_yaml_parse() {
        let yaml = r#"
action: add_annotation
vm: build-vm
annotation: "built by pipeline ${BUILD_NUMBER}"
"#;
        let step: VmStep = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(step, VmStep::AddAnnotation(_)));
    }

    #[test]
    fn test_deploy_json_roundtrip() {
        let step = VmStep::Deploy(DeployStep {
            template: "tmpl-1".to_string(),
            clone_name: "vm-A".to_string(),
            linked_clone: true,
            resource_pool: String::new(),
            cluster: "cluster-01".to_string(),
            datastore: "ds-01".to_string(),
            folder: String::new(),
            customization_spec: String::new(),
            power_on: false,
            timeout_in_seconds: 30,
            guest_info_properties: vec![],
        });
        let json = serde_json::to_string(&step).unwrap();
        assert!(json.contains("\"action\":\"deploy\""));
        let parsed: VmStep = serde_json::from_str(&json).unwrap();
        assert!(matches!(parsed, VmStep::Deploy(d) if d.timeout_in_seconds == 30));
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let step = VmStep::Clone(CloneStep {
            source_name: String::new(),
            clone_name: "vm-A".to_string(),
            linked_clone: false,
            resource_pool: String::new(),
            cluster: "cluster-01".to_string(),
            datastore: String::new(),
            folder: String::new(),
            customization_spec: String::new(),
            power_on: false,
            timeout_in_seconds: DEFAULT_TIMEOUT_SECS,
            guest_info_properties: vec![],
        });
        assert!(step.validate().is_err());
    }
}
