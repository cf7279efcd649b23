//! 备注更新步骤

use serde::{Deserialize, Serialize};
use tracing::info;

use vsp_platform::VSphere;

use crate::environment::BuildEnvironment;
use crate::steps::StepOutcome;
use crate::{ExecutorError, Result};

/// 更新虚拟机备注的步骤参数
///
/// 不涉及开机等待, 也没有 guest-info 注入。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationStep {
    /// 虚拟机名称
    pub vm: String,

    /// 备注文本 (支持宏占位符)
    pub annotation: String,
}

impl AnnotationStep {
    pub fn validate(&self) -> Result<()> {
        if self.vm.is_empty() {
            return Err(ExecutorError::ConfigError("虚拟机名称不能为空".to_string()));
        }
        Ok(())
    }

    pub async fn execute(
        &self,
        vsphere: &dyn VSphere,
        build: &BuildEnvironment,
    ) -> Result<StepOutcome> {
        let ctx = build.execution_context();
        let vm = ctx.expand(&self.vm);
        let annotation = ctx.expand(&self.annotation);

        info!("更新虚拟机 \"{}\" 的备注为 \"{}\", 请稍候", vm, annotation);
        vsphere.set_annotation(&vm, &annotation).await?;
        info!("备注更新完成");

        Ok(StepOutcome::success())
    }
}
