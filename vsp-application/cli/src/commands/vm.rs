//! 单步虚拟机操作命令

use std::time::Duration;

use anyhow::Result;
use tracing::info;

use vsp_executor::{AnnotationStep, CloneStep, DeployStep, StepRunner, VmStep};

use crate::commands::common::{
    build_environment, create_client, parse_guest_info, report_published, resolve_env_out,
};
use crate::config::CliConfig;
use crate::{RunOpts, VmAction};

pub async fn handle(action: VmAction) -> Result<()> {
    match action {
        VmAction::Clone {
            source,
            clone_name,
            cluster,
            datastore,
            folder,
            resource_pool,
            customization_spec,
            linked_clone,
            power_on,
            timeout,
            guest_info,
            opts,
        } => {
            let step = VmStep::Clone(CloneStep {
                source_name: source,
                clone_name,
                linked_clone,
                resource_pool,
                cluster,
                datastore,
                folder,
                customization_spec,
                power_on,
                timeout_in_seconds: timeout,
                guest_info_properties: parse_guest_info(&guest_info)?,
            });
            run_step(step, opts).await
        }
        VmAction::Deploy {
            template,
            clone_name,
            cluster,
            datastore,
            folder,
            resource_pool,
            customization_spec,
            linked_clone,
            power_on,
            timeout,
            guest_info,
            opts,
        } => {
            let step = VmStep::Deploy(DeployStep {
                template,
                clone_name,
                linked_clone,
                resource_pool,
                cluster,
                datastore,
                folder,
                customization_spec,
                power_on,
                timeout_in_seconds: timeout,
                guest_info_properties: parse_guest_info(&guest_info)?,
            });
            run_step(step, opts).await
        }
        VmAction::Annotate {
            vm,
            annotation,
            opts,
        } => {
            let step = VmStep::AddAnnotation(AnnotationStep { vm, annotation });
            run_step(step, opts).await
        }
    }
}

/// 构建环境并执行单个步骤
///
/// 最终一次不设防执行的错误从这里带着原始信息上抛,
/// 由进程退出码终止构建步骤。
async fn run_step(step: VmStep, opts: RunOpts) -> Result<()> {
    let config = CliConfig::load()?;
    let client = create_client(&config).await?;
    let mut build = build_environment(&config, &opts.params)?;

    let runner = StepRunner::new(opts.retries, Duration::from_secs(opts.retry_delay));
    let success = runner.run(&step, &client, &mut build).await?;

    let env_out = resolve_env_out(opts.env_out);
    report_published(&build, env_out.as_deref())?;

    if success {
        info!("步骤 \"{}\" 执行成功", step.describe());
        Ok(())
    } else {
        anyhow::bail!("步骤 \"{}\" 返回失败", step.describe())
    }
}
