//! 计划执行命令

use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::info;

use vsp_executor::{StepPlan, StepRunner};

use crate::commands::common::{build_environment, create_client, report_published, resolve_env_out};
use crate::config::CliConfig;

pub async fn handle(
    plan_path: &str,
    retries: Option<u32>,
    retry_delay: Option<u64>,
    params: &[String],
    env_out: Option<String>,
    report_path: Option<String>,
) -> Result<()> {
    let config = CliConfig::load()?;
    let plan = StepPlan::from_yaml(plan_path)
        .with_context(|| format!("加载计划文件失败: {}", plan_path))?;

    info!("加载计划: {} ({} 个步骤)", plan.name, plan.steps.len());

    let client = create_client(&config).await?;
    let mut build = build_environment(&config, params)?;

    // 命令行参数优先于计划里的重试设置
    let max_attempts = retries.unwrap_or(plan.retries);
    let delay = Duration::from_secs(retry_delay.unwrap_or(plan.retry_delay_secs));
    let runner = StepRunner::new(max_attempts, delay);

    let report = runner.run_plan(&plan, &client, &mut build).await;

    let env_out = resolve_env_out(env_out);
    report_published(&build, env_out.as_deref())?;

    if let Some(path) = &report_path {
        std::fs::write(path, report.to_json()?)
            .with_context(|| format!("写入执行报告失败: {}", path))?;
        info!("执行报告已写入: {}", path);
    }

    if report.is_success() {
        info!(
            "计划 \"{}\" 执行成功: {}/{} 步骤完成",
            plan.name, report.success_count, report.total_steps
        );
        Ok(())
    } else {
        bail!(
            "计划 \"{}\" 执行失败: {}",
            plan.name,
            report.first_error().unwrap_or("未知错误")
        )
    }
}
