//! 执行前预检命令
//!
//! 在真正执行步骤之前复核配置的前置条件, 便于尽早反馈。
//! 这些检查只是核心执行路径前置条件的复刻, 不是权威判定:
//! 含有构建参数占位符的名称在执行期才能解析, 预检只给出警告。

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use vsp_platform::{VSphere, VSphereClient};

use crate::commands::common::create_client;
use crate::config::CliConfig;
use crate::CheckAction;

pub async fn handle(action: CheckAction) -> Result<()> {
    let config = CliConfig::load()?;
    let client = create_client(&config).await?;

    match action {
        CheckAction::Clone {
            source,
            clone_name,
            customization_spec,
        } => check_clone(&client, &source, &clone_name, &customization_spec).await?,
        CheckAction::Deploy {
            template,
            clone_name,
        } => check_deploy(&client, &template, &clone_name).await?,
        CheckAction::Annotation { vm } => check_annotation(&client, &vm).await?,
    }

    info!("预检通过");
    Ok(())
}

async fn check_clone(
    client: &VSphereClient,
    source: &str,
    clone_name: &str,
    customization_spec: &str,
) -> Result<()> {
    check_target_free(client, clone_name).await?;

    if source.contains('$') {
        warn!("来源名称 \"{}\" 含构建参数占位符, 跳过存在性检查", source);
    } else {
        let vm = client
            .find_vm(source)
            .await?
            .with_context(|| format!("来源虚拟机 \"{}\" 不存在", source))?;
        if client.current_snapshot(&vm).await?.is_none() {
            bail!("来源虚拟机 \"{}\" 没有快照, 无法克隆", source);
        }
    }

    if !customization_spec.is_empty()
        && client
            .find_customization_spec(customization_spec)
            .await?
            .is_none()
    {
        bail!("自定义规范 \"{}\" 不存在", customization_spec);
    }

    Ok(())
}

async fn check_deploy(client: &VSphereClient, template: &str, clone_name: &str) -> Result<()> {
    check_target_free(client, clone_name).await?;

    if template.contains('$') {
        warn!("模板名称 \"{}\" 含构建参数占位符, 跳过存在性检查", template);
        return Ok(());
    }

    let vm = client
        .find_vm(template)
        .await?
        .with_context(|| format!("模板 \"{}\" 不存在", template))?;
    if !vm.template {
        bail!("\"{}\" 不是模板, 模板部署要求来源为模板", template);
    }
    Ok(())
}

async fn check_annotation(client: &VSphereClient, vm_name: &str) -> Result<()> {
    if vm_name.contains('$') {
        warn!("虚拟机名称 \"{}\" 含构建参数占位符, 跳过存在性检查", vm_name);
        return Ok(());
    }

    let vm = client
        .find_vm(vm_name)
        .await?
        .with_context(|| format!("虚拟机 \"{}\" 不存在", vm_name))?;
    if vm.template {
        bail!("\"{}\" 是模板, 不能更新备注", vm_name);
    }
    Ok(())
}

/// 确认目标名称尚未被占用
async fn check_target_free(client: &VSphereClient, clone_name: &str) -> Result<()> {
    if clone_name.contains('$') {
        warn!("目标名称 \"{}\" 含构建参数占位符, 跳过占用检查", clone_name);
        return Ok(());
    }
    if client.find_vm(clone_name).await?.is_some() {
        bail!("同名虚拟机 \"{}\" 已存在", clone_name);
    }
    Ok(())
}
