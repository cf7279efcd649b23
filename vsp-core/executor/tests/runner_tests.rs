//! 重试执行器行为测试
//!
//! 覆盖两段式重试策略的关键语义: 守护尝试吞错继续、成功即返回、
//! 最终一次不设防执行的错误原样上抛。

mod common;

use std::time::Duration;

use common::FakeVSphere;
use vsp_executor::steps::DEFAULT_TIMEOUT_SECS;
use vsp_executor::{BuildEnvironment, CloneStep, ExecutorError, StepRunner, VmStep};

fn clone_step(source: &str, target: &str) -> VmStep {
    VmStep::Clone(CloneStep {
        source_name: source.to_string(),
        clone_name: target.to_string(),
        linked_clone: false,
        resource_pool: String::new(),
        cluster: "cluster-01".to_string(),
        datastore: "ds-01".to_string(),
        folder: String::new(),
        customization_spec: String::new(),
        power_on: false,
        timeout_in_seconds: DEFAULT_TIMEOUT_SECS,
        guest_info_properties: vec![],
    })
}

#[tokio::test(start_paused = true)]
async fn test_success_on_first_attempt() {
    let vsphere = FakeVSphere::new();
    let mut build = BuildEnvironment::new();
    let runner = StepRunner::new(3, Duration::from_secs(10));

    let result = runner
        .run(&clone_step("tmpl1", "vm-A"), &vsphere, &mut build)
        .await
        .unwrap();

    assert!(result);
    assert_eq!(vsphere.clone_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_success_within_guarded_attempts_skips_final_attempt() {
    // 前两次调用失败, 第三次成功: 恰好 3 次调用, 不再追加不设防执行
    let vsphere = FakeVSphere::new().fail_clone_times(2);
    let mut build = BuildEnvironment::new();
    let runner = StepRunner::new(3, Duration::from_secs(10));

    let result = runner
        .run(&clone_step("tmpl1", "vm-A"), &vsphere, &mut build)
        .await
        .unwrap();

    assert!(result);
    assert_eq!(vsphere.clone_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_attempts_propagate_final_error() {
    // 守护尝试全部失败后, 最终一次不设防执行的错误原样上抛
    let vsphere = FakeVSphere::new().fail_clone_times(10);
    let mut build = BuildEnvironment::new();
    let runner = StepRunner::new(2, Duration::from_secs(5));

    let result = runner
        .run(&clone_step("tmpl1", "vm-A"), &vsphere, &mut build)
        .await;

    assert!(matches!(result, Err(ExecutorError::Platform(_))));
    // 2 次守护尝试 + 1 次不设防执行
    assert_eq!(vsphere.clone_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_zero_guarded_attempts_runs_single_unguarded() {
    let vsphere = FakeVSphere::new().fail_clone_times(1);
    let mut build = BuildEnvironment::new();
    let runner = StepRunner::new(0, Duration::from_secs(1));

    let result = runner
        .run(&clone_step("tmpl1", "vm-A"), &vsphere, &mut build)
        .await;

    assert!(result.is_err());
    assert_eq!(vsphere.clone_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_config_error_surfaces_before_any_attempt() {
    let vsphere = FakeVSphere::new();
    let mut build = BuildEnvironment::new();
    let runner = StepRunner::new(3, Duration::from_secs(1));

    let result = runner
        .run(&clone_step("", "vm-A"), &vsphere, &mut build)
        .await;

    assert!(matches!(result, Err(ExecutorError::ConfigError(_))));
    assert_eq!(vsphere.clone_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_recovered_attempt_still_publishes() {
    // 重试后成功的执行同样发布派生值
    let vsphere = FakeVSphere::new().fail_deploy_times(1).ip_after_polls(0, "10.0.0.9");
    let mut build = BuildEnvironment::new();
    let runner = StepRunner::new(2, Duration::from_secs(3));

    let step: VmStep = serde_yaml::from_str(
        r#"
action: deploy
template: tmpl-base
clone_name: vm-B
cluster: cluster-01
power_on: true
timeout_in_seconds: 5
"#,
    )
    .unwrap();

    let result = runner.run(&step, &vsphere, &mut build).await.unwrap();
    assert!(result);
    assert_eq!(vsphere.deploy_calls(), 2);
    assert_eq!(build.execution_context().get("VSPHERE_IP"), Some("10.0.0.9"));
}
