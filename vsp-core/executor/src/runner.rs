//! 步骤重试执行器
//!
//! 以"有界守护重试 + 最终一次不设防执行"的两段式策略驱动单个步骤:
//!
//! 1. 至多 `max_attempts` 次守护尝试: 任何错误只记录日志后吞掉,
//!    失败的尝试之间等待固定的 `retry_delay` (固定间隔, 非指数退避);
//! 2. 守护尝试全部失败后追加一次不设防执行: 这次的错误原样上抛,
//!    由宿主终止构建步骤。
//!
//! 这一形状是对外契约的一部分, 调用方依赖它的精确语义, 不要把它
//! 改写成单层的 N 次重试。

use std::time::Duration;

use tracing::{debug, info, warn};

use vsp_platform::VSphere;

use crate::environment::BuildEnvironment;
use crate::plan::StepPlan;
use crate::report::{RunReport, StepReport};
use crate::steps::{StepOutcome, VmStep};
use crate::Result;

/// 步骤重试执行器
#[derive(Debug, Clone)]
pub struct StepRunner {
    /// 守护尝试次数上限
    max_attempts: u32,

    /// 失败尝试之间的固定等待
    retry_delay: Duration,
}

impl StepRunner {
    /// 创建执行器
    ///
    /// `max_attempts` 为 0 时跳过守护阶段, 只执行最终一次不设防尝试。
    pub fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts,
            retry_delay,
        }
    }

    /// 按计划的重试设置创建执行器
    pub fn from_plan(plan: &StepPlan) -> Self {
        Self::new(plan.retries, Duration::from_secs(plan.retry_delay_secs))
    }

    /// 执行单个步骤, 返回是否成功
    ///
    /// 校验只做一次, 配置错误立即上报且步骤不会被执行; 成功的执行把
    /// 派生值发布进宿主环境后立即返回。
    pub async fn run(
        &self,
        step: &VmStep,
        vsphere: &dyn VSphere,
        build: &mut BuildEnvironment,
    ) -> Result<bool> {
        self.run_with_outcome(step, vsphere, build)
            .await
            .map(|outcome| outcome.success)
    }

    /// 执行单个步骤并返回完整结果
    pub async fn run_with_outcome(
        &self,
        step: &VmStep,
        vsphere: &dyn VSphere,
        build: &mut BuildEnvironment,
    ) -> Result<StepOutcome> {
        step.validate()?;

        info!("执行步骤: {}", step.describe());
        for attempt in 1..=self.max_attempts {
            match step.execute(vsphere, build).await {
                Ok(outcome) if outcome.success => {
                    outcome.published.apply_to(build);
                    return Ok(outcome);
                }
                Ok(_) => {
                    warn!("步骤未成功 (尝试 {}/{})", attempt, self.max_attempts);
                }
                Err(e) => {
                    warn!("步骤执行失败 (尝试 {}/{}): {}", attempt, self.max_attempts, e);
                }
            }
            debug!("等待 {:?} 后重试", self.retry_delay);
            tokio::time::sleep(self.retry_delay).await;
        }

        // 最后一次执行不再设防, 错误原样上抛并终止构建步骤
        let outcome = step.execute(vsphere, build).await?;
        if outcome.success {
            outcome.published.apply_to(build);
        }
        Ok(outcome)
    }

    /// 顺序执行计划中的全部步骤
    ///
    /// 首个失败步骤之后的剩余步骤标记为跳过; 所有失败 (包括最终一次
    /// 不设防执行的错误) 都记录进报告, 由调用方依据报告决定构建结果。
    pub async fn run_plan(
        &self,
        plan: &StepPlan,
        vsphere: &dyn VSphere,
        build: &mut BuildEnvironment,
    ) -> RunReport {
        info!("开始执行计划: {}", plan.name);

        let mut report = RunReport::new(&plan.name);
        report.description = plan.description.clone();

        let mut aborted = false;
        for (index, plan_step) in plan.steps.iter().enumerate() {
            let description = plan_step
                .name
                .clone()
                .unwrap_or_else(|| plan_step.step.describe().to_string());

            if aborted {
                report.add_step_report(StepReport::skipped(index, &description));
                continue;
            }

            info!("执行步骤 {}/{}: {}", index + 1, plan.steps.len(), description);
            let start = std::time::Instant::now();
            match self.run_with_outcome(&plan_step.step, vsphere, build).await {
                Ok(outcome) if outcome.success => {
                    let mut step_report = StepReport::success(index, &description);
                    step_report.duration = start.elapsed();
                    step_report.ip = outcome.ip;
                    report.add_step_report(step_report);
                }
                Ok(_) => {
                    warn!("步骤 \"{}\" 返回失败", description);
                    let mut step_report =
                        StepReport::failed(index, &description, "步骤返回失败");
                    step_report.duration = start.elapsed();
                    report.add_step_report(step_report);
                    aborted = true;
                }
                Err(e) => {
                    warn!("步骤 \"{}\" 执行失败: {}", description, e);
                    let mut step_report =
                        StepReport::failed(index, &description, &e.to_string());
                    step_report.duration = start.elapsed();
                    report.add_step_report(step_report);
                    aborted = true;
                }
            }
        }

        report.published = build.published().to_vec();
        report.finalize();
        info!(
            "计划执行完成: {}/{} 步骤成功",
            report.success_count, report.total_steps
        );
        report
    }
}
