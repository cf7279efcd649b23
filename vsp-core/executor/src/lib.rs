//! VSP 执行器
//!
//! 虚拟机生命周期步骤的编排引擎: 在 CI/CD 流水线的构建步骤中驱动
//! 克隆 / 模板部署 / 备注更新等远程操作, 并按固定间隔的有界重试
//! 策略兜底不可靠的平台调用。
//!
//! # 组件
//!
//! - **宿主环境** (`environment`): 流水线宿主注入的构建环境、参数覆盖
//!   与节点属性协作者
//! - **guest-info 解析** (`guest_info`): 注入虚拟机元数据的属性解析
//! - **虚拟机步骤** (`steps`): 克隆 / 部署 / 备注三类声明式步骤
//! - **重试执行器** (`runner`): 有界守护重试 + 最终一次不设防执行
//! - **IP 就绪等待** (`ip_wait`): 开机后按固定间隔轮询网络地址
//! - **结果发布** (`publish`): 成功后向流水线环境追加派生值
//! - **步骤计划** (`plan`) 与 **执行报告** (`report`): 计划文件加载与
//!   结构化结果回报

pub mod environment;
pub mod guest_info;
pub mod ip_wait;
pub mod plan;
pub mod publish;
pub mod report;
pub mod runner;
pub mod steps;

pub use environment::{BuildEnvironment, NodePropertySource, StaticVars};
pub use guest_info::{resolve_guest_info_properties, GuestInfoProperty};
pub use ip_wait::IpWaiter;
pub use plan::{PlanStep, StepPlan};
pub use publish::PublishedEnv;
pub use report::{RunReport, StepReport, StepStatus};
pub use runner::StepRunner;
pub use steps::{AnnotationStep, CloneStep, DeployStep, StepOutcome, VmStep};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutorError {
    /// 声明式参数缺失或非法, 立即上报, 步骤不会被执行
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 平台调用失败, 默认视为瞬态, 由重试策略兜底
    #[error("平台操作失败: {0}")]
    Platform(#[from] vsp_platform::VSphereError),

    /// 执行上下文计算失败, 重试语义与平台错误一致
    #[error("环境解析失败: {0}")]
    EnvironmentResolution(String),

    #[error("计划加载失败: {0}")]
    PlanLoadFailed(String),

    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExecutorError>;
