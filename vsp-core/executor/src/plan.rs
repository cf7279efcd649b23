//! 步骤计划定义
//!
//! 流水线把一组虚拟机步骤声明在 YAML/JSON 计划文件里, 随重试设置
//! 一起交给执行器。

use serde::{Deserialize, Serialize};

use crate::steps::VmStep;
use crate::{ExecutorError, Result};

fn default_retry_delay() -> u64 {
    10
}

/// 步骤计划
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepPlan {
    /// 计划名称
    pub name: String,

    /// 计划描述
    pub description: Option<String>,

    /// 守护重试次数 (0 表示只执行最终一次不设防尝试)
    #[serde(default)]
    pub retries: u32,

    /// 重试间隔（秒）
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    /// 步骤列表
    pub steps: Vec<PlanStep>,

    /// 计划标签
    #[serde(default)]
    pub tags: Vec<String>,
}

/// 计划中的单个步骤
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    /// 步骤名称 (缺省时使用步骤显示名)
    #[serde(default)]
    pub name: Option<String>,

    /// 步骤定义
    #[serde(flatten)]
    pub step: VmStep,
}

impl StepPlan {
    /// 从 YAML 文件加载计划
    pub fn from_yaml(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| ExecutorError::PlanLoadFailed(e.to_string()))
    }

    /// 从 JSON 字符串加载计划
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ExecutorError::PlanLoadFailed(e.to_string()))
    }

    /// 导出为 JSON
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
