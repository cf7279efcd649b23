//! 执行报告

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 计划执行报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// 计划名称
    pub name: String,

    /// 计划描述
    pub description: Option<String>,

    /// 开始时间
    pub start_time: DateTime<Utc>,

    /// 结束时间
    pub end_time: Option<DateTime<Utc>>,

    /// 总耗时
    #[serde(skip)]
    pub duration: Duration,

    /// 总步骤数
    pub total_steps: usize,

    /// 成功步骤数
    pub success_count: usize,

    /// 失败步骤数
    pub failed_count: usize,

    /// 跳过步骤数
    pub skipped_count: usize,

    /// 步骤结果列表
    pub steps: Vec<StepReport>,

    /// 本次运行发布的环境变量
    #[serde(default)]
    pub published: Vec<(String, String)>,
}

impl RunReport {
    /// 创建新的执行报告
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            start_time: Utc::now(),
            end_time: None,
            duration: Duration::from_secs(0),
            total_steps: 0,
            success_count: 0,
            failed_count: 0,
            skipped_count: 0,
            steps: Vec::new(),
            published: Vec::new(),
        }
    }

    /// 添加步骤结果
    pub fn add_step_report(&mut self, report: StepReport) {
        match report.status {
            StepStatus::Success => self.success_count += 1,
            StepStatus::Failed => self.failed_count += 1,
            StepStatus::Skipped => self.skipped_count += 1,
        }
        self.total_steps += 1;
        self.steps.push(report);
    }

    /// 完成报告
    pub fn finalize(&mut self) {
        self.end_time = Some(Utc::now());
        if let Some(end_time) = self.end_time {
            self.duration = (end_time - self.start_time)
                .to_std()
                .unwrap_or(Duration::from_secs(0));
        }
    }

    /// 运行是否成功
    pub fn is_success(&self) -> bool {
        self.failed_count == 0 && self.total_steps > 0
    }

    /// 首个失败步骤的错误信息
    pub fn first_error(&self) -> Option<&str> {
        self.steps
            .iter()
            .find(|s| s.status == StepStatus::Failed)
            .and_then(|s| s.error.as_deref())
    }

    /// 导出为 JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// 导出为 YAML
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// 步骤结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    /// 步骤索引
    pub step_index: usize,

    /// 步骤描述
    pub description: String,

    /// 步骤状态
    pub status: StepStatus,

    /// 错误信息
    pub error: Option<String>,

    /// 耗时
    #[serde(skip)]
    pub duration: Duration,

    /// 获取到的 IP 地址
    pub ip: Option<String>,
}

impl StepReport {
    /// 创建成功的步骤结果
    pub fn success(step_index: usize, description: &str) -> Self {
        Self {
            step_index,
            description: description.to_string(),
            status: StepStatus::Success,
            error: None,
            duration: Duration::from_secs(0),
            ip: None,
        }
    }

    /// 创建失败的步骤结果
    pub fn failed(step_index: usize, description: &str, error: &str) -> Self {
        Self {
            step_index,
            description: description.to_string(),
            status: StepStatus::Failed,
            error: Some(error.to_string()),
            duration: Duration::from_secs(0),
            ip: None,
        }
    }

    /// 创建跳过的步骤结果
    pub fn skipped(step_index: usize, description: &str) -> Self {
        Self {
            step_index,
            description: description.to_string(),
            status: StepStatus::Skipped,
            error: None,
            duration: Duration::from_secs(0),
            ip: None,
        }
    }
}

/// 步骤状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    /// 成功
    Success,

    /// 失败
    Failed,

    /// 跳过
    Skipped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut report = RunReport::new("test-plan");
        report.add_step_report(StepReport::success(0, "克隆虚拟机"));
        report.add_step_report(StepReport::failed(1, "模板部署虚拟机", "平台操作失败"));
        report.add_step_report(StepReport::skipped(2, "更新虚拟机备注"));
        report.finalize();

        assert_eq!(report.total_steps, 3);
        assert_eq!(report.success_count, 1);
        assert_eq!(report.failed_count, 1);
        assert_eq!(report.skipped_count, 1);
        assert!(!report.is_success());
        assert_eq!(report.first_error(), Some("平台操作失败"));
        assert!(report.end_time.is_some());
    }

    #[test]
    fn test_report_json_export() {
        let mut report = RunReport::new("json-plan");
        report.add_step_report(StepReport::success(0, "克隆虚拟机"));
        report.published.push(("VSPHERE_IP".to_string(), "10.0.0.5".to_string()));
        report.finalize();

        let json = report.to_json().unwrap();
        assert!(json.contains("json-plan"));
        assert!(json.contains("VSPHERE_IP"));
    }
}
