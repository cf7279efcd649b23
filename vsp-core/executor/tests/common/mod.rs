//! 测试共用的平台桩实现

use std::sync::Mutex;

use async_trait::async_trait;

use vsp_platform::{
    CloneOptions, CustomizationSpec, PowerState, Result, SnapshotHandle, VSphere, VSphereError,
    VmHandle,
};

/// 行为可编程、记录调用的桩客户端
#[derive(Default)]
pub struct FakeVSphere {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    clone_failures: u32,
    deploy_failures: u32,
    polls_before_ip: u32,
    ip: Option<String>,
    fail_ip_poll: bool,
    clone_calls: u32,
    deploy_calls: u32,
    annotation_calls: u32,
    ip_polls: u32,
    injected: Vec<(String, Vec<(String, String)>)>,
    annotations: Vec<(String, String)>,
    last_deploy: Option<(String, String, CloneOptions)>,
}

impl FakeVSphere {
    pub fn new() -> Self {
        Self::default()
    }

    /// clone_vm 在成功之前要失败的次数
    pub fn fail_clone_times(self, n: u32) -> Self {
        self.state.lock().unwrap().clone_failures = n;
        self
    }

    /// deploy_vm 在成功之前要失败的次数
    pub fn fail_deploy_times(self, n: u32) -> Self {
        self.state.lock().unwrap().deploy_failures = n;
        self
    }

    /// guest_ip 先返回 `None` 的次数以及之后返回的地址
    pub fn ip_after_polls(self, polls: u32, ip: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.polls_before_ip = polls;
            state.ip = Some(ip.to_string());
        }
        self
    }

    /// 让 guest_ip 直接报错
    pub fn fail_ip_poll(self) -> Self {
        self.state.lock().unwrap().fail_ip_poll = true;
        self
    }

    pub fn clone_calls(&self) -> u32 {
        self.state.lock().unwrap().clone_calls
    }

    pub fn deploy_calls(&self) -> u32 {
        self.state.lock().unwrap().deploy_calls
    }

    pub fn annotation_calls(&self) -> u32 {
        self.state.lock().unwrap().annotation_calls
    }

    pub fn ip_polls(&self) -> u32 {
        self.state.lock().unwrap().ip_polls
    }

    pub fn injected(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.state.lock().unwrap().injected.clone()
    }

    pub fn annotations(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().annotations.clone()
    }

    pub fn last_deploy(&self) -> Option<(String, String, CloneOptions)> {
        self.state.lock().unwrap().last_deploy.clone()
    }
}

#[async_trait]
impl VSphere for FakeVSphere {
    async fn find_vm(&self, name: &str) -> Result<Option<VmHandle>> {
        Ok(Some(VmHandle {
            id: format!("vm-id-{}", name),
            name: name.to_string(),
            template: false,
            power_state: Some(PowerState::PoweredOn),
        }))
    }

    async fn clone_vm(&self, _source: &str, _target: &str, _options: &CloneOptions) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.clone_calls += 1;
        if state.clone_failures > 0 {
            state.clone_failures -= 1;
            return Err(VSphereError::OperationFailed("克隆失败 (模拟)".to_string()));
        }
        Ok(())
    }

    async fn deploy_vm(&self, template: &str, target: &str, options: &CloneOptions) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.deploy_calls += 1;
        if state.deploy_failures > 0 {
            state.deploy_failures -= 1;
            return Err(VSphereError::OperationFailed("部署失败 (模拟)".to_string()));
        }
        state.last_deploy = Some((template.to_string(), target.to_string(), options.clone()));
        Ok(())
    }

    async fn set_annotation(&self, vm: &str, annotation: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.annotation_calls += 1;
        state.annotations.push((vm.to_string(), annotation.to_string()));
        Ok(())
    }

    async fn inject_guest_properties(
        &self,
        vm: &str,
        properties: &[(String, String)],
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.injected.push((vm.to_string(), properties.to_vec()));
        Ok(())
    }

    async fn guest_ip(&self, _vm: &VmHandle) -> Result<Option<String>> {
        let mut state = self.state.lock().unwrap();
        state.ip_polls += 1;
        if state.fail_ip_poll {
            return Err(VSphereError::ApiError(500, "地址查询失败 (模拟)".to_string()));
        }
        if state.polls_before_ip > 0 {
            state.polls_before_ip -= 1;
            return Ok(None);
        }
        Ok(state.ip.clone())
    }

    async fn current_snapshot(&self, _vm: &VmHandle) -> Result<Option<SnapshotHandle>> {
        Ok(None)
    }

    async fn find_customization_spec(&self, _name: &str) -> Result<Option<CustomizationSpec>> {
        Ok(None)
    }
}
