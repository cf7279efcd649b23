//! IP 就绪等待
//!
//! 开机后的虚拟机拿到网络地址需要时间。等待器按固定短间隔轮询平台,
//! 在超时窗口内返回第一个出现的地址; 超时不是错误, 以 `None` 上报,
//! 由调用方决定降级处理。

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use vsp_platform::{VSphere, VmHandle};

use crate::Result;

/// 默认轮询间隔（秒）
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// IP 就绪等待器
#[derive(Debug, Clone)]
pub struct IpWaiter {
    /// 轮询间隔
    poll_interval: Duration,
}

impl Default for IpWaiter {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }
}

impl IpWaiter {
    /// 自定义轮询间隔
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// 轮询虚拟机的网络地址直到可用或超时
    ///
    /// 返回 `Ok(None)` 表示窗口内未获得地址; 探测本身的失败原样上抛。
    pub async fn wait_for_ip(
        &self,
        vsphere: &dyn VSphere,
        vm: &VmHandle,
        timeout: Duration,
    ) -> Result<Option<String>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(ip) = vsphere.guest_ip(vm).await? {
                return Ok(Some(ip));
            }
            if Instant::now() + self.poll_interval > deadline {
                debug!("等待 \"{}\" 的 IP 超时", vm.name);
                return Ok(None);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
