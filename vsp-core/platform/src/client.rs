//! 虚拟化平台客户端契约
//!
//! 执行器只依赖此 trait, 不关心平台侧协议细节。所有方法都是
//! 阻塞语义的远程调用: 每一次调用都可能独立失败, 均不保证幂等。

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CloneOptions, CustomizationSpec, SnapshotHandle, VmHandle};

/// vSphere 平台操作集合
///
/// 客户端可能被多个调用方共享, 实现方自行约束连接与并发,
/// 调用方不得假设独占访问。
#[async_trait]
pub trait VSphere: Send + Sync {
    /// 按名称查找虚拟机, 不存在时返回 `None`
    async fn find_vm(&self, name: &str) -> Result<Option<VmHandle>>;

    /// 从既有虚拟机克隆出新虚拟机
    async fn clone_vm(&self, source: &str, target: &str, options: &CloneOptions) -> Result<()>;

    /// 从模板部署新虚拟机
    async fn deploy_vm(&self, template: &str, target: &str, options: &CloneOptions) -> Result<()>;

    /// 更新虚拟机备注
    async fn set_annotation(&self, vm: &str, annotation: &str) -> Result<()>;

    /// 注入 guest-info 属性 (键值对按给定顺序写入虚拟机元数据)
    async fn inject_guest_properties(&self, vm: &str, properties: &[(String, String)])
        -> Result<()>;

    /// 读取虚拟机当前的网络地址, 尚未就绪时返回 `None`
    ///
    /// 单次探测, 不等待。轮询由上层的就绪等待器完成。
    async fn guest_ip(&self, vm: &VmHandle) -> Result<Option<String>>;

    /// 查询虚拟机的当前快照, 没有快照时返回 `None`
    async fn current_snapshot(&self, vm: &VmHandle) -> Result<Option<SnapshotHandle>>;

    /// 按名称查找自定义规范, 不存在时返回 `None`
    async fn find_customization_spec(&self, name: &str) -> Result<Option<CustomizationSpec>>;
}
