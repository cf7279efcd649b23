//! 平台数据模型

use serde::{Deserialize, Serialize};

/// 虚拟机电源状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PowerState {
    PoweredOn,
    PoweredOff,
    Suspended,
}

/// 虚拟机句柄
///
/// 由 `find_vm` 查询得到, 供后续针对单台虚拟机的调用使用。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmHandle {
    /// 平台侧虚拟机标识
    #[serde(rename = "vm")]
    pub id: String,

    /// 虚拟机名称
    pub name: String,

    /// 是否为模板 (模板不可直接运行, 仅作为部署来源)
    #[serde(default)]
    pub template: bool,

    /// 电源状态
    #[serde(default)]
    pub power_state: Option<PowerState>,
}

/// 快照句柄
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHandle {
    /// 快照标识
    #[serde(rename = "snapshot")]
    pub id: String,

    /// 快照名称
    #[serde(default)]
    pub name: Option<String>,
}

/// 自定义规范句柄
///
/// 平台侧存储的命名配置, 在克隆/部署时应用 (如网络身份)。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomizationSpec {
    /// 规范名称
    pub name: String,

    /// 描述
    #[serde(default)]
    pub description: Option<String>,
}

/// 克隆/部署选项
///
/// 两类操作共享同一组放置参数: 部署即从模板克隆。
/// 空字符串表示"未指定", 由平台按默认规则放置。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloneOptions {
    /// 是否为链接克隆 (与来源快照共享存储)
    #[serde(default)]
    pub linked_clone: bool,

    /// 资源池名称
    #[serde(default)]
    pub resource_pool: String,

    /// 集群名称
    #[serde(default)]
    pub cluster: String,

    /// 数据存储名称
    #[serde(default)]
    pub datastore: String,

    /// 目标文件夹
    #[serde(default)]
    pub folder: String,

    /// 克隆完成后是否开机
    #[serde(default)]
    pub power_on: bool,

    /// 自定义规范名称
    #[serde(default)]
    pub customization_spec: String,
}
