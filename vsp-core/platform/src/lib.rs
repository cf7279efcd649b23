//! vSphere 虚拟化平台边界
//!
//! 提供执行器与虚拟化管理平台之间的接口契约及其 REST 实现。
//!
//! # 功能
//!
//! - **平台契约** (`VSphere`): 虚拟机查找、克隆、模板部署、备注更新、
//!   guest-info 属性注入、地址探测、快照与自定义规范查询
//! - **REST 客户端** (`VSphereClient`): 会话认证 + JSON 请求的具体实现
//!
//! # 示例
//!
//! ```ignore
//! use vsp_platform::{ClientConfig, VSphere, VSphereClient};
//!
//! let client = VSphereClient::new("https://vcenter.example.com", ClientConfig::default())?;
//! client.login("ci-bot", "password").await?;
//!
//! if let Some(vm) = client.find_vm("build-vm").await? {
//!     let ip = client.guest_ip(&vm).await?;
//! }
//! ```

pub mod client;
pub mod error;
pub mod models;
pub mod rest;

pub use client::VSphere;
pub use error::{Result, VSphereError};
pub use models::{CloneOptions, CustomizationSpec, PowerState, SnapshotHandle, VmHandle};
pub use rest::{ClientConfig, VSphereClient};
