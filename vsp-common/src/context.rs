//! 变量上下文
//!
//! 执行期变量表。每次执行前由宿主环境重新构建, 执行结束后丢弃,
//! 不在重试之间缓存。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// 变量名到字符串值的映射
///
/// 合并语义为"后写覆盖": `override_all` 将另一张表整体覆盖进当前表。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VarContext {
    vars: HashMap<String, String>,
}

impl VarContext {
    /// 创建空上下文
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入单个变量
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// 仅当变量尚不存在时写入
    pub fn set_if_absent(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.entry(name.into()).or_insert_with(|| value.into());
    }

    /// 读取变量
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// 是否包含变量
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// 变量个数
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// 用另一张表整体覆盖当前表 (后写优先)
    pub fn override_all(&mut self, other: &VarContext) {
        for (name, value) in &other.vars {
            self.vars.insert(name.clone(), value.clone());
        }
    }

    /// 从 (名, 值) 序列批量写入
    pub fn extend_from<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in pairs {
            self.vars.insert(name.into(), value.into());
        }
    }

    /// 展开模板字符串中的占位符 (见 [`crate::expand`])
    pub fn expand(&self, template: &str) -> String {
        crate::expand::expand(template, self)
    }

    /// 遍历全部变量
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
