//! 结果发布
//!
//! 步骤执行中产生的派生值 (如获取到的 IP) 先收集在 [`PublishedEnv`] 里,
//! 由执行器在确认成功后一次性应用到流水线环境, 失败的执行不发布任何值。

use crate::environment::BuildEnvironment;

/// 待发布的环境变量集合
///
/// 保持发布顺序; 同名键后写覆盖值但保留首次出现的位置。
#[derive(Debug, Clone, Default)]
pub struct PublishedEnv {
    entries: Vec<(String, String)>,
}

impl PublishedEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个键值
    pub fn add(&mut self, name: &str, value: &str) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((name.to_string(), value.to_string())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// 应用到流水线环境 (仅追加自己的键, 不触碰无关变量)
    pub fn apply_to(&self, build: &mut BuildEnvironment) {
        for (name, value) in &self.entries {
            build.publish(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_overwrites_in_place() {
        let mut env = PublishedEnv::new();
        env.add("VSPHERE_IP", "10.0.0.1");
        env.add("NODE", "vm-A");
        env.add("VSPHERE_IP", "10.0.0.5");

        let entries: Vec<_> = env.iter().collect();
        assert_eq!(entries, vec![("VSPHERE_IP", "10.0.0.5"), ("NODE", "vm-A")]);
    }

    #[test]
    fn test_apply_to_build_environment() {
        let mut env = PublishedEnv::new();
        env.add("VSPHERE_IP", "10.0.0.5");

        let mut build = BuildEnvironment::new();
        build.set_env("PATH", "/usr/bin");
        env.apply_to(&mut build);

        let ctx = build.execution_context();
        assert_eq!(ctx.get("VSPHERE_IP"), Some("10.0.0.5"));
        assert_eq!(ctx.get("PATH"), Some("/usr/bin"));
    }
}
