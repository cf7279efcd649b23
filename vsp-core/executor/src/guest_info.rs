//! guest-info 属性解析
//!
//! 把用户声明的 (名称, 原始值模板) 对解析为注入虚拟机元数据的键值表。
//! 原始值在执行期才展开, 展开依据"已知变量表 + 外层执行上下文"的合并
//! 结果, 冲突时外层上下文优先。

use serde::{Deserialize, Serialize};

use vsp_common::VarContext;

use crate::environment::BuildEnvironment;
use crate::Result;

/// guest-info 属性声明
///
/// 随步骤配置创建, 每次执行消费一次; `value` 可以包含宏占位符。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestInfoProperty {
    /// 属性名
    pub name: String,

    /// 原始值模板 (执行期展开)
    pub value: String,
}

/// 解析 guest-info 属性声明
///
/// 已知变量表按固定顺序构建:
/// 1. 宿主根 URL, 以 `JENKINS_URL` 和 `HUDSON_URL` 两个别名写入;
/// 2. 节点属性提供者贡献的变量 (失败即上抛);
/// 3. `NODE_NAME` 绑定目标虚拟机名, 以及 `cluster` / `datastore`;
/// 4. 外层执行上下文整体覆盖 (冲突时外层优先)。
///
/// 返回保持声明顺序的键值表: 重名属性保留首次出现的位置, 值取最后一次
/// 声明。未声明任何属性时返回空表, 调用方必须整体跳过注入调用。
pub async fn resolve_guest_info_properties(
    target_name: &str,
    cluster: &str,
    datastore: &str,
    properties: &[GuestInfoProperty],
    build: &BuildEnvironment,
    ctx: &VarContext,
) -> Result<Vec<(String, String)>> {
    if properties.is_empty() {
        return Ok(Vec::new());
    }

    let mut known = VarContext::new();
    if let Some(url) = build.root_url() {
        known.set("JENKINS_URL", url);
        known.set("HUDSON_URL", url);
    }
    build.contribute_node_properties(&mut known).await?;
    known.set("NODE_NAME", target_name);
    known.set("cluster", cluster);
    known.set("datastore", datastore);
    known.override_all(ctx);

    let mut resolved: Vec<(String, String)> = Vec::new();
    for property in properties {
        let value = known.expand(&property.value);
        match resolved.iter_mut().find(|(name, _)| name == &property.name) {
            Some(entry) => entry.1 = value,
            None => resolved.push((property.name.clone(), value)),
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::StaticVars;

    fn property(name: &str, value: &str) -> GuestInfoProperty {
        GuestInfoProperty {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_declarations_resolve_to_empty() {
        let build = BuildEnvironment::new();
        let resolved =
            resolve_guest_info_properties("vm-A", "c1", "ds1", &[], &build, &VarContext::new())
                .await
                .unwrap();
        assert!(resolved.is_empty());
    }

    #[tokio::test]
    async fn test_known_variables_available() {
        let build = BuildEnvironment::new().with_root_url("https://ci.example.com/");
        let properties = vec![
            property("URL", "${JENKINS_URL}"),
            property("ALIAS", "${HUDSON_URL}"),
            property("NODE", "${NODE_NAME}"),
            property("PLACEMENT", "${cluster}/${datastore}"),
        ];
        let resolved = resolve_guest_info_properties(
            "vm-A",
            "cluster-01",
            "ds-01",
            &properties,
            &build,
            &VarContext::new(),
        )
        .await
        .unwrap();

        assert_eq!(
            resolved,
            vec![
                ("URL".to_string(), "https://ci.example.com/".to_string()),
                ("ALIAS".to_string(), "https://ci.example.com/".to_string()),
                ("NODE".to_string(), "vm-A".to_string()),
                ("PLACEMENT".to_string(), "cluster-01/ds-01".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_outer_context_wins_on_conflict() {
        let build = BuildEnvironment::new();
        let mut ctx = VarContext::new();
        ctx.set("cluster", "outer-cluster");

        let resolved = resolve_guest_info_properties(
            "vm-A",
            "known-cluster",
            "ds-01",
            &[property("ENV", "${cluster}")],
            &build,
            &ctx,
        )
        .await
        .unwrap();
        assert_eq!(resolved, vec![("ENV".to_string(), "outer-cluster".to_string())]);
    }

    #[tokio::test]
    async fn test_duplicate_names_overwrite_in_place() {
        let build = BuildEnvironment::new();
        let properties = vec![
            property("A", "first"),
            property("B", "keep"),
            property("A", "second"),
        ];
        let resolved = resolve_guest_info_properties(
            "vm-A",
            "c1",
            "ds1",
            &properties,
            &build,
            &VarContext::new(),
        )
        .await
        .unwrap();

        assert_eq!(
            resolved,
            vec![
                ("A".to_string(), "second".to_string()),
                ("B".to_string(), "keep".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_node_properties_feed_known_variables() {
        let mut extra = VarContext::new();
        extra.set("SITE", "lab-1");
        let build =
            BuildEnvironment::new().with_node_property_source(Box::new(StaticVars::new(extra)));

        let resolved = resolve_guest_info_properties(
            "vm-A",
            "c1",
            "ds1",
            &[property("SITE_TAG", "${SITE}")],
            &build,
            &VarContext::new(),
        )
        .await
        .unwrap();
        assert_eq!(resolved, vec![("SITE_TAG".to_string(), "lab-1".to_string())]);
    }

    #[tokio::test]
    async fn test_unresolved_placeholder_kept() {
        let build = BuildEnvironment::new();
        let resolved = resolve_guest_info_properties(
            "vm-A",
            "c1",
            "ds1",
            &[property("RAW", "${not_defined}")],
            &build,
            &VarContext::new(),
        )
        .await
        .unwrap();
        assert_eq!(resolved, vec![("RAW".to_string(), "${not_defined}".to_string())]);
    }
}
