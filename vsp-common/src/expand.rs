//! 宏展开
//!
//! 将模板字符串中的 `${name}` 与 `$name` 占位符替换为上下文中的变量值。
//! 替换策略为"尽力而为": 上下文中不存在的占位符原样保留, 不报错。

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::context::VarContext;

/// 占位符匹配: `${name}` 优先于裸 `$name`
fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z0-9_.\-]+)\}|\$([A-Za-z0-9_]+)").expect("占位符正则非法")
    })
}

/// 展开模板字符串中的全部可解析占位符
///
/// - 上下文中存在的变量被替换为其值
/// - 无法解析的占位符原样保留
/// - 替换进来的文本不再二次扫描
/// - 对不含占位符的字符串是恒等变换
pub fn expand(template: &str, ctx: &VarContext) -> String {
    if !template.contains('$') {
        return template.to_string();
    }

    placeholder_re()
        .replace_all(template, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match ctx.get(name) {
                Some(value) => value.to_string(),
                // 保留原始占位符文本
                None => caps.get(0).map(|m| m.as_str()).unwrap_or_default().to_string(),
            }
        })
        .into_owned()
}
