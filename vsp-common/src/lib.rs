//! VSP 通用类型定义
//!
//! 此 crate 包含所有操作共用的叶子依赖:
//!
//! - **宏展开** (`expand`): `${name}` / `$name` 占位符的尽力替换
//! - **变量上下文** (`context`): 按覆盖顺序合并的字符串变量表

pub mod context;
pub mod expand;

pub use context::VarContext;
pub use expand::expand;
