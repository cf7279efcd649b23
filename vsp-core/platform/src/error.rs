//! 虚拟化平台错误定义

use thiserror::Error;

/// 虚拟化平台错误类型
///
/// 所有远程调用都可能失败, 任何一种失败默认视为瞬态错误,
/// 是否重试由上层执行器决定。
#[derive(Error, Debug)]
pub enum VSphereError {
    #[error("HTTP 错误: {0}")]
    HttpError(String),

    #[error("认证错误: {0}")]
    AuthError(String),

    #[error("API 错误 [{0}]: {1}")]
    ApiError(u16, String),

    #[error("解析错误: {0}")]
    ParseError(String),

    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("资源不存在: {0}")]
    NotFound(String),

    #[error("操作失败: {0}")]
    OperationFailed(String),
}

/// 虚拟化平台结果类型
pub type Result<T> = std::result::Result<T, VSphereError>;
