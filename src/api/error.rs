// ==========================================
// 繁育窗口引擎 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，把配置层的技术错误转换为调用方可读的错误
// 说明: 反向时间带、锚点缺失都不是错误（分别以校验报告、空窗口体现）
// ==========================================

use crate::config::error::ConfigError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 ConfigError 转换
// ==========================================
impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidTenant(_) | ConfigError::InvalidBundle(_) => {
                ApiError::InvalidInput(err.to_string())
            }
            ConfigError::UnknownField(_) | ConfigError::InvalidValue { .. } => {
                ApiError::ValidationError(err.to_string())
            }
            ConfigError::LockError(_)
            | ConfigError::SchemaVersion { .. }
            | ConfigError::Database(_) => {
                ApiError::DatabaseError(err.to_string())
            }
            ConfigError::Serialization(_) | ConfigError::Io(_) => {
                ApiError::InternalError(err.to_string())
            }
            ConfigError::Other(e) => ApiError::Other(e),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_mapping() {
        let err: ApiError = ConfigError::UnknownField("date_foo".to_string()).into();
        assert!(matches!(err, ApiError::ValidationError(_)));
        assert!(err.to_string().contains("date_foo"));

        let err: ApiError = ConfigError::InvalidTenant("租户ID为空".to_string()).into();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let err: ApiError = ConfigError::LockError("poisoned".to_string()).into();
        assert!(matches!(err, ApiError::DatabaseError(_)));
    }
}
