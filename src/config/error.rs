// ==========================================
// 繁育窗口引擎 - 配置层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 引擎本身不产生错误；错误只来自持久化与外部输入校验
// ==========================================

use thiserror::Error;

/// 配置层错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    // ===== 输入校验错误 =====
    #[error("无效租户: {0}")]
    InvalidTenant(String),

    #[error("未知策略字段: {0}")]
    UnknownField(String),

    #[error("字段值错误 (field={field}): {value}")]
    InvalidValue { field: String, value: String },

    #[error("导入数据格式错误: {0}")]
    InvalidBundle(String),

    // ===== 存储错误 =====
    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库版本不兼容: 当前 {found}，引擎支持 {expected}")]
    SchemaVersion { found: i64, expected: i64 },

    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("文件读写失败: {0}")]
    Io(#[from] std::io::Error),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
