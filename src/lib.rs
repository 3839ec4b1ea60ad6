// ==========================================
// 繁育窗口引擎 - 核心库
// ==========================================
// 职责: 由计划锚点日期与租户偏移策略计算阶段可用窗口
// 技术栈: Rust + SQLite (config_kv)
// 分层: domain → engine (纯函数) → config (持久化) → api (宿主入口)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 锚点、阶段、时间带
pub mod domain;

// 引擎层 - 窗口构造/校验/预设/清洗
pub mod engine;

// 配置层 - 租户偏移策略与本地显示偏好
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 宿主入口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{Anchor, DateSpan, Phase, PlanAnchors, StageKey, StageWindow};

// 配置
pub use config::{
    ConfigError, DisplayPrefs, DisplayPrefsStore, FieldKey, OffsetPolicy, PolicyStore,
    PresetScope,
};

// 引擎
pub use engine::{build_windows, sanitize, validate_policy, BandPreset, ValidationReport};

// API
pub use api::{ApiError, ApiResult, PolicyUpdate, WindowApi};

// ==========================================
// 常量定义
// ==========================================

// 引擎版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 引擎名称
pub const APP_NAME: &str = "繁育窗口引擎";
