// ==========================================
// 繁育窗口引擎 - API 层
// ==========================================
// 职责: 组合配置层与引擎层，供宿主应用调用
// ==========================================

pub mod error;
pub mod window_api;

pub use error::{ApiError, ApiResult};
pub use window_api::{PolicyUpdate, WindowApi};
