// ==========================================
// 繁育窗口引擎 - 引擎层
// ==========================================
// 职责: 纯函数变换，不做 I/O、不读时钟、无共享可变状态
// 数据流: 偏移策略 → (校验/预设) → 窗口构造器 → 清洗器 → 渲染器
// ==========================================

pub mod band_validator;
pub mod preset;
pub mod sanitizer;
pub mod window_builder;

// 重导出核心引擎
pub use band_validator::{
    validate, validate_field, validate_policy, BandIssue, BandIssueKind, BandValidity,
    ValidationReport,
};
pub use preset::{
    apply_named, apply_preset, reset_field, reset_row, reset_scope, BandPreset, PresetScope,
};
pub use sanitizer::{sanitize, sanitize_raw, RawWindow};
pub use window_builder::{
    build_date_window, build_phase_window, build_windows, requests_for, WindowBuilder,
    WindowRequest,
};
