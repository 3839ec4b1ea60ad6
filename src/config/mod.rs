// ==========================================
// 繁育窗口引擎 - 配置层
// ==========================================
// 职责: 两套相互独立的配置
// - 租户偏移策略: offset_policy (值对象) + policy_store (config_kv 持久化)
// - 本地显示偏好: display_prefs (JSON 文件，仅本机)
// ==========================================

pub mod display_prefs;
pub mod error;
pub mod offset_policy;
pub mod policy_store;

// 重导出核心配置类型
pub use display_prefs::{DisplayPrefs, DisplayPrefsStore};
pub use error::{ConfigError, ConfigResult};
pub use offset_policy::{
    DateField, DateOffsets, FieldKey, MergeReport, OffsetPolicy, PhaseField, PhaseOffsets,
    PresetScope, DEFAULT_DATE_OFFSETS, DEFAULT_PHASE_OFFSETS, PLACEMENT_START_BANDS_ENABLED_KEY,
};
pub use policy_store::{ImportOutcome, PatchOutcome, PolicyStore};
