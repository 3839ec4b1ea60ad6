// ==========================================
// 繁育窗口引擎 - 领域模型层
// ==========================================
// 职责: 定义锚点/阶段类型、时间带值对象、日期解析规则
// 红线: 不含持久化逻辑,不含窗口构造逻辑
// ==========================================

pub mod anchors;
pub mod date_value;
pub mod types;
pub mod window;

// 重导出核心类型
pub use anchors::{PlanAnchors, RawPlanAnchors};
pub use date_value::{coerce_date, coerce_optional_date, parse_date_str};
pub use types::{Anchor, Phase, StageKey};
pub use window::{DateSpan, StageWindow};
