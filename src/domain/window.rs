// ==========================================
// 繁育窗口引擎 - 时间带与阶段窗口
// ==========================================
// DateSpan: 闭区间 [start, end]，不强制 start <= end
//   (反向区间必须原样可见，由校验器提示而不是在这里纠正)
// StageWindow: 单个阶段的嵌套时间带，每次计算新建，构造后不再修改
// ==========================================

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// 日期区间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// 单日区间（精确日期锚点的退化跨度）
    pub fn point(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    /// 向外扩展：start 提前 |before| 天，end 推后 |after| 天
    ///
    /// 偏移量只取绝对值，符号仅表示“锚点之前/之后”的录入习惯。
    /// 超出 chrono 日期范围时返回 None。
    pub fn widen(&self, before: i32, after: i32) -> Option<DateSpan> {
        let start = self
            .start
            .checked_sub_signed(Duration::days(i64::from(before.unsigned_abs())))?;
        let end = self
            .end
            .checked_add_signed(Duration::days(i64::from(after.unsigned_abs())))?;
        Some(DateSpan { start, end })
    }

    /// 有符号宽度（天），反向区间为负
    pub fn width_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn is_inverted(&self) -> bool {
        self.end < self.start
    }
}

/// 阶段窗口
///
/// - 阶段模式: likely = full = 核心跨度，risky/unlikely 为两个警示外环
/// - 精确日期模式: 无 likely/risky，full 直接由 risky 偏移定义，unlikely 为外环
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageWindow {
    pub key: String,
    pub full: DateSpan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likely: Option<DateSpan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risky: Option<DateSpan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlikely: Option<DateSpan>,
}

impl StageWindow {
    /// 是否为阶段模式产出的窗口
    pub fn is_phase(&self) -> bool {
        self.likely.is_some()
    }

    /// 所有时间带覆盖的最外层区间（渲染器用于计算视口）
    pub fn outer_bounds(&self) -> DateSpan {
        let mut start = self.full.start.min(self.full.end);
        let mut end = self.full.end.max(self.full.start);
        for span in [self.likely, self.risky, self.unlikely].into_iter().flatten() {
            start = start.min(span.start).min(span.end);
            end = end.max(span.end).max(span.start);
        }
        DateSpan { start, end }
    }
}
