// ==========================================
// 繁育窗口引擎 - 窗口构造器
// ==========================================
// 职责: 计划锚点 + 偏移策略 → 每个阶段的嵌套时间带
// 输入: PlanAnchors + OffsetPolicy
// 输出: Vec<StageWindow>（生命周期顺序）
// 两种构造模式共用同一输出形状:
// - 阶段模式 (PhaseSpan): 核心跨度 → likely/full，再向外扩展 unlikely/risky
// - 精确日期模式 (ExactDate): 锚点 ± risky 偏移 → full，± unlikely 偏移 → unlikely
// 红线: 锚点缺失/开关关闭 = 不产出窗口（不是零宽窗口，也不是“今天”）
// 红线: 纯函数，不读时钟
// ==========================================

use crate::config::offset_policy::{DateOffsets, OffsetPolicy, PhaseOffsets};
use crate::domain::anchors::PlanAnchors;
use crate::domain::types::{Anchor, Phase, StageKey};
use crate::domain::window::{DateSpan, StageWindow};
use chrono::NaiveDate;
use tracing::instrument;

#[cfg(test)]
mod tests;

/// 窗口构造请求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRequest {
    /// 阶段跨度（任一端缺失则不产出）
    PhaseSpan {
        phase: Phase,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    /// 精确日期锚点
    ExactDate {
        anchor: Anchor,
        date: Option<NaiveDate>,
    },
}

impl WindowRequest {
    pub fn key(&self) -> StageKey {
        match self {
            WindowRequest::PhaseSpan { phase, .. } => StageKey::Phase(*phase),
            WindowRequest::ExactDate { anchor, .. } => StageKey::Anchor(*anchor),
        }
    }
}

/// 根据计划锚点生成全部构造请求（生命周期顺序）
pub fn requests_for(anchors: &PlanAnchors) -> Vec<WindowRequest> {
    StageKey::ORDERED
        .iter()
        .map(|key| match *key {
            StageKey::Phase(phase) => {
                let (start, end) = phase.bounds();
                WindowRequest::PhaseSpan {
                    phase,
                    start: anchors.get(start),
                    end: anchors.get(end),
                }
            }
            StageKey::Anchor(anchor) => WindowRequest::ExactDate {
                anchor,
                date: anchors.get(anchor),
            },
        })
        .collect()
}

// ==========================================
// 单模式构造
// ==========================================

/// 阶段模式
///
/// - likely = full = 核心跨度
/// - unlikely = likely 向外扩展 |unlikely_from_likely_start| / |unlikely_to_likely_end|
/// - risky = full 向外扩展 |risky_from_full_start| / |risky_to_full_end|
///
/// 偏移越界（超出日期范围）时返回 None
pub fn build_phase_window(
    phase: Phase,
    core: DateSpan,
    offsets: &PhaseOffsets,
) -> Option<StageWindow> {
    let likely = core;
    let full = core;
    let unlikely = likely.widen(
        offsets.unlikely_from_likely_start,
        offsets.unlikely_to_likely_end,
    )?;
    let risky = full.widen(offsets.risky_from_full_start, offsets.risky_to_full_end)?;

    Some(StageWindow {
        key: phase.as_str().to_string(),
        full,
        likely: Some(likely),
        risky: Some(risky),
        unlikely: Some(unlikely),
    })
}

/// 精确日期模式
///
/// - full = [anchor - |risky_from|, anchor + |risky_to|]（“可能”区间）
/// - unlikely = [anchor - |unlikely_from|, anchor + |unlikely_to|]
/// - 无 likely / risky
pub fn build_date_window(
    anchor: Anchor,
    date: NaiveDate,
    offsets: &DateOffsets,
) -> Option<StageWindow> {
    let point = DateSpan::point(date);
    let full = point.widen(offsets.risky_from, offsets.risky_to)?;
    let unlikely = point.widen(offsets.unlikely_from, offsets.unlikely_to)?;

    Some(StageWindow {
        key: anchor.as_str().to_string(),
        full,
        likely: None,
        risky: None,
        unlikely: Some(unlikely),
    })
}

// ==========================================
// WindowBuilder - 窗口构造器
// ==========================================
pub struct WindowBuilder<'a> {
    policy: &'a OffsetPolicy,
}

impl<'a> WindowBuilder<'a> {
    pub fn new(policy: &'a OffsetPolicy) -> Self {
        Self { policy }
    }

    /// 统一构造入口
    ///
    /// # 返回
    /// - Some(StageWindow): 正常产出
    /// - None: 锚点缺失 / 阶段任一端缺失 / 开关关闭 / 日期越界
    pub fn build(&self, request: &WindowRequest) -> Option<StageWindow> {
        match *request {
            WindowRequest::PhaseSpan { phase, start, end } => {
                let (Some(start), Some(end)) = (start, end) else {
                    tracing::debug!(stage = phase.as_str(), "阶段跨度端点缺失，不产出窗口");
                    return None;
                };
                let core = DateSpan::new(start, end);
                if core.is_inverted() {
                    // 反向跨度照常构造，让问题在时间轴上可见
                    tracing::debug!(stage = phase.as_str(), %start, %end, "阶段跨度反向");
                }
                let window = build_phase_window(phase, core, &self.policy.phase(phase));
                if window.is_none() {
                    tracing::warn!(stage = phase.as_str(), "阶段时间带超出日期范围，已跳过");
                }
                window
            }
            WindowRequest::ExactDate { anchor, date } => {
                let Some(date) = date else {
                    tracing::debug!(stage = anchor.as_str(), "锚点缺失，不产出窗口");
                    return None;
                };
                if !self.policy.bands_enabled(anchor) {
                    tracing::debug!(stage = anchor.as_str(), "时间带开关关闭，不产出窗口");
                    return None;
                }
                let window = build_date_window(anchor, date, &self.policy.date(anchor));
                if window.is_none() {
                    tracing::warn!(stage = anchor.as_str(), "锚点时间带超出日期范围，已跳过");
                }
                window
            }
        }
    }

    /// 构造计划的全部阶段窗口
    #[instrument(skip(self, anchors))]
    pub fn build_windows(&self, anchors: &PlanAnchors) -> Vec<StageWindow> {
        let windows: Vec<StageWindow> = requests_for(anchors)
            .iter()
            .filter_map(|request| self.build(request))
            .collect();
        tracing::debug!(count = windows.len(), "阶段窗口构造完成");
        windows
    }
}

/// 便捷函数：构造计划的全部阶段窗口
pub fn build_windows(anchors: &PlanAnchors, policy: &OffsetPolicy) -> Vec<StageWindow> {
    WindowBuilder::new(policy).build_windows(anchors)
}
