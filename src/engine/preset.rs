// ==========================================
// 繁育窗口引擎 - 预设缩放器
// ==========================================
// 职责: 对偏移策略的一个作用域（阶段 / 日期）整体缩放，或恢复默认
// 红线: 阶段预设绝不改动日期字段，反之亦然
//   (两套编辑界面各自可独立撤销)
// 全部函数返回新的策略值，不修改入参
// ==========================================

use crate::config::offset_policy::{FieldKey, OffsetPolicy};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use crate::config::offset_policy::PresetScope;

// ==========================================
// 命名预设
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandPreset {
    Tight,
    #[default]
    Standard,
    Relaxed,
}

impl BandPreset {
    pub fn factor(&self) -> f64 {
        match self {
            BandPreset::Tight => 0.6,
            BandPreset::Standard => 1.0,
            BandPreset::Relaxed => 1.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BandPreset::Tight => "tight",
            BandPreset::Standard => "standard",
            BandPreset::Relaxed => "relaxed",
        }
    }

    pub fn title_cn(&self) -> &'static str {
        match self {
            BandPreset::Tight => "收紧",
            BandPreset::Standard => "标准",
            BandPreset::Relaxed => "放宽",
        }
    }
}

impl fmt::Display for BandPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BandPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tight" | "narrow" => Ok(BandPreset::Tight),
            "standard" | "default" => Ok(BandPreset::Standard),
            "relaxed" | "wide" => Ok(BandPreset::Relaxed),
            other => Err(format!("未知预设: {}", other)),
        }
    }
}

// ==========================================
// 缩放
// ==========================================

/// 缩放单个偏移：四舍五入（远离零），超出 i32 范围时饱和
fn scale_offset(value: i32, factor: f64) -> i32 {
    // f64 → i32 的 as 转换本身即饱和
    (f64::from(value) * factor).round() as i32
}

/// 按系数缩放作用域内全部整数字段
///
/// - 作用域外字段与交付开始开关保持不变
/// - factor 非有限数时原样返回（记录 warn）
pub fn apply_preset(policy: &OffsetPolicy, scope: PresetScope, factor: f64) -> OffsetPolicy {
    if !factor.is_finite() {
        tracing::warn!(scope = scope.as_str(), factor, "预设系数非法，保持原策略");
        return policy.clone();
    }

    let scaled = FieldKey::in_scope(scope).fold(policy.clone(), |acc, key| {
        let value = acc.field(key);
        acc.with_field(key, scale_offset(value, factor))
    });

    tracing::debug!(scope = scope.as_str(), factor, "已应用预设缩放");
    scaled
}

/// 在基准策略上应用命名预设
pub fn apply_named(base: &OffsetPolicy, scope: PresetScope, preset: BandPreset) -> OffsetPolicy {
    apply_preset(base, scope, preset.factor())
}

// ==========================================
// 恢复默认
// ==========================================

/// 恢复作用域内全部字段（日期作用域同时恢复交付开始开关）
pub fn reset_scope(
    policy: &OffsetPolicy,
    scope: PresetScope,
    defaults: &OffsetPolicy,
) -> OffsetPolicy {
    let reset = FieldKey::in_scope(scope).fold(policy.clone(), |acc, key| {
        acc.with_field(key, defaults.field(key))
    });
    match scope {
        PresetScope::Date => {
            reset.with_placement_start_bands_enabled(defaults.placement_start_bands_enabled())
        }
        PresetScope::Phase => reset,
    }
}

/// 恢复单个字段
pub fn reset_field(policy: &OffsetPolicy, key: FieldKey, defaults: &OffsetPolicy) -> OffsetPolicy {
    policy.with_field(key, defaults.field(key))
}

/// 恢复一行（一个锚点或阶段的四个字段）
pub fn reset_row(
    policy: &OffsetPolicy,
    keys: [FieldKey; 4],
    defaults: &OffsetPolicy,
) -> OffsetPolicy {
    keys.into_iter()
        .fold(policy.clone(), |acc, key| reset_field(&acc, key, defaults))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::offset_policy::{DateField, PhaseField};
    use crate::domain::types::{Anchor, Phase};

    /// 所有字段都偏离默认值的策略
    fn customized() -> OffsetPolicy {
        FieldKey::all()
            .enumerate()
            .fold(OffsetPolicy::default(), |acc, (i, key)| {
                acc.with_field(key, i as i32 - 20)
            })
            .with_placement_start_bands_enabled(false)
    }

    #[test]
    fn test_tight_date_preset_example() {
        let tight = apply_named(&OffsetPolicy::default(), PresetScope::Date, BandPreset::Tight);
        let birth = tight.date(Anchor::Birth);
        assert_eq!(
            (birth.risky_from, birth.risky_to, birth.unlikely_from, birth.unlikely_to),
            (-2, 2, -4, 4)
        );
    }

    #[test]
    fn test_phase_preset_never_touches_date_fields() {
        let base = customized();
        let scaled = apply_preset(&base, PresetScope::Phase, 2.5);
        for key in FieldKey::in_scope(PresetScope::Date) {
            assert_eq!(scaled.field(key), base.field(key), "{key} changed");
        }
        assert_eq!(
            scaled.placement_start_bands_enabled(),
            base.placement_start_bands_enabled()
        );
        let key = FieldKey::Phase(Phase::TestingToBreeding, PhaseField::RiskyToFullEnd);
        assert_ne!(scaled.field(key), base.field(key));
    }

    #[test]
    fn test_date_preset_never_touches_phase_fields() {
        let base = customized();
        let scaled = apply_preset(&base, PresetScope::Date, 0.3);
        for key in FieldKey::in_scope(PresetScope::Phase) {
            assert_eq!(scaled.field(key), base.field(key), "{key} changed");
        }
    }

    #[test]
    fn test_factor_one_is_noop() {
        let base = customized();
        assert_eq!(apply_preset(&base, PresetScope::Phase, 1.0), base);
        assert_eq!(apply_preset(&base, PresetScope::Date, 1.0), base);
    }

    #[test]
    fn test_non_finite_factor_is_noop() {
        let base = OffsetPolicy::default();
        assert_eq!(apply_preset(&base, PresetScope::Date, f64::NAN), base);
        assert_eq!(apply_preset(&base, PresetScope::Date, f64::INFINITY), base);
    }

    #[test]
    fn test_scale_rounds_half_away_from_zero_and_saturates() {
        assert_eq!(scale_offset(5, 0.5), 3);
        assert_eq!(scale_offset(-5, 0.5), -3);
        assert_eq!(scale_offset(-7, 0.6), -4);
        assert_eq!(scale_offset(i32::MAX, 2.0), i32::MAX);
        assert_eq!(scale_offset(i32::MIN, 2.0), i32::MIN);
    }

    #[test]
    fn test_reset_scope_is_idempotent() {
        let defaults = OffsetPolicy::default();
        let once = reset_scope(&customized(), PresetScope::Date, &defaults);
        let twice = reset_scope(&once, PresetScope::Date, &defaults);
        assert_eq!(once, twice);
        assert!(once.placement_start_bands_enabled());
        for key in FieldKey::in_scope(PresetScope::Date) {
            assert_eq!(once.field(key), defaults.field(key));
        }
        // 阶段字段保留自定义值
        for key in FieldKey::in_scope(PresetScope::Phase) {
            assert_eq!(once.field(key), customized().field(key));
        }
    }

    #[test]
    fn test_reset_phase_scope_keeps_toggle() {
        let defaults = OffsetPolicy::default();
        let reset = reset_scope(&customized(), PresetScope::Phase, &defaults);
        assert!(!reset.placement_start_bands_enabled());
    }

    #[test]
    fn test_reset_row_only_changes_own_anchor() {
        let base = customized();
        let defaults = OffsetPolicy::default();
        let row = FieldKey::date_row(Anchor::Weaned);
        let reset = reset_row(&base, row, &defaults);

        for key in FieldKey::all() {
            if row.contains(&key) {
                assert_eq!(reset.field(key), defaults.field(key));
            } else {
                assert_eq!(reset.field(key), base.field(key), "{key} changed");
            }
        }
    }

    #[test]
    fn test_reset_field_single_key() {
        let key = FieldKey::Date(Anchor::Birth, DateField::UnlikelyTo);
        let base = OffsetPolicy::default().with_field(key, 30);
        let reset = reset_field(&base, key, &OffsetPolicy::default());
        assert_eq!(reset.field(key), 7);
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!("Tight".parse::<BandPreset>(), Ok(BandPreset::Tight));
        assert_eq!("wide".parse::<BandPreset>(), Ok(BandPreset::Relaxed));
        assert!("loose-ish".parse::<BandPreset>().is_err());
        assert_eq!("dates".parse::<PresetScope>(), Ok(PresetScope::Date));
        assert_eq!(BandPreset::default(), BandPreset::Standard);
    }
}
