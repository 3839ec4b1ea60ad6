// ==========================================
// 繁育窗口引擎 - 时间带校验器
// ==========================================
// 职责: 检查每个 (from, to) 偏移对是否构成非负宽度区间
// 红线: 只提示，不钳制、不改写
//   (反向时间带必须可见，由人工修正；修正建议仅供调用方选用)
// ==========================================

use crate::config::offset_policy::{DateField, FieldKey, OffsetPolicy, PhaseField};
use crate::domain::types::{Anchor, Phase};
use serde::Serialize;

/// 单个偏移对的校验结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BandValidity {
    pub valid: bool,
    /// to - from（i64 计算，不溢出）
    pub width: i64,
}

/// 校验偏移对: valid = (to - from) >= 0，零宽度合法
pub fn validate(from: i32, to: i32) -> BandValidity {
    let width = i64::from(to) - i64::from(from);
    BandValidity {
        valid: width >= 0,
        width,
    }
}

// ==========================================
// 策略级校验
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BandIssueKind {
    /// to < from：宽度为负（错误）
    InvertedBand,
    /// unlikely 外环窄于 risky/full 环（警告，构造器不强制）
    UnlikelyNarrowerThanRisky,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BandIssue {
    pub from_key: String,
    pub to_key: String,
    pub from: i32,
    pub to: i32,
    pub kind: BandIssueKind,
}

impl BandIssue {
    pub fn is_error(&self) -> bool {
        self.kind == BandIssueKind::InvertedBand
    }

    /// 修正建议（仅反向时间带有建议：交换两端）
    pub fn suggested_fix(&self) -> Option<(i32, i32)> {
        match self.kind {
            BandIssueKind::InvertedBand => Some((self.to, self.from)),
            BandIssueKind::UnlikelyNarrowerThanRisky => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<BandIssue>,
}

impl ValidationReport {
    /// 无反向时间带即为合法（警告不影响）
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(BandIssue::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &BandIssue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &BandIssue> {
        self.issues.iter().filter(|i| !i.is_error())
    }

    /// 指定字段是否卷入某个问题（驱动行内提示）
    pub fn flags_field(&self, key: &str) -> bool {
        self.issues
            .iter()
            .any(|i| i.from_key == key || i.to_key == key)
    }
}

/// 偏移策略中的全部 (from, to) 偏移对
fn band_pairs() -> Vec<(FieldKey, FieldKey)> {
    let mut pairs = Vec::with_capacity(18);
    for phase in Phase::ALL {
        pairs.push((
            FieldKey::Phase(phase, PhaseField::UnlikelyFromLikelyStart),
            FieldKey::Phase(phase, PhaseField::UnlikelyToLikelyEnd),
        ));
        pairs.push((
            FieldKey::Phase(phase, PhaseField::RiskyFromFullStart),
            FieldKey::Phase(phase, PhaseField::RiskyToFullEnd),
        ));
    }
    for anchor in Anchor::ALL {
        pairs.push((
            FieldKey::Date(anchor, DateField::RiskyFrom),
            FieldKey::Date(anchor, DateField::RiskyTo),
        ));
        pairs.push((
            FieldKey::Date(anchor, DateField::UnlikelyFrom),
            FieldKey::Date(anchor, DateField::UnlikelyTo),
        ));
    }
    pairs
}

/// 字段所在的偏移对
fn pair_of(key: FieldKey) -> (FieldKey, FieldKey) {
    match key {
        FieldKey::Phase(
            p,
            PhaseField::UnlikelyFromLikelyStart | PhaseField::UnlikelyToLikelyEnd,
        ) => (
            FieldKey::Phase(p, PhaseField::UnlikelyFromLikelyStart),
            FieldKey::Phase(p, PhaseField::UnlikelyToLikelyEnd),
        ),
        FieldKey::Phase(p, PhaseField::RiskyFromFullStart | PhaseField::RiskyToFullEnd) => (
            FieldKey::Phase(p, PhaseField::RiskyFromFullStart),
            FieldKey::Phase(p, PhaseField::RiskyToFullEnd),
        ),
        FieldKey::Date(a, DateField::RiskyFrom | DateField::RiskyTo) => (
            FieldKey::Date(a, DateField::RiskyFrom),
            FieldKey::Date(a, DateField::RiskyTo),
        ),
        FieldKey::Date(a, DateField::UnlikelyFrom | DateField::UnlikelyTo) => (
            FieldKey::Date(a, DateField::UnlikelyFrom),
            FieldKey::Date(a, DateField::UnlikelyTo),
        ),
    }
}

fn inverted_issue(
    policy: &OffsetPolicy,
    from_key: FieldKey,
    to_key: FieldKey,
) -> Option<BandIssue> {
    let from = policy.field(from_key);
    let to = policy.field(to_key);
    if validate(from, to).valid {
        return None;
    }
    Some(BandIssue {
        from_key: from_key.to_string(),
        to_key: to_key.to_string(),
        from,
        to,
        kind: BandIssueKind::InvertedBand,
    })
}

/// 单字段校验（每次编辑后调用）
pub fn validate_field(policy: &OffsetPolicy, key: FieldKey) -> Option<BandIssue> {
    let (from_key, to_key) = pair_of(key);
    inverted_issue(policy, from_key, to_key)
}

/// 校验整份策略
///
/// # 检查项
/// 1) 每个偏移对的宽度非负
/// 2) 阶段与精确日期锚点: unlikely 外环在两侧均不窄于 risky 环
pub fn validate_policy(policy: &OffsetPolicy) -> ValidationReport {
    let mut issues: Vec<BandIssue> = band_pairs()
        .into_iter()
        .filter_map(|(from_key, to_key)| inverted_issue(policy, from_key, to_key))
        .collect();

    // 阶段模式 likely = full，外环同样不得窄于 risky 环
    for phase in Phase::ALL {
        let o = policy.phase(phase);
        let narrower_before =
            o.unlikely_from_likely_start.unsigned_abs() < o.risky_from_full_start.unsigned_abs();
        let narrower_after =
            o.unlikely_to_likely_end.unsigned_abs() < o.risky_to_full_end.unsigned_abs();
        if narrower_before || narrower_after {
            issues.push(BandIssue {
                from_key: FieldKey::Phase(phase, PhaseField::UnlikelyFromLikelyStart).to_string(),
                to_key: FieldKey::Phase(phase, PhaseField::UnlikelyToLikelyEnd).to_string(),
                from: o.unlikely_from_likely_start,
                to: o.unlikely_to_likely_end,
                kind: BandIssueKind::UnlikelyNarrowerThanRisky,
            });
        }
    }

    for anchor in Anchor::ALL {
        if !policy.bands_enabled(anchor) {
            continue;
        }
        let o = policy.date(anchor);
        let narrower_before = o.unlikely_from.unsigned_abs() < o.risky_from.unsigned_abs();
        let narrower_after = o.unlikely_to.unsigned_abs() < o.risky_to.unsigned_abs();
        if narrower_before || narrower_after {
            issues.push(BandIssue {
                from_key: FieldKey::Date(anchor, DateField::UnlikelyFrom).to_string(),
                to_key: FieldKey::Date(anchor, DateField::UnlikelyTo).to_string(),
                from: o.unlikely_from,
                to: o.unlikely_to,
                kind: BandIssueKind::UnlikelyNarrowerThanRisky,
            });
        }
    }

    if !issues.is_empty() {
        tracing::debug!(count = issues.len(), "偏移策略存在时间带问题");
    }

    ValidationReport { issues }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sign_rule() {
        assert!(validate(-3, 3).valid);
        assert!(validate(5, 5).valid);
        assert!(validate(-7, -7).valid);
        assert!(!validate(3, -3).valid);
        assert!(!validate(-1, -2).valid);
        assert!(validate(-10, -2).valid);
    }

    #[test]
    fn test_validate_extreme_values_do_not_overflow() {
        let v = validate(i32::MIN, i32::MAX);
        assert!(v.valid);
        assert_eq!(v.width, i64::from(i32::MAX) - i64::from(i32::MIN));

        let v = validate(i32::MAX, i32::MIN);
        assert!(!v.valid);
    }

    #[test]
    fn test_validate_matches_definition_over_range() {
        for from in -20..=20 {
            for to in -20..=20 {
                assert_eq!(validate(from, to).valid, to - from >= 0);
            }
        }
    }

    #[test]
    fn test_default_policy_is_clean() {
        let report = validate_policy(&OffsetPolicy::default());
        assert!(report.is_valid());
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_inverted_band_is_reported_with_fix() {
        let policy = OffsetPolicy::default()
            .with_field(FieldKey::Date(Anchor::Birth, DateField::RiskyFrom), 4)
            .with_field(FieldKey::Date(Anchor::Birth, DateField::RiskyTo), 1);
        let report = validate_policy(&policy);

        assert!(!report.is_valid());
        let issue = report.errors().next().unwrap();
        assert_eq!(issue.from_key, "date_birth_risky_from");
        assert_eq!(issue.to_key, "date_birth_risky_to");
        assert_eq!(issue.suggested_fix(), Some((1, 4)));
        assert!(report.flags_field("date_birth_risky_to"));
        assert!(!report.flags_field("date_birth_unlikely_to"));
        // 校验不改写策略
        assert_eq!(policy.date(Anchor::Birth).risky_from, 4);
    }

    #[test]
    fn test_narrow_unlikely_is_warning_only() {
        let policy = OffsetPolicy::default()
            .with_field(FieldKey::Date(Anchor::Weaned, DateField::UnlikelyFrom), -1);
        let report = validate_policy(&policy);

        assert!(report.is_valid());
        let warning = report.warnings().next().unwrap();
        assert_eq!(warning.kind, BandIssueKind::UnlikelyNarrowerThanRisky);
        assert_eq!(warning.suggested_fix(), None);
    }

    #[test]
    fn test_narrow_phase_unlikely_ring_is_warned() {
        let phase = Phase::TestingToBreeding;
        let policy = OffsetPolicy::default()
            .with_field(FieldKey::Phase(phase, PhaseField::UnlikelyFromLikelyStart), -1)
            .with_field(FieldKey::Phase(phase, PhaseField::UnlikelyToLikelyEnd), 1);
        let report = validate_policy(&policy);

        assert!(report.is_valid());
        let warnings: Vec<&BandIssue> = report.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, BandIssueKind::UnlikelyNarrowerThanRisky);
        assert_eq!(
            warnings[0].from_key,
            "phase_testing_to_breeding_unlikely_from_likely_start"
        );
        assert!(!report.flags_field("phase_birth_to_placement_unlikely_from_likely_start"));

        // 单侧过窄同样提示
        let one_side = OffsetPolicy::default()
            .with_field(FieldKey::Phase(phase, PhaseField::RiskyToFullEnd), 9);
        assert_eq!(validate_policy(&one_side).warnings().count(), 1);
    }

    #[test]
    fn test_disabled_placement_start_skips_nesting_warning() {
        let policy = OffsetPolicy::default()
            .with_field(FieldKey::Date(Anchor::PlacementStart, DateField::UnlikelyTo), 0)
            .with_placement_start_bands_enabled(false);
        assert!(validate_policy(&policy).issues.is_empty());
    }

    #[test]
    fn test_validate_field_checks_its_pair() {
        let key = FieldKey::Phase(Phase::BirthToPlacement, PhaseField::UnlikelyToLikelyEnd);
        let policy = OffsetPolicy::default().with_field(key, -9);

        let issue = validate_field(&policy, key).unwrap();
        assert_eq!(issue.from_key, "phase_birth_to_placement_unlikely_from_likely_start");
        assert_eq!((issue.from, issue.to), (-7, -9));

        let other = FieldKey::Phase(Phase::BirthToPlacement, PhaseField::RiskyToFullEnd);
        assert!(validate_field(&policy, other).is_none());
    }
}
