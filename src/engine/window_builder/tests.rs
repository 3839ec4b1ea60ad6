use super::*;
use crate::config::offset_policy::{DateField, FieldKey, PhaseField, DEFAULT_DATE_OFFSETS};

// ==========================================
// 测试辅助函数
// ==========================================

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn span(start: NaiveDate, end: NaiveDate) -> DateSpan {
    DateSpan::new(start, end)
}

/// 一份完整的计划锚点
fn full_plan() -> PlanAnchors {
    PlanAnchors {
        cycle_start: Some(d(2024, 1, 2)),
        testing_start: Some(d(2024, 1, 10)),
        breeding: Some(d(2024, 1, 15)),
        birth: Some(d(2024, 3, 18)),
        weaned: Some(d(2024, 5, 13)),
        placement_start: Some(d(2024, 5, 20)),
        placement_completed: Some(d(2024, 6, 3)),
    }
}

fn keys(windows: &[StageWindow]) -> Vec<&str> {
    windows.iter().map(|w| w.key.as_str()).collect()
}

// ==========================================
// 精确日期模式
// ==========================================

#[test]
fn test_date_window_birth_example() {
    let window = build_date_window(Anchor::Birth, d(2024, 5, 10), &DEFAULT_DATE_OFFSETS).unwrap();

    assert_eq!(window.key, "birth");
    assert_eq!(window.full, span(d(2024, 5, 7), d(2024, 5, 13)));
    assert_eq!(window.unlikely, Some(span(d(2024, 5, 3), d(2024, 5, 17))));
    assert_eq!(window.likely, None);
    assert_eq!(window.risky, None);
}

#[test]
fn test_date_window_ignores_offset_sign() {
    let offsets = DateOffsets {
        risky_from: 2,
        risky_to: -1,
        unlikely_from: 5,
        unlikely_to: -5,
    };
    let window = build_date_window(Anchor::Weaned, d(2024, 5, 10), &offsets).unwrap();
    assert_eq!(window.full, span(d(2024, 5, 8), d(2024, 5, 11)));
    assert_eq!(window.unlikely, Some(span(d(2024, 5, 5), d(2024, 5, 15))));
}

#[test]
fn test_date_window_zero_offsets_is_single_day() {
    let offsets = DateOffsets {
        risky_from: 0,
        risky_to: 0,
        unlikely_from: 0,
        unlikely_to: 0,
    };
    let window = build_date_window(Anchor::Breeding, d(2024, 2, 29), &offsets).unwrap();
    assert_eq!(window.full, DateSpan::point(d(2024, 2, 29)));
    assert_eq!(window.full.width_days(), 0);
}

// ==========================================
// 阶段模式
// ==========================================

#[test]
fn test_phase_window_rings() {
    let offsets = PhaseOffsets {
        unlikely_from_likely_start: -7,
        unlikely_to_likely_end: 10,
        risky_from_full_start: -3,
        risky_to_full_end: 2,
    };
    let core = span(d(2024, 1, 10), d(2024, 1, 15));
    let window = build_phase_window(Phase::TestingToBreeding, core, &offsets).unwrap();

    assert_eq!(window.key, "testing_to_breeding");
    assert_eq!(window.likely, Some(core));
    assert_eq!(window.full, core);
    assert_eq!(window.unlikely, Some(span(d(2024, 1, 3), d(2024, 1, 25))));
    assert_eq!(window.risky, Some(span(d(2024, 1, 7), d(2024, 1, 17))));
    assert!(window.is_phase());
}

#[test]
fn test_phase_window_from_request() {
    let policy = OffsetPolicy::default();
    let builder = WindowBuilder::new(&policy);
    let window = builder
        .build(&WindowRequest::PhaseSpan {
            phase: Phase::BirthToPlacement,
            start: Some(d(2024, 3, 18)),
            end: Some(d(2024, 6, 3)),
        })
        .unwrap();

    assert_eq!(window.full, span(d(2024, 3, 18), d(2024, 6, 3)));
    assert_eq!(window.risky, Some(span(d(2024, 3, 15), d(2024, 6, 6))));
    assert_eq!(window.unlikely, Some(span(d(2024, 3, 11), d(2024, 6, 10))));
}

#[test]
fn test_phase_missing_endpoint_produces_nothing() {
    let policy = OffsetPolicy::default();
    let builder = WindowBuilder::new(&policy);

    for (start, end) in [
        (None, Some(d(2024, 1, 15))),
        (Some(d(2024, 1, 10)), None),
        (None, None),
    ] {
        let request = WindowRequest::PhaseSpan {
            phase: Phase::TestingToBreeding,
            start,
            end,
        };
        assert!(builder.build(&request).is_none());
    }
}

#[test]
fn test_inverted_core_span_is_still_built() {
    let policy = OffsetPolicy::default();
    let builder = WindowBuilder::new(&policy);
    let window = builder
        .build(&WindowRequest::PhaseSpan {
            phase: Phase::TestingToBreeding,
            start: Some(d(2024, 1, 15)),
            end: Some(d(2024, 1, 10)),
        })
        .unwrap();
    assert!(window.full.is_inverted());
}

// ==========================================
// 全量构造
// ==========================================

#[test]
fn test_build_windows_full_plan_order() {
    let windows = build_windows(&full_plan(), &OffsetPolicy::default());
    assert_eq!(
        keys(&windows),
        vec![
            "cycle_start",
            "testing_start",
            "testing_to_breeding",
            "breeding",
            "birth",
            "birth_to_placement",
            "weaned",
            "placement_start",
            "placement_completed",
        ]
    );
}

#[test]
fn test_absent_anchor_omits_stage_and_dependent_phase() {
    let plan = full_plan().with(Anchor::Breeding, None);
    let windows = build_windows(&plan, &OffsetPolicy::default());
    let keys = keys(&windows);

    assert!(!keys.contains(&"breeding"));
    assert!(!keys.contains(&"testing_to_breeding"));
    assert!(keys.contains(&"testing_start"));
    assert_eq!(windows.len(), 7);
}

#[test]
fn test_empty_plan_produces_no_windows() {
    let windows = build_windows(&PlanAnchors::default(), &OffsetPolicy::default());
    assert!(windows.is_empty());
}

#[test]
fn test_disabled_placement_start_toggle() {
    let policy = OffsetPolicy::default().with_placement_start_bands_enabled(false);
    let windows = build_windows(&full_plan(), &policy);
    let keys = keys(&windows);

    assert!(!keys.contains(&"placement_start"));
    assert!(keys.contains(&"placement_completed"));
    assert!(keys.contains(&"birth_to_placement"));
}

#[test]
fn test_inverted_offsets_still_produce_window() {
    let policy = OffsetPolicy::default()
        .with_field(FieldKey::Date(Anchor::Birth, DateField::RiskyFrom), 5)
        .with_field(FieldKey::Date(Anchor::Birth, DateField::RiskyTo), -1);
    let window = WindowBuilder::new(&policy)
        .build(&WindowRequest::ExactDate {
            anchor: Anchor::Birth,
            date: Some(d(2024, 5, 10)),
        })
        .unwrap();
    assert_eq!(window.full, span(d(2024, 5, 5), d(2024, 5, 11)));
}

#[test]
fn test_policy_offsets_flow_into_phase_windows() {
    let policy = OffsetPolicy::default().with_field(
        FieldKey::Phase(Phase::TestingToBreeding, PhaseField::RiskyToFullEnd),
        9,
    );
    let windows = build_windows(&full_plan(), &policy);
    let phase = windows
        .iter()
        .find(|w| w.key == "testing_to_breeding")
        .unwrap();
    assert_eq!(phase.risky.unwrap().end, d(2024, 1, 24));

    // 另一阶段保持默认
    let other = windows
        .iter()
        .find(|w| w.key == "birth_to_placement")
        .unwrap();
    assert_eq!(other.risky.unwrap().end, d(2024, 6, 6));
}

#[test]
fn test_out_of_range_offsets_skip_only_that_stage() {
    let policy = OffsetPolicy::default()
        .with_field(FieldKey::Date(Anchor::CycleStart, DateField::UnlikelyFrom), i32::MIN);
    let windows = build_windows(&full_plan(), &policy);
    let keys = keys(&windows);

    assert!(!keys.contains(&"cycle_start"));
    assert_eq!(windows.len(), 8);
}

#[test]
fn test_build_is_deterministic() {
    let policy = OffsetPolicy::default();
    let plan = full_plan();
    assert_eq!(build_windows(&plan, &policy), build_windows(&plan, &policy));
}

#[test]
fn test_requests_for_covers_every_stage() {
    let requests = requests_for(&PlanAnchors::default());
    let stage_keys: Vec<StageKey> = requests.iter().map(|r| r.key()).collect();
    assert_eq!(stage_keys, StageKey::ORDERED.to_vec());
}
