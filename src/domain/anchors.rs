// ==========================================
// 繁育窗口引擎 - 计划锚点
// ==========================================
// 锚点由上游计划生命周期逻辑提供（本引擎只消费）
// 任何锚点都可能缺失：缺失 = 该阶段无窗口，绝不视为 0 或“今天”
// ==========================================

use crate::domain::date_value::coerce_optional_date;
use crate::domain::types::Anchor;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 上游原始锚点记录（camelCase，字段可为字符串/数字/null 等任意 JSON）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlanAnchors {
    #[serde(default)]
    pub locked_cycle_start: Option<Value>,
    #[serde(default)]
    pub hormone_testing_start: Option<Value>,
    #[serde(default)]
    pub locked_ovulation_date: Option<Value>,
    #[serde(default)]
    pub breed_date_actual: Option<Value>,
    #[serde(default)]
    pub breed_date_expected: Option<Value>,
    #[serde(default)]
    pub expected_due: Option<Value>,
    #[serde(default)]
    pub expected_weaned: Option<Value>,
    #[serde(default)]
    pub expected_placement_start: Option<Value>,
    #[serde(default)]
    pub expected_placement_completed: Option<Value>,

    // 按锚点名直接给出的日期（camelCase 或 snake_case），优先于上游字段
    #[serde(default, alias = "cycle_start")]
    pub cycle_start: Option<Value>,
    #[serde(default, alias = "testing_start")]
    pub testing_start: Option<Value>,
    #[serde(default)]
    pub breeding: Option<Value>,
    #[serde(default)]
    pub birth: Option<Value>,
    #[serde(default)]
    pub weaned: Option<Value>,
    #[serde(default, alias = "placement_start")]
    pub placement_start: Option<Value>,
    #[serde(default, alias = "placement_completed")]
    pub placement_completed: Option<Value>,
}

/// 归一化后的计划锚点
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanAnchors {
    pub cycle_start: Option<NaiveDate>,
    pub testing_start: Option<NaiveDate>,
    pub breeding: Option<NaiveDate>,
    pub birth: Option<NaiveDate>,
    pub weaned: Option<NaiveDate>,
    pub placement_start: Option<NaiveDate>,
    pub placement_completed: Option<NaiveDate>,
}

impl PlanAnchors {
    /// 从原始记录归一化
    ///
    /// # 规则
    /// - 按锚点名给出的日期（如 `birth`）优先于上游计划字段
    /// - 检测开始: hormoneTestingStart 优先，否则 lockedOvulationDate
    /// - 配种: 实际日期优先，否则预计日期
    /// - 无法解析的值视为缺失（记录 warn 日志）
    pub fn from_raw(raw: &RawPlanAnchors) -> Self {
        Self {
            cycle_start: first_date(&[
                ("cycleStart", raw.cycle_start.as_ref()),
                ("lockedCycleStart", raw.locked_cycle_start.as_ref()),
            ]),
            testing_start: first_date(&[
                ("testingStart", raw.testing_start.as_ref()),
                ("hormoneTestingStart", raw.hormone_testing_start.as_ref()),
                ("lockedOvulationDate", raw.locked_ovulation_date.as_ref()),
            ]),
            breeding: first_date(&[
                ("breeding", raw.breeding.as_ref()),
                ("breedDateActual", raw.breed_date_actual.as_ref()),
                ("breedDateExpected", raw.breed_date_expected.as_ref()),
            ]),
            birth: first_date(&[
                ("birth", raw.birth.as_ref()),
                ("expectedDue", raw.expected_due.as_ref()),
            ]),
            weaned: first_date(&[
                ("weaned", raw.weaned.as_ref()),
                ("expectedWeaned", raw.expected_weaned.as_ref()),
            ]),
            placement_start: first_date(&[
                ("placementStart", raw.placement_start.as_ref()),
                ("expectedPlacementStart", raw.expected_placement_start.as_ref()),
            ]),
            placement_completed: first_date(&[
                ("placementCompleted", raw.placement_completed.as_ref()),
                ("expectedPlacementCompleted", raw.expected_placement_completed.as_ref()),
            ]),
        }
    }

    /// 从任意 JSON 值解析（非对象或字段类型不符时按全部缺失处理）
    pub fn from_value(value: &Value) -> Self {
        if !value.is_object() {
            tracing::warn!("计划锚点记录不是对象，按全部缺失处理");
            return Self::default();
        }
        match serde_json::from_value::<RawPlanAnchors>(value.clone()) {
            Ok(raw) => Self::from_raw(&raw),
            Err(e) => {
                tracing::warn!("计划锚点记录无法识别，按全部缺失处理: {}", e);
                Self::default()
            }
        }
    }

    pub fn get(&self, anchor: Anchor) -> Option<NaiveDate> {
        match anchor {
            Anchor::CycleStart => self.cycle_start,
            Anchor::TestingStart => self.testing_start,
            Anchor::Breeding => self.breeding,
            Anchor::Birth => self.birth,
            Anchor::Weaned => self.weaned,
            Anchor::PlacementStart => self.placement_start,
            Anchor::PlacementCompleted => self.placement_completed,
        }
    }

    /// 返回设置了指定锚点的新值
    pub fn with(mut self, anchor: Anchor, date: Option<NaiveDate>) -> Self {
        let slot = match anchor {
            Anchor::CycleStart => &mut self.cycle_start,
            Anchor::TestingStart => &mut self.testing_start,
            Anchor::Breeding => &mut self.breeding,
            Anchor::Birth => &mut self.birth,
            Anchor::Weaned => &mut self.weaned,
            Anchor::PlacementStart => &mut self.placement_start,
            Anchor::PlacementCompleted => &mut self.placement_completed,
        };
        *slot = date;
        self
    }
}

/// 按顺序取第一个可解析的日期
fn first_date(candidates: &[(&str, Option<&Value>)]) -> Option<NaiveDate> {
    candidates
        .iter()
        .find_map(|(field, value)| normalize_field(field, *value))
}

fn normalize_field(field: &str, value: Option<&Value>) -> Option<NaiveDate> {
    let parsed = coerce_optional_date(value);
    if parsed.is_none() {
        if let Some(v) = value.filter(|v| !v.is_null()) {
            tracing::warn!(field, value = %v, "锚点日期无法解析，视为缺失");
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_from_value_prefers_actual_breed_date() {
        let anchors = PlanAnchors::from_value(&json!({
            "breedDateActual": "2024-02-03",
            "breedDateExpected": "2024-02-01",
            "expectedDue": "2024-04-05T00:00:00Z",
        }));
        assert_eq!(anchors.breeding, Some(d(2024, 2, 3)));
        assert_eq!(anchors.birth, Some(d(2024, 4, 5)));
        assert_eq!(anchors.cycle_start, None);
    }

    #[test]
    fn test_testing_start_falls_back_to_ovulation() {
        let anchors = PlanAnchors::from_value(&json!({
            "hormoneTestingStart": null,
            "lockedOvulationDate": "2024-01-20",
        }));
        assert_eq!(anchors.testing_start, Some(d(2024, 1, 20)));
    }

    #[test]
    fn test_malformed_values_become_absent() {
        let anchors = PlanAnchors::from_value(&json!({
            "lockedCycleStart": "soon",
            "breedDateActual": "garbage",
            "breedDateExpected": "2024-02-01",
            "expectedWeaned": false,
        }));
        assert_eq!(anchors.cycle_start, None);
        assert_eq!(anchors.breeding, Some(d(2024, 2, 1)));
        assert_eq!(anchors.weaned, None);
    }

    #[test]
    fn test_anchor_name_keys_are_accepted() {
        let anchors = PlanAnchors::from_value(&json!({
            "cycleStart": "2024-01-02",
            "testing_start": "2024-01-10",
            "breeding": "2024-01-15",
            "birth": 1715299200000_i64,
            "weaned": "2024-07-01",
            "placementStart": "2024-07-08",
            "placement_completed": "2024-07-20",
        }));
        assert_eq!(anchors.cycle_start, Some(d(2024, 1, 2)));
        assert_eq!(anchors.testing_start, Some(d(2024, 1, 10)));
        assert_eq!(anchors.breeding, Some(d(2024, 1, 15)));
        assert_eq!(anchors.birth, Some(d(2024, 5, 10)));
        assert_eq!(anchors.weaned, Some(d(2024, 7, 1)));
        assert_eq!(anchors.placement_start, Some(d(2024, 7, 8)));
        assert_eq!(anchors.placement_completed, Some(d(2024, 7, 20)));
    }

    #[test]
    fn test_anchor_name_wins_over_plan_field() {
        let anchors = PlanAnchors::from_value(&json!({
            "birth": "2024-05-12",
            "expectedDue": "2024-05-10",
            "weaned": "not yet",
            "expectedWeaned": "2024-07-01",
        }));
        assert_eq!(anchors.birth, Some(d(2024, 5, 12)));
        // 锚点名的值无法解析时回退到上游字段
        assert_eq!(anchors.weaned, Some(d(2024, 7, 1)));
    }

    #[test]
    fn test_non_object_input_is_all_absent() {
        assert_eq!(PlanAnchors::from_value(&json!("2024-01-01")), PlanAnchors::default());
        assert_eq!(PlanAnchors::from_value(&json!([1, 2])), PlanAnchors::default());
    }

    #[test]
    fn test_with_and_get_are_consistent() {
        let mut anchors = PlanAnchors::default();
        for (i, anchor) in Anchor::ALL.into_iter().enumerate() {
            anchors = anchors.with(anchor, Some(d(2024, 1, 1 + i as u32)));
        }
        for (i, anchor) in Anchor::ALL.into_iter().enumerate() {
            assert_eq!(anchors.get(anchor), Some(d(2024, 1, 1 + i as u32)));
        }
    }
}
