// ==========================================
// 繁育窗口引擎 - 偏移策略 (Offset Policy)
// ==========================================
// 每个租户一份，不可变值对象:
// - 每个阶段: 4 个有符号天数偏移 (unlikely/risky 外环)
// - 每个锚点: 4 个有符号天数偏移 (负数=之前, 正数=之后)
// - 交付开始锚点额外带一个时间带开关
// 修改只能通过 with_* 返回新值
// 持久化形态: 扁平记录 { "date_birth_risky_from": -3, ... }
// ==========================================

use crate::domain::types::{Anchor, Phase};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// 交付开始时间带开关的记录键
pub const PLACEMENT_START_BANDS_ENABLED_KEY: &str = "date_placement_start_bands_enabled";

// ==========================================
// 偏移量组
// ==========================================

/// 阶段偏移（以 likely/full 跨度为基准向外扩展）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseOffsets {
    pub unlikely_from_likely_start: i32,
    pub unlikely_to_likely_end: i32,
    pub risky_from_full_start: i32,
    pub risky_to_full_end: i32,
}

/// 精确日期锚点偏移（相对锚点日期）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateOffsets {
    pub risky_from: i32,
    pub risky_to: i32,
    pub unlikely_from: i32,
    pub unlikely_to: i32,
}

/// 阶段默认偏移
pub const DEFAULT_PHASE_OFFSETS: PhaseOffsets = PhaseOffsets {
    unlikely_from_likely_start: -7,
    unlikely_to_likely_end: 7,
    risky_from_full_start: -3,
    risky_to_full_end: 3,
};

/// 锚点默认偏移
pub const DEFAULT_DATE_OFFSETS: DateOffsets = DateOffsets {
    risky_from: -3,
    risky_to: 3,
    unlikely_from: -7,
    unlikely_to: 7,
};

// ==========================================
// 字段定义
// ==========================================

/// 作用域：阶段字段 / 日期字段（两套编辑界面互不干扰）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetScope {
    Phase,
    Date,
}

impl PresetScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetScope::Phase => "phase",
            PresetScope::Date => "date",
        }
    }
}

impl fmt::Display for PresetScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PresetScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "phase" | "phases" => Ok(PresetScope::Phase),
            "date" | "dates" => Ok(PresetScope::Date),
            other => Err(format!("未知作用域: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseField {
    UnlikelyFromLikelyStart,
    UnlikelyToLikelyEnd,
    RiskyFromFullStart,
    RiskyToFullEnd,
}

impl PhaseField {
    pub const ALL: [PhaseField; 4] = [
        PhaseField::UnlikelyFromLikelyStart,
        PhaseField::UnlikelyToLikelyEnd,
        PhaseField::RiskyFromFullStart,
        PhaseField::RiskyToFullEnd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseField::UnlikelyFromLikelyStart => "unlikely_from_likely_start",
            PhaseField::UnlikelyToLikelyEnd => "unlikely_to_likely_end",
            PhaseField::RiskyFromFullStart => "risky_from_full_start",
            PhaseField::RiskyToFullEnd => "risky_to_full_end",
        }
    }

    fn get(&self, offsets: &PhaseOffsets) -> i32 {
        match self {
            PhaseField::UnlikelyFromLikelyStart => offsets.unlikely_from_likely_start,
            PhaseField::UnlikelyToLikelyEnd => offsets.unlikely_to_likely_end,
            PhaseField::RiskyFromFullStart => offsets.risky_from_full_start,
            PhaseField::RiskyToFullEnd => offsets.risky_to_full_end,
        }
    }

    fn set(&self, offsets: &mut PhaseOffsets, value: i32) {
        match self {
            PhaseField::UnlikelyFromLikelyStart => offsets.unlikely_from_likely_start = value,
            PhaseField::UnlikelyToLikelyEnd => offsets.unlikely_to_likely_end = value,
            PhaseField::RiskyFromFullStart => offsets.risky_from_full_start = value,
            PhaseField::RiskyToFullEnd => offsets.risky_to_full_end = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateField {
    RiskyFrom,
    RiskyTo,
    UnlikelyFrom,
    UnlikelyTo,
}

impl DateField {
    pub const ALL: [DateField; 4] = [
        DateField::RiskyFrom,
        DateField::RiskyTo,
        DateField::UnlikelyFrom,
        DateField::UnlikelyTo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DateField::RiskyFrom => "risky_from",
            DateField::RiskyTo => "risky_to",
            DateField::UnlikelyFrom => "unlikely_from",
            DateField::UnlikelyTo => "unlikely_to",
        }
    }

    fn get(&self, offsets: &DateOffsets) -> i32 {
        match self {
            DateField::RiskyFrom => offsets.risky_from,
            DateField::RiskyTo => offsets.risky_to,
            DateField::UnlikelyFrom => offsets.unlikely_from,
            DateField::UnlikelyTo => offsets.unlikely_to,
        }
    }

    fn set(&self, offsets: &mut DateOffsets, value: i32) {
        match self {
            DateField::RiskyFrom => offsets.risky_from = value,
            DateField::RiskyTo => offsets.risky_to = value,
            DateField::UnlikelyFrom => offsets.unlikely_from = value,
            DateField::UnlikelyTo => offsets.unlikely_to = value,
        }
    }
}

/// 策略中单个整数字段的键
///
/// 字符串形式:
/// - 阶段: `phase_{phase}_{field}`，如 `phase_testing_to_breeding_risky_to_full_end`
/// - 日期: `date_{anchor}_{field}`，如 `date_birth_unlikely_from`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Phase(Phase, PhaseField),
    Date(Anchor, DateField),
}

impl FieldKey {
    /// 全部整数字段（阶段在前，日期在后；各自按生命周期顺序）
    pub fn all() -> impl Iterator<Item = FieldKey> {
        let phases = Phase::ALL.into_iter().flat_map(|p| {
            PhaseField::ALL
                .into_iter()
                .map(move |f| FieldKey::Phase(p, f))
        });
        let dates = Anchor::ALL.into_iter().flat_map(|a| {
            DateField::ALL
                .into_iter()
                .map(move |f| FieldKey::Date(a, f))
        });
        phases.chain(dates)
    }

    /// 指定作用域内的全部字段
    pub fn in_scope(scope: PresetScope) -> impl Iterator<Item = FieldKey> {
        FieldKey::all().filter(move |k| k.scope() == scope)
    }

    /// 单个锚点的一行（risky_from, risky_to, unlikely_from, unlikely_to）
    pub fn date_row(anchor: Anchor) -> [FieldKey; 4] {
        DateField::ALL.map(|f| FieldKey::Date(anchor, f))
    }

    /// 单个阶段的一行
    pub fn phase_row(phase: Phase) -> [FieldKey; 4] {
        PhaseField::ALL.map(|f| FieldKey::Phase(phase, f))
    }

    pub fn scope(&self) -> PresetScope {
        match self {
            FieldKey::Phase(..) => PresetScope::Phase,
            FieldKey::Date(..) => PresetScope::Date,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Phase(p, field) => write!(f, "phase_{}_{}", p.as_str(), field.as_str()),
            FieldKey::Date(a, field) => write!(f, "date_{}_{}", a.as_str(), field.as_str()),
        }
    }
}

impl FromStr for FieldKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        FieldKey::all()
            .find(|k| k.to_string() == key)
            .ok_or_else(|| format!("未知策略字段: {}", key))
    }
}

// ==========================================
// OffsetPolicy - 偏移策略
// ==========================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetPolicy {
    phases: [PhaseOffsets; 2],
    dates: [DateOffsets; 7],
    placement_start_bands_enabled: bool,
}

impl Default for OffsetPolicy {
    fn default() -> Self {
        Self {
            phases: [DEFAULT_PHASE_OFFSETS; 2],
            dates: [DEFAULT_DATE_OFFSETS; 7],
            placement_start_bands_enabled: true,
        }
    }
}

/// 部分记录合并结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// 已应用的键
    pub applied: Vec<String>,
    /// 未知键
    pub unknown: Vec<String>,
    /// 值类型/范围不合法的键
    pub invalid: Vec<String>,
}

impl MergeReport {
    pub fn is_clean(&self) -> bool {
        self.unknown.is_empty() && self.invalid.is_empty()
    }
}

impl OffsetPolicy {
    // ===== 读取 =====

    pub fn phase(&self, phase: Phase) -> PhaseOffsets {
        self.phases[phase as usize]
    }

    pub fn date(&self, anchor: Anchor) -> DateOffsets {
        self.dates[anchor as usize]
    }

    pub fn placement_start_bands_enabled(&self) -> bool {
        self.placement_start_bands_enabled
    }

    /// 锚点是否产出时间带（仅交付开始受开关控制）
    pub fn bands_enabled(&self, anchor: Anchor) -> bool {
        anchor != Anchor::PlacementStart || self.placement_start_bands_enabled
    }

    pub fn field(&self, key: FieldKey) -> i32 {
        match key {
            FieldKey::Phase(p, f) => f.get(&self.phases[p as usize]),
            FieldKey::Date(a, f) => f.get(&self.dates[a as usize]),
        }
    }

    // ===== 纯变换 =====

    pub fn with_field(&self, key: FieldKey, value: i32) -> Self {
        let mut next = self.clone();
        match key {
            FieldKey::Phase(p, f) => f.set(&mut next.phases[p as usize], value),
            FieldKey::Date(a, f) => f.set(&mut next.dates[a as usize], value),
        }
        next
    }

    pub fn with_date(&self, anchor: Anchor, offsets: DateOffsets) -> Self {
        let mut next = self.clone();
        next.dates[anchor as usize] = offsets;
        next
    }

    pub fn with_placement_start_bands_enabled(&self, enabled: bool) -> Self {
        let mut next = self.clone();
        next.placement_start_bands_enabled = enabled;
        next
    }

    // ===== 扁平记录 =====

    /// 导出完整扁平记录（37 个键）
    pub fn to_record(&self) -> Map<String, Value> {
        let mut record = Map::new();
        for key in FieldKey::all() {
            record.insert(key.to_string(), Value::from(self.field(key)));
        }
        record.insert(
            PLACEMENT_START_BANDS_ENABLED_KEY.to_string(),
            Value::Bool(self.placement_start_bands_enabled),
        );
        record
    }

    /// 将部分记录合并到当前策略之上
    ///
    /// - 缺失的键保持原值
    /// - 未知键/非法值跳过并记入报告，不会中断合并
    pub fn merge_record(&self, record: &Map<String, Value>) -> (Self, MergeReport) {
        let mut next = self.clone();
        let mut report = MergeReport::default();

        for (raw_key, value) in record {
            if raw_key == PLACEMENT_START_BANDS_ENABLED_KEY {
                match parse_flag_value(value) {
                    Some(enabled) => {
                        next.placement_start_bands_enabled = enabled;
                        report.applied.push(raw_key.clone());
                    }
                    None => report.invalid.push(raw_key.clone()),
                }
                continue;
            }

            let key = match raw_key.parse::<FieldKey>() {
                Ok(key) => key,
                Err(_) => {
                    report.unknown.push(raw_key.clone());
                    continue;
                }
            };

            match parse_offset_value(value) {
                Some(v) => {
                    next = next.with_field(key, v);
                    report.applied.push(raw_key.clone());
                }
                None => report.invalid.push(raw_key.clone()),
            }
        }

        if !report.is_clean() {
            tracing::warn!(
                unknown = ?report.unknown,
                invalid = ?report.invalid,
                "偏移策略记录包含无法识别的字段，已跳过"
            );
        }

        (next, report)
    }

    /// 在默认策略之上合并部分记录
    pub fn from_record(record: &Map<String, Value>) -> (Self, MergeReport) {
        OffsetPolicy::default().merge_record(record)
    }
}

impl Serialize for OffsetPolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OffsetPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = Map::<String, Value>::deserialize(deserializer)?;
        Ok(OffsetPolicy::from_record(&record).0)
    }
}

// ==========================================
// 值解析
// ==========================================

/// 解析整数偏移：整数、整数值浮点、数字字符串
pub(crate) fn parse_offset_value(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).ok()
            } else {
                let f = n.as_f64()?;
                if f.is_finite() && f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64
                {
                    Some(f as i32)
                } else {
                    None
                }
            }
        }
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}

/// 解析布尔开关：bool、0/1、常见真假字符串
pub(crate) fn parse_flag_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "y" | "on" => Some(true),
            "0" | "false" | "no" | "n" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
