// ==========================================
// 繁育窗口引擎 - 领域类型定义
// ==========================================
// 锚点 (Anchor): 生命周期中的单个日期事件
// 阶段 (Phase): 两个锚点之间的时间段
// 阶段键 (StageKey): 窗口输出的唯一标识
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 名称归一化：统一大小写与分隔符，便于解析 snake / kebab / camel 三种写法
fn normalize_name(s: &str) -> String {
    let s = s.trim();
    // 全大写（如 SCREAMING_SNAKE_CASE）直接转小写
    if !s.chars().any(|c| c.is_ascii_lowercase()) {
        return s.to_ascii_lowercase().replace(['-', ' '], "_");
    }

    let mut out = String::with_capacity(s.len() + 4);
    for (i, ch) in s.chars().enumerate() {
        if ch == '-' || ch == ' ' {
            out.push('_');
        } else if ch.is_ascii_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

// ==========================================
// 生命周期锚点 (Anchor)
// ==========================================
// 顺序: 按生命周期先后排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    CycleStart,         // 发情周期开始
    TestingStart,       // 激素检测开始
    Breeding,           // 配种
    Birth,              // 分娩
    Weaned,             // 断奶
    PlacementStart,     // 交付开始
    PlacementCompleted, // 交付完成
}

impl Anchor {
    /// 全部锚点（生命周期顺序）
    pub const ALL: [Anchor; 7] = [
        Anchor::CycleStart,
        Anchor::TestingStart,
        Anchor::Breeding,
        Anchor::Birth,
        Anchor::Weaned,
        Anchor::PlacementStart,
        Anchor::PlacementCompleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Anchor::CycleStart => "cycle_start",
            Anchor::TestingStart => "testing_start",
            Anchor::Breeding => "breeding",
            Anchor::Birth => "birth",
            Anchor::Weaned => "weaned",
            Anchor::PlacementStart => "placement_start",
            Anchor::PlacementCompleted => "placement_completed",
        }
    }

    pub fn title_cn(&self) -> &'static str {
        match self {
            Anchor::CycleStart => "周期开始",
            Anchor::TestingStart => "检测开始",
            Anchor::Breeding => "配种",
            Anchor::Birth => "分娩",
            Anchor::Weaned => "断奶",
            Anchor::PlacementStart => "交付开始",
            Anchor::PlacementCompleted => "交付完成",
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Anchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = normalize_name(s);
        Anchor::ALL
            .into_iter()
            .find(|a| a.as_str() == name)
            .ok_or_else(|| format!("未知锚点: {}", s.trim()))
    }
}

// ==========================================
// 阶段 (Phase)
// ==========================================
// 阶段跨度由两个锚点界定，见 bounds()
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    TestingToBreeding, // 检测 → 配种
    BirthToPlacement,  // 分娩 → 交付
}

impl Phase {
    pub const ALL: [Phase; 2] = [Phase::TestingToBreeding, Phase::BirthToPlacement];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::TestingToBreeding => "testing_to_breeding",
            Phase::BirthToPlacement => "birth_to_placement",
        }
    }

    pub fn title_cn(&self) -> &'static str {
        match self {
            Phase::TestingToBreeding => "检测至配种",
            Phase::BirthToPlacement => "分娩至交付",
        }
    }

    /// 阶段的起止锚点 (start, end)
    pub fn bounds(&self) -> (Anchor, Anchor) {
        match self {
            Phase::TestingToBreeding => (Anchor::TestingStart, Anchor::Breeding),
            Phase::BirthToPlacement => (Anchor::Birth, Anchor::PlacementCompleted),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = normalize_name(s);
        Phase::ALL
            .into_iter()
            .find(|p| p.as_str() == name)
            .ok_or_else(|| format!("未知阶段: {}", s.trim()))
    }
}

// ==========================================
// 阶段键 (StageKey)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKey {
    Phase(Phase),
    Anchor(Anchor),
}

impl StageKey {
    /// 全部阶段键（生命周期顺序，阶段插在其起点锚点之后）
    pub const ORDERED: [StageKey; 9] = [
        StageKey::Anchor(Anchor::CycleStart),
        StageKey::Anchor(Anchor::TestingStart),
        StageKey::Phase(Phase::TestingToBreeding),
        StageKey::Anchor(Anchor::Breeding),
        StageKey::Anchor(Anchor::Birth),
        StageKey::Phase(Phase::BirthToPlacement),
        StageKey::Anchor(Anchor::Weaned),
        StageKey::Anchor(Anchor::PlacementStart),
        StageKey::Anchor(Anchor::PlacementCompleted),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageKey::Phase(p) => p.as_str(),
            StageKey::Anchor(a) => a.as_str(),
        }
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StageKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(phase) = s.parse::<Phase>() {
            return Ok(StageKey::Phase(phase));
        }
        if let Ok(anchor) = s.parse::<Anchor>() {
            return Ok(StageKey::Anchor(anchor));
        }
        Err(format!("未知阶段键: {}", s.trim()))
    }
}

impl From<Anchor> for StageKey {
    fn from(anchor: Anchor) -> Self {
        StageKey::Anchor(anchor)
    }
}

impl From<Phase> for StageKey {
    fn from(phase: Phase) -> Self {
        StageKey::Phase(phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_parse_accepts_multiple_spellings() {
        assert_eq!("placement_start".parse::<Anchor>(), Ok(Anchor::PlacementStart));
        assert_eq!("placement-start".parse::<Anchor>(), Ok(Anchor::PlacementStart));
        assert_eq!("PlacementStart".parse::<Anchor>(), Ok(Anchor::PlacementStart));
        assert_eq!(" birth ".parse::<Anchor>(), Ok(Anchor::Birth));
        assert!("foaling".parse::<Anchor>().is_err());
    }

    #[test]
    fn test_phase_bounds() {
        assert_eq!(
            Phase::TestingToBreeding.bounds(),
            (Anchor::TestingStart, Anchor::Breeding)
        );
        assert_eq!(
            Phase::BirthToPlacement.bounds(),
            (Anchor::Birth, Anchor::PlacementCompleted)
        );
    }

    #[test]
    fn test_stage_key_roundtrip_through_str() {
        for key in StageKey::ORDERED {
            assert_eq!(key.as_str().parse::<StageKey>(), Ok(key));
        }
    }
}
