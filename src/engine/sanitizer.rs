// ==========================================
// 繁育窗口引擎 - 窗口清洗器
// ==========================================
// 职责: 引擎输出/外部数据 → 渲染器输入 的防御边界
// 规则:
// 1) 丢弃缺少 full 或 full 端点无法解析的条目
// 2) 日期统一按 coerce_date 解析（失败视为缺失，不报错）
// 3) likely/risky/unlikely 两端均可解析才保留，否则仅省略该子项
// 4) 非数组输入 → 空结果
// 保序，不做起止顺序纠正（反向时间带保持可见）
// ==========================================

use crate::domain::date_value::coerce_date;
use crate::domain::window::{DateSpan, StageWindow};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 未经校验的窗口（字段可能缺失或为任意类型）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawWindow {
    #[serde(default)]
    pub key: Value,
    #[serde(default)]
    pub full: Option<Value>,
    #[serde(default)]
    pub likely: Option<Value>,
    #[serde(default)]
    pub risky: Option<Value>,
    #[serde(default)]
    pub unlikely: Option<Value>,
}

impl RawWindow {
    /// 从 JSON 值读取（非对象返回 None）
    pub fn from_value(value: &Value) -> Option<RawWindow> {
        let obj = value.as_object()?;
        Some(RawWindow {
            key: obj.get("key").cloned().unwrap_or(Value::Null),
            full: obj.get("full").cloned(),
            likely: obj.get("likely").cloned(),
            risky: obj.get("risky").cloned(),
            unlikely: obj.get("unlikely").cloned(),
        })
    }
}

impl From<&StageWindow> for RawWindow {
    fn from(window: &StageWindow) -> Self {
        let span = |s: &DateSpan| serde_json::to_value(s).ok();
        RawWindow {
            key: Value::String(window.key.clone()),
            full: span(&window.full),
            likely: window.likely.as_ref().and_then(span),
            risky: window.risky.as_ref().and_then(span),
            unlikely: window.unlikely.as_ref().and_then(span),
        }
    }
}

/// 时间带两端都可解析才返回
fn coerce_span(value: Option<&Value>) -> Option<DateSpan> {
    let obj = value?.as_object()?;
    let start = coerce_date(obj.get("start")?)?;
    let end = coerce_date(obj.get("end")?)?;
    Some(DateSpan { start, end })
}

/// 阶段键: 非空字符串，数字转为字符串
fn coerce_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn sanitize_one(raw: &RawWindow) -> Option<StageWindow> {
    let key = coerce_key(&raw.key)?;
    let full = coerce_span(raw.full.as_ref())?;
    Some(StageWindow {
        key,
        full,
        likely: coerce_span(raw.likely.as_ref()),
        risky: coerce_span(raw.risky.as_ref()),
        unlikely: coerce_span(raw.unlikely.as_ref()),
    })
}

/// 清洗已解析的原始窗口列表
pub fn sanitize_raw(windows: &[RawWindow]) -> Vec<StageWindow> {
    let cleaned: Vec<StageWindow> = windows.iter().filter_map(sanitize_one).collect();
    let dropped = windows.len() - cleaned.len();
    if dropped > 0 {
        tracing::debug!(dropped, kept = cleaned.len(), "清洗器丢弃了无效窗口");
    }
    cleaned
}

/// 清洗任意 JSON 输入
pub fn sanitize(value: &Value) -> Vec<StageWindow> {
    let Some(items) = value.as_array() else {
        if !value.is_null() {
            tracing::debug!("清洗器输入不是数组，返回空结果");
        }
        return Vec::new();
    };

    let raws: Vec<RawWindow> = items.iter().filter_map(RawWindow::from_value).collect();
    let non_objects = items.len() - raws.len();
    if non_objects > 0 {
        tracing::debug!(non_objects, "清洗器丢弃了非对象条目");
    }
    sanitize_raw(&raws)
}
