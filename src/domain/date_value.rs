// ==========================================
// 繁育窗口引擎 - 日期值统一解析
// ==========================================
// 所有边界（计划锚点、外部窗口数据）共用同一条解析规则:
// - 字符串: YYYY-MM-DD / RFC 3339 / 无时区的 ISO 日期时间
// - 数字: 毫秒时间戳（UTC 日期）
// - 其他: 视为缺失
// 解析失败一律返回 None，不报错、不 panic
// ==========================================

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// 毫秒时间戳的有效上限（±1e8 天，与浏览器 Date 一致）
const MAX_EPOCH_MILLIS: f64 = 8.64e15;

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// 将任意 JSON 值强制转换为日期
pub fn coerce_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date_str(s),
        Value::Number(n) => {
            if let Some(ms) = n.as_i64() {
                date_from_epoch_millis(ms as f64)
            } else {
                n.as_f64().and_then(date_from_epoch_millis)
            }
        }
        _ => None,
    }
}

/// 可选值版本（缺失字段直接视为 None）
pub fn coerce_optional_date(value: Option<&Value>) -> Option<NaiveDate> {
    value.and_then(coerce_date)
}

/// 解析日期字符串
pub fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }

    // 带时区的时间戳取其自身时区下的日期
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

fn date_from_epoch_millis(ms: f64) -> Option<NaiveDate> {
    if !ms.is_finite() || ms.abs() > MAX_EPOCH_MILLIS {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(ms.trunc() as i64).map(|dt| dt.date_naive())
}
