//! 时间工具函数 — 业务时区转换
//!
//! 引擎内部所有时刻统一为 `DateTime<Utc>`；日期→时刻转换在
//! 这里完成，业务时区只在边界（窗口、CSV 分组）出现。

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use super::{FloorError, FloorResult};

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> FloorResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| FloorError::validation(format!("Invalid date format: {}", date)))
}

/// 解析时刻字符串 (HH:MM)，失败返回给定默认值
pub fn parse_hhmm(s: &str, fallback: NaiveTime) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").unwrap_or_else(|e| {
        tracing::warn!("Failed to parse time '{}': {}, falling back", s, e);
        fallback
    })
}

/// 本地日期 + 时刻 → UTC 时刻 (业务时区)
///
/// DST gap fallback: 如果本地时间不存在 (夏令时跳跃)，fallback 到 UTC。
pub fn local_datetime(date: NaiveDate, time: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let naive = date.and_time(time);
    naive
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// UTC 时刻 → 业务时区日历日期
pub fn local_date(at: DateTime<Utc>, tz: Tz) -> NaiveDate {
    at.with_timezone(&tz).date_naive()
}

/// 向下取整到最近的 30 分钟边界
pub fn floor_to_half_hour(at: DateTime<Utc>) -> DateTime<Utc> {
    const HALF_HOUR_MS: i64 = 30 * 60 * 1000;
    let floored = at.timestamp_millis().div_euclid(HALF_HOUR_MS) * HALF_HOUR_MS;
    Utc.timestamp_millis_opt(floored).single().unwrap_or(at)
}

/// 30 分钟步长
pub fn half_hour() -> Duration {
    Duration::minutes(30)
}
