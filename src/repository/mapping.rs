// ==========================================
// 骑手排班系统 - 行映射辅助
// ==========================================
// 职责: TEXT 列 <-> chrono / 枚举 的转换
// 约束: 脏数据返回 FromSqlConversionFailure，不静默兜底
// ==========================================

use crate::db::{DATE_FORMAT, TIMESTAMP_FORMAT, TIME_FORMAT};
use crate::domain::types::{RiderType, ShiftType};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rusqlite::types::Type;

pub(crate) fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

pub(crate) fn parse_date(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| conversion_error(idx, format!("日期格式错误 '{}': {}", raw, e)))
}

pub(crate) fn parse_time(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<NaiveTime>> {
    match raw {
        Some(s) => NaiveTime::parse_from_str(&s, TIME_FORMAT)
            .map(Some)
            .map_err(|e| conversion_error(idx, format!("时间格式错误 '{}': {}", s, e))),
        None => Ok(None),
    }
}

pub(crate) fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map_err(|e| conversion_error(idx, format!("时间戳格式错误 '{}': {}", raw, e)))
}

pub(crate) fn parse_shift_type(idx: usize, raw: &str) -> rusqlite::Result<ShiftType> {
    ShiftType::from_code(raw).ok_or_else(|| conversion_error(idx, format!("未知班次类型: {}", raw)))
}

pub(crate) fn parse_rider_type(idx: usize, raw: &str) -> rusqlite::Result<RiderType> {
    RiderType::from_code(raw).ok_or_else(|| conversion_error(idx, format!("未知骑手类型: {}", raw)))
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn format_time(time: Option<NaiveTime>) -> Option<String> {
    time.map(|t| t.format(TIME_FORMAT).to_string())
}

pub(crate) fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn now_timestamp() -> NaiveDateTime {
    // 存储精度为秒
    let now = chrono::Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
