// ==========================================
// 骑手排班系统 - 用户通知
// ==========================================
// 职责: 每个操作结果 -> 一条可读、可区分的通知
// 约束: 错误不吞掉, 每种错误码对应独立文案
// ==========================================

use crate::api::error::ApiError;
use crate::i18n::t_with_args;
use serde::{Deserialize, Serialize};

/// 写入成功但视图未能刷新
pub const STALE_VIEW_CODE: &str = "STALE_VIEW";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub severity: Severity,
    pub code: String,
    pub message: String,
}

impl Notification {
    /// 成功通知
    ///
    /// # 参数
    /// - `key`: 文案键（如 `schedule.created`）
    /// - `args`: 文案参数
    pub fn success(key: &str, args: &[(&str, &str)]) -> Self {
        Self {
            severity: Severity::Success,
            code: "OK".to_string(),
            message: t_with_args(key, args),
        }
    }

    /// 写入已成功但随后的刷新失败
    ///
    /// 写入结果仍以成功返回; 此通知提示已加载数据可能过期
    pub fn stale(success_key: &str, args: &[(&str, &str)], refresh_err: &ApiError) -> Self {
        let action = t_with_args(success_key, args);
        Self {
            severity: Severity::Warning,
            code: STALE_VIEW_CODE.to_string(),
            message: t_with_args(
                "schedule.stale",
                &[("action", &action), ("detail", &refresh_err.to_string())],
            ),
        }
    }

    /// 由错误构造通知
    ///
    /// 调用方可纠正的错误（冲突/校验/不存在）为 warning, 其余为 error
    pub fn from_error(err: &ApiError) -> Self {
        let severity = match err {
            ApiError::ValidationError(_)
            | ApiError::InvalidDateRange { .. }
            | ApiError::AssignmentConflict { .. }
            | ApiError::NotFound { .. }
            | ApiError::ReferenceError { .. }
            | ApiError::BusinessRuleViolation(_) => Severity::Warning,
            ApiError::UpstreamError(_)
            | ApiError::ImportError(_)
            | ApiError::DatabaseError(_)
            | ApiError::DatabaseConnectionError(_)
            | ApiError::InternalError(_)
            | ApiError::Other(_) => Severity::Error,
        };

        let key = format!("errors.{}", err.code().to_lowercase());
        let detail = err.to_string();
        let message = match err {
            ApiError::AssignmentConflict {
                rider_id,
                shift_date,
                ..
            } => t_with_args(
                &key,
                &[
                    ("rider_id", &rider_id.to_string()),
                    ("shift_date", &shift_date.to_string()),
                ],
            ),
            ApiError::InvalidDateRange { start, end } => t_with_args(
                &key,
                &[("start", &start.to_string()), ("end", &end.to_string())],
            ),
            ApiError::NotFound { entity, id } => {
                t_with_args(&key, &[("entity", entity), ("id", id)])
            }
            ApiError::ReferenceError { entity, id } => {
                t_with_args(&key, &[("entity", entity), ("id", &id.to_string())])
            }
            _ => t_with_args(&key, &[("detail", &detail)]),
        };

        Self {
            severity,
            code: err.code().to_string(),
            message,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity != Severity::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{set_locale, LOCALE_TEST_LOCK};
    use chrono::NaiveDate;

    #[test]
    fn test_from_error_冲突与一般失败可区分() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_locale("zh-CN");

        let conflict = Notification::from_error(&ApiError::AssignmentConflict {
            rider_id: 1,
            shift_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            existing_id: Some(3),
        });
        let upstream = Notification::from_error(&ApiError::UpstreamError("timeout".to_string()));

        assert_eq!(conflict.code, "ASSIGNMENT_CONFLICT");
        assert_eq!(conflict.severity, Severity::Warning);
        assert!(conflict.message.contains("2024-06-01"));
        assert_eq!(upstream.severity, Severity::Error);
        assert!(upstream.message.contains("timeout"));
        assert_ne!(conflict.message, upstream.message);
    }

    #[test]
    fn test_stale_保留操作文案与刷新错误() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_locale("zh-CN");

        let n = Notification::stale(
            "schedule.deleted",
            &[],
            &ApiError::DatabaseError("disk I/O error".to_string()),
        );
        assert_eq!(n.severity, Severity::Warning);
        assert_eq!(n.code, STALE_VIEW_CODE);
        assert!(n.message.contains("排班已删除"));
        assert!(n.message.contains("disk I/O error"));
    }

    #[test]
    fn test_success_英文文案() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_locale("en");
        let n = Notification::success("schedule.deleted", &[]);
        set_locale("zh-CN");

        assert_eq!(n.severity, Severity::Success);
        assert!(!n.is_error());
        assert_eq!(n.message, "Assignment deleted");
    }
}
