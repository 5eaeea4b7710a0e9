// ==========================================
// 骑手排班系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换下层错误为可区分的业务错误
// 约束: 每个变体有稳定的错误码, 调用方据此区分冲突与一般失败
// ==========================================

use crate::engine::export::ExportError;
use crate::engine::generator::GenerationError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入错误
    // ==========================================
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("日期区间无效: end_date={end} 早于 start_date={start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    // ==========================================
    // 排班约束错误
    // ==========================================
    /// 同一骑手同一日期已有排班
    #[error("排班冲突: rider_id={rider_id} 在 {shift_date} 已有排班")]
    AssignmentConflict {
        rider_id: i64,
        shift_date: NaiveDate,
        existing_id: Option<i64>,
    },

    #[error("资源未找到: {entity}(id={id})")]
    NotFound { entity: String, id: String },

    /// 引用的骑手/门店/品牌不存在
    #[error("引用无效: {entity}(id={id}) 不存在")]
    ReferenceError { entity: String, id: i64 },

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 外部服务错误
    // ==========================================
    #[error("外部服务失败: {0}")]
    UpstreamError(String),

    #[error("文件导入失败: {0}")]
    ImportError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        ApiError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn reference(entity: &str, id: i64) -> Self {
        ApiError::ReferenceError {
            entity: entity.to_string(),
            id,
        }
    }

    /// 稳定错误码
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            ApiError::AssignmentConflict { .. } => "ASSIGNMENT_CONFLICT",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::ReferenceError { .. } => "REFERENCE_ERROR",
            ApiError::BusinessRuleViolation(_) => "BUSINESS_RULE_VIOLATION",
            ApiError::UpstreamError(_) => "UPSTREAM_ERROR",
            ApiError::ImportError(_) => "IMPORT_ERROR",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::DatabaseConnectionError(_) => "DATABASE_CONNECTION_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::Other(_) => "OTHER_ERROR",
        }
    }

    /// 结构化详情（可选）
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::AssignmentConflict {
                rider_id,
                shift_date,
                existing_id,
            } => Some(serde_json::json!({
                "rider_id": rider_id,
                "shift_date": shift_date,
                "existing_id": existing_id,
            })),
            ApiError::InvalidDateRange { start, end } => Some(serde_json::json!({
                "start_date": start,
                "end_date": end,
            })),
            ApiError::NotFound { entity, id } => Some(serde_json::json!({
                "entity": entity,
                "id": id,
            })),
            ApiError::ReferenceError { entity, id } => Some(serde_json::json!({
                "entity": entity,
                "id": id,
            })),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::AssignmentConflict { .. })
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }
}

/// 错误响应（CLI / 调用方输出）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// 错误消息
    pub message: String,

    /// 详细信息（可选）
    pub details: Option<serde_json::Value>,
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateAssignment {
                rider_id,
                shift_date,
                existing_id,
            } => ApiError::AssignmentConflict {
                rider_id,
                shift_date,
                existing_id,
            },

            // 数据库错误
            RepositoryError::NotFound { entity, id } => ApiError::NotFound { entity, id },
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseError(format!("事务失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }

            // 数据质量错误
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::ValidationError(format!("字段{}错误: {}", field, message))
            }

            // 通用错误
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// 生成服务失败 / 超时 / 数据异常 统一为 UpstreamError
impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::InvalidRequest(msg) => ApiError::ValidationError(msg),
            GenerationError::Repository(e) => e.into(),
            other @ (GenerationError::Timeout { .. }
            | GenerationError::ServiceUnavailable(_)
            | GenerationError::MalformedOutput(_)) => ApiError::UpstreamError(other.to_string()),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Repository(e) => e.into(),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::InvalidRange { start, end } => ApiError::InvalidDateRange { start, end },
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

/// 校验日期区间（含两端）
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> ApiResult<()> {
    if end < start {
        return Err(ApiError::InvalidDateRange { start, end });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[test]
    fn test_repository_error_conversion() {
        let api_err: ApiError = RepositoryError::not_found("ScheduleAssignment", 42).into();
        match &api_err {
            ApiError::NotFound { entity, id } => {
                assert_eq!(entity, "ScheduleAssignment");
                assert_eq!(id, "42");
            }
            _ => panic!("Expected NotFound"),
        }
        assert_eq!(api_err.code(), "NOT_FOUND");

        let api_err: ApiError = RepositoryError::DuplicateAssignment {
            rider_id: 1,
            shift_date: d(1),
            existing_id: Some(9),
        }
        .into();
        assert!(api_err.is_conflict());
        assert_eq!(api_err.details().unwrap()["existing_id"], 9);
    }

    #[test]
    fn test_generation_error_conversion() {
        let api_err: ApiError = GenerationError::Timeout { timeout_ms: 50 }.into();
        assert_eq!(api_err.code(), "UPSTREAM_ERROR");

        let api_err: ApiError = GenerationError::InvalidRequest("day_count".to_string()).into();
        assert_eq!(api_err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_error_codes_distinct() {
        let errors = vec![
            ApiError::ValidationError("x".to_string()),
            ApiError::InvalidDateRange { start: d(2), end: d(1) },
            ApiError::AssignmentConflict {
                rider_id: 1,
                shift_date: d(1),
                existing_id: None,
            },
            ApiError::not_found("Rider", 1),
            ApiError::reference("Branch", 1),
            ApiError::UpstreamError("x".to_string()),
        ];
        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_validate_date_range() {
        assert!(validate_date_range(d(1), d(1)).is_ok());
        let err = validate_date_range(d(7), d(1)).unwrap_err();
        assert_eq!(err.code(), "INVALID_DATE_RANGE");
        assert_eq!(err.to_response().code, "INVALID_DATE_RANGE");
    }
}
