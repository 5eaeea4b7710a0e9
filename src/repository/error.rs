// ==========================================
// 骑手排班系统 - 仓储层错误类型
// ==========================================
// 约束类错误按 SQLite 扩展错误码归类, 不解析消息文本
// ==========================================

use chrono::NaiveDate;
use rusqlite::ffi;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 同一骑手同一日期已存在排班
    #[error("骑手 {rider_id} 在 {shift_date} 已有排班 (existing_id={existing_id:?})")]
    DuplicateAssignment {
        rider_id: i64,
        shift_date: NaiveDate,
        existing_id: Option<i64>,
    },

    #[error("{entity} 不存在: id={id}")]
    NotFound { entity: String, id: String },

    #[error("无法打开数据库: {0}")]
    DatabaseConnectionError(String),

    #[error("连接互斥锁已中毒: {0}")]
    LockError(String),

    #[error("事务执行失败: {0}")]
    DatabaseTransactionError(String),

    #[error("SQL 执行失败: {0}")]
    DatabaseQueryError(String),

    #[error("重复记录: {0}")]
    UniqueConstraintViolation(String),

    #[error("记录仍被引用或引用不存在: {0}")]
    ForeignKeyViolation(String),

    #[error("{0}")]
    ValidationError(String),

    /// 库内字段无法还原为领域值（枚举/日期格式损坏等）
    #[error("字段 {field} 取值非法: {message}")]
    FieldValueError { field: String, message: String },

    #[error("仓储内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepositoryError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        RepositoryError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    fn from_sqlite_failure(code: ffi::Error, detail: String) -> Self {
        match code.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                RepositoryError::UniqueConstraintViolation(detail)
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => RepositoryError::ForeignKeyViolation(detail),
            _ => RepositoryError::DatabaseQueryError(detail),
        }
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, msg) => {
                let detail = msg.unwrap_or_else(|| code.to_string());
                RepositoryError::from_sqlite_failure(code, detail)
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::not_found("Row", "?"),
            other => RepositoryError::DatabaseQueryError(other.to_string()),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
