// ==========================================
// 骑手排班系统 - 导入错误
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("找不到导入文件 {0}")]
    FileNotFound(String),

    /// 扩展名不在 xlsx/xls/csv 之列
    #[error("不支持的扩展名 .{0}, 请提供 xlsx/xls/csv 文件")]
    UnsupportedFormat(String),

    #[error("导入文件 {size} 字节, 超过上限 {limit} 字节")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("读取导入文件出错: {0}")]
    FileReadError(String),

    #[error("工作簿无法解析: {0}")]
    ExcelParseError(String),

    #[error("CSV 内容无法解析: {0}")]
    CsvParseError(String),

    /// 表头缺列, 列名按声明顺序给出
    #[error("表头缺少列 [{}]", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

pub type ImportResult<T> = Result<T, ImportError>;
