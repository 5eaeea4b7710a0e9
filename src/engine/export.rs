// ==========================================
// 骑手排班系统 - 导出边界 (Export Boundary)
// ==========================================
// 职责: 构造覆盖闭区间 [start_date, end_date] 的报表引用
// 红线: 不做本地计算, 不渲染报表
// ==========================================

use crate::db::DATE_FORMAT;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 报表接口路径
pub const EXPORT_PATH: &str = "/api/schedule/export";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("日期区间无效: end_date {end} 早于 start_date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// 报表引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReference {
    pub url: String,
    pub file_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub struct ExportBoundary {
    base_url: String,
}

impl ExportBoundary {
    /// # 参数
    /// - `base_url`: 报表服务地址, 末尾斜杠会被去掉
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn reference(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<ExportReference, ExportError> {
        if end_date < start_date {
            return Err(ExportError::InvalidRange {
                start: start_date,
                end: end_date,
            });
        }

        let start = start_date.format(DATE_FORMAT).to_string();
        let end = end_date.format(DATE_FORMAT).to_string();
        Ok(ExportReference {
            url: format!(
                "{}{}?start_date={}&end_date={}",
                self.base_url, EXPORT_PATH, start, end
            ),
            file_name: format!("programacion_{}_{}.xlsx", start, end),
            start_date,
            end_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    #[test]
    fn test_reference_构造地址与文件名() {
        let boundary = ExportBoundary::new("http://reports.local:8000/");
        let reference = boundary.reference(d(6, 1), d(6, 7)).unwrap();

        assert_eq!(
            reference.url,
            "http://reports.local:8000/api/schedule/export?start_date=2024-06-01&end_date=2024-06-07"
        );
        assert_eq!(reference.file_name, "programacion_2024-06-01_2024-06-07.xlsx");
        assert_eq!(reference.start_date, d(6, 1));
        assert_eq!(reference.end_date, d(6, 7));
    }

    #[test]
    fn test_reference_单日区间() {
        let boundary = ExportBoundary::new("http://localhost:8000");
        let reference = boundary.reference(d(6, 1), d(6, 1)).unwrap();
        assert!(reference.url.ends_with("start_date=2024-06-01&end_date=2024-06-01"));
    }

    #[test]
    fn test_reference_结束早于开始() {
        let boundary = ExportBoundary::new("http://localhost:8000");
        assert_eq!(
            boundary.reference(d(6, 7), d(6, 1)).unwrap_err(),
            ExportError::InvalidRange {
                start: d(6, 7),
                end: d(6, 1)
            }
        );
    }
}
