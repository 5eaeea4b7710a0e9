// ==========================================
// 骑手排班系统 - 主数据导入器
// ==========================================
// 职责: 表格文件 -> 骑手 / 门店 / 外部品牌 (upsert)
// 流程: 解析 → 必填列检查 → 逐行映射 → upsert → 计数
// ==========================================
// upsert 键: 骑手 full_name, 门店 code, 品牌 name
// 缺少必填值或取值无法识别的行跳过并记 warn
// ==========================================

use crate::domain::branch::{BranchDraft, BranchPatch};
use crate::domain::rider::{RiderDraft, RiderPatch};
use crate::domain::types::RiderType;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{ParsedSheet, RawRecord, UniversalFileParser};
use crate::repository::{BranchRepository, BrandRepository, RiderRepository};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

// ==========================================
// 列名常量（历史表格格式）
// ==========================================
pub mod columns {
    // 骑手
    pub const NOMBRE: &str = "NOMBRE";
    pub const TIPO: &str = "TIPO";
    pub const SUCURSAL: &str = "SUCURSAL";
    pub const CC: &str = "CC";
    pub const OBSERVACION: &str = "OBSERVACION";

    // 门店
    pub const CODIGO: &str = "CODIGO";
    pub const ZONA: &str = "ZONA";
    pub const DIRECCION: &str = "DIRECCION";

    // 品牌
    pub const MARCA: &str = "MARCA";
}

/// 导入对象
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Riders,
    Branches,
    Brands,
}

impl EntityKind {
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Riders => &[columns::NOMBRE, columns::TIPO],
            EntityKind::Branches => &[columns::CODIGO, columns::NOMBRE],
            EntityKind::Brands => &[columns::MARCA],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Riders => "riders",
            EntityKind::Branches => "branches",
            EntityKind::Brands => "brands",
        };
        write!(f, "{}", s)
    }
}

/// 导入统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub entity: EntityKind,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl ImportSummary {
    fn new(entity: EntityKind) -> Self {
        Self {
            entity,
            created: 0,
            updated: 0,
            skipped: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.updated + self.skipped
    }
}

enum RowOutcome {
    Created,
    Updated,
    Skipped(String),
}

fn value<'a>(row: &'a RawRecord, column: &str) -> Option<&'a str> {
    row.get(column).map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// 检查必填列（按表头行判断, 与是否有数据行无关）
fn check_columns(kind: EntityKind, sheet: &ParsedSheet) -> ImportResult<()> {
    let missing: Vec<String> = kind
        .required_columns()
        .iter()
        .filter(|col| !sheet.has_column(**col))
        .map(|col| col.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ImportError::MissingColumns(missing))
    }
}

// ==========================================
// EntityImporter
// ==========================================
pub struct EntityImporter {
    parser: UniversalFileParser,
    rider_repo: Arc<RiderRepository>,
    branch_repo: Arc<BranchRepository>,
    brand_repo: Arc<BrandRepository>,
}

impl EntityImporter {
    pub fn new(
        rider_repo: Arc<RiderRepository>,
        branch_repo: Arc<BranchRepository>,
        brand_repo: Arc<BrandRepository>,
    ) -> Self {
        Self {
            parser: UniversalFileParser::new(),
            rider_repo,
            branch_repo,
            brand_repo,
        }
    }

    /// 导入文件
    ///
    /// # 参数
    /// - `kind`: 导入对象
    /// - `file_path`: .xlsx / .xls / .csv
    ///
    /// # 返回
    /// - Ok(ImportSummary): 新建/更新/跳过计数
    /// - Err: 文件错误、缺少必填列、数据库错误（已处理的行保持落库）
    #[instrument(skip(self, file_path), fields(entity = %kind))]
    pub fn import<P: AsRef<Path>>(&self, kind: EntityKind, file_path: P) -> ImportResult<ImportSummary> {
        let path = file_path.as_ref();
        info!(file_path = %path.display(), "开始导入主数据");

        // === 步骤 1: 解析文件 ===
        let sheet = self.parser.parse(path)?;
        debug!(total_rows = sheet.records.len(), headers = ?sheet.headers, "文件解析完成");

        // === 步骤 2: 必填列检查 ===
        check_columns(kind, &sheet)?;

        // === 步骤 3: 逐行 upsert ===
        let mut summary = ImportSummary::new(kind);
        for (idx, row) in sheet.records.iter().enumerate() {
            // 行号按表格习惯: 表头为第 1 行
            let row_no = idx + 2;
            let outcome = match kind {
                EntityKind::Riders => self.upsert_rider(row)?,
                EntityKind::Branches => self.upsert_branch(row)?,
                EntityKind::Brands => self.upsert_brand(row)?,
            };
            match outcome {
                RowOutcome::Created => summary.created += 1,
                RowOutcome::Updated => summary.updated += 1,
                RowOutcome::Skipped(reason) => {
                    warn!(row = row_no, %reason, "跳过导入行");
                    summary.skipped += 1;
                }
            }
        }

        info!(
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped,
            "主数据导入完成"
        );
        Ok(summary)
    }

    fn upsert_rider(&self, row: &RawRecord) -> ImportResult<RowOutcome> {
        let Some(full_name) = value(row, columns::NOMBRE) else {
            return Ok(RowOutcome::Skipped("NOMBRE 为空".to_string()));
        };
        let Some(raw_type) = value(row, columns::TIPO) else {
            return Ok(RowOutcome::Skipped(format!("{}: TIPO 为空", full_name)));
        };
        let Some(rider_type) = RiderType::from_code(raw_type) else {
            return Ok(RowOutcome::Skipped(format!(
                "{}: 无法识别的骑手类型 '{}'",
                full_name, raw_type
            )));
        };

        // 未知门店代码不阻断导入, 归属门店置空; 列为空时不改动
        let home_branch_id = match value(row, columns::SUCURSAL) {
            Some(code) => {
                let found = self.branch_repo.find_by_code(code)?.map(|b| b.id);
                if found.is_none() {
                    warn!(rider = full_name, branch_code = code, "门店代码不存在, 归属门店置空");
                }
                Some(found)
            }
            None => None,
        };
        let identification = value(row, columns::CC).map(str::to_string);
        let note = value(row, columns::OBSERVACION).map(str::to_string);

        match self.rider_repo.find_by_full_name(full_name)? {
            Some(existing) => {
                // 重新导入即恢复在岗
                let patch = RiderPatch {
                    rider_type: Some(rider_type),
                    active: Some(true),
                    identification: identification.map(Some),
                    home_branch_id,
                    note: note.map(Some),
                    ..RiderPatch::default()
                };
                self.rider_repo.update(existing.id, &patch)?;
                Ok(RowOutcome::Updated)
            }
            None => {
                let draft = RiderDraft {
                    identification,
                    home_branch_id: home_branch_id.flatten(),
                    note,
                    ..RiderDraft::new(full_name, rider_type)
                };
                self.rider_repo.create(&draft)?;
                Ok(RowOutcome::Created)
            }
        }
    }

    fn upsert_branch(&self, row: &RawRecord) -> ImportResult<RowOutcome> {
        let Some(code) = value(row, columns::CODIGO) else {
            return Ok(RowOutcome::Skipped("CODIGO 为空".to_string()));
        };
        let Some(name) = value(row, columns::NOMBRE) else {
            return Ok(RowOutcome::Skipped(format!("{}: NOMBRE 为空", code)));
        };
        let zone = value(row, columns::ZONA).map(str::to_string);
        let address = value(row, columns::DIRECCION).map(str::to_string);

        match self.branch_repo.find_by_code(code)? {
            Some(existing) => {
                let patch = BranchPatch {
                    name: Some(name.to_string()),
                    zone: zone.map(Some),
                    address: address.map(Some),
                    ..BranchPatch::default()
                };
                self.branch_repo.update(existing.id, &patch)?;
                Ok(RowOutcome::Updated)
            }
            None => {
                self.branch_repo.create(&BranchDraft {
                    code: code.to_string(),
                    name: name.to_string(),
                    zone,
                    address,
                })?;
                Ok(RowOutcome::Created)
            }
        }
    }

    /// 已存在的品牌计为 updated（无字段变化）
    fn upsert_brand(&self, row: &RawRecord) -> ImportResult<RowOutcome> {
        let Some(name) = value(row, columns::MARCA) else {
            return Ok(RowOutcome::Skipped("MARCA 为空".to_string()));
        };
        match self.brand_repo.find_by_name(name)? {
            Some(_) => Ok(RowOutcome::Updated),
            None => {
                self.brand_repo.create(name)?;
                Ok(RowOutcome::Created)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn sheet(headers: &[&str], records: Vec<RawRecord>) -> ParsedSheet {
        ParsedSheet {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            records,
        }
    }

    #[test]
    fn test_check_columns_缺少必填列() {
        let s = sheet(&["NOMBRE"], vec![row(&[("NOMBRE", "Ana")])]);
        let err = check_columns(EntityKind::Riders, &s).unwrap_err();
        assert!(matches!(err, ImportError::MissingColumns(ref cols) if cols == &vec!["TIPO".to_string()]));

        assert!(check_columns(EntityKind::Brands, &sheet(&["MARCA"], Vec::new())).is_ok());
        assert!(check_columns(EntityKind::Brands, &sheet(&["MARCA"], vec![row(&[("MARCA", "Rappi")])])).is_ok());
    }

    #[test]
    fn test_check_columns_仅表头也检查() {
        let err = check_columns(EntityKind::Riders, &sheet(&["FOO", "BAR"], Vec::new())).unwrap_err();
        assert!(matches!(
            err,
            ImportError::MissingColumns(ref cols) if cols == &vec!["NOMBRE".to_string(), "TIPO".to_string()]
        ));
    }

    #[test]
    fn test_value_忽略空白() {
        let r = row(&[("CC", "  "), ("ZONA", " Norte ")]);
        assert_eq!(value(&r, "CC"), None);
        assert_eq!(value(&r, "ZONA"), Some("Norte"));
        assert_eq!(value(&r, "MISSING"), None);
    }
}
