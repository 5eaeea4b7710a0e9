// ==========================================
// 骑手排班系统 - 主数据导入 API
// ==========================================
// 职责: 表格文件导入骑手 / 门店 / 外部品牌, 并记录 ActionLog
// ==========================================

use crate::api::error::ApiResult;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::importer::{EntityImporter, EntityKind, ImportSummary};
use crate::repository::ActionLogRepository;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

pub struct ImportApi {
    importer: EntityImporter,
    action_log_repo: Arc<ActionLogRepository>,
    actor: String,
}

impl ImportApi {
    pub fn new(
        importer: EntityImporter,
        action_log_repo: Arc<ActionLogRepository>,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            importer,
            action_log_repo,
            actor: actor.into(),
        }
    }

    /// 导入文件
    ///
    /// # 返回
    /// - Ok(ImportSummary): created / updated / skipped
    /// - Err(ImportError): 文件不存在、格式不支持、超过大小上限、缺少必填列
    pub fn import<P: AsRef<Path>>(&self, kind: EntityKind, file_path: P) -> ApiResult<ImportSummary> {
        let path = file_path.as_ref();
        let summary = self.importer.import(kind, path)?;

        let log = ActionLog::now(ActionType::ImportEntities, &self.actor)
            .with_payload(json!({
                "entity": kind,
                "file": path.display().to_string(),
                "created": summary.created,
                "updated": summary.updated,
                "skipped": summary.skipped,
            }))
            .with_detail(format!("import {}", kind));
        self.action_log_repo.insert(&log)?;
        Ok(summary)
    }

    pub fn import_riders<P: AsRef<Path>>(&self, file_path: P) -> ApiResult<ImportSummary> {
        self.import(EntityKind::Riders, file_path)
    }

    pub fn import_branches<P: AsRef<Path>>(&self, file_path: P) -> ApiResult<ImportSummary> {
        self.import(EntityKind::Branches, file_path)
    }

    pub fn import_brands<P: AsRef<Path>>(&self, file_path: P) -> ApiResult<ImportSummary> {
        self.import(EntityKind::Brands, file_path)
    }
}
