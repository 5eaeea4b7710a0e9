// ==========================================
// 骑手排班系统 - 排班 API
// ==========================================
// 职责: 排班查询 / 新建 / 更新 / 删除 / 生成 / 导出
// 红线: 所有写入经由冲突守卫与覆写控制器
// 红线: 所有成功写入记录 ActionLog
// ==========================================

use crate::api::error::{validate_date_range, ApiError, ApiResult};
use crate::config::ScheduleConfig;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::assignment::{
    AssignmentDetail, AssignmentDraft, AssignmentPatch, ScheduleAssignment,
};
use crate::domain::rider::Rider;
use crate::engine::{
    ConflictGuard, CreationOrigin, ExportBoundary, ExportReference, FilterEngine, FilterSpec,
    GenerationBoundary, GenerationOutcome, OverrideController, ShiftGenerator,
};
use crate::repository::{
    ActionLogRepository, AssignmentRepository, BranchRepository, BrandRepository,
    RepositoryError, RiderRepository,
};
use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

// ==========================================
// ScheduleApi - 排班 API
// ==========================================
pub struct ScheduleApi {
    assignment_repo: Arc<AssignmentRepository>,
    rider_repo: Arc<RiderRepository>,
    branch_repo: Arc<BranchRepository>,
    brand_repo: Arc<BrandRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    generation: GenerationBoundary,
    export: ExportBoundary,
    actor: String,
}

impl ScheduleApi {
    /// 创建 ScheduleApi
    ///
    /// # 参数
    /// - `generator`: 生成服务实现
    /// - `config`: 显式传入的排班配置（超时、窗口上限、导出地址、操作人）
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        assignment_repo: Arc<AssignmentRepository>,
        rider_repo: Arc<RiderRepository>,
        branch_repo: Arc<BranchRepository>,
        brand_repo: Arc<BrandRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        generator: Arc<dyn ShiftGenerator>,
        config: &ScheduleConfig,
    ) -> Self {
        let generation = GenerationBoundary::new(
            generator,
            assignment_repo.clone(),
            rider_repo.clone(),
            branch_repo.clone(),
            brand_repo.clone(),
            config.generation_timeout_ms,
            config.generation_max_days,
        );
        Self {
            assignment_repo,
            rider_repo,
            branch_repo,
            brand_repo,
            action_log_repo,
            generation,
            export: ExportBoundary::new(config.export_base_url.clone()),
            actor: config.operator_name.clone(),
        }
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 查询日期区间（含两端）内的排班
    ///
    /// # 返回
    /// - Ok: 按日期、骑手姓名排序, 已解析骑手/门店/品牌
    /// - Err(InvalidDateRange): end_date < start_date
    pub fn list(&self, start_date: NaiveDate, end_date: NaiveDate) -> ApiResult<Vec<AssignmentDetail>> {
        validate_date_range(start_date, end_date)?;
        Ok(self.assignment_repo.list_details(start_date, end_date)?)
    }

    /// 查询并筛选
    pub fn list_filtered(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        filter: &FilterSpec,
    ) -> ApiResult<Vec<AssignmentDetail>> {
        let details = self.list(start_date, end_date)?;
        Ok(FilterEngine::apply_owned(filter, &details))
    }

    pub fn get(&self, id: i64) -> ApiResult<ScheduleAssignment> {
        self.assignment_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::not_found("ScheduleAssignment", id))
    }

    /// 快速创建"待命"的候选骑手（在岗的工作日合同/周末合同/外部合作骑手）
    pub fn available_pool(&self) -> ApiResult<Vec<Rider>> {
        Ok(self
            .rider_repo
            .list(true)?
            .into_iter()
            .filter(|r| r.rider_type.in_available_pool())
            .collect())
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 新建排班（人工）
    ///
    /// # 返回
    /// - Ok: 落库记录, manual_override 恒为 true
    /// - Err(AssignmentConflict): 该骑手该日期已有排班
    /// - Err(ReferenceError): 骑手/门店/品牌不存在
    /// - Err(ValidationError): 时间窗非法
    #[instrument(skip(self, draft), fields(rider_id = draft.rider_id, shift_date = %draft.shift_date))]
    pub fn create(&self, draft: &AssignmentDraft) -> ApiResult<ScheduleAssignment> {
        self.check_rider(draft.rider_id)?;
        self.check_branch(draft.branch_id)?;
        self.check_brand(draft.brand_id)?;
        OverrideController::validate_draft(draft)
            .map_err(|e| ApiError::ValidationError(e.to_string()))?;

        if draft.manual_override == Some(false) {
            debug!("人工新建忽略 manual_override=false");
        }
        let manual = OverrideController::initial_state(CreationOrigin::Manual).is_manual();

        let created = self
            .assignment_repo
            .insert_if_absent(draft, manual, ConflictGuard::find_existing)
            .map_err(|e| self.reference_failure(e, Some(draft.rider_id), draft.branch_id, draft.brand_id))?
            .into_inserted(draft)
            .map_err(|e| {
                warn!(error = %e, "排班冲突, 拒绝新建");
                ApiError::from(e)
            })?;

        self.record(
            ActionLog::now(ActionType::CreateAssignment, &self.actor)
                .with_assignment(created.id, created.shift_date)
                .with_payload(json!({
                    "rider_id": created.rider_id,
                    "shift_type": created.shift_type,
                })),
        )?;
        info!(assignment_id = created.id, shift_type = %created.shift_type, "排班已创建");
        Ok(created)
    }

    /// 快速创建"待命"排班
    pub fn create_available(&self, rider_id: i64, shift_date: NaiveDate) -> ApiResult<ScheduleAssignment> {
        self.create(&OverrideController::available_draft(rider_id, shift_date))
    }

    /// 局部更新排班
    ///
    /// # 返回
    /// - Ok: 新记录, manual_override 恒为 true
    /// - Err(NotFound): 排班不存在
    #[instrument(skip(self, patch), fields(assignment_id = id))]
    pub fn update(&self, id: i64, patch: &AssignmentPatch) -> ApiResult<ScheduleAssignment> {
        if let Some(branch_id) = patch.branch_id {
            self.check_branch(branch_id)?;
        }
        if let Some(brand_id) = patch.brand_id {
            self.check_brand(brand_id)?;
        }
        if patch.manual_override == Some(false) {
            debug!("更新忽略 manual_override=false");
        }

        let updated = self
            .assignment_repo
            .update_with(id, |current| {
                OverrideController::apply_patch(current, patch).map_err(Into::into)
            })
            .map_err(|e| {
                self.reference_failure(e, None, patch.branch_id.flatten(), patch.brand_id.flatten())
            })?;

        self.record(
            ActionLog::now(ActionType::UpdateAssignment, &self.actor)
                .with_assignment(updated.id, updated.shift_date)
                .with_payload(json!({
                    "shift_type": updated.shift_type,
                    "field_changes": patch.has_field_changes(),
                })),
        )?;
        info!(rider_id = updated.rider_id, shift_date = %updated.shift_date, "排班已更新");
        Ok(updated)
    }

    /// 删除排班
    ///
    /// 不幂等: 第二次删除返回 NotFound
    #[instrument(skip(self), fields(assignment_id = id))]
    pub fn delete(&self, id: i64) -> ApiResult<()> {
        let removed = self.assignment_repo.delete(id)?;
        self.record(
            ActionLog::now(ActionType::DeleteAssignment, &self.actor)
                .with_assignment(removed.id, removed.shift_date)
                .with_payload(json!({
                    "rider_id": removed.rider_id,
                    "shift_type": removed.shift_type,
                    "manual_override": removed.manual_override,
                })),
        )?;
        info!(rider_id = removed.rider_id, shift_date = %removed.shift_date, "排班已删除");
        Ok(())
    }

    // ==========================================
    // 生成 / 导出
    // ==========================================

    /// 生成并对账
    ///
    /// # 返回
    /// - Ok: 窗口内全部排班（已有 + 新写入）
    /// - Err(UpstreamError): 生成服务失败/超时/数据异常, 未写入任何数据
    /// - Err(ValidationError): day_count 越界
    pub async fn generate(&self, start_date: NaiveDate, day_count: u32) -> ApiResult<GenerationOutcome> {
        let outcome = self.generation.run(start_date, day_count).await?;

        let log = ActionLog::now(ActionType::GenerateSchedule, &self.actor)
            .with_range(outcome.window.start, outcome.window.end())
            .with_payload(json!({
                "day_count": day_count,
                "inserted": outcome.inserted,
                "skipped": outcome.skipped,
            }));
        let action_log_repo = self.action_log_repo.clone();
        tokio::task::spawn_blocking(move || action_log_repo.insert(&log))
            .await
            .map_err(|e| ApiError::InternalError(format!("操作日志写入任务失败: {}", e)))??;
        Ok(outcome)
    }

    /// 构造导出报表引用
    pub fn export(&self, start_date: NaiveDate, end_date: NaiveDate) -> ApiResult<ExportReference> {
        Ok(self.export.reference(start_date, end_date)?)
    }

    /// 排班的操作历史
    pub fn history(&self, assignment_id: i64) -> ApiResult<Vec<ActionLog>> {
        Ok(self.action_log_repo.list_by_assignment(assignment_id)?)
    }

    pub fn recent_actions(&self, limit: u32) -> ApiResult<Vec<ActionLog>> {
        Ok(self.action_log_repo.list_recent(limit)?)
    }

    // ==========================================
    // 内部工具
    // ==========================================

    fn record(&self, log: ActionLog) -> ApiResult<()> {
        self.action_log_repo.insert(&log)?;
        Ok(())
    }

    /// 写入时的外键失败归为引用错误
    ///
    /// 引用在前置检查之后才被删除; 重新检查定位缺失的引用,
    /// 定位不到时（删除随语句回滚）按 门店 → 品牌 → 骑手 顺序归因
    fn reference_failure(
        &self,
        err: RepositoryError,
        rider_id: Option<i64>,
        branch_id: Option<i64>,
        brand_id: Option<i64>,
    ) -> ApiError {
        if !matches!(err, RepositoryError::ForeignKeyViolation(_)) {
            return err.into();
        }
        warn!(error = %err, "排班写入外键失败");

        let located = rider_id
            .map_or(Ok(()), |id| self.check_rider(id))
            .and_then(|_| self.check_branch(branch_id))
            .and_then(|_| self.check_brand(brand_id));
        if let Err(e @ ApiError::ReferenceError { .. }) = located {
            return e;
        }
        match (branch_id, brand_id, rider_id) {
            (Some(id), _, _) => ApiError::reference("Branch", id),
            (None, Some(id), _) => ApiError::reference("ExternalBrand", id),
            (None, None, Some(id)) => ApiError::reference("Rider", id),
            (None, None, None) => err.into(),
        }
    }

    fn check_rider(&self, rider_id: i64) -> ApiResult<()> {
        match self.rider_repo.find_by_id(rider_id)? {
            Some(_) => Ok(()),
            None => Err(ApiError::reference("Rider", rider_id)),
        }
    }

    fn check_branch(&self, branch_id: Option<i64>) -> ApiResult<()> {
        if let Some(id) = branch_id {
            if self.branch_repo.find_by_id(id)?.is_none() {
                return Err(ApiError::reference("Branch", id));
            }
        }
        Ok(())
    }

    fn check_brand(&self, brand_id: Option<i64>) -> ApiResult<()> {
        if let Some(id) = brand_id {
            if self.brand_repo.find_by_id(id)?.is_none() {
                return Err(ApiError::reference("ExternalBrand", id));
            }
        }
        Ok(())
    }
}
