// ==========================================
// 骑手排班系统 - 排班会话
// ==========================================
// 职责: 单一会话状态（窗口 / 筛选 / 已加载数据 / 最近通知）
// 生命周期: set_window / set_filters → refresh()
// 红线: 写入后一律重新查询, 不做乐观更新
// 线程: 同步 API 调用一律经 spawn_blocking
// ==========================================

use crate::api::{ApiError, ApiResult, RegistryApi, ScheduleApi};
use crate::app::notification::Notification;
use crate::domain::assignment::{
    AssignmentDetail, AssignmentDraft, AssignmentPatch, DateWindow, ScheduleAssignment,
};
use crate::domain::branch::{Branch, ExternalBrand};
use crate::domain::rider::Rider;
use crate::engine::{ExportReference, FilterEngine, FilterSpec, GenerationOutcome};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, warn};

async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::InternalError(format!("后台任务失败: {}", e)))?
}

pub struct ScheduleSession {
    schedule_api: Arc<ScheduleApi>,
    registry_api: Arc<RegistryApi>,
    window: DateWindow,
    filters: FilterSpec,
    riders: Vec<Rider>,
    branches: Vec<Branch>,
    brands: Vec<ExternalBrand>,
    assignments: Vec<AssignmentDetail>,
    notification: Option<Notification>,
}

impl ScheduleSession {
    pub fn new(
        schedule_api: Arc<ScheduleApi>,
        registry_api: Arc<RegistryApi>,
        window: DateWindow,
    ) -> Self {
        Self {
            schedule_api,
            registry_api,
            window,
            filters: FilterSpec::default(),
            riders: Vec::new(),
            branches: Vec::new(),
            brands: Vec::new(),
            assignments: Vec::new(),
            notification: None,
        }
    }

    // ==========================================
    // 状态访问
    // ==========================================

    pub fn window(&self) -> DateWindow {
        self.window
    }

    pub fn filters(&self) -> &FilterSpec {
        &self.filters
    }

    pub fn riders(&self) -> &[Rider] {
        &self.riders
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn brands(&self) -> &[ExternalBrand] {
        &self.brands
    }

    /// 已加载的全部排班（未筛选）
    pub fn assignments(&self) -> &[AssignmentDetail] {
        &self.assignments
    }

    /// 当前筛选下可见的排班
    pub fn visible(&self) -> Vec<&AssignmentDetail> {
        FilterEngine::apply(&self.filters, &self.assignments)
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn take_notification(&mut self) -> Option<Notification> {
        self.notification.take()
    }

    /// 切换窗口（需随后 refresh）
    pub fn set_window(&mut self, window: DateWindow) {
        self.window = window;
    }

    /// 切换筛选; 筛选在已加载数据上纯计算, 不需要重新查询
    pub fn set_filters(&mut self, filters: FilterSpec) {
        self.filters = filters;
    }

    // ==========================================
    // 刷新
    // ==========================================

    /// 并行加载骑手/门店/品牌与窗口内排班
    pub async fn refresh(&mut self) -> ApiResult<()> {
        let window = self.window;
        let (r1, r2, r3) = (
            self.registry_api.clone(),
            self.registry_api.clone(),
            self.registry_api.clone(),
        );
        let schedule = self.schedule_api.clone();

        let loaded = tokio::try_join!(
            blocking(move || r1.list_riders(false)),
            blocking(move || r2.list_branches()),
            blocking(move || r3.list_brands()),
            blocking(move || schedule.list(window.start, window.end())),
        );

        match loaded {
            Ok((riders, branches, brands, assignments)) => {
                debug!(
                    start = %window.start,
                    days = window.days,
                    assignments = assignments.len(),
                    "会话数据已刷新"
                );
                self.riders = riders;
                self.branches = branches;
                self.brands = brands;
                self.assignments = assignments;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    // ==========================================
    // 写入（写入 → 重新查询）
    // ==========================================

    pub async fn create(&mut self, draft: &AssignmentDraft) -> ApiResult<ScheduleAssignment> {
        let api = self.schedule_api.clone();
        let draft = draft.clone();
        let result = blocking(move || api.create(&draft)).await;
        self.after_write(result, "schedule.created", &[]).await
    }

    pub async fn create_available(
        &mut self,
        rider_id: i64,
        shift_date: NaiveDate,
    ) -> ApiResult<ScheduleAssignment> {
        let api = self.schedule_api.clone();
        let result = blocking(move || api.create_available(rider_id, shift_date)).await;
        self.after_write(result, "schedule.available_created", &[]).await
    }

    pub async fn update(&mut self, id: i64, patch: &AssignmentPatch) -> ApiResult<ScheduleAssignment> {
        let api = self.schedule_api.clone();
        let patch = patch.clone();
        let result = blocking(move || api.update(id, &patch)).await;
        self.after_write(result, "schedule.updated", &[]).await
    }

    pub async fn delete(&mut self, id: i64) -> ApiResult<()> {
        let api = self.schedule_api.clone();
        let result = blocking(move || api.delete(id)).await;
        self.after_write(result, "schedule.deleted", &[]).await
    }

    /// 从当前窗口起始日期生成
    ///
    /// 仓储读写由生成边界放到阻塞线程池, 此处只等待
    pub async fn generate(&mut self, day_count: u32) -> ApiResult<GenerationOutcome> {
        let result = self.schedule_api.generate(self.window.start, day_count).await;
        let (inserted, skipped) = match &result {
            Ok(outcome) => (outcome.inserted.to_string(), outcome.skipped.to_string()),
            Err(_) => (String::new(), String::new()),
        };
        self.after_write(
            result,
            "schedule.generated",
            &[("inserted", &inserted), ("skipped", &skipped)],
        )
        .await
    }

    /// 导出当前窗口（纯计算, 不访问数据库）
    pub fn export(&mut self) -> ApiResult<ExportReference> {
        match self.schedule_api.export(self.window.start, self.window.end()) {
            Ok(reference) => {
                self.notification = Some(Notification::success(
                    "schedule.exported",
                    &[("file_name", &reference.file_name)],
                ));
                Ok(reference)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn after_write<T>(
        &mut self,
        result: ApiResult<T>,
        success_key: &str,
        args: &[(&str, &str)],
    ) -> ApiResult<T> {
        match result {
            Ok(value) => {
                // 写入已提交: 刷新失败不改变写入结果
                let note = match self.refresh().await {
                    Ok(()) => Notification::success(success_key, args),
                    Err(refresh_err) => {
                        warn!(error = %refresh_err, action = success_key, "写入已提交, 刷新视图失败");
                        Notification::stale(success_key, args, &refresh_err)
                    }
                };
                self.notification = Some(note);
                Ok(value)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn fail(&mut self, err: ApiError) -> ApiError {
        self.notification = Some(Notification::from_error(&err));
        err
    }
}
