// ==========================================
// 骑手排班系统 - 生成边界 (Generation Boundary)
// ==========================================
// 职责: 调用生成服务并将候选对账写入排班仓储
// 红线: 生成永远不覆盖已有排班（无论人工或自动）
// 红线: 生成服务失败/超时/数据异常时, 库内数据保持不变
// ==========================================
// 并发: 不对整个批次持锁, 每个候选独立 insert-if-absent;
//       批次中途的数据库故障不回滚已写入的候选
// 线程: 仓储读写在阻塞线程池执行, 只有生成服务调用在异步任务上等待
// ==========================================

use crate::domain::assignment::{AssignmentDetail, AssignmentDraft, DateWindow};
use crate::domain::rider::Rider;
use crate::engine::conflict_guard::ConflictGuard;
use crate::engine::generator::{GenerationError, GenerationRequest, ShiftGenerator};
use crate::engine::override_controller::{CreationOrigin, OverrideController};
use crate::repository::error::RepositoryError;
use crate::repository::{
    AssignmentRepository, BranchRepository, BrandRepository, InsertOutcome, RiderRepository,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// 单次生成允许的最大天数
pub const MAX_GENERATION_DAYS: u32 = 31;

// ==========================================
// GenerationOutcome - 生成结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub window: DateWindow,
    /// 窗口内全部排班（已有 + 新写入）
    pub assignments: Vec<AssignmentDetail>,
    pub inserted: usize,
    /// 因已有排班而丢弃的候选数
    pub skipped: usize,
}

// ==========================================
// GenerationStore - 生成涉及的仓储（同步, 在阻塞线程池上执行）
// ==========================================
#[derive(Clone)]
struct GenerationStore {
    assignment_repo: Arc<AssignmentRepository>,
    rider_repo: Arc<RiderRepository>,
    branch_repo: Arc<BranchRepository>,
    brand_repo: Arc<BrandRepository>,
}

/// 在阻塞线程池执行同步仓储操作
async fn offload<T, F>(f: F) -> Result<T, GenerationError>
where
    F: FnOnce() -> Result<T, GenerationError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        GenerationError::Repository(RepositoryError::InternalError(format!(
            "生成后台任务失败: {}",
            e
        )))
    })?
}

// ==========================================
// GenerationBoundary
// ==========================================
pub struct GenerationBoundary {
    generator: Arc<dyn ShiftGenerator>,
    store: GenerationStore,
    timeout: Duration,
    max_days: u32,
}

impl GenerationBoundary {
    /// # 参数
    /// - `timeout_ms`: 单次生成服务调用上限
    /// - `max_days`: 窗口上限, 取值收敛到 1..=31
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        generator: Arc<dyn ShiftGenerator>,
        assignment_repo: Arc<AssignmentRepository>,
        rider_repo: Arc<RiderRepository>,
        branch_repo: Arc<BranchRepository>,
        brand_repo: Arc<BrandRepository>,
        timeout_ms: u64,
        max_days: u32,
    ) -> Self {
        Self {
            generator,
            store: GenerationStore {
                assignment_repo,
                rider_repo,
                branch_repo,
                brand_repo,
            },
            timeout: Duration::from_millis(timeout_ms),
            max_days: max_days.clamp(1, MAX_GENERATION_DAYS),
        }
    }

    /// 生成并对账
    ///
    /// # 参数
    /// - `start_date`: 窗口起始日期
    /// - `day_count`: 天数 (1..=max_days)
    ///
    /// # 返回
    /// - Ok(GenerationOutcome): 窗口内全部排班与写入统计
    /// - Err(InvalidRequest): 天数越界, 或窗口超出日历范围
    /// - Err(Timeout / ServiceUnavailable / MalformedOutput): 生成服务失败, 未写入任何数据
    #[instrument(skip(self), fields(start_date = %start_date, day_count = %day_count))]
    pub async fn run(
        &self,
        start_date: NaiveDate,
        day_count: u32,
    ) -> Result<GenerationOutcome, GenerationError> {
        if day_count == 0 || day_count > self.max_days {
            return Err(GenerationError::InvalidRequest(format!(
                "day_count 必须在 1..={} 之间, 实际为 {}",
                self.max_days, day_count
            )));
        }
        let window = DateWindow::checked(start_date, day_count).ok_or_else(|| {
            GenerationError::InvalidRequest(format!(
                "{} 起 {} 天超出日历范围",
                start_date, day_count
            ))
        })?;

        let rider_repo = self.store.rider_repo.clone();
        let riders = offload(move || Ok(rider_repo.list(true)?)).await?;
        let request = GenerationRequest {
            window,
            riders: riders.clone(),
        };

        // ==========================================
        // 1. 调用生成服务（有界）
        // ==========================================
        let candidates = match tokio::time::timeout(self.timeout, self.generator.generate(&request)).await {
            Ok(Ok(candidates)) => candidates,
            Ok(Err(e)) => {
                error!(error = %e, "生成服务调用失败");
                return Err(e);
            }
            Err(_) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                error!(timeout_ms, "生成服务调用超时");
                return Err(GenerationError::Timeout { timeout_ms });
            }
        };
        debug!(candidates = candidates.len(), "生成服务返回候选");

        // ==========================================
        // 2. 整批校验 + 3. 逐条 insert-if-absent
        // ==========================================
        let store = self.store.clone();
        let span = tracing::Span::current();
        offload(move || {
            let _entered = span.enter();
            if let Err(e) = store.validate_candidates(&window, &riders, &candidates) {
                error!(error = %e, "生成候选校验失败, 本批次不写入");
                return Err(e);
            }
            store.reconcile(window, &candidates)
        })
        .await
    }
}

impl GenerationStore {
    fn reconcile(
        &self,
        window: DateWindow,
        candidates: &[AssignmentDraft],
    ) -> Result<GenerationOutcome, GenerationError> {
        let manual = OverrideController::initial_state(CreationOrigin::Generation).is_manual();
        let mut inserted = 0usize;
        let mut skipped = 0usize;
        for candidate in candidates {
            match self
                .assignment_repo
                .insert_if_absent(candidate, manual, ConflictGuard::find_existing)?
            {
                InsertOutcome::Inserted(_) => inserted += 1,
                InsertOutcome::Conflict { existing_id } => {
                    debug!(
                        rider_id = candidate.rider_id,
                        shift_date = %candidate.shift_date,
                        existing_id = ?existing_id,
                        "候选与已有排班冲突, 丢弃"
                    );
                    skipped += 1;
                }
            }
        }

        let assignments = self
            .assignment_repo
            .list_details(window.start, window.end())?;

        info!(inserted, skipped, total = assignments.len(), "排班生成完成");

        Ok(GenerationOutcome {
            window,
            assignments,
            inserted,
            skipped,
        })
    }

    /// 校验候选集
    ///
    /// # 规则
    /// - 日期落在窗口内
    /// - 骑手为本次请求中的在岗骑手
    /// - (rider_id, shift_date) 不重复
    /// - 门店/品牌引用存在
    /// - 时间窗合法
    fn validate_candidates(
        &self,
        window: &DateWindow,
        riders: &[Rider],
        candidates: &[AssignmentDraft],
    ) -> Result<(), GenerationError> {
        let rider_ids: HashSet<i64> = riders.iter().map(|r| r.id).collect();
        let branch_ids: HashSet<i64> = self.branch_repo.list()?.iter().map(|b| b.id).collect();
        let brand_ids: HashSet<i64> = self.brand_repo.list()?.iter().map(|b| b.id).collect();
        let mut seen: HashMap<(i64, NaiveDate), usize> = HashMap::new();

        for (idx, c) in candidates.iter().enumerate() {
            let malformed = |reason: String| {
                warn!(index = idx, rider_id = c.rider_id, shift_date = %c.shift_date, %reason, "非法候选");
                GenerationError::MalformedOutput(format!("候选 #{}: {}", idx, reason))
            };

            if !window.contains(c.shift_date) {
                return Err(malformed(format!(
                    "日期 {} 不在窗口 {}..={} 内",
                    c.shift_date,
                    window.start,
                    window.end()
                )));
            }
            if !rider_ids.contains(&c.rider_id) {
                return Err(malformed(format!("未知或非在岗骑手 {}", c.rider_id)));
            }
            if let Some(first) = seen.insert(c.slot_key(), idx) {
                return Err(malformed(format!("与候选 #{} 重复", first)));
            }
            if let Some(branch_id) = c.branch_id {
                if !branch_ids.contains(&branch_id) {
                    return Err(malformed(format!("门店 {} 不存在", branch_id)));
                }
            }
            if let Some(brand_id) = c.brand_id {
                if !brand_ids.contains(&brand_id) {
                    return Err(malformed(format!("外部品牌 {} 不存在", brand_id)));
                }
            }
            if let Err(e) = OverrideController::validate_draft(c) {
                return Err(malformed(e.to_string()));
            }
        }
        Ok(())
    }
}
