// ==========================================
// 骑手排班系统 - 覆写控制器 (Override Controller)
// ==========================================
// 红线: manual_override 单调, 只允许 Auto -> Manual
// 红线: 任何人工写入（新建/更新）都落为 Manual
// ==========================================
// 职责:
// - 决定新记录的初始覆写状态
// - 将局部补丁应用到现有记录, 并强制转为 Manual
// - 校验时间窗（只有有时间窗的班次才允许携带时间）
// ==========================================

use crate::domain::assignment::{AssignmentDraft, AssignmentPatch, ScheduleAssignment};
use crate::domain::patch::apply_nullable;
use crate::domain::types::{OverrideState, ShiftType};
use crate::repository::error::RepositoryError;
use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

/// 记录来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationOrigin {
    /// 人工新建（包括快速创建待命）
    Manual,
    /// 生成对账写入
    Generation,
}

/// 时间窗校验错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OverrideError {
    #[error("班次 {shift_type} 不允许设置时间")]
    TimesNotAllowed { shift_type: ShiftType },

    #[error("结束时间 {end} 必须晚于开始时间 {start}")]
    InvalidTimeWindow { start: NaiveTime, end: NaiveTime },
}

impl OverrideError {
    pub fn field(&self) -> &'static str {
        match self {
            OverrideError::TimesNotAllowed { .. } => "start_time",
            OverrideError::InvalidTimeWindow { .. } => "end_time",
        }
    }
}

impl From<OverrideError> for RepositoryError {
    fn from(err: OverrideError) -> Self {
        RepositoryError::FieldValueError {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

// ==========================================
// OverrideController
// ==========================================
pub struct OverrideController;

impl OverrideController {
    /// 新记录的初始覆写状态
    pub fn initial_state(origin: CreationOrigin) -> OverrideState {
        match origin {
            CreationOrigin::Manual => OverrideState::Manual,
            CreationOrigin::Generation => OverrideState::Auto,
        }
    }

    /// 校验班次与时间窗
    ///
    /// # 规则
    /// - 无时间窗的班次（休息/待命）不能携带任何时间
    /// - 两端都提供时 end 必须严格晚于 start
    pub fn validate_times(
        shift_type: ShiftType,
        start: Option<NaiveTime>,
        end: Option<NaiveTime>,
    ) -> Result<(), OverrideError> {
        if !shift_type.is_time_bound() && (start.is_some() || end.is_some()) {
            return Err(OverrideError::TimesNotAllowed { shift_type });
        }
        if let (Some(start), Some(end)) = (start, end) {
            if end <= start {
                return Err(OverrideError::InvalidTimeWindow { start, end });
            }
        }
        Ok(())
    }

    pub fn validate_draft(draft: &AssignmentDraft) -> Result<(), OverrideError> {
        Self::validate_times(draft.shift_type, draft.start_time, draft.end_time)
    }

    /// 将补丁应用到当前记录
    ///
    /// # 返回
    /// 新记录, manual_override 恒为 true; 补丁中的 manual_override=false 被忽略
    ///
    /// # 说明
    /// 切换到无时间窗的班次且补丁未显式给出时间时, 旧时间被清空
    pub fn apply_patch(
        current: ScheduleAssignment,
        patch: &AssignmentPatch,
    ) -> Result<ScheduleAssignment, OverrideError> {
        let mut next = current;

        if let Some(shift_type) = patch.shift_type {
            next.shift_type = shift_type;
        }
        apply_nullable(&mut next.branch_id, patch.branch_id);
        apply_nullable(&mut next.brand_id, patch.brand_id);
        apply_nullable(&mut next.start_time, patch.start_time);
        apply_nullable(&mut next.end_time, patch.end_time);
        apply_nullable(&mut next.notes, patch.notes.clone());

        if !next.shift_type.is_time_bound() && !patch.sets_times() {
            next.start_time = None;
            next.end_time = None;
        }

        Self::validate_times(next.shift_type, next.start_time, next.end_time)?;

        next.manual_override = OverrideState::Manual.is_manual();
        Ok(next)
    }

    /// 快速创建"待命"排班的参数
    pub fn available_draft(rider_id: i64, shift_date: NaiveDate) -> AssignmentDraft {
        AssignmentDraft::new(rider_id, shift_date, ShiftType::OnCallAvailable)
    }
}
