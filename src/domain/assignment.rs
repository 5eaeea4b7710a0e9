// ==========================================
// 骑手排班系统 - 排班分配领域模型
// ==========================================
// 核心实体: ScheduleAssignment
// 红线: (rider_id, shift_date) 同一时刻至多一条
// 红线: manual_override 单调, 只能 false -> true
// ==========================================

use crate::domain::branch::{Branch, ExternalBrand};
use crate::domain::patch::double_option;
use crate::domain::rider::Rider;
use crate::domain::types::{OverrideState, ShiftType};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

// ==========================================
// ScheduleAssignment - 排班分配
// ==========================================
// 对齐: schedule_assignment 表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleAssignment {
    pub id: i64,
    pub rider_id: i64,
    pub branch_id: Option<i64>, // 为空表示仅品牌 / 未分配门店
    pub brand_id: Option<i64>,  // 外部品牌
    pub shift_date: NaiveDate,  // 纯日期，无时区
    pub shift_type: ShiftType,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub manual_override: bool,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ScheduleAssignment {
    pub fn override_state(&self) -> OverrideState {
        OverrideState::from_flag(self.manual_override)
    }

    /// 排他键 (rider_id, shift_date)
    pub fn slot_key(&self) -> (i64, NaiveDate) {
        (self.rider_id, self.shift_date)
    }
}

// ==========================================
// AssignmentDraft - 新建参数
// ==========================================
// manual_override 仅作兼容字段: 人工创建一律落为 true,
// 只有生成边界可以写入 false
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentDraft {
    pub rider_id: i64,
    pub shift_date: NaiveDate,
    pub shift_type: ShiftType,
    #[serde(default)]
    pub branch_id: Option<i64>,
    #[serde(default)]
    pub brand_id: Option<i64>,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub manual_override: Option<bool>,
}

impl AssignmentDraft {
    pub fn new(rider_id: i64, shift_date: NaiveDate, shift_type: ShiftType) -> Self {
        Self {
            rider_id,
            shift_date,
            shift_type,
            branch_id: None,
            brand_id: None,
            start_time: None,
            end_time: None,
            notes: None,
            manual_override: None,
        }
    }

    pub fn with_branch(mut self, branch_id: i64) -> Self {
        self.branch_id = Some(branch_id);
        self
    }

    pub fn with_brand(mut self, brand_id: i64) -> Self {
        self.brand_id = Some(brand_id);
        self
    }

    pub fn with_times(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(end);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn slot_key(&self) -> (i64, NaiveDate) {
        (self.rider_id, self.shift_date)
    }
}

// ==========================================
// AssignmentPatch - 局部更新
// ==========================================
// 只应用提供的字段; 任何更新都会强制 manual_override = true
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentPatch {
    #[serde(default)]
    pub shift_type: Option<ShiftType>,
    #[serde(default, deserialize_with = "double_option")]
    pub branch_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub brand_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_time: Option<Option<NaiveTime>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_time: Option<Option<NaiveTime>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    /// 兼容字段: false 会被忽略（不存在 manual -> auto 的转换）
    #[serde(default)]
    pub manual_override: Option<bool>,
}

impl AssignmentPatch {
    pub fn shift_type(shift_type: ShiftType) -> Self {
        Self {
            shift_type: Some(shift_type),
            ..Self::default()
        }
    }

    /// 是否包含任何字段级修改
    pub fn has_field_changes(&self) -> bool {
        self.shift_type.is_some()
            || self.branch_id.is_some()
            || self.brand_id.is_some()
            || self.start_time.is_some()
            || self.end_time.is_some()
            || self.notes.is_some()
    }

    /// 补丁是否显式携带了时间字段（设置为非空值）
    pub fn sets_times(&self) -> bool {
        matches!(self.start_time, Some(Some(_))) || matches!(self.end_time, Some(Some(_)))
    }
}

// ==========================================
// AssignmentDetail - 带引用解析的排班（用于展示）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentDetail {
    #[serde(flatten)]
    pub assignment: ScheduleAssignment,
    pub rider: Rider,
    pub branch: Option<Branch>,
    pub brand: Option<ExternalBrand>,
}

// ==========================================
// DateWindow - 排班窗口
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub days: u32,
}

impl DateWindow {
    pub fn new(start: NaiveDate, days: u32) -> Self {
        Self { start, days }
    }

    /// 结束日期超出可表示范围时返回 None
    pub fn checked(start: NaiveDate, days: u32) -> Option<Self> {
        let window = Self::new(start, days);
        window.checked_end().map(|_| window)
    }

    fn checked_end(&self) -> Option<NaiveDate> {
        let span = i64::from(self.days.max(1)) - 1;
        self.start.checked_add_signed(Duration::days(span))
    }

    /// 窗口结束日期（含）
    ///
    /// days 为 0 时视为 1 天; 越过日历上限时截断到 NaiveDate::MAX
    pub fn end(&self) -> NaiveDate {
        self.checked_end().unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end()
    }

    /// 窗口内全部日期（升序）
    pub fn dates(&self) -> Vec<NaiveDate> {
        (0..i64::from(self.days.max(1)))
            .map_while(|offset| self.start.checked_add_signed(Duration::days(offset)))
            .collect()
    }
}
