// ==========================================
// 骑手排班系统 - 冲突守卫 (Conflict Guard)
// ==========================================
// 红线: 同一 (rider_id, shift_date) 至多一条排班
// 规则: 已存在的排班永远胜出, 冲突的新建请求直接拒绝
// ==========================================
// 纯谓词, 由手工新建与生成对账两条写入路径共用;
// 原子性由仓储的写事务保证
// ==========================================

use crate::domain::assignment::ScheduleAssignment;
use chrono::NaiveDate;

// ==========================================
// ConflictGuard - 冲突守卫
// ==========================================
pub struct ConflictGuard;

impl ConflictGuard {
    /// 查找候选 (rider_id, shift_date) 已存在的排班
    ///
    /// # 参数
    /// - `rider_id`: 候选骑手
    /// - `shift_date`: 候选日期
    /// - `same_day`: 该日期当前全部排班
    ///
    /// # 返回
    /// - Some(id): 已存在排班的 id（冲突）
    /// - None: 无冲突
    pub fn find_existing(
        rider_id: i64,
        shift_date: NaiveDate,
        same_day: &[ScheduleAssignment],
    ) -> Option<i64> {
        same_day
            .iter()
            .find(|a| a.rider_id == rider_id && a.shift_date == shift_date)
            .map(|a| a.id)
    }

    /// 是否冲突
    pub fn has_conflict(
        rider_id: i64,
        shift_date: NaiveDate,
        same_day: &[ScheduleAssignment],
    ) -> bool {
        Self::find_existing(rider_id, shift_date, same_day).is_some()
    }
}
