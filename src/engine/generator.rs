// ==========================================
// 骑手排班系统 - 排班生成服务接口
// ==========================================
// 职责: 定义生成服务契约 (窗口 + 骑手 -> 候选排班)
// 红线: 生成服务只产出候选, 不直接写库; 落库由 GenerationBoundary 对账完成
// ==========================================
// 默认实现 RotationShiftGenerator 为进程内规则, 可替换
// ==========================================

use crate::domain::assignment::{AssignmentDraft, DateWindow};
use crate::domain::rider::Rider;
use crate::domain::types::{RiderType, ShiftType};
use crate::repository::error::RepositoryError;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use thiserror::Error;

// ==========================================
// GenerationError - 生成错误
// ==========================================
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("生成请求无效: {0}")]
    InvalidRequest(String),

    #[error("生成服务超时 ({timeout_ms} ms)")]
    Timeout { timeout_ms: u64 },

    #[error("生成服务不可用: {0}")]
    ServiceUnavailable(String),

    #[error("生成服务返回数据异常: {0}")]
    MalformedOutput(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

// ==========================================
// GenerationRequest - 生成请求
// ==========================================
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub window: DateWindow,
    /// 参与生成的在岗骑手
    pub riders: Vec<Rider>,
}

// ==========================================
// ShiftGenerator Trait
// ==========================================
// 实现者: RotationShiftGenerator（默认）, 测试中的桩实现
#[async_trait]
pub trait ShiftGenerator: Send + Sync {
    /// 为窗口生成完整候选集
    ///
    /// # 返回
    /// - Ok(candidates): 候选排班（manual_override 字段被忽略）
    /// - Err: 服务失败
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<AssignmentDraft>, GenerationError>;
}

// ==========================================
// RotationShiftGenerator - 默认轮转规则
// ==========================================
// 规则:
// - 正式员工: 每周一天休息, 其余按 ISO 周早/晚班轮换
// - 工作日合同: 周一至周五全天
// - 周末合同: 周六周日全天
// - 外部合作: 外部品牌班次
// - 待命: 待命
pub struct RotationShiftGenerator {
    morning: (NaiveTime, NaiveTime),
    afternoon: (NaiveTime, NaiveTime),
}

impl RotationShiftGenerator {
    pub fn new(morning: (NaiveTime, NaiveTime), afternoon: (NaiveTime, NaiveTime)) -> Self {
        Self { morning, afternoon }
    }

    /// 某骑手某日期的班次
    pub fn shift_for(&self, rider: &Rider, date: NaiveDate) -> ShiftType {
        let weekday = date.weekday();
        let is_weekend = matches!(weekday, Weekday::Sat | Weekday::Sun);

        match rider.rider_type {
            RiderType::RegularStaff => {
                let rest_day = rider.id.rem_euclid(7);
                if i64::from(weekday.num_days_from_monday()) == rest_day {
                    ShiftType::RestDay
                } else if (i64::from(date.iso_week().week()) + rider.id).rem_euclid(2) == 0 {
                    ShiftType::Morning
                } else {
                    ShiftType::Afternoon
                }
            }
            RiderType::WeekdayContract if is_weekend => ShiftType::RestDay,
            RiderType::WeekdayContract => ShiftType::MorningAndAfternoon,
            RiderType::WeekendContract if is_weekend => ShiftType::MorningAndAfternoon,
            RiderType::WeekendContract => ShiftType::RestDay,
            RiderType::ExternalPartner => ShiftType::External,
            RiderType::OnCall => ShiftType::OnCallAvailable,
        }
    }

    fn times_for(&self, shift_type: ShiftType) -> Option<(NaiveTime, NaiveTime)> {
        match shift_type {
            ShiftType::Morning => Some(self.morning),
            ShiftType::Afternoon => Some(self.afternoon),
            ShiftType::MorningAndAfternoon => Some((self.morning.0, self.afternoon.1)),
            ShiftType::RestDay | ShiftType::OnCallAvailable | ShiftType::External => None,
        }
    }

    fn candidate(&self, rider: &Rider, date: NaiveDate) -> AssignmentDraft {
        let shift_type = self.shift_for(rider, date);
        let mut draft = AssignmentDraft::new(rider.id, date, shift_type);
        if rider.rider_type != RiderType::ExternalPartner {
            draft.branch_id = rider.home_branch_id;
        }
        if let Some((start, end)) = self.times_for(shift_type) {
            draft = draft.with_times(start, end);
        }
        draft
    }
}

impl Default for RotationShiftGenerator {
    fn default() -> Self {
        let at = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap_or(NaiveTime::MIN);
        Self::new((at(6), at(14)), (at(14), at(22)))
    }
}

#[async_trait]
impl ShiftGenerator for RotationShiftGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<AssignmentDraft>, GenerationError> {
        let dates = request.window.dates();
        let mut candidates = Vec::with_capacity(dates.len() * request.riders.len());
        for date in dates {
            for rider in request.riders.iter().filter(|r| r.active) {
                candidates.push(self.candidate(rider, date));
            }
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rider(id: i64, rider_type: RiderType) -> Rider {
        Rider {
            id,
            full_name: format!("rider-{}", id),
            active: true,
            rider_type,
            identification: None,
            home_branch_id: Some(5),
            note: None,
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[tokio::test]
    async fn test_rotation_每骑手每天一个候选() {
        let generator = RotationShiftGenerator::default();
        let mut inactive = rider(3, RiderType::OnCall);
        inactive.active = false;
        let request = GenerationRequest {
            window: DateWindow::new(d(1), 7),
            riders: vec![rider(1, RiderType::RegularStaff), rider(2, RiderType::WeekdayContract), inactive],
        };

        let candidates = generator.generate(&request).await.unwrap();
        assert_eq!(candidates.len(), 14);
        assert!(candidates.iter().all(|c| request.window.contains(c.shift_date)));
        assert!(candidates.iter().all(|c| c.rider_id != 3));
    }

    #[test]
    fn test_rotation_正式员工每周一天休息() {
        let generator = RotationShiftGenerator::default();
        let r = rider(1, RiderType::RegularStaff);
        // 2024-06-03 为周一
        let week: Vec<ShiftType> = (3..=9).map(|day| generator.shift_for(&r, d(day))).collect();

        assert_eq!(week.iter().filter(|s| **s == ShiftType::RestDay).count(), 1);
        assert_eq!(week[1], ShiftType::RestDay);
        let working: Vec<_> = week.iter().filter(|s| **s != ShiftType::RestDay).collect();
        assert!(working.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_rotation_合同骑手按工作日与周末() {
        let generator = RotationShiftGenerator::default();
        let weekday = rider(2, RiderType::WeekdayContract);
        let weekend = rider(3, RiderType::WeekendContract);
        let saturday = d(8);
        let monday = d(3);

        assert_eq!(generator.shift_for(&weekday, monday), ShiftType::MorningAndAfternoon);
        assert_eq!(generator.shift_for(&weekday, saturday), ShiftType::RestDay);
        assert_eq!(generator.shift_for(&weekend, monday), ShiftType::RestDay);
        assert_eq!(generator.shift_for(&weekend, saturday), ShiftType::MorningAndAfternoon);
    }

    #[test]
    fn test_rotation_外部骑手不带门店() {
        let generator = RotationShiftGenerator::default();
        let external = generator.candidate(&rider(4, RiderType::ExternalPartner), d(3));
        assert_eq!(external.shift_type, ShiftType::External);
        assert_eq!(external.branch_id, None);

        let on_call = generator.candidate(&rider(5, RiderType::OnCall), d(3));
        assert_eq!(on_call.shift_type, ShiftType::OnCallAvailable);
        assert_eq!(on_call.branch_id, Some(5));
        assert_eq!(on_call.start_time, None);
    }
}
