// ==========================================
// 测试数据构造
// ==========================================

use chrono::{NaiveDate, NaiveTime};
use rider_scheduling::api::RegistryApi;
use rider_scheduling::domain::{Branch, BranchDraft, Rider, RiderDraft};
use rider_scheduling::RiderType;

/// 2024 年 6 月的某天
pub fn june(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
}

pub fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn seed_branch(api: &RegistryApi, code: &str, name: &str) -> Branch {
    api.create_branch(&BranchDraft {
        code: code.to_string(),
        name: name.to_string(),
        zone: Some("Norte".to_string()),
        address: None,
    })
    .expect("创建门店失败")
}

pub fn seed_rider(
    api: &RegistryApi,
    name: &str,
    rider_type: RiderType,
    home_branch_id: Option<i64>,
) -> Rider {
    let mut draft = RiderDraft::new(name, rider_type);
    draft.home_branch_id = home_branch_id;
    api.create_rider(&draft).expect("创建骑手失败")
}

/// 基础场景: 一个门店 + 三名不同类型的骑手
pub struct BasicFixture {
    pub branch: Branch,
    pub ana: Rider,
    pub luis: Rider,
    pub sara: Rider,
}

pub fn seed_basic(api: &RegistryApi) -> BasicFixture {
    let branch = seed_branch(api, "B01", "Centro");
    let ana = seed_rider(api, "Ana", RiderType::RegularStaff, Some(branch.id));
    let luis = seed_rider(api, "Luis", RiderType::WeekdayContract, Some(branch.id));
    let sara = seed_rider(api, "Sara", RiderType::WeekendContract, Some(branch.id));
    BasicFixture {
        branch,
        ana,
        luis,
        sara,
    }
}
