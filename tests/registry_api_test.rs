// ==========================================
// RegistryApi 集成测试
// ==========================================
// 测试范围:
// 1. 必填字段 / 唯一约束
// 2. 所属门店引用校验
// 3. 被引用的主数据不可删除
// ==========================================

mod helpers;

use helpers::api_test_helper::*;
use helpers::test_data_builder::*;
use rider_scheduling::domain::{AssignmentDraft, BranchDraft, RiderDraft, RiderPatch};
use rider_scheduling::{RiderType, ShiftType};

#[test]
fn test_branch_与brand_唯一约束() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    seed_branch(&env.registry_api, "B01", "Centro");

    let err = env
        .registry_api
        .create_branch(&BranchDraft {
            code: "B01".to_string(),
            name: "Otra".to_string(),
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(err.code(), "BUSINESS_RULE_VIOLATION");

    env.registry_api.create_brand("Rappi").unwrap();
    let err = env.registry_api.create_brand(" Rappi ").unwrap_err();
    assert_eq!(err.code(), "BUSINESS_RULE_VIOLATION");

    let err = env.registry_api.create_brand("   ").unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
}

#[test]
fn test_rider_所属门店必须存在() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let mut draft = RiderDraft::new("Ana", RiderType::RegularStaff);
    draft.home_branch_id = Some(404);
    let err = env.registry_api.create_rider(&draft).unwrap_err();
    assert_eq!(err.code(), "REFERENCE_ERROR");

    let err = env
        .registry_api
        .create_rider(&RiderDraft::new("  ", RiderType::OnCall))
        .unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");

    let rider = seed_rider(&env.registry_api, "Ana", RiderType::RegularStaff, None);
    let branch = seed_branch(&env.registry_api, "B01", "Centro");
    let updated = env
        .registry_api
        .update_rider(
            rider.id,
            &RiderPatch {
                home_branch_id: Some(Some(branch.id)),
                active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.home_branch_id, Some(branch.id));
    assert!(!updated.active);
    assert!(env.registry_api.list_riders(true).unwrap().is_empty());
    assert_eq!(env.registry_api.list_riders(false).unwrap().len(), 1);
}

#[test]
fn test_被排班引用的主数据不可删除() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let fx = seed_basic(&env.registry_api);
    let brand = env.registry_api.create_brand("Didi").unwrap();

    let assignment = env
        .schedule_api
        .create(
            &AssignmentDraft::new(fx.ana.id, june(1), ShiftType::External).with_brand(brand.id),
        )
        .unwrap();

    assert_eq!(
        env.registry_api.delete_rider(fx.ana.id).unwrap_err().code(),
        "BUSINESS_RULE_VIOLATION"
    );
    assert_eq!(
        env.registry_api.delete_brand(brand.id).unwrap_err().code(),
        "BUSINESS_RULE_VIOLATION"
    );
    // 门店仍被骑手引用
    assert_eq!(
        env.registry_api.delete_branch(fx.branch.id).unwrap_err().code(),
        "BUSINESS_RULE_VIOLATION"
    );

    env.schedule_api.delete(assignment.id).unwrap();
    env.registry_api.delete_brand(brand.id).unwrap();
    env.registry_api.delete_rider(fx.ana.id).unwrap();
    assert_eq!(
        env.registry_api.delete_rider(fx.ana.id).unwrap_err().code(),
        "NOT_FOUND"
    );
}
