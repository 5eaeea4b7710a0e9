// ==========================================
// ScheduleApi 集成测试
// ==========================================
// 测试范围:
// 1. 新建 / 冲突拒绝 / 引用校验（含写入时外键失败）/ 时间窗校验
// 2. 更新: manual_override 单调, 班次切换清空时间
// 3. 删除: 非幂等
// 4. 查询 / 筛选 / 待命池 / 导出 / 操作历史
// ==========================================

mod helpers;

use helpers::api_test_helper::*;
use helpers::test_data_builder::*;
use rider_scheduling::api::ApiError;
use rider_scheduling::domain::{ActionType, AssignmentDraft, AssignmentPatch};
use rider_scheduling::engine::{FilterSpec, Selector};
use rider_scheduling::{RiderType, ShiftType};

// ==========================================
// 新建
// ==========================================

#[test]
fn test_create_同一骑手同一天第二次新建冲突() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let fx = seed_basic(&env.registry_api);

    let first = env
        .schedule_api
        .create(&AssignmentDraft::new(fx.ana.id, june(1), ShiftType::Morning))
        .expect("首次新建应成功");
    assert!(first.manual_override);

    let err = env
        .schedule_api
        .create(&AssignmentDraft::new(fx.ana.id, june(1), ShiftType::Afternoon))
        .unwrap_err();
    match err {
        ApiError::AssignmentConflict {
            rider_id,
            shift_date,
            existing_id,
        } => {
            assert_eq!(rider_id, fx.ana.id);
            assert_eq!(shift_date, june(1));
            assert_eq!(existing_id, Some(first.id));
        }
        other => panic!("期望冲突错误, 实际为 {:?}", other),
    }

    // 原记录未被修改
    let kept = env.schedule_api.get(first.id).unwrap();
    assert_eq!(kept.shift_type, ShiftType::Morning);
    let listed = env.schedule_api.list(june(1), june(1)).unwrap();
    assert_eq!(listed.len(), 1);
}

#[test]
fn test_create_不同日期或不同骑手互不冲突() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let fx = seed_basic(&env.registry_api);

    env.schedule_api
        .create(&AssignmentDraft::new(fx.ana.id, june(1), ShiftType::Morning))
        .unwrap();
    env.schedule_api
        .create(&AssignmentDraft::new(fx.ana.id, june(2), ShiftType::Morning))
        .unwrap();
    env.schedule_api
        .create(&AssignmentDraft::new(fx.luis.id, june(1), ShiftType::Morning))
        .unwrap();

    assert_eq!(env.schedule_api.list(june(1), june(2)).unwrap().len(), 3);
}

#[test]
fn test_create_manual_override_false_被忽略() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let fx = seed_basic(&env.registry_api);

    let mut draft = AssignmentDraft::new(fx.ana.id, june(1), ShiftType::RestDay);
    draft.manual_override = Some(false);
    let created = env.schedule_api.create(&draft).unwrap();
    assert!(created.manual_override);
}

#[test]
fn test_create_引用不存在() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let fx = seed_basic(&env.registry_api);

    let err = env
        .schedule_api
        .create(&AssignmentDraft::new(9_999, june(1), ShiftType::Morning))
        .unwrap_err();
    assert_eq!(err.code(), "REFERENCE_ERROR");

    let err = env
        .schedule_api
        .create(&AssignmentDraft::new(fx.ana.id, june(1), ShiftType::Morning).with_branch(9_999))
        .unwrap_err();
    assert!(matches!(err, ApiError::ReferenceError { ref entity, id: 9_999 } if entity == "Branch"));

    let err = env
        .schedule_api
        .create(&AssignmentDraft::new(fx.ana.id, june(1), ShiftType::External).with_brand(9_999))
        .unwrap_err();
    assert_eq!(err.code(), "REFERENCE_ERROR");

    assert!(env.schedule_api.list(june(1), june(1)).unwrap().is_empty());
}

#[test]
fn test_create_写入时引用被删除归为引用错误() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let fx = seed_basic(&env.registry_api);
    let brand = env.registry_api.create_brand("Rappi").unwrap();

    // 前置检查通过后, 在写入语句内删除品牌, 模拟并发删除
    let raw = rusqlite::Connection::open(&env.db_path).unwrap();
    raw.execute_batch(
        "CREATE TRIGGER drop_brand_on_insert BEFORE INSERT ON schedule_assignment
         BEGIN DELETE FROM external_brand WHERE id = NEW.brand_id; END;",
    )
    .unwrap();

    let mut draft = AssignmentDraft::new(fx.ana.id, june(3), ShiftType::Morning);
    draft.brand_id = Some(brand.id);
    let err = env.schedule_api.create(&draft).unwrap_err();

    assert_eq!(err.code(), "REFERENCE_ERROR");
    assert!(matches!(
        err,
        ApiError::ReferenceError { ref entity, id } if entity == "ExternalBrand" && id == brand.id
    ));
    assert!(env.schedule_api.list(june(3), june(3)).unwrap().is_empty());
}

#[test]
fn test_create_时间窗校验() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let fx = seed_basic(&env.registry_api);

    // 结束早于开始
    let err = env
        .schedule_api
        .create(
            &AssignmentDraft::new(fx.ana.id, june(1), ShiftType::Morning)
                .with_times(hm(14, 0), hm(6, 0)),
        )
        .unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");

    // 休息日不允许带时间
    let err = env
        .schedule_api
        .create(
            &AssignmentDraft::new(fx.ana.id, june(1), ShiftType::RestDay)
                .with_times(hm(6, 0), hm(14, 0)),
        )
        .unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");

    // 合法时间窗
    let created = env
        .schedule_api
        .create(
            &AssignmentDraft::new(fx.ana.id, june(1), ShiftType::Morning)
                .with_branch(fx.branch.id)
                .with_times(hm(6, 0), hm(14, 0)),
        )
        .unwrap();
    assert_eq!(created.start_time, Some(hm(6, 0)));
    assert_eq!(created.end_time, Some(hm(14, 0)));
}

// ==========================================
// 更新
// ==========================================

#[tokio::test]
async fn test_update_自动排班改为休息日后标记为人工() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let fx = seed_basic(&env.registry_api);

    env.schedule_api.generate(june(3), 1).await.unwrap();
    let generated = env
        .schedule_api
        .list(june(3), june(3))
        .unwrap()
        .into_iter()
        .find(|d| d.rider.id == fx.luis.id)
        .expect("应有生成的排班");
    assert!(!generated.assignment.manual_override);

    let updated = env
        .schedule_api
        .update(generated.assignment.id, &AssignmentPatch::shift_type(ShiftType::RestDay))
        .unwrap();
    assert!(updated.manual_override);
    assert_eq!(updated.shift_type, ShiftType::RestDay);
    assert_eq!(updated.start_time, None);
    assert_eq!(updated.end_time, None);

    let listed = env.schedule_api.list(june(3), june(3)).unwrap();
    let row = listed
        .iter()
        .find(|d| d.assignment.id == updated.id)
        .unwrap();
    assert!(row.assignment.manual_override);
    assert_eq!(row.assignment.shift_type, ShiftType::RestDay);
}

#[test]
fn test_update_manual_override_不可回退() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let fx = seed_basic(&env.registry_api);

    let created = env
        .schedule_api
        .create(&AssignmentDraft::new(fx.ana.id, june(1), ShiftType::Morning))
        .unwrap();

    let patch = AssignmentPatch {
        manual_override: Some(false),
        notes: Some(Some("cambio".to_string())),
        ..Default::default()
    };
    let updated = env.schedule_api.update(created.id, &patch).unwrap();
    assert!(updated.manual_override);
    assert_eq!(updated.notes.as_deref(), Some("cambio"));
}

#[test]
fn test_update_清空门店与备注() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let fx = seed_basic(&env.registry_api);

    let created = env
        .schedule_api
        .create(
            &AssignmentDraft::new(fx.ana.id, june(1), ShiftType::Morning)
                .with_branch(fx.branch.id)
                .with_notes("nota"),
        )
        .unwrap();

    let patch = AssignmentPatch {
        branch_id: Some(None),
        notes: Some(None),
        ..Default::default()
    };
    let updated = env.schedule_api.update(created.id, &patch).unwrap();
    assert_eq!(updated.branch_id, None);
    assert_eq!(updated.notes, None);
    // 未出现在补丁中的字段保持不变
    assert_eq!(updated.shift_type, ShiftType::Morning);
}

#[test]
fn test_update_不存在与非法引用() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let fx = seed_basic(&env.registry_api);

    let err = env
        .schedule_api
        .update(12_345, &AssignmentPatch::shift_type(ShiftType::RestDay))
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");

    let created = env
        .schedule_api
        .create(&AssignmentDraft::new(fx.ana.id, june(1), ShiftType::Morning))
        .unwrap();
    let patch = AssignmentPatch {
        branch_id: Some(Some(777)),
        ..Default::default()
    };
    let err = env.schedule_api.update(created.id, &patch).unwrap_err();
    assert_eq!(err.code(), "REFERENCE_ERROR");
    assert_eq!(env.schedule_api.get(created.id).unwrap().branch_id, None);
}

#[test]
fn test_update_休息日写入时间被拒绝() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let fx = seed_basic(&env.registry_api);

    let created = env
        .schedule_api
        .create(&AssignmentDraft::new(fx.ana.id, june(1), ShiftType::RestDay))
        .unwrap();
    let patch = AssignmentPatch {
        start_time: Some(Some(hm(8, 0))),
        ..Default::default()
    };
    let err = env.schedule_api.update(created.id, &patch).unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
}

// ==========================================
// 删除
// ==========================================

#[test]
fn test_delete_第二次删除返回未找到() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let fx = seed_basic(&env.registry_api);

    let created = env
        .schedule_api
        .create(&AssignmentDraft::new(fx.ana.id, june(1), ShiftType::Morning))
        .unwrap();

    env.schedule_api.delete(created.id).expect("首次删除应成功");
    let err = env.schedule_api.delete(created.id).unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));

    // 删除后同一槽位可再次新建
    env.schedule_api
        .create(&AssignmentDraft::new(fx.ana.id, june(1), ShiftType::Afternoon))
        .expect("删除后应可重新新建");
}

// ==========================================
// 查询
// ==========================================

#[test]
fn test_list_日期区间含两端且拒绝倒置区间() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let fx = seed_basic(&env.registry_api);

    for day in [1, 2, 3, 4] {
        env.schedule_api
            .create(&AssignmentDraft::new(fx.ana.id, june(day), ShiftType::Morning))
            .unwrap();
    }

    let listed = env.schedule_api.list(june(2), june(3)).unwrap();
    let dates: Vec<_> = listed.iter().map(|d| d.assignment.shift_date).collect();
    assert_eq!(dates, vec![june(2), june(3)]);
    assert_eq!(listed[0].rider.full_name, "Ana");

    let err = env.schedule_api.list(june(3), june(2)).unwrap_err();
    assert!(matches!(err, ApiError::InvalidDateRange { .. }));
}

#[test]
fn test_list_filtered_按骑手类型与班次筛选() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let fx = seed_basic(&env.registry_api);

    env.schedule_api
        .create(&AssignmentDraft::new(fx.ana.id, june(1), ShiftType::Morning).with_branch(fx.branch.id))
        .unwrap();
    env.schedule_api
        .create(&AssignmentDraft::new(fx.luis.id, june(1), ShiftType::Afternoon))
        .unwrap();
    env.schedule_api
        .create(&AssignmentDraft::new(fx.sara.id, june(1), ShiftType::RestDay))
        .unwrap();

    let all = env
        .schedule_api
        .list_filtered(june(1), june(1), &FilterSpec::default())
        .unwrap();
    assert_eq!(all.len(), 3);

    let contract_only = FilterSpec {
        rider_type: Selector::Only(RiderType::WeekdayContract),
        ..Default::default()
    };
    let filtered = env
        .schedule_api
        .list_filtered(june(1), june(1), &contract_only)
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].rider.id, fx.luis.id);

    let by_branch = FilterSpec {
        branch: Selector::Only(fx.branch.id),
        ..Default::default()
    };
    let filtered = env
        .schedule_api
        .list_filtered(june(1), june(1), &by_branch)
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].assignment.shift_type, ShiftType::Morning);
}

#[test]
fn test_available_pool_与快速待命() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let fx = seed_basic(&env.registry_api);
    let partner = seed_rider(&env.registry_api, "Pedro", RiderType::ExternalPartner, None);

    let pool = env.schedule_api.available_pool().unwrap();
    let ids: Vec<i64> = pool.iter().map(|r| r.id).collect();
    assert!(ids.contains(&fx.luis.id));
    assert!(ids.contains(&fx.sara.id));
    assert!(ids.contains(&partner.id));
    assert!(!ids.contains(&fx.ana.id));

    let created = env.schedule_api.create_available(partner.id, june(5)).unwrap();
    assert_eq!(created.shift_type, ShiftType::OnCallAvailable);
    assert!(created.manual_override);
    assert_eq!(created.start_time, None);

    let err = env.schedule_api.create_available(partner.id, june(5)).unwrap_err();
    assert!(err.is_conflict());
}

// ==========================================
// 导出 / 操作历史
// ==========================================

#[test]
fn test_export_引用() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let reference = env.schedule_api.export(june(1), june(7)).unwrap();
    assert_eq!(
        reference.url,
        "http://localhost:8000/api/schedule/export?start_date=2024-06-01&end_date=2024-06-07"
    );
    assert_eq!(reference.file_name, "programacion_2024-06-01_2024-06-07.xlsx");

    assert!(env.schedule_api.export(june(7), june(1)).is_err());
}

#[test]
fn test_history_记录每次写入() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let fx = seed_basic(&env.registry_api);

    let created = env
        .schedule_api
        .create(&AssignmentDraft::new(fx.ana.id, june(1), ShiftType::Morning))
        .unwrap();
    env.schedule_api
        .update(created.id, &AssignmentPatch::shift_type(ShiftType::Afternoon))
        .unwrap();
    env.schedule_api.delete(created.id).unwrap();

    let history = env.schedule_api.history(created.id).unwrap();
    let mut types: Vec<ActionType> = history.iter().map(|l| l.action_type).collect();
    types.sort_by_key(|t| t.to_db_str());
    assert_eq!(
        types,
        vec![
            ActionType::CreateAssignment,
            ActionType::DeleteAssignment,
            ActionType::UpdateAssignment,
        ]
    );
    assert!(history.iter().all(|l| l.actor == "operator"));

    // 冲突被拒绝的写入不记录
    env.schedule_api
        .create(&AssignmentDraft::new(fx.luis.id, june(1), ShiftType::Morning))
        .unwrap();
    let _ = env
        .schedule_api
        .create(&AssignmentDraft::new(fx.luis.id, june(1), ShiftType::Morning));
    assert_eq!(env.schedule_api.recent_actions(50).unwrap().len(), 4);
}
