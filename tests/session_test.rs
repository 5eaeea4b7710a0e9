// ==========================================
// ScheduleSession 集成测试
// ==========================================
// 测试范围:
// 1. refresh 加载窗口数据
// 2. 筛选为本地视图, 不触发查询
// 3. 写入后重新查询并产生通知
// 4. 写入成功但刷新失败: 仍返回成功, 通知提示视图过期
// 5. 写入等待数据库锁时不占用运行时线程
// ==========================================

mod helpers;

use helpers::api_test_helper::*;
use helpers::test_data_builder::*;
use rider_scheduling::app::{Severity, STALE_VIEW_CODE};
use rider_scheduling::domain::{AssignmentDraft, AssignmentPatch, DateWindow};
use rider_scheduling::engine::{FilterSpec, Selector};
use rider_scheduling::ShiftType;

#[tokio::test]
async fn test_session_refresh_加载窗口() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let fx = seed_basic(&env.registry_api);
    env.schedule_api
        .create(&AssignmentDraft::new(fx.ana.id, june(2), ShiftType::Morning))
        .unwrap();
    env.schedule_api
        .create(&AssignmentDraft::new(fx.ana.id, june(20), ShiftType::Morning))
        .unwrap();

    let mut session = env.state.session(june(1), None);
    assert_eq!(session.window().days, 7);
    assert!(session.assignments().is_empty());

    session.refresh().await.unwrap();
    assert_eq!(session.riders().len(), 3);
    assert_eq!(session.branches().len(), 1);
    assert!(session.brands().is_empty());
    assert_eq!(session.assignments().len(), 1);
    assert_eq!(session.assignments()[0].assignment.shift_date, june(2));

    session.set_window(DateWindow::new(june(15), 7));
    session.refresh().await.unwrap();
    assert_eq!(session.assignments().len(), 1);
    assert_eq!(session.assignments()[0].assignment.shift_date, june(20));
}

#[tokio::test]
async fn test_session_筛选只影响可见视图() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let fx = seed_basic(&env.registry_api);
    env.schedule_api
        .create(&AssignmentDraft::new(fx.ana.id, june(1), ShiftType::Morning))
        .unwrap();
    env.schedule_api
        .create(&AssignmentDraft::new(fx.luis.id, june(1), ShiftType::RestDay))
        .unwrap();

    let mut session = env.state.session(june(1), Some(1));
    session.refresh().await.unwrap();
    assert_eq!(session.visible().len(), 2);

    session.set_filters(FilterSpec {
        shift_type: Selector::Only(ShiftType::RestDay),
        ..Default::default()
    });
    assert_eq!(session.assignments().len(), 2);
    let visible = session.visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].rider.id, fx.luis.id);

    session.set_filters(FilterSpec::default());
    assert_eq!(session.visible().len(), 2);
}

#[tokio::test]
async fn test_session_写入后刷新并通知() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let fx = seed_basic(&env.registry_api);

    let mut session = env.state.session(june(1), Some(7));
    session.refresh().await.unwrap();

    let created = session
        .create(&AssignmentDraft::new(fx.ana.id, june(1), ShiftType::Morning))
        .await
        .unwrap();
    assert_eq!(session.assignments().len(), 1);
    let note = session.take_notification().expect("应有成功通知");
    assert_eq!(note.severity, Severity::Success);
    assert!(session.notification().is_none());

    // 冲突: 通知为错误, 已加载数据不变
    let err = session
        .create(&AssignmentDraft::new(fx.ana.id, june(1), ShiftType::Afternoon))
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    let note = session.notification().expect("应有错误通知");
    assert!(note.is_error());
    assert_eq!(note.code, "ASSIGNMENT_CONFLICT");
    assert_eq!(session.assignments().len(), 1);

    session
        .update(created.id, &AssignmentPatch::shift_type(ShiftType::RestDay))
        .await
        .unwrap();
    assert_eq!(
        session.assignments()[0].assignment.shift_type,
        ShiftType::RestDay
    );

    session.delete(created.id).await.unwrap();
    assert!(session.assignments().is_empty());
    assert!(session.delete(created.id).await.is_err());
}

#[tokio::test]
async fn test_session_生成与导出使用当前窗口() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    seed_basic(&env.registry_api);

    let mut session = env.state.session(june(1), Some(7));
    let outcome = session.generate(3).await.unwrap();
    assert_eq!(outcome.window.start, june(1));
    assert_eq!(outcome.inserted, 3 * 3);
    assert_eq!(session.assignments().len(), 3 * 3);

    let reference = session.export().unwrap();
    assert_eq!(reference.start_date, june(1));
    assert_eq!(reference.end_date, june(7));
}

#[tokio::test]
async fn test_session_写入成功但刷新失败() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let fx = seed_basic(&env.registry_api);

    let mut session = env.state.session(june(1), Some(7));
    session.refresh().await.unwrap();

    // 无法解析的骑手类型使骑手列表查询失败, 不影响按 id 的写入
    let raw = rusqlite::Connection::open(&env.db_path).unwrap();
    raw.execute(
        "INSERT INTO rider (full_name, active, rider_type) VALUES ('Ghost', 1, 'BOGUS')",
        [],
    )
    .unwrap();

    let created = session
        .create(&AssignmentDraft::new(fx.ana.id, june(1), ShiftType::Morning))
        .await
        .expect("写入已提交, 应返回成功");
    let note = session.take_notification().expect("应有过期提示");
    assert_eq!(note.severity, Severity::Warning);
    assert_eq!(note.code, STALE_VIEW_CODE);

    // 写入确已落库: 重试得到冲突而非重复写入
    let stored = env.schedule_api.get(created.id).unwrap();
    assert_eq!(stored.rider_id, fx.ana.id);
    let err = session
        .create(&AssignmentDraft::new(fx.ana.id, june(1), ShiftType::Morning))
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    session.delete(created.id).await.expect("删除已提交, 应返回成功");
    assert_eq!(session.take_notification().unwrap().code, STALE_VIEW_CODE);
    assert!(env.schedule_api.list(june(1), june(1)).unwrap().is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn test_session_写入等锁不阻塞运行时() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let fx = seed_basic(&env.registry_api);
    let mut session = env.state.session(june(1), Some(7));

    // 另一个连接持有写锁 300ms
    let (locked_tx, locked_rx) = std::sync::mpsc::channel();
    let db_path = env.db_path.clone();
    let holder = std::thread::spawn(move || {
        let raw = rusqlite::Connection::open(&db_path).unwrap();
        raw.execute_batch("BEGIN IMMEDIATE;").unwrap();
        locked_tx.send(()).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(300));
        raw.execute_batch("COMMIT;").unwrap();
    });
    locked_rx.recv().unwrap();

    let ticker = async {
        for _ in 0..5 {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        std::time::Instant::now()
    };
    let write = async {
        let result = session
            .create(&AssignmentDraft::new(fx.ana.id, june(1), ShiftType::Morning))
            .await;
        (result, std::time::Instant::now())
    };
    let (ticker_done, (result, write_done)) = tokio::join!(ticker, write);
    holder.join().unwrap();

    result.expect("锁释放后写入应成功");
    assert!(ticker_done < write_done, "写入等锁期间运行时应继续调度其他任务");
}
