use super::ActionLogRepository;
use crate::domain::action_log::{ActionLog, ActionType};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

fn setup_test_db() -> Arc<Mutex<Connection>> {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::init_schema(&conn).unwrap();
    Arc::new(Mutex::new(conn))
}

#[test]
fn test_insert_and_list_recent() {
    let repo = ActionLogRepository::new(setup_test_db());

    let first = ActionLog::now(ActionType::CreateAssignment, "ana")
        .with_assignment(1, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
        .with_payload(serde_json::json!({"shift_type": "MORNING"}));
    let second = ActionLog::now(ActionType::GenerateSchedule, "generator").with_range(
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 6, 7).unwrap(),
    );

    assert_eq!(repo.insert(&first).unwrap(), first.action_id);
    repo.insert(&second).unwrap();

    let logs = repo.list_recent(10).unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].action_type, ActionType::GenerateSchedule);
    assert_eq!(logs[1].payload_json, Some(serde_json::json!({"shift_type": "MORNING"})));

    let limited = repo.list_recent(1).unwrap();
    assert_eq!(limited.len(), 1);
}

#[test]
fn test_list_by_assignment() {
    let repo = ActionLogRepository::new(setup_test_db());
    let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();

    repo.insert(&ActionLog::now(ActionType::CreateAssignment, "ana").with_assignment(7, date))
        .unwrap();
    repo.insert(&ActionLog::now(ActionType::UpdateAssignment, "ana").with_assignment(7, date))
        .unwrap();
    repo.insert(&ActionLog::now(ActionType::CreateAssignment, "ana").with_assignment(8, date))
        .unwrap();

    let logs = repo.list_by_assignment(7).unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].action_type, ActionType::CreateAssignment);
    assert_eq!(logs[1].action_type, ActionType::UpdateAssignment);
    assert_eq!(logs[0].date_range_start, Some(date));
}
