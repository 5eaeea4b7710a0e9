// ==========================================
// 骑手排班系统 - 操作日志领域模型
// ==========================================
// 红线: 所有排班写入必须记录
// 用途: 审计追踪
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

// ==========================================
// ActionLog - 操作日志
// ==========================================
// 对齐: action_log 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,             // uuid v4
    pub action_type: ActionType,       // 操作类型
    pub action_ts: NaiveDateTime,      // 操作时间戳
    pub actor: String,                 // 操作人
    pub assignment_id: Option<i64>,    // 关联排班 (批量操作为空)
    pub date_range_start: Option<NaiveDate>,
    pub date_range_end: Option<NaiveDate>,
    pub payload_json: Option<JsonValue>,
    pub detail: Option<String>,
}

impl ActionLog {
    /// 以当前本地时间创建日志
    pub fn now(action_type: ActionType, actor: &str) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            action_type,
            action_ts: chrono::Local::now().naive_local(),
            actor: actor.to_string(),
            assignment_id: None,
            date_range_start: None,
            date_range_end: None,
            payload_json: None,
            detail: None,
        }
    }

    pub fn with_assignment(mut self, assignment_id: i64, shift_date: NaiveDate) -> Self {
        self.assignment_id = Some(assignment_id);
        self.date_range_start = Some(shift_date);
        self.date_range_end = Some(shift_date);
        self
    }

    pub fn with_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_range_start = Some(start);
        self.date_range_end = Some(end);
        self
    }

    pub fn with_payload(mut self, payload: JsonValue) -> Self {
        self.payload_json = Some(payload);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    CreateAssignment,
    UpdateAssignment,
    DeleteAssignment,
    GenerateSchedule,
    ImportEntities,
}

impl ActionType {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ActionType::CreateAssignment => "CREATE_ASSIGNMENT",
            ActionType::UpdateAssignment => "UPDATE_ASSIGNMENT",
            ActionType::DeleteAssignment => "DELETE_ASSIGNMENT",
            ActionType::GenerateSchedule => "GENERATE_SCHEDULE",
            ActionType::ImportEntities => "IMPORT_ENTITIES",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "CREATE_ASSIGNMENT" => Some(ActionType::CreateAssignment),
            "UPDATE_ASSIGNMENT" => Some(ActionType::UpdateAssignment),
            "DELETE_ASSIGNMENT" => Some(ActionType::DeleteAssignment),
            "GENERATE_SCHEDULE" => Some(ActionType::GenerateSchedule),
            "IMPORT_ENTITIES" => Some(ActionType::ImportEntities),
            _ => None,
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}
