use super::core::ActionLogRepository;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::repository::error::RepositoryResult;
use crate::repository::mapping::{conversion_error, parse_date, parse_timestamp};
use rusqlite::{params, Result as SqliteResult, Row};

const LOG_COLUMNS: &str = r#"
    action_id, action_type, action_ts, actor, assignment_id,
    date_range_start, date_range_end, payload_json, detail
"#;

impl ActionLogRepository {
    /// 查询最近的操作日志
    pub fn list_recent(&self, limit: u32) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM action_log ORDER BY action_ts DESC, rowid DESC LIMIT ?1",
            LOG_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt
            .query_map(params![limit], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// 查询某条排班的全部操作日志（时间升序）
    pub fn list_by_assignment(&self, assignment_id: i64) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM action_log WHERE assignment_id = ?1 ORDER BY action_ts ASC, rowid ASC",
            LOG_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt
            .query_map(params![assignment_id], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }
}

fn map_row(row: &Row<'_>) -> SqliteResult<ActionLog> {
    let action_type_raw: String = row.get(1)?;
    let action_type = ActionType::from_db_str(&action_type_raw)
        .ok_or_else(|| conversion_error(1, format!("未知操作类型: {}", action_type_raw)))?;

    let payload_json = match row.get::<_, Option<String>>(7)? {
        Some(raw) => Some(
            serde_json::from_str(&raw)
                .map_err(|e| conversion_error(7, format!("payload_json 解析失败: {}", e)))?,
        ),
        None => None,
    };

    Ok(ActionLog {
        action_id: row.get(0)?,
        action_type,
        action_ts: parse_timestamp(2, &row.get::<_, String>(2)?)?,
        actor: row.get(3)?,
        assignment_id: row.get(4)?,
        date_range_start: row
            .get::<_, Option<String>>(5)?
            .map(|s| parse_date(5, &s))
            .transpose()?,
        date_range_end: row
            .get::<_, Option<String>>(6)?
            .map(|s| parse_date(6, &s))
            .transpose()?,
        payload_json,
        detail: row.get(8)?,
    })
}
