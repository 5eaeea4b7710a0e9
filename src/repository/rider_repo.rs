// ==========================================
// 骑手排班系统 - 骑手数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::patch::apply_nullable;
use crate::domain::rider::{Rider, RiderDraft, RiderPatch};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::mapping::parse_rider_type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const RIDER_COLUMNS: &str =
    "id, full_name, active, rider_type, identification, home_branch_id, note";

pub(crate) fn map_rider(row: &Row<'_>, offset: usize) -> SqliteResult<Rider> {
    Ok(Rider {
        id: row.get(offset)?,
        full_name: row.get(offset + 1)?,
        active: row.get(offset + 2)?,
        rider_type: parse_rider_type(offset + 3, &row.get::<_, String>(offset + 3)?)?,
        identification: row.get(offset + 4)?,
        home_branch_id: row.get(offset + 5)?,
        note: row.get(offset + 6)?,
    })
}

// ==========================================
// RiderRepository - 骑手仓储
// ==========================================
pub struct RiderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RiderRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建骑手，返回落库记录
    pub fn create(&self, draft: &RiderDraft) -> RepositoryResult<Rider> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO rider (full_name, active, rider_type, identification, home_branch_id, note)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                draft.full_name,
                draft.active,
                draft.rider_type.to_db_str(),
                draft.identification,
                draft.home_branch_id,
                draft.note,
            ],
        )?;
        Ok(Rider {
            id: conn.last_insert_rowid(),
            full_name: draft.full_name.clone(),
            active: draft.active,
            rider_type: draft.rider_type,
            identification: draft.identification.clone(),
            home_branch_id: draft.home_branch_id,
            note: draft.note.clone(),
        })
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Rider>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM rider WHERE id = ?1", RIDER_COLUMNS);
        Ok(conn
            .query_row(&sql, params![id], |row| map_rider(row, 0))
            .optional()?)
    }

    /// 按姓名查询（导入时的 upsert 键）
    pub fn find_by_full_name(&self, full_name: &str) -> RepositoryResult<Option<Rider>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM rider WHERE full_name = ?1 ORDER BY id ASC LIMIT 1",
            RIDER_COLUMNS
        );
        Ok(conn
            .query_row(&sql, params![full_name], |row| map_rider(row, 0))
            .optional()?)
    }

    /// 查询骑手列表
    ///
    /// # 参数
    /// - `active_only`: 仅返回在岗骑手
    pub fn list(&self, active_only: bool) -> RepositoryResult<Vec<Rider>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM rider WHERE (?1 = 0 OR active = 1) ORDER BY full_name ASC, id ASC",
            RIDER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let riders = stmt
            .query_map(params![active_only], |row| map_rider(row, 0))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(riders)
    }

    /// 局部更新骑手
    pub fn update(&self, id: i64, patch: &RiderPatch) -> RepositoryResult<Rider> {
        let mut rider = self
            .find_by_id(id)?
            .ok_or_else(|| RepositoryError::not_found("Rider", id))?;

        if let Some(full_name) = &patch.full_name {
            rider.full_name = full_name.clone();
        }
        if let Some(active) = patch.active {
            rider.active = active;
        }
        if let Some(rider_type) = patch.rider_type {
            rider.rider_type = rider_type;
        }
        apply_nullable(&mut rider.identification, patch.identification.clone());
        apply_nullable(&mut rider.home_branch_id, patch.home_branch_id);
        apply_nullable(&mut rider.note, patch.note.clone());

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            UPDATE rider
            SET full_name = ?1, active = ?2, rider_type = ?3,
                identification = ?4, home_branch_id = ?5, note = ?6
            WHERE id = ?7
            "#,
            params![
                rider.full_name,
                rider.active,
                rider.rider_type.to_db_str(),
                rider.identification,
                rider.home_branch_id,
                rider.note,
                id,
            ],
        )?;
        Ok(rider)
    }

    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM rider WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(RepositoryError::not_found("Rider", id));
        }
        Ok(())
    }
}
