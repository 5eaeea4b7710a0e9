// ==========================================
// 骑手排班系统 - 排班分配数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: (rider_id, shift_date) 唯一, 由 UNIQUE 索引兜底
// ==========================================
// 并发: 冲突检查与写入在同一个 IMMEDIATE 事务内完成,
//       检查逻辑由调用方以闭包注入（Conflict Guard）
// ==========================================

use crate::domain::assignment::{AssignmentDetail, AssignmentDraft, ScheduleAssignment};
use crate::domain::branch::{Branch, ExternalBrand};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::mapping::{
    conversion_error, format_date, format_time, format_timestamp, now_timestamp, parse_date,
    parse_shift_type, parse_time, parse_timestamp,
};
use crate::repository::rider_repo::map_rider;
use chrono::NaiveDate;
use rusqlite::{
    params, Connection, OptionalExtension, Result as SqliteResult, Row, TransactionBehavior,
};
use std::sync::{Arc, Mutex, MutexGuard};

const ASSIGNMENT_COLUMNS: &str = r#"
    a.id, a.rider_id, a.branch_id, a.brand_id, a.shift_date, a.shift_type,
    a.start_time, a.end_time, a.manual_override, a.notes, a.created_at, a.updated_at
"#;

/// 插入结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// 已写入
    Inserted(ScheduleAssignment),
    /// 已存在同骑手同日期排班，未写入
    ///
    /// existing_id 为空表示由 UNIQUE 索引拦截（其他连接并发写入）
    Conflict { existing_id: Option<i64> },
}

impl InsertOutcome {
    /// 冲突视为错误（人工新建路径）
    pub fn into_inserted(self, draft: &AssignmentDraft) -> RepositoryResult<ScheduleAssignment> {
        match self {
            InsertOutcome::Inserted(created) => Ok(created),
            InsertOutcome::Conflict { existing_id } => Err(RepositoryError::DuplicateAssignment {
                rider_id: draft.rider_id,
                shift_date: draft.shift_date,
                existing_id,
            }),
        }
    }
}

fn map_assignment(row: &Row<'_>) -> SqliteResult<ScheduleAssignment> {
    Ok(ScheduleAssignment {
        id: row.get(0)?,
        rider_id: row.get(1)?,
        branch_id: row.get(2)?,
        brand_id: row.get(3)?,
        shift_date: parse_date(4, &row.get::<_, String>(4)?)?,
        shift_type: parse_shift_type(5, &row.get::<_, String>(5)?)?,
        start_time: parse_time(6, row.get(6)?)?,
        end_time: parse_time(7, row.get(7)?)?,
        manual_override: row.get(8)?,
        notes: row.get(9)?,
        created_at: parse_timestamp(10, &row.get::<_, String>(10)?)?,
        updated_at: parse_timestamp(11, &row.get::<_, String>(11)?)?,
    })
}

fn map_detail(row: &Row<'_>) -> SqliteResult<AssignmentDetail> {
    let assignment = map_assignment(row)?;
    let rider = map_rider(row, 12)?;

    let branch = match row.get::<_, Option<i64>>(19)? {
        Some(id) => Some(Branch {
            id,
            code: row.get(20)?,
            name: row.get(21)?,
            zone: row.get(22)?,
            address: row.get(23)?,
        }),
        None => None,
    };
    let brand = match row.get::<_, Option<i64>>(24)? {
        Some(id) => Some(ExternalBrand {
            id,
            name: row.get(25)?,
        }),
        None => None,
    };

    // 悬空引用属于数据完整性错误
    if assignment.branch_id.is_some() && branch.is_none() {
        return Err(conversion_error(
            2,
            format!("排班 {} 引用的门店不存在", assignment.id),
        ));
    }
    if assignment.brand_id.is_some() && brand.is_none() {
        return Err(conversion_error(
            3,
            format!("排班 {} 引用的外部品牌不存在", assignment.id),
        ));
    }

    Ok(AssignmentDetail {
        assignment,
        rider,
        branch,
        brand,
    })
}

fn query_by_date(conn: &Connection, shift_date: NaiveDate) -> SqliteResult<Vec<ScheduleAssignment>> {
    let sql = format!(
        "SELECT {} FROM schedule_assignment a WHERE a.shift_date = ?1 ORDER BY a.id ASC",
        ASSIGNMENT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![format_date(shift_date)], map_assignment)?
        .collect::<SqliteResult<Vec<_>>>()?;
    Ok(rows)
}

fn query_by_id(conn: &Connection, id: i64) -> SqliteResult<Option<ScheduleAssignment>> {
    let sql = format!(
        "SELECT {} FROM schedule_assignment a WHERE a.id = ?1",
        ASSIGNMENT_COLUMNS
    );
    conn.query_row(&sql, params![id], map_assignment).optional()
}

// ==========================================
// AssignmentRepository - 排班分配仓储
// ==========================================
pub struct AssignmentRepository {
    conn: Arc<Mutex<Connection>>,
    // 读连接: 文件库 WAL 模式下读不阻塞写
    read_conn: Arc<Mutex<Connection>>,
}

impl AssignmentRepository {
    /// 读写共用一个连接
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            read_conn: conn.clone(),
            conn,
        }
    }

    /// 读写分离
    pub fn with_read_connection(
        conn: Arc<Mutex<Connection>>,
        read_conn: Arc<Mutex<Connection>>,
    ) -> Self {
        Self { conn, read_conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn get_read_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.read_conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<ScheduleAssignment>> {
        let conn = self.get_read_conn()?;
        Ok(query_by_id(&conn, id)?)
    }

    /// 查询某骑手某日期的排班
    pub fn find_by_slot(
        &self,
        rider_id: i64,
        shift_date: NaiveDate,
    ) -> RepositoryResult<Option<ScheduleAssignment>> {
        let conn = self.get_read_conn()?;
        let sql = format!(
            "SELECT {} FROM schedule_assignment a WHERE a.rider_id = ?1 AND a.shift_date = ?2",
            ASSIGNMENT_COLUMNS
        );
        Ok(conn
            .query_row(&sql, params![rider_id, format_date(shift_date)], map_assignment)
            .optional()?)
    }

    /// 查询某日期的全部排班
    pub fn find_by_date(&self, shift_date: NaiveDate) -> RepositoryResult<Vec<ScheduleAssignment>> {
        let conn = self.get_read_conn()?;
        Ok(query_by_date(&conn, shift_date)?)
    }

    /// 查询日期区间（含两端）内的排班，并解析骑手/门店/品牌
    ///
    /// # 排序
    /// shift_date ASC, 骑手姓名 ASC, id ASC
    pub fn list_details(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> RepositoryResult<Vec<AssignmentDetail>> {
        let conn = self.get_read_conn()?;
        let sql = format!(
            r#"
            SELECT {},
                r.id, r.full_name, r.active, r.rider_type, r.identification, r.home_branch_id, r.note,
                b.id, b.code, b.name, b.zone, b.address,
                e.id, e.name
            FROM schedule_assignment a
            JOIN rider r ON r.id = a.rider_id
            LEFT JOIN branch b ON b.id = a.branch_id
            LEFT JOIN external_brand e ON e.id = a.brand_id
            WHERE a.shift_date >= ?1 AND a.shift_date <= ?2
            ORDER BY a.shift_date ASC, r.full_name ASC, a.id ASC
            "#,
            ASSIGNMENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let details = stmt
            .query_map(
                params![format_date(start_date), format_date(end_date)],
                map_detail,
            )?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(details)
    }

    /// 统计区间内排班数量
    pub fn count_in_range(&self, start_date: NaiveDate, end_date: NaiveDate) -> RepositoryResult<i64> {
        let conn = self.get_read_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM schedule_assignment WHERE shift_date >= ?1 AND shift_date <= ?2",
            params![format_date(start_date), format_date(end_date)],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 不存在则插入
    ///
    /// # 参数
    /// - `draft`: 新建参数（调用方已完成字段校验）
    /// - `manual_override`: 覆写标记
    /// - `guard`: 冲突检查，入参为候选 (rider_id, shift_date) 与当日全部排班，
    ///   返回已存在排班的 id 表示冲突
    ///
    /// # 说明
    /// 检查与写入在同一个 IMMEDIATE 事务中，期间其他写者无法插入
    pub fn insert_if_absent<F>(
        &self,
        draft: &AssignmentDraft,
        manual_override: bool,
        guard: F,
    ) -> RepositoryResult<InsertOutcome>
    where
        F: FnOnce(i64, NaiveDate, &[ScheduleAssignment]) -> Option<i64>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let same_day = query_by_date(&tx, draft.shift_date)?;
        if let Some(existing_id) = guard(draft.rider_id, draft.shift_date, &same_day) {
            return Ok(InsertOutcome::Conflict {
                existing_id: Some(existing_id),
            });
        }

        let now = now_timestamp();
        let inserted = tx.execute(
            r#"
            INSERT INTO schedule_assignment (
                rider_id, branch_id, brand_id, shift_date, shift_type,
                start_time, end_time, manual_override, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                draft.rider_id,
                draft.branch_id,
                draft.brand_id,
                format_date(draft.shift_date),
                draft.shift_type.to_db_str(),
                format_time(draft.start_time),
                format_time(draft.end_time),
                manual_override,
                draft.notes,
                format_timestamp(now),
                format_timestamp(now),
            ],
        );

        if let Err(e) = inserted {
            return match RepositoryError::from(e) {
                RepositoryError::UniqueConstraintViolation(_) => {
                    Ok(InsertOutcome::Conflict { existing_id: None })
                }
                other => Err(other),
            };
        }

        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(InsertOutcome::Inserted(ScheduleAssignment {
            id,
            rider_id: draft.rider_id,
            branch_id: draft.branch_id,
            brand_id: draft.brand_id,
            shift_date: draft.shift_date,
            shift_type: draft.shift_type,
            start_time: draft.start_time,
            end_time: draft.end_time,
            manual_override,
            notes: draft.notes.clone(),
            created_at: now,
            updated_at: now,
        }))
    }

    /// 读-改-写更新
    ///
    /// # 参数
    /// - `id`: 排班ID
    /// - `apply`: 由当前记录计算新记录（Override Controller）
    ///
    /// # 返回
    /// - Err(NotFound): 排班不存在
    pub fn update_with<F>(&self, id: i64, apply: F) -> RepositoryResult<ScheduleAssignment>
    where
        F: FnOnce(ScheduleAssignment) -> RepositoryResult<ScheduleAssignment>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = query_by_id(&tx, id)?
            .ok_or_else(|| RepositoryError::not_found("ScheduleAssignment", id))?;
        let mut next = apply(current)?;
        next.updated_at = now_timestamp();

        tx.execute(
            r#"
            UPDATE schedule_assignment
            SET branch_id = ?1, brand_id = ?2, shift_type = ?3,
                start_time = ?4, end_time = ?5, manual_override = ?6,
                notes = ?7, updated_at = ?8
            WHERE id = ?9
            "#,
            params![
                next.branch_id,
                next.brand_id,
                next.shift_type.to_db_str(),
                format_time(next.start_time),
                format_time(next.end_time),
                next.manual_override,
                next.notes,
                format_timestamp(next.updated_at),
                id,
            ],
        )?;
        tx.commit()?;
        Ok(next)
    }

    /// 删除排班，返回被删除的记录
    ///
    /// 不幂等: 不存在时返回 NotFound
    pub fn delete(&self, id: i64) -> RepositoryResult<ScheduleAssignment> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = query_by_id(&tx, id)?
            .ok_or_else(|| RepositoryError::not_found("ScheduleAssignment", id))?;
        tx.execute("DELETE FROM schedule_assignment WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(current)
    }
}
