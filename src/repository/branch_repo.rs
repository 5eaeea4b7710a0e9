// ==========================================
// 骑手排班系统 - 门店 / 外部品牌数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::branch::{Branch, BranchDraft, BranchPatch, ExternalBrand};
use crate::domain::patch::apply_nullable;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const BRANCH_COLUMNS: &str = "id, code, name, zone, address";

fn map_branch(row: &Row<'_>) -> SqliteResult<Branch> {
    Ok(Branch {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        zone: row.get(3)?,
        address: row.get(4)?,
    })
}

// ==========================================
// BranchRepository - 门店仓储
// ==========================================
pub struct BranchRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BranchRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建门店，返回落库记录
    pub fn create(&self, draft: &BranchDraft) -> RepositoryResult<Branch> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO branch (code, name, zone, address) VALUES (?1, ?2, ?3, ?4)",
            params![draft.code, draft.name, draft.zone, draft.address],
        )?;
        let id = conn.last_insert_rowid();
        Ok(Branch {
            id,
            code: draft.code.clone(),
            name: draft.name.clone(),
            zone: draft.zone.clone(),
            address: draft.address.clone(),
        })
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Branch>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM branch WHERE id = ?1", BRANCH_COLUMNS);
        Ok(conn.query_row(&sql, params![id], map_branch).optional()?)
    }

    pub fn find_by_code(&self, code: &str) -> RepositoryResult<Option<Branch>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM branch WHERE code = ?1", BRANCH_COLUMNS);
        Ok(conn.query_row(&sql, params![code], map_branch).optional()?)
    }

    pub fn list(&self) -> RepositoryResult<Vec<Branch>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM branch ORDER BY code ASC", BRANCH_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let branches = stmt
            .query_map([], map_branch)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(branches)
    }

    /// 局部更新门店
    pub fn update(&self, id: i64, patch: &BranchPatch) -> RepositoryResult<Branch> {
        let mut branch = self
            .find_by_id(id)?
            .ok_or_else(|| RepositoryError::not_found("Branch", id))?;

        if let Some(code) = &patch.code {
            branch.code = code.clone();
        }
        if let Some(name) = &patch.name {
            branch.name = name.clone();
        }
        apply_nullable(&mut branch.zone, patch.zone.clone());
        apply_nullable(&mut branch.address, patch.address.clone());

        let conn = self.get_conn()?;
        conn.execute(
            "UPDATE branch SET code = ?1, name = ?2, zone = ?3, address = ?4 WHERE id = ?5",
            params![branch.code, branch.name, branch.zone, branch.address, id],
        )?;
        Ok(branch)
    }

    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM branch WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(RepositoryError::not_found("Branch", id));
        }
        Ok(())
    }
}

// ==========================================
// BrandRepository - 外部品牌仓储
// ==========================================
pub struct BrandRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BrandRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn create(&self, name: &str) -> RepositoryResult<ExternalBrand> {
        let conn = self.get_conn()?;
        conn.execute("INSERT INTO external_brand (name) VALUES (?1)", params![name])?;
        Ok(ExternalBrand {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<ExternalBrand>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                "SELECT id, name FROM external_brand WHERE id = ?1",
                params![id],
                |row| {
                    Ok(ExternalBrand {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Option<ExternalBrand>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                "SELECT id, name FROM external_brand WHERE name = ?1",
                params![name],
                |row| {
                    Ok(ExternalBrand {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn list(&self) -> RepositoryResult<Vec<ExternalBrand>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT id, name FROM external_brand ORDER BY name ASC")?;
        let brands = stmt
            .query_map([], |row| {
                Ok(ExternalBrand {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(brands)
    }

    pub fn rename(&self, id: i64, name: &str) -> RepositoryResult<ExternalBrand> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE external_brand SET name = ?1 WHERE id = ?2",
            params![name, id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("ExternalBrand", id));
        }
        Ok(ExternalBrand {
            id,
            name: name.to_string(),
        })
    }

    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM external_brand WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(RepositoryError::not_found("ExternalBrand", id));
        }
        Ok(())
    }
}
