// ==========================================
// 骑手排班系统 - 主数据 API（骑手 / 门店 / 外部品牌）
// ==========================================
// 职责: 主数据增删改查, 排班核心只读引用这些数据
// 约束: 仍被排班或骑手引用的数据不可删除（外键保护）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::branch::{Branch, BranchDraft, BranchPatch, ExternalBrand};
use crate::domain::rider::{Rider, RiderDraft, RiderPatch};
use crate::repository::{BranchRepository, BrandRepository, RiderRepository};
use std::sync::Arc;
use tracing::info;

fn require_text(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::ValidationError(format!("{}不能为空", field)));
    }
    Ok(())
}

// ==========================================
// RegistryApi
// ==========================================
pub struct RegistryApi {
    rider_repo: Arc<RiderRepository>,
    branch_repo: Arc<BranchRepository>,
    brand_repo: Arc<BrandRepository>,
}

impl RegistryApi {
    pub fn new(
        rider_repo: Arc<RiderRepository>,
        branch_repo: Arc<BranchRepository>,
        brand_repo: Arc<BrandRepository>,
    ) -> Self {
        Self {
            rider_repo,
            branch_repo,
            brand_repo,
        }
    }

    // ===== 骑手 =====

    pub fn list_riders(&self, active_only: bool) -> ApiResult<Vec<Rider>> {
        Ok(self.rider_repo.list(active_only)?)
    }

    pub fn get_rider(&self, id: i64) -> ApiResult<Rider> {
        self.rider_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::not_found("Rider", id))
    }

    pub fn create_rider(&self, draft: &RiderDraft) -> ApiResult<Rider> {
        require_text("full_name", &draft.full_name)?;
        self.check_home_branch(draft.home_branch_id)?;
        let rider = self.rider_repo.create(draft)?;
        info!(rider_id = rider.id, rider_type = rider.rider_type.to_db_str(), "骑手已创建");
        Ok(rider)
    }

    pub fn update_rider(&self, id: i64, patch: &RiderPatch) -> ApiResult<Rider> {
        if let Some(full_name) = &patch.full_name {
            require_text("full_name", full_name)?;
        }
        if let Some(home_branch_id) = patch.home_branch_id {
            self.check_home_branch(home_branch_id)?;
        }
        Ok(self.rider_repo.update(id, patch)?)
    }

    pub fn delete_rider(&self, id: i64) -> ApiResult<()> {
        self.rider_repo.delete(id)?;
        info!(rider_id = id, "骑手已删除");
        Ok(())
    }

    fn check_home_branch(&self, branch_id: Option<i64>) -> ApiResult<()> {
        if let Some(id) = branch_id {
            if self.branch_repo.find_by_id(id)?.is_none() {
                return Err(ApiError::reference("Branch", id));
            }
        }
        Ok(())
    }

    // ===== 门店 =====

    pub fn list_branches(&self) -> ApiResult<Vec<Branch>> {
        Ok(self.branch_repo.list()?)
    }

    pub fn get_branch(&self, id: i64) -> ApiResult<Branch> {
        self.branch_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::not_found("Branch", id))
    }

    pub fn create_branch(&self, draft: &BranchDraft) -> ApiResult<Branch> {
        require_text("code", &draft.code)?;
        require_text("name", &draft.name)?;
        let branch = self.branch_repo.create(draft)?;
        info!(branch_id = branch.id, code = %branch.code, "门店已创建");
        Ok(branch)
    }

    pub fn update_branch(&self, id: i64, patch: &BranchPatch) -> ApiResult<Branch> {
        if let Some(code) = &patch.code {
            require_text("code", code)?;
        }
        if let Some(name) = &patch.name {
            require_text("name", name)?;
        }
        Ok(self.branch_repo.update(id, patch)?)
    }

    pub fn delete_branch(&self, id: i64) -> ApiResult<()> {
        self.branch_repo.delete(id)?;
        info!(branch_id = id, "门店已删除");
        Ok(())
    }

    // ===== 外部品牌 =====

    pub fn list_brands(&self) -> ApiResult<Vec<ExternalBrand>> {
        Ok(self.brand_repo.list()?)
    }

    pub fn get_brand(&self, id: i64) -> ApiResult<ExternalBrand> {
        self.brand_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::not_found("ExternalBrand", id))
    }

    pub fn create_brand(&self, name: &str) -> ApiResult<ExternalBrand> {
        require_text("name", name)?;
        let brand = self.brand_repo.create(name.trim())?;
        info!(brand_id = brand.id, name = %brand.name, "外部品牌已创建");
        Ok(brand)
    }

    pub fn rename_brand(&self, id: i64, name: &str) -> ApiResult<ExternalBrand> {
        require_text("name", name)?;
        Ok(self.brand_repo.rename(id, name.trim())?)
    }

    pub fn delete_brand(&self, id: i64) -> ApiResult<()> {
        self.brand_repo.delete(id)?;
        info!(brand_id = id, "外部品牌已删除");
        Ok(())
    }
}
