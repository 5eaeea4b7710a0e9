// ==========================================
// 骑手排班系统 - 门店 / 外部品牌领域模型
// ==========================================
// 归属: 实体登记簿 (registry)
// 排班核心只读引用，不修改
// ==========================================

use crate::domain::patch::double_option;
use serde::{Deserialize, Serialize};

// ==========================================
// Branch - 门店
// ==========================================
// 约束: code 全局唯一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub zone: Option<String>,
    pub address: Option<String>,
}

/// 新建门店参数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BranchDraft {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// 门店局部更新
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BranchPatch {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub zone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
}

// ==========================================
// ExternalBrand - 外部品牌
// ==========================================
// 约束: name 全局唯一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalBrand {
    pub id: i64,
    pub name: String,
}
