// ==========================================
// 骑手排班系统 - 骑手领域模型
// ==========================================
// 归属: 骑手登记簿 (registry)
// 排班核心只读引用，不修改
// ==========================================

use crate::domain::patch::double_option;
use crate::domain::types::RiderType;
use serde::{Deserialize, Serialize};

// ==========================================
// Rider - 骑手
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rider {
    pub id: i64,
    pub full_name: String,
    pub active: bool,
    pub rider_type: RiderType,
    pub identification: Option<String>, // 证件号 (CC)
    pub home_branch_id: Option<i64>,    // 所属门店
    pub note: Option<String>,           // 备注 (OBSERVACION)
}

/// 新建骑手参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderDraft {
    pub full_name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    pub rider_type: RiderType,
    #[serde(default)]
    pub identification: Option<String>,
    #[serde(default)]
    pub home_branch_id: Option<i64>,
    #[serde(default)]
    pub note: Option<String>,
}

fn default_active() -> bool {
    true
}

impl RiderDraft {
    pub fn new(full_name: impl Into<String>, rider_type: RiderType) -> Self {
        Self {
            full_name: full_name.into(),
            active: true,
            rider_type,
            identification: None,
            home_branch_id: None,
            note: None,
        }
    }
}

/// 骑手局部更新
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiderPatch {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub rider_type: Option<RiderType>,
    #[serde(default, deserialize_with = "double_option")]
    pub identification: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub home_branch_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub note: Option<Option<String>>,
}
