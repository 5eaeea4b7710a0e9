// ==========================================
// 骑手排班系统 - 排班筛选 (Filter Engine)
// ==========================================
// 纯函数: 输入排班列表 + 筛选条件 -> 子列表
// 约束: 不修改输入, 保持原有顺序, 幂等
// ==========================================

use crate::domain::assignment::AssignmentDetail;
use crate::domain::types::{RiderType, ShiftType};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ==========================================
// Selector - "全部" 或 单一取值
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector<T> {
    All,
    Only(T),
}

impl<T> Default for Selector<T> {
    fn default() -> Self {
        Selector::All
    }
}

impl<T: PartialEq> Selector<T> {
    pub fn accepts(&self, value: &T) -> bool {
        match self {
            Selector::All => true,
            Selector::Only(expected) => expected == value,
        }
    }

    /// 可空字段: Only 只匹配有值且相等的记录
    pub fn accepts_opt(&self, value: Option<&T>) -> bool {
        match self {
            Selector::All => true,
            Selector::Only(expected) => value == Some(expected),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selector::All)
    }
}

impl<T> Selector<T> {
    /// 解析 "all"（大小写不敏感）或具体取值
    pub fn parse_with<F>(s: &str, parse: F) -> Option<Self>
    where
        F: FnOnce(&str) -> Option<T>,
    {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Some(Selector::All);
        }
        parse(s).map(Selector::Only)
    }
}

impl FromStr for Selector<i64> {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse_with(s, |v| v.parse().ok()).ok_or_else(|| format!("无效的ID筛选: {}", s))
    }
}

impl FromStr for Selector<ShiftType> {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse_with(s, ShiftType::from_code).ok_or_else(|| format!("无效的班次类型: {}", s))
    }
}

impl FromStr for Selector<RiderType> {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse_with(s, RiderType::from_code).ok_or_else(|| format!("无效的骑手类型: {}", s))
    }
}

// ==========================================
// FilterSpec - 筛选条件
// ==========================================
// 各维度之间为 AND 关系
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub branch: Selector<i64>,
    #[serde(default)]
    pub brand: Selector<i64>,
    #[serde(default)]
    pub shift_type: Selector<ShiftType>,
    #[serde(default)]
    pub rider_type: Selector<RiderType>,
}

impl FilterSpec {
    pub fn matches(&self, detail: &AssignmentDetail) -> bool {
        let a = &detail.assignment;
        self.branch.accepts_opt(a.branch_id.as_ref())
            && self.brand.accepts_opt(a.brand_id.as_ref())
            && self.shift_type.accepts(&a.shift_type)
            && self.rider_type.accepts(&detail.rider.rider_type)
    }

    pub fn is_unfiltered(&self) -> bool {
        self.branch.is_all()
            && self.brand.is_all()
            && self.shift_type.is_all()
            && self.rider_type.is_all()
    }
}

// ==========================================
// FilterEngine
// ==========================================
pub struct FilterEngine;

impl FilterEngine {
    /// 应用筛选
    ///
    /// # 返回
    /// 输入的有序子序列（借用）
    pub fn apply<'a>(criteria: &FilterSpec, items: &'a [AssignmentDetail]) -> Vec<&'a AssignmentDetail> {
        items.iter().filter(|d| criteria.matches(d)).collect()
    }

    /// 应用筛选并克隆结果
    pub fn apply_owned(criteria: &FilterSpec, items: &[AssignmentDetail]) -> Vec<AssignmentDetail> {
        Self::apply(criteria, items).into_iter().cloned().collect()
    }
}
