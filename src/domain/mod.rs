// ==========================================
// 骑手排班系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod assignment;
pub mod branch;
pub mod patch;
pub mod rider;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use assignment::{
    AssignmentDetail, AssignmentDraft, AssignmentPatch, DateWindow, ScheduleAssignment,
};
pub use branch::{Branch, BranchDraft, BranchPatch, ExternalBrand};
pub use rider::{Rider, RiderDraft, RiderPatch};
pub use types::{OverrideState, RiderType, ShiftType};
