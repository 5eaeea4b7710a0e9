// ==========================================
// 骑手排班系统 - 引擎层
// ==========================================
// 职责: 排班规则（冲突守卫 / 覆写控制 / 筛选）与外部服务边界
// 红线: Engine 不拼 SQL, 写入一律经由仓储
// ==========================================

pub mod conflict_guard;
pub mod export;
pub mod filter;
pub mod generation;
pub mod generator;
pub mod override_controller;

// 重导出核心引擎
pub use conflict_guard::ConflictGuard;
pub use export::{ExportBoundary, ExportError, ExportReference};
pub use filter::{FilterEngine, FilterSpec, Selector};
pub use generation::{GenerationBoundary, GenerationOutcome, MAX_GENERATION_DAYS};
pub use generator::{GenerationError, GenerationRequest, RotationShiftGenerator, ShiftGenerator};
pub use override_controller::{CreationOrigin, OverrideController, OverrideError};
