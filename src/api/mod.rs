// ==========================================
// 骑手排班系统 - API 层
// ==========================================
// 职责: 对外业务接口, 统一错误类型
// ==========================================

pub mod config_api;
pub mod error;
pub mod import_api;
pub mod registry_api;
pub mod schedule_api;

// 重导出
pub use config_api::ConfigApi;
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use import_api::ImportApi;
pub use registry_api::RegistryApi;
pub use schedule_api::ScheduleApi;
