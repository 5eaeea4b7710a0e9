// ==========================================
// 骑手排班系统 - 应用层
// ==========================================
// 职责: 应用装配、会话状态、用户通知
// ==========================================

pub mod notification;
pub mod session;
pub mod state;

// 重导出
pub use notification::{Notification, Severity, STALE_VIEW_CODE};
pub use session::ScheduleSession;
pub use state::{get_default_db_path, AppState};
