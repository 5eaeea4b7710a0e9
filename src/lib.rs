// ==========================================
// 骑手排班系统 - 核心库
// ==========================================
// 核心: 排班分配模型 (Assignment Scheduling Model)
// 技术栈: Rust + SQLite
// 红线: (rider_id, shift_date) 唯一; manual_override 单调; 生成不覆盖已有排班
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 排班规则与外部服务边界
pub mod engine;

// 导入层 - 主数据表格导入
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/schema）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配与会话
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{OverrideState, RiderType, ShiftType};

// 领域实体
pub use domain::{
    ActionLog, ActionType, AssignmentDetail, AssignmentDraft, AssignmentPatch, Branch,
    DateWindow, ExternalBrand, Rider, ScheduleAssignment,
};

// 引擎
pub use engine::{
    ConflictGuard, ExportBoundary, FilterEngine, FilterSpec, GenerationBoundary,
    OverrideController, RotationShiftGenerator, Selector, ShiftGenerator,
};

// API
pub use api::{ApiError, ApiResult, ImportApi, RegistryApi, ScheduleApi};

// 应用
pub use app::{AppState, Notification, ScheduleSession};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "骑手排班系统";
