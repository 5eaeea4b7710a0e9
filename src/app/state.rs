// ==========================================
// 骑手排班系统 - 应用状态
// ==========================================
// 职责: 打开数据库、加载配置、装配仓储与 API 实例
// ==========================================

use crate::api::{ApiError, ApiResult, ConfigApi, ImportApi, RegistryApi, ScheduleApi};
use crate::app::session::ScheduleSession;
use crate::config::{ConfigManager, ScheduleConfig};
use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::assignment::DateWindow;
use crate::engine::{RotationShiftGenerator, ShiftGenerator};
use crate::importer::EntityImporter;
use crate::repository::{
    ActionLogRepository, AssignmentRepository, BranchRepository, BrandRepository, RiderRepository,
};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::info;

/// 环境变量: 显式指定数据库路径
pub const DB_PATH_ENV: &str = "RIDER_SCHEDULING_DB_PATH";

const IN_MEMORY_PATH: &str = ":memory:";

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 启动时加载的排班配置
    pub config: ScheduleConfig,

    /// 排班API
    pub schedule_api: Arc<ScheduleApi>,

    /// 主数据API
    pub registry_api: Arc<RegistryApi>,

    /// 主数据导入API
    pub import_api: Arc<ImportApi>,

    /// 配置管理API
    pub config_api: Arc<ConfigApi>,
}

fn open(db_path: &str) -> ApiResult<Connection> {
    // ":memory:" 同样走统一 PRAGMA（journal_mode 返回 memory）
    open_sqlite_connection(db_path)
        .map_err(|e| ApiError::DatabaseConnectionError(format!("无法打开数据库 {}: {}", db_path, e)))
}

impl AppState {
    /// 使用默认生成服务创建 AppState
    pub fn new(db_path: String) -> ApiResult<Self> {
        Self::with_generator(db_path, Arc::new(RotationShiftGenerator::default()))
    }

    /// 创建 AppState
    ///
    /// # 说明
    /// 1. 打开写连接并初始化 schema
    /// 2. 文件库额外打开只读查询连接（WAL 下读不阻塞写）
    /// 3. 从 config_kv 加载 ScheduleConfig
    /// 4. 装配 Repository 与 API
    pub fn with_generator(db_path: String, generator: Arc<dyn ShiftGenerator>) -> ApiResult<Self> {
        info!(db_path = %db_path, "初始化AppState");

        let conn = open(&db_path)?;
        init_schema(&conn).map_err(|e| ApiError::DatabaseError(format!("schema 初始化失败: {}", e)))?;
        let conn = Arc::new(Mutex::new(conn));

        let read_conn = if db_path == IN_MEMORY_PATH {
            conn.clone()
        } else {
            Arc::new(Mutex::new(open(&db_path)?))
        };

        // ==========================================
        // 配置
        // ==========================================
        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone()));
        let config = config_manager.load_schedule_config()?;

        // ==========================================
        // Repository
        // ==========================================
        let assignment_repo = Arc::new(AssignmentRepository::with_read_connection(
            conn.clone(),
            read_conn,
        ));
        let rider_repo = Arc::new(RiderRepository::new(conn.clone()));
        let branch_repo = Arc::new(BranchRepository::new(conn.clone()));
        let brand_repo = Arc::new(BrandRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn));

        // ==========================================
        // API
        // ==========================================
        let schedule_api = Arc::new(ScheduleApi::new(
            assignment_repo,
            rider_repo.clone(),
            branch_repo.clone(),
            brand_repo.clone(),
            action_log_repo.clone(),
            generator,
            &config,
        ));
        let registry_api = Arc::new(RegistryApi::new(
            rider_repo.clone(),
            branch_repo.clone(),
            brand_repo.clone(),
        ));
        let import_api = Arc::new(ImportApi::new(
            EntityImporter::new(rider_repo, branch_repo, brand_repo),
            action_log_repo,
            config.operator_name.clone(),
        ));
        let config_api = Arc::new(ConfigApi::new(config_manager));

        info!(locale = %config.locale, "AppState初始化完成");
        Ok(Self {
            db_path,
            config,
            schedule_api,
            registry_api,
            import_api,
            config_api,
        })
    }

    /// 创建排班会话
    ///
    /// # 参数
    /// - `start`: 窗口起始日期
    /// - `days`: 窗口天数, 为空时取配置的 default_window_days
    pub fn session(&self, start: NaiveDate, days: Option<u32>) -> ScheduleSession {
        let window = DateWindow::new(start, days.unwrap_or(self.config.default_window_days));
        ScheduleSession::new(self.schedule_api.clone(), self.registry_api.clone(), window)
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./rider_scheduling.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("rider-scheduling");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("rider_scheduling.db");
        }
    }
    path.to_string_lossy().to_string()
}
