// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 基于临时数据库装配完整 AppState
// ==========================================

use rider_scheduling::api::{ConfigApi, ImportApi, RegistryApi, ScheduleApi};
use rider_scheduling::app::AppState;
use rider_scheduling::engine::{RotationShiftGenerator, ShiftGenerator};
use rider_scheduling::logging;
use std::error::Error;
use std::sync::Arc;
use tempfile::NamedTempFile;

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// 每个环境独占一个临时 SQLite 文件
pub struct ApiTestEnv {
    pub db_path: String,
    pub state: AppState,
    pub schedule_api: Arc<ScheduleApi>,
    pub registry_api: Arc<RegistryApi>,
    pub import_api: Arc<ImportApi>,
    pub config_api: Arc<ConfigApi>,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl ApiTestEnv {
    /// 使用默认轮转生成服务
    pub fn new() -> Result<Self, Box<dyn Error>> {
        Self::with_generator(Arc::new(RotationShiftGenerator::default()))
    }

    /// 使用指定生成服务（测试桩）
    pub fn with_generator(generator: Arc<dyn ShiftGenerator>) -> Result<Self, Box<dyn Error>> {
        logging::init_test();
        let temp_file = NamedTempFile::new()?;
        let db_path = temp_file
            .path()
            .to_str()
            .ok_or("临时文件路径非 UTF-8")?
            .to_string();

        let state = AppState::with_generator(db_path.clone(), generator)?;
        Ok(Self {
            db_path,
            schedule_api: state.schedule_api.clone(),
            registry_api: state.registry_api.clone(),
            import_api: state.import_api.clone(),
            config_api: state.config_api.clone(),
            state,
            _temp_file: temp_file,
        })
    }

    /// 在同一数据库上重新装配（用于使配置变更生效）
    pub fn reopen(&self, generator: Arc<dyn ShiftGenerator>) -> Result<AppState, Box<dyn Error>> {
        Ok(AppState::with_generator(self.db_path.clone(), generator)?)
    }
}
