// ==========================================
// 骑手排班系统 - 配置管理 API
// ==========================================
// 职责: 配置查询、更新
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{config_keys, ConfigEntry, ConfigManager, ScheduleConfig};
use std::sync::Arc;
use tracing::info;

pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    /// 查询所有配置（未设置的返回默认值）
    pub fn list_configs(&self) -> ApiResult<Vec<ConfigEntry>> {
        Ok(self.config_manager.list_configs()?)
    }

    pub fn get_config(&self, key: &str) -> ApiResult<ConfigEntry> {
        self.list_configs()?
            .into_iter()
            .find(|e| e.key == key)
            .ok_or_else(|| {
                ApiError::ValidationError(format!(
                    "未知配置键 '{}', 可用: {}",
                    key,
                    config_keys::ALL.join(", ")
                ))
            })
    }

    pub fn update_config(&self, key: &str, value: &str) -> ApiResult<ConfigEntry> {
        self.config_manager.set_config_value(key, value)?;
        info!(config_key = key, "配置已更新");
        self.get_config(key)
    }

    pub fn schedule_config(&self) -> ApiResult<ScheduleConfig> {
        Ok(self.config_manager.load_schedule_config()?)
    }
}
