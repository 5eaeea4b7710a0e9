// ==========================================
// 骑手排班系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================
// 调用方通过 load_schedule_config() 取得显式的 ScheduleConfig,
// 各边界只接收该值, 不在运行中回读配置表
// ==========================================

use crate::db::open_sqlite_connection;
use crate::engine::generation::MAX_GENERATION_DAYS;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

const GLOBAL_SCOPE: &str = "global";

/// 支持的界面语言
pub const SUPPORTED_LOCALES: [&str; 3] = ["zh-CN", "en", "es"];

// ==========================================
// ScheduleConfig - 排班运行配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub export_base_url: String,
    pub generation_timeout_ms: u64,
    pub generation_max_days: u32,
    pub default_window_days: u32,
    pub operator_name: String,
    pub locale: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            export_base_url: defaults::EXPORT_BASE_URL.to_string(),
            generation_timeout_ms: defaults::GENERATION_TIMEOUT_MS,
            generation_max_days: defaults::GENERATION_MAX_DAYS,
            default_window_days: defaults::DEFAULT_WINDOW_DAYS,
            operator_name: defaults::OPERATOR_NAME.to_string(),
            locale: defaults::LOCALE.to_string(),
        }
    }
}

/// 配置项（含默认值标记）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub is_default: bool,
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?)
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: std::str::FromStr + Copy + std::fmt::Display,
    {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                warn!(config_key = key, raw_value = %raw, default = %default, "配置值格式错误，使用默认值");
                Ok(default)
            }
        }
    }

    /// 写入配置（校验后 upsert）
    ///
    /// # 返回
    /// - Err(FieldValueError): 未知键或值不合法
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let value = validate_value(key, value)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')
            "#,
            params![GLOBAL_SCOPE, key, value],
        )?;
        debug!(config_key = key, value = %value, "配置已更新");
        Ok(())
    }

    /// 列出全部已知配置（未设置的以默认值给出）
    pub fn list_configs(&self) -> RepositoryResult<Vec<ConfigEntry>> {
        let stored = self.stored_values()?;
        Ok(config_keys::ALL
            .iter()
            .map(|key| match stored.get(*key) {
                Some(value) => ConfigEntry {
                    key: key.to_string(),
                    value: value.clone(),
                    is_default: false,
                },
                None => ConfigEntry {
                    key: key.to_string(),
                    value: defaults::value_of(key).to_string(),
                    is_default: true,
                },
            })
            .collect())
    }

    /// 获取已存储配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let stored = self.stored_values()?;
        serde_json::to_string(&json!(stored))
            .map_err(|e| RepositoryError::InternalError(e.to_string()))
    }

    fn stored_values(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut values = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            values.insert(key, value);
        }
        Ok(values)
    }

    // ===== 排班配置 =====

    pub fn get_export_base_url(&self) -> RepositoryResult<String> {
        self.get_config_or_default(config_keys::EXPORT_BASE_URL, defaults::EXPORT_BASE_URL)
    }

    pub fn get_generation_timeout_ms(&self) -> RepositoryResult<u64> {
        self.get_parsed_or_default(
            config_keys::GENERATION_TIMEOUT_MS,
            defaults::GENERATION_TIMEOUT_MS,
        )
    }

    /// 生成窗口上限, 收敛到 1..=31
    pub fn get_generation_max_days(&self) -> RepositoryResult<u32> {
        let days = self.get_parsed_or_default(
            config_keys::GENERATION_MAX_DAYS,
            defaults::GENERATION_MAX_DAYS,
        )?;
        Ok(days.clamp(1, MAX_GENERATION_DAYS))
    }

    pub fn get_default_window_days(&self) -> RepositoryResult<u32> {
        let days = self.get_parsed_or_default(
            config_keys::DEFAULT_WINDOW_DAYS,
            defaults::DEFAULT_WINDOW_DAYS,
        )?;
        Ok(days.max(1))
    }

    pub fn get_operator_name(&self) -> RepositoryResult<String> {
        self.get_config_or_default(config_keys::OPERATOR_NAME, defaults::OPERATOR_NAME)
    }

    pub fn get_locale(&self) -> RepositoryResult<String> {
        self.get_config_or_default(config_keys::LOCALE, defaults::LOCALE)
    }

    /// 加载完整排班配置
    pub fn load_schedule_config(&self) -> RepositoryResult<ScheduleConfig> {
        Ok(ScheduleConfig {
            export_base_url: self.get_export_base_url()?,
            generation_timeout_ms: self.get_generation_timeout_ms()?,
            generation_max_days: self.get_generation_max_days()?,
            default_window_days: self.get_default_window_days()?,
            operator_name: self.get_operator_name()?,
            locale: self.get_locale()?,
        })
    }
}

fn validate_value(key: &str, value: &str) -> RepositoryResult<String> {
    let value = value.trim();
    let invalid = |message: String| RepositoryError::FieldValueError {
        field: key.to_string(),
        message,
    };

    match key {
        config_keys::GENERATION_TIMEOUT_MS => match value.parse::<u64>() {
            Ok(ms) if ms > 0 => Ok(ms.to_string()),
            _ => Err(invalid(format!("需要正整数（毫秒）, 实际为 '{}'", value))),
        },
        config_keys::GENERATION_MAX_DAYS => match value.parse::<u32>() {
            Ok(days) if (1..=MAX_GENERATION_DAYS).contains(&days) => Ok(days.to_string()),
            _ => Err(invalid(format!(
                "需要 1..={} 之间的整数, 实际为 '{}'",
                MAX_GENERATION_DAYS, value
            ))),
        },
        config_keys::DEFAULT_WINDOW_DAYS => match value.parse::<u32>() {
            Ok(days) if days >= 1 => Ok(days.to_string()),
            _ => Err(invalid(format!("需要正整数, 实际为 '{}'", value))),
        },
        config_keys::EXPORT_BASE_URL => {
            if value.starts_with("http://") || value.starts_with("https://") {
                Ok(value.to_string())
            } else {
                Err(invalid(format!("需要 http(s) 地址, 实际为 '{}'", value)))
            }
        }
        config_keys::OPERATOR_NAME => {
            if value.is_empty() {
                Err(invalid("不能为空".to_string()))
            } else {
                Ok(value.to_string())
            }
        }
        config_keys::LOCALE => {
            if SUPPORTED_LOCALES.contains(&value) {
                Ok(value.to_string())
            } else {
                Err(invalid(format!(
                    "支持的语言: {}, 实际为 '{}'",
                    SUPPORTED_LOCALES.join(", "),
                    value
                )))
            }
        }
        _ => Err(invalid("未知配置键".to_string())),
    }
}

// ==========================================
// 默认值
// ==========================================
pub mod defaults {
    use super::config_keys;

    pub const EXPORT_BASE_URL: &str = "http://localhost:8000";
    pub const GENERATION_TIMEOUT_MS: u64 = 30_000;
    pub const GENERATION_MAX_DAYS: u32 = 31;
    pub const DEFAULT_WINDOW_DAYS: u32 = 7;
    pub const OPERATOR_NAME: &str = "operator";
    pub const LOCALE: &str = "zh-CN";

    /// 默认值的字符串形式
    pub fn value_of(key: &str) -> String {
        match key {
            config_keys::EXPORT_BASE_URL => EXPORT_BASE_URL.to_string(),
            config_keys::GENERATION_TIMEOUT_MS => GENERATION_TIMEOUT_MS.to_string(),
            config_keys::GENERATION_MAX_DAYS => GENERATION_MAX_DAYS.to_string(),
            config_keys::DEFAULT_WINDOW_DAYS => DEFAULT_WINDOW_DAYS.to_string(),
            config_keys::OPERATOR_NAME => OPERATOR_NAME.to_string(),
            config_keys::LOCALE => LOCALE.to_string(),
            _ => String::new(),
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 导出
    pub const EXPORT_BASE_URL: &str = "export_base_url";

    // 生成
    pub const GENERATION_TIMEOUT_MS: &str = "generation_timeout_ms";
    pub const GENERATION_MAX_DAYS: &str = "generation_max_days";

    // 会话
    pub const DEFAULT_WINDOW_DAYS: &str = "default_window_days";
    pub const OPERATOR_NAME: &str = "operator_name"; // 审计日志中的操作人
    pub const LOCALE: &str = "locale";

    pub const ALL: [&str; 6] = [
        EXPORT_BASE_URL,
        GENERATION_TIMEOUT_MS,
        GENERATION_MAX_DAYS,
        DEFAULT_WINDOW_DAYS,
        OPERATOR_NAME,
        LOCALE,
    ];
}
