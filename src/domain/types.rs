// ==========================================
// 骑手排班系统 - 领域类型定义
// ==========================================
// 班次类型 / 骑手类型 / 覆写状态
// 约束: 封闭枚举, 所有消费方必须穷举匹配
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 班次类型 (Shift Type)
// ==========================================
// 存储格式: SCREAMING_SNAKE_CASE
// 兼容: 历史表格中的西语标签 (AM / PM / AM Y PM / DESCANSO / DISPONIBLE / EXTERNO)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftType {
    Morning,             // 早班
    Afternoon,           // 晚班
    MorningAndAfternoon, // 全天
    RestDay,             // 休息
    OnCallAvailable,     // 待命
    External,            // 外部品牌
}

impl ShiftType {
    /// 全部班次类型（用于筛选下拉、CLI 帮助）
    pub const ALL: [ShiftType; 6] = [
        ShiftType::Morning,
        ShiftType::Afternoon,
        ShiftType::MorningAndAfternoon,
        ShiftType::RestDay,
        ShiftType::OnCallAvailable,
        ShiftType::External,
    ];

    /// 从字符串解析班次类型
    ///
    /// 同时接受存储码和历史标签，大小写不敏感；无法识别返回 None
    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "MORNING" | "AM" => Some(ShiftType::Morning),
            "AFTERNOON" | "PM" => Some(ShiftType::Afternoon),
            "MORNING_AND_AFTERNOON" | "AM Y PM" => Some(ShiftType::MorningAndAfternoon),
            "REST_DAY" | "DESCANSO" => Some(ShiftType::RestDay),
            "ON_CALL_AVAILABLE" | "DISPONIBLE" => Some(ShiftType::OnCallAvailable),
            "EXTERNAL" | "EXTERNO" => Some(ShiftType::External),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ShiftType::Morning => "MORNING",
            ShiftType::Afternoon => "AFTERNOON",
            ShiftType::MorningAndAfternoon => "MORNING_AND_AFTERNOON",
            ShiftType::RestDay => "REST_DAY",
            ShiftType::OnCallAvailable => "ON_CALL_AVAILABLE",
            ShiftType::External => "EXTERNAL",
        }
    }

    /// 历史报表标签
    pub fn legacy_label(&self) -> &'static str {
        match self {
            ShiftType::Morning => "AM",
            ShiftType::Afternoon => "PM",
            ShiftType::MorningAndAfternoon => "AM Y PM",
            ShiftType::RestDay => "DESCANSO",
            ShiftType::OnCallAvailable => "DISPONIBLE",
            ShiftType::External => "EXTERNO",
        }
    }

    /// 是否为有时间窗的班次
    ///
    /// 只有有时间窗的班次才允许携带 start_time / end_time
    pub fn is_time_bound(&self) -> bool {
        match self {
            ShiftType::Morning
            | ShiftType::Afternoon
            | ShiftType::MorningAndAfternoon
            | ShiftType::External => true,
            ShiftType::RestDay | ShiftType::OnCallAvailable => false,
        }
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 骑手类型 (Rider Type)
// ==========================================
// 取两个历史版本的并集
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiderType {
    RegularStaff,    // 正式员工 (PANPAYA)
    WeekdayContract, // 工作日合同 (TC)
    WeekendContract, // 周末合同 (FDS)
    ExternalPartner, // 外部合作 (EXTERNO)
    OnCall,          // 待命 (DISPONIBLE)
}

impl RiderType {
    pub const ALL: [RiderType; 5] = [
        RiderType::RegularStaff,
        RiderType::WeekdayContract,
        RiderType::WeekendContract,
        RiderType::ExternalPartner,
        RiderType::OnCall,
    ];

    /// 从字符串解析骑手类型（兼容历史代码）
    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "REGULAR_STAFF" | "PANPAYA" => Some(RiderType::RegularStaff),
            "WEEKDAY_CONTRACT" | "TC" => Some(RiderType::WeekdayContract),
            "WEEKEND_CONTRACT" | "FDS" => Some(RiderType::WeekendContract),
            "EXTERNAL_PARTNER" | "EXTERNO" => Some(RiderType::ExternalPartner),
            "ON_CALL" | "DISPONIBLE" => Some(RiderType::OnCall),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RiderType::RegularStaff => "REGULAR_STAFF",
            RiderType::WeekdayContract => "WEEKDAY_CONTRACT",
            RiderType::WeekendContract => "WEEKEND_CONTRACT",
            RiderType::ExternalPartner => "EXTERNAL_PARTNER",
            RiderType::OnCall => "ON_CALL",
        }
    }

    /// 是否属于"快速创建待命"候选池
    pub fn in_available_pool(&self) -> bool {
        match self {
            RiderType::WeekdayContract | RiderType::WeekendContract | RiderType::ExternalPartner => {
                true
            }
            RiderType::RegularStaff | RiderType::OnCall => false,
        }
    }
}

impl fmt::Display for RiderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 覆写状态 (Override State)
// ==========================================
// auto: 由生成服务产出且未被人工触碰
// manual: 人工创建或编辑过
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverrideState {
    Auto,
    Manual,
}

impl OverrideState {
    pub fn from_flag(manual_override: bool) -> Self {
        if manual_override {
            OverrideState::Manual
        } else {
            OverrideState::Auto
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, OverrideState::Manual)
    }
}

impl fmt::Display for OverrideState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverrideState::Auto => write!(f, "AUTO"),
            OverrideState::Manual => write!(f, "MANUAL"),
        }
    }
}
