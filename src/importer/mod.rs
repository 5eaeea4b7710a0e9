// ==========================================
// 骑手排班系统 - 导入层
// ==========================================
// 职责: 表格文件导入骑手 / 门店 / 外部品牌
// 支持: Excel, CSV
// ==========================================

pub mod entity_importer;
pub mod error;
pub mod file_parser;

// 重导出核心类型
pub use entity_importer::{EntityImporter, EntityKind, ImportSummary};
pub use error::{ImportError, ImportResult};
pub use file_parser::{
    CsvParser, ExcelParser, FileParser, ParsedSheet, UniversalFileParser, MAX_FILE_SIZE,
};
