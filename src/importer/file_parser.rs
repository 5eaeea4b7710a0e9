// ==========================================
// 骑手排班系统 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 输出: 规范化表头 + 行记录 HashMap<列名(大写), 值>
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// 单个文件大小上限（5 MiB）
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// 原始行记录
pub type RawRecord = HashMap<String, String>;

/// 解析结果
///
/// `headers` 保留表头行的全部列（即使没有数据行）
#[derive(Debug, Clone, Default)]
pub struct ParsedSheet {
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl ParsedSheet {
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}

/// 表头规范化: 去空白 + 大写
pub fn normalize_header(header: &str) -> String {
    header.trim().to_uppercase()
}

// ==========================================
// FileParser Trait
// ==========================================
pub trait FileParser: Send + Sync {
    /// 解析文件为表头与原始行记录
    ///
    /// # 返回
    /// - Ok(sheet): 跳过完全空白的行
    /// - Err: 文件读取错误、格式错误
    fn parse_sheet(&self, file_path: &Path) -> ImportResult<ParsedSheet>;
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn collect_row<I>(headers: &[String], values: I) -> Option<RawRecord>
where
    I: Iterator<Item = String>,
{
    let mut row_map = HashMap::new();
    for (col_idx, value) in values.enumerate() {
        if let Some(header) = headers.get(col_idx) {
            if header.is_empty() {
                continue;
            }
            row_map.insert(header.clone(), value.trim().to_string());
        }
    }

    // 跳过完全空白的行
    if row_map.values().all(|v| v.is_empty()) {
        return None;
    }
    Some(row_map)
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_sheet(&self, file_path: &Path) -> ImportResult<ParsedSheet> {
        ensure_exists(file_path)?;

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .trim(csv::Trim::All)
            .from_reader(file);

        let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            if let Some(row) = collect_row(&headers, record.iter().map(str::to_string)) {
                records.push(row);
            }
        }
        Ok(ParsedSheet { headers, records })
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
// 只读取第一个工作表
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_sheet(&self, file_path: &Path) -> ImportResult<ParsedSheet> {
        ensure_exists(file_path)?;

        let mut workbook = open_workbook_auto(file_path)?;
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            return Ok(ParsedSheet::default());
        };
        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| normalize_header(&cell.to_string()))
            .collect();

        let records = rows
            .filter_map(|row| collect_row(&headers, row.iter().map(|cell| cell.to_string())))
            .collect();
        Ok(ParsedSheet { headers, records })
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser {
    max_size: u64,
}

impl UniversalFileParser {
    pub fn new() -> Self {
        Self {
            max_size: MAX_FILE_SIZE,
        }
    }

    pub fn with_max_size(max_size: u64) -> Self {
        Self { max_size }
    }

    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ParsedSheet> {
        let path = file_path.as_ref();
        ensure_exists(path)?;

        let size = std::fs::metadata(path)?.len();
        if size > self.max_size {
            return Err(ImportError::FileTooLarge {
                size,
                limit: self.max_size,
            });
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse_sheet(path),
            "xlsx" | "xls" => ExcelParser.parse_sheet(path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

impl Default for UniversalFileParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn csv_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(temp_file, "{}", line).unwrap();
        }
        temp_file
    }

    #[test]
    fn test_csv_parser_表头规范化() {
        let temp_file = csv_file(&[" nombre ,Tipo", "Ana Perez, TC ", "Luis,PANPAYA"]);

        let sheet = CsvParser.parse_sheet(temp_file.path()).unwrap();
        let records = &sheet.records;

        assert_eq!(sheet.headers, vec!["NOMBRE".to_string(), "TIPO".to_string()]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("NOMBRE"), Some(&"Ana Perez".to_string()));
        assert_eq!(records[0].get("TIPO"), Some(&"TC".to_string()));
    }

    #[test]
    fn test_csv_parser_跳过空行() {
        let temp_file = csv_file(&["MARCA", "Rappi", ",", "", "Didi"]);

        let sheet = CsvParser.parse_sheet(temp_file.path()).unwrap();
        assert_eq!(sheet.records.len(), 2);
    }

    #[test]
    fn test_csv_parser_仅表头() {
        let temp_file = csv_file(&["foo, Bar"]);

        let sheet = CsvParser.parse_sheet(temp_file.path()).unwrap();
        assert!(sheet.records.is_empty());
        assert!(sheet.has_column("FOO"));
        assert!(sheet.has_column("BAR"));
        assert!(!sheet.has_column("NOMBRE"));
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_sheet(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_universal_parser_不支持的格式() {
        let temp_file = Builder::new().suffix(".txt").tempfile().unwrap();
        let result = UniversalFileParser::new().parse(temp_file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(ext)) if ext == "txt"));
    }

    #[test]
    fn test_universal_parser_文件过大() {
        let temp_file = csv_file(&["MARCA", "Rappi", "Didi"]);
        let result = UniversalFileParser::with_max_size(4).parse(temp_file.path());
        assert!(matches!(result, Err(ImportError::FileTooLarge { limit: 4, .. })));
    }
}
