// ==========================================
// 设备维保管理系统 - 数据清洗器实现
// ==========================================
// 依据: 设备台账导入字段口径_v1.1.md - 清洗规则
// 依据: 点检模板导入字段口径_v1.0.md - 元数据清洗规则
// 职责: TRIM / UPPER / NULL 标准化 / 单元格类型转换
// ==========================================

use crate::importer::import_runner_trait::DataCleaner as DataCleanerTrait;
use crate::importer::sheet_reader::CellValue;
use chrono::NaiveDate;

pub struct DataCleaner;

impl DataCleanerTrait for DataCleaner {
    fn clean_text(&self, value: &str, uppercase: bool) -> String {
        let trimmed = value.trim();
        if uppercase {
            trimmed.to_uppercase()
        } else {
            trimmed.to_string()
        }
    }

    fn normalize_null(&self, value: Option<String>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                return None;
            }
            // 常见占位值统一归为 None
            match trimmed.to_uppercase().as_str() {
                "NULL" | "N/A" | "NA" | "-" => None,
                _ => Some(trimmed.to_string()),
            }
        })
    }

    fn cell_to_text(&self, cell: &CellValue) -> Option<String> {
        if cell.is_blank() {
            return None;
        }
        self.normalize_null(Some(cell.to_display_string()))
    }

    fn parse_date_cell(&self, cell: &CellValue) -> Result<Option<NaiveDate>, String> {
        // 原生日期单元格直接取日期部分
        if let CellValue::Date(dt) = cell {
            return Ok(Some(dt.date()));
        }

        let text = cell.to_display_string();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y/%m/%d"))
            .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y%m%d"))
            .map(Some)
            .map_err(|_| format!("日期格式无法识别: {}", trimmed))
    }

    fn parse_amount_cell(&self, cell: &CellValue) -> f64 {
        match cell {
            CellValue::Number(n) => *n,
            CellValue::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    fn parse_seq_cell(&self, cell: &CellValue, fallback: i32) -> i32 {
        match cell {
            CellValue::Number(n) => *n as i32,
            CellValue::Text(s) => s.trim().parse::<i32>().unwrap_or(fallback),
            _ => fallback,
        }
    }
}
