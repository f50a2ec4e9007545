// ==========================================
// 设备维保管理系统 - 工作簿读取器实现
// ==========================================
// 职责: 将上传文件读取为带绝对坐标的单元格网格
// 支持: Excel (.xlsx/.xls)
// 红线: 仅在此处判定 EmptyDocument;内嵌图片提取失败不中止
// ==========================================

use crate::domain::types::EmbeddedImage;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_runner_trait::SheetReader;
use crate::importer::sheet_images;
use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDateTime;
use std::path::Path;
use tracing::warn;

// ==========================================
// CellValue - 单元格值
// ==========================================
// 用途: 解析与错误报告共用的类型保真表示
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
}

impl CellValue {
    fn from_data(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            // 公式错误单元格按空处理,由行级校验报"缺失"
            Data::Error(_) => CellValue::Empty,
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(naive) => CellValue::Date(naive),
                None => CellValue::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) => CellValue::Text(s.clone()),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
        }
    }

    /// 是否为空值（空单元格或纯空白文本）
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 展示字符串（错误报告中按原值回写）
    ///
    /// # 说明
    /// - 整数值不带小数点（Excel 将 "3" 存为 3.0）
    /// - 日期无时分秒时仅保留日期部分
    pub fn to_display_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            CellValue::Bool(b) => {
                if *b {
                    "TRUE".to_string()
                } else {
                    "FALSE".to_string()
                }
            }
            CellValue::Date(dt) => {
                if dt.time() == chrono::NaiveTime::MIN {
                    dt.format("%Y-%m-%d").to_string()
                } else {
                    dt.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
        }
    }
}

// ==========================================
// SheetData - 单工作表网格
// ==========================================
#[derive(Debug, Clone)]
pub struct SheetData {
    pub name: String,              // 工作表名
    pub rows: Vec<Vec<CellValue>>, // 绝对坐标网格（含前导空行补位）
}

impl SheetData {
    /// 读取指定坐标单元格（越界返回空值）
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    /// 行数（含前导空行）
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// 是否存在任何非空单元格
    pub fn has_any_value(&self) -> bool {
        self.rows
            .iter()
            .any(|row| row.iter().any(|cell| !cell.is_blank()))
    }

    /// 指定行是否全空
    pub fn is_row_blank(&self, row: usize) -> bool {
        match self.rows.get(row) {
            Some(cells) => cells.iter().all(|cell| cell.is_blank()),
            None => true,
        }
    }

    /// 指定行在给定列范围内是否全空（保留列不参与空行判定）
    pub fn is_row_blank_in(&self, row: usize, cols: std::ops::RangeInclusive<usize>) -> bool {
        cols.into_iter().all(|col| self.cell(row, col).is_blank())
    }
}

// ==========================================
// SheetWorkbook - 工作簿模型
// ==========================================
#[derive(Debug, Clone)]
pub struct SheetWorkbook {
    pub sheets: Vec<SheetData>,      // 全部工作表（保持文件内顺序）
    pub images: Vec<EmbeddedImage>,  // drawing 层行锚定图片（仅 .xlsx）
}

impl SheetWorkbook {
    /// 是否存在任何非空单元格（EmptyDocument 判定依据）
    pub fn has_any_value(&self) -> bool {
        self.sheets.iter().any(|sheet| sheet.has_any_value())
    }

    /// 查找指定工作表上锚定在指定行的第一张图片
    pub fn image_at(&self, sheet_index: usize, row: usize) -> Option<&EmbeddedImage> {
        self.images
            .iter()
            .find(|img| img.sheet_index == sheet_index && img.anchor_row == row)
    }
}

// ==========================================
// CalamineSheetReader 实现
// ==========================================
pub struct CalamineSheetReader;

impl SheetReader for CalamineSheetReader {
    fn read_workbook(&self, file_path: &Path) -> ImportResult<SheetWorkbook> {
        if !file_path.exists() {
            return Err(ImportError::SourceUnreadable(format!(
                "文件不存在: {}",
                file_path.display()
            )));
        }

        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::SourceUnreadable(format!(
                "文件格式不支持: .{}（仅支持 .xlsx/.xls）",
                ext
            )));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        let sheet_names = workbook.sheet_names().to_owned();
        let mut sheets = Vec::with_capacity(sheet_names.len());
        for name in &sheet_names {
            let range = workbook.worksheet_range(name)?;

            // Range 以首个非空单元格为原点,补齐前导空行/空列以保持绝对坐标
            let (start_row, start_col) = match range.start() {
                Some((r, c)) => (r as usize, c as usize),
                None => (0, 0),
            };

            let mut rows: Vec<Vec<CellValue>> = Vec::with_capacity(start_row + range.height());
            rows.resize(start_row, Vec::new());
            for data_row in range.rows() {
                let mut cells = vec![CellValue::Empty; start_col];
                cells.extend(data_row.iter().map(CellValue::from_data));
                rows.push(cells);
            }

            sheets.push(SheetData {
                name: name.clone(),
                rows,
            });
        }

        // 图片提取失败不中止导入,退化为无照片
        let images = if ext == "xlsx" {
            match sheet_images::extract_embedded_images(file_path, &sheet_names) {
                Ok(images) => images,
                Err(e) => {
                    warn!(file = %file_path.display(), error = %e, "内嵌图片提取失败,忽略");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let workbook = SheetWorkbook { sheets, images };
        if !workbook.has_any_value() {
            return Err(ImportError::EmptyDocument);
        }

        Ok(workbook)
    }
}
