// ==========================================
// 设备维保管理系统 - 错误报告回写辅助
// ==========================================
// 依据: 批量导入接口约定_v1.0.md - 错误报告样式
// 职责: 原值复制 / 错误单元格样式 / 多行消息行高
// 红线: 仅在内存副本上回写,不改动上传源文件
// ==========================================

use crate::importer::sheet_reader::{CellValue, SheetData};
use rust_xlsxwriter::{Color, Format, FormatBorder, Worksheet, XlsxError};

// 错误注释样式: 浅红底 / 深红字（Excel 经典"坏值"配色）
const ERROR_FILL: u32 = 0xFFC7CE;
const ERROR_FONT: u32 = 0x9C0006;

// 默认行高（磅）,多行消息按行数放大
const BASE_ROW_HEIGHT: f64 = 15.0;

/// 错误注释单元格样式
pub fn error_format() -> Format {
    Format::new()
        .set_background_color(Color::RGB(ERROR_FILL))
        .set_font_color(Color::RGB(ERROR_FONT))
        .set_border(FormatBorder::Thin)
        .set_text_wrap()
}

/// 错误注释列表头样式
pub fn annotation_header_format() -> Format {
    Format::new()
        .set_bold()
        .set_font_color(Color::RGB(ERROR_FONT))
        .set_border(FormatBorder::Thin)
}

/// 将单工作表原值复制到报告工作表
///
/// # 说明
/// - 数值保持数值、布尔保持布尔,避免复制后类型漂移
/// - 日期按显示值写出（报告面向人工修正,无需保留序列值）
pub fn copy_sheet_values(worksheet: &mut Worksheet, sheet: &SheetData) -> Result<(), XlsxError> {
    for (row_idx, row) in sheet.rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let row_num = row_idx as u32;
            let col_num = col_idx as u16;
            match cell {
                CellValue::Empty => {}
                CellValue::Number(n) => {
                    worksheet.write_number(row_num, col_num, *n)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(row_num, col_num, *b)?;
                }
                CellValue::Text(_) | CellValue::Date(_) => {
                    worksheet.write_string(row_num, col_num, cell.to_display_string())?;
                }
            }
        }
    }
    Ok(())
}

/// 写入一条错误注释并按消息行数抬高行高
pub fn write_error_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    message: &str,
    format: &Format,
) -> Result<(), XlsxError> {
    worksheet.write_string_with_format(row, col, message, format)?;

    let line_count = message.lines().count().max(1);
    if line_count > 1 {
        worksheet.set_row_height(row, BASE_ROW_HEIGHT * line_count as f64)?;
    }
    Ok(())
}
