// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 测试数据库初始化、基础数据准备、Excel 夹具生成
// ==========================================

#![allow(dead_code)] // 各测试文件按需引用

use rusqlite::{params, Connection};
use rust_xlsxwriter::Workbook;
use std::error::Error;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// 设备台账导入表头（与导入剖面列布局一致）
pub const EQUIPMENT_HEADER: [&str; 9] = [
    "设备编号",
    "设备名称",
    "规格型号",
    "所属工厂编号",
    "安装位置",
    "设备状态",
    "购置日期",
    "购置金额",
    "备注",
];

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径无效")?
        .to_string();

    let conn = Connection::open(&db_path)?;
    eam_import::db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 写入导入运行配置（存储目录指向测试临时目录）
pub fn insert_import_config(conn: &Connection, storage_dir: &str) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT OR REPLACE INTO config_kv (scope_id, key, value)
         VALUES ('import', 'storage_dir', ?1)",
        params![storage_dir],
    )?;
    conn.execute(
        "INSERT OR REPLACE INTO config_kv (scope_id, key, value)
         VALUES ('import', 'qr_size_px', '240')",
        [],
    )?;
    Ok(())
}

/// 准备工厂基础数据,返回自增 id
pub fn seed_factory(conn: &Connection, code: &str, name: &str) -> Result<i64, Box<dyn Error>> {
    conn.execute(
        "INSERT INTO factory (factory_code, factory_name) VALUES (?1, ?2)",
        params![code, name],
    )?;
    Ok(conn.last_insert_rowid())
}

/// 准备设备基础数据,返回自增 id
pub fn seed_equipment(
    conn: &Connection,
    code: &str,
    name: &str,
    factory_id: i64,
) -> Result<i64, Box<dyn Error>> {
    conn.execute(
        "INSERT INTO equipment (equipment_code, equipment_name, factory_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, datetime('now'), datetime('now'))",
        params![code, name, factory_id],
    )?;
    Ok(conn.last_insert_rowid())
}

/// 生成设备台账导入工作簿（首个工作表,第 1 行表头,数据行全部按文本写入）
pub fn write_equipment_xlsx(path: &Path, data_rows: &[Vec<&str>]) -> Result<(), Box<dyn Error>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("设备台账")?;

    for (col, header) in EQUIPMENT_HEADER.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
    }
    for (row_idx, row) in data_rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            worksheet.write_string((row_idx + 1) as u32, col_idx as u16, *cell)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// 点检模板工作表夹具描述
pub struct TemplateSheetSpec<'a> {
    pub sheet_name: &'a str,
    pub template_name: &'a str,
    pub equipment_code: &'a str,
    pub cycle: &'a str,
    pub description: &'a str,
    pub items: Vec<[&'a str; 4]>,
}

/// 生成点检模板导入工作簿（每个工作表一个模板）
pub fn write_template_xlsx(
    path: &Path,
    sheets: &[TemplateSheetSpec<'_>],
) -> Result<(), Box<dyn Error>> {
    let mut workbook = Workbook::new();

    for spec in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(spec.sheet_name)?;

        let meta = [
            ("模板名称", spec.template_name),
            ("设备编号", spec.equipment_code),
            ("点检周期", spec.cycle),
            ("模板说明", spec.description),
        ];
        for (row, (label, value)) in meta.iter().enumerate() {
            worksheet.write_string(row as u32, 0, *label)?;
            if !value.is_empty() {
                worksheet.write_string(row as u32, 1, *value)?;
            }
        }

        for (col, header) in ["序号", "点检项目", "点检方法", "判定标准"].iter().enumerate() {
            worksheet.write_string(5, col as u16, *header)?;
        }
        for (row_idx, item) in spec.items.iter().enumerate() {
            for (col_idx, cell) in item.iter().enumerate() {
                if cell.is_empty() {
                    continue;
                }
                worksheet.write_string((6 + row_idx) as u32, col_idx as u16, *cell)?;
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// 读取工作簿指定单元格的显示文本（0 起绝对坐标;空单元格返回 None）
pub fn read_xlsx_cell(
    path: &Path,
    sheet_index: usize,
    row: u32,
    col: u32,
) -> Result<Option<String>, Box<dyn Error>> {
    use calamine::{open_workbook_auto, Reader};

    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names().to_owned();
    let name = sheet_names
        .get(sheet_index)
        .ok_or_else(|| format!("工作表序号越界: {}", sheet_index))?
        .clone();
    let range = workbook.worksheet_range(&name)?;

    Ok(range
        .get_value((row, col))
        .map(|v| v.to_string())
        .filter(|s| !s.is_empty()))
}

/// 定位存储目录下唯一的错误报告文件
pub fn find_single_report(storage_dir: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let report_dir = storage_dir.join("import_reports");
    let mut entries: Vec<PathBuf> = std::fs::read_dir(&report_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();

    if entries.len() != 1 {
        return Err(format!("预期恰好一个报告文件,实际 {} 个", entries.len()).into());
    }
    Ok(entries.remove(0))
}
