// ==========================================
// 测试数据生成器
// ==========================================
// 用途: 生成设备台账与点检模板导入测试工作簿
// 输出: tests/fixtures/datasets/*.xlsx
// ==========================================

use chrono::{Duration, Local};
use rust_xlsxwriter::{Workbook, Worksheet};
use std::error::Error;

// 设备台账表头（中文列名,A..=I 列;J 列为错误注释保留列）
const EQUIPMENT_HEADER: &[&str] = &[
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

// 点检项表头（A..=D 列;E 列为错误注释保留列）
const ITEM_HEADER: &[&str] = &["序号", "点检项目", "点检方法", "判定标准"];

// 设备行结构
#[derive(Clone)]
struct EquipmentRow {
    equipment_code: String,
    equipment_name: String,
    model_spec: String,
    factory_code: String,
    location: String,
    status: String,
    purchase_date: String,
    purchase_cost: String,
    remark: String,
}

impl EquipmentRow {
    fn to_row(&self) -> Vec<String> {
        vec![
            self.equipment_code.clone(),
            self.equipment_name.clone(),
            self.model_spec.clone(),
            self.factory_code.clone(),
            self.location.clone(),
            self.status.clone(),
            self.purchase_date.clone(),
            self.purchase_cost.clone(),
            self.remark.clone(),
        ]
    }
}

// 生成正常设备行
fn generate_normal_row(index: usize) -> EquipmentRow {
    let today = Local::now().date_naive();
    let purchase_date = today - Duration::days(30 + (index % 1000) as i64);

    EquipmentRow {
        equipment_code: format!("EQ-{:05}", index + 1),
        equipment_name: format!(
            "{}{}号机",
            ["空压机", "冷干机", "储气罐", "制氮机", "风机"][index % 5],
            index % 9 + 1
        ),
        model_spec: format!("XK-{}", 100 + index % 400),
        factory_code: ["F001", "F002", "F003"][index % 3].to_string(),
        location: format!("{}号车间", index % 4 + 1),
        status: ["正常", "待机", "维修中", "报废"][index % 4].to_string(),
        purchase_date: purchase_date.format("%Y-%m-%d").to_string(),
        purchase_cost: format!("{:.1}", 5000.0 + (index % 100) as f64 * 350.0),
        remark: if index % 7 == 0 {
            "年检设备".to_string()
        } else {
            "".to_string()
        },
    }
}

// 模板工作表结构
struct TemplateSheet {
    sheet_name: String,
    template_name: String,
    equipment_code: String,
    cycle: String,
    description: String,
    items: Vec<[String; 4]>,
}

// 生成正常模板工作表
fn generate_normal_sheet(index: usize) -> TemplateSheet {
    let item_count = 3 + index % 4;
    let items = (0..item_count)
        .map(|i| {
            [
                format!("{}", i + 1),
                format!(
                    "检查{}",
                    ["轴承温度", "润滑油位", "运行异响", "紧固件松动", "仪表读数", "密封泄漏"][i % 6]
                ),
                ["目视", "手触", "耳听", "测温枪", "扳手复紧"][i % 5].to_string(),
                ["无异常", "在上下限之间", "≤75℃", "无松动", "无泄漏"][i % 5].to_string(),
            ]
        })
        .collect();

    TemplateSheet {
        sheet_name: format!("模板{}", index + 1),
        template_name: format!(
            "{}{}检模板",
            ["空压机", "冷干机", "储气罐", "制氮机", "风机"][index % 5],
            ["日", "周", "月", "季", "年"][index % 5]
        ),
        equipment_code: format!("EQ-{:05}", index + 1),
        cycle: ["日检", "周检", "月检", "季检", "年检"][index % 5].to_string(),
        description: format!("第{}组巡检路线", index % 3 + 1),
        items,
    }
}

// 写入一行字符串单元格（空串跳过,保持单元格真空）
fn write_row(
    worksheet: &mut Worksheet,
    row: u32,
    cells: &[String],
) -> Result<(), Box<dyn Error>> {
    for (col, cell) in cells.iter().enumerate() {
        if cell.is_empty() {
            continue;
        }
        worksheet.write_string(row, col as u16, cell)?;
    }
    Ok(())
}

// 写设备台账工作簿（首工作表,第 1 行表头）
fn write_equipment_workbook(path: &str, rows: &[EquipmentRow]) -> Result<(), Box<dyn Error>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("设备台账")?;

    for (col, header) in EQUIPMENT_HEADER.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
    }
    for (idx, row) in rows.iter().enumerate() {
        write_row(worksheet, (idx + 1) as u32, &row.to_row())?;
    }

    workbook.save(path)?;
    Ok(())
}

// 写点检模板工作簿（每工作表一个模板,元数据 4 行 + 第 6 行条目表头）
fn write_template_workbook(path: &str, sheets: &[TemplateSheet]) -> Result<(), Box<dyn Error>> {
    let mut workbook = Workbook::new();

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.sheet_name)?;

        let meta = [
            ("模板名称", &sheet.template_name),
            ("设备编号", &sheet.equipment_code),
            ("点检周期", &sheet.cycle),
            ("模板说明", &sheet.description),
        ];
        for (row, (label, value)) in meta.iter().enumerate() {
            worksheet.write_string(row as u32, 0, *label)?;
            if !value.is_empty() {
                worksheet.write_string(row as u32, 1, value.as_str())?;
            }
        }

        for (col, header) in ITEM_HEADER.iter().enumerate() {
            worksheet.write_string(5, col as u16, *header)?;
        }
        for (idx, item) in sheet.items.iter().enumerate() {
            write_row(worksheet, (6 + idx) as u32, item.as_slice())?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("开始生成导入测试工作簿...");

    std::fs::create_dir_all("tests/fixtures/datasets")?;

    // 1. 正常设备台账 (50条)
    generate_normal_equipment()?;

    // 2. 大台账 (500条)
    generate_large_equipment()?;

    // 3. 文件内重复编号
    generate_duplicate_within_file()?;

    // 4. 缺失必填字段
    generate_missing_required_fields()?;

    // 5. 字段值异常
    generate_invalid_values()?;

    // 6. 边界情况
    generate_edge_cases()?;

    // 7. 正常点检模板 (5个工作表)
    generate_normal_templates()?;

    // 8. 问题点检模板
    generate_template_issues()?;

    println!("✓ 所有导入测试工作簿生成完成！");
    Ok(())
}

fn generate_normal_equipment() -> Result<(), Box<dyn Error>> {
    let rows: Vec<EquipmentRow> = (0..50).map(generate_normal_row).collect();
    write_equipment_workbook("tests/fixtures/datasets/01_normal_equipment.xlsx", &rows)?;
    println!("✓ 生成 01_normal_equipment.xlsx (50条)");
    Ok(())
}

fn generate_large_equipment() -> Result<(), Box<dyn Error>> {
    // 偏移索引避免与其他数据集编号冲突
    let rows: Vec<EquipmentRow> = (0..500).map(|i| generate_normal_row(i + 10000)).collect();
    write_equipment_workbook("tests/fixtures/datasets/02_large_equipment.xlsx", &rows)?;
    println!("✓ 生成 02_large_equipment.xlsx (500条)");
    Ok(())
}

fn generate_duplicate_within_file() -> Result<(), Box<dyn Error>> {
    let mut rows: Vec<EquipmentRow> = (0..15).map(|i| generate_normal_row(i + 20000)).collect();

    // 5 条重复编号,其中 2 条改为小写以覆盖大小写不敏感判定
    for i in [0, 3, 6, 9, 12] {
        let mut dup = generate_normal_row(i + 20000);
        if i % 2 == 0 {
            dup.equipment_code = dup.equipment_code.to_lowercase();
        }
        rows.push(dup);
    }

    write_equipment_workbook("tests/fixtures/datasets/03_duplicate_within_file.xlsx", &rows)?;
    println!("✓ 生成 03_duplicate_within_file.xlsx (20条，包含5组重复)");
    Ok(())
}

fn generate_missing_required_fields() -> Result<(), Box<dyn Error>> {
    let mut rows = Vec::new();

    // 缺失设备编号
    for i in 0..3 {
        let mut row = generate_normal_row(i + 30000);
        row.equipment_code = "".to_string();
        rows.push(row);
    }

    // 缺失设备名称
    for i in 0..3 {
        let mut row = generate_normal_row(i + 30003);
        row.equipment_name = "".to_string();
        rows.push(row);
    }

    // 缺失工厂编号
    for i in 0..3 {
        let mut row = generate_normal_row(i + 30006);
        row.factory_code = "".to_string();
        rows.push(row);
    }

    // 同行多缺失
    for i in 0..3 {
        let mut row = generate_normal_row(i + 30009);
        row.equipment_code = "".to_string();
        row.equipment_name = "".to_string();
        row.factory_code = "".to_string();
        rows.push(row);
    }

    write_equipment_workbook(
        "tests/fixtures/datasets/04_missing_required_fields.xlsx",
        &rows,
    )?;
    println!("✓ 生成 04_missing_required_fields.xlsx (12条，缺失必填字段)");
    Ok(())
}

fn generate_invalid_values() -> Result<(), Box<dyn Error>> {
    let mut rows = Vec::new();

    // 日期无法识别
    for i in 0..3 {
        let mut row = generate_normal_row(i + 40000);
        row.purchase_date = "2024年1月".to_string();
        rows.push(row);
    }

    // 未知状态标签（应回退默认值,不计错误）
    for i in 0..3 {
        let mut row = generate_normal_row(i + 40003);
        row.status = "运转良好".to_string();
        rows.push(row);
    }

    // 金额非数字（应回退 0.0,不计错误）
    for i in 0..3 {
        let mut row = generate_normal_row(i + 40006);
        row.purchase_cost = "十二万五".to_string();
        rows.push(row);
    }

    // 工厂编号不存在
    for i in 0..3 {
        let mut row = generate_normal_row(i + 40009);
        row.factory_code = "F404".to_string();
        rows.push(row);
    }

    write_equipment_workbook("tests/fixtures/datasets/05_invalid_values.xlsx", &rows)?;
    println!("✓ 生成 05_invalid_values.xlsx (12条，字段值异常)");
    Ok(())
}

fn generate_edge_cases() -> Result<(), Box<dyn Error>> {
    let mut rows = Vec::new();

    // 编号混合大小写与首尾空白
    for i in 0..3 {
        let mut row = generate_normal_row(i + 50000);
        row.equipment_code = format!("  eq-{:05}  ", i + 50001);
        rows.push(row);
    }

    // 斜杠日期与紧凑日期
    let mut row = generate_normal_row(50003);
    row.purchase_date = "2024/03/05".to_string();
    rows.push(row);
    let mut row = generate_normal_row(50004);
    row.purchase_date = "20240220".to_string();
    rows.push(row);

    // 可选字段全空
    for i in 0..3 {
        let mut row = generate_normal_row(i + 50005);
        row.model_spec = "".to_string();
        row.location = "".to_string();
        row.status = "".to_string();
        row.purchase_date = "".to_string();
        row.purchase_cost = "".to_string();
        row.remark = "".to_string();
        rows.push(row);
    }

    // 正常数据（对照组）
    for i in 0..3 {
        rows.push(generate_normal_row(i + 50008));
    }

    write_equipment_workbook("tests/fixtures/datasets/06_edge_cases.xlsx", &rows)?;
    println!("✓ 生成 06_edge_cases.xlsx (11条，边界情况)");
    Ok(())
}

fn generate_normal_templates() -> Result<(), Box<dyn Error>> {
    let sheets: Vec<TemplateSheet> = (0..5).map(generate_normal_sheet).collect();
    write_template_workbook("tests/fixtures/datasets/07_normal_templates.xlsx", &sheets)?;
    println!("✓ 生成 07_normal_templates.xlsx (5个工作表)");
    Ok(())
}

fn generate_template_issues() -> Result<(), Box<dyn Error>> {
    let mut sheets = Vec::new();

    // 缺失模板名称
    let mut sheet = generate_normal_sheet(10);
    sheet.sheet_name = "缺名称".to_string();
    sheet.template_name = "".to_string();
    sheets.push(sheet);

    // 缺失设备编号
    let mut sheet = generate_normal_sheet(11);
    sheet.sheet_name = "缺设备".to_string();
    sheet.equipment_code = "".to_string();
    sheets.push(sheet);

    // 点检项字段残缺
    let mut sheet = generate_normal_sheet(12);
    sheet.sheet_name = "残缺条目".to_string();
    sheet.items = vec![
        [
            "1".to_string(),
            "".to_string(),
            "目视".to_string(),
            "".to_string(),
        ],
        [
            "".to_string(),
            "检查异响".to_string(),
            "耳听".to_string(),
            "无异常声响".to_string(),
        ],
    ];
    sheets.push(sheet);

    // 零点检项
    let mut sheet = generate_normal_sheet(13);
    sheet.sheet_name = "零条目".to_string();
    sheet.items = Vec::new();
    sheets.push(sheet);

    // 同名模板（与首个问题工作表之外的正常名称重复）
    let mut first = generate_normal_sheet(14);
    first.sheet_name = "原始模板".to_string();
    let mut dup = generate_normal_sheet(14);
    dup.sheet_name = "重复模板".to_string();
    dup.description = "".to_string();
    sheets.push(first);
    sheets.push(dup);

    write_template_workbook("tests/fixtures/datasets/08_template_issues.xlsx", &sheets)?;
    println!("✓ 生成 08_template_issues.xlsx (6个工作表，含重复与残缺)");
    Ok(())
}
