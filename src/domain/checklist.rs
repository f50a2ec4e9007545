// ==========================================
// 设备维保管理系统 - 点检模板领域模型
// ==========================================
// 依据: 点检模板导入字段口径_v1.0.md - 工作表布局
// 布局: 每工作表一个模板;第 1-4 行元数据区(B 列取值),第 6 行条目表头,第 7 行起条目
// ==========================================

use crate::domain::error_map::ErrorMap;
use crate::domain::types::CheckCycle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ChecklistTemplate - 点检模板主数据
// ==========================================
// 对齐: checklist_template 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistTemplate {
    // ===== 主键 =====
    pub id: Option<i64>, // 自增主键（落库前为 None）

    // ===== 标识信息 =====
    pub template_code: Option<String>, // 模板编号（落库阶段派生,DJMB+时间戳+序号）
    pub template_name: String,         // 模板名称（业务主键）

    // ===== 关联与属性 =====
    pub equipment_id: i64,           // 关联设备（FK,由设备编号解析）
    pub cycle: CheckCycle,           // 点检周期（默认 DAILY）
    pub description: Option<String>, // 模板说明

    // ===== 派生产物 =====
    pub qr_image_path: Option<String>, // 查询二维码存储路径（生成失败可为空）

    // ===== 条目 =====
    pub items: Vec<ChecklistItem>, // 点检条目（与模板同事务落库）

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>, // 记录创建时间
    pub updated_at: DateTime<Utc>, // 记录更新时间
}

// ==========================================
// ChecklistItem - 点检条目
// ==========================================
// 对齐: checklist_item 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: Option<i64>,          // 自增主键
    pub template_id: Option<i64>, // 所属模板（落库时回填）
    pub seq: i32,                 // 条目序号（展示顺序）
    pub item_name: String,        // 点检项目
    pub check_method: String,     // 点检方法
    pub judge_criterion: String,  // 判定标准
}

// ==========================================
// TemplateSlot - 元数据槽位
// ==========================================
// 每个槽位固定占据工作表一行,错误回写定位依赖该映射
// 键序: 声明顺序即工作表行序（ErrorMap 遍历与表格阅读顺序一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TemplateSlot {
    Name,          // 第 1 行: 模板名称
    EquipmentCode, // 第 2 行: 设备编号
    Cycle,         // 第 3 行: 点检周期
    Description,   // 第 4 行: 模板说明
}

impl TemplateSlot {
    /// 槽位所在工作表行（0 起）
    pub fn sheet_row(&self) -> usize {
        match self {
            TemplateSlot::Name => 0,
            TemplateSlot::EquipmentCode => 1,
            TemplateSlot::Cycle => 2,
            TemplateSlot::Description => 3,
        }
    }

    /// 中文标签（元数据区 A 列）
    pub fn label(&self) -> &'static str {
        match self {
            TemplateSlot::Name => "模板名称",
            TemplateSlot::EquipmentCode => "设备编号",
            TemplateSlot::Cycle => "点检周期",
            TemplateSlot::Description => "模板说明",
        }
    }
}

// ==========================================
// ParsedItem - 条目中间结构体
// ==========================================
// 生命周期: 仅在导入流程内;仅保留必填字段齐备的条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedItem {
    pub sheet_row: usize,        // 条目所在工作表行（0 起,用于报告回写）
    pub seq: i32,                // 条目序号
    pub item_name: String,       // 点检项目
    pub check_method: String,    // 点检方法
    pub judge_criterion: String, // 判定标准
}

// ==========================================
// TemplateRecord - 模板导入中间结构体
// ==========================================
// 生命周期: 仅在导入流程内
// 错误键: 元数据按槽位,条目按工作表行号
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRecord {
    // 元数据区（已清洗）
    pub template_name: Option<String>,
    pub equipment_code: Option<String>,
    pub cycle: CheckCycle,
    pub description: Option<String>,

    // 解析阶段之后填充
    pub equipment_id: Option<i64>, // 引用解析结果（设备编号 → id）
    pub items: Vec<ParsedItem>,    // 校验通过的条目

    // 错误集（元数据与条目分列回写）
    pub meta_errors: ErrorMap<TemplateSlot>,
    pub item_errors: ErrorMap<usize>,

    // 元信息
    pub sheet_index: usize, // 工作表序号（0 起）
    pub sheet_name: String, // 工作表名（重复键提示用）
}

impl TemplateRecord {
    pub fn new(sheet_index: usize, sheet_name: impl Into<String>) -> Self {
        Self {
            template_name: None,
            equipment_code: None,
            cycle: CheckCycle::Daily,
            description: None,
            equipment_id: None,
            items: Vec::new(),
            meta_errors: ErrorMap::new(),
            item_errors: ErrorMap::new(),
            sheet_index,
            sheet_name: sheet_name.into(),
        }
    }

    /// 业务主键（模板名称,统一大写比较;空值返回 None）
    pub fn natural_key(&self) -> Option<String> {
        self.template_name
            .as_ref()
            .map(|n| n.trim().to_uppercase())
            .filter(|n| !n.is_empty())
    }

    /// 是否存在任何错误（元数据或条目）
    pub fn has_errors(&self) -> bool {
        !self.meta_errors.is_empty() || !self.item_errors.is_empty()
    }

    /// 是否可落库
    pub fn is_insertable(&self) -> bool {
        !self.has_errors()
    }

    /// 转换为可落库实体（模板编号/二维码由落库阶段派生）
    pub fn to_template(&self, now: DateTime<Utc>) -> Option<ChecklistTemplate> {
        if !self.is_insertable() {
            return None;
        }
        let template_name = self.template_name.clone()?;
        let equipment_id = self.equipment_id?;

        let items = self
            .items
            .iter()
            .map(|item| ChecklistItem {
                id: None,
                template_id: None,
                seq: item.seq,
                item_name: item.item_name.clone(),
                check_method: item.check_method.clone(),
                judge_criterion: item.judge_criterion.clone(),
            })
            .collect();

        Some(ChecklistTemplate {
            id: None,
            template_code: None,
            template_name,
            equipment_id,
            cycle: self.cycle,
            description: self.description.clone(),
            qr_image_path: None,
            items,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_record() -> TemplateRecord {
        let mut record = TemplateRecord::new(0, "电机日检");
        record.template_name = Some("电机日检模板".to_string());
        record.equipment_code = Some("EQ-001".to_string());
        record.equipment_id = Some(7);
        record.items.push(ParsedItem {
            sheet_row: 6,
            seq: 1,
            item_name: "轴承温度".to_string(),
            check_method: "红外测温".to_string(),
            judge_criterion: "≤75℃".to_string(),
        });
        record
    }

    #[test]
    fn test_slot_rows_follow_sheet_layout() {
        assert_eq!(TemplateSlot::Name.sheet_row(), 0);
        assert_eq!(TemplateSlot::Description.sheet_row(), 3);
        assert!(TemplateSlot::Name < TemplateSlot::Cycle);
    }

    #[test]
    fn test_item_errors_block_insert() {
        let mut record = valid_record();
        assert!(record.is_insertable());

        record.item_errors.push(8, "判定标准不能为空");
        assert!(record.has_errors());
        assert!(record.to_template(Utc::now()).is_none());
    }

    #[test]
    fn test_to_template_copies_items() {
        let record = valid_record();
        let template = record.to_template(Utc::now()).expect("应可转换");
        assert_eq!(template.template_name, "电机日检模板");
        assert_eq!(template.items.len(), 1);
        assert_eq!(template.items[0].seq, 1);
        assert!(template.template_code.is_none(), "模板编号由落库阶段派生");
    }
}
