// ==========================================
// 设备维保管理系统 - 设备领域模型
// ==========================================
// 依据: 设备台账数据字典_v1.2.md - equipment 表
// 依据: 设备台账导入字段口径_v1.1.md - 列映射与清洗规则
// ==========================================

use crate::domain::error_map::ErrorMap;
use crate::domain::types::{EmbeddedImage, EquipmentStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Equipment - 设备台账主数据
// ==========================================
// 用途: 导入层写入,维保/点检模块只读
// 对齐: equipment 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equipment {
    // ===== 主键 =====
    pub id: Option<i64>, // 自增主键（落库前为 None）

    // ===== 标识信息 =====
    pub equipment_code: String, // 设备编号（业务主键,统一大写）
    pub equipment_name: String, // 设备名称

    // ===== 基础信息 =====
    pub model_spec: Option<String>, // 规格型号
    pub factory_id: i64,            // 所属工厂（FK,由工厂编号解析）
    pub location: Option<String>,   // 安装位置
    pub status: EquipmentStatus,    // 设备状态（默认 NORMAL）

    // ===== 购置信息 =====
    pub purchase_date: Option<NaiveDate>, // 购置日期
    pub purchase_cost: f64,               // 购置金额（解析失败回落 0.0）

    // ===== 附加信息 =====
    pub photo_path: Option<String>, // 设备照片存储路径（内嵌图片提取产物）
    pub remark: Option<String>,     // 备注

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>, // 记录创建时间
    pub updated_at: DateTime<Utc>, // 记录更新时间
}

// ==========================================
// EquipmentRecord - 导入中间结构体
// ==========================================
// 用途: 设备台账导入管道中间产物（单元格提取 → 清洗 → 此结构）
// 生命周期: 仅在导入流程内
// 错误键: 字段名（equipment_code / factory_code / ...）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentRecord {
    // 源字段（已清洗/已类型转换）
    pub equipment_code: Option<String>,
    pub equipment_name: Option<String>,
    pub model_spec: Option<String>,
    pub factory_code: Option<String>,
    pub location: Option<String>,
    pub status: EquipmentStatus,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_cost: f64,
    pub remark: Option<String>,

    // 解析阶段之后填充
    pub factory_id: Option<i64>,          // 引用解析结果（工厂编号 → id）
    pub photo: Option<EmbeddedImage>,     // 行锚定设备照片
    pub errors: ErrorMap<String>,         // 字段级错误集

    // 元信息
    pub row_number: usize, // 原始文件行号（1 起,含表头偏移,用于报告回写）
}

impl EquipmentRecord {
    pub fn new(row_number: usize) -> Self {
        Self {
            equipment_code: None,
            equipment_name: None,
            model_spec: None,
            factory_code: None,
            location: None,
            status: EquipmentStatus::Normal,
            purchase_date: None,
            purchase_cost: 0.0,
            remark: None,
            factory_id: None,
            photo: None,
            errors: ErrorMap::new(),
            row_number,
        }
    }

    /// 业务主键（统一大写;空值返回 None）
    pub fn natural_key(&self) -> Option<String> {
        self.equipment_code
            .as_ref()
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
    }

    /// 是否可落库（错误集为空;引用解析失败必然写入错误,故无需另判）
    pub fn is_insertable(&self) -> bool {
        self.errors.is_empty()
    }

    /// 合并后的多行错误消息（报告回写用;无错误返回 None）
    pub fn joined_error_message(&self) -> Option<String> {
        if self.errors.is_empty() {
            None
        } else {
            Some(self.errors.joined("\n"))
        }
    }

    /// 转换为可落库实体（要求错误集为空且必填字段齐备）
    pub fn to_equipment(&self, now: DateTime<Utc>) -> Option<Equipment> {
        if !self.is_insertable() {
            return None;
        }
        let equipment_code = self.natural_key()?;
        let equipment_name = self.equipment_name.clone()?;
        let factory_id = self.factory_id?;

        Some(Equipment {
            id: None,
            equipment_code,
            equipment_name,
            model_spec: self.model_spec.clone(),
            factory_id,
            location: self.location.clone(),
            status: self.status,
            purchase_date: self.purchase_date,
            purchase_cost: self.purchase_cost,
            photo_path: None, // 落库后由图片归档流程补写
            remark: self.remark.clone(),
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_record() -> EquipmentRecord {
        let mut record = EquipmentRecord::new(2);
        record.equipment_code = Some("EQ-001".to_string());
        record.equipment_name = Some("主传动电机".to_string());
        record.factory_code = Some("F001".to_string());
        record.factory_id = Some(1);
        record
    }

    #[test]
    fn test_insertable_requires_empty_errors() {
        let mut record = valid_record();
        assert!(record.is_insertable());

        record.errors.push("factory_code".to_string(), "工厂编号不存在: F099");
        assert!(!record.is_insertable());
        assert!(record.to_equipment(Utc::now()).is_none());
    }

    #[test]
    fn test_natural_key_uppercased() {
        let mut record = valid_record();
        record.equipment_code = Some(" eq-001 ".to_string());
        assert_eq!(record.natural_key().as_deref(), Some("EQ-001"));

        record.equipment_code = Some("   ".to_string());
        assert_eq!(record.natural_key(), None);
    }

    #[test]
    fn test_to_equipment_carries_fields() {
        let mut record = valid_record();
        record.purchase_cost = 12800.5;
        record.status = EquipmentStatus::Standby;

        let equipment = record.to_equipment(Utc::now()).expect("应可转换");
        assert_eq!(equipment.equipment_code, "EQ-001");
        assert_eq!(equipment.factory_id, 1);
        assert_eq!(equipment.status, EquipmentStatus::Standby);
        assert!((equipment.purchase_cost - 12800.5).abs() < f64::EPSILON);
    }
}
