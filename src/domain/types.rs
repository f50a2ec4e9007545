// ==========================================
// 设备维保管理系统 - 领域类型定义
// ==========================================
// 依据: 设备台账数据字典_v1.2.md - 枚举口径
// 依据: 批量导入接口约定_v1.0.md - 任务状态机
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 导入类型 (Import Kind)
// ==========================================
// 决定解析布局: 设备台账(平面行) / 点检模板(每工作表一条)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportKind {
    Equipment,         // 设备台账导入
    ChecklistTemplate, // 点检模板导入
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportKind::Equipment => write!(f, "EQUIPMENT"),
            ImportKind::ChecklistTemplate => write!(f, "CHECKLIST_TEMPLATE"),
        }
    }
}

impl ImportKind {
    /// 从字符串解析导入类型（用于 worker 参数与数据库读取）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "EQUIPMENT" => Some(ImportKind::Equipment),
            "CHECKLIST_TEMPLATE" => Some(ImportKind::ChecklistTemplate),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ImportKind::Equipment => "EQUIPMENT",
            ImportKind::ChecklistTemplate => "CHECKLIST_TEMPLATE",
        }
    }
}

// ==========================================
// 任务状态 (Job Status)
// ==========================================
// 状态机: PENDING → PROCESSING → COMPLETED / FAILED
// 红线: 终态不再迁移;校验错误不产生 FAILED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,    // 已创建,等待执行
    Processing, // 执行中
    Completed,  // 正常结束(可能带错误报告)
    Failed,     // 异常中止(文件不可读/空文档/内部错误)
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "PENDING"),
            JobStatus::Processing => write!(f, "PROCESSING"),
            JobStatus::Completed => write!(f, "COMPLETED"),
            JobStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl JobStatus {
    /// 从字符串解析任务状态
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "PENDING" => JobStatus::Pending,
            "PROCESSING" => JobStatus::Processing,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" => JobStatus::Failed,
            _ => JobStatus::Pending, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }

    /// 是否为终态（COMPLETED / FAILED）
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

// ==========================================
// 设备状态 (Equipment Status)
// ==========================================
// 导入文件中以中文标签出现,落库为 SCREAMING_SNAKE_CASE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EquipmentStatus {
    Normal,      // 正常
    Standby,     // 待机
    UnderRepair, // 维修中
    Scrapped,    // 报废
}

impl fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EquipmentStatus::Normal => write!(f, "NORMAL"),
            EquipmentStatus::Standby => write!(f, "STANDBY"),
            EquipmentStatus::UnderRepair => write!(f, "UNDER_REPAIR"),
            EquipmentStatus::Scrapped => write!(f, "SCRAPPED"),
        }
    }
}

impl EquipmentStatus {
    /// 从导入标签解析设备状态（中文标签或数据库字符串）
    ///
    /// # 默认值
    /// - 无法识别的非空值与空值均回落为 Normal
    pub fn from_label(s: &str) -> Self {
        match s.trim() {
            "正常" | "NORMAL" => EquipmentStatus::Normal,
            "待机" | "STANDBY" => EquipmentStatus::Standby,
            "维修中" | "UNDER_REPAIR" => EquipmentStatus::UnderRepair,
            "报废" | "SCRAPPED" => EquipmentStatus::Scrapped,
            _ => EquipmentStatus::Normal, // 默认值
        }
    }

    /// 中文标签（用于报表展示）
    pub fn label(&self) -> &'static str {
        match self {
            EquipmentStatus::Normal => "正常",
            EquipmentStatus::Standby => "待机",
            EquipmentStatus::UnderRepair => "维修中",
            EquipmentStatus::Scrapped => "报废",
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            EquipmentStatus::Normal => "NORMAL",
            EquipmentStatus::Standby => "STANDBY",
            EquipmentStatus::UnderRepair => "UNDER_REPAIR",
            EquipmentStatus::Scrapped => "SCRAPPED",
        }
    }
}

// ==========================================
// 点检周期 (Check Cycle)
// ==========================================
// 依据: 点检模板工作表元数据区第 3 行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckCycle {
    Daily,     // 日检
    Weekly,    // 周检
    Monthly,   // 月检
    Quarterly, // 季检
    Yearly,    // 年检
}

impl fmt::Display for CheckCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckCycle::Daily => write!(f, "DAILY"),
            CheckCycle::Weekly => write!(f, "WEEKLY"),
            CheckCycle::Monthly => write!(f, "MONTHLY"),
            CheckCycle::Quarterly => write!(f, "QUARTERLY"),
            CheckCycle::Yearly => write!(f, "YEARLY"),
        }
    }
}

impl CheckCycle {
    /// 从导入标签解析点检周期（中文标签或数据库字符串）
    ///
    /// # 默认值
    /// - 无法识别的非空值与空值均回落为 Daily
    pub fn from_label(s: &str) -> Self {
        match s.trim() {
            "日检" | "DAILY" => CheckCycle::Daily,
            "周检" | "WEEKLY" => CheckCycle::Weekly,
            "月检" | "MONTHLY" => CheckCycle::Monthly,
            "季检" | "QUARTERLY" => CheckCycle::Quarterly,
            "年检" | "YEARLY" => CheckCycle::Yearly,
            _ => CheckCycle::Daily, // 默认值
        }
    }

    /// 中文标签（用于报表展示）
    pub fn label(&self) -> &'static str {
        match self {
            CheckCycle::Daily => "日检",
            CheckCycle::Weekly => "周检",
            CheckCycle::Monthly => "月检",
            CheckCycle::Quarterly => "季检",
            CheckCycle::Yearly => "年检",
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            CheckCycle::Daily => "DAILY",
            CheckCycle::Weekly => "WEEKLY",
            CheckCycle::Monthly => "MONTHLY",
            CheckCycle::Quarterly => "QUARTERLY",
            CheckCycle::Yearly => "YEARLY",
        }
    }
}

// ==========================================
// 内嵌图片 (Embedded Image)
// ==========================================
// 用途: 工作簿 drawing 层提取的行锚定图片(设备照片)
// 生命周期: 仅在导入流程内
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedImage {
    pub sheet_index: usize, // 所在工作表序号（0 起）
    pub anchor_row: usize,  // 锚定行（0 起,左上角）
    pub anchor_col: usize,  // 锚定列（0 起,左上角）
    pub data: Vec<u8>,      // 原始图片字节
    pub ext: String,        // 扩展名（png/jpeg 等,来自 media 文件名）
}

// TODO: 增加 ImportKind::SparePart(备件台账导入,二期接入时启用)
