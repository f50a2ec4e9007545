// ==========================================
// 设备维保管理系统 - 领域模型层
// ==========================================
// 依据: 设备台账数据字典_v1.2.md - 实体定义
// ==========================================
// 职责: 定义领域实体、类型、导入中间结构
// 红线: 不含数据访问逻辑,不含管道编排逻辑
// ==========================================

pub mod checklist;
pub mod equipment;
pub mod error_map;
pub mod import_job;
pub mod types;

// 重导出核心类型
pub use checklist::{
    ChecklistItem, ChecklistTemplate, ParsedItem, TemplateRecord, TemplateSlot,
};
pub use equipment::{Equipment, EquipmentRecord};
pub use error_map::ErrorMap;
pub use import_job::{ImportJob, JobOutcome};
pub use types::{CheckCycle, EmbeddedImage, EquipmentStatus, ImportKind, JobStatus};

// TODO: 添加维保工单领域模型 (work_order,与导入管道无关,迁移自主服务时补充)
