// ==========================================
// 设备维保管理系统 - 导入管道核心库
// ==========================================
// 依据: 批量导入接口约定_v1.0.md - 总体架构
// 技术栈: Rust + Tokio + SQLite
// 系统定位: 异步批量导入管道 (Excel → 台账/模板)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与导入中间结构
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 任务编排与导入剖面
pub mod importer;

// 配置层 - 运行参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CheckCycle, EquipmentStatus, ImportKind, JobStatus};

// 领域实体
pub use domain::{
    ChecklistItem, ChecklistTemplate, Equipment, EquipmentRecord, ErrorMap, ImportJob, JobOutcome,
    TemplateRecord,
};

// 导入层
pub use importer::{
    CalamineSheetReader, ChecklistProfile, EquipmentProfile, ImportError, ImportResult,
    ImportRunner, ImportRunnerImpl,
};

// 配置层
pub use config::{ConfigManager, ImportConfigReader};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "设备维保管理系统-导入管道";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

// ==========================================
// 预编译检查
// ==========================================
