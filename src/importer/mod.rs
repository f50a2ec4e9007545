// ==========================================
// 设备维保管理系统 - 导入层
// ==========================================
// 依据: 批量导入接口约定_v1.0.md
// ==========================================
// 职责: Excel 工作簿异步批量导入,生成台账与模板数据
// 支持: 设备台账, 点检模板
// ==========================================

// 模块声明
pub mod checklist_profile;
pub mod conflict_handler;
pub mod data_cleaner;
pub mod derivation;
pub mod equipment_profile;
pub mod error;
pub mod import_runner_impl;
pub mod import_runner_trait;
pub mod report;
pub mod sheet_images;
pub mod sheet_reader;

// 重导出核心类型
pub use checklist_profile::ChecklistProfile;
pub use conflict_handler::ConflictHandler as ConflictHandlerImpl;
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use derivation::DerivationService as DerivationServiceImpl;
pub use equipment_profile::EquipmentProfile;
pub use error::{ImportError, ImportResult};
pub use import_runner_impl::ImportRunnerImpl;
pub use sheet_reader::{CalamineSheetReader, CellValue, SheetData, SheetWorkbook};

// 重导出 Trait 接口
pub use import_runner_trait::{
    ConflictHandler, DataCleaner, DerivationService, ImportProfile, ImportRecordOps, ImportRunner,
    SheetReader,
};
