// ==========================================
// 设备维保管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod checklist_import_repo;
pub mod checklist_import_repo_impl;
pub mod equipment_import_repo;
pub mod equipment_import_repo_impl;
pub mod error;
pub mod import_job_repo;
pub mod import_job_repo_impl;

// 重导出核心仓储
pub use checklist_import_repo::ChecklistImportRepository;
pub use checklist_import_repo_impl::ChecklistImportRepositoryImpl;
pub use equipment_import_repo::EquipmentImportRepository;
pub use equipment_import_repo_impl::EquipmentImportRepositoryImpl;
pub use error::{RepositoryError, RepositoryResult};
pub use import_job_repo::ImportJobRepository;
pub use import_job_repo_impl::ImportJobRepositoryImpl;

// TODO: 添加数据库连接池管理模块
