// ==========================================
// 设备维保管理系统 - 配置层
// ==========================================
// 职责: 导入管道运行参数管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::ImportConfigReader;

// TODO: 添加配置验证器
