// ==========================================
// 设备维保管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='import'）
    ///
    /// # 参数
    /// - key: 配置键
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'import' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    ///
    /// # 参数
    /// - key: 配置键
    /// - default: 默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 默认存储根目录（config_kv 未配置时）
    fn default_storage_dir() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("eam-import").join("storage"))
            .unwrap_or_else(|| PathBuf::from("./eam-import-storage"))
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_storage_dir(&self) -> Result<PathBuf, Box<dyn Error>> {
        match self.get_config_value(config_keys::STORAGE_DIR)? {
            Some(value) if !value.trim().is_empty() => Ok(PathBuf::from(value.trim())),
            _ => Ok(Self::default_storage_dir()),
        }
    }

    async fn get_report_url_prefix(&self) -> Result<String, Box<dyn Error>> {
        let value = self.get_config_or_default(
            config_keys::REPORT_URL_PREFIX,
            "/api/v1/files/import-reports",
        )?;
        // 统一去掉结尾斜杠,拼接时补
        Ok(value.trim().trim_end_matches('/').to_string())
    }

    async fn get_qr_size_px(&self) -> Result<u32, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::QR_SIZE_PX, "240")?;
        Ok(value.trim().parse::<u32>().unwrap_or(240))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 产物存储
    pub const STORAGE_DIR: &str = "storage_dir";
    pub const REPORT_URL_PREFIX: &str = "report_url_prefix";

    // 二维码
    pub const QR_SIZE_PX: &str = "qr_size_px";
}
