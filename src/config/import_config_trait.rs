// ==========================================
// 设备维保管理系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入管道所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;
use std::path::PathBuf;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入管道所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    // ===== 产物存储配置 =====

    /// 获取产物存储根目录
    ///
    /// # 返回
    /// - PathBuf: 错误报告/二维码/设备照片的落盘根目录
    ///
    /// # 默认值
    /// - {系统数据目录}/eam-import/storage（无法取得系统目录时为 ./eam-import-storage）
    async fn get_storage_dir(&self) -> Result<PathBuf, Box<dyn Error>>;

    /// 获取错误报告下载地址前缀
    ///
    /// # 返回
    /// - String: 拼接在报告文件名之前的 URL 前缀（不含结尾斜杠）
    ///
    /// # 默认值
    /// - /api/v1/files/import-reports
    async fn get_report_url_prefix(&self) -> Result<String, Box<dyn Error>>;

    // ===== 二维码配置 =====

    /// 获取模板查询二维码边长（像素）
    ///
    /// # 返回
    /// - u32: 输出 PNG 的最小边长,按模块数向上取整
    ///
    /// # 默认值
    /// - 240
    async fn get_qr_size_px(&self) -> Result<u32, Box<dyn Error>>;
}
