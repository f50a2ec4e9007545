// ==========================================
// 设备维保管理系统 - 导入模块错误类型
// ==========================================
// 红线: SourceUnreadable / EmptyDocument 为仅有的两类中止错误;
//       行级校验错误走 ErrorMap,不出现在本枚举中
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 中止类错误（任务直接 FAILED）=====
    // 文件不存在/格式不支持/内容损坏统一归入 SourceUnreadable
    #[error("源文件不可读: {0}")]
    SourceUnreadable(String),

    #[error("空文档: 所有工作表均无有效数据")]
    EmptyDocument,

    // ===== 产物相关错误 =====
    #[error("错误报告生成失败: {0}")]
    ReportGenerationError(String),

    #[error("产物写入失败 ({path}): {message}")]
    ArtifactWriteError { path: String, message: String },

    // ===== 衍生数据错误 =====
    #[error("模板编码生成失败: {0}")]
    TemplateCodeGenerationError(String),

    #[error("二维码生成失败: {0}")]
    QrGenerationError(String),

    // ===== 数据库错误 =====
    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    // ===== 配置错误 =====
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否为中止类错误（区别于数据库/内部等偶发错误,用于日志分级）
    pub fn is_abort(&self) -> bool {
        matches!(
            self,
            ImportError::SourceUnreadable(_) | ImportError::EmptyDocument
        )
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::SourceUnreadable(err.to_string())
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::DatabaseQueryError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::SourceUnreadable(err.to_string())
    }
}

// 实现 From<rust_xlsxwriter::XlsxError>
impl From<rust_xlsxwriter::XlsxError> for ImportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ImportError::ReportGenerationError(err.to_string())
    }
}

// 实现 From<Box<dyn Error>>（Repository trait 边界）
impl From<Box<dyn std::error::Error>> for ImportError {
    fn from(err: Box<dyn std::error::Error>) -> Self {
        ImportError::DatabaseQueryError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
