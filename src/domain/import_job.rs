// ==========================================
// 设备维保管理系统 - 导入任务领域模型
// ==========================================
// 依据: 批量导入接口约定_v1.0.md - import_job 表
// 用途: 任务编排器写入,任务列表查询只读
// ==========================================

use crate::domain::types::{ImportKind, JobStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// ImportJob - 导入任务记录
// ==========================================
// 对齐: import_job 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportJob {
    // ===== 主键 =====
    pub job_id: String, // 任务唯一标识（UUID v4）

    // ===== 任务元信息 =====
    pub kind: ImportKind,    // 导入类型
    pub file_name: String,   // 上传文件原始名（报告命名基准）
    pub file_size: i64,      // 文件大小（字节）
    pub source_path: String, // 上传临时文件落盘路径（终态后删除）

    // ===== 状态机 =====
    pub status: JobStatus, // PENDING/PROCESSING/COMPLETED/FAILED
    pub progress: i32,     // 进度百分比（0-100,单调不减,仅供展示）

    // ===== 记录统计 =====
    pub total_records: i32,     // 候选记录总数（解析阶段确定,空行不计）
    pub processed_records: i32, // 已处理记录数
    pub success_count: i32,     // 实际落库记录数
    pub failed_count: i32,      // 未落库记录数（total - success）

    // ===== 结果产物 =====
    pub error_report_url: Option<String>, // 错误报告下载地址（无错误则为空）
    pub error_message: Option<String>,    // FAILED 时的中止原因

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,           // 任务创建时间
    pub started_at: Option<DateTime<Utc>>,   // 开始执行时间
    pub finished_at: Option<DateTime<Utc>>,  // 结束时间（终态写入）
}

impl ImportJob {
    /// 创建 PENDING 状态的新任务
    ///
    /// # 参数
    /// - kind: 导入类型
    /// - file_name: 上传文件原始名
    /// - file_size: 文件大小（字节）
    /// - source_path: 上传临时文件落盘路径
    pub fn new(
        kind: ImportKind,
        file_name: impl Into<String>,
        file_size: i64,
        source_path: impl Into<String>,
    ) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            kind,
            file_name: file_name.into(),
            file_size,
            source_path: source_path.into(),
            status: JobStatus::Pending,
            progress: 0,
            total_records: 0,
            processed_records: 0,
            success_count: 0,
            failed_count: 0,
            error_report_url: None,
            error_message: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }
}

// ==========================================
// JobOutcome - 单次任务执行汇总
// ==========================================
// 用途: 编排器返回给调用方的内存汇总(任务记录为持久化口径)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutcome {
    pub job_id: String,                   // 任务 ID
    pub status: JobStatus,                // 终态
    pub total_records: i32,               // 候选记录总数
    pub success_count: i32,               // 实际落库数
    pub failed_count: i32,                // 未落库数
    pub error_report_url: Option<String>, // 错误报告地址
    pub error_message: Option<String>,    // FAILED 原因
    pub elapsed_ms: u64,                  // 执行耗时（毫秒）
}
