// ==========================================
// 设备维保管理系统 - 导入任务 Repository Trait
// ==========================================
// 职责: 定义导入任务记录的数据访问接口（不包含实现）
// 红线: Repository 不含编排逻辑,状态迁移合法性由条件更新保证
// ==========================================

use crate::domain::import_job::ImportJob;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ImportJobRepository Trait
// ==========================================
// 用途: 任务状态机持久化
// 实现者: ImportJobRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait ImportJobRepository: Send + Sync {
    /// 插入 PENDING 状态的新任务记录
    ///
    /// # 参数
    /// - job: 任务记录（由 ImportJob::new 构造）
    async fn create_job(&self, job: &ImportJob) -> Result<(), Box<dyn Error>>;

    /// 按 ID 查询任务
    ///
    /// # 返回
    /// - Ok(Some(ImportJob)): 任务存在
    /// - Ok(None): 任务不存在
    async fn find_by_id(&self, job_id: &str) -> Result<Option<ImportJob>, Box<dyn Error>>;

    /// PENDING → PROCESSING,写入 started_at
    ///
    /// # 错误
    /// - InvalidStateTransition: 任务不处于 PENDING（含任务不存在）
    async fn mark_processing(&self, job_id: &str) -> Result<(), Box<dyn Error>>;

    /// 写入解析阶段确定的候选记录总数
    ///
    /// # 参数
    /// - total: 候选记录总数（空行不计）
    async fn set_total_records(&self, job_id: &str, total: i32) -> Result<(), Box<dyn Error>>;

    /// 更新进度检查点
    ///
    /// # 参数
    /// - progress: 进度百分比（0-100）;SQL 侧保证单调不减
    /// - processed: 已处理记录数
    async fn update_progress(
        &self,
        job_id: &str,
        progress: i32,
        processed: i32,
    ) -> Result<(), Box<dyn Error>>;

    /// PROCESSING → COMPLETED,写入统计与报告地址
    ///
    /// # 参数
    /// - success_count: 实际落库记录数
    /// - failed_count: 未落库记录数
    /// - error_report_url: 错误报告地址（无错误则为 None）
    ///
    /// # 错误
    /// - InvalidStateTransition: 任务不处于 PROCESSING
    async fn mark_completed(
        &self,
        job_id: &str,
        success_count: i32,
        failed_count: i32,
        error_report_url: Option<&str>,
    ) -> Result<(), Box<dyn Error>>;

    /// PENDING/PROCESSING → FAILED,写入中止原因
    ///
    /// # 参数
    /// - error_message: 中止原因（文件不可读/空文档/内部错误描述）
    ///
    /// # 错误
    /// - InvalidStateTransition: 任务已处于终态
    async fn mark_failed(&self, job_id: &str, error_message: &str) -> Result<(), Box<dyn Error>>;

    /// 查询最近任务（任务历史列表,按创建时间倒序）
    ///
    /// # 参数
    /// - limit: 返回条数上限
    async fn list_recent(&self, limit: i32) -> Result<Vec<ImportJob>, Box<dyn Error>>;
}
