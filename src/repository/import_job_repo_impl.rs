// ==========================================
// 设备维保管理系统 - 导入任务 Repository 实现
// ==========================================
// 存储: import_job 表
// 约束: 状态迁移通过条件 UPDATE 保证,0 行命中视为非法迁移
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::import_job::ImportJob;
use crate::domain::types::{ImportKind, JobStatus};
use crate::repository::error::RepositoryError;
use crate::repository::import_job_repo::ImportJobRepository;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ImportJobRepositoryImpl
// ==========================================
pub struct ImportJobRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ImportJobRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 Repository
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>, RepositoryError> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 行 → ImportJob 映射
    fn map_row(row: &Row<'_>) -> rusqlite::Result<ImportJob> {
        let kind_str: String = row.get("kind")?;
        let status_str: String = row.get("status")?;

        Ok(ImportJob {
            job_id: row.get("job_id")?,
            // 未知类型按设备台账处理（历史数据兜底）
            kind: ImportKind::from_str(&kind_str).unwrap_or(ImportKind::Equipment),
            file_name: row.get("file_name")?,
            file_size: row.get("file_size")?,
            source_path: row.get("source_path")?,
            status: JobStatus::from_str(&status_str),
            progress: row.get("progress")?,
            total_records: row.get("total_records")?,
            processed_records: row.get("processed_records")?,
            success_count: row.get("success_count")?,
            failed_count: row.get("failed_count")?,
            error_report_url: row.get("error_report_url")?,
            error_message: row.get("error_message")?,
            created_at: row.get("created_at")?,
            started_at: row.get("started_at")?,
            finished_at: row.get("finished_at")?,
        })
    }
}

#[async_trait]
impl ImportJobRepository for ImportJobRepositoryImpl {
    async fn create_job(&self, job: &ImportJob) -> Result<(), Box<dyn Error>> {
        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            INSERT INTO import_job (
                job_id, kind, file_name, file_size, source_path, status, progress,
                total_records, processed_records, success_count, failed_count,
                error_report_url, error_message, created_at, started_at, finished_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
            params![
                job.job_id,
                job.kind.to_db_str(),
                job.file_name,
                job.file_size,
                job.source_path,
                job.status.to_db_str(),
                job.progress,
                job.total_records,
                job.processed_records,
                job.success_count,
                job.failed_count,
                job.error_report_url,
                job.error_message,
                job.created_at,
                job.started_at,
                job.finished_at,
            ],
        )
        .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn find_by_id(&self, job_id: &str) -> Result<Option<ImportJob>, Box<dyn Error>> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare(
            "SELECT job_id, kind, file_name, file_size, source_path, status, progress,
                    total_records, processed_records, success_count, failed_count,
                    error_report_url, error_message, created_at, started_at, finished_at
             FROM import_job WHERE job_id = ?1",
        )?;

        let result = stmt.query_row(params![job_id], Self::map_row);
        match result {
            Ok(job) => Ok(Some(job)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(RepositoryError::from(e))),
        }
    }

    async fn mark_processing(&self, job_id: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.lock_conn()?;

        let affected = conn.execute(
            "UPDATE import_job
             SET status = 'PROCESSING', started_at = ?2
             WHERE job_id = ?1 AND status = 'PENDING'",
            params![job_id, Utc::now()],
        )?;

        if affected == 0 {
            return Err(Box::new(RepositoryError::InvalidStateTransition {
                from: "非PENDING".to_string(),
                to: "PROCESSING".to_string(),
            }));
        }
        Ok(())
    }

    async fn set_total_records(&self, job_id: &str, total: i32) -> Result<(), Box<dyn Error>> {
        let conn = self.lock_conn()?;

        conn.execute(
            "UPDATE import_job SET total_records = ?2 WHERE job_id = ?1",
            params![job_id, total],
        )?;
        Ok(())
    }

    async fn update_progress(
        &self,
        job_id: &str,
        progress: i32,
        processed: i32,
    ) -> Result<(), Box<dyn Error>> {
        let conn = self.lock_conn()?;

        // 进度单调不减;终态行不再更新
        conn.execute(
            "UPDATE import_job
             SET progress = CASE WHEN progress < ?2 THEN ?2 ELSE progress END,
                 processed_records = ?3
             WHERE job_id = ?1 AND status = 'PROCESSING'",
            params![job_id, progress.clamp(0, 100), processed],
        )?;
        Ok(())
    }

    async fn mark_completed(
        &self,
        job_id: &str,
        success_count: i32,
        failed_count: i32,
        error_report_url: Option<&str>,
    ) -> Result<(), Box<dyn Error>> {
        let conn = self.lock_conn()?;

        let affected = conn.execute(
            "UPDATE import_job
             SET status = 'COMPLETED', progress = 100,
                 processed_records = total_records,
                 success_count = ?2, failed_count = ?3,
                 error_report_url = ?4, finished_at = ?5
             WHERE job_id = ?1 AND status = 'PROCESSING'",
            params![job_id, success_count, failed_count, error_report_url, Utc::now()],
        )?;

        if affected == 0 {
            return Err(Box::new(RepositoryError::InvalidStateTransition {
                from: "非PROCESSING".to_string(),
                to: "COMPLETED".to_string(),
            }));
        }
        Ok(())
    }

    async fn mark_failed(&self, job_id: &str, error_message: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.lock_conn()?;

        let affected = conn.execute(
            "UPDATE import_job
             SET status = 'FAILED', error_message = ?2, finished_at = ?3
             WHERE job_id = ?1 AND status IN ('PENDING', 'PROCESSING')",
            params![job_id, error_message, Utc::now()],
        )?;

        if affected == 0 {
            return Err(Box::new(RepositoryError::InvalidStateTransition {
                from: "终态".to_string(),
                to: "FAILED".to_string(),
            }));
        }
        Ok(())
    }

    async fn list_recent(&self, limit: i32) -> Result<Vec<ImportJob>, Box<dyn Error>> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare(
            "SELECT job_id, kind, file_name, file_size, source_path, status, progress,
                    total_records, processed_records, success_count, failed_count,
                    error_report_url, error_message, created_at, started_at, finished_at
             FROM import_job
             ORDER BY created_at DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], Self::map_row)?;

        let mut jobs = Vec::new();
        for row in rows {
            jobs.push(row.map_err(RepositoryError::from)?);
        }
        Ok(jobs)
    }
}
