// ==========================================
// 设备维保管理系统 - 导入任务编排器实现
// ==========================================
// 依据: 批量导入接口约定_v1.0.md - 任务生命周期与阶段顺序
// ==========================================
// 职责: 整合导入流程,从任务记录到终态
// 流程: 读取 → 解析 → 引用解析 → 唯一性 → 落库 → 报告 → 终态
// 红线: 仅 SourceUnreadable / EmptyDocument 两类中止;
//       行级违规一律进错误报告,任务仍 COMPLETED
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::checklist::TemplateRecord;
use crate::domain::equipment::EquipmentRecord;
use crate::domain::import_job::{ImportJob, JobOutcome};
use crate::domain::types::{ImportKind, JobStatus};
use crate::importer::conflict_handler::ConflictHandler;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_runner_trait::{
    ConflictHandler as ConflictHandlerTrait, DerivationService as DerivationServiceTrait,
    ImportProfile, ImportRecordOps, ImportRunner, SheetReader,
};
use crate::importer::sheet_reader::SheetWorkbook;
use crate::repository::ImportJobRepository;
use chrono::Local;
use std::collections::HashSet;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};

// 进度检查点（百分比,单调不减;100 由 mark_completed 写入）
const PROGRESS_WORKBOOK_READ: i32 = 10;
const PROGRESS_PARSED: i32 = 30;
const PROGRESS_RESOLVED: i32 = 50;
const PROGRESS_UNIQUENESS_CHECKED: i32 = 60;
const PROGRESS_COMMITTED: i32 = 85;
const PROGRESS_REPORTED: i32 = 95;

// 报告落盘子目录（storage_dir 之下）
const REPORT_SUBDIR: &str = "import_reports";

// 流水线执行汇总（内部）
struct PipelineSummary {
    total_records: i32,
    success_count: i32,
    failed_count: i32,
    report_url: Option<String>,
}

// ==========================================
// ImportRunnerImpl - 导入任务编排器实现
// ==========================================
pub struct ImportRunnerImpl<R, C>
where
    R: ImportJobRepository,
    C: ImportConfigReader,
{
    // 数据访问层
    job_repo: R,

    // 配置读取器
    config: C,

    // 导入组件
    sheet_reader: Box<dyn SheetReader>,
    equipment_profile: Box<dyn ImportProfile<Record = EquipmentRecord>>,
    template_profile: Box<dyn ImportProfile<Record = TemplateRecord>>,
    conflict_handler: ConflictHandler,
    derivation: Box<dyn DerivationServiceTrait>,
}

impl<R, C> ImportRunnerImpl<R, C>
where
    R: ImportJobRepository,
    C: ImportConfigReader,
{
    /// 创建新的 ImportRunner 实例
    ///
    /// # 参数
    /// - job_repo: 导入任务仓储
    /// - config: 配置读取器
    /// - sheet_reader: 工作簿读取器
    /// - equipment_profile: 设备台账导入剖面
    /// - template_profile: 点检模板导入剖面
    /// - conflict_handler: 唯一性检测器
    /// - derivation: 派生产物服务（报告文件名）
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        job_repo: R,
        config: C,
        sheet_reader: Box<dyn SheetReader>,
        equipment_profile: Box<dyn ImportProfile<Record = EquipmentRecord>>,
        template_profile: Box<dyn ImportProfile<Record = TemplateRecord>>,
        conflict_handler: ConflictHandler,
        derivation: Box<dyn DerivationServiceTrait>,
    ) -> Self {
        Self {
            job_repo,
            config,
            sheet_reader,
            equipment_profile,
            template_profile,
            conflict_handler,
            derivation,
        }
    }
}

#[async_trait::async_trait]
impl<R, C> ImportRunner for ImportRunnerImpl<R, C>
where
    R: ImportJobRepository + Send + Sync,
    C: ImportConfigReader + Send + Sync,
{
    /// 执行单个导入任务至终态
    ///
    /// # 参数
    /// - job_id: 任务唯一标识
    ///
    /// # 返回
    /// - Ok(JobOutcome): 终态汇总（FAILED 也走 Ok,error_message 携带原因）
    /// - Err: 任务不存在或任务记录读写失败
    #[instrument(skip(self))]
    async fn run_job(&self, job_id: &str) -> Result<JobOutcome, Box<dyn Error>> {
        use std::time::Instant;
        let start_time = Instant::now();

        // === 步骤 1: 加载任务并置为 PROCESSING ===
        debug!("步骤 1: 加载任务");
        let job = self
            .job_repo
            .find_by_id(job_id)
            .await?
            .ok_or_else(|| format!("任务不存在: {}", job_id))?;

        self.job_repo.mark_processing(job_id).await?;
        info!(kind = %job.kind, file = %job.file_name, "开始执行导入任务");

        // === 步骤 2~7: 按导入类型走统一流水线 ===
        let pipeline_result = match job.kind {
            ImportKind::Equipment => {
                self.run_pipeline(&job, self.equipment_profile.as_ref()).await
            }
            ImportKind::ChecklistTemplate => {
                self.run_pipeline(&job, self.template_profile.as_ref()).await
            }
        };

        // === 步骤 8: 源文件清理（成功/中止/失败均执行）===
        self.remove_source_file(&job.source_path);

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        match pipeline_result {
            Ok(summary) => {
                self.job_repo
                    .mark_completed(
                        job_id,
                        summary.success_count,
                        summary.failed_count,
                        summary.report_url.as_deref(),
                    )
                    .await?;

                info!(
                    total = summary.total_records,
                    success = summary.success_count,
                    failed = summary.failed_count,
                    elapsed_ms = elapsed_ms,
                    "导入任务执行完成"
                );

                Ok(JobOutcome {
                    job_id: job_id.to_string(),
                    status: JobStatus::Completed,
                    total_records: summary.total_records,
                    success_count: summary.success_count,
                    failed_count: summary.failed_count,
                    error_report_url: summary.report_url,
                    error_message: None,
                    elapsed_ms,
                })
            }
            Err(e) => {
                let message = e.to_string();
                if e.is_abort() {
                    warn!(error = %message, "导入任务中止");
                } else {
                    error!(error = %message, "导入任务执行失败");
                }
                self.job_repo.mark_failed(job_id, &message).await?;

                Ok(JobOutcome {
                    job_id: job_id.to_string(),
                    status: JobStatus::Failed,
                    total_records: 0,
                    success_count: 0,
                    failed_count: 0,
                    error_report_url: None,
                    error_message: Some(message),
                    elapsed_ms,
                })
            }
        }
    }

    /// 批量执行多个导入任务（并发执行）
    async fn run_many(
        &self,
        job_ids: Vec<String>,
    ) -> Result<Vec<Result<JobOutcome, String>>, Box<dyn Error>> {
        use futures::future::join_all;

        info!(count = job_ids.len(), "开始批量执行导入任务");

        // 为每个任务创建执行单元
        let run_tasks = job_ids.into_iter().map(|job_id| async move {
            match self.run_job(&job_id).await {
                Ok(outcome) => {
                    info!(
                        job_id = %job_id,
                        status = %outcome.status,
                        success = outcome.success_count,
                        "任务执行结束"
                    );
                    Ok(outcome)
                }
                Err(e) => {
                    // 任务记录层面的失败:转换为字符串以避免 Send 问题
                    error!(job_id = %job_id, error = %e, "任务执行失败");
                    Err(format!("任务 {} 执行失败: {}", job_id, e))
                }
            }
        });

        // 并发执行所有任务
        let results = join_all(run_tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量执行完成"
        );

        Ok(results)
    }
}

// 辅助方法
impl<R, C> ImportRunnerImpl<R, C>
where
    R: ImportJobRepository + Send + Sync,
    C: ImportConfigReader + Send + Sync,
{
    /// 两类导入共用的阶段流水线
    ///
    /// # 返回
    /// - Ok(PipelineSummary): 各阶段统计
    /// - Err(ImportError): 中止类错误或基础设施错误
    async fn run_pipeline<Rec>(
        &self,
        job: &ImportJob,
        profile: &dyn ImportProfile<Record = Rec>,
    ) -> ImportResult<PipelineSummary>
    where
        Rec: ImportRecordOps + Send + Sync,
    {
        let job_id = &job.job_id;

        // === 步骤 2: 读取工作簿 ===
        debug!("步骤 2: 读取工作簿");
        let workbook = self
            .sheet_reader
            .read_workbook(Path::new(&job.source_path))?;
        if !workbook.has_any_value() {
            return Err(ImportError::EmptyDocument);
        }
        self.checkpoint(job_id, PROGRESS_WORKBOOK_READ, 0).await;
        info!(sheets = workbook.sheets.len(), "工作簿读取完成");

        // === 步骤 3: 解析候选记录 ===
        debug!("步骤 3: 解析候选记录");
        let mut records = profile.parse(&workbook);
        if records.is_empty() {
            return Err(ImportError::EmptyDocument);
        }
        let total_records = records.len() as i32;
        self.job_repo.set_total_records(job_id, total_records).await?;
        self.checkpoint(job_id, PROGRESS_PARSED, 0).await;
        info!(total = total_records, "候选记录解析完成");

        // === 步骤 4: 引用解析 ===
        debug!("步骤 4: 引用解析");
        profile.resolve_references(&mut records).await?;
        self.checkpoint(job_id, PROGRESS_RESOLVED, 0).await;
        debug!("引用解析完成");

        // === 步骤 5: 唯一性检测（文件内 + 库内）===
        debug!("步骤 5: 唯一性检测");
        let in_file_flagged = self.conflict_handler.flag_in_file_duplicates(&mut records);

        let mut seen = HashSet::new();
        let candidate_keys: Vec<String> = records
            .iter()
            .filter_map(|r| r.natural_key())
            .filter(|key| seen.insert(key.clone()))
            .collect();
        let existing_keys = if candidate_keys.is_empty() {
            Vec::new()
        } else {
            profile.find_existing_keys(&candidate_keys).await?
        };
        let store_flagged = self
            .conflict_handler
            .flag_store_duplicates(&mut records, &existing_keys);

        self.checkpoint(job_id, PROGRESS_UNIQUENESS_CHECKED, 0).await;
        info!(
            in_file = in_file_flagged,
            store = store_flagged,
            "唯一性检测完成"
        );

        // === 步骤 6: 选择性落库 ===
        debug!("步骤 6: 选择性落库");
        let success_count = profile.commit(&records).await? as i32;
        self.checkpoint(job_id, PROGRESS_COMMITTED, total_records).await;
        info!(success = success_count, "落库完成");

        // === 步骤 7: 错误报告（仅存在违规记录时生成）===
        let error_records = records.iter().filter(|r| r.has_errors()).count();
        let report_url = if error_records > 0 {
            debug!("步骤 7: 生成错误报告");
            let url = self
                .write_error_report(job, &workbook, &records, profile)
                .await?;
            info!(error_records = error_records, url = %url, "错误报告生成完成");
            Some(url)
        } else {
            debug!("无违规记录,跳过错误报告");
            None
        };
        self.checkpoint(job_id, PROGRESS_REPORTED, total_records).await;

        Ok(PipelineSummary {
            total_records,
            success_count,
            failed_count: total_records - success_count,
            report_url,
        })
    }

    /// 回写报告、落盘并生成下载地址
    async fn write_error_report<Rec>(
        &self,
        job: &ImportJob,
        workbook: &SheetWorkbook,
        records: &[Rec],
        profile: &dyn ImportProfile<Record = Rec>,
    ) -> ImportResult<String>
    where
        Rec: ImportRecordOps + Send + Sync,
    {
        let storage_dir = self.config.get_storage_dir().await.map_err(|e| {
            ImportError::ConfigReadError {
                key: "storage_dir".to_string(),
                message: e.to_string(),
            }
        })?;
        let url_prefix = self.config.get_report_url_prefix().await.map_err(|e| {
            ImportError::ConfigReadError {
                key: "report_url_prefix".to_string(),
                message: e.to_string(),
            }
        })?;

        let report_dir = storage_dir.join(REPORT_SUBDIR);
        std::fs::create_dir_all(&report_dir).map_err(|e| ImportError::ArtifactWriteError {
            path: report_dir.display().to_string(),
            message: e.to_string(),
        })?;

        let filename = self
            .derivation
            .derive_report_filename(&job.file_name, Local::now().naive_local());
        let target = report_dir.join(&filename);

        let mut report_workbook = profile.annotate_report(workbook, records)?;
        report_workbook
            .save(&target)
            .map_err(|e| ImportError::ArtifactWriteError {
                path: target.display().to_string(),
                message: e.to_string(),
            })?;

        Ok(format!("{}/{}", url_prefix, filename))
    }

    /// 进度检查点写入（展示用途,失败仅告警不阻断流程）
    async fn checkpoint(&self, job_id: &str, progress: i32, processed: i32) {
        if let Err(e) = self
            .job_repo
            .update_progress(job_id, progress, processed)
            .await
        {
            warn!(job_id = %job_id, progress = progress, error = %e, "进度写入失败");
        }
    }

    /// 删除上传临时文件（失败仅告警）
    fn remove_source_file(&self, source_path: &str) {
        if let Err(e) = std::fs::remove_file(source_path) {
            warn!(path = %source_path, error = %e, "源文件清理失败");
        }
    }
}
