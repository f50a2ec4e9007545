// ==========================================
// 设备维保管理系统 - 导入 Worker 主入口
// ==========================================
// 依据: 批量导入接口约定_v1.0.md - Worker 进程
// 技术栈: Rust + Tokio + SQLite
// ==========================================
// 用法:
//   eam-import-worker <db_path> <kind> <file>...
//   kind: equipment | checklist_template
//
// 每个文件生成一个 PENDING 任务并并发执行至终态,
// 逐行输出 JSON 终态汇总;任一任务 FAILED 时退出码为 1。
// ==========================================

use eam_import::config::{ConfigManager, ImportConfigReader};
use eam_import::db;
use eam_import::domain::import_job::ImportJob;
use eam_import::domain::types::{ImportKind, JobStatus};
use eam_import::importer::{
    CalamineSheetReader, ChecklistProfile, ConflictHandlerImpl, DataCleanerImpl,
    DerivationServiceImpl, EquipmentProfile, ImportRunner, ImportRunnerImpl,
};
use eam_import::repository::{
    ChecklistImportRepositoryImpl, EquipmentImportRepositoryImpl, ImportJobRepository,
    ImportJobRepositoryImpl,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志系统
    eam_import::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 导入 Worker", eam_import::APP_NAME);
    tracing::info!("系统版本: {}", eam_import::VERSION);
    tracing::info!("==================================================");

    let mut args = std::env::args().skip(1);
    let db_path = args.next().ok_or(USAGE)?;
    let kind = args
        .next()
        .and_then(|s| ImportKind::from_str(&s))
        .ok_or(USAGE)?;
    let files: Vec<String> = args.collect();
    if files.is_empty() {
        return Err(USAGE.into());
    }

    tracing::info!("使用数据库: {}", db_path);

    // 打开连接并确保 schema 就绪
    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    let job_repo = ImportJobRepositoryImpl::from_connection(Arc::clone(&conn));
    let config = ConfigManager::from_connection(Arc::clone(&conn))?;

    // 暂存上传文件（终态后由编排器删除暂存副本,原始文件保持不动）
    let staging_dir = config.get_storage_dir().await?.join("uploads");
    std::fs::create_dir_all(&staging_dir)?;

    // 为每个输入文件创建 PENDING 任务
    let mut job_ids = Vec::with_capacity(files.len());
    for file in &files {
        let job = stage_upload(Path::new(file), kind, &staging_dir)?;
        let job_id = job.job_id.clone();
        job_repo.create_job(&job).await?;
        tracing::info!(job_id = %job_id, file = %job.file_name, "任务已创建");
        job_ids.push(job_id);
    }

    // 组装编排器
    let runner = ImportRunnerImpl::new(
        ImportJobRepositoryImpl::from_connection(Arc::clone(&conn)),
        ConfigManager::from_connection(Arc::clone(&conn))?,
        Box::new(CalamineSheetReader),
        Box::new(EquipmentProfile::new(
            EquipmentImportRepositoryImpl::from_connection(Arc::clone(&conn)),
            ConfigManager::from_connection(Arc::clone(&conn))?,
            Box::new(DataCleanerImpl),
        )),
        Box::new(ChecklistProfile::new(
            ChecklistImportRepositoryImpl::from_connection(Arc::clone(&conn)),
            ConfigManager::from_connection(Arc::clone(&conn))?,
            Box::new(DataCleanerImpl),
            Box::new(DerivationServiceImpl),
        )),
        ConflictHandlerImpl::new(),
        Box::new(DerivationServiceImpl),
    );

    // 并发执行并逐行输出 JSON 终态
    let results = runner.run_many(job_ids).await?;

    let mut any_failed = false;
    for result in &results {
        match result {
            Ok(outcome) => {
                if outcome.status == JobStatus::Failed {
                    any_failed = true;
                }
                println!("{}", serde_json::to_string(outcome)?);
            }
            Err(message) => {
                any_failed = true;
                println!("{}", serde_json::json!({ "error": message }));
            }
        }
    }

    if any_failed {
        std::process::exit(1);
    }
    Ok(())
}

const USAGE: &str = "用法: eam-import-worker <db_path> <equipment|checklist_template> <file>...";

/// 把输入文件复制到暂存目录并生成 PENDING 任务记录
fn stage_upload(
    source: &Path,
    kind: ImportKind,
    staging_dir: &Path,
) -> Result<ImportJob, Box<dyn std::error::Error>> {
    let file_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| format!("无效的文件路径: {}", source.display()))?
        .to_string();

    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("xlsx");
    let staged: PathBuf = staging_dir.join(format!("{}.{}", Uuid::new_v4(), ext));
    std::fs::copy(source, &staged)
        .map_err(|e| format!("文件暂存失败 ({}): {}", source.display(), e))?;

    let file_size = std::fs::metadata(&staged).map(|m| m.len() as i64).unwrap_or(0);
    Ok(ImportJob::new(
        kind,
        file_name,
        file_size,
        staged.display().to_string(),
    ))
}
