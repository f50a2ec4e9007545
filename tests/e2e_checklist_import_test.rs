// ==========================================
// 端到端集成测试 - 点检模板导入完整流程
// ==========================================
// 测试目标: 验证多工作表模板导入、二维码产物与错误报告回写
// 覆盖范围: ImportRunner + ChecklistProfile + DerivationService
// ==========================================

mod test_helpers;

use eam_import::config::ConfigManager;
use eam_import::db;
use eam_import::domain::import_job::ImportJob;
use eam_import::domain::types::{ImportKind, JobStatus};
use eam_import::importer::*;
use eam_import::logging;
use eam_import::repository::{
    ChecklistImportRepositoryImpl, EquipmentImportRepositoryImpl, ImportJobRepository,
    ImportJobRepositoryImpl,
};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use test_helpers::TemplateSheetSpec;

// ==========================================
// 测试辅助函数
// ==========================================

/// 创建测试用的 ImportRunner（所有组件共享同一连接,与 Worker 进程装配一致）
fn create_test_runner(db_path: &str) -> ImportRunnerImpl<ImportJobRepositoryImpl, ConfigManager> {
    let conn = Arc::new(Mutex::new(
        db::open_sqlite_connection(db_path).expect("打开数据库失败"),
    ));

    ImportRunnerImpl::new(
        ImportJobRepositoryImpl::from_connection(Arc::clone(&conn)),
        ConfigManager::from_connection(Arc::clone(&conn)).expect("配置管理器创建失败"),
        Box::new(CalamineSheetReader),
        Box::new(EquipmentProfile::new(
            EquipmentImportRepositoryImpl::from_connection(Arc::clone(&conn)),
            ConfigManager::from_connection(Arc::clone(&conn)).expect("配置管理器创建失败"),
            Box::new(DataCleanerImpl),
        )),
        Box::new(ChecklistProfile::new(
            ChecklistImportRepositoryImpl::from_connection(Arc::clone(&conn)),
            ConfigManager::from_connection(Arc::clone(&conn)).expect("配置管理器创建失败"),
            Box::new(DataCleanerImpl),
            Box::new(DerivationServiceImpl),
        )),
        ConflictHandlerImpl::new(),
        Box::new(DerivationServiceImpl),
    )
}

/// 准备测试环境: 数据库 + 工厂/设备基础数据 + 存储目录配置
/// 返回 (连接, 设备 ID)
fn setup_env(db_path: &str, storage: &TempDir) -> (Connection, i64) {
    let conn = Connection::open(db_path).expect("打开数据库失败");
    let factory_id = test_helpers::seed_factory(&conn, "F001", "一号工厂").expect("工厂数据准备失败");
    let equipment_id =
        test_helpers::seed_equipment(&conn, "EQ-001", "主电机", factory_id).expect("设备数据准备失败");
    test_helpers::insert_import_config(&conn, &storage.path().display().to_string())
        .expect("配置写入失败");
    (conn, equipment_id)
}

/// 创建 PENDING 任务记录（source_path 指向实际存在的夹具文件）
async fn create_pending_job(db_path: &str, source_path: &Path) -> String {
    let file_size = std::fs::metadata(source_path).map(|m| m.len() as i64).unwrap_or(0);
    let file_name = source_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("点检模板.xlsx")
        .to_string();

    let job = ImportJob::new(
        ImportKind::ChecklistTemplate,
        file_name,
        file_size,
        source_path.display().to_string(),
    );
    let job_id = job.job_id.clone();

    let job_repo = ImportJobRepositoryImpl::new(db_path).expect("任务仓储创建失败");
    job_repo.create_job(&job).await.expect("任务创建失败");
    job_id
}

/// 合法模板工作表夹具（第 3 项故意缺序号,应回退为顺位 3）
fn valid_sheet<'a>() -> TemplateSheetSpec<'a> {
    TemplateSheetSpec {
        sheet_name: "电机模板",
        template_name: "电机季度点检",
        equipment_code: "EQ-001",
        cycle: "季检",
        description: "传动系统季度巡检",
        items: vec![
            ["1", "检查轴承温度", "手触或测温枪", "≤75℃"],
            ["2", "检查润滑油位", "目视", "油位在上下限之间"],
            ["", "检查异响", "耳听", "无异常声响"],
        ],
    }
}

// ==========================================
// 测试用例 1: 合法与违规工作表混合导入
// ==========================================

#[tokio::test]
async fn test_e2e_checklist_import_full_flow() {
    logging::init_test();

    // 步骤 1: 初始化测试环境
    let (_temp_db, db_path) = test_helpers::create_test_db().expect("测试数据库创建失败");
    let storage = tempfile::tempdir().expect("存储目录创建失败");
    let uploads = tempfile::tempdir().expect("上传目录创建失败");
    let (conn, equipment_id) = setup_env(&db_path, &storage);

    // 步骤 2: 生成夹具（工作表 1 合法;工作表 2 设备不存在且点检项残缺）
    let fixture = uploads.path().join("点检模板.xlsx");
    test_helpers::write_template_xlsx(
        &fixture,
        &[
            valid_sheet(),
            TemplateSheetSpec {
                sheet_name: "风机模板",
                template_name: "风机点检",
                equipment_code: "EQ-404",
                cycle: "日检",
                description: "",
                items: vec![["1", "", "目视", ""]],
            },
        ],
    )
    .expect("夹具生成失败");

    // 步骤 3: 执行导入
    let job_id = create_pending_job(&db_path, &fixture).await;
    let runner = create_test_runner(&db_path);
    let outcome = runner.run_job(&job_id).await.expect("任务执行失败");

    // 步骤 4: 校验终态汇总
    assert_eq!(outcome.status, JobStatus::Completed, "工作表级违规不应导致任务失败");
    assert_eq!(outcome.total_records, 2);
    assert_eq!(outcome.success_count, 1);
    assert_eq!(outcome.failed_count, 1);
    assert!(outcome.error_report_url.is_some());

    // 步骤 5: 校验模板落库内容
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM checklist_template", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1, "仅合法工作表对应的模板落库");

    let (template_code, cycle, description, stored_equipment_id): (String, String, String, i64) = conn
        .query_row(
            "SELECT template_code, cycle, description, equipment_id
             FROM checklist_template WHERE template_name = '电机季度点检'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .unwrap();
    assert!(template_code.starts_with("DJMB"), "模板编号应带 DJMB 前缀");
    assert_eq!(template_code.len(), 20, "模板编号 = 前缀 + 秒级时间戳 + 2 位序号");
    assert_eq!(cycle, "QUARTERLY", "中文周期标签应映射为枚举存储值");
    assert_eq!(description, "传动系统季度巡检");
    assert_eq!(stored_equipment_id, equipment_id);

    // 步骤 6: 校验点检项落库与缺失序号回退
    let items: Vec<(i32, String)> = conn
        .prepare("SELECT seq, item_name FROM checklist_item ORDER BY seq")
        .unwrap()
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0], (1, "检查轴承温度".to_string()));
    assert_eq!(items[1], (2, "检查润滑油位".to_string()));
    assert_eq!(items[2], (3, "检查异响".to_string()), "缺失序号应回退为顺位值");

    // 步骤 7: 校验二维码产物
    let qr_path: Option<String> = conn
        .query_row(
            "SELECT qr_image_path FROM checklist_template WHERE template_name = '电机季度点检'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    let qr_path = qr_path.expect("落库模板应带二维码路径");
    assert!(Path::new(&qr_path).exists(), "二维码 PNG 文件应已落盘");
    let qr_img = image::open(&qr_path).expect("二维码 PNG 应可解码");
    assert_eq!(qr_img.width(), qr_img.height(), "二维码图片应为正方形");
    assert!(qr_img.width() <= 240, "二维码边长不应超过配置值");

    // 步骤 8: 校验错误报告回写（工作表 2 的元数据列与点检项列）
    let report = test_helpers::find_single_report(storage.path()).expect("报告文件缺失");
    let bad_equipment = test_helpers::read_xlsx_cell(&report, 1, 1, 4).unwrap();
    assert!(bad_equipment.unwrap().contains("设备编号不存在: EQ-404"));

    let item_header = test_helpers::read_xlsx_cell(&report, 1, 5, 5).unwrap();
    assert_eq!(item_header.as_deref(), Some("错误信息"));

    let item_errors = test_helpers::read_xlsx_cell(&report, 1, 6, 5).unwrap().unwrap();
    assert!(item_errors.contains("点检项目不能为空"));
    assert!(item_errors.contains("判定标准不能为空"));

    // 合法工作表不应有任何错误注释
    assert!(test_helpers::read_xlsx_cell(&report, 0, 1, 4).unwrap().is_none());

    // 步骤 9: 校验任务记录与源文件清理
    let job_repo = ImportJobRepositoryImpl::new(&db_path).unwrap();
    let job = job_repo.find_by_id(&job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 100);
    assert!(!fixture.exists(), "终态后应删除上传临时文件");
}

// ==========================================
// 测试用例 2: 同文件内重复模板名称
// ==========================================

#[tokio::test]
async fn test_e2e_checklist_import_in_file_duplicate() {
    logging::init_test();

    let (_temp_db, db_path) = test_helpers::create_test_db().expect("测试数据库创建失败");
    let storage = tempfile::tempdir().expect("存储目录创建失败");
    let uploads = tempfile::tempdir().expect("上传目录创建失败");
    let (conn, _equipment_id) = setup_env(&db_path, &storage);

    // 两个工作表模板名称相同,首个保留,后者记重复
    let mut duplicate = valid_sheet();
    duplicate.sheet_name = "电机模板副本";
    duplicate.description = "";

    let fixture = uploads.path().join("重复模板.xlsx");
    test_helpers::write_template_xlsx(&fixture, &[valid_sheet(), duplicate]).expect("夹具生成失败");

    let job_id = create_pending_job(&db_path, &fixture).await;
    let runner = create_test_runner(&db_path);
    let outcome = runner.run_job(&job_id).await.expect("任务执行失败");

    assert_eq!(outcome.success_count, 1, "重复名称仅首个工作表落库");
    assert_eq!(outcome.failed_count, 1);

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM checklist_template", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);

    let report = test_helpers::find_single_report(storage.path()).expect("报告文件缺失");
    let duplicate_error = test_helpers::read_xlsx_cell(&report, 1, 0, 4).unwrap();
    assert!(
        duplicate_error.unwrap().contains("同文件内重复模板名称: 电机季度点检"),
        "重复错误应回写到后出现工作表的模板名称行"
    );
}

// ==========================================
// 测试用例 3: 库内已有同名模板
// ==========================================

#[tokio::test]
async fn test_e2e_checklist_import_store_duplicate() {
    logging::init_test();

    let (_temp_db, db_path) = test_helpers::create_test_db().expect("测试数据库创建失败");
    let storage = tempfile::tempdir().expect("存储目录创建失败");
    let uploads = tempfile::tempdir().expect("上传目录创建失败");
    let (conn, equipment_id) = setup_env(&db_path, &storage);

    // 库内预置同名模板
    conn.execute(
        "INSERT INTO checklist_template
         (template_code, template_name, equipment_id, cycle, created_at, updated_at)
         VALUES ('DJMB2024010100000001', '电机季度点检', ?1, 'QUARTERLY', datetime('now'), datetime('now'))",
        [equipment_id],
    )
    .unwrap();

    let fixture = uploads.path().join("点检模板.xlsx");
    test_helpers::write_template_xlsx(&fixture, &[valid_sheet()]).expect("夹具生成失败");

    let job_id = create_pending_job(&db_path, &fixture).await;
    let runner = create_test_runner(&db_path);
    let outcome = runner.run_job(&job_id).await.expect("任务执行失败");

    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(outcome.success_count, 0, "库内同名模板应拦截落库");
    assert_eq!(outcome.failed_count, 1);

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM checklist_template", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1, "模板总数应保持为预置的一条");

    let item_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM checklist_item", [], |row| row.get(0))
        .unwrap();
    assert_eq!(item_count, 0, "被拦截模板的点检项不应落库");

    let report = test_helpers::find_single_report(storage.path()).expect("报告文件缺失");
    let store_error = test_helpers::read_xlsx_cell(&report, 0, 0, 4).unwrap();
    assert!(store_error.unwrap().contains("模板名称已存在: 电机季度点检"));
}
