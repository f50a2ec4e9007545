// ==========================================
// 设备维保管理系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免“部分模块外键开启/部分不开启”
// - 统一 busy_timeout，减少 worker 并发写任务表时的偶发 busy 错误
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明：
/// - v1 设备台账与工厂主数据；v2 点检模板与条目；v3 导入任务表
/// - 版本号用于**提示/告警**（不做自动迁移），避免静默在旧库上运行导致隐性错误
pub const CURRENT_SCHEMA_VERSION: i64 = 3;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化全量 schema（幂等,CREATE TABLE IF NOT EXISTS）
///
/// # 说明
/// - worker 单机部署场景直接建库;平台部署场景由运维迁移脚本建库,此函数仅兜底
/// - 测试环境亦通过此函数建库,保证两侧表结构一致
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key      TEXT NOT NULL,
            value    TEXT NOT NULL,
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS factory (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            factory_code TEXT NOT NULL UNIQUE,
            factory_name TEXT NOT NULL,
            created_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS equipment (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            equipment_code TEXT NOT NULL UNIQUE,
            equipment_name TEXT NOT NULL,
            model_spec     TEXT,
            factory_id     INTEGER NOT NULL REFERENCES factory(id),
            location       TEXT,
            status         TEXT NOT NULL DEFAULT 'NORMAL',
            purchase_date  TEXT,
            purchase_cost  REAL NOT NULL DEFAULT 0,
            photo_path     TEXT,
            remark         TEXT,
            created_at     TEXT NOT NULL,
            updated_at     TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_equipment_factory ON equipment(factory_id);

        CREATE TABLE IF NOT EXISTS checklist_template (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            template_code TEXT UNIQUE,
            template_name TEXT NOT NULL UNIQUE,
            equipment_id  INTEGER NOT NULL REFERENCES equipment(id),
            cycle         TEXT NOT NULL DEFAULT 'DAILY',
            description   TEXT,
            qr_image_path TEXT,
            created_at    TEXT NOT NULL,
            updated_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS checklist_item (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            template_id     INTEGER NOT NULL REFERENCES checklist_template(id) ON DELETE CASCADE,
            seq             INTEGER NOT NULL,
            item_name       TEXT NOT NULL,
            check_method    TEXT NOT NULL,
            judge_criterion TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_checklist_item_template ON checklist_item(template_id);

        CREATE TABLE IF NOT EXISTS import_job (
            job_id            TEXT PRIMARY KEY,
            kind              TEXT NOT NULL,
            file_name         TEXT NOT NULL,
            file_size         INTEGER NOT NULL DEFAULT 0,
            source_path       TEXT NOT NULL,
            status            TEXT NOT NULL DEFAULT 'PENDING',
            progress          INTEGER NOT NULL DEFAULT 0,
            total_records     INTEGER NOT NULL DEFAULT 0,
            processed_records INTEGER NOT NULL DEFAULT 0,
            success_count     INTEGER NOT NULL DEFAULT 0,
            failed_count      INTEGER NOT NULL DEFAULT 0,
            error_report_url  TEXT,
            error_message     TEXT,
            created_at        TEXT NOT NULL,
            started_at        TEXT,
            finished_at       TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_import_job_status ON import_job(status, created_at);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}
