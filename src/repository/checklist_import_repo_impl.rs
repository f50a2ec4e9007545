// ==========================================
// 设备维保管理系统 - 点检模板导入 Repository 实现
// ==========================================
// 存储: checklist_template / checklist_item 表
// 约束: 模板与条目同事务;模板被唯一约束跳过时其条目一并跳过
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::checklist::{ChecklistItem, ChecklistTemplate};
use crate::domain::types::CheckCycle;
use crate::repository::checklist_import_repo::ChecklistImportRepository;
use crate::repository::error::RepositoryError;
use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ChecklistImportRepositoryImpl
// ==========================================
pub struct ChecklistImportRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ChecklistImportRepositoryImpl {
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
}

#[async_trait]
impl ChecklistImportRepository for ChecklistImportRepositoryImpl {
    async fn find_equipment_ids_by_codes(
        &self,
        codes: &[String],
    ) -> Result<HashMap<String, i64>, Box<dyn Error>> {
        if codes.is_empty() {
            return Ok(HashMap::new());
        }

        let conn = self.lock_conn()?;

        let placeholders = vec!["?"; codes.len()].join(",");
        let sql = format!(
            "SELECT UPPER(equipment_code), id FROM equipment WHERE UPPER(equipment_code) IN ({})",
            placeholders
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params_from_iter(codes.iter().map(|c| c.trim().to_uppercase())),
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
        )?;

        let mut map = HashMap::new();
        for row in rows {
            let (code, id) = row.map_err(RepositoryError::from)?;
            map.insert(code, id);
        }
        Ok(map)
    }

    async fn find_existing_template_names(
        &self,
        names: &[String],
    ) -> Result<Vec<String>, Box<dyn Error>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.lock_conn()?;

        let placeholders = vec!["?"; names.len()].join(",");
        let sql = format!(
            "SELECT UPPER(template_name) FROM checklist_template WHERE UPPER(template_name) IN ({})",
            placeholders
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params_from_iter(names.iter().map(|n| n.trim().to_uppercase())),
            |row| row.get::<_, String>(0),
        )?;

        let mut existing = Vec::new();
        for row in rows {
            existing.push(row.map_err(RepositoryError::from)?);
        }
        Ok(existing)
    }

    async fn batch_insert_templates(
        &self,
        templates: &[ChecklistTemplate],
    ) -> Result<Vec<(i64, String)>, Box<dyn Error>> {
        let mut conn = self.lock_conn()?;

        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut inserted = Vec::new();
        {
            let mut template_stmt = tx.prepare(
                r#"
                INSERT OR IGNORE INTO checklist_template (
                    template_code, template_name, equipment_id, cycle,
                    description, qr_image_path, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )?;
            let mut item_stmt = tx.prepare(
                r#"
                INSERT INTO checklist_item (
                    template_id, seq, item_name, check_method, judge_criterion
                ) VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )?;

            for template in templates {
                let affected = template_stmt.execute(params![
                    template.template_code,
                    template.template_name,
                    template.equipment_id,
                    template.cycle.to_db_str(),
                    template.description,
                    template.qr_image_path,
                    template.created_at,
                    template.updated_at,
                ])?;

                if affected == 0 {
                    // 唯一约束跳过(并发写入竞态),条目一并跳过
                    continue;
                }

                let template_id = tx.last_insert_rowid();
                for item in &template.items {
                    item_stmt.execute(params![
                        template_id,
                        item.seq,
                        item.item_name,
                        item.check_method,
                        item.judge_criterion,
                    ])?;
                }

                let code = template.template_code.clone().unwrap_or_default();
                inserted.push((template_id, code));
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(inserted)
    }

    async fn update_qr_image_path(
        &self,
        template_id: i64,
        qr_image_path: &str,
    ) -> Result<(), Box<dyn Error>> {
        let conn = self.lock_conn()?;

        conn.execute(
            "UPDATE checklist_template SET qr_image_path = ?2 WHERE id = ?1",
            params![template_id, qr_image_path],
        )?;
        Ok(())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ChecklistTemplate>, Box<dyn Error>> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, template_code, template_name, equipment_id, cycle,
                    description, qr_image_path, created_at, updated_at
             FROM checklist_template WHERE UPPER(template_name) = ?1",
        )?;

        let result = stmt.query_row(params![name.trim().to_uppercase()], |row| {
            let cycle_str: String = row.get("cycle")?;
            Ok(ChecklistTemplate {
                id: row.get("id")?,
                template_code: row.get("template_code")?,
                template_name: row.get("template_name")?,
                equipment_id: row.get("equipment_id")?,
                cycle: CheckCycle::from_label(&cycle_str),
                description: row.get("description")?,
                qr_image_path: row.get("qr_image_path")?,
                items: Vec::new(),
                created_at: row.get("created_at")?,
                updated_at: row.get("updated_at")?,
            })
        });

        let mut template = match result {
            Ok(t) => t,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(Box::new(RepositoryError::from(e))),
        };

        // 加载条目（按序号升序）
        if let Some(template_id) = template.id {
            let mut item_stmt = conn.prepare(
                "SELECT id, template_id, seq, item_name, check_method, judge_criterion
                 FROM checklist_item WHERE template_id = ?1 ORDER BY seq",
            )?;
            let rows = item_stmt.query_map(params![template_id], |row| {
                Ok(ChecklistItem {
                    id: row.get("id")?,
                    template_id: row.get("template_id")?,
                    seq: row.get("seq")?,
                    item_name: row.get("item_name")?,
                    check_method: row.get("check_method")?,
                    judge_criterion: row.get("judge_criterion")?,
                })
            })?;

            for row in rows {
                template.items.push(row.map_err(RepositoryError::from)?);
            }
        }

        Ok(Some(template))
    }

    async fn count_templates(&self) -> Result<i64, Box<dyn Error>> {
        let conn = self.lock_conn()?;

        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM checklist_template", [], |row| row.get(0))?;
        Ok(count)
    }
}
