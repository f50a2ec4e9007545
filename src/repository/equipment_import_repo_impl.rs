// ==========================================
// 设备维保管理系统 - 设备导入 Repository 实现
// ==========================================
// 存储: factory / equipment 表
// 约束: 批量查询一次成型(IN 子句),禁止逐行查询
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::equipment::Equipment;
use crate::domain::types::EquipmentStatus;
use crate::repository::equipment_import_repo::EquipmentImportRepository;
use crate::repository::error::RepositoryError;
use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// EquipmentImportRepositoryImpl
// ==========================================
pub struct EquipmentImportRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl EquipmentImportRepositoryImpl {
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

    /// 行 → Equipment 映射
    fn map_row(row: &Row<'_>) -> rusqlite::Result<Equipment> {
        let status_str: String = row.get("status")?;
        let purchase_date: Option<String> = row.get("purchase_date")?;

        Ok(Equipment {
            id: row.get("id")?,
            equipment_code: row.get("equipment_code")?,
            equipment_name: row.get("equipment_name")?,
            model_spec: row.get("model_spec")?,
            factory_id: row.get("factory_id")?,
            location: row.get("location")?,
            status: EquipmentStatus::from_label(&status_str),
            purchase_date: purchase_date
                .and_then(|d| chrono::NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            purchase_cost: row.get("purchase_cost")?,
            photo_path: row.get("photo_path")?,
            remark: row.get("remark")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[async_trait]
impl EquipmentImportRepository for EquipmentImportRepositoryImpl {
    async fn find_factory_ids_by_codes(
        &self,
        codes: &[String],
    ) -> Result<HashMap<String, i64>, Box<dyn Error>> {
        if codes.is_empty() {
            return Ok(HashMap::new());
        }

        let conn = self.lock_conn()?;

        let placeholders = vec!["?"; codes.len()].join(",");
        let sql = format!(
            "SELECT UPPER(factory_code), id FROM factory WHERE UPPER(factory_code) IN ({})",
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

    async fn find_existing_codes(&self, codes: &[String]) -> Result<Vec<String>, Box<dyn Error>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.lock_conn()?;

        let placeholders = vec!["?"; codes.len()].join(",");
        let sql = format!(
            "SELECT UPPER(equipment_code) FROM equipment WHERE UPPER(equipment_code) IN ({})",
            placeholders
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params_from_iter(codes.iter().map(|c| c.trim().to_uppercase())),
            |row| row.get::<_, String>(0),
        )?;

        let mut existing = Vec::new();
        for row in rows {
            existing.push(row.map_err(RepositoryError::from)?);
        }
        Ok(existing)
    }

    async fn batch_insert_equipment(
        &self,
        equipments: &[Equipment],
    ) -> Result<usize, Box<dyn Error>> {
        let mut conn = self.lock_conn()?;

        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut count = 0usize;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR IGNORE INTO equipment (
                    equipment_code, equipment_name, model_spec, factory_id,
                    location, status, purchase_date, purchase_cost,
                    photo_path, remark, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
            )?;

            for equipment in equipments {
                let affected = stmt.execute(params![
                    equipment.equipment_code,
                    equipment.equipment_name,
                    equipment.model_spec,
                    equipment.factory_id,
                    equipment.location,
                    equipment.status.to_db_str(),
                    equipment
                        .purchase_date
                        .map(|d| d.format("%Y-%m-%d").to_string()),
                    equipment.purchase_cost,
                    equipment.photo_path,
                    equipment.remark,
                    equipment.created_at,
                    equipment.updated_at,
                ])?;
                count += affected;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(count)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Equipment>, Box<dyn Error>> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, equipment_code, equipment_name, model_spec, factory_id,
                    location, status, purchase_date, purchase_cost,
                    photo_path, remark, created_at, updated_at
             FROM equipment WHERE UPPER(equipment_code) = ?1",
        )?;

        let result = stmt.query_row(params![code.trim().to_uppercase()], Self::map_row);
        match result {
            Ok(equipment) => Ok(Some(equipment)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(RepositoryError::from(e))),
        }
    }

    async fn count_equipment(&self) -> Result<i64, Box<dyn Error>> {
        let conn = self.lock_conn()?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM equipment", [], |row| row.get(0))?;
        Ok(count)
    }
}
