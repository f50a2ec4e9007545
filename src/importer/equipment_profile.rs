// ==========================================
// 设备维保管理系统 - 设备台账导入剖面
// ==========================================
// 依据: 设备台账导入字段口径_v1.1.md - 列映射与校验规则
// 职责: 设备工作表解析 / 工厂引用解析 / 批量落库 / 报告回写
// 布局: 仅首工作表;第 1 行表头,第 2 行起数据;J 列为错误注释保留列
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::equipment::EquipmentRecord;
use crate::domain::types::{EquipmentStatus, ImportKind};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_runner_trait::{
    DataCleaner as DataCleanerTrait, ImportProfile, ImportRecordOps,
};
use crate::importer::report;
use crate::importer::sheet_reader::{SheetData, SheetWorkbook};
use crate::repository::EquipmentImportRepository;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, warn};
use uuid::Uuid;

// 设备工作表列位（0 起）
const COL_EQUIPMENT_CODE: usize = 0;
const COL_EQUIPMENT_NAME: usize = 1;
const COL_MODEL_SPEC: usize = 2;
const COL_FACTORY_CODE: usize = 3;
const COL_LOCATION: usize = 4;
const COL_STATUS: usize = 5;
const COL_PURCHASE_DATE: usize = 6;
const COL_PURCHASE_COST: usize = 7;
const COL_REMARK: usize = 8;
const COL_ERROR_ANNOTATION: usize = 9;

// 数据区自第 2 行起（0 起坐标）
const DATA_START_ROW: usize = 1;

// ==========================================
// EquipmentProfile - 设备台账导入剖面实现
// ==========================================
pub struct EquipmentProfile<R, C>
where
    R: EquipmentImportRepository,
    C: ImportConfigReader,
{
    // 数据访问层
    import_repo: R,

    // 配置读取器（照片归档目录）
    config: C,

    // 导入组件
    data_cleaner: Box<dyn DataCleanerTrait>,
}

impl<R, C> EquipmentProfile<R, C>
where
    R: EquipmentImportRepository,
    C: ImportConfigReader,
{
    /// 创建设备台账导入剖面
    ///
    /// # 参数
    /// - import_repo: 设备导入仓储
    /// - config: 配置读取器
    /// - data_cleaner: 数据清洗器
    pub fn new(import_repo: R, config: C, data_cleaner: Box<dyn DataCleanerTrait>) -> Self {
        Self {
            import_repo,
            config,
            data_cleaner,
        }
    }

    /// 解析单行为候选记录（穷尽收集该行全部违规）
    fn parse_row(&self, sheet: &SheetData, workbook: &SheetWorkbook, row_idx: usize) -> EquipmentRecord {
        let mut record = EquipmentRecord::new(row_idx + 1);

        record.equipment_code = self.data_cleaner.cell_to_text(sheet.cell(row_idx, COL_EQUIPMENT_CODE));
        record.equipment_name = self.data_cleaner.cell_to_text(sheet.cell(row_idx, COL_EQUIPMENT_NAME));
        record.model_spec = self.data_cleaner.cell_to_text(sheet.cell(row_idx, COL_MODEL_SPEC));
        record.factory_code = self.data_cleaner.cell_to_text(sheet.cell(row_idx, COL_FACTORY_CODE));
        record.location = self.data_cleaner.cell_to_text(sheet.cell(row_idx, COL_LOCATION));
        record.remark = self.data_cleaner.cell_to_text(sheet.cell(row_idx, COL_REMARK));

        // 必填校验（缺一条记一条,不短路）
        if record.equipment_code.is_none() {
            record.errors.push("equipment_code".to_string(), "设备编号不能为空");
        }
        if record.equipment_name.is_none() {
            record.errors.push("equipment_name".to_string(), "设备名称不能为空");
        }
        if record.factory_code.is_none() {
            record.errors.push("factory_code".to_string(), "所属工厂编号不能为空");
        }

        // 设备状态: 未知标签回退默认值,不计错误
        record.status = match self.data_cleaner.cell_to_text(sheet.cell(row_idx, COL_STATUS)) {
            Some(label) => EquipmentStatus::from_label(&label),
            None => EquipmentStatus::Normal,
        };

        // 购置日期: 非空但无法解析才计错误
        match self.data_cleaner.parse_date_cell(sheet.cell(row_idx, COL_PURCHASE_DATE)) {
            Ok(date) => record.purchase_date = date,
            Err(message) => record.errors.push("purchase_date".to_string(), message),
        }

        // 购置金额: 解析失败回退 0.0
        record.purchase_cost = self
            .data_cleaner
            .parse_amount_cell(sheet.cell(row_idx, COL_PURCHASE_COST));

        // 行锚定照片（左上角锚定在本数据行上的第一张图片）
        record.photo = workbook.image_at(0, row_idx).cloned();

        record
    }

    /// 照片归档到存储目录,返回落盘路径
    async fn archive_photo(
        &self,
        equipment_code: &str,
        image: &crate::domain::types::EmbeddedImage,
    ) -> ImportResult<String> {
        let storage_dir = self.config.get_storage_dir().await.map_err(|e| {
            ImportError::ConfigReadError {
                key: "storage_dir".to_string(),
                message: e.to_string(),
            }
        })?;

        let photo_dir = storage_dir.join("equipment_photos");
        std::fs::create_dir_all(&photo_dir).map_err(|e| ImportError::ArtifactWriteError {
            path: photo_dir.display().to_string(),
            message: e.to_string(),
        })?;

        let file_name = format!("{}_{}.{}", equipment_code, Uuid::new_v4(), image.ext);
        let target = photo_dir.join(&file_name);
        std::fs::write(&target, &image.data).map_err(|e| ImportError::ArtifactWriteError {
            path: target.display().to_string(),
            message: e.to_string(),
        })?;

        Ok(target.display().to_string())
    }
}

#[async_trait]
impl<R, C> ImportProfile for EquipmentProfile<R, C>
where
    R: EquipmentImportRepository + Send + Sync,
    C: ImportConfigReader + Send + Sync,
{
    type Record = EquipmentRecord;

    fn kind(&self) -> ImportKind {
        ImportKind::Equipment
    }

    /// 解析首工作表（阶段 2）
    ///
    /// # 说明
    /// - 相关列范围（A..=I）全空的行直接跳过,不产生记录
    fn parse(&self, workbook: &SheetWorkbook) -> Vec<EquipmentRecord> {
        let sheet = match workbook.sheets.first() {
            Some(sheet) => sheet,
            None => return Vec::new(),
        };

        let mut records = Vec::new();
        for row_idx in DATA_START_ROW..sheet.row_count() {
            if sheet.is_row_blank_in(row_idx, COL_EQUIPMENT_CODE..=COL_REMARK) {
                continue;
            }
            records.push(self.parse_row(sheet, workbook, row_idx));
        }

        debug!(count = records.len(), "设备工作表解析完成");
        records
    }

    /// 工厂编号批量解析（阶段 3,单次查询）
    async fn resolve_references(&self, records: &mut [EquipmentRecord]) -> ImportResult<()> {
        let codes: Vec<String> = records
            .iter()
            .filter_map(|r| r.factory_code.as_ref())
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        if codes.is_empty() {
            return Ok(());
        }

        let id_map = self.import_repo.find_factory_ids_by_codes(&codes).await?;

        let factory_key = "factory_code".to_string();
        for record in records.iter_mut() {
            let code = match record.factory_code.as_ref() {
                Some(code) if !code.trim().is_empty() => code.clone(),
                _ => continue,
            };
            match id_map.get(&code.trim().to_uppercase()) {
                Some(id) => record.factory_id = Some(*id),
                None => {
                    // 该槽位已有错误时不再追加"不存在"消息
                    if !record.errors.contains(&factory_key) {
                        record
                            .errors
                            .push(factory_key.clone(), format!("所属工厂编号不存在: {}", code));
                    }
                }
            }
        }

        Ok(())
    }

    /// 库内设备编号存在性查询（阶段 4）
    async fn find_existing_keys(&self, keys: &[String]) -> ImportResult<Vec<String>> {
        let existing = self.import_repo.find_existing_codes(keys).await?;
        Ok(existing)
    }

    /// 选择性落库（阶段 5）
    ///
    /// # 说明
    /// - 照片归档失败仅告警,该设备仍按无照片落库
    async fn commit(&self, records: &[EquipmentRecord]) -> ImportResult<usize> {
        let now = Utc::now();
        let mut entities = Vec::new();

        for record in records.iter().filter(|r| ImportRecordOps::is_insertable(*r)) {
            let mut equipment = match record.to_equipment(now) {
                Some(equipment) => equipment,
                None => continue,
            };

            if let Some(image) = &record.photo {
                match self.archive_photo(&equipment.equipment_code, image).await {
                    Ok(path) => equipment.photo_path = Some(path),
                    Err(e) => warn!(
                        equipment_code = %equipment.equipment_code,
                        error = %e,
                        "设备照片归档失败,按无照片落库"
                    ),
                }
            }

            entities.push(equipment);
        }

        if entities.is_empty() {
            debug!("无可落库设备记录,跳过落库");
            return Ok(0);
        }

        let inserted = self.import_repo.batch_insert_equipment(&entities).await?;
        Ok(inserted)
    }

    /// 错误报告回写（阶段 6）
    ///
    /// # 说明
    /// - 原列数据原值复制,行级错误合并为多行消息写入 J 列
    fn annotate_report(
        &self,
        workbook: &SheetWorkbook,
        records: &[EquipmentRecord],
    ) -> ImportResult<rust_xlsxwriter::Workbook> {
        let mut report_workbook = rust_xlsxwriter::Workbook::new();
        let error_format = report::error_format();

        let sheet = match workbook.sheets.first() {
            Some(sheet) => sheet,
            None => return Ok(report_workbook),
        };

        let worksheet = report_workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        report::copy_sheet_values(worksheet, sheet)?;

        for record in records {
            if let Some(message) = record.joined_error_message() {
                report::write_error_cell(
                    worksheet,
                    (record.row_number - 1) as u32,
                    COL_ERROR_ANNOTATION as u16,
                    &message,
                    &error_format,
                )?;
            }
        }

        Ok(report_workbook)
    }
}

// ==========================================
// EquipmentRecord 的通用记录操作
// ==========================================
impl ImportRecordOps for EquipmentRecord {
    fn natural_key(&self) -> Option<String> {
        EquipmentRecord::natural_key(self)
    }

    fn position_label(&self) -> String {
        format!("第{}行", self.row_number)
    }

    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn is_insertable(&self) -> bool {
        EquipmentRecord::is_insertable(self)
    }

    fn mark_in_file_duplicate(&mut self) {
        if let Some(key) = EquipmentRecord::natural_key(self) {
            self.errors
                .push("equipment_code".to_string(), format!("同文件内重复设备编号: {}", key));
        }
    }

    fn mark_store_duplicate(&mut self) {
        if let Some(key) = EquipmentRecord::natural_key(self) {
            self.errors
                .push("equipment_code".to_string(), format!("设备编号已存在: {}", key));
        }
    }
}
