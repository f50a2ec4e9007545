// ==========================================
// 设备维保管理系统 - 点检模板导入剖面
// ==========================================
// 依据: 点检模板导入字段口径_v1.0.md - 工作表布局与校验规则
// 职责: 逐工作表解析 / 设备引用解析 / 模板+条目落库 / 报告回写
// 布局: 每个工作表一个模板;第 1~4 行元数据(B 列取值),
//       第 6 行条目表头,第 7 行起条目;E 列/F 列为错误注释保留列
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::checklist::{ParsedItem, TemplateRecord, TemplateSlot};
use crate::domain::types::{CheckCycle, ImportKind};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_runner_trait::{
    DataCleaner as DataCleanerTrait, DerivationService as DerivationServiceTrait, ImportProfile,
    ImportRecordOps,
};
use crate::importer::report;
use crate::importer::sheet_reader::{SheetData, SheetWorkbook};
use crate::repository::ChecklistImportRepository;
use async_trait::async_trait;
use chrono::{Local, Utc};
use std::collections::HashSet;
use tracing::{debug, warn};

// 元数据区（0 起坐标）
const META_VALUE_COL: usize = 1;
const META_ERROR_COL: usize = 4;

// 条目区（0 起坐标）
const ITEM_HEADER_ROW: usize = 5;
const ITEM_START_ROW: usize = 6;
const COL_ITEM_SEQ: usize = 0;
const COL_ITEM_NAME: usize = 1;
const COL_ITEM_METHOD: usize = 2;
const COL_ITEM_CRITERION: usize = 3;
const ITEM_ERROR_COL: usize = 5;

// F6 一次性表头标签
const ITEM_ERROR_HEADER: &str = "错误信息";

// ==========================================
// ChecklistProfile - 点检模板导入剖面实现
// ==========================================
pub struct ChecklistProfile<R, C>
where
    R: ChecklistImportRepository,
    C: ImportConfigReader,
{
    // 数据访问层
    import_repo: R,

    // 配置读取器（二维码尺寸/存储目录）
    config: C,

    // 导入组件
    data_cleaner: Box<dyn DataCleanerTrait>,
    derivation: Box<dyn DerivationServiceTrait>,
}

impl<R, C> ChecklistProfile<R, C>
where
    R: ChecklistImportRepository,
    C: ImportConfigReader,
{
    /// 创建点检模板导入剖面
    ///
    /// # 参数
    /// - import_repo: 模板导入仓储
    /// - config: 配置读取器
    /// - data_cleaner: 数据清洗器
    /// - derivation: 派生产物服务（模板编号/二维码）
    pub fn new(
        import_repo: R,
        config: C,
        data_cleaner: Box<dyn DataCleanerTrait>,
        derivation: Box<dyn DerivationServiceTrait>,
    ) -> Self {
        Self {
            import_repo,
            config,
            data_cleaner,
            derivation,
        }
    }

    /// 解析单个工作表为模板记录（穷尽收集元数据与条目违规）
    fn parse_sheet(&self, sheet_index: usize, sheet: &SheetData) -> TemplateRecord {
        let mut record = TemplateRecord::new(sheet_index, sheet.name.clone());

        // === 元数据区 ===
        record.template_name = self
            .data_cleaner
            .cell_to_text(sheet.cell(TemplateSlot::Name.sheet_row(), META_VALUE_COL));
        record.equipment_code = self
            .data_cleaner
            .cell_to_text(sheet.cell(TemplateSlot::EquipmentCode.sheet_row(), META_VALUE_COL));
        record.description = self
            .data_cleaner
            .cell_to_text(sheet.cell(TemplateSlot::Description.sheet_row(), META_VALUE_COL));

        if record.template_name.is_none() {
            record.meta_errors.push(TemplateSlot::Name, "模板名称不能为空");
        }
        if record.equipment_code.is_none() {
            record
                .meta_errors
                .push(TemplateSlot::EquipmentCode, "设备编号不能为空");
        }

        // 点检周期: 未知标签与空值均回退默认值,不计错误
        record.cycle = match self
            .data_cleaner
            .cell_to_text(sheet.cell(TemplateSlot::Cycle.sheet_row(), META_VALUE_COL))
        {
            Some(label) => CheckCycle::from_label(&label),
            None => CheckCycle::Daily,
        };

        // === 条目区 ===
        for row_idx in ITEM_START_ROW..sheet.row_count() {
            if sheet.is_row_blank_in(row_idx, COL_ITEM_SEQ..=COL_ITEM_CRITERION) {
                continue;
            }

            let item_name = self
                .data_cleaner
                .cell_to_text(sheet.cell(row_idx, COL_ITEM_NAME));
            let check_method = self
                .data_cleaner
                .cell_to_text(sheet.cell(row_idx, COL_ITEM_METHOD));
            let judge_criterion = self
                .data_cleaner
                .cell_to_text(sheet.cell(row_idx, COL_ITEM_CRITERION));

            // 必填缺失的条目整行剔除,按行记录条目错误
            let mut item_valid = true;
            if item_name.is_none() {
                record.item_errors.push(row_idx, "点检项目不能为空");
                item_valid = false;
            }
            if check_method.is_none() {
                record.item_errors.push(row_idx, "点检方法不能为空");
                item_valid = false;
            }
            if judge_criterion.is_none() {
                record.item_errors.push(row_idx, "判定标准不能为空");
                item_valid = false;
            }
            if !item_valid {
                continue;
            }

            let fallback_seq = record.items.len() as i32 + 1;
            record.items.push(ParsedItem {
                sheet_row: row_idx,
                seq: self
                    .data_cleaner
                    .parse_seq_cell(sheet.cell(row_idx, COL_ITEM_SEQ), fallback_seq),
                item_name: item_name.unwrap_or_default(),
                check_method: check_method.unwrap_or_default(),
                judge_criterion: judge_criterion.unwrap_or_default(),
            });
        }

        // 零有效条目且零条目错误: 区分"没提供条目"与"条目全部无效"
        if record.items.is_empty() && record.item_errors.is_empty() {
            record
                .meta_errors
                .push(TemplateSlot::Name, "模板未包含任何点检项");
        }

        record
    }

    /// 二维码生成、落盘并回写存储路径（可选产物）
    async fn attach_qr(&self, template_id: i64, template_code: &str) -> ImportResult<()> {
        let size_px = self.config.get_qr_size_px().await.map_err(|e| {
            ImportError::ConfigReadError {
                key: "qr_size_px".to_string(),
                message: e.to_string(),
            }
        })?;
        let storage_dir = self.config.get_storage_dir().await.map_err(|e| {
            ImportError::ConfigReadError {
                key: "storage_dir".to_string(),
                message: e.to_string(),
            }
        })?;

        let qr_dir = storage_dir.join("qr_codes");
        std::fs::create_dir_all(&qr_dir).map_err(|e| ImportError::ArtifactWriteError {
            path: qr_dir.display().to_string(),
            message: e.to_string(),
        })?;

        let png = self.derivation.render_qr_png(template_code, size_px)?;
        let target = qr_dir.join(format!("{}.png", template_code));
        std::fs::write(&target, &png).map_err(|e| ImportError::ArtifactWriteError {
            path: target.display().to_string(),
            message: e.to_string(),
        })?;

        self.import_repo
            .update_qr_image_path(template_id, &target.display().to_string())
            .await?;
        Ok(())
    }
}

#[async_trait]
impl<R, C> ImportProfile for ChecklistProfile<R, C>
where
    R: ChecklistImportRepository + Send + Sync,
    C: ImportConfigReader + Send + Sync,
{
    type Record = TemplateRecord;

    fn kind(&self) -> ImportKind {
        ImportKind::ChecklistTemplate
    }

    /// 逐工作表解析（阶段 2）
    ///
    /// # 说明
    /// - 无任何内容的工作表直接跳过,不产生记录
    fn parse(&self, workbook: &SheetWorkbook) -> Vec<TemplateRecord> {
        let mut records = Vec::new();
        for (sheet_index, sheet) in workbook.sheets.iter().enumerate() {
            if !sheet.has_any_value() {
                continue;
            }
            records.push(self.parse_sheet(sheet_index, sheet));
        }

        debug!(count = records.len(), "模板工作表解析完成");
        records
    }

    /// 设备编号批量解析（阶段 3,单次查询）
    async fn resolve_references(&self, records: &mut [TemplateRecord]) -> ImportResult<()> {
        let codes: Vec<String> = records
            .iter()
            .filter_map(|r| r.equipment_code.as_ref())
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        if codes.is_empty() {
            return Ok(());
        }

        let id_map = self.import_repo.find_equipment_ids_by_codes(&codes).await?;

        for record in records.iter_mut() {
            let code = match record.equipment_code.as_ref() {
                Some(code) if !code.trim().is_empty() => code.clone(),
                _ => continue,
            };
            match id_map.get(&code.trim().to_uppercase()) {
                Some(id) => record.equipment_id = Some(*id),
                None => {
                    // 该槽位已有错误时不再追加"不存在"消息
                    if !record.meta_errors.contains(&TemplateSlot::EquipmentCode) {
                        record
                            .meta_errors
                            .push(TemplateSlot::EquipmentCode, format!("设备编号不存在: {}", code));
                    }
                }
            }
        }

        Ok(())
    }

    /// 库内模板名称存在性查询（阶段 4）
    async fn find_existing_keys(&self, keys: &[String]) -> ImportResult<Vec<String>> {
        let existing = self.import_repo.find_existing_template_names(keys).await?;
        Ok(existing)
    }

    /// 选择性落库（阶段 5）
    ///
    /// # 说明
    /// - 模板编号为必要产物,派生失败的模板跳过落库,不影响其余模板
    /// - 二维码为可选产物,生成失败仅告警,模板仍计为成功落库
    async fn commit(&self, records: &[TemplateRecord]) -> ImportResult<usize> {
        let now = Utc::now();
        let derive_now = Local::now().naive_local();
        let mut templates = Vec::new();

        for record in records.iter().filter(|r| ImportRecordOps::is_insertable(*r)) {
            let mut template = match record.to_template(now) {
                Some(template) => template,
                None => continue,
            };

            match self
                .derivation
                .derive_template_code(derive_now, templates.len())
            {
                Ok(code) => {
                    template.template_code = Some(code);
                    templates.push(template);
                }
                Err(e) => warn!(
                    sheet = %record.sheet_name,
                    error = %e,
                    "模板编号派生失败,该模板跳过落库"
                ),
            }
        }

        if templates.is_empty() {
            debug!("无可落库模板记录,跳过落库");
            return Ok(0);
        }

        let inserted = self.import_repo.batch_insert_templates(&templates).await?;
        let committed = inserted.len();

        for (template_id, template_code) in &inserted {
            if let Err(e) = self.attach_qr(*template_id, template_code).await {
                warn!(
                    template_code = %template_code,
                    error = %e,
                    "二维码生成失败,模板仍计为成功落库"
                );
            }
        }

        Ok(committed)
    }

    /// 错误报告回写（阶段 6）
    ///
    /// # 说明
    /// - 元数据错误写入 E 列槽位行;条目错误写入 F 列条目行
    /// - 存在条目错误的工作表在 F6 写入一次表头标签
    fn annotate_report(
        &self,
        workbook: &SheetWorkbook,
        records: &[TemplateRecord],
    ) -> ImportResult<rust_xlsxwriter::Workbook> {
        let mut report_workbook = rust_xlsxwriter::Workbook::new();
        let error_format = report::error_format();
        let header_format = report::annotation_header_format();

        for (sheet_index, sheet) in workbook.sheets.iter().enumerate() {
            let worksheet = report_workbook.add_worksheet();
            worksheet.set_name(&sheet.name)?;
            report::copy_sheet_values(worksheet, sheet)?;

            let record = match records.iter().find(|r| r.sheet_index == sheet_index) {
                Some(record) => record,
                None => continue,
            };

            for slot in [
                TemplateSlot::Name,
                TemplateSlot::EquipmentCode,
                TemplateSlot::Cycle,
                TemplateSlot::Description,
            ] {
                if let Some(message) = record.meta_errors.joined_at(&slot, "\n") {
                    report::write_error_cell(
                        worksheet,
                        slot.sheet_row() as u32,
                        META_ERROR_COL as u16,
                        &message,
                        &error_format,
                    )?;
                }
            }

            if !record.item_errors.is_empty() {
                // 每工作表仅写一次的条目错误表头
                worksheet.write_string_with_format(
                    ITEM_HEADER_ROW as u32,
                    ITEM_ERROR_COL as u16,
                    ITEM_ERROR_HEADER,
                    &header_format,
                )?;

                let rows: Vec<usize> = record.item_errors.iter().map(|(row, _)| *row).collect();
                for row in rows {
                    if let Some(message) = record.item_errors.joined_at(&row, "\n") {
                        report::write_error_cell(
                            worksheet,
                            row as u32,
                            ITEM_ERROR_COL as u16,
                            &message,
                            &error_format,
                        )?;
                    }
                }
            }
        }

        Ok(report_workbook)
    }
}

// ==========================================
// TemplateRecord 的通用记录操作
// ==========================================
impl ImportRecordOps for TemplateRecord {
    fn natural_key(&self) -> Option<String> {
        TemplateRecord::natural_key(self)
    }

    fn position_label(&self) -> String {
        format!("工作表[{}]", self.sheet_name)
    }

    fn has_errors(&self) -> bool {
        TemplateRecord::has_errors(self)
    }

    fn is_insertable(&self) -> bool {
        TemplateRecord::is_insertable(self)
    }

    fn mark_in_file_duplicate(&mut self) {
        if let Some(key) = TemplateRecord::natural_key(self) {
            self.meta_errors
                .push(TemplateSlot::Name, format!("同文件内重复模板名称: {}", key));
        }
    }

    fn mark_store_duplicate(&mut self) {
        if let Some(key) = TemplateRecord::natural_key(self) {
            self.meta_errors
                .push(TemplateSlot::Name, format!("模板名称已存在: {}", key));
        }
    }
}
