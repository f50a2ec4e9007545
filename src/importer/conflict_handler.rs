// ==========================================
// 设备维保管理系统 - 唯一性检测实现
// ==========================================
// 依据: 批量导入接口约定_v1.0.md - 重复主键策略
// 职责: 检测文件内/库内重复业务主键并标记到记录错误集
// 策略: 文件内首次出现不标记,第 2 次起标记;库内命中全部标记
// ==========================================

use crate::importer::import_runner_trait::{ConflictHandler as ConflictHandlerTrait, ImportRecordOps};
use std::collections::{HashMap, HashSet};
use tracing::debug;

pub struct ConflictHandler;

impl ConflictHandler {
    pub fn new() -> Self {
        ConflictHandler
    }
}

impl Default for ConflictHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ConflictHandlerTrait for ConflictHandler {
    /// 文件内重复检测
    ///
    /// # 返回
    /// - 被标记的记录数（不包括每个主键的首次出现）
    fn flag_in_file_duplicates<R: ImportRecordOps>(&self, records: &mut [R]) -> usize {
        let mut first_occurrence: HashMap<String, usize> = HashMap::new();
        let mut flagged = 0;

        for (idx, record) in records.iter_mut().enumerate() {
            if let Some(key) = record.natural_key() {
                if first_occurrence.contains_key(&key) {
                    // 非首次出现：标记当前记录
                    record.mark_in_file_duplicate();
                    flagged += 1;
                    debug!(position = %record.position_label(), key = %key, "文件内重复主键");
                } else {
                    // 首次出现：仅登记
                    first_occurrence.insert(key, idx);
                }
            }
        }

        flagged
    }

    /// 库内重复检测
    ///
    /// # 参数
    /// - records: 候选记录列表
    /// - existing_keys: 库中已存在的主键（统一大写）
    ///
    /// # 返回
    /// - 被标记的记录数（主键命中的记录全部标记）
    fn flag_store_duplicates<R: ImportRecordOps>(
        &self,
        records: &mut [R],
        existing_keys: &[String],
    ) -> usize {
        if existing_keys.is_empty() {
            return 0;
        }

        let existing_set: HashSet<&str> = existing_keys.iter().map(|k| k.as_str()).collect();
        let mut flagged = 0;

        for record in records.iter_mut() {
            if let Some(key) = record.natural_key() {
                if existing_set.contains(key.as_str()) {
                    record.mark_store_duplicate();
                    flagged += 1;
                    debug!(position = %record.position_label(), key = %key, "主键已存在于库内");
                }
            }
        }

        flagged
    }
}
