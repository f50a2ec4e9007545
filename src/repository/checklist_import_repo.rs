// ==========================================
// 设备维保管理系统 - 点检模板导入 Repository Trait
// ==========================================
// 职责: 定义点检模板导入所需的数据访问接口（不包含实现）
// 红线: 模板与条目同事务落库,禁止半成品模板
// ==========================================

use crate::domain::checklist::ChecklistTemplate;
use async_trait::async_trait;
use std::collections::HashMap;
use std::error::Error;

// ==========================================
// ChecklistImportRepository Trait
// ==========================================
// 用途: 点检模板导入相关数据访问
// 实现者: ChecklistImportRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait ChecklistImportRepository: Send + Sync {
    /// 按设备编号批量解析设备 ID（引用解析,单次查询）
    ///
    /// # 参数
    /// - codes: 设备编号候选集（去重后传入）
    ///
    /// # 返回
    /// - HashMap<编号大写, 设备ID>: 仅包含命中的编号;比较不区分大小写
    async fn find_equipment_ids_by_codes(
        &self,
        codes: &[String],
    ) -> Result<HashMap<String, i64>, Box<dyn Error>>;

    /// 批量查询已存在的模板名称（存量重复检测,单次查询）
    ///
    /// # 参数
    /// - names: 模板名称候选集（去重后传入）
    ///
    /// # 返回
    /// - Vec<名称大写>: 存量中已存在的名称;比较不区分大小写
    async fn find_existing_template_names(
        &self,
        names: &[String],
    ) -> Result<Vec<String>, Box<dyn Error>>;

    /// 批量插入模板及其条目（事务化,重复键跳过）
    ///
    /// # 参数
    /// - templates: 模板实体列表（均已通过校验,template_code 已派生）
    ///
    /// # 返回
    /// - Ok(Vec<(i64, String)>): 实际落库模板的 (id, template_code),按输入顺序;
    ///   被唯一约束跳过的模板不插入条目、不出现在返回值中
    async fn batch_insert_templates(
        &self,
        templates: &[ChecklistTemplate],
    ) -> Result<Vec<(i64, String)>, Box<dyn Error>>;

    /// 回写二维码存储路径（二维码在模板落库后生成）
    async fn update_qr_image_path(
        &self,
        template_id: i64,
        qr_image_path: &str,
    ) -> Result<(), Box<dyn Error>>;

    /// 按模板名称查询（不区分大小写,含条目）
    async fn find_by_name(&self, name: &str) -> Result<Option<ChecklistTemplate>, Box<dyn Error>>;

    /// 模板总数
    async fn count_templates(&self) -> Result<i64, Box<dyn Error>>;
}
