// ==========================================
// 设备维保管理系统 - 设备导入 Repository Trait
// ==========================================
// 职责: 定义设备台账导入所需的数据访问接口（不包含实现）
// 红线: Repository 不含校验规则,只做数据 CRUD 与批量查询
// ==========================================

use crate::domain::equipment::Equipment;
use async_trait::async_trait;
use std::collections::HashMap;
use std::error::Error;

// ==========================================
// EquipmentImportRepository Trait
// ==========================================
// 用途: 设备台账导入相关数据访问
// 实现者: EquipmentImportRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait EquipmentImportRepository: Send + Sync {
    /// 按工厂编号批量解析工厂 ID（引用解析,单次查询）
    ///
    /// # 参数
    /// - codes: 工厂编号候选集（去重后传入）
    ///
    /// # 返回
    /// - HashMap<编号大写, 工厂ID>: 仅包含命中的编号;比较不区分大小写
    async fn find_factory_ids_by_codes(
        &self,
        codes: &[String],
    ) -> Result<HashMap<String, i64>, Box<dyn Error>>;

    /// 批量查询已存在的设备编号（存量重复检测,单次查询）
    ///
    /// # 参数
    /// - codes: 设备编号候选集（去重后传入）
    ///
    /// # 返回
    /// - Vec<编号大写>: 存量中已存在的编号;比较不区分大小写
    async fn find_existing_codes(&self, codes: &[String]) -> Result<Vec<String>, Box<dyn Error>>;

    /// 批量插入设备（事务化,重复键跳过）
    ///
    /// # 参数
    /// - equipments: 设备实体列表（均已通过校验）
    ///
    /// # 返回
    /// - Ok(usize): 实际落库的记录数（被唯一约束跳过的不计入）
    async fn batch_insert_equipment(
        &self,
        equipments: &[Equipment],
    ) -> Result<usize, Box<dyn Error>>;

    /// 按设备编号查询（不区分大小写）
    async fn find_by_code(&self, code: &str) -> Result<Option<Equipment>, Box<dyn Error>>;

    /// 设备总数
    async fn count_equipment(&self) -> Result<i64, Box<dyn Error>>;
}
