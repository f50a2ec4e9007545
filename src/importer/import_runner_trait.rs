// ==========================================
// 设备维保管理系统 - 批量导入 Trait
// ==========================================
// 依据: 批量导入接口约定_v1.0.md - 管道分阶段接口
// 职责: 定义导入管道各组件接口（不包含实现）
// ==========================================

use crate::domain::import_job::JobOutcome;
use crate::domain::types::ImportKind;
use crate::importer::error::ImportResult;
use crate::importer::sheet_reader::{CellValue, SheetWorkbook};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::error::Error;
use std::path::Path;

// ==========================================
// ImportRunner Trait
// ==========================================
// 用途: 导入任务执行主接口
// 实现者: ImportRunnerImpl
#[async_trait]
pub trait ImportRunner: Send + Sync {
    /// 执行单个导入任务
    ///
    /// # 参数
    /// - job_id: 任务 ID（任务记录须已入库,状态 PENDING）
    ///
    /// # 返回
    /// - Ok(JobOutcome): 执行汇总（COMPLETED 与 FAILED 均为 Ok,终态见 status 字段）
    /// - Err: 任务记录不存在、任务状态异常等调用方错误
    ///
    /// # 任务流程（8 个阶段）
    /// 1. 读取工作簿（仅此阶段产生 SourceUnreadable / EmptyDocument）
    /// 2. 解析与校验（穷尽收集,单条失败不短路）
    /// 3. 引用解析（按编码类别批量查询）
    /// 4. 唯一性检测（文件内 + 库内）
    /// 5. 选择性落库（仅零错误记录,子集为空则跳过）
    /// 6. 错误报告生成（存在任何错误时）
    /// 7. 任务终态回写（计数 + 报告地址 + 进度 100）
    /// 8. 源文件清理（无论终态如何均执行）
    async fn run_job(&self, job_id: &str) -> Result<JobOutcome, Box<dyn Error>>;

    /// 并发执行多个导入任务
    ///
    /// # 参数
    /// - job_ids: 任务 ID 列表
    ///
    /// # 返回
    /// - Ok(Vec<Result<JobOutcome, String>>): 每个任务的执行结果
    ///
    /// # 说明
    /// - 使用 tokio 并发执行,任务之间相互独立
    /// - 单个任务失败不影响其他任务
    async fn run_many(
        &self,
        job_ids: Vec<String>,
    ) -> Result<Vec<Result<JobOutcome, String>>, Box<dyn Error>>;
}

// ==========================================
// SheetReader Trait
// ==========================================
// 用途: 工作簿读取接口（阶段 1）
// 实现者: CalamineSheetReader
pub trait SheetReader: Send + Sync {
    /// 将上传文件读取为带绝对坐标的单元格网格
    ///
    /// # 参数
    /// - file_path: 上传文件路径（.xlsx / .xls）
    ///
    /// # 返回
    /// - Ok(SheetWorkbook): 全部工作表 + 内嵌图片
    /// - Err(SourceUnreadable): 文件不存在、格式不支持或内容损坏
    /// - Err(EmptyDocument): 所有工作表均无有效数据
    fn read_workbook(&self, file_path: &Path) -> ImportResult<SheetWorkbook>;
}

// ==========================================
// ImportRecordOps Trait
// ==========================================
// 用途: 候选记录通用操作,供编排器与唯一性检测做泛型处理
// 实现者: EquipmentRecord, TemplateRecord
pub trait ImportRecordOps: Send + Sync {
    /// 业务主键（统一大写;缺失或空白返回 None）
    fn natural_key(&self) -> Option<String>;

    /// 位置标签（日志用,如 "第3行" / "工作表[电机模板]"）
    fn position_label(&self) -> String;

    /// 是否存在任何错误（含嵌套条目错误）
    fn has_errors(&self) -> bool;

    /// 是否可落库（错误面完全为空）
    fn is_insertable(&self) -> bool;

    /// 标记文件内重复（追加错误,不覆盖既有错误）
    fn mark_in_file_duplicate(&mut self);

    /// 标记库内已存在（追加错误,不覆盖既有错误）
    fn mark_store_duplicate(&mut self);
}

// ==========================================
// ImportProfile Trait
// ==========================================
// 用途: 单一导入类型的差异点（解析布局/引用类别/落库目标/报告回写）,
//       管道骨架由编排器统一持有
// 实现者: EquipmentProfile, ChecklistProfile
#[async_trait]
pub trait ImportProfile: Send + Sync {
    /// 该类型的候选记录
    type Record: ImportRecordOps + Send + Sync;

    /// 导入类型标识
    fn kind(&self) -> ImportKind;

    /// 解析工作簿为候选记录集（阶段 2）
    ///
    /// # 返回
    /// - 全部候选记录（含校验失败的记录）;空白单元直接跳过,不产生记录
    ///
    /// # 说明
    /// - 不短路: 单条记录的每处违规都写入其错误集
    /// - 本方法不访问数据库,不产生中止错误
    fn parse(&self, workbook: &SheetWorkbook) -> Vec<Self::Record>;

    /// 引用解析（阶段 3,单次批量查询）
    ///
    /// # 说明
    /// - 收集全部非空引用编码,大小写不敏感批量查询后逐条回填 id
    /// - 未命中时在引用槽位追加"不存在"错误;该槽位已有错误则不追加
    async fn resolve_references(&self, records: &mut [Self::Record]) -> ImportResult<()>;

    /// 库内主键存在性批量查询（阶段 4 供唯一性检测使用）
    ///
    /// # 参数
    /// - keys: 去重后的候选主键（已统一大写）
    ///
    /// # 返回
    /// - 库中已存在的主键子集（统一大写）
    async fn find_existing_keys(&self, keys: &[String]) -> ImportResult<Vec<String>>;

    /// 选择性落库（阶段 5,单次批量插入）
    ///
    /// # 说明
    /// - 仅处理 is_insertable 的记录;子集为空时不执行任何落库操作并返回 0
    /// - 使用跳过重复键模式(INSERT OR IGNORE)抵御并发任务竞态
    /// - 派生产物（编号/二维码/照片归档）失败仅记日志,不中止其余记录
    ///
    /// # 返回
    /// - 实际落库的记录数
    async fn commit(&self, records: &[Self::Record]) -> ImportResult<usize>;

    /// 错误报告回写（阶段 6）
    ///
    /// # 说明
    /// - 在原始工作簿的内存副本上按保留列回写错误注释,原列数据原样保留
    /// - 仅在存在任何错误时由编排器调用;落盘与命名由编排器负责
    fn annotate_report(
        &self,
        workbook: &SheetWorkbook,
        records: &[Self::Record],
    ) -> ImportResult<rust_xlsxwriter::Workbook>;
}

// ==========================================
// DataCleaner Trait
// ==========================================
// 用途: 单元格清洗与类型转换（阶段 2 内使用）
// 实现者: DataCleaner
pub trait DataCleaner: Send + Sync {
    /// 文本清洗
    ///
    /// # 参数
    /// - value: 原始文本
    /// - uppercase: 是否转大写（编码类字段为 true）
    fn clean_text(&self, value: &str, uppercase: bool) -> String;

    /// NULL 值标准化
    ///
    /// # 说明
    /// - 空字符串与 "NULL"/"N/A"/"-" 等占位值统一归为 None
    fn normalize_null(&self, value: Option<String>) -> Option<String>;

    /// 单元格转文本（显示值 + TRIM;空白返回 None）
    fn cell_to_text(&self, cell: &CellValue) -> Option<String>;

    /// 日期单元格解析
    ///
    /// # 返回
    /// - Ok(None): 空白单元格（不是错误）
    /// - Ok(Some): 原生日期单元格,或文本按 %Y-%m-%d / %Y/%m/%d / %Y%m%d 解析成功
    /// - Err(消息): 非空但无法解析,消息供写入错误集
    fn parse_date_cell(&self, cell: &CellValue) -> Result<Option<NaiveDate>, String>;

    /// 金额单元格解析
    ///
    /// # 说明
    /// - 解析失败回退 0.0,不计为错误
    fn parse_amount_cell(&self, cell: &CellValue) -> f64;

    /// 序号单元格解析
    ///
    /// # 参数
    /// - fallback: 解析失败时的回退值（通常为条目顺位）
    fn parse_seq_cell(&self, cell: &CellValue, fallback: i32) -> i32;
}

// ==========================================
// DerivationService Trait
// ==========================================
// 用途: 落库与报告阶段的派生产物（模板编号/报告文件名/二维码图片）
// 实现者: DerivationService
pub trait DerivationService: Send + Sync {
    /// 派生模板编号
    ///
    /// # 参数
    /// - now: 派生时刻（编号含秒级时间戳）
    /// - seq: 同批次内顺位（0 起,编号尾部为 2 位序号）
    ///
    /// # 返回
    /// - Ok(String): 形如 DJMB2024011510300001
    /// - Err(TemplateCodeGenerationError): 同批次数量超出 2 位序号容量
    fn derive_template_code(&self, now: NaiveDateTime, seq: usize) -> ImportResult<String>;

    /// 派生错误报告文件名
    ///
    /// # 说明
    /// - 原文件名消毒（仅保留字母数字/中文/连字符/下划线）+ 时间戳,避免路径注入与重名
    fn derive_report_filename(&self, source_file_name: &str, now: NaiveDateTime) -> String;

    /// 渲染二维码 PNG 字节
    ///
    /// # 参数
    /// - content: 二维码内容（模板编号）
    /// - size_px: 目标边长（像素,含静区;模块整数倍缩放,实际边长不超过该值,最小 1 倍）
    fn render_qr_png(&self, content: &str, size_px: u32) -> ImportResult<Vec<u8>>;
}

// ==========================================
// ConflictHandler Trait
// ==========================================
// 用途: 唯一性检测（阶段 4）,对两类记录做同一套泛型处理
// 实现者: ConflictHandler
pub trait ConflictHandler: Send + Sync {
    /// 文件内重复检测
    ///
    /// # 说明
    /// - 按文件顺序遍历,首次出现不标记,第 2 次及以后标记
    /// - 主键缺失的记录不参与检测
    ///
    /// # 返回
    /// - 被标记的记录数
    fn flag_in_file_duplicates<R: ImportRecordOps>(&self, records: &mut [R]) -> usize;

    /// 库内重复检测
    ///
    /// # 参数
    /// - existing_keys: 库中已存在的主键（统一大写）
    ///
    /// # 说明
    /// - 主键已存在的记录全部标记,不区分文件内顺序
    ///
    /// # 返回
    /// - 被标记的记录数
    fn flag_store_duplicates<R: ImportRecordOps>(
        &self,
        records: &mut [R],
        existing_keys: &[String],
    ) -> usize;
}
