// ==========================================
// 设备维保管理系统 - 派生产物服务实现
// ==========================================
// 依据: 点检模板导入字段口径_v1.0.md - 模板编号规则
// 依据: 批量导入接口约定_v1.0.md - 错误报告命名规则
// 职责: 模板编号 / 错误报告文件名 / 二维码 PNG 派生
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_runner_trait::DerivationService as DerivationServiceTrait;
use chrono::NaiveDateTime;
use image::{GrayImage, Luma};
use qrcode::{Color, QrCode};
use std::path::Path;

// 模板编号前缀 + 2 位序号容量
const TEMPLATE_CODE_PREFIX: &str = "DJMB";
const TEMPLATE_CODE_SEQ_CAP: usize = 99;

// 二维码静区（单侧模块数）
const QUIET_ZONE_MODULES: u32 = 4;

// 报告文件名主干长度上限（字符）
const REPORT_STEM_MAX_CHARS: usize = 50;

pub struct DerivationService;

impl DerivationServiceTrait for DerivationService {
    /// 派生模板编号
    ///
    /// # 规则
    /// - DJMB + 秒级时间戳(%Y%m%d%H%M%S) + 2 位序号（01 起）
    /// - 同批次顺位超出 99 时返回错误（该模板落库被跳过,不影响其余模板）
    fn derive_template_code(&self, now: NaiveDateTime, seq: usize) -> ImportResult<String> {
        let serial = seq + 1;
        if serial > TEMPLATE_CODE_SEQ_CAP {
            return Err(ImportError::TemplateCodeGenerationError(format!(
                "单批次模板数量超出编码容量: {}",
                serial
            )));
        }
        Ok(format!(
            "{}{}{:02}",
            TEMPLATE_CODE_PREFIX,
            now.format("%Y%m%d%H%M%S"),
            serial
        ))
    }

    /// 派生错误报告文件名
    ///
    /// # 规则
    /// - 主干 = 原文件名去扩展名后消毒（字母数字/中文/连字符/下划线以外替换为 '_'）
    /// - 主干截断至 50 字符;消毒后为空时回退为 "导入"
    /// - 形如 {主干}_错误报告_{时间戳}.xlsx
    fn derive_report_filename(&self, source_file_name: &str, now: NaiveDateTime) -> String {
        let stem = Path::new(source_file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        let sanitized: String = stem
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || is_cjk(c) {
                    c
                } else {
                    '_'
                }
            })
            .take(REPORT_STEM_MAX_CHARS)
            .collect();

        let stem = if sanitized.is_empty() {
            "导入".to_string()
        } else {
            sanitized
        };

        format!("{}_错误报告_{}.xlsx", stem, now.format("%Y%m%d%H%M%S"))
    }

    /// 渲染二维码 PNG 字节
    ///
    /// # 规则
    /// - 四周各留 4 模块静区
    /// - 模块整数倍缩放至不超过 size_px 的最大边长（最小 1 倍）
    fn render_qr_png(&self, content: &str, size_px: u32) -> ImportResult<Vec<u8>> {
        let code = QrCode::new(content.as_bytes())
            .map_err(|e| ImportError::QrGenerationError(format!("二维码编码失败: {}", e)))?;

        let module_count = code.width() as u32;
        let total_modules = module_count + QUIET_ZONE_MODULES * 2;
        let scale = (size_px / total_modules).max(1);
        let canvas = total_modules * scale;

        let mut img = GrayImage::from_pixel(canvas, canvas, Luma([255u8]));
        for (idx, color) in code.to_colors().iter().enumerate() {
            if *color == Color::Dark {
                let module_x = idx as u32 % module_count;
                let module_y = idx as u32 / module_count;
                let origin_x = (module_x + QUIET_ZONE_MODULES) * scale;
                let origin_y = (module_y + QUIET_ZONE_MODULES) * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        img.put_pixel(origin_x + dx, origin_y + dy, Luma([0u8]));
                    }
                }
            }
        }

        let mut bytes: Vec<u8> = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut bytes);
        image::DynamicImage::ImageLuma8(img)
            .write_to(&mut cursor, image::ImageFormat::Png)
            .map_err(|e| ImportError::QrGenerationError(format!("二维码 PNG 编码失败: {}", e)))?;

        Ok(bytes)
    }
}

/// 中日韩统一表意文字基本区
fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn test_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_derive_template_code_format() {
        let service = DerivationService;
        let code = service.derive_template_code(test_now(), 0).unwrap();
        assert_eq!(code, "DJMB2024011510300001");

        let code = service.derive_template_code(test_now(), 8).unwrap();
        assert_eq!(code, "DJMB2024011510300009");
    }

    #[test]
    fn test_derive_template_code_seq_cap() {
        let service = DerivationService;
        let code = service.derive_template_code(test_now(), 98).unwrap();
        assert!(code.ends_with("99"), "序号 99 应在容量内");

        let result = service.derive_template_code(test_now(), 99);
        assert!(result.is_err(), "序号超出 2 位容量应返回错误");
    }

    #[test]
    fn test_derive_report_filename_sanitized() {
        let service = DerivationService;
        let name = service.derive_report_filename("设备台账 (7月).xlsx", test_now());
        assert_eq!(name, "设备台账__7月__错误报告_20240115103000.xlsx");
        assert!(!name.contains('('), "括号等特殊字符应被替换");
    }

    #[test]
    fn test_derive_report_filename_path_separators_stripped() {
        let service = DerivationService;
        let name = service.derive_report_filename("../../etc/passwd.xlsx", test_now());
        assert!(!name.contains('/'), "路径分隔符不应出现在报告文件名中");
        assert!(!name.contains(".."), "上级目录片段不应出现在报告文件名中");
    }

    #[test]
    fn test_derive_report_filename_empty_stem_fallback() {
        let service = DerivationService;
        let name = service.derive_report_filename("###.xlsx", test_now());
        // 主干全部为替换字符时仍可用（下划线),仅当完全为空时回退
        assert!(name.ends_with("_错误报告_20240115103000.xlsx"));

        let name = service.derive_report_filename("", test_now());
        assert_eq!(name, "导入_错误报告_20240115103000.xlsx");
    }

    #[test]
    fn test_render_qr_png_basic() {
        let service = DerivationService;
        let bytes = service.render_qr_png("DJMB2024011510300001", 240).unwrap();

        // PNG 魔数
        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);

        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!(img.width(), img.height(), "二维码图片应为正方形");
        assert!(img.width() <= 240, "整数倍缩放不应超出目标边长");
        assert!(img.width() >= 33, "至少应容纳最小版本 + 静区");
    }

    #[test]
    fn test_render_qr_png_small_target_still_renders() {
        let service = DerivationService;
        // 目标边长小于模块总数时按 1 倍渲染
        let bytes = service.render_qr_png("DJMB2024011510300001", 10).unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        assert!(img.width() >= 29, "1 倍渲染时边长等于模块总数");
    }
}
