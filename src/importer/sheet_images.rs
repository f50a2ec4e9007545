// ==========================================
// 设备维保管理系统 - 工作簿内嵌图片提取
// ==========================================
// 原理: .xlsx 为 ZIP 容器,图片位于 xl/media/,
//       锚定信息位于 xl/drawings/drawingN.xml,
//       rId → 媒体路径映射位于 xl/drawings/_rels/drawingN.xml.rels
// 红线: 任何失败均不中止导入,由调用方降级为无照片
// ==========================================

use crate::domain::types::EmbeddedImage;
use crate::importer::error::{ImportError, ImportResult};
use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::warn;
use zip::ZipArchive;

/// 提取工作簿内全部行锚定图片
///
/// # 参数
/// - file_path: .xlsx 文件路径
/// - sheet_names: 工作表名列表（决定工作表序号与 drawing 序号的对应）
///
/// # 返回
/// - Ok(Vec<EmbeddedImage>): 锚定图片列表（可为空）
/// - Err: ZIP 容器打开失败
pub fn extract_embedded_images(
    file_path: &Path,
    sheet_names: &[String],
) -> ImportResult<Vec<EmbeddedImage>> {
    let file = File::open(file_path)
        .map_err(|e| ImportError::InternalError(format!("压缩包打开失败: {}", e)))?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| ImportError::InternalError(format!("压缩包读取失败: {}", e)))?;

    let mut images = Vec::new();
    for sheet_index in 0..sheet_names.len() {
        // sheet1 → drawing1（常规导出布局）
        let drawing_num = sheet_index + 1;
        let drawing_path = format!("xl/drawings/drawing{}.xml", drawing_num);

        let drawing_xml = match read_zip_text(&mut archive, &drawing_path) {
            Some(xml) => xml,
            None => continue, // 无 drawing 即无图片
        };

        let anchors = parse_drawing_anchors(&drawing_xml);
        if anchors.is_empty() {
            continue;
        }

        let rels_path = format!("xl/drawings/_rels/drawing{}.xml.rels", drawing_num);
        let relationships = match read_zip_text(&mut archive, &rels_path) {
            Some(xml) => parse_relationships(&xml),
            None => continue,
        };

        for anchor in anchors {
            let Some(target) = relationships.get(&anchor.rel_id) else {
                continue;
            };
            let media_path = resolve_media_path(target);
            match read_zip_bytes(&mut archive, &media_path) {
                Some(data) => {
                    let ext = media_path
                        .rsplit('.')
                        .next()
                        .unwrap_or("png")
                        .to_lowercase();
                    images.push(EmbeddedImage {
                        sheet_index,
                        anchor_row: anchor.row,
                        anchor_col: anchor.col,
                        data,
                        ext,
                    });
                }
                None => {
                    warn!(media = %media_path, "媒体文件缺失,跳过该图片");
                }
            }
        }
    }

    Ok(images)
}

// ==========================================
// drawing XML 解析
// ==========================================

struct PictureAnchor {
    rel_id: String,
    row: usize,
    col: usize,
}

/// 解析 drawing XML,返回每张图片的 rId 与左上角锚定单元格
///
/// 结构: <xdr:twoCellAnchor> 内先出现 <xdr:from>（锚定）,
///       后出现 <xdr:pic><a:blip r:embed="rIdN"/>
fn parse_drawing_anchors(xml: &str) -> Vec<PictureAnchor> {
    let mut anchors = Vec::new();
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut in_pic = false;
    let mut in_from = false;
    let mut in_from_col = false;
    let mut in_from_row = false;

    let mut current_rel_id: Option<String> = None;
    let mut from_col: usize = 0;
    let mut from_row: usize = 0;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e) | Event::Empty(e)) => match e.name().as_ref() {
                b"xdr:pic" | b"pic" => in_pic = true,
                b"a:blip" | b"blip" if in_pic => {
                    for attr in e.attributes().filter_map(Result::ok) {
                        if attr.key.as_ref() == b"r:embed" || attr.key.as_ref() == b"embed" {
                            if let Ok(value) = attr.decode_and_unescape_value(reader.decoder()) {
                                current_rel_id = Some(value.to_string());
                            }
                        }
                    }
                }
                b"xdr:from" | b"from" => in_from = true,
                b"xdr:col" | b"col" if in_from => in_from_col = true,
                b"xdr:row" | b"row" if in_from => in_from_row = true,
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let Ok(text) = e.unescape() {
                    let text = text.trim();
                    if in_from_col {
                        from_col = text.parse().unwrap_or(0);
                    } else if in_from_row {
                        from_row = text.parse().unwrap_or(0);
                    }
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"xdr:pic" | b"pic" => {
                    if let Some(rel_id) = current_rel_id.take() {
                        anchors.push(PictureAnchor {
                            rel_id,
                            row: from_row,
                            col: from_col,
                        });
                    }
                    in_pic = false;
                }
                b"xdr:from" | b"from" => in_from = false,
                b"xdr:col" | b"col" if in_from => in_from_col = false,
                b"xdr:row" | b"row" if in_from => in_from_row = false,
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    anchors
}

/// 解析 .rels 文件,返回 rId → Target 映射
fn parse_relationships(xml: &str) -> HashMap<String, String> {
    let mut relationships = HashMap::new();
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e) | Event::Empty(e)) => {
                if e.name().as_ref() == b"Relationship" {
                    let mut id = None;
                    let mut target = None;
                    for attr in e.attributes().filter_map(Result::ok) {
                        match attr.key.as_ref() {
                            b"Id" => {
                                if let Ok(value) = attr.decode_and_unescape_value(reader.decoder())
                                {
                                    id = Some(value.to_string());
                                }
                            }
                            b"Target" => {
                                if let Ok(value) = attr.decode_and_unescape_value(reader.decoder())
                                {
                                    target = Some(value.to_string());
                                }
                            }
                            _ => {}
                        }
                    }
                    if let (Some(id), Some(target)) = (id, target) {
                        relationships.insert(id, target);
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    relationships
}

/// 将相对 Target（如 "../media/image1.png"）还原为容器内路径
fn resolve_media_path(target: &str) -> String {
    match target.strip_prefix("../") {
        Some(suffix) => format!("xl/{}", suffix),
        None => format!("xl/drawings/{}", target),
    }
}

fn read_zip_text(archive: &mut ZipArchive<File>, path: &str) -> Option<String> {
    let mut entry = archive.by_name(path).ok()?;
    let mut content = String::new();
    entry.read_to_string(&mut content).ok()?;
    Some(content)
}

fn read_zip_bytes(archive: &mut ZipArchive<File>, path: &str) -> Option<Vec<u8>> {
    let mut entry = archive.by_name(path).ok()?;
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes).ok()?;
    Some(bytes)
}
