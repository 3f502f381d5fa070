//! 收据排版服务 - 业务能力层
//!
//! 只负责两项能力，不关心流程：
//! - 把收据 HTML 片段渲染成文本 PDF
//! - 把机器人截图作为新页并入既有 PDF

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use regex::Regex;
use tracing::debug;

use crate::error::CompositorError;

/// A4 纵向页面尺寸（PDF 单位）
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
/// 页边距
const MARGIN: i64 = 50;
/// 收据正文字号与行距
const FONT_SIZE: i64 = 11;
const LEADING: i64 = 14;
/// 每页可容纳的文本行数
const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize;

/// 收据排版服务
///
/// 职责：
/// - 收据 HTML → 文本 PDF（超长内容自动分页）
/// - 截图 → PDF 追加页（整页缩放、保持宽高比）
/// - 只处理单张订单的产物
/// - 不出现 Vec<OrderRow>，不关心流程顺序
pub struct ReceiptCompositor;

impl ReceiptCompositor {
    /// 创建新的收据排版服务
    pub fn new() -> Self {
        Self
    }

    /// 把收据 HTML 片段渲染为 PDF 文件
    pub fn render_to_pdf(&self, html: &str, dest: &Path) -> Result<(), CompositorError> {
        let mut lines = html_to_lines(html)?;
        if lines.is_empty() {
            // 空收据也要产出合法的单页 PDF
            lines.push(String::new());
        }
        debug!("收据共 {} 行文本，渲染至 {}", lines.len(), dest.display());

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for chunk in lines.chunks(LINES_PER_PAGE) {
            let content = text_page_content(chunk);
            let encoded = content
                .encode()
                .map_err(|e| CompositorError::Render(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let page_count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        doc.compress();
        doc.save(dest)
            .map_err(|e| CompositorError::Render(e.to_string()))?;
        Ok(())
    }

    /// 把截图逐张作为新页追加到既有 PDF 末尾
    pub fn append_images(&self, images: &[PathBuf], target: &Path) -> Result<(), CompositorError> {
        if !target.exists() {
            return Err(CompositorError::TargetMissing {
                path: target.to_path_buf(),
            });
        }

        let mut doc =
            Document::load(target).map_err(|e| CompositorError::Merge(e.to_string()))?;

        for image_path in images {
            append_image_page(&mut doc, image_path)?;
            debug!("✓ 截图已并入: {}", image_path.display());
        }

        doc.compress();
        doc.save(target)
            .map_err(|e| CompositorError::Merge(e.to_string()))?;
        Ok(())
    }
}

impl Default for ReceiptCompositor {
    fn default() -> Self {
        Self::new()
    }
}

/// 把单张图片缩放后作为整页追加
fn append_image_page(doc: &mut Document, image_path: &Path) -> Result<(), CompositorError> {
    let decoded = image::open(image_path).map_err(|source| CompositorError::ImageUnreadable {
        path: image_path.to_path_buf(),
        source,
    })?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();

    // 缩放到内容区内并居中，保持宽高比
    let content_width = (PAGE_WIDTH - 2 * MARGIN) as f32;
    let content_height = (PAGE_HEIGHT - 2 * MARGIN) as f32;
    let scale = (content_width / width as f32).min(content_height / height as f32);
    let draw_width = width as f32 * scale;
    let draw_height = height as f32 * scale;
    let offset_x = MARGIN as f32 + (content_width - draw_width) / 2.0;
    let offset_y = MARGIN as f32 + (content_height - draw_height) / 2.0;

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        rgb.into_raw(),
    ));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(draw_width),
                    Object::Real(0.0),
                    Object::Real(0.0),
                    Object::Real(draw_height),
                    Object::Real(offset_x),
                    Object::Real(offset_y),
                ],
            ),
            Operation::new("Do", vec!["Im1".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content
        .encode()
        .map_err(|e| CompositorError::Merge(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! { "Im1" => image_id },
    });

    let pages_id = doc
        .catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| CompositorError::Merge(e.to_string()))?;

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(PAGE_WIDTH),
            Object::Integer(PAGE_HEIGHT),
        ],
    });

    // 挂到页面树上并更新计数
    let pages = doc
        .get_object_mut(pages_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| CompositorError::Merge(e.to_string()))?;
    pages
        .get_mut(b"Kids")
        .and_then(Object::as_array_mut)
        .map_err(|e| CompositorError::Merge(e.to_string()))?
        .push(page_id.into());
    let count = pages
        .get(b"Count")
        .and_then(Object::as_i64)
        .map_err(|e| CompositorError::Merge(e.to_string()))?;
    pages.set("Count", count + 1);

    Ok(())
}

/// 生成一页文本的内容流
fn text_page_content(lines: &[String]) -> Content {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
        Operation::new("TL", vec![LEADING.into()]),
        Operation::new(
            "Td",
            vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN).into()],
        ),
    ];
    for line in lines {
        operations.push(Operation::new("T*", vec![]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(sanitize_pdf_text(line))],
        ));
    }
    operations.push(Operation::new("ET", vec![]));
    Content { operations }
}

/// 把 HTML 片段拆成纯文本行
///
/// 块级标签的结束视为换行，其余标签直接剥离，常见实体做解码
fn html_to_lines(html: &str) -> Result<Vec<String>, CompositorError> {
    let block_tags = Regex::new(r"(?i)<(?:br|/p|/div|/h[1-6]|/li|/tr)\s*/?>")
        .map_err(|e| CompositorError::Render(e.to_string()))?;
    let any_tag =
        Regex::new(r"<[^>]+>").map_err(|e| CompositorError::Render(e.to_string()))?;

    let with_breaks = block_tags.replace_all(html, "\n");
    let text_only = any_tag.replace_all(&with_breaks, "");

    Ok(text_only
        .lines()
        .map(|line| decode_entities(line.trim()))
        .filter(|line| !line.is_empty())
        .collect())
}

/// 解码收据里常见的 HTML 实体
///
/// &amp; 必须放最后，否则会把 &amp;lt; 这类序列解码两次
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// PDF 文本流按单字节编码写入，非 ASCII 字符以 ? 代替
fn sanitize_pdf_text(line: &str) -> String {
    line.chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() {
                c
            } else {
                '?'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_lines_strips_tags() {
        let html = "<div><h3>Receipt</h3><p>AAA&nbsp;BBB<br>CCC</p></div>";
        let lines = html_to_lines(html).expect("解析 HTML 失败");
        assert_eq!(lines, vec!["Receipt", "AAA BBB", "CCC"]);
    }

    #[test]
    fn test_decode_entities_amp_last() {
        assert_eq!(decode_entities("Fish &amp; Chips"), "Fish & Chips");
        // &amp;lt; 只解码一层
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_sanitize_replaces_non_ascii() {
        assert_eq!(sanitize_pdf_text("abc 123"), "abc 123");
        assert_eq!(sanitize_pdf_text("价格 100"), "?? 100");
    }

    #[test]
    fn test_render_creates_loadable_pdf() {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let pdf_path = dir.path().join("1.pdf");

        let compositor = ReceiptCompositor::new();
        compositor
            .render_to_pdf("<div><p>Order 1</p><p>Total: 2 units</p></div>", &pdf_path)
            .expect("渲染 PDF 失败");

        let doc = Document::load(&pdf_path).expect("生成的 PDF 应可被重新加载");
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_render_paginates_long_receipt() {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let pdf_path = dir.path().join("long.pdf");

        let html = (1..=120)
            .map(|i| format!("line {}", i))
            .collect::<Vec<_>>()
            .join("<br>");

        let compositor = ReceiptCompositor::new();
        compositor
            .render_to_pdf(&html, &pdf_path)
            .expect("渲染 PDF 失败");

        let doc = Document::load(&pdf_path).expect("生成的 PDF 应可被重新加载");
        // 120 行按每页 53 行拆成 3 页
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_append_image_adds_page() {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let pdf_path = dir.path().join("2.pdf");
        let png_path = dir.path().join("2.png");

        let compositor = ReceiptCompositor::new();
        compositor
            .render_to_pdf("<p>Order 2</p>", &pdf_path)
            .expect("渲染 PDF 失败");

        let preview = image::RgbImage::from_pixel(6, 4, image::Rgb([90, 120, 200]));
        preview.save(&png_path).expect("写入测试截图失败");

        compositor
            .append_images(&[png_path], &pdf_path)
            .expect("合并截图失败");

        let doc = Document::load(&pdf_path).expect("合并后的 PDF 应可被重新加载");
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_append_missing_target() {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let pdf_path = dir.path().join("nonexistent.pdf");
        let png_path = dir.path().join("x.png");

        let compositor = ReceiptCompositor::new();
        let result = compositor.append_images(&[png_path], &pdf_path);
        assert!(matches!(result, Err(CompositorError::TargetMissing { .. })));
    }

    #[test]
    fn test_append_unreadable_image() {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let pdf_path = dir.path().join("3.pdf");
        let png_path = dir.path().join("broken.png");

        let compositor = ReceiptCompositor::new();
        compositor
            .render_to_pdf("<p>Order 3</p>", &pdf_path)
            .expect("渲染 PDF 失败");
        std::fs::write(&png_path, b"not a png").expect("写入测试文件失败");

        let result = compositor.append_images(&[png_path], &pdf_path);
        assert!(matches!(
            result,
            Err(CompositorError::ImageUnreadable { .. })
        ));
    }
}
