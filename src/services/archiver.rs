//! 归档服务 - 业务能力层
//!
//! 只负责"把输出目录里的收据 PDF 打包成单个压缩包"能力

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ArchiveError;

/// 递归收集输出目录下的所有收据 PDF，打包为单个 zip
///
/// 条目一律取文件名，目录结构拍平；单个文件读取失败只跳过并告警，
/// 压缩包本身创建或写入失败才算归档失败。
/// 输出目录为空（或不存在）时产出空压缩包，返回写入的条目数
pub fn build_archive(output_dir: &Path, archive_path: &Path) -> Result<usize, ArchiveError> {
    let file = File::create(archive_path).map_err(|source| ArchiveError::Create {
        path: archive_path.to_path_buf(),
        source,
    })?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = 0;
    for entry in WalkDir::new(output_dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !is_receipt_pdf(path) {
            continue;
        }

        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => {
                warn!("⚠️ 跳过无法识别文件名的路径: {}", path.display());
                continue;
            }
        };

        let mut content = Vec::new();
        let read = File::open(path).and_then(|mut f| f.read_to_end(&mut content));
        if let Err(e) = read {
            warn!("⚠️ 跳过无法读取的收据 {}: {}", path.display(), e);
            continue;
        }

        writer.start_file(name.as_str(), options)?;
        writer
            .write_all(&content)
            .map_err(|source| ArchiveError::Entry { name, source })?;
        entries += 1;
        debug!("✓ 已打包: {}", path.display());
    }

    writer.finish()?;
    Ok(entries)
}

/// 是否为收据 PDF 文件
fn is_receipt_pdf(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("pdf"))
}
