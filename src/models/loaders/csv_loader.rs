//! 订单表加载器
//!
//! 从商店下载 orders.csv 并解析为订单列表。
//! 表头先整体校验（缺失列一次性报告），数据行逐条反序列化并校验，
//! 第一条非法记录即让整次加载失败，不做静默丢弃

use std::path::Path;

use tokio::fs;
use tracing::{debug, info};

use crate::error::SourceError;
use crate::models::order::OrderRow;

/// 订单表必需的列名
const REQUIRED_COLUMNS: [&str; 5] = ["Order number", "Head", "Body", "Legs", "Address"];

/// 下载订单表到本地文件（覆盖已存在的文件）
pub async fn download_orders_csv(url: &str, dest: &Path) -> Result<(), SourceError> {
    info!("⬇️ 正在下载订单表: {}", url);

    let response = reqwest::get(url)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|source| SourceError::Unavailable {
            url: url.to_string(),
            source,
        })?;

    let body = response
        .bytes()
        .await
        .map_err(|source| SourceError::Unavailable {
            url: url.to_string(),
            source,
        })?;

    fs::write(dest, &body)
        .await
        .map_err(|source| SourceError::Persist {
            path: dest.to_path_buf(),
            source,
        })?;

    info!("✓ 订单表已保存至: {}", dest.display());
    Ok(())
}

/// 从本地文件加载订单列表
pub async fn load_orders(path: &Path) -> Result<Vec<OrderRow>, SourceError> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    parse_orders(&content)
}

/// 解析 CSV 文本为订单列表
pub fn parse_orders(content: &str) -> Result<Vec<OrderRow>, SourceError> {
    let mut reader = csv::Reader::from_reader(content.as_bytes());

    // 表头校验：把所有缺失列一次性报告出来
    let headers = reader.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SourceError::HeaderMismatch { missing });
    }

    let mut orders = Vec::new();
    for (index, record) in reader.deserialize::<OrderRow>().enumerate() {
        let row = index + 1; // 数据行从 1 开始计
        let order = record.map_err(|e| SourceError::MalformedRow {
            row,
            reason: e.to_string(),
        })?;
        order
            .validate()
            .map_err(|reason| SourceError::MalformedRow { row, reason })?;
        orders.push(order);
    }

    debug!("解析出 {} 张订单", orders.len());
    Ok(orders)
}
