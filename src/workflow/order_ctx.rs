//! 订单处理上下文
//!
//! 封装"我正在处理第几张订单、产物写到哪里"这一信息

use std::fmt::Display;
use std::path::PathBuf;

/// 订单处理上下文
///
/// 包含处理单张订单所需的所有上下文信息
#[derive(Debug, Clone)]
pub struct OrderCtx {
    /// 订单在本批次中的序号（从 1 开始，仅用于日志显示）
    pub order_index: usize,

    /// 产物输出目录
    pub output_dir: PathBuf,
}

impl OrderCtx {
    /// 创建新的订单上下文
    pub fn new(order_index: usize, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            order_index,
            output_dir: output_dir.into(),
        }
    }

    /// 收据 PDF 的目标路径：{订单编号}.pdf
    pub fn receipt_path(&self, order_number: &str) -> PathBuf {
        self.output_dir.join(format!("{}.pdf", order_number))
    }

    /// 机器人截图的目标路径：{订单编号}.png
    pub fn screenshot_path(&self, order_number: &str) -> PathBuf {
        self.output_dir.join(format!("{}.png", order_number))
    }
}

impl Display for OrderCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[第 {} 单 → {}]",
            self.order_index,
            self.output_dir.display()
        )
    }
}
