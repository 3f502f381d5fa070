//! 应用程序错误类型
//!
//! 按协作方划分错误域：
//! - `SourceError` - 订单表获取 / 解析错误，整批致命
//! - `DriverError` - 浏览器传输层异常，在单张订单的重试预算内可重试
//! - `CompositorError` - 收据 PDF 生成 / 合并错误，只影响当前订单
//! - `ArchiveError` - 收尾归档错误，归档阶段致命
//!
//! 商店页面上的 `.alert-danger` 错误提示不是错误类型：
//! 它是提交流程观察到的页面状态，由流程层自行分类

use std::path::PathBuf;

use thiserror::Error;

/// 订单表获取 / 解析错误
///
/// 任何一种都意味着整批订单无法开始处理
#[derive(Error, Debug)]
pub enum SourceError {
    /// 订单表下载失败（网络错误或非 2xx 状态码）
    #[error("下载订单表失败 {url}: {source}")]
    Unavailable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// 订单表写入本地文件失败
    #[error("保存订单表失败 {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 订单表读取失败
    #[error("读取订单表失败 {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 表头缺少必需列（一次性报告所有缺失列）
    #[error("订单表缺少必需列: {missing:?}")]
    HeaderMismatch { missing: Vec<String> },

    /// 数据行无效（行号从 1 开始计数据行）
    #[error("订单表第 {row} 行无效: {reason}")]
    MalformedRow { row: usize, reason: String },

    /// CSV 解析失败
    #[error("订单表解析失败: {0}")]
    Csv(#[from] csv::Error),
}

/// 浏览器传输层异常
///
/// 提交流程把它与商店拒绝同等对待，共享同一重试预算
#[derive(Error, Debug)]
pub enum DriverError {
    /// 必需的页面元素不存在
    #[error("页面元素不存在: {selector}")]
    ElementMissing { selector: String },

    /// CDP 调用失败（连接断开、导航失败、协议错误等）
    #[error("CDP 调用失败: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    /// JS 返回值无法反序列化
    #[error("JS 返回值解析失败: {0}")]
    Value(#[from] serde_json::Error),
}

/// 收据排版错误
///
/// 发生在提交成功之后，只把当前订单降级为失败，不中断批次
#[derive(Error, Debug)]
pub enum CompositorError {
    /// 收据 HTML 渲染为 PDF 失败
    #[error("渲染收据 PDF 失败: {0}")]
    Render(String),

    /// 待合并的目标 PDF 不存在
    #[error("目标 PDF 不存在: {}", .path.display())]
    TargetMissing { path: PathBuf },

    /// 截图文件无法解码
    #[error("无法读取截图 {}: {source}", .path.display())]
    ImageUnreadable {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// 截图并入 PDF 失败
    #[error("合并截图到 PDF 失败: {0}")]
    Merge(String),
}

/// 归档错误
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// 压缩包文件创建失败
    #[error("创建压缩包失败 {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 压缩包结构写入失败
    #[error("写入压缩包失败: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// 单个条目写入失败
    #[error("写入压缩包条目失败 {name}: {source}")]
    Entry {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// 页面驱动操作的统一返回类型
pub type DriverResult<T> = std::result::Result<T, DriverError>;
