//! # Robot Order Submit
//!
//! 一个用于批量提交机器人订单的 Rust 应用程序
//!
//! 从商店下载订单表（CSV），逐张在下单页面填表提交，
//! 为每张成功的订单生成"收据 + 机器人截图"合并 PDF，
//! 最后把所有收据打包成单个压缩文件。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageDriver` - 页面操作能力的抽象（导航 / 点击 / 填表 / 截图）
//! - `CdpDriver` - 唯一的 page owner，基于 CDP 实现 PageDriver
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单份产物
//! - `ReceiptCompositor` - 收据 HTML 渲染 PDF、截图并入 PDF 的能力
//! - `archiver` - 收据 PDF 打包压缩的能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一张订单"的完整处理流程
//! - `OrderCtx` - 上下文封装（order_index + 产物目录）
//! - `OrderFlow` - 流程编排（填表 → 提交重试 → 产物 → 下一单）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量订单处理器，管理资源和顺序调度
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod workflow;

// 重新导出常用类型
pub use browser::{connect_to_browser_and_page, launch_headless_browser};
pub use config::Config;
pub use error::{ArchiveError, CompositorError, DriverError, SourceError};
pub use infrastructure::{CdpDriver, PageDriver};
pub use models::OrderRow;
pub use orchestrator::{run_batch, App};
pub use services::{build_archive, ReceiptCompositor};
pub use workflow::{OrderCtx, OrderFlow, OrderStatus, SubmissionResult};
