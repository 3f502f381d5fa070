//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量订单处理器
//! - 管理应用生命周期（初始化、运行、归档）
//! - 下载并解析订单表（Vec<OrderRow>）
//! - 顺序驱动每张订单（共享同一个页面）
//! - 管理浏览器资源（Browser、CdpDriver）
//! - 输出全局统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<OrderRow>)
//!     ↓
//! workflow::OrderFlow (处理单张 OrderRow)
//!     ↓
//! services (能力层：receipt_compositor / archiver)
//!     ↓
//! infrastructure (基础设施：PageDriver / CdpDriver)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_processor 管批量，OrderFlow 管单张
//! 2. **资源隔离**：只有编排层持有 Browser 和 CdpDriver
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod batch_processor;

// 重新导出主要类型
pub use batch_processor::{run_batch, App};
