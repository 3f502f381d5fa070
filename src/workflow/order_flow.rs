//! 订单提交流程 - 流程层
//!
//! 核心职责：定义"一张订单"的完整处理流程
//!
//! 流程顺序：
//! 1. 关闭遮挡表单的弹窗 → 填表 → 预览 → 提交
//! 2. 检查 .alert-danger：被拒绝和传输异常共享同一重试预算（默认 3 次）
//! 3. 成功后：收据 PDF + 机器人截图 → 合并 → 点击下一单
//! 4. 预算耗尽：重载页面恢复表单，订单记为失败（不中断批次）

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::DriverError;
use crate::infrastructure::PageDriver;
use crate::models::order::OrderRow;
use crate::models::part;
use crate::services::ReceiptCompositor;
use crate::workflow::order_ctx::OrderCtx;

/// 下单页面的元素选择器
pub mod selectors {
    /// 进入页面时遮挡表单的弹窗确认按钮
    pub const MODAL_OK: &str = ".modal-dialog .btn-dark";
    /// 头部下拉框
    pub const HEAD_SELECT: &str = "#head";
    /// 腿部输入框（页面没给稳定 id，按占位符定位）
    pub const LEGS_INPUT: &str = "input[placeholder='Enter the part number for the legs']";
    /// 收货地址输入框
    pub const ADDRESS_INPUT: &str = "#address";
    /// 预览按钮
    pub const PREVIEW_BUTTON: &str = "#preview";
    /// 提交按钮
    pub const ORDER_BUTTON: &str = "#order";
    /// 提交被拒绝时的错误提示
    pub const ERROR_ALERT: &str = ".alert-danger";
    /// 收据容器
    pub const RECEIPT: &str = "#receipt";
    /// 机器人预览图
    pub const ROBOT_PREVIEW: &str = "#robot-preview-image";
    /// "再下一单"按钮
    pub const ORDER_ANOTHER: &str = "#order-another";

    /// 身体部件单选框（按部件编号生成）
    pub fn body_radio(part_code: &str) -> String {
        format!("#id-body-{}", part_code)
    }
}

/// 单次提交尝试的结果
///
/// 每轮重试新建一个，循环内分类消费，不持久化
#[derive(Debug)]
enum AttemptOutcome {
    /// 提交被商店接受
    Success,
    /// 商店拒绝了提交（页面出现 .alert-danger）
    ApplicationError,
    /// 浏览器 / 传输层异常
    Transport(DriverError),
}

/// 订单终态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    /// 成功下单，两份产物都已生成
    Completed,
    /// 重试预算耗尽，或产物生成失败
    Failed,
}

/// 单张订单的处理结果
#[derive(Debug, Clone)]
pub struct SubmissionResult {
    /// 订单编号
    pub order_number: String,
    /// 终态
    pub status: OrderStatus,
    /// 实际消耗的提交尝试次数
    pub attempts: usize,
    /// 收据 PDF 路径（仅成功时存在）
    pub receipt_pdf: Option<PathBuf>,
    /// 机器人截图路径（仅成功时存在）
    pub robot_screenshot: Option<PathBuf>,
}

impl SubmissionResult {
    pub(crate) fn completed(
        order_number: &str,
        attempts: usize,
        receipt_pdf: PathBuf,
        robot_screenshot: PathBuf,
    ) -> Self {
        Self {
            order_number: order_number.to_string(),
            status: OrderStatus::Completed,
            attempts,
            receipt_pdf: Some(receipt_pdf),
            robot_screenshot: Some(robot_screenshot),
        }
    }

    pub(crate) fn failed(order_number: &str, attempts: usize) -> Self {
        Self {
            order_number: order_number.to_string(),
            status: OrderStatus::Failed,
            attempts,
            receipt_pdf: None,
            robot_screenshot: None,
        }
    }
}

/// 订单提交流程
///
/// - 编排单张订单从填表到产物落盘的全过程
/// - 不持有任何资源（page），只依赖 PageDriver 能力
/// - 重试只覆盖提交阶段：产物生成失败时远端订单可能已生效，不能重提
pub struct OrderFlow {
    compositor: ReceiptCompositor,
    max_attempts: usize,
}

impl OrderFlow {
    /// 创建新的订单流程
    pub fn new(config: &Config) -> Self {
        Self {
            compositor: ReceiptCompositor::new(),
            max_attempts: config.max_attempts,
        }
    }

    pub async fn run<D: PageDriver>(
        &self,
        driver: &D,
        order: &OrderRow,
        ctx: &OrderCtx,
    ) -> Result<SubmissionResult> {
        log_order_start(ctx, order);

        // 每次进入（或重载）下单页面都会弹窗，先把它关掉
        self.dismiss_modal(driver, ctx).await;

        // ========== 提交循环（拒绝与传输异常共享预算） ==========
        let mut attempts = 0;
        while attempts < self.max_attempts {
            attempts += 1;

            match self.submit_once(driver, order).await {
                AttemptOutcome::Success => {
                    info!(
                        "[订单 {}] ✓ 第 {}/{} 次提交成功",
                        ctx.order_index, attempts, self.max_attempts
                    );
                    return self.capture_artifacts(driver, order, ctx, attempts).await;
                }
                AttemptOutcome::ApplicationError => {
                    warn!(
                        "[订单 {}] ⚠️ 第 {}/{} 次提交被商店拒绝",
                        ctx.order_index, attempts, self.max_attempts
                    );
                }
                AttemptOutcome::Transport(e) => {
                    warn!(
                        "[订单 {}] ⚠️ 第 {}/{} 次提交遇到浏览器异常: {}",
                        ctx.order_index, attempts, self.max_attempts, e
                    );
                }
            }
        }

        // ========== 预算耗尽：恢复页面，标记失败 ==========
        error!(
            "[订单 {}] ❌ 连续 {} 次提交失败，放弃该订单",
            ctx.order_index, self.max_attempts
        );
        self.recover_page(driver, ctx).await;

        Ok(SubmissionResult::failed(&order.order_number, attempts))
    }

    /// 单次提交尝试：填表 → 预览 → 提交 → 检查错误提示
    async fn submit_once<D: PageDriver>(&self, driver: &D, order: &OrderRow) -> AttemptOutcome {
        match self.try_submit(driver, order).await {
            Ok(true) => AttemptOutcome::ApplicationError,
            Ok(false) => AttemptOutcome::Success,
            Err(e) => AttemptOutcome::Transport(e),
        }
    }

    /// 返回提交后页面是否出现错误提示
    async fn try_submit<D: PageDriver>(
        &self,
        driver: &D,
        order: &OrderRow,
    ) -> Result<bool, DriverError> {
        driver
            .select_option(selectors::HEAD_SELECT, &order.head)
            .await?;
        driver
            .set_checked(&selectors::body_radio(&order.body))
            .await?;
        driver.fill(selectors::LEGS_INPUT, &order.legs).await?;
        driver.fill(selectors::ADDRESS_INPUT, &order.address).await?;
        driver.click(selectors::PREVIEW_BUTTON).await?;
        driver.click(selectors::ORDER_BUTTON).await?;
        driver.element_exists(selectors::ERROR_ALERT).await
    }

    /// 收集成功订单的产物：收据 PDF + 机器人截图，合并为单个 PDF
    ///
    /// 此阶段失败不重试：远端订单可能已经生效，重新提交会重复下单。
    /// 只能清理半成品、恢复页面，把订单降级为失败
    async fn capture_artifacts<D: PageDriver>(
        &self,
        driver: &D,
        order: &OrderRow,
        ctx: &OrderCtx,
        attempts: usize,
    ) -> Result<SubmissionResult> {
        let pdf_path = ctx.receipt_path(&order.order_number);
        let png_path = ctx.screenshot_path(&order.order_number);

        match self.try_capture(driver, &pdf_path, &png_path).await {
            Ok(()) => {
                info!(
                    "[订单 {}] 📄 收据已生成: {}",
                    ctx.order_index,
                    pdf_path.display()
                );

                // 回到空白表单，准备下一单
                if let Err(e) = driver.click(selectors::ORDER_ANOTHER).await {
                    warn!(
                        "[订单 {}] ⚠️ 点击下一单按钮失败，改为重载页面: {}",
                        ctx.order_index, e
                    );
                    self.recover_page(driver, ctx).await;
                }

                Ok(SubmissionResult::completed(
                    &order.order_number,
                    attempts,
                    pdf_path,
                    png_path,
                ))
            }
            Err(e) => {
                error!(
                    "[订单 {}] ❌ 产物生成失败（远端订单可能已生效，无本地凭证）: {}",
                    ctx.order_index, e
                );
                cleanup_partial_artifacts(&pdf_path, &png_path, ctx);
                self.recover_page(driver, ctx).await;
                Ok(SubmissionResult::failed(&order.order_number, attempts))
            }
        }
    }

    /// 读收据 → 渲染 PDF → 元素截图 → 截图并入 PDF
    async fn try_capture<D: PageDriver>(
        &self,
        driver: &D,
        pdf_path: &Path,
        png_path: &Path,
    ) -> Result<()> {
        let receipt_html = driver.inner_html(selectors::RECEIPT).await?;
        self.compositor.render_to_pdf(&receipt_html, pdf_path)?;
        driver
            .screenshot_element(selectors::ROBOT_PREVIEW, png_path)
            .await?;
        self.compositor
            .append_images(&[png_path.to_path_buf()], pdf_path)?;
        Ok(())
    }

    /// 关闭进入页面时的弹窗
    ///
    /// 弹窗不一定在（比如页面刚被重载过又弹出、或已被关过），失败只记 debug
    async fn dismiss_modal<D: PageDriver>(&self, driver: &D, ctx: &OrderCtx) {
        if let Err(e) = driver.click(selectors::MODAL_OK).await {
            debug!("[订单 {}] 弹窗未出现或已关闭: {}", ctx.order_index, e);
        }
    }

    /// 重载页面，恢复到干净的下单表单
    ///
    /// 所有订单共享同一个 page，失败订单必须先把页面恢复再轮到下一单
    async fn recover_page<D: PageDriver>(&self, driver: &D, ctx: &OrderCtx) {
        if let Err(e) = driver.reload().await {
            error!("[订单 {}] ❌ 页面重载失败: {}", ctx.order_index, e);
        }
    }
}

/// 删除半成品产物文件
fn cleanup_partial_artifacts(pdf_path: &Path, png_path: &Path, ctx: &OrderCtx) {
    for path in [pdf_path, png_path] {
        if path.exists() {
            match std::fs::remove_file(path) {
                Ok(_) => debug!(
                    "[订单 {}] 已删除半成品: {}",
                    ctx.order_index,
                    path.display()
                ),
                Err(e) => warn!(
                    "[订单 {}] ⚠️ 删除半成品失败 {}: {}",
                    ctx.order_index,
                    path.display(),
                    e
                ),
            }
        }
    }
}

// ========== 日志辅助函数 ==========

/// 显示订单概要
fn log_order_start(ctx: &OrderCtx, order: &OrderRow) {
    let address_preview = if order.address.chars().count() > 40 {
        order.address.chars().take(40).collect::<String>() + "..."
    } else {
        order.address.clone()
    };

    info!("[订单 {}] 开始处理订单 {}", ctx.order_index, order.order_number);
    info!(
        "[订单 {}] 部件: 头 {} / 身体 {} / 腿 {}",
        ctx.order_index,
        part::display_label(&order.head, part::head_name(&order.head)),
        part::display_label(&order.body, part::body_name(&order.body)),
        order.legs
    );
    info!("[订单 {}] 地址: {}", ctx.order_index, address_preview);
}
