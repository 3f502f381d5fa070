//! 批量订单处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量订单的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：启动日志、准备产物目录、连接浏览器、创建 CdpDriver
//! 2. **订单加载**：下载并解析订单表（`Vec<OrderRow>`）
//! 3. **顺序处理**：所有订单共享同一个页面，逐张提交
//! 4. **失败隔离**：单张订单失败不影响后续订单
//! 5. **资源管理**：持有 Browser 和 CdpDriver，确保生命周期正确
//! 6. **产物归档**：收尾时把所有收据 PDF 打包成单个压缩文件
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单张订单的细节
//! - **资源所有者**：唯一持有 Browser 的模块
//! - **顺序执行**：表单是有状态的共享资源，不做并发
//! - **向下委托**：委托 workflow::OrderFlow 处理单张订单

use crate::browser;
use crate::config::Config;
use crate::infrastructure::{CdpDriver, PageDriver};
use crate::models::{self, OrderRow};
use crate::services;
use crate::workflow::{OrderCtx, OrderFlow, OrderStatus, SubmissionResult};
use anyhow::{Context, Result};
use chromiumoxide::Browser;
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    driver: CdpDriver,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        log_startup(&config);

        // 产物目录必须先就位，收据 PDF 和截图都落在这里
        fs::create_dir_all(&config.output_dir)
            .with_context(|| format!("创建产物目录失败: {}", config.output_dir))?;

        // 连接浏览器：配置了调试端口就复用已有实例，否则启动无头浏览器
        let (browser, page) = match config.browser_debug_port {
            Some(port) => {
                browser::connect_to_browser_and_page(port, &config.storefront_url).await?
            }
            None => {
                browser::launch_headless_browser(
                    &config.storefront_url,
                    config.chrome_executable.as_deref(),
                )
                .await?
            }
        };

        // 创建 CdpDriver（持有 page）
        let driver = CdpDriver::new(page, config.slowmo_ms);

        Ok(Self {
            config,
            _browser: browser,
            driver,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        // 加载所有待提交的订单
        let all_orders = self.load_orders().await?;

        let results = if all_orders.is_empty() {
            warn!("⚠️ 订单表中没有订单，仍会生成空的收据压缩包");
            Vec::new()
        } else {
            log_orders_loaded(all_orders.len(), self.config.max_attempts);

            let flow = OrderFlow::new(&self.config);
            run_batch(&self.driver, &flow, &all_orders, &self.config).await
        };

        // 归档收据（无论成功几张都执行，保证产物确定存在）
        let archived = self.build_archive()?;

        // 输出最终统计
        let stats = ProcessingStats::from_results(&results);
        print_final_stats(&stats, archived, &self.config);

        Ok(())
    }

    /// 下载并解析订单表
    async fn load_orders(&self) -> Result<Vec<OrderRow>> {
        info!("\n📁 正在获取订单表...");
        let csv_path = Path::new(&self.config.orders_csv_file);
        models::download_orders_csv(&self.config.orders_csv_url, csv_path).await?;
        let orders = models::load_orders(csv_path).await?;
        Ok(orders)
    }

    /// 把产物目录下的所有收据 PDF 打包为单个压缩文件
    fn build_archive(&self) -> Result<usize> {
        let archive_path = self.config.archive_path();
        let count = services::build_archive(Path::new(&self.config.output_dir), &archive_path)
            .with_context(|| format!("生成收据压缩包失败: {}", archive_path.display()))?;
        info!("\n📦 已归档 {} 份收据 PDF: {}", count, archive_path.display());
        Ok(count)
    }
}

/// 顺序处理所有订单
///
/// 表单页面是共享的有状态资源，必须一张订单完整处理完
/// （含失败后的页面恢复）再轮到下一张
pub async fn run_batch<D: PageDriver>(
    driver: &D,
    flow: &OrderFlow,
    orders: &[OrderRow],
    config: &Config,
) -> Vec<SubmissionResult> {
    let total_orders = orders.len();
    let mut results = Vec::with_capacity(total_orders);

    for (idx, order) in orders.iter().enumerate() {
        let order_index = idx + 1;
        log_order_separator(order_index, total_orders);

        let ctx = OrderCtx::new(order_index, config.output_dir.clone());

        match flow.run(driver, order, &ctx).await {
            Ok(result) => {
                log_order_result(order_index, &result);
                results.push(result);
            }
            Err(e) => {
                // 流程内部已把可预期的失败都收敛成 Failed 结果，
                // 走到这里属于意料之外的错误，同样不中断批次
                error!("[订单 {}] ❌ 处理过程中发生错误: {}", order_index, e);
                results.push(SubmissionResult::failed(&order.order_number, 0));
            }
        }
    }

    results
}

/// 处理统计
#[derive(Debug, Default)]
struct ProcessingStats {
    success: usize,
    failed: usize,
    total: usize,
}

impl ProcessingStats {
    fn from_results(results: &[SubmissionResult]) -> Self {
        let success = results
            .iter()
            .filter(|r| r.status == OrderStatus::Completed)
            .count();
        Self {
            success,
            failed: results.len() - success,
            total: results.len(),
        }
    }
}

// ========== 日志辅助函数 ==========

fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n订单处理日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量机器人订单提交模式");
    info!("📊 单张订单最大尝试次数: {}", config.max_attempts);
    info!("🐢 页面操作减速: {} ms", config.slowmo_ms);
    info!("{}", "=".repeat(60));
}

fn log_orders_loaded(total: usize, max_attempts: usize) {
    info!("✓ 找到 {} 张待提交的订单", total);
    info!("📋 将按顺序逐张提交（所有订单共享同一个页面）");
    info!("💡 每张订单最多尝试 {} 次\n", max_attempts);
}

fn log_order_separator(order_index: usize, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 张订单", order_index, total);
    info!("{}", "=".repeat(60));
}

fn log_order_result(order_index: usize, result: &SubmissionResult) {
    info!("\n{}", "─".repeat(60));
    match result.status {
        OrderStatus::Completed => info!(
            "✅ [订单 {}] 订单 {} 已完成（尝试 {} 次）",
            order_index, result.order_number, result.attempts
        ),
        OrderStatus::Failed => info!(
            "❌ [订单 {}] 订单 {} 提交失败（尝试 {} 次）",
            order_index, result.order_number, result.attempts
        ),
    }
    info!("{}", "─".repeat(60));
}

fn print_final_stats(stats: &ProcessingStats, archived: usize, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部订单处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", stats.success, stats.total);
    info!("❌ 失败: {}", stats.failed);
    info!(
        "📦 收据压缩包: {} 份 → {}",
        archived,
        config.archive_path().display()
    );
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", config.output_log_file);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::page_driver::scripted::{ScriptedDriver, ScriptedOutcome};

    /// 创建测试用的订单列表
    fn create_test_orders() -> Vec<OrderRow> {
        ["11", "12", "13"]
            .iter()
            .map(|n| OrderRow {
                order_number: n.to_string(),
                head: "1".to_string(),
                body: "2".to_string(),
                legs: "3".to_string(),
                address: "Any Street 7".to_string(),
            })
            .collect()
    }

    fn create_test_config(output_dir: &Path) -> Config {
        Config {
            output_dir: output_dir.to_string_lossy().into_owned(),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_run_batch_isolates_failures() {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let config = create_test_config(dir.path());
        let flow = OrderFlow::new(&config);
        // 订单 12 耗尽预算，前后两张订单不受影响
        let driver = ScriptedDriver::new(vec![
            ScriptedOutcome::Accepted,
            ScriptedOutcome::Rejected,
            ScriptedOutcome::Rejected,
            ScriptedOutcome::Rejected,
            ScriptedOutcome::Accepted,
        ]);

        let results = run_batch(&driver, &flow, &create_test_orders(), &config).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].status, OrderStatus::Completed);
        assert_eq!(results[1].status, OrderStatus::Failed);
        assert_eq!(results[1].attempts, 3);
        assert_eq!(results[2].status, OrderStatus::Completed);
        assert!(dir.path().join("11.pdf").exists());
        assert!(!dir.path().join("12.pdf").exists());
        assert!(dir.path().join("13.pdf").exists());
        // 失败订单重载页面一次，批次继续
        assert_eq!(driver.reload_count(), 1);
    }

    #[tokio::test]
    async fn test_batch_then_archive_keeps_only_receipts() {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let config = create_test_config(dir.path());
        let flow = OrderFlow::new(&config);
        let driver = ScriptedDriver::new(vec![
            ScriptedOutcome::Accepted,
            ScriptedOutcome::Rejected,
            ScriptedOutcome::Rejected,
            ScriptedOutcome::Rejected,
            ScriptedOutcome::Accepted,
        ]);

        let results = run_batch(&driver, &flow, &create_test_orders(), &config).await;
        assert_eq!(results.len(), 3);

        // 截图 PNG 和压缩包自身都不会被收进压缩包
        let archive_path = config.archive_path();
        let count = services::build_archive(dir.path(), &archive_path).expect("归档失败");
        assert_eq!(count, 2);

        let file = std::fs::File::open(&archive_path).expect("打开压缩包失败");
        let mut zip = zip::ZipArchive::new(file).expect("读取压缩包失败");
        let mut names = Vec::new();
        for i in 0..zip.len() {
            names.push(zip.by_index(i).expect("读取条目失败").name().to_string());
        }
        names.sort();
        assert_eq!(names, vec!["11.pdf", "13.pdf"]);
    }
}
