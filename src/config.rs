use std::path::{Path, PathBuf};

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 订单表下载地址
    pub orders_csv_url: String,
    /// 机器人下单页面地址
    pub storefront_url: String,
    /// 订单表本地保存路径
    pub orders_csv_file: String,
    /// 产物输出目录（收据 PDF、截图、压缩包）
    pub output_dir: String,
    /// 压缩包文件名（位于输出目录下）
    pub archive_file: String,
    /// 单张订单的最大提交尝试次数
    pub max_attempts: usize,
    /// 每次页面操作前的减速延迟（毫秒）
    pub slowmo_ms: u64,
    /// 浏览器调试端口（设置后连接已运行的浏览器，否则启动无头浏览器）
    pub browser_debug_port: Option<u16>,
    /// 浏览器可执行文件路径（无头模式下可选）
    pub chrome_executable: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            orders_csv_url: "https://robotsparebinindustries.com/orders.csv".to_string(),
            storefront_url: "https://robotsparebinindustries.com/#/robot-order".to_string(),
            orders_csv_file: "orders.csv".to_string(),
            output_dir: "output".to_string(),
            archive_file: "receipts.zip".to_string(),
            max_attempts: 3,
            slowmo_ms: 300,
            browser_debug_port: None,
            chrome_executable: None,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            orders_csv_url: std::env::var("ORDERS_CSV_URL").unwrap_or(default.orders_csv_url),
            storefront_url: std::env::var("STOREFRONT_URL").unwrap_or(default.storefront_url),
            orders_csv_file: std::env::var("ORDERS_CSV_FILE").unwrap_or(default.orders_csv_file),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(default.output_dir),
            archive_file: std::env::var("ARCHIVE_FILE").unwrap_or(default.archive_file),
            max_attempts: std::env::var("MAX_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_attempts),
            slowmo_ms: std::env::var("SLOWMO_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.slowmo_ms),
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok(),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }

    /// 压缩包完整路径（输出目录下）
    pub fn archive_path(&self) -> PathBuf {
        Path::new(&self.output_dir).join(&self.archive_file)
    }
}
