//! 日志初始化
//!
//! 日志级别通过 RUST_LOG 环境变量控制，默认 info，
//! 配置里打开 verbose_logging 时默认提升为 debug

use tracing_subscriber::EnvFilter;

/// 初始化全局日志
///
/// `verbose` 为 true 时默认级别提升为 debug（仍可被 RUST_LOG 覆盖）。
/// 重复调用是安全的（测试中各用例都会调用一次）
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
