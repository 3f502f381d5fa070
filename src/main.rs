use anyhow::Result;
use robot_order_submit::logger;
use robot_order_submit::App;
use robot_order_submit::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logger::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
