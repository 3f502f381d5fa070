use robot_order_submit::browser::connect_to_browser_and_page;
use robot_order_submit::config::Config;
use robot_order_submit::logger;
use robot_order_submit::models::{download_orders_csv, load_orders};
use robot_order_submit::services::{build_archive, ReceiptCompositor};
use robot_order_submit::App;

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_full_order_run() {
    // 产物写进临时目录，不污染工作目录
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let config = Config {
        output_dir: dir.path().join("output").to_string_lossy().into_owned(),
        orders_csv_file: dir.path().join("orders.csv").to_string_lossy().into_owned(),
        output_log_file: dir.path().join("output.txt").to_string_lossy().into_owned(),
        ..Config::from_env()
    };

    // 初始化日志
    logger::init(config.verbose_logging);

    let archive_path = config.archive_path();

    // 初始化并运行应用（默认无头模式，访问线上商店）
    App::initialize(config)
        .await
        .expect("初始化应用失败")
        .run()
        .await
        .expect("运行应用失败");

    assert!(archive_path.exists(), "应该生成收据压缩包");
}

#[tokio::test]
#[ignore]
async fn test_browser_connection() {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logger::init(config.verbose_logging);

    let port = config
        .browser_debug_port
        .expect("需要设置 BROWSER_DEBUG_PORT");

    // 测试浏览器连接
    let result = connect_to_browser_and_page(port, &config.storefront_url).await;

    assert!(result.is_ok(), "应该能够成功连接浏览器");
}

#[tokio::test]
#[ignore]
async fn test_download_and_load_orders() {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logger::init(config.verbose_logging);

    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let csv_path = dir.path().join("orders.csv");

    // 测试从线上商店下载订单表
    download_orders_csv(&config.orders_csv_url, &csv_path)
        .await
        .expect("下载订单表失败");
    let orders = load_orders(&csv_path).await.expect("解析订单表失败");

    assert!(!orders.is_empty(), "订单表不应为空");
    println!("找到 {} 张订单", orders.len());
}

#[tokio::test]
async fn test_parse_render_archive_pipeline() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let output_dir = dir.path().join("output");
    std::fs::create_dir_all(&output_dir).expect("创建产物目录失败");

    // 解析订单表
    let orders = robot_order_submit::models::parse_orders(
        "Order number,Head,Body,Legs,Address\n1,1,2,3,Any Street 7\n2,4,4,4,Other Road 9\n",
    )
    .expect("解析订单表失败");
    assert_eq!(orders.len(), 2);

    // 为每张订单渲染收据 PDF
    let compositor = ReceiptCompositor::new();
    for order in &orders {
        let html = format!(
            "<div><h3>Receipt</h3><p>Order {}</p></div>",
            order.order_number
        );
        compositor
            .render_to_pdf(
                &html,
                &output_dir.join(format!("{}.pdf", order.order_number)),
            )
            .expect("渲染收据失败");
    }

    // 归档
    let archive_path = dir.path().join("receipts.zip");
    let count = build_archive(&output_dir, &archive_path).expect("归档失败");

    assert_eq!(count, 2);
    assert!(archive_path.exists(), "应该生成收据压缩包");
}
