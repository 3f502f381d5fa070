use anyhow::Result;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// 连接到已启动的浏览器并获取下单页面
///
/// 优先复用已经打开商店站点的标签页；无论复用还是新建，
/// 最后都会导航到下单表单地址
pub async fn connect_to_browser_and_page(port: u16, target_url: &str) -> Result<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);
    debug!("目标 URL: {}", target_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        e
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let pages = browser.pages().await?;
    debug!("获取到 {} 个页面", pages.len());

    // 尝试复用已经打开商店站点的标签页（按 # 之前的站点前缀匹配）
    let site_root = target_url.split('#').next().unwrap_or(target_url);
    for p in pages.iter() {
        if let Ok(Some(page_url)) = p.url().await {
            debug!("检查页面地址: {}", page_url);
            if page_url.starts_with(site_root) {
                info!("✓ 复用已打开的页面: {}", page_url);
                p.goto(target_url).await.map_err(|e| {
                    error!("导航到 {} 失败: {}", target_url, e);
                    e
                })?;
                return Ok((browser, p.clone()));
            }
        }
    }
    debug!("未找到已打开的商店页面，将创建新页面");

    // 创建新页面并导航到下单表单
    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建新页面失败: {}", e);
        e
    })?;
    page.goto(target_url).await.map_err(|e| {
        error!("导航到 {} 失败: {}", target_url, e);
        e
    })?;
    info!("已导航到: {}", target_url);
    debug!("页面导航成功");

    Ok((browser, page))
}
