use anyhow::Result;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// 连接到已打开的浏览器并获取页面
///
/// 浏览器需要以 `--remote-debugging-port` 启动并已登录。
/// 优先复用地址栏包含 `url_hint` 的页面，否则新建空白页面。
pub async fn connect_to_browser_and_page(
    port: u16,
    url_hint: Option<&str>,
) -> Result<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

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

    // 等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let pages = browser.pages().await?;
    debug!("获取到 {} 个页面", pages.len());

    if let Some(hint) = url_hint {
        for p in pages.iter() {
            if let Ok(Some(url)) = p.url().await {
                debug!("检查页面地址: {}", url);
                if url.contains(hint) {
                    info!("✓ 复用已打开的页面: {}", url);
                    return Ok((browser, p.clone()));
                }
            }
        }
        debug!("未找到匹配的页面，将创建新页面");
    }

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建空白页面失败: {}", e);
        e
    })?;

    Ok((browser, page))
}
