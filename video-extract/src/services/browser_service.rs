//! 浏览器服务 - 单次渲染的 Chromium 生命周期
//!
//! 每次页面渲染启动一个独立的浏览器,用完即关,
//! 不在两次提取之间共享任何浏览器状态。

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::{ExtractError, ExtractorConfig};

/// 作用域浏览器会话
///
/// 正常路径调用 [`BrowserSession::close`] 关闭浏览器并回收进程;
/// 被取消 (例如外层超时) 时由 `Drop` 终止事件处理任务,
/// 浏览器进程随 `Browser` 一同释放。
pub struct BrowserSession {
    browser: Option<Browser>,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    /// 启动无头 Chromium
    ///
    /// - 关闭沙箱和 /dev/shm,适配容器环境
    /// - 关闭图片加载,样式表由调用方按页面屏蔽
    pub async fn launch(config: &ExtractorConfig) -> Result<Self, ExtractError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(config.http_timeout)
            .args(vec![
                "--disable-dev-shm-usage",
                "--disable-gpu",
                "--mute-audio",
                "--blink-settings=imagesEnabled=false",
            ]);

        if let Some(path) = config.chrome_path.as_deref() {
            builder = builder.chrome_executable(path);
        }

        let browser_config = builder
            .build()
            .map_err(|e| ExtractError::BrowserError(format!("浏览器配置失败: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ExtractError::BrowserError(format!("浏览器启动失败: {}", e)))?;

        // 后台任务驱动 CDP 消息,必须持续轮询
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "浏览器事件处理出错");
                }
            }
            debug!("浏览器事件处理器已退出");
        });

        info!("Chromium 实例启动成功");
        Ok(Self {
            browser: Some(browser),
            handler,
        })
    }

    /// 打开空白页面
    pub async fn new_page(&self) -> Result<Page, ExtractError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| ExtractError::BrowserError("浏览器已关闭".to_string()))?;

        browser
            .new_page("about:blank")
            .await
            .map_err(|e| ExtractError::BrowserError(format!("创建页面失败: {}", e)))
    }

    /// 关闭浏览器并等待进程退出
    pub async fn close(mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!(error = %e, "关闭浏览器失败");
            }
            if let Err(e) = browser.wait().await {
                warn!(error = %e, "等待浏览器进程退出失败");
            }
        }
        self.handler.abort();
        debug!("浏览器实例已关闭");
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
        if self.browser.is_some() {
            warn!("浏览器会话未正常关闭,随会话一起释放");
        }
    }
}
