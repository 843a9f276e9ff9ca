//! 页面渲染
//!
//! [`PageRenderer`] 是提取流程与无头浏览器之间唯一的接口,
//! 测试中可以替换为脚本化的实现。

use async_trait::async_trait;

use crate::models::ExtractError;
use crate::services::video_sniffer::NetworkExchange;

/// 一次页面渲染的产物
#[derive(Debug, Clone, Default)]
pub struct RenderedPage {
    /// 跟随重定向后的最终地址
    pub final_url: String,

    /// 主文档 HTTP 状态码 (未捕获到时为空)
    pub document_status: Option<u16>,

    /// 渲染后的 DOM
    pub html: String,

    /// 按到达顺序记录的网络交换
    pub exchanges: Vec<NetworkExchange>,
}

impl RenderedPage {
    /// 主文档状态码是否为 2xx (未捕获到状态码时视为正常)
    pub fn document_ok(&self) -> bool {
        self.document_status
            .map_or(true, |status| (200..300).contains(&status))
    }
}

/// 页面渲染器
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// 渲染页面并记录期间的网络活动
    ///
    /// 页面无法打开时返回 `NavigationFailed`/`NetworkFailed`,
    /// 浏览器自身故障返回 `BrowserError`。
    async fn render(&self, url: &str) -> Result<RenderedPage, ExtractError>;
}

#[cfg(feature = "chromium-renderer")]
pub use chromium::ChromiumRenderer;

#[cfg(feature = "chromium-renderer")]
mod chromium {
    use std::collections::HashMap;
    use std::time::Duration;

    use async_trait::async_trait;
    use chromiumoxide::cdp::browser_protocol::network::{
        EnableParams, EventLoadingFinished, EventRequestWillBeSent, EventResponseReceived,
        GetResponseBodyParams, RequestId, ResourceType, SetBlockedUrLsParams,
    };
    use chromiumoxide::page::Page;
    use futures_util::StreamExt;
    use tokio::task::JoinHandle;
    use tokio_util::sync::CancellationToken;
    use tracing::{debug, info, warn};

    use super::{PageRenderer, RenderedPage};
    use crate::models::{ExtractError, ExtractorConfig};
    use crate::services::browser_service::BrowserSession;
    use crate::services::video_sniffer::NetworkExchange;
    use crate::utils::video_patterns::is_textual_content_type;

    /// 基于 Chromium 的渲染器
    ///
    /// 每次渲染启动独立浏览器;等待分两阶段:
    /// 1. 页面加载 (最长 `js_wait`,超时后继续)
    /// 2. 固定等待 `background_js_wait`,让定时器和异步请求完成
    pub struct ChromiumRenderer {
        config: ExtractorConfig,
    }

    impl ChromiumRenderer {
        pub fn new(config: ExtractorConfig) -> Self {
            Self { config }
        }

        async fn render_in(&self, session: &BrowserSession, url: &str) -> Result<RenderedPage, ExtractError> {
            let page = session.new_page().await?;

            page.set_user_agent(self.config.user_agent.as_str())
                .await
                .map_err(|e| ExtractError::BrowserError(format!("设置 UserAgent 失败: {}", e)))?;

            page.execute(EnableParams::default())
                .await
                .map_err(|e| ExtractError::BrowserError(format!("启用网络追踪失败: {}", e)))?;

            // 样式表与视频无关,直接屏蔽
            page.execute(SetBlockedUrLsParams::new(vec!["*.css".to_string()]))
                .await
                .map_err(|e| ExtractError::BrowserError(format!("屏蔽样式表失败: {}", e)))?;

            let cancel = CancellationToken::new();
            let collector = spawn_collector(page.clone(), cancel.clone()).await?;

            let navigation = tokio::time::timeout(self.config.js_wait, page.goto(url)).await;
            let navigation_error = match navigation {
                Ok(Ok(_)) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(_) => {
                    debug!(url = %url, wait_ms = self.config.js_wait.as_millis() as u64, "页面加载等待超时,继续处理");
                    None
                }
            };

            if navigation_error.is_none() {
                tokio::time::sleep(self.config.background_js_wait).await;
            }

            cancel.cancel();
            let capture = match collector.await {
                Ok(capture) => capture,
                Err(e) => {
                    warn!(error = %e, "网络事件收集任务异常");
                    Capture::default()
                }
            };

            if let Some(error) = navigation_error {
                // 主文档有响应说明页面可达,只是导航过程报错
                if capture.documents.is_empty() {
                    let _ = page.close().await;
                    return Err(ExtractError::NavigationFailed(error));
                }
                debug!(url = %url, error = %error, "导航报错但已收到主文档响应");
            }

            let final_url = page
                .url()
                .await
                .ok()
                .flatten()
                .filter(|u| !u.is_empty() && u != "about:blank")
                .unwrap_or_else(|| url.to_string());

            let html = page
                .content()
                .await
                .map_err(|e| ExtractError::BrowserError(format!("读取页面内容失败: {}", e)))?;

            if let Err(e) = page.close().await {
                debug!(error = %e, "关闭页面失败");
            }

            let document_status = capture.document_status(&final_url);
            info!(
                url = %url,
                final_url = %final_url,
                document_status = ?document_status,
                exchanges = capture.exchanges.len(),
                html_len = html.len(),
                "页面渲染完成"
            );

            Ok(RenderedPage {
                final_url,
                document_status,
                html,
                exchanges: capture.exchanges,
            })
        }
    }

    #[async_trait]
    impl PageRenderer for ChromiumRenderer {
        async fn render(&self, url: &str) -> Result<RenderedPage, ExtractError> {
            let session = BrowserSession::launch(&self.config).await?;
            let result = self.render_in(&session, url).await;
            session.close().await;
            result
        }
    }

    /// 收集到的网络活动
    #[derive(Default)]
    struct Capture {
        exchanges: Vec<NetworkExchange>,

        /// 主文档响应 (地址, 状态码),按到达顺序
        documents: Vec<(String, u16)>,
    }

    impl Capture {
        /// 优先取与最终地址一致的文档响应,否则取第一个
        fn document_status(&self, final_url: &str) -> Option<u16> {
            self.documents
                .iter()
                .rev()
                .find(|(url, _)| url == final_url)
                .or_else(|| self.documents.first())
                .map(|(_, status)| *status)
        }
    }

    /// 等待响应体的请求
    struct PendingBody {
        url: String,
        status: u16,
        mime_type: String,
    }

    /// 订阅网络事件并在后台收集,直到收到取消信号
    async fn spawn_collector(
        page: Page,
        cancel: CancellationToken,
    ) -> Result<JoinHandle<Capture>, ExtractError> {
        let subscribe_error =
            |e: chromiumoxide::error::CdpError| ExtractError::BrowserError(format!("订阅网络事件失败: {}", e));

        let mut requests = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(subscribe_error)?;
        let mut responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(subscribe_error)?;
        let mut finished = page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(subscribe_error)?;

        Ok(tokio::spawn(async move {
            let mut capture = Capture::default();
            let mut pending: HashMap<RequestId, PendingBody> = HashMap::new();

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    Some(event) = requests.next() => {
                        capture.exchanges.push(NetworkExchange::request(event.request.url.clone()));
                    }
                    Some(event) = responses.next() => {
                        let status = u16::try_from(event.response.status).unwrap_or_default();
                        if event.r#type == ResourceType::Document {
                            capture.documents.push((event.response.url.clone(), status));
                        }
                        if is_textual_content_type(Some(event.response.mime_type.as_str())) {
                            pending.insert(
                                event.request_id.clone(),
                                PendingBody {
                                    url: event.response.url.clone(),
                                    status,
                                    mime_type: event.response.mime_type.clone(),
                                },
                            );
                        }
                    }
                    Some(event) = finished.next() => {
                        let Some(body) = pending.remove(&event.request_id) else {
                            continue;
                        };
                        if let Some(exchange) = read_body(&page, &event.request_id, body).await {
                            capture.exchanges.push(exchange);
                        }
                    }
                    else => break,
                }
            }
            capture
        }))
    }

    /// 单个响应体的读取上限
    const BODY_READ_TIMEOUT: Duration = Duration::from_secs(2);

    async fn read_body(page: &Page, request_id: &RequestId, body: PendingBody) -> Option<NetworkExchange> {
        let params = GetResponseBodyParams::new(request_id.clone());
        match tokio::time::timeout(BODY_READ_TIMEOUT, page.execute(params)).await {
            Ok(Ok(response)) if !response.base64_encoded => Some(NetworkExchange::response(
                body.url,
                body.status,
                Some(body.mime_type),
                response.body.clone(),
            )),
            Ok(Ok(_)) => None,
            Ok(Err(e)) => {
                // 页面跳转后资源可能已被回收
                debug!(url = %body.url, error = %e, "读取响应体失败");
                None
            }
            Err(_) => {
                debug!(url = %body.url, "读取响应体超时");
                None
            }
        }
    }
}
