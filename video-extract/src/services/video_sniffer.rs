//! 网络嗅探
//!
//! SPA 页面的视频地址常常只出现在异步请求里 (播放器直接请求 mp4,
//! 或某个 JSON 接口返回视频字段),渲染后的 DOM 中未必有。
//! 渲染期间记录的全部请求/响应按到达顺序折叠进 [`VideoSniffer`]。

use serde::Serialize;
use tracing::debug;

use crate::utils::video_patterns::{find_video_url, is_direct_video_url, is_textual_content_type};

/// 渲染期间记录的一次网络交换
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkExchange {
    /// 请求地址
    pub url: String,

    /// 响应状态码 (仅请求、尚未响应时为空)
    pub status: Option<u16>,

    /// 响应 MIME 类型
    pub content_type: Option<String>,

    /// 文本类响应体
    pub body: Option<String>,
}

impl NetworkExchange {
    /// 仅有请求地址的记录
    pub fn request(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// 带响应体的记录
    pub fn response(
        url: impl Into<String>,
        status: u16,
        content_type: Option<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            status: Some(status),
            content_type,
            body: Some(body.into()),
        }
    }
}

/// 嗅探来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SniffSource {
    /// 请求地址本身就是视频直链
    RequestUrl,

    /// 从响应体中扫描得到
    ResponseBody,
}

/// 嗅探结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SniffedVideo {
    pub url: String,
    pub source: SniffSource,

    /// 产生该结果的交换地址
    pub origin: String,
}

/// 视频嗅探累加器
///
/// 后到的命中覆盖先到的命中: 页面上先出现的往往是封面/广告短片,
/// 主视频通常是最后加载的。
#[derive(Debug, Default)]
pub struct VideoSniffer {
    captured: Option<SniffedVideo>,
    observed: usize,
}

impl VideoSniffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 处理一次网络交换
    pub fn observe(&mut self, exchange: &NetworkExchange) {
        self.observed += 1;

        if is_direct_video_url(&exchange.url) {
            self.capture(exchange.url.trim().to_string(), SniffSource::RequestUrl, &exchange.url);
            return;
        }

        let Some(body) = exchange.body.as_deref() else {
            return;
        };
        if !is_textual_content_type(exchange.content_type.as_deref()) {
            return;
        }
        if let Some(found) = find_video_url(body, Some(&exchange.url)) {
            self.capture(found.url, SniffSource::ResponseBody, &exchange.url);
        }
    }

    fn capture(&mut self, url: String, source: SniffSource, origin: &str) {
        debug!(video_url = %url, origin = %origin, source = ?source, "嗅探到视频地址");
        self.captured = Some(SniffedVideo {
            url,
            source,
            origin: origin.to_string(),
        });
    }

    /// 已处理的交换数量
    pub fn observed(&self) -> usize {
        self.observed
    }

    pub fn captured(&self) -> Option<&SniffedVideo> {
        self.captured.as_ref()
    }

    pub fn into_captured(self) -> Option<SniffedVideo> {
        self.captured
    }

    /// 按顺序折叠全部交换
    pub fn fold<'a>(exchanges: impl IntoIterator<Item = &'a NetworkExchange>) -> Self {
        exchanges.into_iter().fold(Self::new(), |mut sniffer, exchange| {
            sniffer.observe(exchange);
            sniffer
        })
    }
}
