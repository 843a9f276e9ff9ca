//! 渲染提取
//!
//! 通用兜底策略,按顺序:
//! 1. 渲染页面,嗅探网络请求/响应
//! 2. 扫描渲染后的 DOM
//! 3. 跟随 `window.location` 跳转目标 (有上限),对每个目标重复 1、2

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::models::{ExtractionResult, ExtractorConfig};
use crate::services::page_renderer::{PageRenderer, RenderedPage};
use crate::services::video_probe::VideoProbe;
use crate::services::video_sniffer::VideoSniffer;
use crate::utils::video_patterns::{extract_follow_up_urls, find_video_url, looks_like_spa_shell};
use crate::{log_error, log_event};

/// 渲染提取器
pub struct RenderExtractor {
    renderer: Arc<dyn PageRenderer>,
    probe: VideoProbe,
    max_follow_ups: usize,

    /// 单页渲染总上限
    ceiling: Duration,
}

impl RenderExtractor {
    pub fn new(renderer: Arc<dyn PageRenderer>, probe: VideoProbe, config: &ExtractorConfig) -> Self {
        Self {
            renderer,
            probe,
            max_follow_ups: config.max_follow_ups,
            ceiling: config.render_ceiling(),
        }
    }

    /// 渲染页面并提取视频地址
    pub async fn extract(&self, url: &str) -> ExtractionResult {
        let page = match self.render(url).await {
            Ok(page) => page,
            Err(result) => return result,
        };

        if let Some(status) = page.document_status.filter(|_| !page.document_ok()) {
            warn!(url = %url, status = status, "页面返回非2xx");
            return ExtractionResult::failed(
                Some(url.to_string()),
                format!("页面访问失败: HTTP {}", status),
            );
        }

        if let Some(result) = self.scan(&page, "渲染提取成功").await {
            return result;
        }

        let mut last_visited = page.final_url.clone();
        let follow_ups: Vec<String> = extract_follow_up_urls(&page.html, Some(&page.final_url))
            .into_iter()
            .filter(|target| target != url && *target != page.final_url)
            .take(self.max_follow_ups)
            .collect();

        for target in &follow_ups {
            debug!(from = %page.final_url, target = %target, "跟随页面跳转");
            let follow_page = match self.render(target).await {
                Ok(p) if p.document_ok() => p,
                Ok(p) => {
                    debug!(target = %target, status = ?p.document_status, "跳转目标返回非2xx");
                    continue;
                }
                Err(result) => {
                    debug!(target = %target, status = %result.status(), "跳转目标渲染失败");
                    continue;
                }
            };

            last_visited = follow_page.final_url.clone();
            if let Some(result) = self.scan(&follow_page, "跟随页面提取成功").await {
                return result;
            }
        }

        if looks_like_spa_shell(&page.html) {
            info!(url = %url, "页面疑似未完成渲染的SPA,需要平台专用规则");
        }

        info!(
            url = %url,
            last_visited = %last_visited,
            follow_ups = follow_ups.len(),
            "渲染后仍未找到视频URL"
        );
        ExtractionResult::need_dynamic_render(last_visited, "渲染后仍未找到视频URL")
    }

    /// 渲染单个页面,失败时直接给出提取结果
    async fn render(&self, url: &str) -> Result<RenderedPage, ExtractionResult> {
        let started = Instant::now();
        match tokio::time::timeout(self.ceiling, self.renderer.render(url)).await {
            Ok(Ok(page)) => {
                debug!(
                    url = %url,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    exchanges = page.exchanges.len(),
                    "页面渲染完成"
                );
                Ok(page)
            }
            Ok(Err(e)) if e.is_unreachable() => {
                log_error!("RenderFailed", target_url = url, error = e.to_string().as_str());
                Err(ExtractionResult::failed(Some(url.to_string()), "页面访问失败"))
            }
            Ok(Err(e)) => {
                log_error!("RenderFailed", target_url = url, error = e.to_string().as_str());
                Err(ExtractionResult::need_dynamic_render(url, "渲染访问异常"))
            }
            Err(_) => {
                log_error!(
                    "RenderTimeout",
                    target_url = url,
                    ceiling_ms = self.ceiling.as_millis() as u64
                );
                Err(ExtractionResult::need_dynamic_render(url, "渲染访问异常"))
            }
        }
    }

    /// 嗅探结果优先,其次扫描 DOM
    async fn scan(&self, page: &RenderedPage, message: &str) -> Option<ExtractionResult> {
        if let Some(sniffed) = VideoSniffer::fold(&page.exchanges).into_captured() {
            log_event!(
                "VideoSniffed",
                target_url = page.final_url.as_str(),
                video_url = sniffed.url.as_str(),
                origin = sniffed.origin.as_str()
            );
            return Some(ExtractionResult::success(sniffed.url, page.final_url.clone(), message));
        }

        let found = find_video_url(&page.html, Some(&page.final_url))?;
        self.probe.probe(&found.url, &page.final_url).await;
        log_event!(
            "VideoFoundInDom",
            target_url = page.final_url.as_str(),
            video_url = found.url.as_str(),
            pattern = found.pattern_index
        );
        Some(ExtractionResult::success(found.url, page.final_url.clone(), message))
    }
}
