//! 单个候选URL的提取策略链
//!
//! ```text
//! 视频直链? ──是──> SUCCESS (不发任何请求)
//!    │否
//! 已知平台? ──是──> 平台API结果 (成功或该平台的失败状态)
//!    │否
//! 渲染提取
//! ```
//! 已知平台一旦认领,其结果即最终结果,不再进入渲染。

use reqwest::Client;
use tracing::debug;

use crate::log_event;
use crate::models::{ExtractError, ExtractionResult, ExtractorConfig};
use crate::services::platform_registry::PlatformRegistry;
use crate::services::render_extractor::RenderExtractor;
use crate::utils::video_patterns::is_direct_video_url;

pub struct StrategyPipeline {
    registry: PlatformRegistry,
    client: Client,
    render: RenderExtractor,
}

impl StrategyPipeline {
    pub fn new(
        config: &ExtractorConfig,
        registry: PlatformRegistry,
        render: RenderExtractor,
    ) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            registry,
            client,
            render,
        })
    }

    /// 对单个候选URL执行策略链
    pub async fn run(&self, url: &str) -> ExtractionResult {
        let url = url.trim();

        if is_direct_video_url(url) {
            log_event!("DirectVideoLink", target_url = url);
            return ExtractionResult::success(url, url, "二维码为视频直链");
        }

        if let Some((rule, api_url)) = self.registry.find(url) {
            debug!(platform = rule.name, target_url = %url, "命中已知平台规则");
            return rule.fetch(&self.client, &api_url, url).await;
        }

        self.render.extract(url).await
    }
}
