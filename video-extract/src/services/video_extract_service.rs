//! 视频提取服务 - 对外入口
//!
//! ```text
//! extract(图片地址)
//!   ├─ 空 ────────────────> SKIPPED  "缺少二维码图片"
//!   ├─ 下载/解码无结果 ──> FAILED   "未识别到二维码"
//!   ├─ 内容均非URL ──────> UNSUPPORTED
//!   └─ 逐个候选执行策略链,首个成功即返回;全部失败则择优
//! ```

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::models::{ExtractError, ExtractionResult, ExtractorConfig};
use crate::services::candidate_selector::{select_candidates, CandidateSelection};
use crate::services::image_source::ImageSource;
use crate::services::page_renderer::PageRenderer;
use crate::services::platform_registry::PlatformRegistry;
use crate::services::qr_decoder;
use crate::services::render_extractor::RenderExtractor;
use crate::services::result_ranker;
use crate::services::strategy_pipeline::StrategyPipeline;
use crate::services::video_probe::VideoProbe;
use crate::utils::url_utils::is_http_url;
use crate::{log_error, log_event};

/// 视频提取服务
///
/// 提取方法永不返回错误,所有失败都体现在结果状态中。
pub struct VideoExtractService {
    images: ImageSource,
    pipeline: Arc<StrategyPipeline>,
}

impl VideoExtractService {
    /// 使用 Chromium 渲染器创建服务
    #[cfg(feature = "chromium-renderer")]
    pub fn new(config: ExtractorConfig) -> Result<Self, ExtractError> {
        let renderer = Arc::new(crate::services::page_renderer::ChromiumRenderer::new(config.clone()));
        Self::with_renderer(config, renderer)
    }

    /// 使用指定渲染器创建服务
    pub fn with_renderer(
        config: ExtractorConfig,
        renderer: Arc<dyn PageRenderer>,
    ) -> Result<Self, ExtractError> {
        let registry = PlatformRegistry::builtin(&config);
        Self::with_parts(config, registry, renderer)
    }

    /// 使用指定平台规则表和渲染器创建服务
    pub fn with_parts(
        config: ExtractorConfig,
        registry: PlatformRegistry,
        renderer: Arc<dyn PageRenderer>,
    ) -> Result<Self, ExtractError> {
        let images = ImageSource::new(&config)?;
        let platform_rules = registry.len();
        let probe = VideoProbe::new(&config)?;
        let render = RenderExtractor::new(renderer, probe, &config);
        let pipeline = StrategyPipeline::new(&config, registry, render)?;

        debug!(
            js_wait_ms = config.js_wait.as_millis() as u64,
            background_js_wait_ms = config.background_js_wait.as_millis() as u64,
            max_follow_ups = config.max_follow_ups,
            platform_rules = platform_rules,
            "视频提取服务已创建"
        );
        Ok(Self {
            images,
            pipeline: Arc::new(pipeline),
        })
    }

    /// 从二维码图片提取视频直链
    pub async fn extract(&self, source_image_url: &str) -> ExtractionResult {
        let source = source_image_url.trim();
        if source.is_empty() {
            return ExtractionResult::skipped("缺少二维码图片");
        }

        let started = Instant::now();
        let payloads = self.parse_qr_codes(source).await;
        if payloads.is_empty() {
            log_error!("QrNotFound", source = source);
            return ExtractionResult::failed(None, "未识别到二维码");
        }

        let candidates = match select_candidates(&payloads) {
            CandidateSelection::Urls(urls) => urls,
            CandidateSelection::NoUrl => {
                info!(payloads = ?payloads, "二维码内容不是URL");
                return ExtractionResult::unsupported("二维码内容不是可访问的URL");
            }
        };
        log_event!("CandidateSelected", count = candidates.len(), first = candidates[0].as_str());

        let mut attempts = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let result = self.run_isolated(candidate).await;
            if result.is_success() {
                log_event!(
                    "VideoExtracted",
                    target_url = result.target_url().unwrap_or_default(),
                    video_url = result.video_url().unwrap_or_default(),
                    elapsed_ms = started.elapsed().as_millis() as u64
                );
                return result;
            }
            debug!(candidate = %candidate, status = %result.status(), message = %result.message(), "候选未提取到视频");
            attempts.push(result);
        }

        let best = result_ranker::rank(attempts, &candidates);
        log_error!(
            "ExtractionFailed",
            status = best.status().as_str(),
            target_url = best.target_url().unwrap_or_default(),
            message = best.message(),
            elapsed_ms = started.elapsed().as_millis() as u64
        );
        best
    }

    /// 仅解码二维码,返回全部内容
    ///
    /// 图片无法获取或无法识别时返回空列表。
    pub async fn parse_qr_codes(&self, image_url: &str) -> Vec<String> {
        let image_url = image_url.trim();
        if image_url.is_empty() {
            return Vec::new();
        }

        let bytes = match self.images.fetch(image_url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                log_error!("ImageFetchFailed", source = image_url, error = e.to_string().as_str());
                return Vec::new();
            }
        };

        let payloads = qr_decoder::decode_async(bytes).await;
        if !payloads.is_empty() {
            log_event!("QrDecoded", count = payloads.len(), source = image_url);
        }
        payloads
    }

    /// 对单个页面地址执行策略链 (跳过二维码解码)
    pub async fn extract_from_page(&self, page_url: &str) -> ExtractionResult {
        let page_url = page_url.trim();
        if page_url.is_empty() {
            return ExtractionResult::skipped("缺少页面地址");
        }
        if !is_http_url(page_url) {
            return ExtractionResult::unsupported("二维码内容不是可访问的URL");
        }
        self.run_isolated(page_url).await
    }

    /// 在独立任务中执行策略链
    ///
    /// 策略链 panic 时按 `FAILED` 处理,不会传播给调用方。
    async fn run_isolated(&self, candidate: &str) -> ExtractionResult {
        let pipeline = self.pipeline.clone();
        let target = candidate.to_string();
        match tokio::spawn(async move { pipeline.run(&target).await }).await {
            Ok(result) => result,
            Err(e) => {
                log_error!(
                    "PipelinePanicked",
                    candidate = candidate,
                    error = e.to_string().as_str()
                );
                ExtractionResult::failed(Some(candidate.to_string()), "提取过程异常")
            }
        }
    }
}
