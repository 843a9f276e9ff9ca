//! 服务层模块
//!
//! - `image_source`: 二维码图片获取 (HTTP 下载 / data URL)
//! - `qr_decoder`: 二维码解码,多种二值化与兜底策略
//! - `candidate_selector`: 候选URL筛选与排序
//! - `platform_registry`: 已知平台API规则表
//! - `page_renderer` / `browser_service`: 无头浏览器渲染
//! - `video_sniffer`: 渲染期间的网络嗅探
//! - `render_extractor`: 渲染 → 嗅探 → DOM扫描 → 跳转跟随
//! - `strategy_pipeline`: 单个候选URL的策略链
//! - `result_ranker`: 多个候选结果择优
//! - `video_extract_service`: 对外入口
//! - `extract_worker`: 后台提取任务池
//!
//! # 服务架构
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │          VideoExtractService             │
//! │  ImageSource → qr_decoder → selector     │
//! └──────────────────┬───────────────────────┘
//!                    │ 每个候选URL
//!                    ▼
//! ┌──────────────────────────────────────────┐
//! │          StrategyPipeline                │
//! │  直链 → PlatformRegistry → RenderExtractor│
//! └──────────────────┬───────────────────────┘
//!                    │
//!                    ▼
//!        PageRenderer (Chromium + CDP)
//! ```

// Chromium 渲染 (默认启用,关闭 chromium-renderer feature 后需自行提供渲染器)
#[cfg(feature = "chromium-renderer")]
pub mod browser_service;

pub mod candidate_selector;
pub mod extract_worker;
pub mod image_source;
pub mod page_renderer;
pub mod platform_registry;
pub mod qr_decoder;
pub mod render_extractor;
pub mod result_ranker;
pub mod strategy_pipeline;
pub mod video_extract_service;
pub mod video_probe;
pub mod video_sniffer;

// 重导出常用类型,简化外部引用
#[cfg(feature = "chromium-renderer")]
pub use browser_service::BrowserSession;
#[cfg(feature = "chromium-renderer")]
pub use page_renderer::ChromiumRenderer;

pub use candidate_selector::{select_candidates, CandidateSelection};
pub use extract_worker::{ExtractionJob, ExtractionSink, ExtractionUpdate, ExtractionWorker};
pub use page_renderer::{PageRenderer, RenderedPage};
pub use platform_registry::{PlatformRegistry, PlatformRule};
pub use strategy_pipeline::StrategyPipeline;
pub use video_extract_service::VideoExtractService;
pub use video_probe::{ProbeOutcome, VideoProbe};
pub use video_sniffer::{NetworkExchange, VideoSniffer};
