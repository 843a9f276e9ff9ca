//! 二维码视频提取
//!
//! 从一张二维码图片出发,解析出可播放的视频直链 (mp4/m3u8)。
//!
//! ```text
//! 图片 ─> 二维码解码 ─> 候选URL筛选 ─┬─> 视频直链
//!                                   ├─> 已知平台API
//!                                   └─> 浏览器渲染 + 网络嗅探 + 跳转跟随
//!                                         │
//!                                   结果择优 ─> ExtractionResult
//! ```
//!
//! 对外入口为 [`VideoExtractService`],任何失败都以
//! [`ExtractionResult`] 的状态表达,不会向调用方返回错误。

pub mod models;
pub mod services;
pub mod utils;

pub use models::{ExtractStatus, ExtractionResult, ExtractorConfig};
pub use services::VideoExtractService;
