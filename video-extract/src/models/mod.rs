//! 数据模型模块
//!
//! 包含所有核心数据结构:
//! - errors: 错误类型定义 (提取阶段内部错误、配置错误)
//! - extraction_result: 提取结果与状态目录
//! - extractor_config: 超时、等待时长、平台API模板等配置

pub mod errors;
pub mod extraction_result;
pub mod extractor_config;

// 重导出常用类型,简化外部引用
pub use errors::{ConfigError, ExtractError};
pub use extraction_result::{ExtractStatus, ExtractionResult};
pub use extractor_config::ExtractorConfig;
