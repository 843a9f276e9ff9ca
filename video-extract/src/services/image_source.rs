//! 二维码图片来源
//!
//! 支持两种来源:
//! - `http(s)://` 远程图片,带超时和 User-Agent 下载
//! - `data:image/...;base64,...` 内联图片

use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use tracing::{debug, warn};

use crate::models::{ExtractError, ExtractorConfig};

/// 图片下载器
#[derive(Clone)]
pub struct ImageSource {
    client: Client,
}

impl ImageSource {
    pub fn new(config: &ExtractorConfig) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .timeout(config.image_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    /// 读取图片字节
    ///
    /// 非 2xx 或空响应体都视为错误,由调用方降级为"未识别到二维码"。
    pub async fn fetch(&self, source: &str) -> Result<Vec<u8>, ExtractError> {
        let source = source.trim();

        if source.starts_with("data:") {
            return decode_data_url(source);
        }

        debug!(source = %source, "下载二维码图片");
        let response = self.client.get(source).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(source = %source, status = status.as_u16(), "二维码图片下载失败");
            return Err(ExtractError::HttpStatus {
                status: status.as_u16(),
                url: source.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ExtractError::InvalidResponse("图片内容为空".to_string()));
        }
        Ok(bytes.to_vec())
    }
}

/// 解析 `data:image/png;base64,....` 形式的内联图片
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, ExtractError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| ExtractError::InvalidDataUrl("缺少 data: 前缀".to_string()))?;

    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ExtractError::InvalidDataUrl("缺少数据分隔符".to_string()))?;

    if !meta.to_ascii_lowercase().ends_with(";base64") {
        return Err(ExtractError::InvalidDataUrl(format!("仅支持base64编码: {}", meta)));
    }

    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = general_purpose::STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| ExtractError::InvalidDataUrl(e.to_string()))?;

    if bytes.is_empty() {
        return Err(ExtractError::InvalidDataUrl("图片内容为空".to_string()));
    }
    Ok(bytes)
}
