//! 视频地址软校验
//!
//! 对 DOM 扫描得到的视频地址发一次 HEAD 请求,结果只写日志。
//! 很多 CDN 拒绝 HEAD 或要求 Referer,探测失败不代表地址无效。

use reqwest::Client;
use tracing::{debug, info};

use crate::models::{ExtractError, ExtractorConfig};

/// 探测结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// 2xx/3xx
    Reachable,

    /// 服务端明确拒绝
    Rejected(u16),

    /// 超时、连接失败等,无法判断
    Inconclusive(String),

    /// 探测已关闭
    Skipped,
}

/// HEAD 探测器
#[derive(Clone)]
pub struct VideoProbe {
    client: Client,
    enabled: bool,
}

impl VideoProbe {
    pub fn new(config: &ExtractorConfig) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .timeout(config.probe_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            enabled: config.probe_enabled,
        })
    }

    /// 探测视频地址 (永不失败)
    pub async fn probe(&self, video_url: &str, referer: &str) -> ProbeOutcome {
        if !self.enabled {
            return ProbeOutcome::Skipped;
        }

        let outcome = match self
            .client
            .head(video_url)
            .header(reqwest::header::REFERER, referer)
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();
                if status.is_success() || status.is_redirection() {
                    ProbeOutcome::Reachable
                } else {
                    ProbeOutcome::Rejected(status.as_u16())
                }
            }
            Err(e) => ProbeOutcome::Inconclusive(ExtractError::from(e).to_string()),
        };

        match &outcome {
            ProbeOutcome::Reachable => debug!(video_url = %video_url, "视频地址可访问"),
            other => info!(video_url = %video_url, outcome = ?other, "视频地址探测未通过,保留该地址"),
        }
        outcome
    }
}
