//! 已知平台规则表
//!
//! 部分商城 H5 是纯 SPA,页面里没有任何视频信息,
//! 只能根据页面地址中的商品ID直接调用其数据接口。
//! 新增平台只需在 [`PlatformRegistry::builtin`] 里追加一条规则。

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::log_event;
use crate::models::{ExtractError, ExtractStatus, ExtractionResult, ExtractorConfig};
use crate::utils::url_utils::{extract_query_param, normalize_url};

/// 接口响应解析器: 成功返回原始视频地址,失败返回说明
pub type ResponseParser = fn(&Value) -> Result<String, String>;

/// 单个平台的提取规则
#[derive(Debug, Clone)]
pub struct PlatformRule {
    /// 规则名称 (日志用)
    pub name: &'static str,

    /// 结果说明前缀,如 `fwmall API`
    label: &'static str,

    /// 页面地址是否属于该平台
    matches_host: fn(&str) -> bool,

    /// 商品ID所在的查询参数
    id_param: &'static str,

    /// 接口地址模板,`{id}` 为占位符
    api_template: String,

    parse: ResponseParser,

    /// 接口路径上任何失败对应的状态
    failure_status: ExtractStatus,
}

impl PlatformRule {
    pub fn new(
        name: &'static str,
        label: &'static str,
        matches_host: fn(&str) -> bool,
        id_param: &'static str,
        api_template: impl Into<String>,
        parse: ResponseParser,
        failure_status: ExtractStatus,
    ) -> Self {
        Self {
            name,
            label,
            matches_host,
            id_param,
            api_template: api_template.into(),
            parse,
            failure_status,
        }
    }

    /// 尝试认领页面地址
    ///
    /// 域名匹配且能取到商品ID时返回接口地址,否则返回 `None`。
    pub fn claim(&self, page_url: &str) -> Option<String> {
        if !(self.matches_host)(page_url) {
            return None;
        }
        let id = extract_query_param(page_url, self.id_param)?;
        Some(self.api_template.replace("{id}", &id))
    }

    pub fn failure_status(&self) -> ExtractStatus {
        self.failure_status
    }

    /// 调用平台接口并转换为提取结果
    ///
    /// 任何失败都以本规则的失败状态返回,`target_url` 为原页面地址。
    pub async fn fetch(&self, client: &Client, api_url: &str, page_url: &str) -> ExtractionResult {
        debug!(platform = self.name, api_url = %api_url, "调用平台接口");

        let body = match self.request(client, api_url).await {
            Ok(body) => body,
            Err(ExtractError::HttpStatus { status, .. }) => {
                warn!(platform = self.name, api_url = %api_url, status = status, "平台接口返回非2xx");
                return self.fail(page_url, format!("{}请求失败: HTTP {}", self.label, status));
            }
            Err(e) => {
                warn!(platform = self.name, api_url = %api_url, error = %e, "平台接口调用失败");
                return self.fail(page_url, format!("{}提取失败", self.label));
            }
        };

        let raw_video = match (self.parse)(&body) {
            Ok(raw) => raw,
            Err(message) => {
                debug!(platform = self.name, reason = %message, "平台接口未给出视频");
                return self.fail(page_url, message);
            }
        };

        match normalize_url(&raw_video, Some(page_url)) {
            Some(video_url) => {
                log_event!(
                    "PlatformApiHit",
                    platform = self.name,
                    target_url = page_url,
                    video_url = video_url.as_str()
                );
                ExtractionResult::success(video_url, page_url, format!("{}提取成功", self.label))
            }
            None => self.fail(page_url, format!("{}未返回视频字段", self.label)),
        }
    }

    async fn request(&self, client: &Client, api_url: &str) -> Result<Value, ExtractError> {
        let response = client.get(api_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::HttpStatus {
                status: status.as_u16(),
                url: api_url.to_string(),
            });
        }
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    fn fail(&self, page_url: &str, message: String) -> ExtractionResult {
        ExtractionResult::failure(self.failure_status, Some(page_url.to_string()), message)
    }
}

/// 平台规则表 (按顺序匹配,第一条认领的规则生效)
#[derive(Debug, Clone, Default)]
pub struct PlatformRegistry {
    rules: Vec<PlatformRule>,
}

impl PlatformRegistry {
    pub fn new(rules: Vec<PlatformRule>) -> Self {
        Self { rules }
    }

    /// 内置规则: fwmall 烟花商城、虎城烟花
    pub fn builtin(config: &ExtractorConfig) -> Self {
        Self::new(vec![
            PlatformRule::new(
                "fwmall",
                "fwmall API",
                is_fwmall_goods_page,
                "id",
                config.fwmall_api_template.clone(),
                parse_fwmall,
                ExtractStatus::NeedDynamicRender,
            ),
            PlatformRule::new(
                "hucheng",
                "虎城API",
                is_hucheng_page,
                "id",
                config.hucheng_api_template.clone(),
                parse_hucheng,
                ExtractStatus::Failed,
            ),
        ])
    }

    /// 查找认领该地址的规则及其接口地址
    pub fn find(&self, page_url: &str) -> Option<(&PlatformRule, String)> {
        self.rules
            .iter()
            .find_map(|rule| rule.claim(page_url).map(|api_url| (rule, api_url)))
    }

    /// 已注册的规则数
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// 例: https://v2.fwmall.com.cn/wxmall/default3/#/pages/goodsdetail?store_id=560&id=73886
fn is_fwmall_goods_page(url: &str) -> bool {
    url.contains("fwmall.com.cn") && url.contains("goodsdetail")
}

fn is_hucheng_page(url: &str) -> bool {
    url.contains("huchengfireworks.com")
}

/// fwmall 商品详情
///
/// ```json
/// { "status": 1, "data": { "info": { "video_url_com": "...", "video_url": "..." } } }
/// ```
/// `video_url_com` 为压缩版,优先使用。
fn parse_fwmall(json: &Value) -> Result<String, String> {
    if json.get("status").and_then(Value::as_i64) != Some(1) {
        return Err("fwmall API返回异常".to_string());
    }
    let info = json.pointer("/data/info");
    first_text(info, &["video_url_com", "video_url"])
        .ok_or_else(|| "fwmall API未返回视频字段".to_string())
}

/// 虎城视频列表
///
/// ```json
/// { "code": 1, "msg": "", "data": { "list": [ { "video_url": "...", "url": "..." } ] } }
/// ```
fn parse_hucheng(json: &Value) -> Result<String, String> {
    if json.get("code").and_then(Value::as_i64) != Some(1) {
        let msg = json.get("msg").and_then(Value::as_str).unwrap_or_default();
        return Err(format!("虎城API返回错误: {}", msg));
    }
    let first = json
        .pointer("/data/list")
        .and_then(Value::as_array)
        .and_then(|list| list.first())
        .ok_or_else(|| "虎城视频列表为空".to_string())?;
    first_text(Some(first), &["video_url", "url"])
        .ok_or_else(|| "虎城API未返回视频字段".to_string())
}

fn first_text(node: Option<&Value>, keys: &[&str]) -> Option<String> {
    let node = node?;
    keys.iter()
        .filter_map(|key| node.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}
