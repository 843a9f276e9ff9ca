//! URL 处理工具
//!
//! - 候选地址反转义 (JSON 转义、HTML 实体)
//! - 规范化为绝对地址 (协议补全、相对路径解析)
//! - 查询参数提取 (含 hash 路由中的参数)

use regex::Regex;
use url::Url;

/// 对候选 URL 进行反转义
///
/// 处理页面/接口里常见的转义形式:
/// - JSON 转义: `\/` → `/`, 以及 `/` `&` `=` `?` `%` 的 unicode 转义 (形如 u002f)
/// - HTML 实体: `&amp;` → `&`
pub fn unescape_url_candidate(candidate: &str) -> String {
    candidate
        .trim()
        .replace("\\/", "/")
        .replace("\\u002f", "/")
        .replace("\\u002F", "/")
        .replace("\\u0026", "&")
        .replace("\\u003d", "=")
        .replace("\\u003D", "=")
        .replace("\\u003f", "?")
        .replace("\\u003F", "?")
        .replace("\\u0025", "%")
        .replace("&amp;", "&")
}

/// 是否为 HTTP/HTTPS 地址
pub fn is_http_url(content: &str) -> bool {
    content.starts_with("http://") || content.starts_with("https://")
}

/// 是否为微信域名
///
/// 多二维码场景下,公众号关注码几乎都落在这个域名下。
pub fn is_weixin_url(url: &str) -> bool {
    url.to_ascii_lowercase().contains("weixin.qq.com")
}

/// 将候选地址规范化为绝对 HTTP(S) 地址
///
/// - `//host/path`: 沿用基准页面的协议,基准缺失时补 `https:`
/// - 绝对地址: 原样返回
/// - 相对路径: 基于 `base_url` 解析
///
/// 无法得到 HTTP(S) 绝对地址时返回 `None`。
pub fn normalize_url(candidate: &str, base_url: Option<&str>) -> Option<String> {
    let url = candidate.trim();
    if url.is_empty() {
        return None;
    }

    if let Some(rest) = url.strip_prefix("//") {
        let scheme = base_url
            .and_then(|b| Url::parse(b).ok())
            .map(|b| b.scheme().to_string())
            .filter(|s| s == "http" || s == "https")
            .unwrap_or_else(|| "https".to_string());
        return Some(format!("{}://{}", scheme, rest));
    }

    if is_http_url(url) {
        return Some(url.to_string());
    }

    let base = Url::parse(base_url?).ok()?;
    let resolved = base.join(url).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// 从 URL 中提取查询参数值
///
/// 同时支持标准查询串和 hash 路由中的参数,
/// 例如 `https://a.com/#/pages/goodsdetail?store_id=560&id=73886` 中的 `id`。
/// 参数名大小写不敏感,值原样返回。
pub fn extract_query_param(url: &str, key: &str) -> Option<String> {
    if url.is_empty() || key.is_empty() {
        return None;
    }
    let pattern = format!(r"(?i)(?:^|[?&]){}=([^&#]+)", regex::escape(key));
    let re = Regex::new(&pattern).ok()?;
    re.captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|v| !v.trim().is_empty())
}
