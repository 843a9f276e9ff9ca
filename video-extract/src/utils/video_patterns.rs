//! 视频地址识别规则
//!
//! 所有从文本中找视频地址的逻辑都在这里:
//! 直链判断、按优先级排列的页面扫描规则、JS 跳转目标提取。

use once_cell::sync::Lazy;
use regex::Regex;

use super::url_utils::{normalize_url, unescape_url_candidate};

/// 视频直链: 整个字符串就是一个 mp4/m3u8 地址 (可带查询串)
static DIRECT_VIDEO_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^https?://\S+\.(?:mp4|m3u8)(?:\?\S*)?$").expect("直链正则无效")
});

/// `window.location = '...'` / `window.location.href = "..."`
static JS_LOCATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)window\.location(?:\.href)?\s*=\s*['"]([^'"]+)['"]"#)
        .expect("跳转正则无效")
});

/// 页面扫描规则,按优先级从高到低
///
/// 引号前允许一个反斜杠,以兼容 JSON 字符串内嵌的转义引号。
static VIDEO_URL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // DATA.video = "..."
        r#"(?i)\bDATA\b\s*\.\s*video\s*[:=]\s*\\?["']([^"']+\.(?:mp4|m3u8)(?:\?[^"']*)?)\\?["']"#,
        // var DATA = { ..., "video": "..." }
        r#"(?i)(?:var\s+)?\bDATA\b\s*=\s*\{[\s\S]*?\\?["']video\\?["']\s*[:=]\s*\\?["']([^"']+\.(?:mp4|m3u8)(?:\?[^"']*)?)\\?["']"#,
        // "video": "..."
        r#"(?i)\\?["']video\\?["']\s*[:=]\s*\\?["']([^"']+\.(?:mp4|m3u8)(?:\?[^"']*)?)\\?["']"#,
        // <source src="...">
        r#"(?i)<source[^>]*src=["']([^"']+\.(?:mp4|m3u8)(?:\?[^"']*)?)["'][^>]*>"#,
        // <video src="...">
        r#"(?i)<video[^>]*src=["']([^"']+\.(?:mp4|m3u8)(?:\?[^"']*)?)["'][^>]*>"#,
        // 任意绝对地址
        r#"(?i)(https?://[^\s"'<>]+\.(?:mp4|m3u8)(?:\?[^\s"'<>]*)?)"#,
        // 协议相对地址
        r#"(?i)(//[^\s"'<>]+\.(?:mp4|m3u8)(?:\?[^\s"'<>]*)?)"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("视频正则无效"))
    .collect()
});

/// SPA 壳页面的典型挂载点
static SPA_MOUNT_POINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<div[^>]+id=["'](?:app|root)["']"#).expect("SPA正则无效")
});

/// 页面扫描命中结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    /// 规范化后的绝对视频地址
    pub url: String,

    /// 命中规则的序号 (0 为最高优先级)
    pub pattern_index: usize,
}

/// 是否为视频直链 (http/https + .mp4/.m3u8,可带查询串,大小写不敏感)
pub fn is_direct_video_url(url: &str) -> bool {
    DIRECT_VIDEO_URL.is_match(url.trim())
}

/// 按优先级扫描文本,返回第一个可接受的视频地址
///
/// 每条规则的候选依次经过反转义和规范化,
/// 规范化失败的候选跳过,继续尝试同一规则的下一个匹配,再尝试下一条规则。
pub fn find_video_url(text: &str, base_url: Option<&str>) -> Option<PatternMatch> {
    if text.is_empty() {
        return None;
    }

    for (pattern_index, pattern) in VIDEO_URL_PATTERNS.iter().enumerate() {
        for captures in pattern.captures_iter(text) {
            let Some(raw) = captures.get(1) else {
                continue;
            };
            let candidate = unescape_url_candidate(raw.as_str());
            let candidate = candidate.trim_end_matches('\\');
            if let Some(url) = normalize_url(candidate, base_url) {
                return Some(PatternMatch { url, pattern_index });
            }
        }
    }
    None
}

/// 提取页面中的 JS 跳转目标
///
/// 结果已规范化为绝对地址,去重且保持出现顺序。
pub fn extract_follow_up_urls(html: &str, base_url: Option<&str>) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for captures in JS_LOCATION.captures_iter(html) {
        let Some(raw) = captures.get(1) else {
            continue;
        };
        let candidate = unescape_url_candidate(raw.as_str());
        if let Some(url) = normalize_url(&candidate, base_url) {
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
    }
    urls
}

/// 粗略判断是否为尚未渲染的 SPA 壳页面
///
/// 仅用于诊断日志,不影响提取结果。
pub fn looks_like_spa_shell(html: &str) -> bool {
    let lower = html.to_ascii_lowercase();
    let has_video_hint =
        lower.contains("<video") || lower.contains(".mp4") || lower.contains(".m3u8");
    SPA_MOUNT_POINT.is_match(html) && lower.matches("<script").count() >= 2 && !has_video_hint
}

/// 响应体是否值得扫描 (按 Content-Type 判断)
///
/// 未声明类型时也扫描,交给正则决定。
pub fn is_textual_content_type(content_type: Option<&str>) -> bool {
    let Some(ct) = content_type else {
        return true;
    };
    let ct = ct.to_ascii_lowercase();
    ct.is_empty()
        || ct.starts_with("text/")
        || ct.contains("json")
        || ct.contains("javascript")
        || ct.contains("xml")
}
