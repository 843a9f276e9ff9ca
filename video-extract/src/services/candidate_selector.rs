//! 候选URL筛选
//!
//! 一张商品图上可能同时印有商品码和公众号关注码,
//! 关注码几乎不可能指向视频,因此排到最后。

use crate::utils::url_utils::{is_http_url, is_weixin_url};

/// 候选URL筛选结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSelection {
    /// 有序、去重的绝对地址,非微信域名在前
    Urls(Vec<String>),

    /// 解码内容中没有任何 HTTP(S) 地址
    NoUrl,
}

/// 从解码内容中筛选候选URL
///
/// - 去首尾空白,只保留 `http://` / `https://` 开头的内容
/// - 按原字符串去重 (保留首次出现)
/// - 稳定排序: 非微信域名在前,同组内保持解码顺序
pub fn select_candidates(payloads: &[String]) -> CandidateSelection {
    let mut urls: Vec<String> = Vec::new();
    for payload in payloads {
        let payload = payload.trim();
        if is_http_url(payload) && !urls.iter().any(|u| u == payload) {
            urls.push(payload.to_string());
        }
    }

    if urls.is_empty() {
        return CandidateSelection::NoUrl;
    }

    // sort_by_key 是稳定排序
    urls.sort_by_key(|url| is_weixin_url(url));
    CandidateSelection::Urls(urls)
}
