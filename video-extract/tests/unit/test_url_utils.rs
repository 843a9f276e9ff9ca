use qr_video_extract::utils::url_utils::{
    extract_query_param, is_http_url, normalize_url, unescape_url_candidate,
};
use qr_video_extract::utils::video_patterns::{extract_follow_up_urls, find_video_url, is_direct_video_url};

// ============================================================================
// 规范化
// ============================================================================

#[test]
fn test_normalize_绝对地址原样返回() {
    assert_eq!(
        normalize_url("https://cdn.a.com/v.mp4?x=1", Some("http://b.com")),
        Some("https://cdn.a.com/v.mp4?x=1".to_string())
    );
}

#[test]
fn test_normalize_协议相对地址() {
    assert_eq!(
        normalize_url("//cdn.a.com/v.mp4", Some("https://a.com/x")),
        Some("https://cdn.a.com/v.mp4".to_string())
    );
    assert_eq!(
        normalize_url("//cdn.a.com/v.mp4", Some("not a url")),
        Some("https://cdn.a.com/v.mp4".to_string())
    );
}

#[test]
fn test_normalize_相对路径基于页面解析() {
    assert_eq!(
        normalize_url("video/1.m3u8", Some("https://a.com/goods/detail")),
        Some("https://a.com/goods/video/1.m3u8".to_string())
    );
}

#[test]
fn test_反转义后再规范化() {
    let raw = unescape_url_candidate("\\/\\/cdn.a.com\\/v.mp4?a=1&amp;b=2");
    assert_eq!(
        normalize_url(&raw, Some("http://a.com")),
        Some("http://cdn.a.com/v.mp4?a=1&b=2".to_string())
    );
}

#[test]
fn test_is_http_url() {
    assert!(is_http_url("http://a.com"));
    assert!(is_http_url("https://a.com"));
    assert!(!is_http_url("HTTPS://A.COM"));
    assert!(!is_http_url("weixin://dl/business"));
}

// ============================================================================
// 参数提取
// ============================================================================

#[test]
fn test_参数在hash路由中() {
    assert_eq!(
        extract_query_param("https://a.com/#/pages/x?id=123", "id"),
        Some("123".to_string())
    );
}

#[test]
fn test_参数名不能是其他参数的后缀() {
    assert_eq!(extract_query_param("https://a.com/p?store_id=560", "id"), None);
}

#[test]
fn test_参数值遇到hash截断() {
    assert_eq!(
        extract_query_param("https://a.com/p?id=9#section", "id"),
        Some("9".to_string())
    );
}

// ============================================================================
// 视频地址识别
// ============================================================================

#[test]
fn test_直链判断() {
    assert!(is_direct_video_url("https://cdn.a.com/path/v.MP4"));
    assert!(is_direct_video_url("  https://cdn.a.com/live.m3u8?auth=x  "));
    assert!(!is_direct_video_url("https://cdn.a.com/v.mp4 extra"));
}

#[test]
fn test_json字段优先于裸地址() {
    let html = r#"
        <p>备用: https://cdn.a.com/backup.mp4</p>
        <script>var conf = {"video": "https://cdn.a.com/main.mp4"};</script>
    "#;
    let found = find_video_url(html, Some("https://a.com/p")).unwrap();
    assert_eq!(found.url, "https://cdn.a.com/main.mp4");
    assert!(found.pattern_index < 5);
}

#[test]
fn test_video标签优先于裸地址() {
    let html = r#"
        <a href="https://cdn.a.com/download.mp4">下载</a>
        <video controls src="https://cdn.a.com/play.mp4"></video>
    "#;
    let found = find_video_url(html, None).unwrap();
    assert_eq!(found.url, "https://cdn.a.com/play.mp4");
}

#[test]
fn test_跳转目标提取() {
    let html = r#"<script>setTimeout(function(){ window.location.href='detail.html?id=3'; }, 10)</script>"#;
    assert_eq!(
        extract_follow_up_urls(html, Some("https://a.com/r/index.html")),
        vec!["https://a.com/r/detail.html?id=3".to_string()]
    );
}
