use qr_video_extract::models::{ExtractStatus, ExtractionResult};

// ============================================================================
// 状态目录
// ============================================================================

#[test]
fn test_状态名与持久化值一致() {
    let expected = [
        (ExtractStatus::Skipped, "SKIPPED"),
        (ExtractStatus::Running, "RUNNING"),
        (ExtractStatus::Success, "SUCCESS"),
        (ExtractStatus::NeedDynamicRender, "NEED_DYNAMIC_RENDER"),
        (ExtractStatus::Unsupported, "UNSUPPORTED"),
        (ExtractStatus::Failed, "FAILED"),
    ];

    for (status, name) in expected {
        assert_eq!(status.as_str(), name);
        assert_eq!(status.to_string(), name);
        assert_eq!(serde_json::to_value(status).unwrap(), name);
    }
}

#[test]
fn test_只有running可以转入终态() {
    let all = [
        ExtractStatus::Skipped,
        ExtractStatus::Running,
        ExtractStatus::Success,
        ExtractStatus::NeedDynamicRender,
        ExtractStatus::Unsupported,
        ExtractStatus::Failed,
    ];

    for from in all {
        for to in all {
            let expected = from == ExtractStatus::Running
                && to != ExtractStatus::Running
                && to != ExtractStatus::Skipped;
            assert_eq!(from.can_transition_to(to), expected, "{} -> {}", from, to);
        }
    }
}

#[test]
fn test_起始状态() {
    assert!(ExtractStatus::Skipped.is_initial());
    assert!(ExtractStatus::Running.is_initial());
    assert!(!ExtractStatus::Success.is_initial());
    assert!(!ExtractStatus::Failed.is_initial());
}

#[test]
fn test_失败类状态() {
    assert!(ExtractStatus::NeedDynamicRender.is_failure());
    assert!(ExtractStatus::Unsupported.is_failure());
    assert!(ExtractStatus::Failed.is_failure());
    assert!(!ExtractStatus::Success.is_failure());
    assert!(!ExtractStatus::Skipped.is_failure());
}

// ============================================================================
// video_url 与 SUCCESS 的不变量
// ============================================================================

#[test]
fn test_所有构造函数都满足不变量() {
    let results = vec![
        ExtractionResult::success("https://cdn.a.com/v.mp4", "https://a.com/p", "渲染提取成功"),
        ExtractionResult::skipped("缺少二维码图片"),
        ExtractionResult::running("开始解析"),
        ExtractionResult::unsupported("二维码内容不是可访问的URL"),
        ExtractionResult::failed(None, "未识别到二维码"),
        ExtractionResult::need_dynamic_render("https://a.com/p", "渲染后仍未找到视频URL"),
        ExtractionResult::failure(ExtractStatus::Success, None, "x"),
    ];

    for result in results {
        assert_eq!(
            result.video_url().is_some(),
            result.status() == ExtractStatus::Success,
            "{:?}",
            result
        );
        assert!(!result.message().is_empty());
    }
}

#[test]
fn test_序列化为驼峰字段() {
    let result = ExtractionResult::success("https://cdn.a.com/v.mp4", "https://a.com/p", "fwmall API提取成功");
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["status"], "SUCCESS");
    assert_eq!(json["videoUrl"], "https://cdn.a.com/v.mp4");
    assert_eq!(json["targetUrl"], "https://a.com/p");
    assert_eq!(json["message"], "fwmall API提取成功");
}

#[test]
fn test_无目标地址时不输出该字段() {
    let json = serde_json::to_value(ExtractionResult::failed(None, "未识别到二维码")).unwrap();
    assert_eq!(json["status"], "FAILED");
    assert!(json.get("targetUrl").is_none());
    assert!(json.get("videoUrl").is_none());
}
