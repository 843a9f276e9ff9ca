use serde::Serialize;
use std::fmt;

/// 视频提取状态
///
/// 状态转换流程:
/// ```text
/// SKIPPED (缺少图片,不做任何尝试)
///
/// RUNNING ──┬──> SUCCESS
///           ├──> UNSUPPORTED          (二维码内容不是URL)
///           ├──> NEED_DYNAMIC_RENDER  (渲染后仍无结果,但目标页面真实存在)
///           └──> FAILED               (无任何可用信号)
/// ```
/// 右侧四个状态均为终态。没有重试状态,重试由调用方重新发起整条流程。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractStatus {
    /// 跳过 (缺少二维码图片)
    Skipped,

    /// 提取中
    Running,

    /// 提取成功
    Success,

    /// 需要动态渲染/平台专用规则 (通用手段无法提取)
    NeedDynamicRender,

    /// 不支持 (二维码内容不是URL)
    Unsupported,

    /// 提取失败
    Failed,
}

impl ExtractStatus {
    /// 持久化使用的状态名
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractStatus::Skipped => "SKIPPED",
            ExtractStatus::Running => "RUNNING",
            ExtractStatus::Success => "SUCCESS",
            ExtractStatus::NeedDynamicRender => "NEED_DYNAMIC_RENDER",
            ExtractStatus::Unsupported => "UNSUPPORTED",
            ExtractStatus::Failed => "FAILED",
        }
    }

    /// 是否为终态
    ///
    /// 只有 `RUNNING` 不是终态。
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExtractStatus::Running)
    }

    /// 是否为失败类终态 (可参与结果排序)
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ExtractStatus::NeedDynamicRender | ExtractStatus::Unsupported | ExtractStatus::Failed
        )
    }

    /// 检查状态转换是否合法
    ///
    /// 合法路径只有两段:
    /// - 初始 → `SKIPPED` / `RUNNING` (由 `is_initial` 判断)
    /// - `RUNNING` → 四个终态之一
    pub fn can_transition_to(&self, next: ExtractStatus) -> bool {
        match self {
            ExtractStatus::Running => matches!(
                next,
                ExtractStatus::Success
                    | ExtractStatus::Unsupported
                    | ExtractStatus::NeedDynamicRender
                    | ExtractStatus::Failed
            ),
            _ => false,
        }
    }

    /// 是否可以作为一次提取的起始状态
    pub fn is_initial(&self) -> bool {
        matches!(self, ExtractStatus::Skipped | ExtractStatus::Running)
    }
}

impl fmt::Display for ExtractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 视频提取结果
///
/// 整条流程唯一的输出类型。字段私有,只能通过具名构造函数创建,
/// 因此 `video_url` 有值当且仅当 `status == SUCCESS`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    status: ExtractStatus,

    /// 视频直链 (mp4/m3u8)
    #[serde(skip_serializing_if = "Option::is_none")]
    video_url: Option<String>,

    /// 最终检查的页面地址,用于后续补充平台规则
    #[serde(skip_serializing_if = "Option::is_none")]
    target_url: Option<String>,

    /// 提取说明/失败原因
    message: String,
}

impl ExtractionResult {
    /// 提取成功
    pub fn success(
        video_url: impl Into<String>,
        target_url: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status: ExtractStatus::Success,
            video_url: Some(video_url.into()),
            target_url: Some(target_url.into()),
            message: message.into(),
        }
    }

    /// 缺少二维码图片
    pub fn skipped(message: impl Into<String>) -> Self {
        Self::without_video(ExtractStatus::Skipped, None, message)
    }

    /// 提取已开始 (仅用于进度通知)
    pub fn running(message: impl Into<String>) -> Self {
        Self::without_video(ExtractStatus::Running, None, message)
    }

    /// 二维码内容不是URL
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::without_video(ExtractStatus::Unsupported, None, message)
    }

    /// 无任何可用信号
    pub fn failed(target_url: Option<String>, message: impl Into<String>) -> Self {
        Self::without_video(ExtractStatus::Failed, target_url, message)
    }

    /// 目标页面存在,但需要平台专用规则
    pub fn need_dynamic_render(target_url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::without_video(
            ExtractStatus::NeedDynamicRender,
            Some(target_url.into()),
            message,
        )
    }

    /// 按状态构造失败类结果
    ///
    /// 传入 `SUCCESS` 时降级为 `FAILED`,保证不变量不被破坏。
    pub fn failure(
        status: ExtractStatus,
        target_url: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        let status = if status == ExtractStatus::Success {
            ExtractStatus::Failed
        } else {
            status
        };
        Self::without_video(status, target_url, message)
    }

    fn without_video(
        status: ExtractStatus,
        target_url: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            video_url: None,
            target_url,
            message: message.into(),
        }
    }

    pub fn status(&self) -> ExtractStatus {
        self.status
    }

    pub fn video_url(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    pub fn target_url(&self) -> Option<&str> {
        self.target_url.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_success(&self) -> bool {
        self.status == ExtractStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_carries_video_url() {
        let result = ExtractionResult::success(
            "https://cdn.a.com/v.mp4",
            "https://a.com/p",
            "页面提取成功",
        );
        assert!(result.is_success());
        assert_eq!(result.video_url(), Some("https://cdn.a.com/v.mp4"));
        assert_eq!(result.target_url(), Some("https://a.com/p"));
    }

    #[test]
    fn test_failure_never_carries_video_url() {
        for status in [
            ExtractStatus::Skipped,
            ExtractStatus::Running,
            ExtractStatus::NeedDynamicRender,
            ExtractStatus::Unsupported,
            ExtractStatus::Failed,
        ] {
            let result = ExtractionResult::failure(status, None, "x");
            assert_eq!(result.status(), status);
            assert!(result.video_url().is_none());
        }
    }

    #[test]
    fn test_failure_with_success_status_is_downgraded() {
        let result = ExtractionResult::failure(ExtractStatus::Success, None, "x");
        assert_eq!(result.status(), ExtractStatus::Failed);
        assert!(result.video_url().is_none());
    }

    #[test]
    fn test_running_transitions() {
        let running = ExtractStatus::Running;
        assert!(!running.is_terminal());
        assert!(running.can_transition_to(ExtractStatus::Success));
        assert!(running.can_transition_to(ExtractStatus::NeedDynamicRender));
        assert!(!running.can_transition_to(ExtractStatus::Skipped));
        assert!(!running.can_transition_to(ExtractStatus::Running));
    }

    #[test]
    fn test_terminal_states_have_no_exit() {
        for status in [
            ExtractStatus::Skipped,
            ExtractStatus::Success,
            ExtractStatus::NeedDynamicRender,
            ExtractStatus::Unsupported,
            ExtractStatus::Failed,
        ] {
            assert!(status.is_terminal());
            assert!(!status.can_transition_to(ExtractStatus::Running));
            assert!(!status.can_transition_to(ExtractStatus::Success));
        }
    }

    #[test]
    fn test_serialization_uses_catalog_names() {
        let result = ExtractionResult::need_dynamic_render("https://a.com/#/x", "渲染后仍未找到视频URL");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "NEED_DYNAMIC_RENDER");
        assert_eq!(json["targetUrl"], "https://a.com/#/x");
        assert!(json.get("videoUrl").is_none());
    }
}
