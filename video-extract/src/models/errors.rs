use thiserror::Error;

/// 提取流程内部错误
///
/// 只在各阶段内部流转,跨越阶段边界时一律降级为 `ExtractionResult`,
/// 调用方永远看不到这个类型。
#[derive(Debug, Error)]
pub enum ExtractError {
    /// 网络请求失败
    ///
    /// 可能原因:
    /// - 网络连接中断
    /// - 目标站点不可达
    /// - DNS解析失败
    #[error("网络请求失败: {0}")]
    NetworkFailed(String),

    /// 请求超时
    #[error("请求超时: {0}")]
    Timeout(String),

    /// HTTP状态码错误
    #[error("HTTP错误 {status}: {url}")]
    HttpStatus { status: u16, url: String },

    /// 响应格式无效
    ///
    /// 平台API返回的数据结构不符合预期
    #[error("响应格式无效: {0}")]
    InvalidResponse(String),

    /// JSON解析失败
    #[error("响应数据解析失败: {0}")]
    JsonParseFailed(String),

    /// 图片无法解码
    #[error("图片解码失败: {0}")]
    ImageDecodeFailed(String),

    /// data URL 格式错误
    #[error("data URL 格式错误: {0}")]
    InvalidDataUrl(String),

    /// 浏览器操作错误
    ///
    /// Chromium 启动、CDP 通信或页面操作失败
    #[error("浏览器错误: {0}")]
    BrowserError(String),

    /// 页面导航失败
    ///
    /// 页面本身无法打开 (连接拒绝、证书错误等)
    #[error("页面导航失败: {0}")]
    NavigationFailed(String),

    /// 后台任务队列已满
    #[error("提取任务队列已满 (容量 {capacity})")]
    QueueFull { capacity: usize },

    /// 后台任务已停止接收
    #[error("提取任务已停止")]
    WorkerStopped,
}

impl ExtractError {
    /// 是否属于"页面不可达"一类
    ///
    /// 这类失败没有任何站点信息可补充,对应 `FAILED`;
    /// 其余渲染类失败对应 `NEED_DYNAMIC_RENDER`。
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            ExtractError::NetworkFailed(_)
                | ExtractError::HttpStatus { .. }
                | ExtractError::NavigationFailed(_)
        )
    }
}

/// 实现从reqwest::Error到ExtractError的转换
impl From<reqwest::Error> for ExtractError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExtractError::Timeout(
                err.url()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "请求超时".to_string()),
            )
        } else if err.is_connect() {
            ExtractError::NetworkFailed("无法连接到服务器".to_string())
        } else if let Some(status) = err.status() {
            ExtractError::HttpStatus {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            ExtractError::NetworkFailed(err.to_string())
        }
    }
}

/// 实现从serde_json::Error到ExtractError的转换
impl From<serde_json::Error> for ExtractError {
    fn from(err: serde_json::Error) -> Self {
        ExtractError::JsonParseFailed(err.to_string())
    }
}

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量取值无效
    #[error("配置项 {key} 取值无效: {value}")]
    InvalidValue { key: String, value: String },

    /// API 模板缺少 `{id}` 占位符
    #[error("API模板缺少 {{id}} 占位符: {0}")]
    InvalidTemplate(String),
}
