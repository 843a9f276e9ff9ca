use std::env;
use std::time::Duration;

use super::errors::ConfigError;

/// 默认 User-Agent
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36";

/// fwmall 商品详情 API 模板 (H5 为 SPA,需直接调用数据接口)
pub const DEFAULT_FWMALL_API_TEMPLATE: &str =
    "https://v2.fwmall.com.cn/api/wxmall/goods/goodsDetail?productId={id}";

/// 虎城烟花视频列表 API 模板
pub const DEFAULT_HUCHENG_API_TEMPLATE: &str =
    "https://htglhy.huchengfireworks.com/addons/shopro/goods.goods/video_list?id={id}";

/// 提取器配置
///
/// 所有网络操作都带显式超时,没有任何无界等待。
/// 默认值即生产环境取值,`from_env` 仅覆盖设置了的环境变量。
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// 二维码图片下载超时
    pub image_timeout: Duration,

    /// 平台API请求超时
    pub http_timeout: Duration,

    /// 视频地址 HEAD 探测超时
    pub probe_timeout: Duration,

    /// 是否对页面扫描得到的视频地址做 HEAD 探测
    pub probe_enabled: bool,

    /// 第一阶段等待: 页面加载及其前后执行的脚本
    pub js_wait: Duration,

    /// 第二阶段等待: 定时器、异步请求等后台任务
    pub background_js_wait: Duration,

    /// 最多跟随的 JS 跳转页面数
    pub max_follow_ups: usize,

    /// HTTP 请求 User-Agent
    pub user_agent: String,

    /// Chromium 可执行文件路径 (为空时自动探测)
    pub chrome_path: Option<String>,

    /// fwmall API 模板,`{id}` 为商品ID占位符
    pub fwmall_api_template: String,

    /// 虎城 API 模板,`{id}` 为商品ID占位符
    pub hucheng_api_template: String,

    /// 后台提取并发数
    pub worker_concurrency: usize,

    /// 后台提取排队上限
    pub worker_queue_capacity: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            image_timeout: Duration::from_millis(10_000),
            http_timeout: Duration::from_millis(10_000),
            probe_timeout: Duration::from_millis(5_000),
            probe_enabled: true,
            js_wait: Duration::from_millis(8_000),
            background_js_wait: Duration::from_millis(3_000),
            max_follow_ups: 2,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            chrome_path: None,
            fwmall_api_template: DEFAULT_FWMALL_API_TEMPLATE.to_string(),
            hucheng_api_template: DEFAULT_HUCHENG_API_TEMPLATE.to_string(),
            worker_concurrency: 4,
            worker_queue_capacity: 200,
        }
    }
}

impl ExtractorConfig {
    /// 从 .env 文件和环境变量加载配置
    ///
    /// 读取环境变量 (均可选):
    /// - VIDEO_EXTRACT_IMAGE_TIMEOUT_MS / HTTP_TIMEOUT_MS / PROBE_TIMEOUT_MS
    /// - VIDEO_EXTRACT_PROBE_ENABLED (true/false)
    /// - VIDEO_EXTRACT_JS_WAIT_MS / BACKGROUND_JS_WAIT_MS
    /// - VIDEO_EXTRACT_MAX_FOLLOW_UPS
    /// - VIDEO_EXTRACT_USER_AGENT / CHROME_PATH
    /// - VIDEO_EXTRACT_FWMALL_API_TEMPLATE / HUCHENG_API_TEMPLATE
    /// - VIDEO_EXTRACT_WORKER_CONCURRENCY / WORKER_QUEUE_CAPACITY
    pub fn from_env() -> Result<Self, ConfigError> {
        // .env 不存在是正常情况
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源加载配置
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |name: &str| {
            lookup(&format!("VIDEO_EXTRACT_{}", name))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = get("IMAGE_TIMEOUT_MS") {
            config.image_timeout = parse_millis("VIDEO_EXTRACT_IMAGE_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = get("HTTP_TIMEOUT_MS") {
            config.http_timeout = parse_millis("VIDEO_EXTRACT_HTTP_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = get("PROBE_TIMEOUT_MS") {
            config.probe_timeout = parse_millis("VIDEO_EXTRACT_PROBE_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = get("PROBE_ENABLED") {
            config.probe_enabled = parse_bool("VIDEO_EXTRACT_PROBE_ENABLED", &v)?;
        }
        if let Some(v) = get("JS_WAIT_MS") {
            config.js_wait = parse_millis("VIDEO_EXTRACT_JS_WAIT_MS", &v)?;
        }
        if let Some(v) = get("BACKGROUND_JS_WAIT_MS") {
            config.background_js_wait = parse_millis("VIDEO_EXTRACT_BACKGROUND_JS_WAIT_MS", &v)?;
        }
        if let Some(v) = get("MAX_FOLLOW_UPS") {
            config.max_follow_ups = parse_usize("VIDEO_EXTRACT_MAX_FOLLOW_UPS", &v)?;
        }
        if let Some(v) = get("USER_AGENT") {
            config.user_agent = v;
        }
        if let Some(v) = get("CHROME_PATH") {
            config.chrome_path = Some(v);
        }
        if let Some(v) = get("FWMALL_API_TEMPLATE") {
            config.fwmall_api_template = parse_template(&v)?;
        }
        if let Some(v) = get("HUCHENG_API_TEMPLATE") {
            config.hucheng_api_template = parse_template(&v)?;
        }
        if let Some(v) = get("WORKER_CONCURRENCY") {
            config.worker_concurrency = parse_usize("VIDEO_EXTRACT_WORKER_CONCURRENCY", &v)?.max(1);
        }
        if let Some(v) = get("WORKER_QUEUE_CAPACITY") {
            config.worker_queue_capacity =
                parse_usize("VIDEO_EXTRACT_WORKER_QUEUE_CAPACITY", &v)?.max(1);
        }

        tracing::debug!(
            http_timeout_ms = config.http_timeout.as_millis() as u64,
            js_wait_ms = config.js_wait.as_millis() as u64,
            probe_enabled = config.probe_enabled,
            chrome_path = ?config.chrome_path,
            "Extractor config loaded"
        );

        Ok(config)
    }

    /// 设置 HTTP 超时 (构建器模式)
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// 设置图片下载超时 (构建器模式)
    pub fn with_image_timeout(mut self, timeout: Duration) -> Self {
        self.image_timeout = timeout;
        self
    }

    /// 开关 HEAD 探测 (构建器模式)
    pub fn with_probe(mut self, enabled: bool) -> Self {
        self.probe_enabled = enabled;
        self
    }

    /// 设置两阶段等待时长 (构建器模式)
    pub fn with_js_waits(mut self, js_wait: Duration, background_js_wait: Duration) -> Self {
        self.js_wait = js_wait;
        self.background_js_wait = background_js_wait;
        self
    }

    /// 设置平台 API 模板 (构建器模式)
    pub fn with_api_templates(
        mut self,
        fwmall: impl Into<String>,
        hucheng: impl Into<String>,
    ) -> Self {
        self.fwmall_api_template = fwmall.into();
        self.hucheng_api_template = hucheng.into();
        self
    }

    /// 单次页面渲染的总上限
    ///
    /// 两阶段等待之外再留出启动浏览器和读取DOM的余量。
    pub fn render_ceiling(&self) -> Duration {
        self.js_wait + self.background_js_wait + self.http_timeout
    }
}

fn parse_millis(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| invalid(key, value))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| invalid(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn parse_template(value: &str) -> Result<String, ConfigError> {
    if value.contains("{id}") {
        Ok(value.to_string())
    } else {
        Err(ConfigError::InvalidTemplate(value.to_string()))
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
