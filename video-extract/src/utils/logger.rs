use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 初始化日志系统
///
/// - JSON格式文件层: 按天轮转,便于检索单条提取记录
/// - 控制台层: 人类可读格式
/// - 环境变量控制: RUST_LOG=debug 可调整日志级别
///
/// # 示例日志
/// ```json
/// {
///   "timestamp": "2025-10-05T10:30:45.123Z",
///   "level": "INFO",
///   "target": "qr_video_extract::services::strategy_pipeline",
///   "fields": {
///     "event_type": "CandidateExtracted",
///     "candidate": "https://a.com/p/1",
///     "status": "SUCCESS"
///   }
/// }
/// ```
///
/// 返回的guard必须被调用者保存,直到进程退出,
/// 否则文件写入器会被立即关闭。
pub fn init(log_dir: impl AsRef<Path>) -> Result<WorkerGuard, io::Error> {
    let log_dir = log_dir.as_ref();
    std::fs::create_dir_all(log_dir)?;

    // 文件命名格式: qr-video-extract.2025-10-05.log
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("qr-video-extract")
        .filename_suffix("log")
        .build(log_dir)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false);

    // 输出到stderr,stdout留给命令行的JSON结果
    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(true);

    // 重复初始化(例如测试中)不视为错误
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    Ok(guard)
}

/// 日志宏辅助模块
///
/// 提供结构化日志的便捷宏
pub mod macros {
    /// 记录业务事件
    ///
    /// 使用示例:
    /// ```no_run
    /// use qr_video_extract::log_event;
    /// log_event!(
    ///     "QrCodesDecoded",
    ///     count = 2usize,
    ///     first = "https://a.com/p/1"
    /// );
    /// ```
    #[macro_export]
    macro_rules! log_event {
        ($event_type:expr, $($field:tt = $value:expr),* $(,)?) => {
            tracing::info!(
                event_type = $event_type,
                $($field = $value),*
            );
        };
    }

    /// 记录错误事件
    ///
    /// 使用示例:
    /// ```no_run
    /// use qr_video_extract::log_error;
    /// log_error!(
    ///     "RenderFailed",
    ///     target = "https://a.com/p/1",
    ///     error = "navigation timeout"
    /// );
    /// ```
    #[macro_export]
    macro_rules! log_error {
        ($event_type:expr, $($field:tt = $value:expr),* $(,)?) => {
            tracing::error!(
                event_type = $event_type,
                $($field = $value),*
            );
        };
    }
}
