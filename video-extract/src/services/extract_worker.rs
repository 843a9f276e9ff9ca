//! 后台提取任务
//!
//! 商品保存后在后台解析视频,不阻塞请求路径。
//! 队列有界,排满时直接拒绝;并发数由信号量限制。
//! 结果写入由调用方实现的 [`ExtractionSink`] 负责。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{ExtractError, ExtractStatus, ExtractionResult, ExtractorConfig};
use crate::services::video_extract_service::VideoExtractService;
use crate::{log_error, log_event};

/// 一次后台提取请求
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionJob {
    pub id: Uuid,
    pub product_id: i64,
    pub source_image_url: String,

    /// 为 true 时,非成功结果也会清空已有视频地址
    pub reset_video_url: bool,

    pub submitted_at: DateTime<Utc>,
}

impl ExtractionJob {
    pub fn new(product_id: i64, source_image_url: impl Into<String>, reset_video_url: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            source_image_url: source_image_url.into(),
            reset_video_url,
            submitted_at: Utc::now(),
        }
    }
}

/// 写回商品记录的一次状态更新
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionUpdate {
    pub job_id: Uuid,
    pub product_id: i64,
    pub status: ExtractStatus,

    /// 仅 SUCCESS 时有值
    pub video_url: Option<String>,

    pub message: String,
    pub target_url: Option<String>,

    /// 是否写入 `video_url` 字段 (为空时即清空)
    pub overwrite_video_url: bool,
}

impl ExtractionUpdate {
    fn from_result(job: &ExtractionJob, result: &ExtractionResult) -> Self {
        let status = result.status();
        Self {
            job_id: job.id,
            product_id: job.product_id,
            status,
            video_url: result.video_url().map(str::to_string),
            message: result.message().to_string(),
            target_url: result.target_url().map(str::to_string),
            overwrite_video_url: status == ExtractStatus::Success || job.reset_video_url,
        }
    }
}

/// 提取状态的持久化出口
#[async_trait]
pub trait ExtractionSink: Send + Sync {
    async fn record(&self, update: ExtractionUpdate);
}

/// 后台提取任务池
pub struct ExtractionWorker {
    sender: mpsc::Sender<ExtractionJob>,
    capacity: usize,
    cancel: CancellationToken,
    dispatcher: JoinHandle<()>,
}

impl ExtractionWorker {
    /// 启动任务池
    ///
    /// - `concurrency`: 同时执行的提取数 (至少 1)
    /// - `capacity`: 排队上限 (至少 1)
    pub fn spawn(
        service: Arc<VideoExtractService>,
        sink: Arc<dyn ExtractionSink>,
        concurrency: usize,
        capacity: usize,
    ) -> Self {
        let concurrency = concurrency.max(1);
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let cancel = CancellationToken::new();

        let dispatcher = tokio::spawn(dispatch(
            receiver,
            service,
            sink,
            concurrency,
            cancel.clone(),
        ));

        info!(concurrency = concurrency, capacity = capacity, "后台提取任务池已启动");
        Self {
            sender,
            capacity,
            cancel,
            dispatcher,
        }
    }

    /// 按配置中的并发数和排队上限启动任务池
    pub fn from_config(
        service: Arc<VideoExtractService>,
        sink: Arc<dyn ExtractionSink>,
        config: &ExtractorConfig,
    ) -> Self {
        Self::spawn(
            service,
            sink,
            config.worker_concurrency,
            config.worker_queue_capacity,
        )
    }

    /// 提交任务,队列已满时立即返回错误
    pub fn submit(&self, job: ExtractionJob) -> Result<Uuid, ExtractError> {
        if self.cancel.is_cancelled() {
            return Err(ExtractError::WorkerStopped);
        }

        let job_id = job.id;
        let product_id = job.product_id;
        match self.sender.try_send(job) {
            Ok(()) => {
                debug!(job_id = %job_id, product_id = product_id, "提取任务已入队");
                Ok(job_id)
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(product_id = product_id, capacity = self.capacity, "提取任务队列已满");
                Err(ExtractError::QueueFull {
                    capacity: self.capacity,
                })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(ExtractError::WorkerStopped),
        }
    }

    /// 停止接收新任务 (不等待)
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// 停止接收新任务,等待执行中的任务完成
    ///
    /// 尚在排队的任务被丢弃。
    pub async fn shutdown(self) {
        self.stop();
        if let Err(e) = self.dispatcher.await {
            warn!(error = %e, "提取任务调度器异常退出");
        }
        info!("后台提取任务池已停止");
    }
}

async fn dispatch(
    mut receiver: mpsc::Receiver<ExtractionJob>,
    service: Arc<VideoExtractService>,
    sink: Arc<dyn ExtractionSink>,
    concurrency: usize,
    cancel: CancellationToken,
) {
    let permits = Arc::new(Semaphore::new(concurrency));

    loop {
        let permit = tokio::select! {
            _ = cancel.cancelled() => break,
            permit = permits.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let job = tokio::select! {
            _ = cancel.cancelled() => break,
            job = receiver.recv() => match job {
                Some(job) => job,
                None => break,
            },
        };

        let service = service.clone();
        let sink = sink.clone();
        tokio::spawn(async move {
            process(service, sink, job).await;
            drop(permit);
        });
    }

    receiver.close();
    // 全部许可归还即表示执行中的任务都已结束
    let _ = permits.acquire_many(concurrency as u32).await;
}

async fn process(service: Arc<VideoExtractService>, sink: Arc<dyn ExtractionSink>, job: ExtractionJob) {
    if job.source_image_url.trim().is_empty() {
        let result = ExtractionResult::skipped("缺少二维码图片");
        sink.record(ExtractionUpdate::from_result(&job, &result)).await;
        return;
    }

    let running = ExtractionResult::running("开始解析");
    sink.record(ExtractionUpdate::from_result(&job, &running)).await;

    // 独立任务中执行,提取过程 panic 不影响任务池
    let source = job.source_image_url.clone();
    let result = match tokio::spawn(async move { service.extract(&source).await }).await {
        Ok(result) => result,
        Err(e) => {
            log_error!(
                "AsyncExtractionPanicked",
                job_id = job.id.to_string().as_str(),
                product_id = job.product_id,
                error = e.to_string().as_str()
            );
            ExtractionResult::failed(None, "异步解析异常")
        }
    };

    if !running.status().can_transition_to(result.status()) {
        warn!(job_id = %job.id, status = %result.status(), "提取结果状态不是合法终态");
    }

    log_event!(
        "AsyncExtractionFinished",
        job_id = job.id.to_string().as_str(),
        product_id = job.product_id,
        status = result.status().as_str(),
        queued_ms = (Utc::now() - job.submitted_at).num_milliseconds()
    );
    sink.record(ExtractionUpdate::from_result(&job, &result)).await;
}
