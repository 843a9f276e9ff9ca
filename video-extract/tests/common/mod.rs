//! 测试公共模块
//!
//! 提供Mock服务和测试工具,所有测试都不访问外部网络:
//! - `MockHttpServer`: 本地 HTTP 服务,返回预置响应并统计请求次数
//! - `FakeRenderer`: 脚本化的页面渲染器
//! - `RecordingSink`: 记录后台任务写回的状态
//! - 二维码图片生成工具

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma};
use qrcode::{Color, QrCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use qr_video_extract::models::{ExtractError, ExtractorConfig};
use qr_video_extract::services::{
    ExtractionSink, ExtractionUpdate, NetworkExchange, PageRenderer, RenderedPage,
};

// ============================================================================
// Mock HTTP 服务
// ============================================================================

/// 预置响应
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl MockResponse {
    pub fn json(body: &str) -> Self {
        Self::new(200, "application/json; charset=utf-8", body.as_bytes().to_vec())
    }

    pub fn text(body: &str) -> Self {
        Self::new(200, "text/plain; charset=utf-8", body.as_bytes().to_vec())
    }

    pub fn png(bytes: Vec<u8>) -> Self {
        Self::new(200, "image/png", bytes)
    }

    pub fn status(status: u16) -> Self {
        Self::new(status, "text/plain", Vec::new())
    }

    pub fn new(status: u16, content_type: &str, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type: content_type.to_string(),
            body,
        }
    }
}

/// Mock HTTP 服务
///
/// 按 "路径+查询串" 精确匹配,其次按路径匹配,未配置的路径返回 404。
pub struct MockHttpServer {
    addr: SocketAddr,
    routes: Arc<Mutex<HashMap<String, MockResponse>>>,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl MockHttpServer {
    /// 启动服务 (监听随机端口)
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes: Arc<Mutex<HashMap<String, MockResponse>>> = Arc::new(Mutex::new(HashMap::new()));
        let hits: Arc<Mutex<HashMap<String, usize>>> = Arc::new(Mutex::new(HashMap::new()));

        let server_routes = routes.clone();
        let server_hits = hits.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let routes = server_routes.clone();
                let hits = server_hits.clone();
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 4096];
                    loop {
                        let n = match stream.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => n,
                        };
                        buf.extend_from_slice(&chunk[..n]);
                        if buf.windows(4).any(|w| w == b"\r\n\r\n") || buf.len() > 64 * 1024 {
                            break;
                        }
                    }

                    let request = String::from_utf8_lossy(&buf);
                    let mut parts = request.lines().next().unwrap_or_default().split_whitespace();
                    let method = parts.next().unwrap_or_default().to_string();
                    let target = parts.next().unwrap_or("/").to_string();
                    let path = target.split('?').next().unwrap_or("/").to_string();

                    *hits.lock().unwrap().entry(path.clone()).or_insert(0) += 1;

                    let response = {
                        let routes = routes.lock().unwrap();
                        routes
                            .get(&target)
                            .or_else(|| routes.get(&path))
                            .cloned()
                            .unwrap_or_else(|| MockResponse::status(404))
                    };

                    let head = format!(
                        "HTTP/1.1 {} Mock\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        response.status,
                        response.content_type,
                        response.body.len()
                    );
                    let _ = stream.write_all(head.as_bytes()).await;
                    if method != "HEAD" {
                        let _ = stream.write_all(&response.body).await;
                    }
                    let _ = stream.shutdown().await;
                });
            }
        });

        Self { addr, routes, hits }
    }

    /// 配置路由 (可带查询串)
    pub fn route(&self, path_and_query: &str, response: MockResponse) {
        self.routes
            .lock()
            .unwrap()
            .insert(path_and_query.to_string(), response);
    }

    /// 完整地址
    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }

    /// 某路径 (不含查询串) 被请求的次数
    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.hits.lock().unwrap().values().sum()
    }
}

// ============================================================================
// 脚本化渲染器
// ============================================================================

/// 预置渲染结果
#[derive(Debug, Clone)]
pub enum Scripted {
    Page(RenderedPage),
    /// 页面不可达
    Unreachable,
    /// 浏览器故障
    BrowserCrash,
    /// 渲染卡住,直到外层超时
    Hang,
    /// 渲染过程 panic
    Panic,
}

/// 脚本化渲染器,记录所有渲染过的地址
#[derive(Default)]
pub struct FakeRenderer {
    scripts: Mutex<HashMap<String, Scripted>>,
    rendered: Mutex<Vec<String>>,
}

impl FakeRenderer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, url: &str, scripted: Scripted) {
        self.scripts.lock().unwrap().insert(url.to_string(), scripted);
    }

    /// 预置一个正常渲染的页面
    pub fn page(&self, url: &str, html: &str, exchanges: Vec<NetworkExchange>) {
        self.script(
            url,
            Scripted::Page(RenderedPage {
                final_url: url.to_string(),
                document_status: Some(200),
                html: html.to_string(),
                exchanges,
            }),
        );
    }

    pub fn rendered(&self) -> Vec<String> {
        self.rendered.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageRenderer for FakeRenderer {
    async fn render(&self, url: &str) -> Result<RenderedPage, ExtractError> {
        self.rendered.lock().unwrap().push(url.to_string());
        let scripted = self.scripts.lock().unwrap().get(url).cloned();
        match scripted {
            Some(Scripted::Page(page)) => Ok(page),
            Some(Scripted::BrowserCrash) => Err(ExtractError::BrowserError("浏览器崩溃".to_string())),
            Some(Scripted::Panic) => panic!("渲染器内部错误: {}", url),
            Some(Scripted::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ExtractError::Timeout(url.to_string()))
            }
            Some(Scripted::Unreachable) | None => {
                Err(ExtractError::NavigationFailed(format!("net::ERR_NAME_NOT_RESOLVED {}", url)))
            }
        }
    }
}

// ============================================================================
// 后台任务结果记录
// ============================================================================

#[derive(Default)]
pub struct RecordingSink {
    updates: Mutex<Vec<ExtractionUpdate>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn updates(&self) -> Vec<ExtractionUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn updates_for(&self, product_id: i64) -> Vec<ExtractionUpdate> {
        self.updates()
            .into_iter()
            .filter(|u| u.product_id == product_id)
            .collect()
    }
}

#[async_trait]
impl ExtractionSink for RecordingSink {
    async fn record(&self, update: ExtractionUpdate) {
        self.updates.lock().unwrap().push(update);
    }
}

// ============================================================================
// 配置与二维码图片
// ============================================================================

/// 测试配置: 短超时、关闭 HEAD 探测
pub fn test_config() -> ExtractorConfig {
    ExtractorConfig::default()
        .with_http_timeout(Duration::from_secs(2))
        .with_image_timeout(Duration::from_secs(2))
        .with_js_waits(Duration::from_millis(200), Duration::from_millis(100))
        .with_probe(false)
}

/// 每个模块的像素数
const MODULE_PX: u32 = 6;

/// 静区模块数
const QUIET_ZONE: u32 = 4;

/// 把多个内容编码为横向排列的二维码,返回灰度图
pub fn qr_image(contents: &[&str]) -> GrayImage {
    let codes: Vec<QrCode> = contents
        .iter()
        .map(|c| QrCode::new(c.as_bytes()).unwrap())
        .collect();

    let sizes: Vec<u32> = codes
        .iter()
        .map(|c| (c.width() as u32 + QUIET_ZONE * 2) * MODULE_PX)
        .collect();
    let width: u32 = sizes.iter().sum::<u32>().max(1);
    let height: u32 = sizes.iter().copied().max().unwrap_or(1);

    let mut image = GrayImage::from_pixel(width, height, Luma([255]));
    let mut offset_x = 0;
    for (code, size) in codes.iter().zip(&sizes) {
        let modules = code.width() as u32;
        let colors = code.to_colors();
        for my in 0..modules {
            for mx in 0..modules {
                if colors[(my * modules + mx) as usize] != Color::Dark {
                    continue;
                }
                let x0 = offset_x + (mx + QUIET_ZONE) * MODULE_PX;
                let y0 = (my + QUIET_ZONE) * MODULE_PX;
                for dy in 0..MODULE_PX {
                    for dx in 0..MODULE_PX {
                        image.put_pixel(x0 + dx, y0 + dy, Luma([0]));
                    }
                }
            }
        }
        offset_x += size;
    }
    image
}

/// 编码为 PNG
pub fn png_bytes(image: GrayImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageLuma8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .unwrap();
    bytes
}

/// 二维码 PNG 字节
pub fn qr_png(contents: &[&str]) -> Vec<u8> {
    png_bytes(qr_image(contents))
}

/// 二维码 PNG 的 data URL
pub fn qr_data_url(contents: &[&str]) -> String {
    format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(qr_png(contents))
    )
}

/// 没有视频信息的 SPA 壳页面
pub const SPA_SHELL: &str = r#"<!DOCTYPE html><html><head><title>商品详情</title></head><body><div id="app"></div><script src="/js/chunk-vendors.js"></script><script src="/js/app.js"></script></body></html>"#;
