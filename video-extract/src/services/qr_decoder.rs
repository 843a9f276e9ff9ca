//! 二维码解码
//!
//! 商品图片来自手机拍摄、截图、二次压缩,质量参差不齐。
//! 解码按以下顺序尝试,任一组合得到结果即停止:
//!
//! ```text
//! 原图 / 放大图 (最长边 < 640px 时,最近邻 ×2 或 ×3)
//!   └─ 局部均值二值化 / Otsu 全局二值化
//!        ├─ 多码识别 (全部检测到的二维码)
//!        └─ 单码兜底 (反色图、中心裁剪)
//! ```
//!
//! 解码永不失败: 图片损坏或没有二维码时返回空列表。

use image::imageops::{self, FilterType};
use image::GrayImage;
use tracing::{debug, warn};

/// 小于该尺寸的图片会被放大后再识别
const UPSCALE_BELOW: u32 = 640;

/// 小于该尺寸时放大 3 倍,否则 2 倍
const TRIPLE_BELOW: u32 = 320;

/// 局部均值阈值偏移 (灰度级)
const ADAPTIVE_OFFSET: i64 = 7;

/// 二值化方法,按顺序尝试
const BINARIZERS: [(&str, fn(&GrayImage) -> Bitmap); 2] =
    [("adaptive", adaptive_binarize), ("otsu", otsu_binarize)];

/// 二值化位图,`true` 表示深色模块
struct Bitmap {
    width: usize,
    height: usize,
    dark: Vec<bool>,
}

impl Bitmap {
    fn get(&self, x: usize, y: usize) -> bool {
        self.dark[y * self.width + x]
    }

    fn inverted(&self) -> Bitmap {
        Bitmap {
            width: self.width,
            height: self.height,
            dark: self.dark.iter().map(|d| !d).collect(),
        }
    }

    /// 保留中间 60% 区域
    fn center_crop(&self) -> Option<Bitmap> {
        let x0 = self.width / 5;
        let y0 = self.height / 5;
        let width = self.width.saturating_sub(2 * x0);
        let height = self.height.saturating_sub(2 * y0);
        if width < 21 || height < 21 {
            return None;
        }

        let mut dark = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                dark.push(self.get(x + x0, y + y0));
            }
        }
        Some(Bitmap { width, height, dark })
    }
}

/// 解码图片中的全部二维码
///
/// 返回去除首尾空白、去空、去重且保持识别顺序的内容列表。
pub fn decode(bytes: &[u8]) -> Vec<String> {
    if bytes.is_empty() {
        return Vec::new();
    }

    let luma = match image::load_from_memory(bytes) {
        Ok(img) => img.to_luma8(),
        Err(e) => {
            warn!(error = %e, size = bytes.len(), "图片无法解码");
            return Vec::new();
        }
    };

    if luma.width() == 0 || luma.height() == 0 {
        return Vec::new();
    }

    for (variant, image) in candidate_images(luma).iter().enumerate() {
        for (method, binarize) in BINARIZERS {
            let payloads = decode_bitmap(&binarize(image));
            if !payloads.is_empty() {
                debug!(
                    variant = variant,
                    method = method,
                    count = payloads.len(),
                    "二维码识别成功"
                );
                return payloads;
            }
        }
    }

    debug!("所有识别组合均未找到二维码");
    Vec::new()
}

/// 在阻塞线程池中解码,避免占用异步执行器
///
/// 解码线程异常时按"未识别到二维码"处理。
pub async fn decode_async(bytes: Vec<u8>) -> Vec<String> {
    match tokio::task::spawn_blocking(move || decode(&bytes)).await {
        Ok(payloads) => payloads,
        Err(e) => {
            warn!(error = %e, "二维码解码线程异常");
            Vec::new()
        }
    }
}

fn candidate_images(luma: GrayImage) -> Vec<GrayImage> {
    let (w, h) = luma.dimensions();
    let longest = w.max(h);

    if longest >= UPSCALE_BELOW {
        return vec![luma];
    }

    let factor = if longest < TRIPLE_BELOW { 3 } else { 2 };
    let upscaled = imageops::resize(&luma, w * factor, h * factor, FilterType::Nearest);
    vec![luma, upscaled]
}

fn decode_bitmap(bitmap: &Bitmap) -> Vec<String> {
    let payloads = decode_all(bitmap);
    if !payloads.is_empty() {
        return payloads;
    }

    if let Some(payload) = decode_first(&bitmap.inverted()) {
        return vec![payload];
    }

    bitmap
        .center_crop()
        .and_then(|crop| decode_first(&crop))
        .map(|payload| vec![payload])
        .unwrap_or_default()
}

/// 多码识别: 解码所有检测到的二维码
fn decode_all(bitmap: &Bitmap) -> Vec<String> {
    let mut prepared =
        rqrr::PreparedImage::prepare_from_bitmap(bitmap.width, bitmap.height, |x, y| bitmap.get(x, y));
    let mut payloads: Vec<String> = Vec::new();

    for grid in prepared.detect_grids() {
        match grid.decode() {
            Ok((_, content)) => {
                let content = content.trim();
                if !content.is_empty() && !payloads.iter().any(|p| p == content) {
                    payloads.push(content.to_string());
                }
            }
            Err(e) => debug!(error = %e, "二维码区域解码失败"),
        }
    }
    payloads
}

/// 单码识别: 返回第一个可解码的二维码
fn decode_first(bitmap: &Bitmap) -> Option<String> {
    let mut prepared =
        rqrr::PreparedImage::prepare_from_bitmap(bitmap.width, bitmap.height, |x, y| bitmap.get(x, y));
    prepared
        .detect_grids()
        .into_iter()
        .filter_map(|grid| grid.decode().ok())
        .map(|(_, content)| content.trim().to_string())
        .find(|content| !content.is_empty())
}

/// 局部均值二值化
///
/// 用积分图计算邻域均值,比全局阈值更能抵抗光照不均。
fn adaptive_binarize(image: &GrayImage) -> Bitmap {
    let (w, h) = (image.width() as usize, image.height() as usize);
    let radius = (w.max(h) / 16).clamp(4, 40);

    // (w+1) x (h+1) 积分图,首行首列为 0
    let stride = w + 1;
    let mut integral = vec![0u64; stride * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0u64;
        for x in 0..w {
            row_sum += u64::from(image.get_pixel(x as u32, y as u32)[0]);
            integral[(y + 1) * stride + (x + 1)] = integral[y * stride + (x + 1)] + row_sum;
        }
    }

    let mut dark = Vec::with_capacity(w * h);
    for y in 0..h {
        let y0 = y.saturating_sub(radius);
        let y1 = (y + radius + 1).min(h);
        for x in 0..w {
            let x0 = x.saturating_sub(radius);
            let x1 = (x + radius + 1).min(w);

            let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
                - integral[y0 * stride + x1]
                - integral[y1 * stride + x0];
            let count = ((x1 - x0) * (y1 - y0)) as i64;
            let pixel = i64::from(image.get_pixel(x as u32, y as u32)[0]);

            dark.push(pixel * count < sum as i64 - ADAPTIVE_OFFSET * count);
        }
    }

    Bitmap {
        width: w,
        height: h,
        dark,
    }
}

/// Otsu 全局二值化
fn otsu_binarize(image: &GrayImage) -> Bitmap {
    let threshold = otsu_threshold(image);
    Bitmap {
        width: image.width() as usize,
        height: image.height() as usize,
        dark: image.pixels().map(|p| p[0] <= threshold).collect(),
    }
}

fn otsu_threshold(image: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in image.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    let weighted_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, count)| level as f64 * *count as f64)
        .sum();

    let mut background_weight = 0u64;
    let mut background_sum = 0f64;
    let mut best_threshold = 127u8;
    let mut best_variance = 0f64;

    for (level, count) in histogram.iter().enumerate() {
        background_weight += count;
        if background_weight == 0 {
            continue;
        }
        let foreground_weight = total - background_weight;
        if foreground_weight == 0 {
            break;
        }

        background_sum += level as f64 * *count as f64;
        let background_mean = background_sum / background_weight as f64;
        let foreground_mean = (weighted_total - background_sum) / foreground_weight as f64;
        let diff = background_mean - foreground_mean;
        let variance = background_weight as f64 * foreground_weight as f64 * diff * diff;

        if variance > best_variance {
            best_variance = variance;
            best_threshold = level as u8;
        }
    }
    best_threshold
}
