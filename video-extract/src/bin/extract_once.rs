//! 单次提取: 命令行验证一张二维码图片能否提取到视频
//!
//! 用法:
//! ```text
//! extract_once <图片地址>
//! extract_once --page <页面地址>
//! ```
//! 结果以 JSON 输出到 stdout,日志输出到 stderr 和 ./logs。

use std::env;

use qr_video_extract::utils::logger;
use qr_video_extract::{ExtractorConfig, VideoExtractService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _guard = logger::init("logs")?;

    let args: Vec<String> = env::args().skip(1).collect();
    let (page_mode, target) = match args.as_slice() {
        [flag, url] if flag == "--page" => (true, url.clone()),
        [url] => (false, url.clone()),
        _ => {
            eprintln!("用法: extract_once <图片地址> | extract_once --page <页面地址>");
            std::process::exit(2);
        }
    };

    let config = ExtractorConfig::from_env()?;
    let service = VideoExtractService::new(config)?;

    let result = if page_mode {
        service.extract_from_page(&target).await
    } else {
        service.extract(&target).await
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
