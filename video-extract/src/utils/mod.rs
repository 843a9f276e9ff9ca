pub mod logger;
pub mod url_utils;
pub mod video_patterns;
