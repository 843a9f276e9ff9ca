//! 多个二维码的结果择优
//!
//! 所有候选都失败时,选出对后续排查最有价值的那个失败:
//! `NEED_DYNAMIC_RENDER` (页面存在,可补规则) 优先于 `FAILED`,
//! `FAILED` 优先于 `UNSUPPORTED`。

use crate::models::{ExtractStatus, ExtractionResult};

/// 在当前结果和新结果之间择优
pub fn pick_better(current: Option<ExtractionResult>, candidate: ExtractionResult) -> ExtractionResult {
    let Some(current) = current else {
        return candidate;
    };

    let replace = match (current.status(), candidate.status()) {
        (ExtractStatus::Success, _) => false,
        (_, ExtractStatus::Success) => true,
        (ExtractStatus::NeedDynamicRender, _) => false,
        (_, ExtractStatus::NeedDynamicRender) => true,
        (ExtractStatus::Unsupported, ExtractStatus::Failed) => true,
        _ => false,
    };

    if replace {
        candidate
    } else {
        current
    }
}

/// 汇总全部候选的结果
///
/// 没有任何结果时返回 `FAILED`,`target_url` 取第一个候选地址。
pub fn rank(attempts: Vec<ExtractionResult>, candidates: &[String]) -> ExtractionResult {
    attempts
        .into_iter()
        .fold(None, |best, attempt| Some(pick_better(best, attempt)))
        .unwrap_or_else(|| {
            ExtractionResult::failed(candidates.first().cloned(), "所有二维码均未提取到视频")
        })
}
