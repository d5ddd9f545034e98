//! 单份试卷处理器 - 编排层
//!
//! 委托 `DocumentFlow` 完成一份试卷，负责日志和统计输出

use crate::utils::logging::{append_log_line, truncate_text};
use crate::workflow::{DocumentCtx, DocumentFlow, DocumentReport};
use anyhow::Result;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// 处理单份试卷
///
/// 返回写入的题目数量
pub async fn process_document(
    flow: &DocumentFlow,
    path: PathBuf,
    index: usize,
    log_file_path: &str,
) -> Result<usize> {
    let ctx = DocumentCtx::new(path, index);
    info!("{} 开始处理 {}", ctx, ctx.path.display());

    match flow.run(&ctx).await {
        Ok(report) => {
            log_document_complete(&ctx, &report);
            if let Err(e) = append_log_line(log_file_path, &summary_line(&ctx, &report)) {
                warn!("{} 写入日志文件失败: {}", ctx, e);
            }
            Ok(report.records.len())
        }
        Err(e) => {
            error!("{} ❌ 处理失败: {}", ctx, e);
            if let Err(log_err) = append_log_line(log_file_path, &format!("{} ❌ {}", ctx, e)) {
                warn!("{} 写入日志文件失败: {}", ctx, log_err);
            }
            Err(e.into())
        }
    }
}

fn summary_line(ctx: &DocumentCtx, report: &DocumentReport) -> String {
    format!(
        "{} ✅ {} 题 (选择 {} / 填空 {}), 总分 {}, 不完整 {}, 方式 {}",
        ctx,
        report.exam.total_questions,
        report.exam.multiple_choice_count,
        report.exam.fill_in_count,
        report.exam.total_points,
        report.exam.incomplete_count,
        report.method.as_str()
    )
}

fn log_document_complete(ctx: &DocumentCtx, report: &DocumentReport) {
    info!("{} {}", ctx, "─".repeat(40));
    for record in &report.records {
        info!("{}   {}", ctx, truncate_text(&record.to_string(), 80));
    }
    for (id, parts) in &report.diagnostics.parts_count {
        info!("{}   {} 共 {} 个小题", ctx, id, parts);
    }
    if let Some((expected, actual)) = report.diagnostics.points_mismatch() {
        warn!("{} ⚠️ 总分 {} 与期望 {} 不一致", ctx, actual, expected);
    }
    info!("{} {}", ctx, summary_line(ctx, report));
}
