//! 记录校验与诊断统计

use crate::models::question::{QuestionKind, QuestionRecord};
use tracing::{debug, warn};

/// 一次抽取的诊断信息
///
/// 不完整记录、被丢弃的误匹配、总分不一致都只计数，由调用方决定如何报告。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// 因题干过短被丢弃的记录 id
    pub discarded: Vec<String>,
    /// 选项不足 5 个的选择题 / 没有小题的填空题
    pub incomplete: Vec<String>,
    /// 填空题 id → 小题数
    pub parts_count: Vec<(String, usize)>,
    pub total_points: u32,
    pub expected_total_points: Option<u32>,
}

impl Diagnostics {
    pub fn incomplete_count(&self) -> usize {
        self.incomplete.len()
    }

    /// `(期望, 实际)`，仅在两者不一致时返回
    pub fn points_mismatch(&self) -> Option<(u32, u32)> {
        self.expected_total_points
            .filter(|expected| *expected != self.total_points)
            .map(|expected| (expected, self.total_points))
    }
}

/// 记录校验器
#[derive(Debug, Clone)]
pub struct Validator {
    min_text_chars: usize,
    expected_total_points: Option<u32>,
}

impl Validator {
    pub fn new(min_text_chars: usize, expected_total_points: Option<u32>) -> Self {
        Self {
            min_text_chars,
            expected_total_points,
        }
    }

    /// 题干长度是否超过阈值（按字符计）
    pub fn has_content(&self, record: &QuestionRecord) -> bool {
        record.text.chars().count() > self.min_text_chars
    }

    /// 过滤误匹配并统计诊断信息；不完整记录保留
    pub fn validate(&self, drafts: Vec<QuestionRecord>) -> (Vec<QuestionRecord>, Diagnostics) {
        let mut diagnostics = Diagnostics {
            expected_total_points: self.expected_total_points,
            ..Default::default()
        };
        let mut records = Vec::with_capacity(drafts.len());

        for record in drafts {
            if !self.has_content(&record) {
                debug!("丢弃误匹配 {}: 题干过短 ({:?})", record.id, record.text);
                diagnostics.discarded.push(record.id);
                continue;
            }

            if record.kind == QuestionKind::FillIn {
                diagnostics
                    .parts_count
                    .push((record.id.clone(), record.part_count()));
            }

            if !record.complete {
                match record.kind {
                    QuestionKind::MultipleChoice => warn!(
                        "⚠️ {} 只有 {} 个选项",
                        record.id,
                        record.option_count()
                    ),
                    QuestionKind::FillIn => warn!("⚠️ {} 没有识别到小题", record.id),
                }
                diagnostics.incomplete.push(record.id.clone());
            }

            diagnostics.total_points = diagnostics.total_points.saturating_add(record.points);
            records.push(record);
        }

        if let Some((expected, actual)) = diagnostics.points_mismatch() {
            warn!("⚠️ 总分不一致: 期望 {}, 实际 {}", expected, actual);
        }

        (records, diagnostics)
    }
}
