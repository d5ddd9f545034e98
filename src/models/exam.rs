use crate::models::question::{QuestionKind, QuestionRecord};
use serde::{Deserialize, Serialize};

/// 写入 `exams` 集合的试卷文档
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamDocument {
    pub name: String,
    /// 来源文件名
    pub source: String,
    pub total_questions: usize,
    pub multiple_choice_count: usize,
    pub fill_in_count: usize,
    pub total_points: u32,
    pub incomplete_count: usize,
    /// 抽取方式：`pattern` 或 `llm`
    pub method: String,
    pub created_at: String,
}

impl ExamDocument {
    /// 根据抽取结果汇总试卷信息
    pub fn summarize(name: &str, source: &str, method: &str, records: &[QuestionRecord]) -> Self {
        let count_kind = |kind| records.iter().filter(|r| r.kind == kind).count();
        Self {
            name: name.to_string(),
            source: source.to_string(),
            total_questions: records.len(),
            multiple_choice_count: count_kind(QuestionKind::MultipleChoice),
            fill_in_count: count_kind(QuestionKind::FillIn),
            total_points: records
                .iter()
                .fold(0u32, |acc, r| acc.saturating_add(r.points)),
            incomplete_count: records.iter().filter(|r| !r.complete).count(),
            method: method.to_string(),
            created_at: chrono::Local::now().to_rfc3339(),
        }
    }

    /// 题目子集合路径
    pub fn questions_collection(&self) -> String {
        format!("exams/{}/questions", self.name)
    }
}
