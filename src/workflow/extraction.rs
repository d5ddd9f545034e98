//! 两阶段抽取
//!
//! 第一阶段（可选）请 LLM 直接返回题目 JSON；结果为空、含占位文本或不可用时，
//! 第二阶段用模式切分兜底。

use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::models::question::{QuestionKind, QuestionRecord};
use crate::segmenter::{split_point_annotation, SegmenterConfig};

/// LLM 模板占位文本
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*\[[^\]]*\]\s*$|энд бодит|fallback асуулт|placeholder|lorem ipsum").unwrap()
});

/// 第一阶段的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    Success(Vec<QuestionRecord>),
    /// 返回了模板 / 占位内容，不可信
    PlaceholderDetected,
    Empty,
}

/// 构建抽取提示词
pub fn build_prompt(content: &str) -> String {
    format!(
        r#"Extract every question from the Mongolian mathematics exam below.

Return a JSON array. Each element has the shape:
{{
  "id": "mc_<number>" or "fill_in_<symbol>",
  "type": "multiple_choice" or "fill_in",
  "questionNumber": <number> for multiple choice, "<symbol>" for fill-in (А, Б, В, 2.1 ...),
  "text": "<question text without its number>",
  "options": [{{"letter": "A", "text": "..."}}] (multiple choice only, at most 5),
  "parts": [{{"partNumber": 1, "text": "...", "points": 3}}] (fill-in only),
  "points": <number>
}}

Rules:
- Each question contains only its own text; never merge "9. ... 10. ..." into one question.
- Use the exact text of the document. Never invent example or template questions.
- For fill-in questions, "points" equals the sum of the part points.

DOCUMENT:
{}"#,
        content
    )
}

/// 解析 LLM 回复
///
/// 分值不采信 LLM：选择题按题号查表，小题按标注或小题分值表重新计算。
pub fn parse_llm_reply(reply: &str, config: &SegmenterConfig) -> ExtractionResult {
    let Some(json) = extract_json(reply) else {
        debug!("LLM 回复中没有 JSON");
        return ExtractionResult::Empty;
    };

    let items = match serde_json::from_str::<Value>(json) {
        Ok(Value::Array(items)) => items,
        Ok(Value::Object(mut map)) => match map.remove("questions") {
            Some(Value::Array(items)) => items,
            _ => return ExtractionResult::Empty,
        },
        Ok(_) => return ExtractionResult::Empty,
        Err(e) => {
            warn!("LLM 回复 JSON 解析失败: {}", e);
            return ExtractionResult::Empty;
        }
    };

    let mut records = Vec::with_capacity(items.len());
    let mut seen = HashSet::new();
    for item in items {
        let mut record = match serde_json::from_value::<QuestionRecord>(item) {
            Ok(record) => record,
            Err(e) => {
                debug!("跳过无法解析的题目: {}", e);
                continue;
            }
        };
        if is_placeholder(&record) {
            warn!("⚠️ LLM 返回了占位内容: {}", record.id);
            return ExtractionResult::PlaceholderDetected;
        }
        if !record.conforms() {
            warn!("跳过不符合格式的题目: {}", record.id);
            continue;
        }
        if let Some(n) = record.identifier.as_number() {
            if !config.question_range.contains(&n) {
                warn!("跳过超出题号范围的题目: {}", record.id);
                continue;
            }
        }
        if !seen.insert(record.id.clone()) {
            warn!("跳过重复的题目: {}", record.id);
            continue;
        }
        rescore(&mut record, config);
        records.push(record);
    }

    if records.is_empty() {
        ExtractionResult::Empty
    } else {
        ExtractionResult::Success(records)
    }
}

/// 按本地计分方案重算分值与完整性
fn rescore(record: &mut QuestionRecord, config: &SegmenterConfig) {
    match record.kind {
        QuestionKind::MultipleChoice => {
            record.points = record
                .identifier
                .as_number()
                .map_or(0, |n| config.scoring.points_for_identifier(record.kind, n));
            record.complete = record.option_count() == config.max_options;
        }
        QuestionKind::FillIn => {
            let mut total = 0u32;
            for part in record.parts.iter_mut().flatten() {
                let (text, annotated) = split_point_annotation(&part.text);
                part.text = text;
                part.points = config.scoring.parts.resolve(part.part_number, annotated);
                total = total.saturating_add(part.points);
            }
            record.points = total;
            record.complete = record.part_count() > 0;
        }
    }
}

/// 题干、选项或小题中是否出现占位文本
pub fn is_placeholder(record: &QuestionRecord) -> bool {
    let options = record.options.iter().flatten().map(|o| o.text.as_str());
    let parts = record.parts.iter().flatten().map(|p| p.text.as_str());
    std::iter::once(record.text.as_str())
        .chain(options)
        .chain(parts)
        .any(|text| PLACEHOLDER.is_match(text))
}

/// 取回复中第一个 JSON 数组或对象
fn extract_json(reply: &str) -> Option<&str> {
    let start = reply.find(&['[', '{'][..])?;
    let close = if reply[start..].starts_with('[') { ']' } else { '}' };
    let end = reply.rfind(close)?;
    (end > start).then(|| &reply[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::{Scoring, ScoringProfile};

    fn parse(reply: &str) -> ExtractionResult {
        parse_llm_reply(reply, &SegmenterConfig::default())
    }

    const FIVE_OPTIONS: &str = r#"[{"letter":"A","text":"1"},{"letter":"B","text":"2"},
        {"letter":"C","text":"3"},{"letter":"D","text":"4"},{"letter":"E","text":"5"}]"#;

    #[test]
    fn test_bare_array_reply() {
        let reply = format!(
            r#"Here you go:
            [{{"id":"mc_1","type":"multiple_choice","questionNumber":1,
              "text":"Илэрхийллийн утгыг ол","options":{},"points":1}}]"#,
            FIVE_OPTIONS
        );
        match parse(&reply) {
            ExtractionResult::Success(records) => {
                assert_eq!(records.len(), 1);
                assert!(records[0].complete);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_wrapped_object_reply() {
        let reply = r#"{"questions":[{"id":"fill_in_А","type":"fill_in","questionNumber":"А",
            "text":"Квадрат функц өгөгдөв",
            "parts":[{"partNumber":1,"text":"оройн цэг","points":3}],"points":3}]}"#;
        assert!(matches!(parse(reply), ExtractionResult::Success(r) if r.len() == 1));
    }

    #[test]
    fn test_placeholder_detected() {
        let reply = r#"[{"id":"mc_1","type":"multiple_choice","questionNumber":1,
            "text":"[Энд бодит асуултын текст байна]","points":1}]"#;
        assert_eq!(parse(reply), ExtractionResult::PlaceholderDetected);

        let reply = r#"[{"id":"mc_2","type":"multiple_choice","questionNumber":2,
            "text":"Fallback асуулт 2","points":1}]"#;
        assert_eq!(parse(reply), ExtractionResult::PlaceholderDetected);
    }

    #[test]
    fn test_nonconforming_records_rejected() {
        // id 与题号不一致，小题分值之和与总分不一致
        let reply = r#"[{"id":"mc_9","type":"multiple_choice","questionNumber":1,
              "text":"Илэрхийллийн утгыг ол","points":1},
            {"id":"fill_in_Б","type":"fill_in","questionNumber":"Б","text":"Функцийн график",
              "parts":[{"partNumber":1,"text":"x","points":3}],"points":5}]"#;
        assert_eq!(parse(reply), ExtractionResult::Empty);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let reply = r#"[{"id":"mc_3","type":"multiple_choice","questionNumber":3,
              "text":"Эхний асуултын текст","points":1},
            {"id":"mc_3","type":"multiple_choice","questionNumber":3,
              "text":"Давхардсан асуултын текст","points":1}]"#;
        match parse(reply) {
            ExtractionResult::Success(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].text, "Эхний асуултын текст");
                assert!(!records[0].complete);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_no_json_is_empty() {
        assert_eq!(parse("I could not find questions."), ExtractionResult::Empty);
        assert_eq!(parse("[]"), ExtractionResult::Empty);
    }

    #[test]
    fn test_scores_recomputed_from_local_tables() {
        let reply = r#"[{"id":"mc_1","type":"multiple_choice","questionNumber":1,
              "text":"Илэрхийллийн утгыг ол","points":99},
            {"id":"mc_30","type":"multiple_choice","questionNumber":30,
              "text":"Тэгшитгэлийн шийдийг ол","points":1},
            {"id":"fill_in_Б","type":"fill_in","questionNumber":"Б","text":"Квадрат функц өгөгдөв",
              "parts":[{"partNumber":1,"text":"томьёог ол (4 оноо)","points":50},
                       {"partNumber":2,"text":"оройн цэгийг ол","points":50}],"points":100}]"#;
        let ExtractionResult::Success(records) = parse(reply) else {
            panic!("expected records");
        };
        assert_eq!(records[0].points, 1);
        assert_eq!(records[1].points, 3);

        let parts = records[2].parts.as_ref().unwrap();
        assert_eq!(parts[0].text, "томьёог ол");
        assert_eq!(parts[0].points, 4);
        assert_eq!(parts[1].points, 2);
        assert_eq!(records[2].points, 6);
        assert!(records[2].conforms());
    }

    #[test]
    fn test_scores_follow_configured_profile() {
        let config = SegmenterConfig {
            scoring: Scoring::from_profile(ScoringProfile::Flat),
            ..SegmenterConfig::default()
        };
        let reply = r#"[{"id":"mc_30","type":"multiple_choice","questionNumber":30,
              "text":"Тэгшитгэлийн шийдийг ол","points":3}]"#;
        let ExtractionResult::Success(records) = parse_llm_reply(reply, &config) else {
            panic!("expected records");
        };
        assert_eq!(records[0].points, 1);
    }

    #[test]
    fn test_number_outside_range_rejected() {
        let reply = r#"[{"id":"mc_999","type":"multiple_choice","questionNumber":999,
              "text":"Илэрхийллийн утгыг ол","points":5}]"#;
        assert_eq!(parse(reply), ExtractionResult::Empty);
    }

    #[test]
    fn test_overflowing_part_points_rejected_without_panic() {
        let reply = r#"[{"id":"fill_in_А","type":"fill_in","questionNumber":"А",
              "text":"Квадрат функц өгөгдөв",
              "parts":[{"partNumber":1,"text":"x","points":4294967295},
                       {"partNumber":2,"text":"y","points":2}],"points":1}]"#;
        assert_eq!(parse(reply), ExtractionResult::Empty);
    }
}
