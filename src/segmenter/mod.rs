//! 题目切分核心
//!
//! 对规范化后的词序列做一次前向扫描，按题号 / 选项 / 小题 / 章节标题切分成
//! [`QuestionRecord`] 序列。纯计算，不做 I/O，同样的输入总是得到同样的输出。
//!
//! ```text
//! raw ──normalize──▶ TokenStream ──step*──▶ OpenRecord* ──freeze──▶ drafts ──validate──▶ records
//! ```

pub mod boundary;
pub mod normalize;
pub mod points;
pub mod state;
pub mod validate;

pub use boundary::{Boundary, BoundaryMatcher, OptionScript};
pub use normalize::{normalize, tokenize, Layout, SourceKind, Token, TokenStream};
pub use points::{PartPointTable, PointRange, PointTable, Scoring, ScoringProfile};
pub use state::{step, Mode, OpenRecord, ScanState, Step};
pub use validate::{Diagnostics, Validator};

use crate::error::SegmentError;
use crate::models::question::{AnswerOption, QuestionKind, QuestionPart, QuestionRecord};
use regex::Regex;
use std::ops::RangeInclusive;
use std::sync::LazyLock;
use tracing::debug;

static POINT_ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\(\s*(\d{1,2})\s*оноо\s*\)").unwrap());

/// 切分参数
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// 选择题题号范围
    pub question_range: RangeInclusive<u32>,
    /// 选项字母表；`None` 表示按文档自动检测
    pub script: Option<OptionScript>,
    pub max_options: usize,
    /// 填空题题号（不含句点），按文档顺序
    pub fill_in_symbols: Vec<String>,
    /// 进入填空题部分的章节标题
    pub fill_in_markers: Vec<String>,
    /// 结束抽取的章节标题
    pub end_markers: Vec<String>,
    /// 题干最少字符数（不含），低于此值视为误匹配
    pub min_text_chars: usize,
    pub scoring: Scoring,
    pub expected_total_points: Option<u32>,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            question_range: 1..=40,
            script: None,
            max_options: 5,
            fill_in_symbols: ["А", "Б", "В", "2.1", "2.2", "2.3"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            fill_in_markers: vec!["Хоёрдугаар хэсэг".to_string(), "НӨХӨХ ДААЛГАВАР".to_string()],
            end_markers: vec!["Гуравдугаар хэсэг".to_string()],
            min_text_chars: 10,
            scoring: Scoring::default(),
            expected_total_points: None,
        }
    }
}

impl SegmenterConfig {
    /// 为某份文档构建匹配器；未指定字母表时按文档检测
    pub fn matcher_for(&self, stream: &TokenStream) -> BoundaryMatcher {
        let script = self
            .script
            .unwrap_or_else(|| OptionScript::detect(&stream.tokens));
        BoundaryMatcher::new(
            self.question_range.clone(),
            script,
            self.max_options,
            &self.fill_in_symbols,
            &self.fill_in_markers,
            &self.end_markers,
            stream.layout,
        )
    }
}

/// 切分结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation {
    pub records: Vec<QuestionRecord>,
    pub diagnostics: Diagnostics,
}

/// 从原始文本直接切分
pub fn segment_document(
    raw: &str,
    kind: SourceKind,
    config: &SegmenterConfig,
) -> Result<Segmentation, SegmentError> {
    segment(&tokenize(raw, kind), config)
}

/// 切分词序列
///
/// 只有在整份文档一条有效记录都没有时才返回错误。
pub fn segment(stream: &TokenStream, config: &SegmenterConfig) -> Result<Segmentation, SegmentError> {
    let matcher = config.matcher_for(stream);
    debug!(
        "开始切分: {} 个词, 布局 {:?}, 选项字母 {:?}",
        stream.len(),
        stream.layout,
        matcher.script()
    );

    let tokens = &stream.tokens;
    let mut state = ScanState::default();
    let mut drafts = Vec::new();
    let mut at = 0;

    while at < tokens.len() {
        let Step {
            state: next,
            advance,
            frozen,
        } = step(state, tokens, at, &matcher);
        state = next;
        drafts.extend(frozen.map(|open| freeze(open, config)));
        if state.mode == Mode::Done {
            break;
        }
        at += advance;
    }
    drafts.extend(state.open.take().map(|open| freeze(open, config)));

    let validator = Validator::new(config.min_text_chars, config.expected_total_points);
    let (records, diagnostics) = validator.validate(drafts);

    if records.is_empty() {
        return Err(SegmentError::NoRecordsFound {
            tokens: stream.len(),
            discarded: diagnostics.discarded.len(),
        });
    }

    Ok(Segmentation {
        records,
        diagnostics,
    })
}

/// 把累积中的题目冻结为最终记录，并计算分值
pub fn freeze(open: OpenRecord, config: &SegmenterConfig) -> QuestionRecord {
    let id = QuestionRecord::make_id(open.kind, &open.identifier);
    let text = join_words(&open.prompt);

    match open.kind {
        QuestionKind::MultipleChoice => {
            let options: Vec<AnswerOption> = open
                .options
                .into_iter()
                .map(|(letter, words)| AnswerOption {
                    letter,
                    text: join_words(&words),
                })
                .collect();
            let points = open
                .identifier
                .as_number()
                .map_or(0, |n| config.scoring.points_for_identifier(open.kind, n));
            QuestionRecord {
                id,
                kind: open.kind,
                identifier: open.identifier,
                text,
                complete: options.len() == config.max_options,
                options: Some(options),
                parts: None,
                points,
            }
        }
        QuestionKind::FillIn => {
            let parts: Vec<QuestionPart> = open
                .parts
                .into_iter()
                .map(|(part_number, words)| {
                    let (text, annotated) = split_point_annotation(&join_words(&words));
                    QuestionPart {
                        part_number,
                        text,
                        points: config.scoring.parts.resolve(part_number, annotated),
                    }
                })
                .collect();
            QuestionRecord {
                id,
                kind: open.kind,
                identifier: open.identifier,
                text,
                complete: !parts.is_empty(),
                points: parts.iter().fold(0u32, |acc, p| acc.saturating_add(p.points)),
                options: None,
                parts: Some(parts),
            }
        }
    }
}

fn join_words(words: &[String]) -> String {
    normalize::collapse_whitespace(&words.join(" "))
}

/// 去掉文中的 "(N оноо)" 标注，返回 (文本, 标注分值)
pub fn split_point_annotation(text: &str) -> (String, Option<u32>) {
    let annotated = POINT_ANNOTATION
        .captures_iter(text)
        .last()
        .and_then(|caps| caps[1].parse().ok());
    if annotated.is_none() {
        return (text.to_string(), None);
    }
    let stripped = POINT_ANNOTATION.replace_all(text, " ");
    (normalize::collapse_whitespace(&stripped), annotated)
}
