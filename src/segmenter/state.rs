//! 扫描状态机
//!
//! 所有跨词的状态都显式放在 [`ScanState`] 中，由 [`step`] 接收并返回，
//! 便于单独测试每一次状态转换。

use crate::models::question::{Identifier, QuestionKind};
use crate::segmenter::boundary::{Boundary, BoundaryMatcher};
use crate::segmenter::normalize::Token;
use std::collections::BTreeSet;
use tracing::debug;

/// 当前扫描的章节
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    MultipleChoice,
    FillIn,
    /// 已越过最后一个章节，之后的内容全部忽略
    Done,
}

/// 续写文本当前写入的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Prompt,
    Option(usize),
    Part(usize),
}

/// 尚未冻结的题目：字段以词列表累积，冻结时才拼接
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRecord {
    pub kind: QuestionKind,
    pub identifier: Identifier,
    pub prompt: Vec<String>,
    pub options: Vec<(String, Vec<String>)>,
    pub parts: Vec<(u32, Vec<String>)>,
    pub field: Field,
}

impl OpenRecord {
    pub fn new(kind: QuestionKind, identifier: Identifier) -> Self {
        Self {
            kind,
            identifier,
            prompt: Vec::new(),
            options: Vec::new(),
            parts: Vec::new(),
            field: Field::Prompt,
        }
    }

    pub fn has_option(&self, label: &str) -> bool {
        self.options.iter().any(|(l, _)| l == label)
    }

    pub fn has_part(&self, n: u32) -> bool {
        self.parts.iter().any(|(p, _)| *p == n)
    }

    fn open_option(&mut self, label: String) {
        self.options.push((label, Vec::new()));
        self.field = Field::Option(self.options.len() - 1);
    }

    fn open_part(&mut self, n: u32) {
        self.parts.push((n, Vec::new()));
        self.field = Field::Part(self.parts.len() - 1);
    }

    fn push_word(&mut self, word: &str) {
        let target = match self.field {
            Field::Prompt => &mut self.prompt,
            Field::Option(i) => &mut self.options[i].1,
            Field::Part(i) => &mut self.parts[i].1,
        };
        target.push(word.to_string());
    }
}

/// 扫描状态
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanState {
    pub mode: Mode,
    pub open: Option<OpenRecord>,
    pub(crate) seen_numbers: BTreeSet<u32>,
    pub(crate) seen_symbols: BTreeSet<String>,
}

impl ScanState {
    pub fn open_number(&self) -> Option<u32> {
        self.open.as_ref().and_then(|r| r.identifier.as_number())
    }

    pub fn number_seen(&self, n: u32) -> bool {
        self.seen_numbers.contains(&n)
    }

    pub fn symbol_seen(&self, symbol: &str) -> bool {
        self.seen_symbols.contains(symbol)
    }

    fn open_record(&mut self, kind: QuestionKind, identifier: Identifier) -> Option<OpenRecord> {
        match &identifier {
            Identifier::Number(n) => {
                self.seen_numbers.insert(*n);
            }
            Identifier::Symbol(s) => {
                self.seen_symbols.insert(s.clone());
            }
        }
        self.open.replace(OpenRecord::new(kind, identifier))
    }
}

/// 一次状态转换的结果
#[derive(Debug)]
pub struct Step {
    pub state: ScanState,
    /// 消耗的词数；为 0 时同一个词会在新模式下再分类一次
    pub advance: usize,
    /// 被边界关闭的题目
    pub frozen: Option<OpenRecord>,
}

/// 处理 `tokens[at]`，返回新状态
pub fn step(mut state: ScanState, tokens: &[Token], at: usize, matcher: &BoundaryMatcher) -> Step {
    let boundary = matcher.classify(tokens, at, &state);
    let mut frozen = None;

    let advance = match boundary {
        Boundary::Header { len, next } => {
            debug!("章节标题 (模式 {:?} → {:?})", state.mode, next);
            frozen = state.open.take();
            state.mode = next;
            len
        }
        Boundary::Question(n) => {
            frozen = state.open_record(QuestionKind::MultipleChoice, Identifier::Number(n));
            1
        }
        Boundary::FillIn(symbol) => {
            frozen = state.open.take();
            if state.mode == Mode::MultipleChoice {
                // 选择题部分结束，同一个词在填空模式下重新识别
                state.mode = Mode::FillIn;
                0
            } else {
                state.open_record(QuestionKind::FillIn, Identifier::Symbol(symbol));
                1
            }
        }
        Boundary::Option(label) => {
            if let Some(open) = state.open.as_mut() {
                open.open_option(label);
            }
            1
        }
        Boundary::Part(n) => {
            if let Some(open) = state.open.as_mut() {
                open.open_part(n);
            }
            1
        }
        Boundary::Continuation => {
            if let (Some(open), Some(token)) = (state.open.as_mut(), tokens.get(at)) {
                open.push_word(&token.text);
            }
            1
        }
    };

    Step {
        state,
        advance,
        frozen,
    }
}
