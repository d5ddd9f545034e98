//! 边界识别
//!
//! 给定当前词和扫描状态，判断它是新题、选项、小题、章节标题，还是普通续写文本。

use crate::segmenter::normalize::{Layout, Token};
use crate::segmenter::state::{Mode, ScanState};
use regex::Regex;
use std::ops::RangeInclusive;
use std::sync::LazyLock;

static QUESTION_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{1,4})\.$").unwrap());
static PART_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\((\d{1,3})\)$").unwrap());

/// 选项字母所用的字母表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionScript {
    /// A B C D E
    Latin,
    /// а б в г д
    CyrillicLower,
    /// А Б В Г Д
    CyrillicUpper,
}

impl OptionScript {
    const ALL: [OptionScript; 3] = [
        OptionScript::Latin,
        OptionScript::CyrillicLower,
        OptionScript::CyrillicUpper,
    ];

    pub fn labels(self) -> &'static [&'static str] {
        match self {
            OptionScript::Latin => &["A", "B", "C", "D", "E"],
            OptionScript::CyrillicLower => &["а", "б", "в", "г", "д"],
            OptionScript::CyrillicUpper => &["А", "Б", "В", "Г", "Д"],
        }
    }

    /// 解析配置值；`auto` 或无法识别时返回 `None`，表示按文档自动检测
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latin" => Some(OptionScript::Latin),
            "cyrillic_lower" | "cyrillic" => Some(OptionScript::CyrillicLower),
            "cyrillic_upper" => Some(OptionScript::CyrillicUpper),
            _ => None,
        }
    }

    /// 统计各字母表 `X.` 形式的词数，取最多者；并列时优先拉丁字母
    pub fn detect(tokens: &[Token]) -> Self {
        let mut best = OptionScript::Latin;
        let mut best_count = 0;
        for script in Self::ALL {
            let count = tokens
                .iter()
                .filter(|t| script.label_of(&t.text).is_some())
                .count();
            if count > best_count {
                best = script;
                best_count = count;
            }
        }
        best
    }

    /// `"B."` → `Some("B")`
    pub fn label_of(self, token: &str) -> Option<&'static str> {
        let stem = token.strip_suffix('.')?;
        self.labels().iter().copied().find(|l| *l == stem)
    }
}

/// 一个词的分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Boundary {
    /// 选择题题号
    Question(u32),
    /// 填空题题号
    FillIn(String),
    /// 选项字母
    Option(String),
    /// `(N)` 小题号
    Part(u32),
    /// 章节标题，占 `len` 个词，之后进入 `next` 模式
    Header { len: usize, next: Mode },
    Continuation,
}

/// 参数化的边界匹配器
///
/// 题号范围、选项字母表、填空题号集合、章节标题均来自配置，
/// 不同版本的试卷共用同一套规则。
#[derive(Debug, Clone)]
pub struct BoundaryMatcher {
    range: RangeInclusive<u32>,
    script: OptionScript,
    max_options: usize,
    fill_in_symbols: Vec<String>,
    fill_in_markers: Vec<Vec<String>>,
    end_markers: Vec<Vec<String>>,
    layout: Layout,
}

impl BoundaryMatcher {
    pub fn new(
        range: RangeInclusive<u32>,
        script: OptionScript,
        max_options: usize,
        fill_in_symbols: &[String],
        fill_in_markers: &[String],
        end_markers: &[String],
        layout: Layout,
    ) -> Self {
        Self {
            range,
            script,
            max_options,
            fill_in_symbols: fill_in_symbols.to_vec(),
            fill_in_markers: fill_in_markers.iter().map(|m| marker_words(m)).collect(),
            end_markers: end_markers.iter().map(|m| marker_words(m)).collect(),
            layout,
        }
    }

    pub fn script(&self) -> OptionScript {
        self.script
    }

    /// 按固定优先级分类 `tokens[at]`
    ///
    /// 选择题模式：标题 → 题号 → 选项（仅在有打开的题目时）→ 填空题号（结束本节）→ 续写。
    /// 填空题模式：标题 → 填空题号 → 小题号（仅在有打开的题目时）→ 续写。
    pub fn classify(&self, tokens: &[Token], at: usize, state: &ScanState) -> Boundary {
        let Some(token) = tokens.get(at) else {
            return Boundary::Continuation;
        };
        if state.mode == Mode::Done {
            return Boundary::Continuation;
        }

        if let Some(len) = match_marker(&self.end_markers, tokens, at) {
            return Boundary::Header {
                len,
                next: Mode::Done,
            };
        }
        if let Some(len) = match_marker(&self.fill_in_markers, tokens, at) {
            return Boundary::Header {
                len,
                next: Mode::FillIn,
            };
        }

        match state.mode {
            Mode::MultipleChoice => {
                if let Some(n) = self.question_number(token, state) {
                    return Boundary::Question(n);
                }
                if let Some(label) = self.option_label(token, state) {
                    return Boundary::Option(label.to_string());
                }
                if let Some(symbol) = self.fill_in_symbol(token, state) {
                    return Boundary::FillIn(symbol);
                }
            }
            Mode::FillIn => {
                if let Some(symbol) = self.fill_in_symbol(token, state) {
                    return Boundary::FillIn(symbol);
                }
                if let Some(n) = self.part_number(token, state) {
                    return Boundary::Part(n);
                }
            }
            Mode::Done => {}
        }
        Boundary::Continuation
    }

    fn structural_position(&self, token: &Token) -> bool {
        self.layout == Layout::Tokens || token.line_start
    }

    /// 题号必须在范围内、不同于当前打开的题、且此前未出现过；
    /// 否则题干中的数字（如 "27 км/ц"）会被误判为新题。
    fn question_number(&self, token: &Token, state: &ScanState) -> Option<u32> {
        if !self.structural_position(token) {
            return None;
        }
        let caps = QUESTION_TOKEN.captures(&token.text)?;
        let n: u32 = caps[1].parse().ok()?;
        if !self.range.contains(&n) || state.open_number() == Some(n) || state.number_seen(n) {
            return None;
        }
        Some(n)
    }

    fn option_label(&self, token: &Token, state: &ScanState) -> Option<&'static str> {
        let open = state.open.as_ref()?;
        let label = self.script.label_of(&token.text)?;
        if open.options.len() >= self.max_options || open.has_option(label) {
            return None;
        }
        Some(label)
    }

    fn fill_in_symbol(&self, token: &Token, state: &ScanState) -> Option<String> {
        if !self.structural_position(token) {
            return None;
        }
        let stem = token.text.strip_suffix('.')?;
        let symbol = self.fill_in_symbols.iter().find(|s| s.as_str() == stem)?;
        if state.symbol_seen(symbol) {
            return None;
        }
        Some(symbol.clone())
    }

    fn part_number(&self, token: &Token, state: &ScanState) -> Option<u32> {
        let open = state.open.as_ref()?;
        let caps = PART_TOKEN.captures(&token.text)?;
        let n: u32 = caps[1].parse().ok()?;
        if n == 0 || open.has_part(n) {
            return None;
        }
        Some(n)
    }
}

fn marker_words(marker: &str) -> Vec<String> {
    marker.split_whitespace().map(fold_word).collect()
}

/// 小写并去掉尾部标点，用于标题比较
fn fold_word(word: &str) -> String {
    word.trim_end_matches(&['.', ',', ':', ';'][..])
        .to_lowercase()
}

fn match_marker(markers: &[Vec<String>], tokens: &[Token], at: usize) -> Option<usize> {
    markers
        .iter()
        .filter(|words| !words.is_empty())
        .find(|words| {
            words.len() <= tokens.len() - at
                && words
                    .iter()
                    .zip(&tokens[at..])
                    .all(|(w, t)| *w == fold_word(&t.text))
        })
        .map(Vec::len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{Identifier, QuestionKind};
    use crate::segmenter::state::OpenRecord;

    fn tok(text: &str) -> Token {
        Token {
            text: text.to_string(),
            line_start: false,
        }
    }

    fn matcher(layout: Layout) -> BoundaryMatcher {
        BoundaryMatcher::new(
            1..=40,
            OptionScript::Latin,
            5,
            &["А".to_string(), "Б".to_string()],
            &["Хоёрдугаар хэсэг".to_string()],
            &["Гуравдугаар хэсэг".to_string()],
            layout,
        )
    }

    fn state_with_open(n: u32) -> ScanState {
        let mut state = ScanState::default();
        state.open = Some(OpenRecord::new(
            QuestionKind::MultipleChoice,
            Identifier::Number(n),
        ));
        state
    }

    #[test]
    fn test_question_number_in_range() {
        let m = matcher(Layout::Tokens);
        let state = ScanState::default();
        assert_eq!(m.classify(&[tok("7.")], 0, &state), Boundary::Question(7));
        assert_eq!(m.classify(&[tok("41.")], 0, &state), Boundary::Continuation);
        assert_eq!(m.classify(&[tok("2025.")], 0, &state), Boundary::Continuation);
        assert_eq!(m.classify(&[tok("2.1.")], 0, &state), Boundary::Continuation);
    }

    #[test]
    fn test_same_number_as_open_is_continuation() {
        let m = matcher(Layout::Tokens);
        let state = state_with_open(22);
        assert_eq!(m.classify(&[tok("22.")], 0, &state), Boundary::Continuation);
        assert_eq!(m.classify(&[tok("27")], 0, &state), Boundary::Continuation);
    }

    #[test]
    fn test_line_layout_requires_line_start() {
        let m = matcher(Layout::Lines);
        let state = state_with_open(22);
        assert_eq!(m.classify(&[tok("27.")], 0, &state), Boundary::Continuation);
        let start = Token {
            text: "23.".to_string(),
            line_start: true,
        };
        assert_eq!(m.classify(&[start], 0, &state), Boundary::Question(23));
    }

    #[test]
    fn test_option_only_while_question_open() {
        let m = matcher(Layout::Tokens);
        assert_eq!(
            m.classify(&[tok("B.")], 0, &ScanState::default()),
            Boundary::Continuation
        );
        assert_eq!(
            m.classify(&[tok("B.")], 0, &state_with_open(1)),
            Boundary::Option("B".to_string())
        );
    }

    #[test]
    fn test_fill_in_symbol_ends_multiple_choice() {
        let m = matcher(Layout::Tokens);
        assert_eq!(
            m.classify(&[tok("Б.")], 0, &state_with_open(36)),
            Boundary::FillIn("Б".to_string())
        );
    }

    #[test]
    fn test_header_marker_spans_words() {
        let m = matcher(Layout::Tokens);
        let tokens = [tok("Хоёрдугаар"), tok("хэсэг."), tok("НӨХӨХ")];
        assert_eq!(
            m.classify(&tokens, 0, &ScanState::default()),
            Boundary::Header {
                len: 2,
                next: Mode::FillIn
            }
        );
        assert_eq!(m.classify(&tokens[..1], 0, &ScanState::default()), Boundary::Continuation);
    }

    #[test]
    fn test_inline_part_marker_in_line_layout() {
        let m = matcher(Layout::Lines);
        let state = ScanState {
            mode: Mode::FillIn,
            open: Some(OpenRecord::new(
                QuestionKind::FillIn,
                Identifier::Symbol("А".to_string()),
            )),
            ..Default::default()
        };
        assert_eq!(m.classify(&[tok("(1)")], 0, &state), Boundary::Part(1));
        assert_eq!(m.classify(&[tok("(0,")], 0, &state), Boundary::Continuation);
    }

    #[test]
    fn test_detect_script() {
        let latin = [tok("A."), tok("B."), tok("А.")];
        assert_eq!(OptionScript::detect(&latin), OptionScript::Latin);
        let lower = [tok("а."), tok("б."), tok("в."), tok("A.")];
        assert_eq!(OptionScript::detect(&lower), OptionScript::CyrillicLower);
        assert_eq!(OptionScript::detect(&[]), OptionScript::Latin);
    }
}
