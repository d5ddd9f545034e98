//! 输入规范化
//!
//! HTML → 扁平的空白分隔词序列；纯文本 / Markdown → 去空行、去首尾空白的行序列，
//! 再按行切词并记录每个词是否位于行首。

use regex::{Captures, Regex};
use std::path::Path;
use std::sync::LazyLock;

static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>").unwrap());
static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b.*?</style\s*>").unwrap());
static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z][a-zA-Z0-9]*);").unwrap());
static MD_LINE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:#{1,6}\s+|>\s*)+").unwrap());

/// 输入来源格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Html,
    Text,
    Markdown,
}

impl SourceKind {
    /// 根据扩展名判断来源格式；PDF 需先经转换服务变成 Markdown，这里返回 `None`
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "html" | "htm" => Some(SourceKind::Html),
            "md" | "markdown" | "mmd" => Some(SourceKind::Markdown),
            "txt" => Some(SourceKind::Text),
            _ => None,
        }
    }

    pub fn layout(self) -> Layout {
        match self {
            SourceKind::Html => Layout::Tokens,
            SourceKind::Text | SourceKind::Markdown => Layout::Lines,
        }
    }
}

/// 词序列是否保留了行结构
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// 行结构已丢失，题号可出现在任意位置
    Tokens,
    /// 题号、填空题号、小题号必须位于行首
    Lines,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub line_start: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStream {
    pub tokens: Vec<Token>,
    pub layout: Layout,
}

impl TokenStream {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// 规范化原始输入
///
/// HTML 返回词序列，文本 / Markdown 返回行序列。不会因标记损坏而失败，
/// 无法识别的片段按普通文本保留。
pub fn normalize(raw: &str, kind: SourceKind) -> Vec<String> {
    match kind {
        SourceKind::Html => strip_html(raw)
            .split_whitespace()
            .map(str::to_string)
            .collect(),
        SourceKind::Text | SourceKind::Markdown => raw
            .lines()
            .map(|line| clean_line(line, kind))
            .filter(|line| !line.is_empty())
            .collect(),
    }
}

/// 规范化并切词，供扫描器使用
pub fn tokenize(raw: &str, kind: SourceKind) -> TokenStream {
    let layout = kind.layout();
    let tokens = match layout {
        Layout::Tokens => normalize(raw, kind)
            .into_iter()
            .map(|text| Token {
                text,
                line_start: false,
            })
            .collect(),
        Layout::Lines => normalize(raw, kind)
            .iter()
            .flat_map(|line| {
                line.split(' ').enumerate().map(|(i, word)| Token {
                    text: word.to_string(),
                    line_start: i == 0,
                })
            })
            .collect(),
    };
    TokenStream { tokens, layout }
}

/// 去掉 script/style 整块、注释和所有标签，解码实体并压缩空白
pub fn strip_html(raw: &str) -> String {
    let text = SCRIPT_BLOCK.replace_all(raw, " ");
    let text = STYLE_BLOCK.replace_all(&text, " ");
    let text = COMMENT.replace_all(&text, " ");
    let text = TAG.replace_all(&text, " ");
    let text = ENTITY.replace_all(&text, |caps: &Captures| decode_entity(&caps[1]));
    collapse_whitespace(&text)
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clean_line(line: &str, kind: SourceKind) -> String {
    if kind == SourceKind::Markdown {
        let line = MD_LINE_PREFIX.replace(line, "");
        collapse_whitespace(&line.replace("**", ""))
    } else {
        collapse_whitespace(line)
    }
}

fn decode_entity(name: &str) -> String {
    let decoded = if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(|c: char| c == 'x' || c == 'X') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => num.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32)
    } else {
        match name {
            "nbsp" => Some(' '),
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => None,
        }
    };
    decoded.map_or_else(|| " ".to_string(), |c| c.to_string())
}
