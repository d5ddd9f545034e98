use serde::{Deserialize, Serialize};
use std::fmt;

/// 题目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// 选择题（数字编号 + 字母选项）
    MultipleChoice,
    /// 填空题（符号编号 + 编号小题）
    FillIn,
}

impl QuestionKind {
    /// id 前缀，例如 `mc_7` / `fill_in_B`
    pub fn id_prefix(self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "mc",
            QuestionKind::FillIn => "fill_in",
        }
    }
}

/// 题号：选择题为整数，填空题为符号
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Number(u32),
    Symbol(String),
}

impl Identifier {
    pub fn as_number(&self) -> Option<u32> {
        match self {
            Identifier::Number(n) => Some(*n),
            Identifier::Symbol(_) => None,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Number(n) => write!(f, "{}", n),
            Identifier::Symbol(s) => write!(f, "{}", s),
        }
    }
}

/// 选择题选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub letter: String,
    pub text: String,
}

/// 填空题小题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPart {
    pub part_number: u32,
    pub text: String,
    pub points: u32,
}

/// 抽取结果的最小单位
///
/// JSON 形状与文档库中保存的题目一致：
/// `id` / `type` / `questionNumber` / `text` / `options?` / `parts?` / `points` / `complete`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(rename = "questionNumber")]
    pub identifier: Identifier,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<AnswerOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<QuestionPart>>,
    pub points: u32,
    #[serde(default)]
    pub complete: bool,
}

impl QuestionRecord {
    /// 由类型和题号生成稳定 id
    pub fn make_id(kind: QuestionKind, identifier: &Identifier) -> String {
        format!("{}_{}", kind.id_prefix(), identifier)
    }

    pub fn option_count(&self) -> usize {
        self.options.as_ref().map_or(0, Vec::len)
    }

    pub fn part_count(&self) -> usize {
        self.parts.as_ref().map_or(0, Vec::len)
    }

    /// 检查记录是否符合输出约定
    ///
    /// 外部来源（例如 LLM）生成的记录必须先通过此检查，才能与模式匹配的结果等同对待。
    pub fn conforms(&self) -> bool {
        let identifier_matches_kind = match (self.kind, &self.identifier) {
            (QuestionKind::MultipleChoice, Identifier::Number(_)) => true,
            (QuestionKind::FillIn, Identifier::Symbol(s)) => !s.trim().is_empty(),
            _ => false,
        };
        if !identifier_matches_kind || self.text.trim().is_empty() {
            return false;
        }
        if self.id != Self::make_id(self.kind, &self.identifier) {
            return false;
        }
        match self.kind {
            QuestionKind::MultipleChoice => self.parts.is_none() && self.option_count() <= 5,
            QuestionKind::FillIn => {
                // 分值溢出视为不符合
                let part_sum = self
                    .parts
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .try_fold(0u32, |acc, p| acc.checked_add(p.points));
                self.options.is_none() && part_sum == Some(self.points)
            }
        }
    }
}

impl fmt::Display for QuestionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview = if self.text.chars().count() > 60 {
            self.text.chars().take(60).collect::<String>() + "..."
        } else {
            self.text.clone()
        };
        write!(f, "{} ({} 分): {}", self.id, self.points, preview)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_mc() -> QuestionRecord {
        QuestionRecord {
            id: "mc_1".to_string(),
            kind: QuestionKind::MultipleChoice,
            identifier: Identifier::Number(1),
            text: "√√25⁵ илэрхийллийн утгыг олоорой.".to_string(),
            options: Some(vec![AnswerOption {
                letter: "A".to_string(),
                text: "√5".to_string(),
            }]),
            parts: None,
            points: 1,
            complete: false,
        }
    }

    #[test]
    fn test_serialize_uses_output_field_names() {
        let value = serde_json::to_value(sample_mc()).unwrap();
        assert_eq!(value["type"], json!("multiple_choice"));
        assert_eq!(value["questionNumber"], json!(1));
        assert!(value.get("parts").is_none());
        assert_eq!(value["options"][0]["letter"], json!("A"));
    }

    #[test]
    fn test_fill_in_identifier_is_string() {
        let value = json!({
            "id": "fill_in_Б",
            "type": "fill_in",
            "questionNumber": "Б",
            "text": "Квадрат функцийн график",
            "parts": [{ "partNumber": 1, "text": "томьёог ол", "points": 3 }],
            "points": 3,
            "complete": true
        });
        let record: QuestionRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.identifier, Identifier::Symbol("Б".to_string()));
        assert_eq!(record.part_count(), 1);
        assert!(record.conforms());
    }

    #[test]
    fn test_conforms_rejects_mismatched_id() {
        let mut record = sample_mc();
        record.id = "mc_2".to_string();
        assert!(!record.conforms());
    }

    #[test]
    fn test_conforms_rejects_fill_in_point_mismatch() {
        let record = QuestionRecord {
            id: "fill_in_А".to_string(),
            kind: QuestionKind::FillIn,
            identifier: Identifier::Symbol("А".to_string()),
            text: "Функцийн утгыг ол".to_string(),
            options: None,
            parts: Some(vec![QuestionPart {
                part_number: 1,
                text: "a".to_string(),
                points: 2,
            }]),
            points: 7,
            complete: true,
        };
        assert!(!record.conforms());
    }

    #[test]
    fn test_conforms_rejects_overflowing_part_points() {
        let part = |part_number, points| QuestionPart {
            part_number,
            text: "x".to_string(),
            points,
        };
        let record = QuestionRecord {
            id: "fill_in_А".to_string(),
            kind: QuestionKind::FillIn,
            identifier: Identifier::Symbol("А".to_string()),
            text: "Функцийн утгыг ол".to_string(),
            options: None,
            parts: Some(vec![part(1, u32::MAX), part(2, 2)]),
            points: 1,
            complete: true,
        };
        assert!(!record.conforms());
    }
}
