//! 分值策略
//!
//! 题号 → 分值的映射是数据而不是分支：不同年份的试卷分段不同，
//! 由调用方选择或从 TOML 加载。

use crate::models::question::QuestionKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 分值区间 `[start, end] → points`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointRange {
    pub start: u32,
    pub end: u32,
    pub points: u32,
}

impl PointRange {
    pub fn contains(&self, n: u32) -> bool {
        self.start <= n && n <= self.end
    }
}

/// 选择题分值表：按顺序匹配，第一个命中的区间生效，否则取 `fallback`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointTable {
    #[serde(default)]
    pub ranges: Vec<PointRange>,
    pub fallback: u32,
}

impl PointTable {
    /// 分段计分：1-8 题 1 分，9-28 题 2 分，29-36 题 3 分
    pub fn graded() -> Self {
        Self {
            ranges: vec![
                PointRange { start: 1, end: 8, points: 1 },
                PointRange { start: 9, end: 28, points: 2 },
                PointRange { start: 29, end: 36, points: 3 },
            ],
            fallback: 1,
        }
    }

    /// 每题同分
    pub fn flat(points: u32) -> Self {
        Self {
            ranges: Vec::new(),
            fallback: points,
        }
    }

    pub fn lookup(&self, n: u32) -> u32 {
        self.ranges
            .iter()
            .find(|r| r.contains(n))
            .map_or(self.fallback, |r| r.points)
    }

    /// 按题号求期望总分（用于与实际结果比对）
    pub fn expected_total(&self, numbers: impl IntoIterator<Item = u32>) -> u32 {
        numbers.into_iter().map(|n| self.lookup(n)).sum()
    }
}

/// 填空小题分值表：小题号 → 分值；文中 "(N оноо)" 标注优先
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartPointTable {
    pub table: BTreeMap<u32, u32>,
    pub fallback: u32,
}

impl PartPointTable {
    pub fn lookup(&self, part_number: u32) -> u32 {
        self.table.get(&part_number).copied().unwrap_or(self.fallback)
    }

    /// 小题最终分值：显式标注优先于表中默认值
    pub fn resolve(&self, part_number: u32, annotated: Option<u32>) -> u32 {
        annotated.unwrap_or_else(|| self.lookup(part_number))
    }
}

impl Default for PartPointTable {
    fn default() -> Self {
        Self {
            table: BTreeMap::from([(1, 3), (2, 2), (3, 2)]),
            fallback: 2,
        }
    }
}

/// 预设的计分方案
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringProfile {
    /// 1-8 / 9-28 / 29-36 分段
    Graded,
    /// 每题 1 分
    Flat,
}

impl ScoringProfile {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "graded" => Some(ScoringProfile::Graded),
            "flat" => Some(ScoringProfile::Flat),
            _ => None,
        }
    }

    pub fn table(self) -> PointTable {
        match self {
            ScoringProfile::Graded => PointTable::graded(),
            ScoringProfile::Flat => PointTable::flat(1),
        }
    }
}

/// 完整计分配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scoring {
    pub multiple_choice: PointTable,
    pub parts: PartPointTable,
}

impl Scoring {
    pub fn from_profile(profile: ScoringProfile) -> Self {
        Self {
            multiple_choice: profile.table(),
            parts: PartPointTable::default(),
        }
    }

    /// 选择题按题号计分；填空题的分值由小题汇总，此处返回 0
    pub fn points_for_identifier(&self, kind: QuestionKind, n: u32) -> u32 {
        match kind {
            QuestionKind::MultipleChoice => self.multiple_choice.lookup(n),
            QuestionKind::FillIn => 0,
        }
    }
}

impl Default for Scoring {
    fn default() -> Self {
        Self::from_profile(ScoringProfile::Graded)
    }
}
