use crate::error::{AppError, AppResult, FileError};
use crate::segmenter::points::{PartPointTable, PointRange, PointTable, Scoring};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;

/// TOML 中的计分方案
///
/// ```toml
/// fallback = 1
///
/// [[ranges]]
/// start = 1
/// end = 8
/// points = 1
///
/// [parts]
/// fallback = 2
///
/// [parts.table]
/// "1" = 3
/// ```
#[derive(Debug, Deserialize)]
struct ScoringFile {
    fallback: u32,
    #[serde(default)]
    ranges: Vec<PointRange>,
    parts: Option<PartsSection>,
}

#[derive(Debug, Deserialize)]
struct PartsSection {
    fallback: u32,
    #[serde(default)]
    table: BTreeMap<String, u32>,
}

/// 解析计分方案文本
pub fn parse_scoring(content: &str, origin: &str) -> AppResult<Scoring> {
    let file: ScoringFile = toml::from_str(content).map_err(|source| {
        AppError::File(FileError::TomlParseFailed {
            path: origin.to_string(),
            source,
        })
    })?;

    let parts = match file.parts {
        Some(section) => {
            let mut table = BTreeMap::new();
            for (key, points) in section.table {
                // 小题号键必须是正整数，其余键跳过
                match key.trim().parse::<u32>() {
                    Ok(n) if n > 0 => {
                        table.insert(n, points);
                    }
                    _ => tracing::warn!("计分文件 {} 中的小题号无效: {}", origin, key),
                }
            }
            PartPointTable {
                table,
                fallback: section.fallback,
            }
        }
        None => PartPointTable::default(),
    };

    Ok(Scoring {
        multiple_choice: PointTable {
            ranges: file.ranges,
            fallback: file.fallback,
        },
        parts,
    })
}

/// 从 TOML 文件加载计分方案
pub async fn load_scoring_file(path: &Path) -> AppResult<Scoring> {
    let origin = path.display().to_string();
    if !path.exists() {
        return Err(AppError::File(FileError::NotFound { path: origin }));
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(&origin, e))?;

    let scoring = parse_scoring(&content, &origin)?;
    tracing::info!(
        "已加载计分方案 {}: {} 个区间, 默认 {} 分",
        origin,
        scoring.multiple_choice.ranges.len(),
        scoring.multiple_choice.fallback
    );
    Ok(scoring)
}
