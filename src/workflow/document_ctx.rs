//! 文档处理上下文
//!
//! 封装"我正在处理第几份、哪一份试卷"这一信息

use std::fmt::Display;
use std::path::{Path, PathBuf};

/// 文档处理上下文
#[derive(Debug, Clone)]
pub struct DocumentCtx {
    /// 试卷名（取自文件名，不含扩展名）
    pub exam_name: String,

    /// 源文件路径
    pub path: PathBuf,

    /// 文档索引（仅用于日志显示）
    pub index: usize,
}

impl DocumentCtx {
    pub fn new(path: impl Into<PathBuf>, index: usize) -> Self {
        let path = path.into();
        Self {
            exam_name: exam_name_of(&path),
            path,
            index,
        }
    }

    /// 源文件名（含扩展名）
    pub fn source_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

fn exam_name_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "exam".to_string())
}

impl Display for DocumentCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[试卷 {} {}]", self.index, self.exam_name)
    }
}
