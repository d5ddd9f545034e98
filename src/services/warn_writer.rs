//! 警告写入服务 - 业务能力层
//!
//! 只负责"写 warn.txt"能力，不关心流程

use std::fs::OpenOptions;
use std::io::Write;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::question::{QuestionKind, QuestionRecord};

/// 警告写入服务
///
/// 职责：
/// - 将不完整的题目（选项不足 / 没有小题）追加到 warn.txt
/// - 只处理单条记录
pub struct WarnWriter {
    warn_file_path: String,
}

impl WarnWriter {
    /// 创建新的警告写入服务
    pub fn new() -> Self {
        Self {
            warn_file_path: "warn.txt".to_string(),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            warn_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.warn_file_path
    }

    /// 写入一条不完整记录
    pub fn write(&self, exam: &str, record: &QuestionRecord) -> AppResult<()> {
        debug!("写入警告: 试卷 {} | 题目 {}", exam, record.id);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.warn_file_path)
            .map_err(|e| AppError::file_write_failed(&self.warn_file_path, e))?;

        file.write_all(Self::format_line(exam, record).as_bytes())
            .map_err(|e| AppError::file_write_failed(&self.warn_file_path, e))?;

        Ok(())
    }

    fn format_line(exam: &str, record: &QuestionRecord) -> String {
        let detail = match record.kind {
            QuestionKind::MultipleChoice => format!("选项 {}/5", record.option_count()),
            QuestionKind::FillIn => format!("小题 {}", record.part_count()),
        };
        format!(
            "试卷 {} | 题目 {} | {} | 题干: {}\n",
            exam, record.id, detail, record.text
        )
    }
}

impl Default for WarnWriter {
    fn default() -> Self {
        Self::new()
    }
}
