//! # Exam Segmenter
//!
//! 把蒙古语数学试卷（HTML / Markdown / 纯文本 / PDF）切分成结构化题目的 Rust 应用程序
//!
//! ## 架构设计
//!
//! ### ① 切分核心（Segmenter）
//! - `segmenter/` - 纯计算，不做 I/O
//! - 规范化 → 单遍状态机扫描 → 冻结记录 → 校验
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `DocumentConverter` - 读取文本 / Mathpix 转换 PDF
//! - `LlmClient` - LLM 抽取能力
//! - `RecordSink` - 写入文档库
//! - `WarnWriter` - 写 warn.txt 能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一份试卷"的完整处理流程
//! - `DocumentCtx` - 上下文封装
//! - `DocumentFlow` - 转换 → LLM 抽取 / 模式切分 → 保存 → 警告
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量处理，管理并发
//! - `orchestrator/document_processor` - 单份试卷处理

pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod segmenter;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, SegmentError};
pub use models::{ExamDocument, QuestionKind, QuestionRecord};
pub use orchestrator::{App, ProcessingStats};
pub use segmenter::{segment, segment_document, Segmentation, SegmenterConfig, SourceKind};
pub use workflow::{DocumentCtx, DocumentFlow, ExtractionResult};
