//! 文档处理流程 - 流程层
//!
//! 核心职责：定义"一份试卷"的完整处理流程
//!
//! 流程顺序：
//! 1. 转换（直接读取 / Mathpix）
//! 2. LLM 抽取（可选）→ 占位检测
//! 3. 模式切分（LLM 未成功时兜底）
//! 4. 写入试卷文档和题目
//! 5. 不完整题目写入 warn.txt

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{AppResult, SegmentError, ServiceError};
use crate::models::{ExamDocument, QuestionRecord};
use crate::segmenter::{self, Diagnostics, Scoring, SegmenterConfig, Validator};
use crate::services::{
    ConvertedDocument, DocumentConverter, JsonFileStore, LlmClient, LlmService, RecordSink,
    SourceConverter, WarnWriter,
};
use crate::workflow::document_ctx::DocumentCtx;
use crate::workflow::extraction::{self, ExtractionResult};

/// 抽取方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Llm,
    Pattern,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Llm => "llm",
            Method::Pattern => "pattern",
        }
    }
}

/// 单份试卷的处理结果
#[derive(Debug, Clone)]
pub struct DocumentReport {
    pub exam: ExamDocument,
    pub records: Vec<QuestionRecord>,
    pub diagnostics: Diagnostics,
    pub method: Method,
}

/// 文档处理流程
///
/// - 编排转换、抽取、保存
/// - 决定何时用 LLM、何时兜底
/// - 只依赖业务能力（services）
pub struct DocumentFlow {
    converter: Arc<dyn DocumentConverter>,
    llm: Option<Arc<dyn LlmClient>>,
    sink: Arc<dyn RecordSink>,
    warn_writer: WarnWriter,
    segmenter: SegmenterConfig,
}

impl DocumentFlow {
    pub fn new(
        converter: Arc<dyn DocumentConverter>,
        llm: Option<Arc<dyn LlmClient>>,
        sink: Arc<dyn RecordSink>,
        warn_writer: WarnWriter,
        segmenter: SegmenterConfig,
    ) -> Self {
        Self {
            converter,
            llm,
            sink,
            warn_writer,
            segmenter,
        }
    }

    /// 按配置组装默认的服务
    pub fn from_config(config: &Config, scoring: Option<Scoring>) -> Self {
        let llm: Option<Arc<dyn LlmClient>> = if config.llm_enabled {
            if config.llm_api_key.is_empty() {
                warn!("⚠️ LLM_ENABLED 已开启但缺少 LLM_API_KEY，只使用模式切分");
                None
            } else {
                Some(Arc::new(LlmService::new(config)))
            }
        } else {
            None
        };

        Self::new(
            Arc::new(SourceConverter::from_config(config)),
            llm,
            Arc::new(JsonFileStore::new(&config.output_folder)),
            WarnWriter::with_path(&config.warn_file),
            config.segmenter_config(scoring),
        )
    }

    pub async fn run(&self, ctx: &DocumentCtx) -> AppResult<DocumentReport> {
        let document = self.converter.convert(&ctx.path).await?;
        info!(
            "{} 📄 读取完成 ({}, {} 字符)",
            ctx,
            document.converter,
            document.content.chars().count()
        );

        let (records, diagnostics, method) = self.extract(ctx, &document).await?;
        let exam = ExamDocument::summarize(
            &ctx.exam_name,
            &ctx.source_name(),
            method.as_str(),
            &records,
        );

        self.persist(&exam, &records).await?;
        self.write_warnings(ctx, &records);

        Ok(DocumentReport {
            exam,
            records,
            diagnostics,
            method,
        })
    }

    /// LLM 成功时采用 LLM 结果，否则模式切分
    pub async fn extract(
        &self,
        ctx: &DocumentCtx,
        document: &ConvertedDocument,
    ) -> AppResult<(Vec<QuestionRecord>, Diagnostics, Method)> {
        if let Some(llm) = &self.llm {
            match self.llm_stage(ctx, llm.as_ref(), &document.content).await {
                ExtractionResult::Success(records) => {
                    let validator = Validator::new(
                        self.segmenter.min_text_chars,
                        self.segmenter.expected_total_points,
                    );
                    let (records, diagnostics) = validator.validate(records);
                    if !records.is_empty() {
                        info!("{} 🤖 LLM 抽取 {} 道题", ctx, records.len());
                        return Ok((records, diagnostics, Method::Llm));
                    }
                    warn!("{} LLM 结果全部被过滤，改用模式切分", ctx);
                }
                ExtractionResult::PlaceholderDetected => {
                    warn!("{} ⚠️ LLM 返回占位内容，改用模式切分", ctx);
                }
                ExtractionResult::Empty => {
                    info!("{} LLM 未返回可用题目，改用模式切分", ctx);
                }
            }
        }

        let segmentation =
            segmenter::segment_document(&document.content, document.kind, &self.segmenter)
                .inspect_err(|e: &SegmentError| error!("{} ❌ {}", ctx, e))?;
        info!(
            "{} ✂️ 模式切分 {} 道题 (丢弃 {} 条)",
            ctx,
            segmentation.records.len(),
            segmentation.diagnostics.discarded.len()
        );
        Ok((
            segmentation.records,
            segmentation.diagnostics,
            Method::Pattern,
        ))
    }

    async fn llm_stage(&self, ctx: &DocumentCtx, llm: &dyn LlmClient, content: &str) -> ExtractionResult {
        debug!("{} 调用 LLM ({})", ctx, llm.model());
        match llm.complete(&extraction::build_prompt(content)).await {
            Ok(reply) => extraction::parse_llm_reply(&reply, &self.segmenter),
            Err(e) => {
                warn!("{} LLM 调用失败: {}", ctx, e);
                ExtractionResult::Empty
            }
        }
    }

    async fn persist(&self, exam: &ExamDocument, records: &[QuestionRecord]) -> AppResult<()> {
        self.sink
            .persist("exams", &exam.name, &to_value("exams", exam)?)
            .await?;

        let collection = exam.questions_collection();
        for record in records {
            self.sink
                .persist(&collection, &record.id, &to_value(&collection, record)?)
                .await?;
        }
        debug!("写入 {} 道题到 {}", records.len(), collection);
        Ok(())
    }

    fn write_warnings(&self, ctx: &DocumentCtx, records: &[QuestionRecord]) {
        for record in records.iter().filter(|r| !r.complete) {
            if let Err(e) = self.warn_writer.write(&ctx.exam_name, record) {
                error!("{} 写入 {} 失败: {}", ctx, self.warn_writer.path(), e);
            }
        }
    }
}

fn to_value(collection: &str, document: &impl serde::Serialize) -> Result<Value, ServiceError> {
    serde_json::to_value(document).map_err(|e| ServiceError::sink_failed(collection, e))
}
