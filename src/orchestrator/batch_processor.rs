//! 批量试卷处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量试卷的处理和资源管理。
//!
//! 1. **应用初始化**：写日志文件头、加载计分方案、组装服务
//! 2. **批量扫描**：扫描输入目录中所有可处理的试卷
//! 3. **并发控制**：使用 Semaphore 限制并发数量
//! 4. **分批处理**：每批完成后再开始下一批
//! 5. **全局统计**：汇总所有试卷的处理结果

use crate::config::Config;
use crate::models::{load_scoring_file, scan_documents};
use crate::orchestrator::document_processor;
use crate::utils::logging::{
    init_log_file, log_batch_complete, log_batch_start, log_documents_loaded, log_startup,
    print_final_stats,
};
use crate::workflow::DocumentFlow;
use anyhow::{Context, Result};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    flow: Arc<DocumentFlow>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;
        init_log_file(&config.output_log_file)?;
        log_startup(config.max_concurrent_documents, config.llm_enabled);

        let scoring = match &config.scoring_file {
            Some(path) => {
                let scoring = load_scoring_file(Path::new(path))
                    .await
                    .with_context(|| format!("无法加载计分方案: {}", path))?;
                Some(scoring)
            }
            None => None,
        };

        let flow = DocumentFlow::from_config(&config, scoring);
        Ok(Self::with_flow(config, flow))
    }

    /// 使用自定义流程（例如替换了服务实现）创建应用
    pub fn with_flow(config: Config, flow: DocumentFlow) -> Self {
        Self {
            config,
            flow: Arc::new(flow),
        }
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<ProcessingStats> {
        info!("\n📁 正在扫描待处理的试卷...");
        let documents = scan_documents(&self.config.input_folder).await?;

        if documents.is_empty() {
            warn!("⚠️ 没有找到待处理的试卷，程序结束");
            return Ok(ProcessingStats::default());
        }

        log_documents_loaded(documents.len(), self.config.max_concurrent_documents);

        let stats = self.process_all_documents(documents).await?;

        print_final_stats(
            stats.success,
            stats.failed,
            stats.total,
            stats.questions,
            &self.config.output_log_file,
        );

        Ok(stats)
    }

    async fn process_all_documents(&self, documents: Vec<PathBuf>) -> Result<ProcessingStats> {
        let batch_size = self.config.max_concurrent_documents.max(1);
        let semaphore = Arc::new(Semaphore::new(batch_size));
        let total = documents.len();
        let total_batches = total.div_ceil(batch_size);
        let mut stats = ProcessingStats {
            total,
            ..Default::default()
        };

        for (batch_idx, batch) in documents.chunks(batch_size).enumerate() {
            let batch_start = batch_idx * batch_size;
            log_batch_start(
                batch_idx + 1,
                total_batches,
                batch_start + 1,
                batch_start + batch.len(),
                total,
            );

            let result = self
                .process_batch(batch, batch_start, semaphore.clone())
                .await?;

            stats.success += result.success;
            stats.failed += result.failed;
            stats.questions += result.questions;

            log_batch_complete(batch_idx + 1, result.success, batch.len());
        }

        Ok(stats)
    }

    async fn process_batch(
        &self,
        batch: &[PathBuf],
        batch_start: usize,
        semaphore: Arc<Semaphore>,
    ) -> Result<BatchResult> {
        let mut handles = Vec::with_capacity(batch.len());

        for (idx, path) in batch.iter().enumerate() {
            let index = batch_start + idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;
            let flow = self.flow.clone();
            let path = path.clone();
            let log_file = self.config.output_log_file.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                document_processor::process_document(&flow, path, index, &log_file).await
            });
            handles.push((index, handle));
        }

        let outcomes = join_all(
            handles
                .into_iter()
                .map(|(index, handle)| async move { (index, handle.await) }),
        )
        .await;

        let mut result = BatchResult::default();
        for (index, outcome) in outcomes {
            match outcome {
                Ok(Ok(questions)) => {
                    result.success += 1;
                    result.questions += questions;
                }
                Ok(Err(_)) => result.failed += 1,
                Err(e) => {
                    error!("[试卷 {}] 任务执行失败: {}", index, e);
                    result.failed += 1;
                }
            }
        }

        Ok(result)
    }
}

/// 处理统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
    /// 写入的题目总数
    pub questions: usize,
}

/// 批次处理结果
#[derive(Debug, Default)]
struct BatchResult {
    success: usize,
    failed: usize,
    questions: usize,
}
