//! 文档库写入服务 - 业务能力层
//!
//! 只负责"把一条 JSON 文档写进某个集合"，集合路径由调用方决定

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ServiceError;

/// 文档库写入能力
///
/// `collection` 形如 `exams` 或 `exams/{exam}/questions`。
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn persist(&self, collection: &str, id: &str, document: &Value)
        -> Result<(), ServiceError>;
}

/// 本地 JSON 文档库：集合 → 目录，文档 → `{id}.json`
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 文档在磁盘上的路径
    pub fn document_path(&self, collection: &str, id: &str) -> PathBuf {
        let mut path = self.root.clone();
        for segment in collection.split('/').filter(|s| !s.is_empty()) {
            path.push(sanitize(segment));
        }
        path.push(format!("{}.json", sanitize(id)));
        path
    }
}

#[async_trait]
impl RecordSink for JsonFileStore {
    async fn persist(
        &self,
        collection: &str,
        id: &str,
        document: &Value,
    ) -> Result<(), ServiceError> {
        let path = self.document_path(collection, id);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| ServiceError::sink_failed(collection, e))?;
        }

        let body = serde_json::to_string_pretty(document)
            .map_err(|e| ServiceError::sink_failed(collection, e))?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| ServiceError::sink_failed(collection, e))?;

        debug!("写入 {}", path.display());
        Ok(())
    }
}

/// 去掉路径分隔符和 `..`
fn sanitize(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    if cleaned == ".." || cleaned == "." {
        "_".to_string()
    } else {
        cleaned
    }
}
