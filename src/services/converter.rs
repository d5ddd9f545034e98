//! 文档转换服务 - 业务能力层
//!
//! 只负责"把源文件变成可切分的文本"，不关心切分和保存
//!
//! - HTML / Markdown / 纯文本：直接读取
//! - PDF：交给 Mathpix 转成 Markdown

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, FileError, ServiceError};
use crate::segmenter::SourceKind;

/// 转换后的文档
#[derive(Debug, Clone)]
pub struct ConvertedDocument {
    pub content: String,
    pub kind: SourceKind,
    /// 使用的转换方式，例如 `direct` / `mathpix`
    pub converter: &'static str,
}

/// 文档转换能力
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    async fn convert(&self, path: &Path) -> AppResult<ConvertedDocument>;
}

/// 默认转换器：文本类文件直接读取，PDF 走 Mathpix（如已配置）
pub struct SourceConverter {
    mathpix: Option<MathpixConverter>,
}

impl SourceConverter {
    pub fn new(mathpix: Option<MathpixConverter>) -> Self {
        Self { mathpix }
    }

    pub fn from_config(config: &Config) -> Self {
        let mathpix = if config.has_mathpix_credentials() {
            Some(MathpixConverter::new(config))
        } else {
            None
        };
        Self::new(mathpix)
    }
}

#[async_trait]
impl DocumentConverter for SourceConverter {
    async fn convert(&self, path: &Path) -> AppResult<ConvertedDocument> {
        if let Some(kind) = SourceKind::from_path(path) {
            let content = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| read_error(path, e))?;
            debug!("直接读取 {} ({} 字节)", path.display(), content.len());
            return Ok(ConvertedDocument {
                content,
                kind,
                converter: "direct",
            });
        }

        if is_pdf(path) {
            let mathpix = self.mathpix.as_ref().ok_or_else(|| ServiceError::MissingCredentials {
                service: "Mathpix".to_string(),
            })?;
            let content = mathpix.convert_pdf(path).await?;
            return Ok(ConvertedDocument {
                content,
                kind: SourceKind::Markdown,
                converter: "mathpix",
            });
        }

        Err(ServiceError::UnsupportedSource {
            path: path.display().to_string(),
        }
        .into())
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

fn read_error(path: &Path, source: std::io::Error) -> AppError {
    if source.kind() == std::io::ErrorKind::NotFound {
        AppError::File(FileError::NotFound {
            path: path.display().to_string(),
        })
    } else {
        AppError::file_read_failed(path.display().to_string(), source)
    }
}

// ========== Mathpix ==========

#[derive(Debug, Deserialize)]
struct UploadResponse {
    pdf_id: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    error: Option<String>,
}

/// Mathpix PDF → Markdown 转换
pub struct MathpixConverter {
    http: reqwest::Client,
    base_url: String,
    app_id: String,
    app_key: String,
    poll_attempts: u32,
    poll_interval: Duration,
}

impl MathpixConverter {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.mathpix_api_url.trim_end_matches('/').to_string(),
            app_id: config.mathpix_app_id.clone(),
            app_key: config.mathpix_app_key.clone(),
            poll_attempts: config.mathpix_poll_attempts.max(1),
            poll_interval: Duration::from_millis(config.mathpix_poll_interval_ms),
        }
    }

    /// 上传 → 轮询 → 下载 Markdown
    pub async fn convert_pdf(&self, path: &Path) -> AppResult<String> {
        let bytes = tokio::fs::read(path).await.map_err(|e| read_error(path, e))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.pdf")
            .to_string();

        info!("📤 上传 PDF 到 Mathpix: {}", file_name);
        let pdf_id = self.upload(bytes, file_name).await?;
        self.wait_for_completion(&pdf_id).await?;
        let markdown = self.fetch_markdown(&pdf_id).await?;
        info!("✓ Mathpix 转换完成: {} 字符", markdown.chars().count());
        Ok(markdown)
    }

    fn options_json() -> String {
        serde_json::json!({
            "conversion_formats": { "md": true },
            "math_inline_delimiters": ["$", "$"],
            "math_display_delimiters": ["$$", "$$"],
            "rm_spaces": true,
        })
        .to_string()
    }

    async fn upload(&self, bytes: Vec<u8>, file_name: String) -> Result<String, ServiceError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("options_json", Self::options_json());

        let response = self
            .http
            .post(format!("{}/pdf", self.base_url))
            .header("app_id", &self.app_id)
            .header("app_key", &self.app_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(conversion_failed("upload", format!("{} - {}", status, body)));
        }

        let upload: UploadResponse = response.json().await?;
        match (upload.pdf_id, upload.error) {
            (Some(id), _) => {
                debug!("Mathpix PDF ID: {}", id);
                Ok(id)
            }
            (None, error) => Err(conversion_failed(
                "upload",
                error.unwrap_or_else(|| "响应中没有 pdf_id".to_string()),
            )),
        }
    }

    async fn wait_for_completion(&self, pdf_id: &str) -> Result<(), ServiceError> {
        for attempt in 1..=self.poll_attempts {
            let status = self.status(pdf_id).await?;
            debug!("🔄 第 {}/{} 次轮询: {}", attempt, self.poll_attempts, status.status);

            match status.status.as_str() {
                "completed" => return Ok(()),
                "error" => {
                    return Err(conversion_failed(
                        "poll",
                        status.error.unwrap_or_else(|| "unknown error".to_string()),
                    ))
                }
                _ => tokio::time::sleep(self.poll_interval).await,
            }
        }
        warn!("⚠️ Mathpix 转换超时: {}", pdf_id);
        Err(ServiceError::ConversionTimeout {
            attempts: self.poll_attempts,
        })
    }

    async fn status(&self, pdf_id: &str) -> Result<StatusResponse, ServiceError> {
        let response = self
            .http
            .get(format!("{}/pdf/{}", self.base_url, pdf_id))
            .header("app_id", &self.app_id)
            .header("app_key", &self.app_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(conversion_failed("poll", format!("{} - {}", status, body)));
        }
        Ok(response.json().await?)
    }

    async fn fetch_markdown(&self, pdf_id: &str) -> Result<String, ServiceError> {
        let response = self
            .http
            .get(format!("{}/pdf/{}.md", self.base_url, pdf_id))
            .header("app_id", &self.app_id)
            .header("app_key", &self.app_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(conversion_failed("download", format!("{} - {}", status, body)));
        }
        Ok(response.text().await?)
    }
}

fn conversion_failed(stage: &str, message: String) -> ServiceError {
    ServiceError::ConversionFailed {
        stage: stage.to_string(),
        message,
    }
}
