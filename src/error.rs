use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 切分错误
    #[error("切分错误: {0}")]
    Segment(#[from] SegmentError),
    /// 外部服务错误（转换 / LLM / 文档库）
    #[error("服务错误: {0}")]
    Service(#[from] ServiceError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 切分核心唯一会返回的错误：整份文档没有任何有效记录
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SegmentError {
    #[error("未识别到任何题目 (共 {tokens} 个词, 丢弃 {discarded} 条误匹配)")]
    NoRecordsFound { tokens: usize, discarded: usize },
}

/// 外部服务错误
#[derive(Debug, Error)]
pub enum ServiceError {
    /// 文档转换失败
    #[error("文档转换失败 ({stage}): {message}")]
    ConversionFailed { stage: String, message: String },
    /// 转换服务超时
    #[error("文档转换超时: 已轮询 {attempts} 次")]
    ConversionTimeout { attempts: u32 },
    /// 缺少凭据
    #[error("缺少 {service} 凭据")]
    MissingCredentials { service: String },
    /// 不支持的文件类型
    #[error("不支持的文件类型: {path}")]
    UnsupportedSource { path: String },
    /// LLM 调用失败
    #[error("LLM API调用失败 (模型: {model}, 已尝试 {attempts} 次): {message}")]
    LlmFailed {
        model: String,
        attempts: u32,
        message: String,
    },
    /// LLM 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    LlmEmptyContent { model: String },
    /// 写入文档库失败
    #[error("写入 {collection} 失败: {source}")]
    SinkFailed {
        collection: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// HTTP 请求失败
    #[error("HTTP 请求失败: {0}")]
    Http(#[from] reqwest::Error),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置值不合法
    #[error("配置项 {name} 不合法: {reason}")]
    Invalid { name: String, reason: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }
}

impl ServiceError {
    /// 创建文档库写入错误
    pub fn sink_failed(
        collection: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ServiceError::SinkFailed {
            collection: collection.into(),
            source: Box::new(source),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
