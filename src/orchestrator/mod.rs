//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量试卷处理器
//! - 管理应用生命周期（初始化、运行）
//! - 扫描输入目录
//! - 控制并发数量（Semaphore）
//! - 输出全局统计信息
//!
//! ### `document_processor` - 单份试卷处理器
//! - 委托 `DocumentFlow` 处理一份试卷
//! - 输出单份试卷的统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<PathBuf>)
//!     ↓
//! document_processor (处理单份试卷)
//!     ↓
//! workflow::DocumentFlow (转换 → 抽取 → 保存)
//!     ↓
//! services (能力层：converter / llm / sink / warn)  +  segmenter (纯计算)
//! ```

pub mod batch_processor;
pub mod document_processor;

pub use batch_processor::{App, ProcessingStats};
pub use document_processor::process_document;
