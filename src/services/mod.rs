pub mod converter;
pub mod llm_service;
pub mod record_sink;
pub mod warn_writer;

pub use converter::{ConvertedDocument, DocumentConverter, MathpixConverter, SourceConverter};
pub use llm_service::{LlmClient, LlmService};
pub use record_sink::{JsonFileStore, RecordSink};
pub use warn_writer::WarnWriter;
