pub mod document_ctx;
pub mod document_flow;
pub mod extraction;

pub use document_ctx::DocumentCtx;
pub use document_flow::{DocumentFlow, DocumentReport, Method};
pub use extraction::ExtractionResult;
