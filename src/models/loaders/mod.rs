pub mod document_loader;
pub mod toml_loader;

pub use document_loader::{is_supported, scan_documents};
pub use toml_loader::{load_scoring_file, parse_scoring};
