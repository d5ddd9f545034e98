pub mod exam;
pub mod loaders;
pub mod question;

pub use exam::ExamDocument;
pub use loaders::{load_scoring_file, parse_scoring, scan_documents};
pub use question::{AnswerOption, Identifier, QuestionKind, QuestionPart, QuestionRecord};
