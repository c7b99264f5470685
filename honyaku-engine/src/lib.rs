pub mod crawler;
pub mod dom;
pub mod error;
pub mod frontier;
pub mod result;
pub mod rewrite;
pub mod translator;
pub mod writer;

pub use crawler::{Crawler, ProgressCallback, ResultCallback};
pub use error::EngineError;
pub use frontier::Frontier;
pub use result::PageResult;
pub use rewrite::RewriteSummary;
pub use translator::{HttpTranslator, SharedTranslator, Translate};
pub use writer::OutputWriter;
