pub mod error;
pub mod relevance;
pub mod source;
pub mod storage;
pub mod types;

pub use error::Error;
pub use relevance::{is_relevant, EmptyField, FieldRule, RelevancePolicy};
pub use source::{SelectorSet, SourceDescriptor};
pub use storage::ArticleStorage;
pub use types::Article;

pub type Result<T> = std::result::Result<T, Error>;
