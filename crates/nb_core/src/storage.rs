use async_trait::async_trait;
use crate::types::Article;
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Create the articles table if it does not exist yet
    async fn ensure_schema(&self) -> Result<()>;

    /// Insert a batch of articles keyed by link, ignoring links already stored.
    /// Returns how many rows were actually inserted.
    async fn store_articles(&self, articles: &[Article]) -> Result<usize>;

    /// Get all articles from a specific source
    async fn get_by_source(&self, source: &str) -> Result<Vec<Article>>;

    /// Number of stored rows with this link (0 or 1)
    async fn count_by_link(&self, link: &str) -> Result<usize>;
}
