use async_trait::async_trait;
use nb_core::{Article, ArticleStorage, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::StorageBackend;

#[derive(Default)]
pub struct MemoryStore {
    articles: Vec<Article>,
    links: HashSet<String>,
}

impl MemoryStore {
    /// First write wins: a link already present leaves the stored article untouched.
    pub fn insert(&mut self, article: &Article) -> bool {
        if !self.links.insert(article.link.clone()) {
            return false;
        }
        self.articles.push(article.clone());
        true
    }

    pub fn get_by_source(&self, source: &str) -> Vec<Article> {
        self.articles
            .iter()
            .filter(|article| article.source == source)
            .cloned()
            .collect()
    }

    pub fn count_by_link(&self, link: &str) -> usize {
        self.articles.iter().filter(|article| article.link == link).count()
    }
}

#[derive(Clone, Default)]
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn connect(_url: &str) -> Result<Self> where Self: Sized {
        Ok(Self::new())
    }
}

#[async_trait]
impl ArticleStorage for MemoryStorage {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn store_articles(&self, articles: &[Article]) -> Result<usize> {
        let mut store = self.store.write().await;
        Ok(articles.iter().filter(|article| store.insert(article)).count())
    }

    async fn get_by_source(&self, source: &str) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store.get_by_source(source))
    }

    async fn count_by_link(&self, link: &str) -> Result<usize> {
        let store = self.store.read().await;
        Ok(store.count_by_link(link))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article(link: &str, headline: &str) -> Article {
        Article {
            headline: headline.to_string(),
            summary: "Avanza la obra".to_string(),
            image_url: String::new(),
            link: link.to_string(),
            source: "El Deber".to_string(),
            captured_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryStorage::new();
        let stored = storage
            .store_articles(&[
                article("https://eldeber.com.bo/1", "Nueva carretera"),
                article("https://eldeber.com.bo/2", "Puente en el Urubó"),
            ])
            .await
            .unwrap();
        assert_eq!(stored, 2);
        assert_eq!(storage.get_by_source("El Deber").await.unwrap().len(), 2);
        assert!(storage.get_by_source("El Día").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_first_write_wins() {
        let storage = MemoryStorage::new();
        let link = "https://eldeber.com.bo/1";
        assert_eq!(storage.store_articles(&[article(link, "Original")]).await.unwrap(), 1);
        assert_eq!(storage.store_articles(&[article(link, "Reescrito")]).await.unwrap(), 0);

        assert_eq!(storage.count_by_link(link).await.unwrap(), 1);
        let stored = storage.get_by_source("El Deber").await.unwrap();
        assert_eq!(stored[0].headline, "Original");
    }

    #[tokio::test]
    async fn test_duplicates_within_batch() {
        let storage = MemoryStorage::new();
        let link = "https://eldeber.com.bo/1";
        let stored = storage
            .store_articles(&[article(link, "Uno"), article(link, "Dos")])
            .await
            .unwrap();
        assert_eq!(stored, 1);
        assert_eq!(storage.count_by_link(link).await.unwrap(), 1);
        assert_eq!(storage.get_by_source("El Deber").await.unwrap()[0].headline, "Uno");
    }
}
