use async_trait::async_trait;
use nb_core::{Article, ArticleStorage, Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;
use crate::StorageBackend;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS noticias_construccion_bolivia (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        titular TEXT NOT NULL,
        resumen TEXT,
        url_imagen TEXT,
        enlace TEXT UNIQUE,
        fuente TEXT,
        fecha_publicacion TEXT
    )
    "#,
];

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database should be reachable, e.g. DATABASE_URL=sqlite:noticias.db"
    }

    async fn connect(url: &str) -> Result<Self> where Self: Sized {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| Error::Config(format!("Invalid SQLite URL {}: {}", url, e)))?
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to database: {}", e)))?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let storage = Self::connect(&format!("sqlite:{}", db_path.display())).await?;
        storage.ensure_schema().await?;
        Ok(storage)
    }

    /// Rows written by older jobs may carry NULL in any column but `titular`.
    fn article_from_row(row: &SqliteRow) -> Result<Article> {
        let column = |e: sqlx::Error| Error::Database(format!("Failed to read article row: {}", e));
        let text = |name: &str| -> Result<String> {
            Ok(row.try_get::<Option<String>, _>(name).map_err(column)?.unwrap_or_default())
        };

        let link = text("enlace")?;
        let captured_at = text("fecha_publicacion")?;
        if captured_at.is_empty() {
            return Err(Error::Database(format!("Article '{}' has no fecha_publicacion", link)));
        }

        Ok(Article {
            headline: text("titular")?,
            summary: text("resumen")?,
            image_url: text("url_imagen")?,
            link,
            source: text("fuente")?,
            captured_at: chrono::DateTime::parse_from_rfc3339(&captured_at)
                .map_err(|e| Error::Database(format!("Failed to parse date: {}", e)))?
                .with_timezone(&chrono::Utc),
        })
    }
}

fn non_empty(text: &str) -> Option<&str> {
    Some(text).filter(|t| !t.is_empty())
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn ensure_schema(&self) -> Result<()> {
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&*self.pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migration {}: {}", i, e)))?;
        }
        Ok(())
    }

    async fn store_articles(&self, articles: &[Article]) -> Result<usize> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Storage(format!("Failed to open transaction: {}", e)))?;

        let mut inserted = 0;
        for article in articles {
            let result = sqlx::query(
                r#"
                INSERT INTO noticias_construccion_bolivia
                (titular, resumen, url_imagen, enlace, fuente, fecha_publicacion)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT (enlace) DO NOTHING
                "#,
            )
            .bind(&article.headline)
            .bind(non_empty(&article.summary))
            .bind(non_empty(&article.image_url))
            .bind(&article.link)
            .bind(&article.source)
            .bind(article.captured_at.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                Error::Storage(format!("Failed to store article {}: {}", article.link, e))
            })?;

            if result.rows_affected() == 0 {
                debug!("⏭️ Already stored: {}", article.link);
            }
            inserted += result.rows_affected() as usize;
        }

        tx.commit()
            .await
            .map_err(|e| Error::Storage(format!("Failed to commit articles: {}", e)))?;
        Ok(inserted)
    }

    async fn get_by_source(&self, source: &str) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM noticias_construccion_bolivia
            WHERE fuente = ?
            ORDER BY id
            "#,
        )
        .bind(source)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get articles by source: {}", e)))?;

        rows.iter().map(Self::article_from_row).collect()
    }

    async fn count_by_link(&self, link: &str) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) FROM noticias_construccion_bolivia WHERE enlace = ?")
            .bind(link)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to count articles: {}", e)))?;
        Ok(row.get::<i64, _>(0) as usize)
    }
}
