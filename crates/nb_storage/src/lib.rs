use async_trait::async_trait;
use nb_core::{ArticleStorage, Error, Result};
use std::sync::Arc;
use tracing::{info, warn};

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn get_error_message() -> &'static str;
    async fn connect(url: &str) -> Result<Self> where Self: Sized;
}

/// Which backend a database URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    Sqlite,
    Postgres,
}

impl BackendKind {
    pub fn from_url(url: &str) -> Result<Self> {
        let url = url.trim();
        if url == "memory" || url.starts_with("memory:") {
            Ok(Self::Memory)
        } else if url.starts_with("sqlite:") {
            Ok(Self::Sqlite)
        } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Self::Postgres)
        } else {
            Err(Error::Config(format!(
                "unsupported database URL '{}' (expected postgres://, sqlite: or memory)",
                redact(url)
            )))
        }
    }
}

/// Opens the backend selected by `url` and makes sure the articles table exists.
pub async fn create_storage(url: &str) -> Result<Arc<dyn ArticleStorage>> {
    let kind = BackendKind::from_url(url)?;
    let storage: Arc<dyn ArticleStorage> = match kind {
        BackendKind::Memory => open::<MemoryStorage>(url).await?,
        #[cfg(feature = "sqlite")]
        BackendKind::Sqlite => open::<SQLiteStorage>(url).await?,
        #[cfg(feature = "postgres")]
        BackendKind::Postgres => open::<PostgresStorage>(url).await?,
        #[allow(unreachable_patterns)]
        other => {
            return Err(Error::Config(format!(
                "{:?} backend not compiled in; enable the matching nb_storage feature",
                other
            )))
        }
    };
    storage.ensure_schema().await?;
    info!("🏦 Storage backend ready ({:?} at {})", kind, redact(url));
    Ok(storage)
}

async fn open<B>(url: &str) -> Result<Arc<dyn ArticleStorage>>
where
    B: StorageBackend + ArticleStorage + 'static,
{
    match B::connect(url).await {
        Ok(backend) => Ok(Arc::new(backend)),
        Err(e) => {
            warn!("{}", B::get_error_message());
            Err(e)
        }
    }
}

/// Hides the password of a connection string before it reaches the logs.
pub fn redact(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) if parsed.password().is_some() => {
            let _ = parsed.set_password(Some("****"));
            parsed.to_string()
        }
        _ => url.to_string(),
    }
}
