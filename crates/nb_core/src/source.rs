use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Ordered CSS selector patterns for each field of an article.
///
/// Patterns are tried in order and the first one that matches wins. For
/// `headline` the first pattern matching anything on the page supplies every
/// candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectorSet {
    pub headline: Vec<String>,
    #[serde(default)]
    pub summary: Vec<String>,
    #[serde(default)]
    pub image: Vec<String>,
    #[serde(default)]
    pub link: Vec<String>,
}

impl SelectorSet {
    pub fn new(headline: &[&str], summary: &[&str], image: &[&str], link: &[&str]) -> Self {
        fn owned(patterns: &[&str]) -> Vec<String> {
            patterns.iter().map(|p| p.to_string()).collect()
        }
        Self {
            headline: owned(headline),
            summary: owned(summary),
            image: owned(image),
            link: owned(link),
        }
    }
}

/// A news site and the rules used to read its listing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub name: String,
    pub url: Url,
    pub selectors: SelectorSet,
}

impl SourceDescriptor {
    pub fn new(name: &str, url: &str, selectors: SelectorSet) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
        let descriptor = Self {
            name: name.to_string(),
            url,
            selectors,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Config(format!("source for {} has no name", self.url)));
        }
        if !matches!(self.url.scheme(), "http" | "https") {
            return Err(Error::Config(format!("{}: listing URL must be http(s)", self.name)));
        }
        if self.selectors.headline.iter().all(|p| p.trim().is_empty()) {
            return Err(Error::Config(format!("{}: no headline selector", self.name)));
        }
        Ok(())
    }
}
