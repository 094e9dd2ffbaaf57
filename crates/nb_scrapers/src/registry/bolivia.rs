//! Bolivian news and construction-industry sites, with emphasis on Santa Cruz.

use nb_core::{RelevancePolicy, Result, SelectorSet, SourceDescriptor};

/// Bumped whenever [`KEYWORDS`] or the field rules change.
pub const POLICY_VERSION: u32 = 1;

pub const KEYWORDS: &[&str] = &[
    "construcción",
    "ingeniería",
    "infraestructura",
    "Santa Cruz",
    "Bolivia",
    "obra",
    "proyecto",
    "urbanismo",
    "Urubó",
    "vial",
];

pub fn relevance_policy() -> RelevancePolicy {
    RelevancePolicy::new(POLICY_VERSION, KEYWORDS)
}

pub fn sources() -> Result<Vec<SourceDescriptor>> {
    Ok(vec![
        SourceDescriptor::new(
            "El Deber",
            "https://eldeber.com.bo/santa-cruz",
            SelectorSet::new(
                &["h3.teaser-title", "h2.headline"],
                &["p.teaser-text", ".excerpt"],
                &["img.teaser-image", ".featured-image img"],
                &["a.teaser-link", "h3 a"],
            ),
        )?,
        SourceDescriptor::new(
            "El Día",
            "https://www.eldia.com.bo/",
            SelectorSet::new(
                &["h2.title", "h3.entry-title"],
                &["p.description"],
                &["img.wp-post-image"],
                &["a.post-link"],
            ),
        )?,
        SourceDescriptor::new(
            "Cadecocruz",
            "https://cadecocruz.org.bo/index.php?pg2=210",
            SelectorSet::new(
                &["h2.news-title"],
                &["p.news-summary"],
                &["img.news-img"],
                &["a.news-link"],
            ),
        )?,
        SourceDescriptor::new(
            "Contacto Construcción",
            "https://contactoconstruccion.com/",
            SelectorSet::new(
                &["h2.post-title"],
                &["p.post-excerpt"],
                &[".post-thumbnail img"],
                &["a.post-url"],
            ),
        )?,
        SourceDescriptor::new(
            "Urgente.bo",
            "https://www.urgente.bo/",
            SelectorSet::new(
                &["h3.article-title"],
                &[".article-summary"],
                &["img.article-img"],
                &["a.read-more"],
            ),
        )?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources() {
        let sources = sources().unwrap();
        assert_eq!(sources.len(), 5);
        assert_eq!(sources[0].name, "El Deber");
        assert_eq!(sources[2].url.query(), Some("pg2=210"));
        assert_eq!(sources[0].selectors.headline, vec!["h3.teaser-title", "h2.headline"]);
        assert!(sources.iter().all(|s| s.validate().is_ok()));
    }

    #[test]
    fn test_relevance_policy() {
        let policy = relevance_policy();
        assert_eq!(policy.version, POLICY_VERSION);
        assert_eq!(policy.keywords.len(), KEYWORDS.len());
        assert!(nb_core::is_relevant("Proyecto vial en Santa Cruz", &policy.keywords));
    }
}
