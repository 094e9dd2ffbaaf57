use nb_core::{Error, RelevancePolicy, Result, SourceDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub mod bolivia;

/// The sources visited by a run and the policy that filters their articles.
///
/// Built once at startup and shared read-only by every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    pub sources: Vec<SourceDescriptor>,
    pub relevance: RelevancePolicy,
}

impl Registry {
    pub fn new(sources: Vec<SourceDescriptor>, relevance: RelevancePolicy) -> Result<Self> {
        let registry = Self { sources, relevance };
        registry.validate()?;
        Ok(registry)
    }

    /// The built-in Bolivian registry.
    pub fn bolivia() -> Result<Self> {
        Self::new(bolivia::sources()?, bolivia::relevance_policy())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let registry: Self = serde_json::from_str(json)?;
        registry.validate()?;
        Ok(registry)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
            .map_err(|e| Error::Config(format!("registry {}: {}", path.display(), e)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(Error::Config("registry has no sources".to_string()));
        }
        let mut names = HashSet::new();
        for source in &self.sources {
            source.validate()?;
            if !names.insert(source.name.as_str()) {
                return Err(Error::Config(format!("duplicate source name: {}", source.name)));
            }
        }
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&SourceDescriptor> {
        let name = name.to_lowercase();
        self.sources.iter().find(|s| s.name.to_lowercase() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nb_core::SelectorSet;
    use std::io::Write;

    #[test]
    fn test_bolivia_registry() {
        let registry = Registry::bolivia().unwrap();
        assert_eq!(registry.sources.len(), 5);
        assert!(registry.find("el deber").is_some());
        assert!(registry.find("Clarín").is_none());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let source = SourceDescriptor::new(
            "El Día",
            "https://www.eldia.com.bo/",
            SelectorSet::new(&["h2.title"], &[], &[], &[]),
        )
        .unwrap();
        let result = Registry::new(vec![source.clone(), source], bolivia::relevance_policy());
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(Registry::new(vec![], bolivia::relevance_policy()).is_err());
    }

    #[test]
    fn test_from_json_file() {
        let json = r#"{
            "sources": [{
                "name": "Prueba",
                "url": "https://example.bo/",
                "selectors": {
                    "headline": ["h2.title"],
                    "summary": ["p.summary"],
                    "image": ["img"],
                    "link": ["a.more"]
                }
            }],
            "relevance": { "version": 2, "keywords": ["obra", "vial"], "rule": "any" }
        }"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let registry = Registry::from_json_file(file.path()).unwrap();
        assert_eq!(registry.sources[0].url.as_str(), "https://example.bo/");
        assert_eq!(registry.relevance.version, 2);
        assert_eq!(registry.relevance.rule, nb_core::FieldRule::Any);
    }

    #[test]
    fn test_round_trip_builtin_registry() {
        let registry = Registry::bolivia().unwrap();
        let json = serde_json::to_string(&registry).unwrap();
        assert_eq!(Registry::from_json_str(&json).unwrap(), registry);
    }
}
