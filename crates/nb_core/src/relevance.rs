use serde::{Deserialize, Serialize};

use crate::types::Article;

/// How a field with no text is judged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyField {
    #[default]
    Pass,
    Reject,
}

/// How the per-field verdicts for headline and summary are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldRule {
    #[default]
    All,
    Any,
}

/// Keyword gate applied to headline and summary text.
///
/// `version` is bumped whenever the keywords or the rules change so the
/// policy in effect for a run shows up in the logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevancePolicy {
    pub version: u32,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub empty_field: EmptyField,
    #[serde(default)]
    pub rule: FieldRule,
}

impl RelevancePolicy {
    pub fn new(version: u32, keywords: &[&str]) -> Self {
        Self {
            version,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            empty_field: EmptyField::default(),
            rule: FieldRule::default(),
        }
    }

    pub fn with_empty_field(mut self, empty_field: EmptyField) -> Self {
        self.empty_field = empty_field;
        self
    }

    pub fn with_rule(mut self, rule: FieldRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn field_passes(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return self.empty_field == EmptyField::Pass;
        }
        contains_keyword(text, &self.keywords)
    }

    pub fn accepts(&self, article: &Article) -> bool {
        let headline = self.field_passes(&article.headline);
        let summary = self.field_passes(&article.summary);
        match self.rule {
            FieldRule::All => headline && summary,
            FieldRule::Any => headline || summary,
        }
    }
}

/// Case-insensitive keyword containment. Blank text is vacuously relevant.
pub fn is_relevant<S: AsRef<str>>(text: &str, keywords: &[S]) -> bool {
    text.trim().is_empty() || contains_keyword(text, keywords)
}

fn contains_keyword<S: AsRef<str>>(text: &str, keywords: &[S]) -> bool {
    let text = text.to_lowercase();
    keywords
        .iter()
        .map(|k| k.as_ref().trim())
        .filter(|k| !k.is_empty())
        .any(|k| text.contains(&k.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article(headline: &str, summary: &str) -> Article {
        Article {
            headline: headline.to_string(),
            summary: summary.to_string(),
            image_url: String::new(),
            link: "https://example.bo/noticias/1".to_string(),
            source: "test".to_string(),
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_relevant() {
        assert!(is_relevant("", &["vial"]));
        assert!(is_relevant("   ", &["vial", "obra"]));
        assert!(is_relevant("", &[] as &[&str]));
        assert!(is_relevant("Proyecto vial en Santa Cruz", &["vial"]));
        assert!(!is_relevant("Receta de cocina", &["vial", "obra"]));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(is_relevant("NUEVA OBRA EN EL URUBÓ", &["urubó"]));
        assert!(is_relevant("avances en santa cruz", &["Santa Cruz"]));
        assert!(is_relevant("Construcción del puente", &["construcción"]));
    }

    #[test]
    fn test_keyword_order_irrelevant() {
        let text = "Ingeniería y urbanismo";
        assert_eq!(
            is_relevant(text, &["obra", "urbanismo"]),
            is_relevant(text, &["urbanismo", "obra"])
        );
    }

    #[test]
    fn test_policy_requires_both_fields() {
        let policy = RelevancePolicy::new(1, &["vial", "obra"]);
        assert!(policy.accepts(&article("Obra vial", "Inicia la obra")));
        assert!(policy.accepts(&article("Obra vial", "")));
        assert!(!policy.accepts(&article("Obra vial", "Receta de cocina")));
        assert!(!policy.accepts(&article("Receta de cocina", "Obra")));
    }

    #[test]
    fn test_policy_any_rule() {
        let policy = RelevancePolicy::new(2, &["vial"]).with_rule(FieldRule::Any);
        assert!(policy.accepts(&article("Receta de cocina", "Tramo vial")));
        assert!(!policy.accepts(&article("Receta de cocina", "Postres")));
    }

    #[test]
    fn test_policy_reject_empty() {
        let policy = RelevancePolicy::new(3, &["vial"]).with_empty_field(EmptyField::Reject);
        assert!(!policy.accepts(&article("Obra vial", "")));
        assert!(policy.accepts(&article("Obra vial", "Tramo vial")));
    }

    #[test]
    fn test_policy_deserialize_defaults() {
        let json = r#"{"version": 4, "keywords": ["obra"]}"#;
        let policy: RelevancePolicy = serde_json::from_str(json).unwrap();
        assert_eq!(policy.empty_field, EmptyField::Pass);
        assert_eq!(policy.rule, FieldRule::All);

        let json = r#"{"version": 5, "keywords": [], "empty_field": "reject", "rule": "any"}"#;
        let policy: RelevancePolicy = serde_json::from_str(json).unwrap();
        assert_eq!(policy.empty_field, EmptyField::Reject);
        assert_eq!(policy.rule, FieldRule::Any);
    }
}
