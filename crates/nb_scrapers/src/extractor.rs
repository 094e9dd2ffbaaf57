//! Selector-driven extraction of articles from a listing page.
//!
//! Candidates are the nodes matched by a source's headline patterns. For
//! every candidate the extractor climbs to the nearest article-like
//! container and reads summary, image and link from inside it.

use chrono::Utc;
use nb_core::types::truncate_summary;
use nb_core::{Article, Error, Result, SourceDescriptor};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

/// Candidates kept per source and run.
pub const DEFAULT_MAX_CANDIDATES: usize = 5;

const CONTAINER_TAGS: &[&str] = &["article"];
const CONTAINER_CLASSES: &[&str] = &[
    "article", "post", "news", "news-item", "entry", "story", "teaser", "card", "hentry",
];

/// Why a candidate was dropped before becoming an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gap {
    EmptyHeadline { position: usize },
    MissingLink { headline: String },
}

#[derive(Debug, Default)]
pub struct Extraction {
    pub articles: Vec<Article>,
    pub candidates: usize,
    pub gaps: Vec<Gap>,
}

pub struct Extractor<'a> {
    source: &'a SourceDescriptor,
    headline: Vec<Selector>,
    summary: Vec<Selector>,
    image: Vec<Selector>,
    link: Vec<Selector>,
    anchor: Selector,
    max_candidates: usize,
}

impl<'a> Extractor<'a> {
    pub fn new(source: &'a SourceDescriptor, max_candidates: usize) -> Result<Self> {
        let selectors = &source.selectors;
        Ok(Self {
            source,
            headline: compile(&selectors.headline)?,
            summary: compile(&selectors.summary)?,
            image: compile(&selectors.image)?,
            link: compile(&selectors.link)?,
            anchor: parse_selector("a[href]")?,
            max_candidates,
        })
    }

    pub fn extract(&self, markup: &str) -> Result<Extraction> {
        if markup.trim().is_empty() {
            return Err(Error::Parse(format!("{}: empty document", self.source.name)));
        }
        let document = Html::parse_document(markup);
        if !has_content(&document) {
            return Err(Error::Parse(format!("{}: document has no elements", self.source.name)));
        }

        let candidates = self.candidates(&document);
        let captured_at = Utc::now();
        let mut extraction = Extraction {
            candidates: candidates.len(),
            ..Default::default()
        };

        for (position, &node) in candidates.iter().enumerate() {
            let headline = node_text(node);
            if headline.is_empty() {
                extraction.gaps.push(Gap::EmptyHeadline { position });
                continue;
            }

            let container = container_of(node, &candidates);
            let summary = first_match(container, &self.summary)
                .map(node_text)
                .unwrap_or_default();
            let image_url = first_match(container, &self.image)
                .and_then(|image| self.image_url(image))
                .map(String::from)
                .unwrap_or_default();

            let Some(link) = self.link_for(container, node) else {
                debug!("🔗 No usable link for '{}' on {}", headline, self.source.name);
                extraction.gaps.push(Gap::MissingLink { headline });
                continue;
            };

            extraction.articles.push(Article {
                headline,
                summary: truncate_summary(&summary),
                image_url,
                link: link.into(),
                source: self.source.name.clone(),
                captured_at,
            });
        }

        Ok(extraction)
    }

    /// Nodes matched by the first headline pattern that matches anything, capped.
    fn candidates<'d>(&self, document: &'d Html) -> Vec<ElementRef<'d>> {
        self.headline
            .iter()
            .map(|selector| document.select(selector).take(self.max_candidates).collect::<Vec<_>>())
            .find(|nodes| !nodes.is_empty())
            .unwrap_or_default()
    }

    fn link_for(&self, container: ElementRef, node: ElementRef) -> Option<Url> {
        let href = match first_match(container, &self.link) {
            Some(matched) => self.href_of(matched),
            None => self.href_of(node),
        }?;
        web_url(&self.source.url, href)
    }

    /// First of `src` and `data-src` that resolves to a web URL. Lazy loaders
    /// park a `data:` placeholder in `src`, which is skipped.
    fn image_url(&self, image: ElementRef) -> Option<Url> {
        let value = image.value();
        ["src", "data-src"]
            .into_iter()
            .filter_map(|attr| value.attr(attr))
            .map(str::trim)
            .filter(|src| !src.is_empty())
            .find_map(|src| web_url(&self.source.url, src))
    }

    /// The element's own href, or the href of the first anchor inside it.
    fn href_of<'d>(&self, element: ElementRef<'d>) -> Option<&'d str> {
        let own = element.value().attr("href");
        let nested = || element.select(&self.anchor).next().and_then(|a| a.value().attr("href"));
        own.or_else(nested).map(str::trim).filter(|href| !href.is_empty())
    }
}

fn parse_selector(pattern: &str) -> Result<Selector> {
    Selector::parse(pattern).map_err(|e| Error::InvalidSelector(format!("{}: {:?}", pattern, e)))
}

fn compile(patterns: &[String]) -> Result<Vec<Selector>> {
    patterns
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(parse_selector)
        .collect()
}

fn has_content(document: &Html) -> bool {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .any(|el| !matches!(el.value().name(), "html" | "head" | "body"))
}

/// Text content with runs of whitespace collapsed to single spaces.
fn node_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_container(element: &ElementRef) -> bool {
    let value = element.value();
    CONTAINER_TAGS.contains(&value.name())
        || value.classes().any(|class| CONTAINER_CLASSES.contains(&class))
}

fn holds_other_candidate(
    ancestor: ElementRef,
    node: ElementRef,
    candidates: &[ElementRef],
) -> bool {
    candidates
        .iter()
        .filter(|other| other.id() != node.id())
        .any(|other| other.ancestors().any(|a| a.id() == ancestor.id()))
}

/// Smallest article-like ancestor that belongs to this candidate alone.
///
/// When the nearest marked ancestor wraps other candidates too (a list with
/// class `news`, say), the candidate's own item below it is used instead, or
/// the node itself when there is no such item.
fn container_of<'d>(node: ElementRef<'d>, candidates: &[ElementRef<'d>]) -> ElementRef<'d> {
    let mut own_item = node;
    let mut ancestors = node.ancestors().filter_map(ElementRef::wrap);
    while let Some(ancestor) = ancestors.next() {
        if holds_other_candidate(ancestor, node, candidates) {
            let shared_marker = is_container(&ancestor) || ancestors.any(|a| is_container(&a));
            return if shared_marker { own_item } else { node };
        }
        if is_container(&ancestor) {
            return ancestor;
        }
        own_item = ancestor;
    }
    node
}

/// First element matching any of `selectors` in order, the scope itself included.
fn first_match<'d>(scope: ElementRef<'d>, selectors: &[Selector]) -> Option<ElementRef<'d>> {
    selectors.iter().find_map(|selector| {
        if selector.matches(&scope) {
            Some(scope)
        } else {
            scope.select(selector).next()
        }
    })
}

/// `reference` resolved against `base`, kept only when it is http(s).
fn web_url(base: &Url, reference: &str) -> Option<Url> {
    base.join(reference)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}
