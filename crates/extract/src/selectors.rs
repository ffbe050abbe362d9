//! Ordered CSS selector chains.
//!
//! Class names on the job board are generated and drift between deploys, so
//! every field is looked up through a primary selector followed by looser
//! fallbacks. The first selector that yields a non-empty value wins.

use cp_domain::records::NOT_AVAILABLE;
use scraper::{ElementRef, Html, Selector};

pub struct Chain {
    selectors: Vec<Selector>,
}

impl Chain {
    /// Compile `patterns` in order. Patterns that fail to parse are skipped.
    pub fn new(patterns: &[&str]) -> Self {
        let selectors = patterns
            .iter()
            .filter_map(|p| match Selector::parse(p) {
                Ok(s) => Some(s),
                Err(e) => {
                    tracing::warn!(selector = %p, error = ?e, "ignoring unparsable selector");
                    None
                }
            })
            .collect();
        Self { selectors }
    }

    /// Card nodes from the first selector that matches anything.
    pub fn cards<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        self.selectors
            .iter()
            .map(|s| doc.select(s).collect::<Vec<_>>())
            .find(|found| !found.is_empty())
            .unwrap_or_default()
    }

    pub fn first<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.selectors.iter().find_map(|s| scope.select(s).next())
    }

    /// Normalized text of the first match with non-empty text.
    pub fn text(&self, scope: ElementRef<'_>) -> Option<String> {
        self.selectors.iter().find_map(|s| {
            scope
                .select(s)
                .map(text_of)
                .find(|t| !t.is_empty())
        })
    }

    /// First non-empty value of `attr` across the chain.
    pub fn attr(&self, scope: ElementRef<'_>, attr: &str) -> Option<String> {
        self.selectors.iter().find_map(|s| {
            scope
                .select(s)
                .filter_map(|el| el.value().attr(attr))
                .map(str::trim)
                .find(|v| !v.is_empty())
                .map(str::to_string)
        })
    }

    /// Texts of every match of the first selector that matches anything.
    pub fn all_texts(&self, scope: ElementRef<'_>) -> Vec<String> {
        self.selectors
            .iter()
            .map(|s| {
                scope
                    .select(s)
                    .map(text_of)
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
            })
            .find(|found| !found.is_empty())
            .unwrap_or_default()
    }
}

/// Element text with runs of whitespace collapsed to one space.
pub fn text_of(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn or_na(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Resolve `href` against the page it was found on.
pub fn absolute_url(page_url: &str, href: &str) -> Option<String> {
    let base = url::Url::parse(page_url).ok()?;
    base.join(href).ok().map(|u| u.to_string())
}
