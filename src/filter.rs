//! Area and content filtering of feed items.
//!
//! [`filter`] is a pure, order-preserving function: it never mutates its
//! input and returns the accepted subset in feed order.  An item is kept iff
//! it passes both stages:
//!
//! 1. **Area**: no areas on the item, or an empty allowlist, passes.
//!    Otherwise at least one area must be a `County` named in the allowlist,
//!    or (with `always_national`) the nation-wide `Country` area.
//! 2. **Content**: no exclusion terms, or no preamble, passes.  Otherwise
//!    the preamble must not contain any exclusion term, compared as plain
//!    substrings after ASCII lowercasing both sides.

use std::collections::HashSet;

use crate::source::{AreaKind, FeedItem};

/// Filtering rules, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    /// County names to keep.  Empty means no area restriction.
    areas: HashSet<String>,
    /// Always keep nation-wide messages when an allowlist is set.
    always_national: bool,
    /// Lowercased substrings that exclude an item.  Empty means no content
    /// restriction.
    exclusions: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            areas: HashSet::new(),
            always_national: true,
            exclusions: Vec::new(),
        }
    }
}

impl FilterConfig {
    /// Build a config.  Exclusion terms are lowercased; empty terms are
    /// dropped since they would match every preamble.
    pub fn new<A, E>(areas: A, always_national: bool, exclusions: E) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        Self {
            areas: areas.into_iter().map(Into::into).collect(),
            always_national,
            exclusions: exclusions
                .into_iter()
                .filter(|term| !term.as_ref().is_empty())
                .map(|term| term.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn areas(&self) -> &HashSet<String> {
        &self.areas
    }

    pub fn always_national(&self) -> bool {
        self.always_national
    }

    pub fn exclusions(&self) -> &[String] {
        &self.exclusions
    }

    /// `true` when neither stage can reject anything.
    pub fn is_unrestricted(&self) -> bool {
        self.areas.is_empty() && self.exclusions.is_empty()
    }

    fn passes_area(&self, item: &FeedItem) -> bool {
        if item.areas.is_empty() || self.areas.is_empty() {
            return true;
        }
        item.areas.iter().any(|area| {
            (area.kind == AreaKind::County && self.areas.contains(&area.description))
                || (self.always_national && area.is_national())
        })
    }

    fn passes_content(&self, item: &FeedItem) -> bool {
        let Some(preamble) = item.preamble.as_deref() else {
            return true;
        };
        if self.exclusions.is_empty() {
            return true;
        }
        let preamble = preamble.to_ascii_lowercase();
        !self
            .exclusions
            .iter()
            .any(|term| preamble.contains(term.as_str()))
    }

    /// Whether `item` survives both stages.
    pub fn accepts(&self, item: &FeedItem) -> bool {
        let area_ok = self.passes_area(item);
        let content_ok = self.passes_content(item);
        area_ok && content_ok
    }
}

/// Return the items accepted by `cfg`, in their original order.
pub fn filter(items: &[FeedItem], cfg: &FilterConfig) -> Vec<FeedItem> {
    items.iter().filter(|item| cfg.accepts(item)).cloned().collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
