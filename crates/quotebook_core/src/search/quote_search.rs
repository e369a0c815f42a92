//! Set-algebra search across tag, category, author and text criteria.
//!
//! # Responsibility
//! - Resolve name criteria against the record store.
//! - Combine per-criterion quote-id sets by union or intersection.
//!
//! # Invariants
//! - Results are materialized in ascending id order.
//! - No criterion at all yields an empty result, never the full catalog.
//! - An empty intermediate set stays empty through later intersections.

use crate::model::catalog::{Author, EntityId, Quote, Tag};
use crate::repo::link_store::AssociationStore;
use crate::repo::record_store::{RecordStore, RepoResult};
use std::collections::BTreeSet;

/// Criteria for [`QuoteSearch::advanced`]. Unset fields do not constrain the
/// result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvancedQuery {
    /// Substring to match in quote text.
    pub text: Option<String>,
    /// Exact author name.
    pub author: Option<String>,
    /// Tag names; composition depends on `match_all_tags`.
    pub tags: Vec<String>,
    /// Category names; composition depends on `match_all_categories`.
    pub categories: Vec<String>,
    pub match_all_tags: bool,
    pub match_all_categories: bool,
}

/// Cross-kind result envelope for [`QuoteSearch::search_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogMatches {
    pub quotes: Vec<Quote>,
    pub authors: Vec<Author>,
    pub tags: Vec<Tag>,
}

/// Search facade over record and association stores.
pub struct QuoteSearch<'a, S: RecordStore, L: AssociationStore> {
    records: &'a S,
    links: &'a L,
}

impl<'a, S: RecordStore, L: AssociationStore> QuoteSearch<'a, S, L> {
    pub fn new(records: &'a S, links: &'a L) -> Self {
        Self { records, links }
    }

    /// Quotes carrying the named tags.
    ///
    /// Names resolving to no tag are skipped silently; when none resolve the
    /// result is empty. `match_all` intersects the per-tag quote sets, seeded
    /// from the first resolved tag; otherwise they are unioned.
    pub fn by_tag_names(&self, names: &[String], match_all: bool) -> RepoResult<Vec<Quote>> {
        let ids = self.tag_quote_ids(names, match_all)?;
        self.materialize(ids)
    }

    /// Quotes in the named categories; same composition as [`Self::by_tag_names`].
    pub fn by_category_names(&self, names: &[String], match_all: bool) -> RepoResult<Vec<Quote>> {
        let ids = self.category_quote_ids(names, match_all)?;
        self.materialize(ids)
    }

    /// Progressive intersection of the given criteria.
    ///
    /// An author name that resolves to nothing empties the result regardless
    /// of the other criteria. With no criteria at all the result is empty.
    pub fn advanced(&self, query: &AdvancedQuery) -> RepoResult<Vec<Quote>> {
        let mut result: Option<BTreeSet<EntityId>> = None;

        if let Some(text) = query.text.as_deref() {
            let needle = text.trim();
            if !needle.is_empty() {
                result = Some(self.records.search_quote_text(needle)?);
            }
        }

        if let Some(name) = query.author.as_deref() {
            let Some(author) = self.records.author_by_name(name)? else {
                return Ok(Vec::new());
            };
            let by_author = self.links.quotes_by_author(author.id)?;
            result = Some(narrow(result, by_author));
        }

        if !query.tags.is_empty() {
            let by_tags = self.tag_quote_ids(&query.tags, query.match_all_tags)?;
            result = Some(narrow(result, by_tags));
        }

        if !query.categories.is_empty() {
            let by_categories =
                self.category_quote_ids(&query.categories, query.match_all_categories)?;
            result = Some(narrow(result, by_categories));
        }

        self.materialize(result.unwrap_or_default())
    }

    /// Substring search across quotes, authors and tags at once.
    pub fn search_all(&self, needle: &str) -> RepoResult<CatalogMatches> {
        let quote_ids = self.records.search_quote_text(needle)?;
        Ok(CatalogMatches {
            quotes: self.materialize(quote_ids)?,
            authors: self.records.search_author_names(needle)?,
            tags: self.records.search_tag_names(needle)?,
        })
    }

    fn tag_quote_ids(&self, names: &[String], match_all: bool) -> RepoResult<BTreeSet<EntityId>> {
        let mut resolved = Vec::new();
        for name in names {
            if let Some(tag) = self.records.tag_by_name(name)? {
                resolved.push(tag.id);
            }
        }
        self.combine(resolved, match_all, |id| self.links.quotes_with_tag(id))
    }

    fn category_quote_ids(
        &self,
        names: &[String],
        match_all: bool,
    ) -> RepoResult<BTreeSet<EntityId>> {
        let mut resolved = Vec::new();
        for name in names {
            if let Some(category) = self.records.category_by_name(name)? {
                resolved.push(category.id);
            }
        }
        self.combine(resolved, match_all, |id| self.links.quotes_in_category(id))
    }

    fn combine(
        &self,
        resolved: Vec<EntityId>,
        match_all: bool,
        quote_set: impl Fn(EntityId) -> RepoResult<BTreeSet<EntityId>>,
    ) -> RepoResult<BTreeSet<EntityId>> {
        let mut ids = resolved.into_iter();
        let Some(first) = ids.next() else {
            return Ok(BTreeSet::new());
        };

        let mut combined = quote_set(first)?;
        for id in ids {
            let next = quote_set(id)?;
            if match_all {
                combined = combined.intersection(&next).copied().collect();
            } else {
                combined.extend(next);
            }
        }
        Ok(combined)
    }

    fn materialize(&self, ids: BTreeSet<EntityId>) -> RepoResult<Vec<Quote>> {
        let mut quotes = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(quote) = self.records.get_quote(id)? {
                quotes.push(quote);
            }
        }
        Ok(quotes)
    }
}

fn narrow(current: Option<BTreeSet<EntityId>>, next: BTreeSet<EntityId>) -> BTreeSet<EntityId> {
    match current {
        Some(current) => current.intersection(&next).copied().collect(),
        None => next,
    }
}
