//! Catalog record and draft types.
//!
//! # Responsibility
//! - Define Quote, Author, Tag, Category and User as persisted rows.
//! - Define the draft shapes that travel through validation before a row
//!   exists.
//!
//! # Invariants
//! - `id` values are assigned by storage and never reused within a kind.
//! - `CatalogDraft` is a closed enum; dispatch over it is exhaustive at
//!   compile time.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Stable storage identifier for every catalog record.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type EntityId = i64;

/// Closed set of record kinds managed by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Quote,
    Author,
    Tag,
    Category,
    User,
}

impl EntityKind {
    /// Returns the storage-facing name for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Author => "author",
            Self::Tag => "tag",
            Self::Category => "category",
            Self::User => "user",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub id: EntityId,
    /// Trimmed quote body, at most 5000 characters.
    pub text: String,
    /// References an existing [`Author`].
    pub author_id: EntityId,
}

/// A persisted author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: EntityId,
    /// Sanitized display name, unique case-insensitively.
    pub name: String,
}

/// A persisted tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: EntityId,
    /// Single lowercase alphanumeric token, unique case-insensitively.
    pub name: String,
}

/// A persisted category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: EntityId,
    /// Trimmed name, at most 50 characters, unique case-insensitively.
    pub name: String,
    /// Ordered keyword list, stored as a JSON array column.
    pub keywords: Vec<String>,
}

/// A persisted user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    /// Trimmed name, at least 3 characters, unique.
    pub name: String,
    /// Trimmed, lowercased address containing `@`, unique.
    pub email: String,
}

/// Caller-supplied quote fields before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteDraft {
    pub text: String,
    /// Optional at validation time; persistence requires it.
    pub author_id: Option<EntityId>,
}

/// Caller-supplied author fields before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorDraft {
    pub name: String,
}

/// Caller-supplied tag fields before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDraft {
    pub name: String,
}

/// Caller-supplied category fields before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Caller-supplied user fields before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
}

/// Constructed-but-unsaved record, dispatched by kind at validation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogDraft {
    Quote(QuoteDraft),
    Author(AuthorDraft),
    Tag(TagDraft),
    Category(CategoryDraft),
    User(UserDraft),
}

impl CatalogDraft {
    /// Returns the entity kind this draft will persist as.
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Quote(_) => EntityKind::Quote,
            Self::Author(_) => EntityKind::Author,
            Self::Tag(_) => EntityKind::Tag,
            Self::Category(_) => EntityKind::Category,
            Self::User(_) => EntityKind::User,
        }
    }
}
