//! Catalog use-case service.
//!
//! # Responsibility
//! - Run validation before every write and convert a duplicate outcome into
//!   an error at the point of attempted persistence.
//! - Enforce association-then-record deletion order.
//! - Manage tag/category/favorite links between existing records.
//!
//! # Invariants
//! - Writes read the affected row back before returning.
//! - The service owns no connection; its stores borrow the caller's unit of
//!   work, which is opened and closed outside this layer.

use crate::model::catalog::{
    Author, AuthorDraft, CatalogDraft, Category, CategoryDraft, EntityId, EntityKind, Quote,
    QuoteDraft, Tag, TagDraft, User, UserDraft,
};
use crate::repo::link_store::AssociationStore;
use crate::repo::record_store::{RecordStore, RepoError, RepoResult};
use crate::validate::validator::{Validated, Validator, ValidatorError};
use crate::validate::ValidationError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, CatalogServiceError>;

/// Error surface of the catalog service.
#[derive(Debug)]
pub enum CatalogServiceError {
    /// Input violated a catalog rule.
    Validation(ValidationError),
    /// An equivalent record already exists; nothing was persisted.
    Duplicate { kind: EntityKind },
    /// A referenced record does not exist.
    NotFound { kind: EntityKind, id: EntityId },
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for CatalogServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Duplicate { kind } => write!(f, "an equivalent {kind} already exists"),
            Self::NotFound { kind, id } => write!(f, "{kind} {id} not found"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent catalog state: {details}")
            }
        }
    }
}

impl Error for CatalogServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for CatalogServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for CatalogServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            other => Self::Repo(other),
        }
    }
}

impl From<ValidatorError> for CatalogServiceError {
    fn from(value: ValidatorError) -> Self {
        match value {
            ValidatorError::Invalid(err) => Self::Validation(err),
            ValidatorError::Store(err) => err.into(),
        }
    }
}

/// Caller-facing facade over record and association stores.
pub struct CatalogService<S: RecordStore, L: AssociationStore> {
    records: S,
    links: L,
}

impl<S: RecordStore, L: AssociationStore> CatalogService<S, L> {
    /// Creates a service over the provided store implementations.
    pub fn new(records: S, links: L) -> Self {
        Self { records, links }
    }

    // ---- quotes ----

    /// Creates a quote attributed to an existing author.
    pub fn create_quote(
        &self,
        text: impl Into<String>,
        author_id: EntityId,
    ) -> ServiceResult<Quote> {
        let draft = CatalogDraft::Quote(QuoteDraft {
            text: text.into(),
            author_id: Some(author_id),
        });
        let id = self.persist_new(draft)?;
        self.records
            .get_quote(id)?
            .ok_or(CatalogServiceError::InconsistentState(
                "created quote not found in read-back",
            ))
    }

    /// Replaces a quote's text and attribution.
    pub fn update_quote(
        &self,
        id: EntityId,
        text: impl Into<String>,
        author_id: EntityId,
    ) -> ServiceResult<Quote> {
        let draft = CatalogDraft::Quote(QuoteDraft {
            text: text.into(),
            author_id: Some(author_id),
        });
        self.persist_update(id, draft)?;
        self.records
            .get_quote(id)?
            .ok_or(CatalogServiceError::InconsistentState(
                "updated quote not found in read-back",
            ))
    }

    pub fn delete_quote(&self, id: EntityId) -> ServiceResult<()> {
        self.delete_record(EntityKind::Quote, id)
    }

    // ---- authors ----

    pub fn create_author(&self, name: impl Into<String>) -> ServiceResult<Author> {
        let draft = CatalogDraft::Author(AuthorDraft { name: name.into() });
        let id = self.persist_new(draft)?;
        self.records
            .get_author(id)?
            .ok_or(CatalogServiceError::InconsistentState(
                "created author not found in read-back",
            ))
    }

    pub fn update_author(&self, id: EntityId, name: impl Into<String>) -> ServiceResult<Author> {
        let draft = CatalogDraft::Author(AuthorDraft { name: name.into() });
        self.persist_update(id, draft)?;
        self.records
            .get_author(id)?
            .ok_or(CatalogServiceError::InconsistentState(
                "updated author not found in read-back",
            ))
    }

    /// Deletes an author. Fails at the storage layer while quotes still
    /// reference it.
    pub fn delete_author(&self, id: EntityId) -> ServiceResult<()> {
        self.delete_record(EntityKind::Author, id)
    }

    // ---- tags ----

    pub fn create_tag(&self, name: impl Into<String>) -> ServiceResult<Tag> {
        let draft = CatalogDraft::Tag(TagDraft { name: name.into() });
        let id = self.persist_new(draft)?;
        self.records
            .get_tag(id)?
            .ok_or(CatalogServiceError::InconsistentState(
                "created tag not found in read-back",
            ))
    }

    pub fn update_tag(&self, id: EntityId, name: impl Into<String>) -> ServiceResult<Tag> {
        let draft = CatalogDraft::Tag(TagDraft { name: name.into() });
        self.persist_update(id, draft)?;
        self.records
            .get_tag(id)?
            .ok_or(CatalogServiceError::InconsistentState(
                "updated tag not found in read-back",
            ))
    }

    pub fn delete_tag(&self, id: EntityId) -> ServiceResult<()> {
        self.delete_record(EntityKind::Tag, id)
    }

    // ---- categories ----

    pub fn create_category(
        &self,
        name: impl Into<String>,
        keywords: Vec<String>,
    ) -> ServiceResult<Category> {
        let draft = CatalogDraft::Category(CategoryDraft {
            name: name.into(),
            keywords,
        });
        let id = self.persist_new(draft)?;
        self.records
            .get_category(id)?
            .ok_or(CatalogServiceError::InconsistentState(
                "created category not found in read-back",
            ))
    }

    pub fn update_category(
        &self,
        id: EntityId,
        name: impl Into<String>,
        keywords: Vec<String>,
    ) -> ServiceResult<Category> {
        let draft = CatalogDraft::Category(CategoryDraft {
            name: name.into(),
            keywords,
        });
        self.persist_update(id, draft)?;
        self.records
            .get_category(id)?
            .ok_or(CatalogServiceError::InconsistentState(
                "updated category not found in read-back",
            ))
    }

    pub fn delete_category(&self, id: EntityId) -> ServiceResult<()> {
        self.delete_record(EntityKind::Category, id)
    }

    // ---- users ----

    pub fn create_user(
        &self,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> ServiceResult<User> {
        let draft = CatalogDraft::User(UserDraft {
            name: name.into(),
            email: email.into(),
        });
        let id = self.persist_new(draft)?;
        self.records
            .get_user(id)?
            .ok_or(CatalogServiceError::InconsistentState(
                "created user not found in read-back",
            ))
    }

    pub fn update_user(
        &self,
        id: EntityId,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> ServiceResult<User> {
        let draft = CatalogDraft::User(UserDraft {
            name: name.into(),
            email: email.into(),
        });
        self.persist_update(id, draft)?;
        self.records
            .get_user(id)?
            .ok_or(CatalogServiceError::InconsistentState(
                "updated user not found in read-back",
            ))
    }

    pub fn delete_user(&self, id: EntityId) -> ServiceResult<()> {
        self.delete_record(EntityKind::User, id)
    }

    // ---- links ----

    /// Attaches a tag to a quote. Returns whether the link is new.
    pub fn tag_quote(&self, quote_id: EntityId, tag_id: EntityId) -> ServiceResult<bool> {
        self.require_quote(quote_id)?;
        self.require_tag(tag_id)?;
        Ok(self.links.tag_quote(quote_id, tag_id)?)
    }

    /// Detaches a tag from a quote. Returns whether a link was removed.
    pub fn untag_quote(&self, quote_id: EntityId, tag_id: EntityId) -> ServiceResult<bool> {
        self.require_quote(quote_id)?;
        self.require_tag(tag_id)?;
        Ok(self.links.untag_quote(quote_id, tag_id)?)
    }

    /// Puts a quote into a category. Returns whether the link is new.
    pub fn categorize_quote(
        &self,
        quote_id: EntityId,
        category_id: EntityId,
    ) -> ServiceResult<bool> {
        self.require_quote(quote_id)?;
        self.require_category(category_id)?;
        Ok(self.links.categorize_quote(quote_id, category_id)?)
    }

    /// Removes a quote from a category. Returns whether a link was removed.
    pub fn uncategorize_quote(
        &self,
        quote_id: EntityId,
        category_id: EntityId,
    ) -> ServiceResult<bool> {
        self.require_quote(quote_id)?;
        self.require_category(category_id)?;
        Ok(self.links.uncategorize_quote(quote_id, category_id)?)
    }

    /// Marks a quote as a user favorite. Returns whether the link is new.
    pub fn favorite_quote(&self, user_id: EntityId, quote_id: EntityId) -> ServiceResult<bool> {
        self.require_user(user_id)?;
        self.require_quote(quote_id)?;
        Ok(self.links.favorite_quote(user_id, quote_id)?)
    }

    /// Unmarks a user favorite. Returns whether a link was removed.
    pub fn unfavorite_quote(&self, user_id: EntityId, quote_id: EntityId) -> ServiceResult<bool> {
        self.require_user(user_id)?;
        self.require_quote(quote_id)?;
        Ok(self.links.unfavorite_quote(user_id, quote_id)?)
    }

    // ---- reads ----

    pub fn get_quote(&self, id: EntityId) -> RepoResult<Option<Quote>> {
        self.records.get_quote(id)
    }

    pub fn get_author(&self, id: EntityId) -> RepoResult<Option<Author>> {
        self.records.get_author(id)
    }

    pub fn get_tag(&self, id: EntityId) -> RepoResult<Option<Tag>> {
        self.records.get_tag(id)
    }

    pub fn get_category(&self, id: EntityId) -> RepoResult<Option<Category>> {
        self.records.get_category(id)
    }

    pub fn get_user(&self, id: EntityId) -> RepoResult<Option<User>> {
        self.records.get_user(id)
    }

    pub fn list_quotes(&self) -> RepoResult<Vec<Quote>> {
        self.records.list_quotes()
    }

    pub fn list_authors(&self) -> RepoResult<Vec<Author>> {
        self.records.list_authors()
    }

    pub fn list_tags(&self) -> RepoResult<Vec<Tag>> {
        self.records.list_tags()
    }

    pub fn list_categories(&self) -> RepoResult<Vec<Category>> {
        self.records.list_categories()
    }

    pub fn list_users(&self) -> RepoResult<Vec<User>> {
        self.records.list_users()
    }

    pub fn count(&self, kind: EntityKind) -> RepoResult<u64> {
        self.records.count(kind)
    }

    /// Tags attached to one quote, sorted by name.
    pub fn quote_tags(&self, quote_id: EntityId) -> ServiceResult<Vec<Tag>> {
        self.require_quote(quote_id)?;
        Ok(self.links.tags_of_quote(quote_id)?)
    }

    /// Categories holding one quote, sorted by name.
    pub fn quote_categories(&self, quote_id: EntityId) -> ServiceResult<Vec<Category>> {
        self.require_quote(quote_id)?;
        Ok(self.links.categories_of_quote(quote_id)?)
    }

    /// A user's favorite quotes, in ascending id order.
    pub fn user_favorites(&self, user_id: EntityId) -> ServiceResult<Vec<Quote>> {
        self.require_user(user_id)?;
        let mut quotes = Vec::new();
        for id in self.links.favorites_of_user(user_id)? {
            if let Some(quote) = self.records.get_quote(id)? {
                quotes.push(quote);
            }
        }
        Ok(quotes)
    }

    // ---- internals ----

    fn persist_new(&self, draft: CatalogDraft) -> ServiceResult<EntityId> {
        let kind = draft.kind();
        match Validator::new(&self.records).validate(draft, None)? {
            Validated::Clean(clean) => Ok(self.records.insert(&clean)?),
            Validated::Duplicate => Err(CatalogServiceError::Duplicate { kind }),
        }
    }

    fn persist_update(&self, id: EntityId, draft: CatalogDraft) -> ServiceResult<()> {
        let kind = draft.kind();
        match Validator::new(&self.records).validate(draft, Some(id))? {
            Validated::Clean(clean) => Ok(self.records.update(id, &clean)?),
            Validated::Duplicate => Err(CatalogServiceError::Duplicate { kind }),
        }
    }

    fn delete_record(&self, kind: EntityKind, id: EntityId) -> ServiceResult<()> {
        self.links.clear_links(kind, id)?;
        self.records.delete(kind, id)?;
        info!("event=catalog_delete module=service status=ok kind={kind} id={id}");
        Ok(())
    }

    fn require_quote(&self, id: EntityId) -> ServiceResult<()> {
        if self.records.get_quote(id)?.is_none() {
            return Err(CatalogServiceError::NotFound {
                kind: EntityKind::Quote,
                id,
            });
        }
        Ok(())
    }

    fn require_tag(&self, id: EntityId) -> ServiceResult<()> {
        if self.records.get_tag(id)?.is_none() {
            return Err(CatalogServiceError::NotFound {
                kind: EntityKind::Tag,
                id,
            });
        }
        Ok(())
    }

    fn require_category(&self, id: EntityId) -> ServiceResult<()> {
        if self.records.get_category(id)?.is_none() {
            return Err(CatalogServiceError::NotFound {
                kind: EntityKind::Category,
                id,
            });
        }
        Ok(())
    }

    fn require_user(&self, id: EntityId) -> ServiceResult<()> {
        if self.records.get_user(id)?.is_none() {
            return Err(CatalogServiceError::NotFound {
                kind: EntityKind::User,
                id,
            });
        }
        Ok(())
    }
}
