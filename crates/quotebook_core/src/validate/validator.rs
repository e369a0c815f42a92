//! Per-kind validation with an explicit duplicate outcome.
//!
//! # Responsibility
//! - Check caller-supplied drafts against catalog rules and sanitize them.
//! - Report "an equivalent record already exists" as data, never as an error;
//!   callers decide at the persistence point whether that is fatal.
//!
//! # Invariants
//! - Store failures propagate unchanged; the validator never converts or
//!   swallows them.
//! - Duplicate lookups exclude `exclude` so updates do not collide with the
//!   record being updated.

use crate::model::catalog::{
    AuthorDraft, CatalogDraft, CategoryDraft, EntityId, QuoteDraft, TagDraft, UserDraft,
};
use crate::repo::record_store::{RecordStore, RepoError};
use crate::validate::sanitize::{sanitize_author_name, sanitize_tag_name};
use crate::validate::{
    ValidationError, MAX_CATEGORY_NAME_CHARS, MAX_QUOTE_TEXT_CHARS, MIN_USER_NAME_CHARS,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Outcome of a validation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Validated {
    /// Sanitized draft, ready to persist.
    Clean(CatalogDraft),
    /// Another record with the same identity already exists.
    Duplicate,
}

/// Error raised by [`Validator::validate`].
#[derive(Debug)]
pub enum ValidatorError {
    /// A catalog rule was violated.
    Invalid(ValidationError),
    /// A duplicate lookup or reference check failed at the storage layer.
    Store(RepoError),
}

impl Display for ValidatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ValidatorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<ValidationError> for ValidatorError {
    fn from(value: ValidationError) -> Self {
        Self::Invalid(value)
    }
}

impl From<RepoError> for ValidatorError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

/// Rule checker for constructed-but-unsaved catalog records.
pub struct Validator<'a, S: RecordStore> {
    store: &'a S,
}

impl<'a, S: RecordStore> Validator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Validates one draft, excluding `exclude` from duplicate lookups on
    /// updates.
    ///
    /// Field rules run first, then the duplicate lookup, then reference
    /// checks, matching persistence order expectations of callers.
    pub fn validate(
        &self,
        draft: CatalogDraft,
        exclude: Option<EntityId>,
    ) -> Result<Validated, ValidatorError> {
        match draft {
            CatalogDraft::Quote(draft) => self.validate_quote(draft, exclude),
            CatalogDraft::Author(draft) => self.validate_author(draft, exclude),
            CatalogDraft::Tag(draft) => self.validate_tag(draft, exclude),
            CatalogDraft::Category(draft) => self.validate_category(draft, exclude),
            CatalogDraft::User(draft) => self.validate_user(draft, exclude),
        }
    }

    fn validate_quote(
        &self,
        draft: QuoteDraft,
        exclude: Option<EntityId>,
    ) -> Result<Validated, ValidatorError> {
        let text = draft.text.trim().to_string();
        if text.is_empty() {
            return Err(ValidationError::EmptyQuoteText.into());
        }

        let chars = text.chars().count();
        if chars > MAX_QUOTE_TEXT_CHARS {
            return Err(ValidationError::QuoteTextTooLong { chars }.into());
        }

        if self.store.find_quote_by_text(&text, exclude)?.is_some() {
            return Ok(Validated::Duplicate);
        }

        if let Some(author_id) = draft.author_id {
            if self.store.get_author(author_id)?.is_none() {
                return Err(ValidationError::UnknownAuthor(author_id).into());
            }
        }

        Ok(Validated::Clean(CatalogDraft::Quote(QuoteDraft {
            text,
            author_id: draft.author_id,
        })))
    }

    fn validate_author(
        &self,
        draft: AuthorDraft,
        exclude: Option<EntityId>,
    ) -> Result<Validated, ValidatorError> {
        if draft.name.trim().is_empty() {
            return Err(ValidationError::EmptyAuthorName.into());
        }

        let name = sanitize_author_name(&draft.name);
        if name.is_empty() {
            return Err(ValidationError::EmptyAuthorName.into());
        }

        if self.store.find_author_by_name(&name, exclude)?.is_some() {
            return Ok(Validated::Duplicate);
        }

        Ok(Validated::Clean(CatalogDraft::Author(AuthorDraft { name })))
    }

    fn validate_tag(
        &self,
        draft: TagDraft,
        exclude: Option<EntityId>,
    ) -> Result<Validated, ValidatorError> {
        if draft.name.trim().is_empty() {
            return Err(ValidationError::EmptyTagName.into());
        }

        let name = sanitize_tag_name(&draft.name)?;

        if self.store.find_tag_by_name(&name, exclude)?.is_some() {
            return Ok(Validated::Duplicate);
        }

        Ok(Validated::Clean(CatalogDraft::Tag(TagDraft { name })))
    }

    fn validate_category(
        &self,
        draft: CategoryDraft,
        exclude: Option<EntityId>,
    ) -> Result<Validated, ValidatorError> {
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyCategoryName.into());
        }

        let chars = name.chars().count();
        if chars > MAX_CATEGORY_NAME_CHARS {
            return Err(ValidationError::CategoryNameTooLong { chars }.into());
        }

        if self.store.find_category_by_name(&name, exclude)?.is_some() {
            return Ok(Validated::Duplicate);
        }

        Ok(Validated::Clean(CatalogDraft::Category(CategoryDraft {
            name,
            keywords: draft.keywords,
        })))
    }

    fn validate_user(
        &self,
        draft: UserDraft,
        exclude: Option<EntityId>,
    ) -> Result<Validated, ValidatorError> {
        let name = draft.name.trim().to_string();
        let chars = name.chars().count();
        if chars < MIN_USER_NAME_CHARS {
            return Err(ValidationError::UserNameTooShort { chars }.into());
        }

        let email = draft.email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(ValidationError::InvalidEmail(email).into());
        }

        if self
            .store
            .find_user_by_name_or_email(&name, &email, exclude)?
            .is_some()
        {
            return Ok(Validated::Duplicate);
        }

        Ok(Validated::Clean(CatalogDraft::User(UserDraft {
            name,
            email,
        })))
    }
}
