//! Core domain logic for QuoteBook.
//! This crate is the single source of truth for catalog invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod validate;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::catalog::{
    Author, AuthorDraft, CatalogDraft, Category, CategoryDraft, EntityId, EntityKind, Quote,
    QuoteDraft, Tag, TagDraft, User, UserDraft,
};
pub use repo::link_store::{AssociationStore, SqliteAssociationStore};
pub use repo::record_store::{RecordStore, RepoError, RepoResult, SqliteRecordStore};
pub use search::quote_search::{AdvancedQuery, CatalogMatches, QuoteSearch};
pub use service::catalog_service::{CatalogService, CatalogServiceError, ServiceResult};
pub use validate::sanitize::{sanitize_author_name, sanitize_tag_name};
pub use validate::validator::{Validated, Validator, ValidatorError};
pub use validate::ValidationError;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
