//! Association link storage for the catalog join tables.
//!
//! # Responsibility
//! - Manage quote↔tag, quote↔category and user-favorite↔quote links.
//! - Answer the per-criterion quote-set queries used by search composition.
//! - Clear every join row referencing a record before that record is deleted.
//!
//! # Invariants
//! - Link writes are idempotent; re-linking reports `false` instead of
//!   failing.
//! - Quote sets come back as ordered id sets for deterministic composition.

use crate::model::catalog::{Category, EntityId, EntityKind, Tag};
use crate::repo::record_store::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use std::collections::BTreeSet;

/// Storage interface for many-to-many catalog associations.
///
/// Author→quote membership lives here too: it is an association query even
/// though it reads a foreign key rather than a join table.
pub trait AssociationStore {
    /// Links a tag to a quote. Returns whether a new row was written.
    fn tag_quote(&self, quote_id: EntityId, tag_id: EntityId) -> RepoResult<bool>;
    /// Unlinks a tag from a quote. Returns whether a row was removed.
    fn untag_quote(&self, quote_id: EntityId, tag_id: EntityId) -> RepoResult<bool>;
    /// Puts a quote into a category. Returns whether a new row was written.
    fn categorize_quote(&self, quote_id: EntityId, category_id: EntityId) -> RepoResult<bool>;
    /// Removes a quote from a category. Returns whether a row was removed.
    fn uncategorize_quote(&self, quote_id: EntityId, category_id: EntityId) -> RepoResult<bool>;
    /// Marks a quote as a user favorite. Returns whether a new row was written.
    fn favorite_quote(&self, user_id: EntityId, quote_id: EntityId) -> RepoResult<bool>;
    /// Unmarks a user favorite. Returns whether a row was removed.
    fn unfavorite_quote(&self, user_id: EntityId, quote_id: EntityId) -> RepoResult<bool>;

    /// Ids of quotes carrying the given tag.
    fn quotes_with_tag(&self, tag_id: EntityId) -> RepoResult<BTreeSet<EntityId>>;
    /// Ids of quotes in the given category.
    fn quotes_in_category(&self, category_id: EntityId) -> RepoResult<BTreeSet<EntityId>>;
    /// Ids of quotes written by the given author.
    fn quotes_by_author(&self, author_id: EntityId) -> RepoResult<BTreeSet<EntityId>>;
    /// Ids of quotes the given user marked as favorites.
    fn favorites_of_user(&self, user_id: EntityId) -> RepoResult<BTreeSet<EntityId>>;

    /// Tags attached to one quote, sorted by name.
    fn tags_of_quote(&self, quote_id: EntityId) -> RepoResult<Vec<Tag>>;
    /// Categories holding one quote, sorted by name.
    fn categories_of_quote(&self, quote_id: EntityId) -> RepoResult<Vec<Category>>;

    /// Removes every join row referencing the given record.
    fn clear_links(&self, kind: EntityKind, id: EntityId) -> RepoResult<()>;
}

/// SQLite-backed association store.
pub struct SqliteAssociationStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAssociationStore<'conn> {
    /// Constructs a store from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        for table in ["quote_tags", "quote_categories", "user_quotes"] {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn })
    }

    fn link(&self, sql: &str, left: EntityId, right: EntityId) -> RepoResult<bool> {
        let changed = self.conn.execute(sql, params![left, right])?;
        Ok(changed > 0)
    }

    fn id_set(&self, sql: &str, id: EntityId) -> RepoResult<BTreeSet<EntityId>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([id])?;
        let mut ids = BTreeSet::new();
        while let Some(row) = rows.next()? {
            ids.insert(row.get(0)?);
        }
        Ok(ids)
    }
}

impl AssociationStore for SqliteAssociationStore<'_> {
    fn tag_quote(&self, quote_id: EntityId, tag_id: EntityId) -> RepoResult<bool> {
        self.link(
            "INSERT OR IGNORE INTO quote_tags (quote_id, tag_id) VALUES (?1, ?2);",
            quote_id,
            tag_id,
        )
    }

    fn untag_quote(&self, quote_id: EntityId, tag_id: EntityId) -> RepoResult<bool> {
        self.link(
            "DELETE FROM quote_tags WHERE quote_id = ?1 AND tag_id = ?2;",
            quote_id,
            tag_id,
        )
    }

    fn categorize_quote(&self, quote_id: EntityId, category_id: EntityId) -> RepoResult<bool> {
        self.link(
            "INSERT OR IGNORE INTO quote_categories (quote_id, category_id) VALUES (?1, ?2);",
            quote_id,
            category_id,
        )
    }

    fn uncategorize_quote(&self, quote_id: EntityId, category_id: EntityId) -> RepoResult<bool> {
        self.link(
            "DELETE FROM quote_categories WHERE quote_id = ?1 AND category_id = ?2;",
            quote_id,
            category_id,
        )
    }

    fn favorite_quote(&self, user_id: EntityId, quote_id: EntityId) -> RepoResult<bool> {
        self.link(
            "INSERT OR IGNORE INTO user_quotes (user_id, quote_id) VALUES (?1, ?2);",
            user_id,
            quote_id,
        )
    }

    fn unfavorite_quote(&self, user_id: EntityId, quote_id: EntityId) -> RepoResult<bool> {
        self.link(
            "DELETE FROM user_quotes WHERE user_id = ?1 AND quote_id = ?2;",
            user_id,
            quote_id,
        )
    }

    fn quotes_with_tag(&self, tag_id: EntityId) -> RepoResult<BTreeSet<EntityId>> {
        self.id_set("SELECT quote_id FROM quote_tags WHERE tag_id = ?1;", tag_id)
    }

    fn quotes_in_category(&self, category_id: EntityId) -> RepoResult<BTreeSet<EntityId>> {
        self.id_set(
            "SELECT quote_id FROM quote_categories WHERE category_id = ?1;",
            category_id,
        )
    }

    fn quotes_by_author(&self, author_id: EntityId) -> RepoResult<BTreeSet<EntityId>> {
        self.id_set("SELECT id FROM quotes WHERE author_id = ?1;", author_id)
    }

    fn favorites_of_user(&self, user_id: EntityId) -> RepoResult<BTreeSet<EntityId>> {
        self.id_set(
            "SELECT quote_id FROM user_quotes WHERE user_id = ?1;",
            user_id,
        )
    }

    fn tags_of_quote(&self, quote_id: EntityId) -> RepoResult<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.name
             FROM quote_tags qt
             INNER JOIN tags t ON t.id = qt.tag_id
             WHERE qt.quote_id = ?1
             ORDER BY t.name COLLATE NOCASE ASC;",
        )?;
        let mut rows = stmt.query([quote_id])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(parse_tag_row(row)?);
        }
        Ok(tags)
    }

    fn categories_of_quote(&self, quote_id: EntityId) -> RepoResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.name, c.keywords
             FROM quote_categories qc
             INNER JOIN categories c ON c.id = qc.category_id
             WHERE qc.quote_id = ?1
             ORDER BY c.name COLLATE NOCASE ASC;",
        )?;
        let mut rows = stmt.query([quote_id])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(parse_category_row(row)?);
        }
        Ok(categories)
    }

    fn clear_links(&self, kind: EntityKind, id: EntityId) -> RepoResult<()> {
        match kind {
            EntityKind::Quote => {
                self.conn
                    .execute("DELETE FROM quote_tags WHERE quote_id = ?1;", [id])?;
                self.conn
                    .execute("DELETE FROM quote_categories WHERE quote_id = ?1;", [id])?;
                self.conn
                    .execute("DELETE FROM user_quotes WHERE quote_id = ?1;", [id])?;
            }
            EntityKind::Tag => {
                self.conn
                    .execute("DELETE FROM quote_tags WHERE tag_id = ?1;", [id])?;
            }
            EntityKind::Category => {
                self.conn
                    .execute("DELETE FROM quote_categories WHERE category_id = ?1;", [id])?;
            }
            EntityKind::User => {
                self.conn
                    .execute("DELETE FROM user_quotes WHERE user_id = ?1;", [id])?;
            }
            // Quotes reference authors through a foreign key, not a join table.
            EntityKind::Author => {}
        }
        Ok(())
    }
}

fn parse_tag_row(row: &Row<'_>) -> RepoResult<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn parse_category_row(row: &Row<'_>) -> RepoResult<Category> {
    let raw: Option<String> = row.get(2)?;
    let keywords = match raw {
        Some(raw) => serde_json::from_str(&raw).map_err(|_| {
            RepoError::InvalidData(format!("invalid keywords JSON `{raw}` in categories.keywords"))
        })?,
        None => Vec::new(),
    };
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        keywords,
    })
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
