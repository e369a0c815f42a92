//! Generic record storage contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide one get/find/insert/update/delete interface keyed by entity
//!   kind, instead of a repository type per pattern.
//! - Own the duplicate-lookup queries used by validation and the name
//!   lookups used by search.
//!
//! # Invariants
//! - Case-insensitive lookups say so explicitly (`COLLATE NOCASE`); exact
//!   lookups pin `COLLATE BINARY` so schema collation cannot widen them.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::catalog::{
    Author, CatalogDraft, Category, EntityId, EntityKind, Quote, Tag, User,
};
use rusqlite::{params, Connection, Row};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-layer error for record persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound { kind: EntityKind, id: EntityId },
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} {id} not found"),
            Self::InvalidData(message) => write!(f, "invalid persisted record: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Generic storage interface for catalog records.
///
/// One interface covers all five kinds; per-kind typing appears only where
/// the row shapes differ (gets, lists, finders).
pub trait RecordStore {
    /// Inserts one draft and returns the assigned id.
    fn insert(&self, draft: &CatalogDraft) -> RepoResult<EntityId>;
    /// Replaces all caller-editable fields of one record.
    fn update(&self, id: EntityId, draft: &CatalogDraft) -> RepoResult<()>;
    /// Deletes one record. Association rows must be cleared beforehand.
    fn delete(&self, kind: EntityKind, id: EntityId) -> RepoResult<()>;
    /// Counts records of one kind.
    fn count(&self, kind: EntityKind) -> RepoResult<u64>;

    fn get_quote(&self, id: EntityId) -> RepoResult<Option<Quote>>;
    fn get_author(&self, id: EntityId) -> RepoResult<Option<Author>>;
    fn get_tag(&self, id: EntityId) -> RepoResult<Option<Tag>>;
    fn get_category(&self, id: EntityId) -> RepoResult<Option<Category>>;
    fn get_user(&self, id: EntityId) -> RepoResult<Option<User>>;

    fn list_quotes(&self) -> RepoResult<Vec<Quote>>;
    fn list_authors(&self) -> RepoResult<Vec<Author>>;
    fn list_tags(&self) -> RepoResult<Vec<Tag>>;
    fn list_categories(&self) -> RepoResult<Vec<Category>>;
    fn list_users(&self) -> RepoResult<Vec<User>>;

    /// Finds another quote with exactly equal text, excluding `exclude`.
    fn find_quote_by_text(
        &self,
        text: &str,
        exclude: Option<EntityId>,
    ) -> RepoResult<Option<EntityId>>;
    /// Finds another author with the same name, case-insensitively.
    fn find_author_by_name(
        &self,
        name: &str,
        exclude: Option<EntityId>,
    ) -> RepoResult<Option<EntityId>>;
    /// Finds another tag with the same name, case-insensitively.
    fn find_tag_by_name(
        &self,
        name: &str,
        exclude: Option<EntityId>,
    ) -> RepoResult<Option<EntityId>>;
    /// Finds another category with the same name, case-insensitively.
    fn find_category_by_name(
        &self,
        name: &str,
        exclude: Option<EntityId>,
    ) -> RepoResult<Option<EntityId>>;
    /// Finds another user matching on name OR email, both exact.
    fn find_user_by_name_or_email(
        &self,
        name: &str,
        email: &str,
        exclude: Option<EntityId>,
    ) -> RepoResult<Option<EntityId>>;

    /// Exact-name author lookup used for search criterion resolution.
    fn author_by_name(&self, name: &str) -> RepoResult<Option<Author>>;
    /// Exact-name tag lookup used for search criterion resolution.
    fn tag_by_name(&self, name: &str) -> RepoResult<Option<Tag>>;
    /// Exact-name category lookup used for search criterion resolution.
    fn category_by_name(&self, name: &str) -> RepoResult<Option<Category>>;

    /// Ids of quotes whose text contains `needle`, case-insensitively.
    fn search_quote_text(&self, needle: &str) -> RepoResult<BTreeSet<EntityId>>;
    /// Authors whose name contains `needle`, case-insensitively.
    fn search_author_names(&self, needle: &str) -> RepoResult<Vec<Author>>;
    /// Tags whose name contains `needle`, case-insensitively.
    fn search_tag_names(&self, needle: &str) -> RepoResult<Vec<Tag>>;
}

/// SQLite-backed record store.
pub struct SqliteRecordStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordStore<'conn> {
    /// Constructs a store from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_catalog_ready(conn)?;
        Ok(Self { conn })
    }
}

impl RecordStore for SqliteRecordStore<'_> {
    fn insert(&self, draft: &CatalogDraft) -> RepoResult<EntityId> {
        match draft {
            CatalogDraft::Quote(quote) => {
                let Some(author_id) = quote.author_id else {
                    return Err(RepoError::InvalidData(
                        "quote draft has no author_id".to_string(),
                    ));
                };
                self.conn.execute(
                    "INSERT INTO quotes (text, author_id) VALUES (?1, ?2);",
                    params![quote.text, author_id],
                )?;
            }
            CatalogDraft::Author(author) => {
                self.conn.execute(
                    "INSERT INTO authors (name) VALUES (?1);",
                    [author.name.as_str()],
                )?;
            }
            CatalogDraft::Tag(tag) => {
                self.conn
                    .execute("INSERT INTO tags (name) VALUES (?1);", [tag.name.as_str()])?;
            }
            CatalogDraft::Category(category) => {
                self.conn.execute(
                    "INSERT INTO categories (name, keywords) VALUES (?1, ?2);",
                    params![category.name, encode_keywords(&category.keywords)?],
                )?;
            }
            CatalogDraft::User(user) => {
                self.conn.execute(
                    "INSERT INTO users (name, email) VALUES (?1, ?2);",
                    params![user.name, user.email],
                )?;
            }
        }

        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, id: EntityId, draft: &CatalogDraft) -> RepoResult<()> {
        let changed = match draft {
            CatalogDraft::Quote(quote) => {
                let Some(author_id) = quote.author_id else {
                    return Err(RepoError::InvalidData(
                        "quote draft has no author_id".to_string(),
                    ));
                };
                self.conn.execute(
                    "UPDATE quotes SET text = ?1, author_id = ?2 WHERE id = ?3;",
                    params![quote.text, author_id, id],
                )?
            }
            CatalogDraft::Author(author) => self.conn.execute(
                "UPDATE authors SET name = ?1 WHERE id = ?2;",
                params![author.name, id],
            )?,
            CatalogDraft::Tag(tag) => self.conn.execute(
                "UPDATE tags SET name = ?1 WHERE id = ?2;",
                params![tag.name, id],
            )?,
            CatalogDraft::Category(category) => self.conn.execute(
                "UPDATE categories SET name = ?1, keywords = ?2 WHERE id = ?3;",
                params![category.name, encode_keywords(&category.keywords)?, id],
            )?,
            CatalogDraft::User(user) => self.conn.execute(
                "UPDATE users SET name = ?1, email = ?2 WHERE id = ?3;",
                params![user.name, user.email, id],
            )?,
        };

        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: draft.kind(),
                id,
            });
        }

        Ok(())
    }

    fn delete(&self, kind: EntityKind, id: EntityId) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1;", table_for(kind)),
            [id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound { kind, id });
        }

        Ok(())
    }

    fn count(&self, kind: EntityKind) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {};", table_for(kind)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn get_quote(&self, id: EntityId) -> RepoResult<Option<Quote>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, text, author_id FROM quotes WHERE id = ?1;")?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_quote_row(row)?)),
            None => Ok(None),
        }
    }

    fn get_author(&self, id: EntityId) -> RepoResult<Option<Author>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM authors WHERE id = ?1;")?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_author_row(row)?)),
            None => Ok(None),
        }
    }

    fn get_tag(&self, id: EntityId) -> RepoResult<Option<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM tags WHERE id = ?1;")?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_tag_row(row)?)),
            None => Ok(None),
        }
    }

    fn get_category(&self, id: EntityId) -> RepoResult<Option<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, keywords FROM categories WHERE id = ?1;")?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_category_row(row)?)),
            None => Ok(None),
        }
    }

    fn get_user(&self, id: EntityId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, email FROM users WHERE id = ?1;")?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_quotes(&self) -> RepoResult<Vec<Quote>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, text, author_id FROM quotes ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut quotes = Vec::new();
        while let Some(row) = rows.next()? {
            quotes.push(parse_quote_row(row)?);
        }
        Ok(quotes)
    }

    fn list_authors(&self) -> RepoResult<Vec<Author>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM authors ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut authors = Vec::new();
        while let Some(row) = rows.next()? {
            authors.push(parse_author_row(row)?);
        }
        Ok(authors)
    }

    fn list_tags(&self) -> RepoResult<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM tags ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(parse_tag_row(row)?);
        }
        Ok(tags)
    }

    fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, keywords FROM categories ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(parse_category_row(row)?);
        }
        Ok(categories)
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, email FROM users ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn find_quote_by_text(
        &self,
        text: &str,
        exclude: Option<EntityId>,
    ) -> RepoResult<Option<EntityId>> {
        self.find_id(
            "SELECT id FROM quotes
             WHERE text = ?1 COLLATE BINARY
               AND (?2 IS NULL OR id <> ?2)
             LIMIT 1;",
            text,
            exclude,
        )
    }

    fn find_author_by_name(
        &self,
        name: &str,
        exclude: Option<EntityId>,
    ) -> RepoResult<Option<EntityId>> {
        self.find_id(
            "SELECT id FROM authors
             WHERE name = ?1 COLLATE NOCASE
               AND (?2 IS NULL OR id <> ?2)
             LIMIT 1;",
            name,
            exclude,
        )
    }

    fn find_tag_by_name(
        &self,
        name: &str,
        exclude: Option<EntityId>,
    ) -> RepoResult<Option<EntityId>> {
        self.find_id(
            "SELECT id FROM tags
             WHERE name = ?1 COLLATE NOCASE
               AND (?2 IS NULL OR id <> ?2)
             LIMIT 1;",
            name,
            exclude,
        )
    }

    fn find_category_by_name(
        &self,
        name: &str,
        exclude: Option<EntityId>,
    ) -> RepoResult<Option<EntityId>> {
        self.find_id(
            "SELECT id FROM categories
             WHERE name = ?1 COLLATE NOCASE
               AND (?2 IS NULL OR id <> ?2)
             LIMIT 1;",
            name,
            exclude,
        )
    }

    fn find_user_by_name_or_email(
        &self,
        name: &str,
        email: &str,
        exclude: Option<EntityId>,
    ) -> RepoResult<Option<EntityId>> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM users
             WHERE (name = ?1 OR email = ?2)
               AND (?3 IS NULL OR id <> ?3)
             LIMIT 1;",
        )?;
        let mut rows = stmt.query(params![name, email, exclude])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    fn author_by_name(&self, name: &str) -> RepoResult<Option<Author>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM authors WHERE name = ?1 COLLATE BINARY LIMIT 1;")?;
        let mut rows = stmt.query([name])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_author_row(row)?)),
            None => Ok(None),
        }
    }

    fn tag_by_name(&self, name: &str) -> RepoResult<Option<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM tags WHERE name = ?1 COLLATE BINARY LIMIT 1;")?;
        let mut rows = stmt.query([name])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_tag_row(row)?)),
            None => Ok(None),
        }
    }

    fn category_by_name(&self, name: &str) -> RepoResult<Option<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, keywords FROM categories WHERE name = ?1 COLLATE BINARY LIMIT 1;",
        )?;
        let mut rows = stmt.query([name])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_category_row(row)?)),
            None => Ok(None),
        }
    }

    fn search_quote_text(&self, needle: &str) -> RepoResult<BTreeSet<EntityId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM quotes WHERE text LIKE '%' || ?1 || '%';")?;
        let mut rows = stmt.query([needle])?;
        let mut ids = BTreeSet::new();
        while let Some(row) = rows.next()? {
            ids.insert(row.get(0)?);
        }
        Ok(ids)
    }

    fn search_author_names(&self, needle: &str) -> RepoResult<Vec<Author>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name FROM authors WHERE name LIKE '%' || ?1 || '%' ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([needle])?;
        let mut authors = Vec::new();
        while let Some(row) = rows.next()? {
            authors.push(parse_author_row(row)?);
        }
        Ok(authors)
    }

    fn search_tag_names(&self, needle: &str) -> RepoResult<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name FROM tags WHERE name LIKE '%' || ?1 || '%' ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([needle])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(parse_tag_row(row)?);
        }
        Ok(tags)
    }
}

impl SqliteRecordStore<'_> {
    fn find_id(
        &self,
        sql: &str,
        value: &str,
        exclude: Option<EntityId>,
    ) -> RepoResult<Option<EntityId>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params![value, exclude])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }
}

fn table_for(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Quote => "quotes",
        EntityKind::Author => "authors",
        EntityKind::Tag => "tags",
        EntityKind::Category => "categories",
        EntityKind::User => "users",
    }
}

fn parse_quote_row(row: &Row<'_>) -> RepoResult<Quote> {
    Ok(Quote {
        id: row.get("id")?,
        text: row.get("text")?,
        author_id: row.get("author_id")?,
    })
}

fn parse_author_row(row: &Row<'_>) -> RepoResult<Author> {
    Ok(Author {
        id: row.get("id")?,
        name: row.get("name")?,
    })
}

fn parse_tag_row(row: &Row<'_>) -> RepoResult<Tag> {
    Ok(Tag {
        id: row.get("id")?,
        name: row.get("name")?,
    })
}

fn parse_category_row(row: &Row<'_>) -> RepoResult<Category> {
    Ok(Category {
        id: row.get("id")?,
        name: row.get("name")?,
        keywords: decode_keywords(row.get("keywords")?)?,
    })
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
    })
}

fn encode_keywords(keywords: &[String]) -> RepoResult<Option<String>> {
    if keywords.is_empty() {
        return Ok(None);
    }
    serde_json::to_string(keywords)
        .map(Some)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode keywords: {err}")))
}

fn decode_keywords(value: Option<String>) -> RepoResult<Vec<String>> {
    match value {
        Some(raw) => serde_json::from_str(&raw).map_err(|_| {
            RepoError::InvalidData(format!("invalid keywords JSON `{raw}` in categories.keywords"))
        }),
        None => Ok(Vec::new()),
    }
}

fn ensure_catalog_ready(conn: &Connection) -> RepoResult<()> {
    for table in ["quotes", "authors", "tags", "categories", "users"] {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    for column in ["id", "text", "author_id"] {
        if !table_has_column(conn, "quotes", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "quotes",
                column,
            });
        }
    }

    if !table_has_column(conn, "categories", "keywords")? {
        return Err(RepoError::MissingRequiredColumn {
            table: "categories",
            column: "keywords",
        });
    }

    Ok(())
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

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
