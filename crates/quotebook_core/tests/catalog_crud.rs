use quotebook_core::db::open_db_in_memory;
use quotebook_core::{
    CatalogService, CatalogServiceError, EntityKind, SqliteAssociationStore, SqliteRecordStore,
};
use rusqlite::Connection;

fn service(conn: &Connection) -> CatalogService<SqliteRecordStore<'_>, SqliteAssociationStore<'_>> {
    CatalogService::new(
        SqliteRecordStore::try_new(conn).unwrap(),
        SqliteAssociationStore::try_new(conn).unwrap(),
    )
}

#[test]
fn create_reads_back_sanitized_records() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let author = service.create_author("j k rowling").unwrap();
    assert_eq!(author.name, "J. K. Rowling");

    let quote = service
        .create_quote("  Turn to page 394.  ", author.id)
        .unwrap();
    assert_eq!(quote.text, "Turn to page 394.");
    assert_eq!(quote.author_id, author.id);

    let tag = service.create_tag("Café-Time!").unwrap();
    assert_eq!(tag.name, "cafetime");

    let user = service.create_user("reader", " Reader@Example.com ").unwrap();
    assert_eq!(user.email, "reader@example.com");
}

#[test]
fn duplicate_create_fails_only_at_the_persistence_point() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    service.create_author("Mark Twain").unwrap();
    let err = service.create_author("mark twain").unwrap_err();
    assert!(matches!(
        err,
        CatalogServiceError::Duplicate {
            kind: EntityKind::Author
        }
    ));

    // A rule failure is reported as validation, never as duplicate.
    let err = service.create_author("   ").unwrap_err();
    assert!(matches!(err, CatalogServiceError::Validation(_)));
}

#[test]
fn updating_a_category_to_its_own_name_is_not_a_duplicate() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let category = service
        .create_category("Stoicism", vec!["virtue".to_string()])
        .unwrap();
    let updated = service
        .update_category(category.id, "Stoicism", vec!["virtue".to_string(), "calm".to_string()])
        .unwrap();
    assert_eq!(updated.id, category.id);
    assert_eq!(updated.keywords, vec!["virtue".to_string(), "calm".to_string()]);
}

#[test]
fn category_keywords_round_trip_through_storage() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let with_keywords = service
        .create_category("Life", vec!["living".to_string(), "alive".to_string()])
        .unwrap();
    let loaded = service.get_category(with_keywords.id).unwrap().unwrap();
    assert_eq!(loaded.keywords, vec!["living".to_string(), "alive".to_string()]);

    let without = service.create_category("Misc", Vec::new()).unwrap();
    let loaded = service.get_category(without.id).unwrap().unwrap();
    assert!(loaded.keywords.is_empty());
}

#[test]
fn deleting_a_quote_clears_its_association_rows_first() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let author = service.create_author("seneca").unwrap();
    let quote = service.create_quote("We suffer more in imagination.", author.id).unwrap();
    let tag = service.create_tag("stoic").unwrap();
    let category = service.create_category("Philosophy", Vec::new()).unwrap();
    let user = service.create_user("reader", "reader@example.com").unwrap();

    assert!(service.tag_quote(quote.id, tag.id).unwrap());
    assert!(service.categorize_quote(quote.id, category.id).unwrap());
    assert!(service.favorite_quote(user.id, quote.id).unwrap());

    service.delete_quote(quote.id).unwrap();

    assert_eq!(join_rows(&conn, "quote_tags"), 0);
    assert_eq!(join_rows(&conn, "quote_categories"), 0);
    assert_eq!(join_rows(&conn, "user_quotes"), 0);
    assert!(service.get_quote(quote.id).unwrap().is_none());
    // The linked records themselves survive.
    assert!(service.get_tag(tag.id).unwrap().is_some());
    assert!(service.get_user(user.id).unwrap().is_some());
}

#[test]
fn deleting_a_tag_clears_only_its_own_links() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let author = service.create_author("seneca").unwrap();
    let quote = service.create_quote("On the shortness of life.", author.id).unwrap();
    let keep = service.create_tag("life").unwrap();
    let doomed = service.create_tag("time").unwrap();
    service.tag_quote(quote.id, keep.id).unwrap();
    service.tag_quote(quote.id, doomed.id).unwrap();

    service.delete_tag(doomed.id).unwrap();

    let remaining = service.quote_tags(quote.id).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "life");
}

#[test]
fn favorite_links_are_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let author = service.create_author("seneca").unwrap();
    let quote = service.create_quote("Begin at once to live.", author.id).unwrap();
    let user = service.create_user("reader", "reader@example.com").unwrap();

    assert!(service.favorite_quote(user.id, quote.id).unwrap());
    assert!(!service.favorite_quote(user.id, quote.id).unwrap());

    let favorites = service.user_favorites(user.id).unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].id, quote.id);

    assert!(service.unfavorite_quote(user.id, quote.id).unwrap());
    assert!(!service.unfavorite_quote(user.id, quote.id).unwrap());
    assert!(service.user_favorites(user.id).unwrap().is_empty());
}

#[test]
fn linking_against_missing_records_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let author = service.create_author("seneca").unwrap();
    let quote = service.create_quote("What is grief but an opinion?", author.id).unwrap();

    let err = service.tag_quote(quote.id, 999).unwrap_err();
    assert!(matches!(
        err,
        CatalogServiceError::NotFound {
            kind: EntityKind::Tag,
            id: 999
        }
    ));

    let err = service.delete_quote(12345).unwrap_err();
    assert!(matches!(
        err,
        CatalogServiceError::NotFound {
            kind: EntityKind::Quote,
            id: 12345
        }
    ));
}

#[test]
fn deleting_an_author_with_quotes_surfaces_the_storage_error() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let author = service.create_author("seneca").unwrap();
    service.create_quote("Timendi causa est nescire.", author.id).unwrap();

    let err = service.delete_author(author.id).unwrap_err();
    assert!(matches!(err, CatalogServiceError::Repo(_)));
    assert!(service.get_author(author.id).unwrap().is_some());
}

#[test]
fn update_user_duplicate_email_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    service.create_user("first reader", "first@example.com").unwrap();
    let second = service.create_user("second reader", "second@example.com").unwrap();

    let err = service
        .update_user(second.id, "second reader", "first@example.com")
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogServiceError::Duplicate {
            kind: EntityKind::User
        }
    ));
}

#[test]
fn counts_track_record_lifecycle() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    assert_eq!(service.count(EntityKind::Author).unwrap(), 0);
    let author = service.create_author("seneca").unwrap();
    service.create_author("epictetus").unwrap();
    assert_eq!(service.count(EntityKind::Author).unwrap(), 2);

    service.delete_author(author.id).unwrap();
    assert_eq!(service.count(EntityKind::Author).unwrap(), 1);
}

fn join_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
