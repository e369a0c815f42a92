use quotebook_core::db::open_db_in_memory;
use quotebook_core::{
    AuthorDraft, CatalogDraft, CategoryDraft, QuoteDraft, RecordStore, SqliteRecordStore, TagDraft,
    UserDraft,
    Validated, ValidationError, Validator, ValidatorError,
};

fn clean(outcome: Validated) -> CatalogDraft {
    match outcome {
        Validated::Clean(draft) => draft,
        Validated::Duplicate => panic!("expected a clean draft, got a duplicate"),
    }
}

fn author_draft(name: &str) -> CatalogDraft {
    CatalogDraft::Author(AuthorDraft {
        name: name.to_string(),
    })
}

fn quote_draft(text: &str) -> CatalogDraft {
    CatalogDraft::Quote(QuoteDraft {
        text: text.to_string(),
        author_id: None,
    })
}

#[test]
fn author_duplicate_check_is_case_insensitive() {
    let conn = open_db_in_memory().unwrap();
    let records = SqliteRecordStore::try_new(&conn).unwrap();
    let validator = Validator::new(&records);

    let first = clean(validator.validate(author_draft("Mark Twain"), None).unwrap());
    records.insert(&first).unwrap();

    let outcome = validator.validate(author_draft("mark twain"), None).unwrap();
    assert_eq!(outcome, Validated::Duplicate);
}

#[test]
fn author_name_is_sanitized_before_the_duplicate_check() {
    let conn = open_db_in_memory().unwrap();
    let records = SqliteRecordStore::try_new(&conn).unwrap();
    let validator = Validator::new(&records);

    let first = clean(validator.validate(author_draft("j k rowling"), None).unwrap());
    assert_eq!(
        first,
        CatalogDraft::Author(AuthorDraft {
            name: "J. K. Rowling".to_string()
        })
    );
    records.insert(&first).unwrap();

    let outcome = validator
        .validate(author_draft("J K ROWLING"), None)
        .unwrap();
    assert_eq!(outcome, Validated::Duplicate);
}

#[test]
fn updating_a_record_excludes_its_own_id_from_the_duplicate_check() {
    let conn = open_db_in_memory().unwrap();
    let records = SqliteRecordStore::try_new(&conn).unwrap();
    let validator = Validator::new(&records);

    let draft = CatalogDraft::Category(CategoryDraft {
        name: "Wisdom".to_string(),
        keywords: Vec::new(),
    });
    let id = records
        .insert(&clean(validator.validate(draft.clone(), None).unwrap()))
        .unwrap();

    let same_name_same_record = validator.validate(draft.clone(), Some(id)).unwrap();
    assert!(matches!(same_name_same_record, Validated::Clean(_)));

    let same_name_other_record = validator.validate(draft, None).unwrap();
    assert_eq!(same_name_other_record, Validated::Duplicate);
}

#[test]
fn blank_quote_text_is_a_validation_error() {
    let conn = open_db_in_memory().unwrap();
    let records = SqliteRecordStore::try_new(&conn).unwrap();
    let validator = Validator::new(&records);

    let err = validator.validate(quote_draft("   "), None).unwrap_err();
    assert!(matches!(
        err,
        ValidatorError::Invalid(ValidationError::EmptyQuoteText)
    ));
}

#[test]
fn quote_text_length_boundary_is_5000_chars() {
    let conn = open_db_in_memory().unwrap();
    let records = SqliteRecordStore::try_new(&conn).unwrap();
    let validator = Validator::new(&records);

    let at_limit = validator.validate(quote_draft(&"x".repeat(5000)), None).unwrap();
    assert!(matches!(at_limit, Validated::Clean(_)));

    let err = validator
        .validate(quote_draft(&"x".repeat(5001)), None)
        .unwrap_err();
    assert!(matches!(
        err,
        ValidatorError::Invalid(ValidationError::QuoteTextTooLong { chars: 5001 })
    ));
}

#[test]
fn quote_duplicate_check_compares_trimmed_text_exactly() {
    let conn = open_db_in_memory().unwrap();
    let records = SqliteRecordStore::try_new(&conn).unwrap();
    let validator = Validator::new(&records);

    let author_id = records
        .insert(&clean(validator.validate(author_draft("seneca"), None).unwrap()))
        .unwrap();
    let first = clean(
        validator
            .validate(
                CatalogDraft::Quote(QuoteDraft {
                    text: "  Luck is preparation meeting opportunity.  ".to_string(),
                    author_id: Some(author_id),
                }),
                None,
            )
            .unwrap(),
    );
    records.insert(&first).unwrap();

    let same_trimmed = validator
        .validate(
            quote_draft("Luck is preparation meeting opportunity."),
            None,
        )
        .unwrap();
    assert_eq!(same_trimmed, Validated::Duplicate);

    // Exact comparison: different casing is a different quote.
    let different_case = validator
        .validate(
            quote_draft("luck is preparation meeting opportunity."),
            None,
        )
        .unwrap();
    assert!(matches!(different_case, Validated::Clean(_)));
}

#[test]
fn quote_author_reference_must_resolve() {
    let conn = open_db_in_memory().unwrap();
    let records = SqliteRecordStore::try_new(&conn).unwrap();
    let validator = Validator::new(&records);

    let err = validator
        .validate(
            CatalogDraft::Quote(QuoteDraft {
                text: "attributed to nobody".to_string(),
                author_id: Some(42),
            }),
            None,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ValidatorError::Invalid(ValidationError::UnknownAuthor(42))
    ));
}

#[test]
fn tag_name_is_sanitized_through_validation() {
    let conn = open_db_in_memory().unwrap();
    let records = SqliteRecordStore::try_new(&conn).unwrap();
    let validator = Validator::new(&records);

    let outcome = clean(
        validator
            .validate(
                CatalogDraft::Tag(TagDraft {
                    name: "Café-Time!".to_string(),
                }),
                None,
            )
            .unwrap(),
    );
    assert_eq!(
        outcome,
        CatalogDraft::Tag(TagDraft {
            name: "cafetime".to_string()
        })
    );
}

#[test]
fn tag_reduced_to_nothing_is_a_validation_error() {
    let conn = open_db_in_memory().unwrap();
    let records = SqliteRecordStore::try_new(&conn).unwrap();
    let validator = Validator::new(&records);

    let err = validator
        .validate(
            CatalogDraft::Tag(TagDraft {
                name: "!!!".to_string(),
            }),
            None,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ValidatorError::Invalid(ValidationError::TagNotAlphanumeric)
    ));
}

#[test]
fn user_rules_cover_name_length_and_email_shape() {
    let conn = open_db_in_memory().unwrap();
    let records = SqliteRecordStore::try_new(&conn).unwrap();
    let validator = Validator::new(&records);

    let short_name = validator
        .validate(
            CatalogDraft::User(UserDraft {
                name: " ab ".to_string(),
                email: "ab@example.com".to_string(),
            }),
            None,
        )
        .unwrap_err();
    assert!(matches!(
        short_name,
        ValidatorError::Invalid(ValidationError::UserNameTooShort { chars: 2 })
    ));

    let bad_email = validator
        .validate(
            CatalogDraft::User(UserDraft {
                name: "reader".to_string(),
                email: "not-an-address".to_string(),
            }),
            None,
        )
        .unwrap_err();
    assert!(matches!(
        bad_email,
        ValidatorError::Invalid(ValidationError::InvalidEmail(_))
    ));
}

#[test]
fn user_duplicate_check_matches_on_name_or_email() {
    let conn = open_db_in_memory().unwrap();
    let records = SqliteRecordStore::try_new(&conn).unwrap();
    let validator = Validator::new(&records);

    let first = clean(
        validator
            .validate(
                CatalogDraft::User(UserDraft {
                    name: "reader".to_string(),
                    email: "Reader@Example.com".to_string(),
                }),
                None,
            )
            .unwrap(),
    );
    // Email is lowercased during validation.
    assert_eq!(
        first,
        CatalogDraft::User(UserDraft {
            name: "reader".to_string(),
            email: "reader@example.com".to_string()
        })
    );
    records.insert(&first).unwrap();

    let same_name = validator
        .validate(
            CatalogDraft::User(UserDraft {
                name: "reader".to_string(),
                email: "other@example.com".to_string(),
            }),
            None,
        )
        .unwrap();
    assert_eq!(same_name, Validated::Duplicate);

    let same_email = validator
        .validate(
            CatalogDraft::User(UserDraft {
                name: "someone else".to_string(),
                email: "reader@example.com".to_string(),
            }),
            None,
        )
        .unwrap();
    assert_eq!(same_email, Validated::Duplicate);
}
