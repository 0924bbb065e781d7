//! End-to-end dispatch tests against an in-process fake REST backend.

use resourceful_rest_tools::auth::AuthKind;
use resourceful_rest_tools::error::RestToolsError;
use resourceful_rest_tools::profile::ResolvedProfile;
use resourceful_rest_tools::runtime::{Outcome, RestToolSource};
use resourceful_rest_tools::schema::{FieldSpec, FieldType, RelationSpec, ResourceSchema};
use resourceful_test_support::FakeRestApi;
use rmcp::model::JsonObject;
use serde_json::{Value, json};
use std::time::Duration;

fn book_schema() -> ResourceSchema {
    ResourceSchema {
        display_name: "Book".to_string(),
        singular: "book".to_string(),
        plural: "books".to_string(),
        collection_path: "/api/v1/Books".to_string(),
        id_field: "id".to_string(),
        fields: vec![
            FieldSpec::required("id", FieldType::Number),
            FieldSpec::required("title", FieldType::String),
            FieldSpec::optional("description", FieldType::String),
            FieldSpec::optional("pageCount", FieldType::Number),
            FieldSpec::optional("excerpt", FieldType::String),
            FieldSpec::optional("publishDate", FieldType::String),
        ],
        relation: None,
    }
}

fn author_schema() -> ResourceSchema {
    ResourceSchema {
        display_name: "Author".to_string(),
        singular: "author".to_string(),
        plural: "authors".to_string(),
        collection_path: "/api/v1/Authors".to_string(),
        id_field: "id".to_string(),
        fields: vec![
            FieldSpec::required("id", FieldType::Number),
            FieldSpec::optional("idBook", FieldType::Number),
            FieldSpec::optional("firstName", FieldType::String),
            FieldSpec::optional("lastName", FieldType::String),
        ],
        relation: Some(RelationSpec {
            via: "book".to_string(),
            parameter: "idBook".to_string(),
            path_template: "/api/v1/Authors/authors/books/{idBook}".to_string(),
            description: "List the authors attached to a book".to_string(),
        }),
    }
}

fn source() -> RestToolSource {
    RestToolSource::new(vec![book_schema(), author_schema()], Duration::from_secs(5))
        .expect("valid source")
}

fn profile_for(api: &FakeRestApi) -> ResolvedProfile {
    ResolvedProfile {
        name: "fake".to_string(),
        base_url: api.base_url.clone(),
        auth_kind: AuthKind::None,
        credential: None,
    }
}

fn args(v: Value) -> JsonObject {
    v.as_object().expect("object").clone()
}

#[tokio::test]
async fn created_book_round_trips_through_get_by_id() -> anyhow::Result<()> {
    let api = FakeRestApi::spawn().await?;
    let source = source();
    let profile = profile_for(&api);

    let book = json!({
        "id": 1,
        "title": "T",
        "description": "D",
        "pageCount": 10,
        "excerpt": "E",
        "publishDate": "2024-01-01"
    });

    let created = source
        .call_tool("create_book", &args(book.clone()), &profile)
        .await?;
    assert_eq!(created, Outcome::Payload(book.clone()));

    let fetched = source
        .call_tool("get_book_by_id", &args(json!({ "id": 1 })), &profile)
        .await?;
    assert_eq!(fetched, Outcome::Payload(book));

    api.stop().await
}

#[tokio::test]
async fn get_by_id_on_absent_entity_is_not_found_not_error() -> anyhow::Result<()> {
    let api = FakeRestApi::spawn().await?;
    let outcome = source()
        .call_tool("get_book_by_id", &args(json!({ "id": 999 })), &profile_for(&api))
        .await?;
    assert_eq!(outcome, Outcome::NotFound);
    api.stop().await
}

#[tokio::test]
async fn list_route_404_stays_an_error() -> anyhow::Result<()> {
    // A collection path the backend does not serve: the 404-as-success rule
    // applies only to by-id reads.
    let mut schema = book_schema();
    schema.collection_path = "/api/v2/Books".to_string();
    let source = RestToolSource::new(vec![schema], Duration::from_secs(5))?;

    let api = FakeRestApi::spawn().await?;
    let err = source
        .call_tool("list_books", &JsonObject::new(), &profile_for(&api))
        .await
        .unwrap_err();

    match err {
        RestToolsError::Http { status, .. } => assert_eq!(status, 404),
        other => panic!("expected http error, got {other}"),
    }
    api.stop().await
}

#[tokio::test]
async fn backend_500_surfaces_status_and_body() -> anyhow::Result<()> {
    let mut schema = book_schema();
    schema.collection_path = "/__status/500".to_string();
    let source = RestToolSource::new(vec![schema], Duration::from_secs(5))?;

    let api = FakeRestApi::spawn().await?;
    let err = source
        .call_tool("list_books", &JsonObject::new(), &profile_for(&api))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("500"));
    match err {
        RestToolsError::Http { status, body } => {
            assert_eq!(status, 500);
            let body = body.expect("body captured");
            assert!(body.get("message").is_some());
        }
        other => panic!("expected http error, got {other}"),
    }
    api.stop().await
}

#[tokio::test]
async fn delete_with_empty_204_yields_no_content() -> anyhow::Result<()> {
    let api = FakeRestApi::spawn().await?;
    let source = source();
    let profile = profile_for(&api);

    source
        .call_tool(
            "create_book",
            &args(json!({ "id": 2, "title": "Gone soon" })),
            &profile,
        )
        .await?;

    let outcome = source
        .call_tool("delete_book_by_id", &args(json!({ "id": 2 })), &profile)
        .await?;
    assert_eq!(outcome, Outcome::NoContent);

    // And the entity really is gone.
    let fetched = source
        .call_tool("get_book_by_id", &args(json!({ "id": 2 })), &profile)
        .await?;
    assert_eq!(fetched, Outcome::NotFound);

    api.stop().await
}

#[tokio::test]
async fn update_replaces_entity_with_id_plus_supplied_fields() -> anyhow::Result<()> {
    let api = FakeRestApi::spawn().await?;
    let source = source();
    let profile = profile_for(&api);

    source
        .call_tool(
            "create_book",
            &args(json!({ "id": 3, "title": "Old", "pageCount": 100 })),
            &profile,
        )
        .await?;

    let updated = source
        .call_tool(
            "update_book_by_id",
            &args(json!({ "id": 3, "title": "New" })),
            &profile,
        )
        .await?;

    // The fake echoes the payload it received: exactly id + supplied fields.
    assert_eq!(updated, Outcome::Payload(json!({ "id": 3, "title": "New" })));

    api.stop().await
}

#[tokio::test]
async fn relation_listing_filters_by_path_parameter() -> anyhow::Result<()> {
    let api = FakeRestApi::spawn().await?;
    let source = source();
    let profile = profile_for(&api);

    for (id, id_book, first) in [(1, 7, "Ada"), (2, 7, "Brendan"), (3, 8, "Clara")] {
        source
            .call_tool(
                "create_author",
                &args(json!({ "id": id, "idBook": id_book, "firstName": first })),
                &profile,
            )
            .await?;
    }

    let outcome = source
        .call_tool(
            "list_authors_by_book",
            &args(json!({ "idBook": 7 })),
            &profile,
        )
        .await?;

    let Outcome::Payload(Value::Array(authors)) = outcome else {
        panic!("expected array payload");
    };
    assert_eq!(authors.len(), 2);
    assert!(
        authors
            .iter()
            .all(|a| a.get("idBook") == Some(&json!(7)))
    );

    api.stop().await
}

#[tokio::test]
async fn bearer_credential_is_formatted_into_the_auth_header() -> anyhow::Result<()> {
    let api = FakeRestApi::builder().require_bearer("s3cret").spawn().await?;
    let source = source();

    let mut profile = profile_for(&api);
    profile.auth_kind = AuthKind::Bearer;
    profile.credential = Some("s3cret".to_string());

    let outcome = source
        .call_tool("list_books", &JsonObject::new(), &profile)
        .await?;
    assert!(matches!(outcome, Outcome::Payload(Value::Array(_))));

    api.stop().await
}

#[tokio::test]
async fn missing_credential_dispatches_bare_and_backend_rejects() -> anyhow::Result<()> {
    let api = FakeRestApi::builder().require_bearer("s3cret").spawn().await?;
    let source = source();

    // Bearer profile with no credential configured: the request goes out
    // without an Authorization header and the backend decides.
    let mut profile = profile_for(&api);
    profile.auth_kind = AuthKind::Bearer;
    profile.credential = None;

    let err = source
        .call_tool("list_books", &JsonObject::new(), &profile)
        .await
        .unwrap_err();
    match err {
        RestToolsError::Http { status, .. } => assert_eq!(status, 401),
        other => panic!("expected http error, got {other}"),
    }

    api.stop().await
}

#[tokio::test]
async fn timeout_abandons_the_call_as_a_transport_error() -> anyhow::Result<()> {
    let mut schema = book_schema();
    schema.collection_path = "/__slow".to_string();
    let source = RestToolSource::new(vec![schema], Duration::from_millis(200))?;

    let api = FakeRestApi::spawn().await?;
    let err = source
        .call_tool("list_books", &JsonObject::new(), &profile_for(&api))
        .await
        .unwrap_err();
    assert!(matches!(err, RestToolsError::Transport(_)));

    api.stop().await
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error_without_status() -> anyhow::Result<()> {
    let source = source();
    let profile = ResolvedProfile {
        name: "dead".to_string(),
        base_url: "http://127.0.0.1:1".to_string(),
        auth_kind: AuthKind::None,
        credential: None,
    };

    let err = source
        .call_tool("list_books", &JsonObject::new(), &profile)
        .await
        .unwrap_err();
    assert!(matches!(err, RestToolsError::Transport(_)));
    Ok(())
}
