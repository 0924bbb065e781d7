//! Built-in resource schemas and API profiles.
//!
//! The bookshop resource set mirrors the sandbox API the default profile
//! points at. Adding a resource here is the whole job of exposing it: the
//! catalog derives every tool from the schema entry.

use resourceful_rest_tools::auth::AuthKind;
use resourceful_rest_tools::profile::ApiProfile;
use resourceful_rest_tools::schema::{FieldSpec, FieldType, RelationSpec, ResourceSchema};

/// Profiles registered when the configuration file declares none.
#[must_use]
pub fn builtin_profiles() -> Vec<ApiProfile> {
    vec![
        ApiProfile {
            name: "fakerest".to_string(),
            display_name: "FakeREST sandbox".to_string(),
            base_url: "https://fakerestapi.azurewebsites.net".to_string(),
            auth_kind: AuthKind::None,
            description: "Public FakeRESTApi.Web sandbox; data resets periodically".to_string(),
        },
        ApiProfile {
            name: "local".to_string(),
            display_name: "Local instance".to_string(),
            base_url: "http://localhost:5000".to_string(),
            auth_kind: AuthKind::None,
            description: "Locally running API instance".to_string(),
        },
        ApiProfile {
            name: "staging".to_string(),
            display_name: "Staging".to_string(),
            base_url: "https://bookshop-staging.example.com".to_string(),
            auth_kind: AuthKind::Bearer,
            description: "Staging deployment; configure a bearer token first".to_string(),
        },
    ]
}

/// The full bookshop resource set.
#[must_use]
pub fn bookshop_schemas() -> Vec<ResourceSchema> {
    vec![
        ResourceSchema {
            display_name: "Activity".to_string(),
            singular: "activity".to_string(),
            plural: "activities".to_string(),
            collection_path: "/api/v1/Activities".to_string(),
            id_field: "id".to_string(),
            fields: vec![
                FieldSpec::required("id", FieldType::Number),
                FieldSpec::required("title", FieldType::String),
                FieldSpec::optional("dueDate", FieldType::String),
                FieldSpec::optional("completed", FieldType::Boolean),
            ],
            relation: None,
        },
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
        },
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
        },
        ResourceSchema {
            display_name: "CoverPhoto".to_string(),
            singular: "cover_photo".to_string(),
            plural: "cover_photos".to_string(),
            collection_path: "/api/v1/CoverPhotos".to_string(),
            id_field: "id".to_string(),
            fields: vec![
                FieldSpec::required("id", FieldType::Number),
                FieldSpec::optional("idBook", FieldType::Number),
                FieldSpec::optional("url", FieldType::String),
            ],
            relation: Some(RelationSpec {
                via: "book".to_string(),
                parameter: "idBook".to_string(),
                path_template: "/api/v1/CoverPhotos/books/covers/{idBook}".to_string(),
                description: "List the cover photos attached to a book".to_string(),
            }),
        },
        ResourceSchema {
            display_name: "User".to_string(),
            singular: "user".to_string(),
            plural: "users".to_string(),
            collection_path: "/api/v1/Users".to_string(),
            id_field: "id".to_string(),
            fields: vec![
                FieldSpec::required("id", FieldType::Number),
                FieldSpec::required("userName", FieldType::String),
                FieldSpec::optional("password", FieldType::String),
            ],
            relation: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use resourceful_rest_tools::catalog::ToolCatalog;
    use resourceful_rest_tools::profile::ProfileRegistry;

    #[test]
    fn builtin_profiles_form_a_valid_registry() {
        let registry = ProfileRegistry::new(builtin_profiles()).expect("valid profiles");
        assert!(registry.get("fakerest").is_some());
    }

    #[test]
    fn bookshop_schemas_generate_the_full_catalog() {
        let catalog = ToolCatalog::new(bookshop_schemas()).expect("valid schemas");
        // 5 resources x 5 fixed verbs + 2 relation listings.
        assert_eq!(catalog.entries().len(), 27);
        assert!(catalog.resolve("list_books").is_some());
        assert!(catalog.resolve("list_cover_photos_by_book").is_some());
        assert!(catalog.resolve("list_authors_by_book").is_some());
    }
}
