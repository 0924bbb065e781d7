//! Verb semantics helpers.
//!
//! Generates MCP `ToolAnnotations` for resource tools from the CRUD verb, the
//! same way RFC 9110 method semantics would read: reads are read-only and
//! idempotent, updates and deletes are destructive but idempotent, creates
//! are neither.

use crate::catalog::Verb;
use rmcp::model::ToolAnnotations;

/// Generate MCP tool annotations for a resource verb.
///
/// `openWorldHint` is always `true`: every tool talks to an external API.
#[must_use]
pub fn annotations_for_verb(verb: Verb) -> ToolAnnotations {
    let open_world_hint = Some(true);

    match verb {
        Verb::List | Verb::GetById | Verb::ListByRelation => ToolAnnotations {
            title: None,
            read_only_hint: Some(true),
            destructive_hint: Some(false),
            idempotent_hint: Some(true),
            open_world_hint,
        },
        Verb::Create => ToolAnnotations {
            title: None,
            read_only_hint: Some(false),
            destructive_hint: Some(false),
            idempotent_hint: Some(false),
            open_world_hint,
        },
        // PUT and DELETE replace or remove state, but repeating them is safe.
        Verb::UpdateById | Verb::DeleteById => ToolAnnotations {
            title: None,
            read_only_hint: Some(false),
            destructive_hint: Some(true),
            idempotent_hint: Some(true),
            open_world_hint,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::annotations_for_verb;
    use crate::catalog::Verb;

    #[test]
    fn annotations_set_open_world_for_all_verbs() {
        for v in [
            Verb::List,
            Verb::Create,
            Verb::GetById,
            Verb::UpdateById,
            Verb::DeleteById,
            Verb::ListByRelation,
        ] {
            let a = annotations_for_verb(v);
            assert_eq!(a.open_world_hint, Some(true));
        }
    }

    #[test]
    fn reads_are_readonly_and_idempotent() {
        let a = annotations_for_verb(Verb::GetById);
        assert_eq!(a.read_only_hint, Some(true));
        assert_eq!(a.destructive_hint, Some(false));
        assert_eq!(a.idempotent_hint, Some(true));
    }

    #[test]
    fn create_is_not_idempotent() {
        let a = annotations_for_verb(Verb::Create);
        assert_eq!(a.read_only_hint, Some(false));
        assert_eq!(a.idempotent_hint, Some(false));
    }

    #[test]
    fn delete_is_destructive_but_idempotent() {
        let a = annotations_for_verb(Verb::DeleteById);
        assert_eq!(a.destructive_hint, Some(true));
        assert_eq!(a.idempotent_hint, Some(true));
    }
}
