//! Property-based tests using proptest
//!
//! These tests verify path templating, attribute filtering and list
//! filter rendering using randomized inputs.

use glrest::resource::attrs::{filter, filter_query, AttrType, RequiredOptional, PAGINATION_PARAMS};
use glrest::resource::path::{resolve, Bindings, PathError};
use glrest::resource::RestObject;
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

fn issue_schema() -> RequiredOptional {
    RequiredOptional {
        required: vec!["title".to_string()],
        optional: vec![
            "description".to_string(),
            "labels".to_string(),
            "assignee_ids".to_string(),
            "due_date".to_string(),
        ],
    }
}

/// Attribute names drawn from declared and undeclared keys
fn arb_attr_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("title".to_string()),
        Just("description".to_string()),
        Just("labels".to_string()),
        Just("due_date".to_string()),
        "[a-z_]{1,12}",
    ]
}

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[ -~]{0,20}".prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
    ]
}

fn arb_attrs() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map(arb_attr_name(), arb_scalar(), 0..8)
        .prop_map(|m| m.into_iter().collect())
}

mod path_tests {
    use super::*;

    proptest! {
        /// Any identifier stays within one path segment and decodes back
        #[test]
        fn resolved_segment_round_trips(id in "\\PC{1,30}") {
            let bindings: Bindings = [("project_id".to_string(), id.clone())].into_iter().collect();
            let path = resolve("/projects/{project_id}/issues", &bindings).unwrap();

            let segment = path
                .strip_prefix("/projects/")
                .and_then(|p| p.strip_suffix("/issues"))
                .unwrap();
            prop_assert!(!segment.contains('/'));
            prop_assert_eq!(urlencoding::decode(segment).unwrap(), id);
        }

        /// Templates without placeholders resolve to themselves
        #[test]
        fn static_templates_unchanged(template in "(/[a-z_]{1,10}){1,4}") {
            prop_assert_eq!(resolve(&template, &Bindings::new()).unwrap(), template);
        }

        /// A placeholder without a binding is reported by name
        #[test]
        fn unbound_placeholder_named(name in "[a-z_]{1,12}") {
            let template = format!("/groups/{{{}}}/iterations", name);
            match resolve(&template, &Bindings::new()) {
                Err(PathError::Unbound { placeholder, .. }) => prop_assert_eq!(placeholder, name),
                other => prop_assert!(false, "unexpected result {:?}", other),
            }
        }
    }
}

mod attrs_tests {
    use super::*;

    proptest! {
        /// Filtered bodies only contain declared attributes, and keep all of them
        #[test]
        fn filter_keeps_exactly_declared(attrs in arb_attrs(), title in "[a-z ]{1,20}") {
            let mut attrs = attrs;
            attrs.insert("title".to_string(), Value::from(title));
            let schema = issue_schema();

            let kept = filter(&attrs, &schema).unwrap();
            for key in kept.keys() {
                prop_assert!(schema.allows(key));
            }
            for (key, value) in &attrs {
                if schema.allows(key) {
                    prop_assert_eq!(kept.get(key), Some(value));
                }
            }
        }

        /// Without a title the body is rejected with exactly that name
        #[test]
        fn filter_reports_missing_title(attrs in arb_attrs()) {
            let mut attrs = attrs;
            attrs.remove("title");
            prop_assert_eq!(filter(&attrs, &issue_schema()), Err(vec!["title".to_string()]));
        }

        /// An empty schema passes bodies through
        #[test]
        fn empty_schema_passes_through(attrs in arb_attrs()) {
            prop_assert_eq!(filter(&attrs, &RequiredOptional::default()).unwrap(), attrs);
        }

        /// Query keys are declared filters, pagination keys or repeated array keys
        #[test]
        fn filter_query_keys_declared(
            attrs in arb_attrs(),
            tags in prop::collection::vec("[a-z]{1,6}", 0..4),
        ) {
            let mut params = attrs;
            params.insert("labels".to_string(), json!(tags.clone()));
            params.insert("assignee_username".to_string(), json!(["alice", "bob"]));

            let filters = vec![
                "labels".to_string(),
                "assignee_username".to_string(),
                "state".to_string(),
            ];
            let types: BTreeMap<String, AttrType> =
                [("labels".to_string(), AttrType::List)].into_iter().collect();

            let query = filter_query(&params, &filters, &types);
            for (key, _) in &query {
                prop_assert!(
                    filters.contains(key)
                        || PAGINATION_PARAMS.contains(&key.as_str())
                        || key == "assignee_username[]",
                    "unexpected key {}", key
                );
            }

            let labels: Vec<&String> =
                query.iter().filter(|(k, _)| k == "labels").map(|(_, v)| v).collect();
            let joined = tags.join(",");
            prop_assert_eq!(labels, vec![&joined]);
        }
    }
}

mod object_tests {
    use super::*;

    proptest! {
        /// Local changes shadow attributes until the server answers
        #[test]
        fn pending_changes_cleared_by_server_data(
            original in "[a-z]{1,10}",
            changed in "[a-z]{1,10}",
        ) {
            let mut data = Map::new();
            data.insert("iid".to_string(), json!(3));
            data.insert("title".to_string(), json!(original));
            let mut obj = RestObject::new("project-issues", Some("iid"), Some("title"), data);

            obj.set("title", changed.clone());
            prop_assert_eq!(obj.attr_str("title"), Some(changed.as_str()));
            prop_assert_eq!(obj.updated_data().len(), 1);

            obj.update_attrs(json!({"iid": 3, "title": changed.clone()}));
            prop_assert!(obj.updated_data().is_empty());
            prop_assert_eq!(obj.attr_str("title"), Some(changed.as_str()));
            prop_assert_eq!(obj.get_id(), Some("3".to_string()));
        }
    }
}
