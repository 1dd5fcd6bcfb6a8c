//! Property tests for visibility filtering on projected instances.

use proptest::prelude::*;
use std::any::Any;
use std::sync::Arc;

use vantage::{FieldDef, FieldType, ModelSchema, Record, Value, ValueMap, ViewField, ViewSchema};

struct Caller {
    admin: bool,
}

fn word() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z]{1,12}").unwrap()
}

fn profile_parts() -> (Arc<ModelSchema>, Arc<ViewSchema>) {
    let user = ModelSchema::builder("User")
        .field(FieldDef::new("username", FieldType::Str))
        .field(FieldDef::new("email", FieldType::Str))
        .build()
        .unwrap();
    let view = ViewSchema::builder("ProfileView", &user)
        .field(ViewField::new("username"))
        .field(ViewField::new("email").visible_when(|ctx| {
            ctx.downcast_ref::<Caller>().is_some_and(|caller| caller.admin)
        }))
        .build()
        .unwrap();
    (user, view)
}

fn profile_record(user: &Arc<ModelSchema>, username: &str, email: &str) -> Record {
    Record::new(
        user,
        ValueMap::from([
            ("username".to_string(), Value::from(username)),
            ("email".to_string(), Value::from(email)),
        ]),
    )
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: a guarded field serializes exactly when its predicate passes.
    #[test]
    fn property_export_follows_the_predicate(
        username in word(),
        email in word(),
        admin in any::<bool>(),
    ) {
        let (user, view) = profile_parts();
        let record = profile_record(&user, &username, &email);
        let caller = Caller { admin };
        let instance = view.project(&record, Some(&caller as &dyn Any)).unwrap();
        let json = instance.to_json();
        prop_assert_eq!(json.get("email").is_some(), admin);
        prop_assert!(json.get("username").is_some());
        prop_assert_eq!(instance.is_hidden("email"), !admin);
        // The field stays readable either way.
        prop_assert_eq!(instance.value("email"), Some(&Value::from(email)));
    }

    /// PROPERTY: projecting without context hides every guarded field.
    #[test]
    fn property_no_context_means_hidden(
        username in word(),
        email in word(),
    ) {
        let (user, view) = profile_parts();
        let instance = view
            .project(&profile_record(&user, &username, &email), None)
            .unwrap();
        prop_assert!(instance.is_hidden("email"));
        prop_assert!(!instance.is_hidden("username"));
        prop_assert!(instance.to_json().get("email").is_none());
    }

    /// PROPERTY: the export's keys are exactly the visible fields.
    #[test]
    fn property_export_keys_match_visible_fields(
        username in word(),
        email in word(),
        admin in any::<bool>(),
    ) {
        let (user, view) = profile_parts();
        let caller = Caller { admin };
        let instance = view
            .project(&profile_record(&user, &username, &email), Some(&caller as &dyn Any))
            .unwrap();
        let exported: Vec<String> = instance
            .to_json()
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        let visible: Vec<String> = instance.fields().map(|(name, _)| name.to_string()).collect();
        prop_assert_eq!(exported, visible);
    }
}
