//! Property tests for symbolic references and resolution.

use proptest::prelude::*;
use std::sync::Arc;

use vantage::{
    resolve, FieldDef, FieldType, ModelSchema, Record, RefPath, Value, ValueMap, ViewField,
    ViewSchema,
};

fn word() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z]{1,12}").unwrap()
}

fn account_schema() -> Arc<ModelSchema> {
    ModelSchema::builder("Account")
        .field(FieldDef::new("id", FieldType::Int))
        .field(FieldDef::new("username", FieldType::Str))
        .build()
        .unwrap()
}

fn account(schema: &Arc<ModelSchema>, id: i64, username: &str) -> Record {
    Record::new(
        schema,
        ValueMap::from([
            ("id".to_string(), Value::from(id)),
            ("username".to_string(), Value::from(username)),
        ]),
    )
    .unwrap()
}

fn address_schema() -> Arc<ModelSchema> {
    ModelSchema::builder("Address")
        .field(FieldDef::new("city", FieldType::Str))
        .field(FieldDef::new("zip", FieldType::Str))
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: reading a projected field equals resolving its reference by hand.
    #[test]
    fn property_projected_read_matches_manual_resolution(
        id in any::<i64>(),
        username in word()
    ) {
        let schema = account_schema();
        let reference = RefPath::start(&schema, "username").unwrap().into_ref();
        let view = ViewSchema::builder("AccountView", &schema)
            .field(ViewField::new("id"))
            .field(ViewField::mapped("login", reference.clone()))
            .build()
            .unwrap();
        let record = account(&schema, id, &username);
        let instance = view.project(&record, None).unwrap();
        prop_assert_eq!(
            instance.value("login"),
            Some(&resolve(&record, &reference).unwrap())
        );
        prop_assert_eq!(instance.value("login"), Some(&Value::from(username)));
    }

    /// PROPERTY: resolution is repeatable and leaves the record untouched.
    #[test]
    fn property_resolution_is_repeatable(
        id in any::<i64>(),
        username in word()
    ) {
        let schema = account_schema();
        let record = account(&schema, id, &username);
        let reference = RefPath::start(&schema, "username").unwrap().into_ref();
        let first = resolve(&record, &reference).unwrap();
        let second = resolve(&record, &reference).unwrap();
        prop_assert_eq!(first, second);
        prop_assert_eq!(record.get("username"), Some(&Value::from(username)));
        prop_assert_eq!(record.get("id"), Some(&Value::from(id)));
    }

    /// PROPERTY: references compare by schema identity and path, nothing else.
    #[test]
    fn property_reference_equality_follows_root_and_path(
        pick_a in any::<bool>(),
        pick_b in any::<bool>()
    ) {
        let field = |pick: bool| if pick { "city" } else { "zip" };
        let address = address_schema();
        let a = RefPath::start(&address, field(pick_a)).unwrap().into_ref();
        let b = RefPath::start(&address, field(pick_b)).unwrap().into_ref();
        prop_assert_eq!(a == b, pick_a == pick_b);

        // A structural twin is a different type; its references never match.
        let twin = address_schema();
        let c = RefPath::start(&twin, field(pick_a)).unwrap().into_ref();
        prop_assert!(a != c);
    }
}
