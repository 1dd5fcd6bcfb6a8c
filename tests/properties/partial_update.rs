//! Property tests for partial inputs and record rewriting.

use proptest::prelude::*;
use std::sync::Arc;

use vantage::{FieldDef, FieldType, InputField, InputSchema, ModelSchema, Record, Value, ValueMap};

fn word() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z]{1,12}").unwrap()
}

fn money() -> impl Strategy<Value = f64> {
    // Quarter steps are exactly representable, so equality stays safe.
    (0i32..40_000).prop_map(|quarters| f64::from(quarters) / 4.0)
}

fn product_schema() -> Arc<ModelSchema> {
    ModelSchema::builder("Product")
        .field(FieldDef::new("id", FieldType::Int).auto())
        .field(FieldDef::new("name", FieldType::Str))
        .field(FieldDef::new("price", FieldType::Float))
        .field(FieldDef::new("stock", FieldType::Int).with_default(0))
        .field(FieldDef::new("cost_basis", FieldType::Float).private())
        .build()
        .unwrap()
}

fn stored(schema: &Arc<ModelSchema>, name: &str, price: f64, stock: i64) -> Record {
    Record::new(
        schema,
        ValueMap::from([
            ("id".to_string(), Value::from(1)),
            ("name".to_string(), Value::from(name)),
            ("price".to_string(), Value::from(price)),
            ("stock".to_string(), Value::from(stock)),
            ("cost_basis".to_string(), Value::from(0.25)),
        ]),
    )
    .unwrap()
}

fn update_input(schema: &Arc<ModelSchema>) -> Arc<InputSchema> {
    // The stock default must stay dormant: partial inputs never
    // manufacture values for absent fields.
    InputSchema::builder("UpdateProduct", schema)
        .field(InputField::new("name"))
        .field(InputField::new("price"))
        .field(InputField::new("stock").with_default(0))
        .partial()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: applying a payload rewrites exactly the supplied fields.
    #[test]
    fn property_apply_rewrites_exactly_the_supplied_fields(
        base_name in word(),
        base_price in money(),
        base_stock in 0i64..10_000,
        new_name in proptest::option::of(word()),
        new_price in proptest::option::of(money()),
        new_stock in proptest::option::of(0i64..10_000),
    ) {
        let schema = product_schema();
        let before = stored(&schema, &base_name, base_price, base_stock);

        let mut payload = ValueMap::new();
        if let Some(name) = &new_name {
            payload.insert("name".to_string(), Value::from(name.as_str()));
        }
        if let Some(price) = new_price {
            payload.insert("price".to_string(), Value::from(price));
        }
        if let Some(stock) = new_stock {
            payload.insert("stock".to_string(), Value::from(stock));
        }
        let accepted = update_input(&schema).accept(payload).unwrap();
        let after = accepted.apply_to(&before).unwrap();

        let want_name = new_name.as_deref().unwrap_or(&base_name);
        prop_assert_eq!(after.get("name"), Some(&Value::from(want_name)));
        prop_assert_eq!(
            after.get("price"),
            Some(&Value::from(new_price.unwrap_or(base_price)))
        );
        prop_assert_eq!(
            after.get("stock"),
            Some(&Value::from(new_stock.unwrap_or(base_stock)))
        );
        prop_assert_eq!(after.get("id"), before.get("id"));
        prop_assert_eq!(after.get("cost_basis"), before.get("cost_basis"));

        // The stored record itself never moves.
        prop_assert_eq!(before.get("name"), Some(&Value::from(base_name.as_str())));
        prop_assert_eq!(before.get("price"), Some(&Value::from(base_price)));
    }

    /// PROPERTY: undeclared payload keys are dropped, never rejected.
    #[test]
    fn property_surplus_keys_are_dropped_not_rejected(
        junk_key in "x[a-z]{0,11}",
        junk_flag in any::<bool>(),
    ) {
        let schema = product_schema();
        let payload = ValueMap::from([(junk_key, Value::from(junk_flag))]);
        let accepted = update_input(&schema).accept(payload);
        prop_assert!(accepted.is_ok());
        prop_assert!(accepted.unwrap().values().is_empty());
    }

    /// PROPERTY: the unassigned sentinel always counts as absent.
    #[test]
    fn property_unassigned_counts_as_absent(
        field_index in 0usize..3,
    ) {
        let field = ["name", "price", "stock"][field_index];
        let schema = product_schema();
        let payload = ValueMap::from([(field.to_string(), Value::Unassigned)]);
        let accepted = update_input(&schema).accept(payload).unwrap();
        prop_assert!(!accepted.is_set(field));
        prop_assert!(accepted.values().is_empty());
    }
}
