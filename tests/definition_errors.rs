//! Declaration-time diagnostics. Every broken mapping in this file
//! fails while the schema is being built; nothing here ever reaches a
//! projection or an accept call.

use std::sync::Arc;

use vantage::{
    FieldDef, FieldRef, FieldType, InputField, InputSchema, ModelSchema, RefPath, ViewField,
    ViewSchema,
};

fn user_model() -> Arc<ModelSchema> {
    ModelSchema::builder("User")
        .field(FieldDef::new("id", FieldType::Int).auto())
        .field(FieldDef::new("username", FieldType::Str))
        .field(FieldDef::new("email", FieldType::Str).with_default(""))
        .field(FieldDef::new("api_key", FieldType::Str).private())
        .build()
        .unwrap()
}

#[test]
fn test_uncovered_required_field_is_listed_at_declaration() {
    let user = user_model();
    let err = ViewSchema::builder("AccountView", &user)
        .field(ViewField::new("id"))
        .build()
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "view 'AccountView' does not cover required fields of 'User': [\"username\"] - \
         map them by name or reference, or give them defaults on the source"
    );
}

#[test]
fn test_omitting_optional_fields_is_fine() {
    let user = user_model();
    // email has a default and id is auto; neither needs a mapping.
    let view = ViewSchema::builder("HandleView", &user)
        .field(ViewField::new("username"))
        .build();
    assert!(view.is_ok());
}

#[test]
fn test_bad_segment_names_the_model_it_was_sought_on() {
    let address = ModelSchema::builder("Address")
        .field(FieldDef::new("street", FieldType::Str))
        .field(FieldDef::new("zip", FieldType::Str))
        .build()
        .unwrap();
    let user = ModelSchema::builder("User")
        .field(FieldDef::new("username", FieldType::Str))
        .field(FieldDef::new("address", FieldType::Model(Arc::clone(&address))))
        .build()
        .unwrap();

    // The fluent walk refuses the hop on the spot.
    let err = RefPath::start(&user, "address")
        .unwrap()
        .then("city")
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "'city' does not exist on 'Address' - available fields: [\"street\", \"zip\"]"
    );

    // A reference assembled from raw strings gets the same answer when a
    // view binds it, with the traversed prefix spelled out.
    let err = ViewSchema::builder("UserCard", &user)
        .field(ViewField::new("username"))
        .field(ViewField::new("address"))
        .field(ViewField::mapped("city", FieldRef::new(&user, ["address", "city"])))
        .build()
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "field 'city' on 'UserCard': 'city' does not exist on 'Address' \
         (at 'User.address.city') - available fields: [\"street\", \"zip\"]"
    );
}

#[test]
fn test_private_exposure_fails_before_any_instance_exists() {
    let user = user_model();
    let err = ViewSchema::builder("DebugView", &user)
        .field(ViewField::new("username"))
        .field(ViewField::new("api_key"))
        .build()
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "field 'api_key' on 'DebugView' exposes private field 'api_key' of 'User' - \
         private fields cannot appear in views"
    );
}

#[test]
fn test_reference_into_foreign_model_names_both_sides() {
    let user = user_model();
    let invoice = ModelSchema::builder("Invoice")
        .field(FieldDef::new("number", FieldType::Str))
        .build()
        .unwrap();
    let err = ViewSchema::builder("AccountView", &user)
        .field(ViewField::new("username"))
        .field(ViewField::mapped("invoice_number", RefPath::start(&invoice, "number").unwrap()))
        .build()
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "field 'invoice_number' on 'AccountView' references 'Invoice' but the bound source is \
         'User' - declare a member of type 'Invoice' on a composed source to map across models"
    );
}

#[test]
fn test_duplicate_declarations_rejected() {
    let user = user_model();
    let err = ViewSchema::builder("AccountView", &user)
        .field(ViewField::new("username"))
        .field(ViewField::new("username"))
        .build()
        .unwrap_err();
    assert_eq!(err.to_string(), "duplicate field 'username' on 'AccountView'");
}

#[test]
fn test_input_refuses_paths_deeper_than_one_field() {
    let address = ModelSchema::builder("Address")
        .field(FieldDef::new("city", FieldType::Str))
        .build()
        .unwrap();
    let user = ModelSchema::builder("User")
        .field(FieldDef::new("username", FieldType::Str))
        .field(FieldDef::new("address", FieldType::Model(Arc::clone(&address))))
        .build()
        .unwrap();
    let err = InputSchema::builder("MoveUser", &user)
        .field(InputField::new("username"))
        .field(InputField::new("address"))
        .field(InputField::mapped(
            "city",
            RefPath::start(&user, "address").unwrap().then("city").unwrap(),
        ))
        .build()
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "field 'city' on input 'MoveUser' maps through 'User.address.city' - \
         input mappings must reference direct source fields"
    );
}

#[test]
fn test_input_coverage_error_suggests_the_ways_out() {
    let user = user_model();
    let err = InputSchema::builder("Signup", &user)
        .build()
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "input 'Signup' does not cover required fields of 'User': [\"username\"] - \
         declare them, exclude them for overrides, or default them on the model"
    );
}
