//! Input schemas
//!
//! An `InputSchema` is the write-side counterpart of a view: it declares
//! which fields of one model external callers may set, under which names,
//! and with which defaults. Anything not declared is silently dropped on
//! accept - an input never errors on surplus keys, it narrows. A declared
//! field the model lacks is legal: it stays readable on the accepted
//! instance and falls away when a record is built, which is how
//! confirm-password-style fields come in. Excluded fields stay reachable
//! through the override map on `to_record`, which is how service-side
//! values enter without ever being client-writable.
//!
//! Unlike views, inputs may declare auto and private fields. Writing a
//! private field from the service layer is routine; views merely refuse
//! to read them back out.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::DefinitionError;
use crate::reference::FieldRef;
use crate::schema::ModelSchema;
use crate::value::Value;

/// One writable field on an input.
pub struct InputField {
    name: String,
    reference: Option<FieldRef>,
    default: Option<Value>,
}

impl InputField {
    /// Writes the model field of the same name. A name the model lacks
    /// stays instance-only.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reference: None,
            default: None,
        }
    }

    /// Accepts the value under `name` and writes it to the referenced
    /// model field. Only single-segment references are allowed here;
    /// inputs write direct fields, never paths.
    pub fn mapped(name: impl Into<String>, reference: impl Into<FieldRef>) -> Self {
        Self {
            name: name.into(),
            reference: Some(reference.into()),
            default: None,
        }
    }

    /// Fallback used when the payload omits this field.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A declared field lowered to its resolved write target.
#[derive(Debug)]
pub(crate) struct Slot {
    pub(crate) name: String,
    pub(crate) target: String,
    pub(crate) default: Option<Value>,
}

/// An immutable, validated input declaration.
pub struct InputSchema {
    name: String,
    model: Arc<ModelSchema>,
    slots: Vec<Slot>,
    partial: bool,
    excluded: BTreeSet<String>,
}

impl InputSchema {
    pub fn builder(name: impl Into<String>, model: &Arc<ModelSchema>) -> InputBuilder {
        InputBuilder {
            name: name.into(),
            model: Arc::clone(model),
            fields: Vec::new(),
            partial: false,
            derive_rest: false,
            excluded: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &Arc<ModelSchema> {
        &self.model
    }

    /// Partial inputs take any subset of their declared fields; full
    /// inputs demand every one.
    pub fn is_partial(&self) -> bool {
        self.partial
    }

    /// Declared payload names, in declaration order.
    pub fn declared(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.name.as_str()).collect()
    }

    /// Model field a payload name writes to, when declared.
    pub fn target_of(&self, name: &str) -> Option<&str> {
        self.slots
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.target.as_str())
    }

    pub fn excluded(&self) -> &BTreeSet<String> {
        &self.excluded
    }

    pub(crate) fn slots(&self) -> &[Slot] {
        &self.slots
    }
}

impl fmt::Debug for InputSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputSchema")
            .field("name", &self.name)
            .field("model", &self.model.name())
            .field("declared", &self.declared())
            .field("partial", &self.partial)
            .finish()
    }
}

/// Builder for `InputSchema`.
pub struct InputBuilder {
    name: String,
    model: Arc<ModelSchema>,
    fields: Vec<InputField>,
    partial: bool,
    derive_rest: bool,
    excluded: BTreeSet<String>,
}

impl InputBuilder {
    pub fn field(mut self, field: InputField) -> Self {
        self.fields.push(field);
        self
    }

    /// Accept any subset of the declared fields instead of all of them.
    pub fn partial(mut self) -> Self {
        self.partial = true;
        self
    }

    /// Shut a model field out of this input. The only way to set it on a
    /// record built from the input is the override map.
    pub fn exclude(mut self, field: impl Into<String>) -> Self {
        self.excluded.insert(field.into());
        self
    }

    /// Declare a same-name field for every writable model field not
    /// already declared or excluded. Auto and private fields are left
    /// out; declare those explicitly when an input really writes them.
    pub fn derive_fields(mut self) -> Self {
        self.derive_rest = true;
        self
    }

    pub fn build(self) -> Result<Arc<InputSchema>, DefinitionError> {
        let mut slots = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            slots.push(lower_field(&self.name, &self.model, field)?);
        }
        check_distinct(&self.name, &slots)?;
        for excluded in &self.excluded {
            if self.model.field(excluded).is_none() {
                return Err(DefinitionError::UnknownField {
                    target: self.name.clone(),
                    field: excluded.clone(),
                    source_model: self.model.name().to_string(),
                    available: self.model.field_names(),
                });
            }
            if let Some(slot) = slots.iter().find(|s| s.target == *excluded) {
                return Err(DefinitionError::FieldSpecConflict {
                    target: self.name.clone(),
                    field: slot.name.clone(),
                    detail: format!("writes '{excluded}' which is also excluded"),
                });
            }
        }
        if self.derive_rest {
            derive_slots(&self.model, &self.excluded, &mut slots);
        }
        // Partial inputs rewrite records that already exist, so they may
        // declare any subset. Only creation-capable inputs must cover
        // the model.
        if !self.partial {
            check_coverage(&self.name, &self.model, &slots, &self.excluded)?;
        }
        Ok(Arc::new(InputSchema {
            name: self.name,
            model: self.model,
            slots,
            partial: self.partial,
            excluded: self.excluded,
        }))
    }
}

fn lower_field(
    name: &str,
    model: &Arc<ModelSchema>,
    field: &InputField,
) -> Result<Slot, DefinitionError> {
    let target = match &field.reference {
        None => field.name.clone(),
        Some(reference) => {
            if !Arc::ptr_eq(reference.root(), model) {
                return Err(DefinitionError::WrongSource {
                    target: name.to_string(),
                    field: field.name.clone(),
                    referenced: reference.root().name().to_string(),
                    bound: model.name().to_string(),
                });
            }
            if reference.namespace().is_some() || reference.segments().len() != 1 {
                return Err(DefinitionError::DeepInputPath {
                    target: name.to_string(),
                    field: field.name.clone(),
                    path: reference.to_string(),
                });
            }
            reference.head().to_string()
        }
    };
    let def = match model.field(&target) {
        Some(def) => Some(def),
        // A rename must land on a real model field. A by-name field may
        // miss: it rides the accepted instance and falls away when a
        // record is built.
        None if field.reference.is_some() => {
            return Err(DefinitionError::UnknownField {
                target: name.to_string(),
                field: target,
                source_model: model.name().to_string(),
                available: model.field_names(),
            });
        }
        None => None,
    };
    if let (Some(def), Some(default)) = (def, &field.default) {
        if !def.ty().accepts(default) {
            return Err(DefinitionError::FieldSpecConflict {
                target: name.to_string(),
                field: field.name.clone(),
                detail: format!(
                    "default of kind {} does not match declared type {}",
                    default.kind(),
                    def.ty()
                ),
            });
        }
    }
    Ok(Slot {
        name: field.name.clone(),
        target,
        default: field.default.clone(),
    })
}

fn check_distinct(name: &str, slots: &[Slot]) -> Result<(), DefinitionError> {
    let mut names = BTreeSet::new();
    let mut targets = BTreeSet::new();
    for slot in slots {
        if !names.insert(slot.name.as_str()) {
            return Err(DefinitionError::DuplicateField {
                owner: name.to_string(),
                field: slot.name.clone(),
            });
        }
        if !targets.insert(slot.target.as_str()) {
            return Err(DefinitionError::FieldSpecConflict {
                target: name.to_string(),
                field: slot.name.clone(),
                detail: format!("writes '{}' which is already written by another field", slot.target),
            });
        }
    }
    Ok(())
}

fn derive_slots(model: &Arc<ModelSchema>, excluded: &BTreeSet<String>, slots: &mut Vec<Slot>) {
    for def in model.fields() {
        let name = def.name();
        if def.is_auto() || def.is_private() || excluded.contains(name) {
            continue;
        }
        if slots.iter().any(|s| s.target == name || s.name == name) {
            continue;
        }
        slots.push(Slot {
            name: name.to_string(),
            target: name.to_string(),
            default: None,
        });
    }
}

/// Every required model field must be writable through the input, left
/// to overrides, or private (service-supplied by definition).
fn check_coverage(
    name: &str,
    model: &Arc<ModelSchema>,
    slots: &[Slot],
    excluded: &BTreeSet<String>,
) -> Result<(), DefinitionError> {
    let covered: BTreeSet<&str> = slots.iter().map(|s| s.target.as_str()).collect();
    let missing: Vec<String> = model
        .index()
        .required()
        .iter()
        .filter(|f| {
            !model.is_private(f.as_str())
                && !covered.contains(f.as_str())
                && !excluded.contains(f.as_str())
        })
        .cloned()
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DefinitionError::InputUncovered {
            target: name.to_string(),
            source_model: model.name().to_string(),
            missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::RefPath;
    use crate::schema::{FieldDef, FieldType};

    fn product() -> Arc<ModelSchema> {
        ModelSchema::builder("Product")
            .field(FieldDef::new("id", FieldType::Int).auto())
            .field(FieldDef::new("name", FieldType::Str))
            .field(FieldDef::new("price", FieldType::Float))
            .field(FieldDef::new("stock", FieldType::Int).with_default(0))
            .field(FieldDef::new("cost_basis", FieldType::Float).private())
            .build()
            .unwrap()
    }

    // === TDD: Declaration and lowering ===

    #[test]
    fn test_builder_resolves_targets() {
        let product = product();
        let input = InputSchema::builder("CreateProduct", &product)
            .field(InputField::new("name"))
            .field(InputField::mapped("unit_price", RefPath::start(&product, "price").unwrap()))
            .build()
            .unwrap();
        assert_eq!(input.declared(), ["name", "unit_price"]);
        assert_eq!(input.target_of("unit_price"), Some("price"));
        assert_eq!(input.target_of("price"), None);
        assert!(!input.is_partial());
    }

    #[test]
    fn test_unknown_rename_target_lists_model_fields() {
        let product = product();
        let err = InputSchema::builder("CreateProduct", &product)
            .field(InputField::new("name"))
            .field(InputField::new("price"))
            .field(InputField::mapped("colour", FieldRef::new(&product, ["shade"])))
            .build()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "field 'shade' on 'CreateProduct' does not exist on source 'Product' - available \
             fields: [\"cost_basis\", \"id\", \"name\", \"price\", \"stock\"]"
        );
    }

    #[test]
    fn test_extra_declared_field_needs_no_model_counterpart() {
        let product = product();
        let input = InputSchema::builder("CreateProduct", &product)
            .field(InputField::new("name"))
            .field(InputField::new("price"))
            .field(InputField::new("import_note"))
            .build()
            .unwrap();
        assert_eq!(input.declared(), ["name", "price", "import_note"]);
        assert_eq!(input.target_of("import_note"), Some("import_note"));
    }

    #[test]
    fn test_deep_reference_rejected() {
        let address = ModelSchema::builder("Address")
            .field(FieldDef::new("city", FieldType::Str))
            .build()
            .unwrap();
        let user = ModelSchema::builder("User")
            .field(FieldDef::new("username", FieldType::Str))
            .field(FieldDef::new("address", FieldType::Model(Arc::clone(&address))))
            .build()
            .unwrap();
        let deep = RefPath::start(&user, "address").unwrap().then("city").unwrap();
        let err = InputSchema::builder("UpdateUser", &user)
            .field(InputField::new("username"))
            .field(InputField::mapped("city", deep))
            .field(InputField::new("address"))
            .build()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "field 'city' on input 'UpdateUser' maps through 'User.address.city' - \
             input mappings must reference direct source fields"
        );
    }

    #[test]
    fn test_two_fields_cannot_write_one_target() {
        let product = product();
        let err = InputSchema::builder("CreateProduct", &product)
            .field(InputField::new("name"))
            .field(InputField::new("price"))
            .field(InputField::mapped("unit_price", RefPath::start(&product, "price").unwrap()))
            .build()
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("writes 'price' which is already written by another field"));
    }

    // === TDD: Private and auto tolerance ===

    #[test]
    fn test_private_and_auto_fields_may_be_declared() {
        let product = product();
        let input = InputSchema::builder("ImportProduct", &product)
            .field(InputField::new("id"))
            .field(InputField::new("name"))
            .field(InputField::new("price"))
            .field(InputField::new("cost_basis"))
            .build();
        assert!(input.is_ok());
    }

    // === TDD: Coverage ===

    #[test]
    fn test_partial_input_may_declare_any_subset() {
        let product = product();
        let input = InputSchema::builder("AdjustPrice", &product)
            .field(InputField::new("price"))
            .partial()
            .build();
        assert!(input.is_ok());
    }

    #[test]
    fn test_uncovered_required_fields_reported_at_once() {
        let product = product();
        let err = InputSchema::builder("RenameProduct", &product)
            .field(InputField::new("name"))
            .build()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "input 'RenameProduct' does not cover required fields of 'Product': [\"price\"] - \
             declare them, exclude them for overrides, or default them on the model"
        );
    }

    #[test]
    fn test_excluded_fields_satisfy_coverage() {
        let product = product();
        let input = InputSchema::builder("RenameProduct", &product)
            .field(InputField::new("name"))
            .exclude("price")
            .build();
        assert!(input.is_ok());
    }

    #[test]
    fn test_excluding_a_declared_target_conflicts() {
        let product = product();
        let err = InputSchema::builder("CreateProduct", &product)
            .field(InputField::new("name"))
            .field(InputField::new("price"))
            .exclude("price")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("writes 'price' which is also excluded"));
    }

    // === TDD: Derivation ===

    #[test]
    fn test_derive_fields_covers_writable_rest() {
        let product = product();
        let input = InputSchema::builder("CreateProduct", &product)
            .field(InputField::new("name").with_default("unnamed"))
            .derive_fields()
            .build()
            .unwrap();
        // Declaration order first, derived fields after, in model order.
        assert_eq!(input.declared(), ["name", "price", "stock"]);
        assert_eq!(input.target_of("price"), Some("price"));
    }
}
