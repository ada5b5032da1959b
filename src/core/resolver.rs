use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tree_sitter::Node as TSNode;

use crate::parsers::common::extract_text;

/// Receiver name recognised in instance-attribute patterns.
pub const SELF_RECEIVER: &str = "self";

/// Lifetime of the attribute-type table inside one unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttributeTypePolicy {
    /// Each class body starts with an empty table; the outer table is restored on exit.
    #[default]
    ClassScoped,
    /// One table for the whole unit, shared by sibling classes.
    UnitScoped,
}

/// Last dotted segment of an import path: `pkg.db.Connection` -> `Connection`.
pub fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

/// Local name -> dotted import path. Lives for the whole unit.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    bindings: HashMap<String, String>,
}

impl AliasTable {
    pub fn bind(&mut self, local: impl Into<String>, path: impl Into<String>) {
        self.bindings.insert(local.into(), path.into());
    }

    pub fn resolve(&self, local: &str) -> Option<&str> {
        self.bindings.get(local).map(String::as_str)
    }

    /// Bare class name an imported binding points at.
    pub fn imported_type(&self, local: &str) -> Option<&str> {
        self.resolve(local).map(last_segment)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Instance attribute or parameter name -> best-guess bare class name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeTypes {
    types: HashMap<String, String>,
}

impl AttributeTypes {
    pub fn record(&mut self, name: impl Into<String>, type_name: impl Into<String>) {
        self.types.insert(name.into(), type_name.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.types.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// A declared parameter, with its annotation when that is a simple identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub annotation: Option<String>,
}

/// Shape of a call's callee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callee<'a> {
    /// `helper(...)`
    BareName(&'a str),
    /// `self.attr.method(...)`
    SelfAttributeMethod { attribute: &'a str, method: &'a str },
    /// Any other `expr.method(...)`, including `self.method(...)` and deeper chains.
    Method(&'a str),
    /// Subscripts, calls of calls, lambdas.
    Other,
}

/// Shape of the right-hand side of an instance-attribute assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignedValue<'a> {
    /// `Name(...)`
    Construction(&'a str),
    /// `name`
    Name(&'a str),
    Other,
}

pub fn classify_callee<'a>(function: &TSNode, source: &'a [u8]) -> Callee<'a> {
    match function.kind() {
        "identifier" => Callee::BareName(extract_text(function, source)),
        "attribute" => {
            let Some(method) = function.child_by_field_name("attribute") else {
                return Callee::Other;
            };
            let method = extract_text(&method, source);

            let receiver = function.child_by_field_name("object");
            match receiver.and_then(|object| self_attribute(&object, source)) {
                Some(attribute) => Callee::SelfAttributeMethod { attribute, method },
                None => Callee::Method(method),
            }
        }
        _ => Callee::Other,
    }
}

pub fn classify_value<'a>(value: &TSNode, source: &'a [u8]) -> AssignedValue<'a> {
    match value.kind() {
        "call" => match value.child_by_field_name("function") {
            Some(function) if function.kind() == "identifier" => {
                AssignedValue::Construction(extract_text(&function, source))
            }
            _ => AssignedValue::Other,
        },
        "identifier" => AssignedValue::Name(extract_text(value, source)),
        _ => AssignedValue::Other,
    }
}

/// `X` when `node` is exactly `self.X`.
pub fn self_attribute<'a>(node: &TSNode, source: &'a [u8]) -> Option<&'a str> {
    if node.kind() != "attribute" {
        return None;
    }
    let object = node.child_by_field_name("object")?;
    if object.kind() != "identifier" || extract_text(&object, source) != SELF_RECEIVER {
        return None;
    }
    let attribute = node.child_by_field_name("attribute")?;
    Some(extract_text(&attribute, source))
}

/// Saved outer state restored when a class body is left.
#[derive(Debug)]
pub struct ClassFrame {
    previous_class: Option<String>,
    saved_types: Option<AttributeTypes>,
}

/// Mutable, scoped resolution state of one traversal.
#[derive(Debug, Default)]
pub struct ResolutionState {
    pub aliases: AliasTable,
    pub attribute_types: AttributeTypes,
    enclosing_class: Option<String>,
    enclosing_function: Option<String>,
    policy: AttributeTypePolicy,
}

impl ResolutionState {
    pub fn new(policy: AttributeTypePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn enclosing_class(&self) -> Option<&str> {
        self.enclosing_class.as_deref()
    }

    pub fn enclosing_function(&self) -> Option<&str> {
        self.enclosing_function.as_deref()
    }

    pub fn class_qualified_name(&self, name: &str) -> String {
        match &self.enclosing_class {
            Some(class) => format!("{class}.{name}"),
            None => name.to_string(),
        }
    }

    pub fn function_qualified_name(&self, name: &str) -> String {
        match self.enclosing_class.as_ref().or(self.enclosing_function.as_ref()) {
            Some(scope) => format!("{scope}.{name}"),
            None => name.to_string(),
        }
    }

    /// Scope a call or reference observed right now is attributed to.
    pub fn observation_source<'a>(&'a self, unit_id: &'a str) -> &'a str {
        self.enclosing_function
            .as_deref()
            .or(self.enclosing_class.as_deref())
            .unwrap_or(unit_id)
    }

    pub fn enter_class(&mut self, qualified_name: String) -> ClassFrame {
        let saved_types = match self.policy {
            AttributeTypePolicy::ClassScoped => Some(std::mem::take(&mut self.attribute_types)),
            AttributeTypePolicy::UnitScoped => None,
        };
        ClassFrame {
            previous_class: self.enclosing_class.replace(qualified_name),
            saved_types,
        }
    }

    pub fn exit_class(&mut self, frame: ClassFrame) {
        self.enclosing_class = frame.previous_class;
        if let Some(types) = frame.saved_types {
            self.attribute_types = types;
        }
    }

    pub fn enter_function(&mut self, qualified_name: String) -> Option<String> {
        self.enclosing_function.replace(qualified_name)
    }

    pub fn exit_function(&mut self, previous: Option<String>) {
        self.enclosing_function = previous;
    }

    /// Seed attribute types from the annotated parameters of an initializer.
    /// The receiver (first parameter) is skipped.
    pub fn seed_initializer_parameters(&mut self, parameters: &[Parameter]) {
        for parameter in parameters.iter().skip(1) {
            let Some(annotation) = parameter.annotation.as_deref() else {
                continue;
            };
            if let Some(type_name) = self.aliases.imported_type(annotation) {
                self.attribute_types.record(&parameter.name, type_name);
            }
        }
    }

    /// Infer the type of `self.<attribute>` from the assigned value.
    pub fn infer_assignment(&mut self, attribute: &str, value: AssignedValue<'_>) {
        let inferred = match value {
            AssignedValue::Construction(class) => self.aliases.imported_type(class),
            AssignedValue::Name(name) => self.attribute_types.get(name),
            AssignedValue::Other => None,
        }
        .map(str::to_string);

        if let Some(type_name) = inferred {
            self.attribute_types.record(attribute, type_name);
        }
    }

    /// Candidate targets for a call, in emission order.
    ///
    /// A resolved name is always followed by its unqualified form so that a
    /// consumer that only knows short names can still match.
    pub fn call_targets(&self, callee: Callee<'_>) -> Vec<String> {
        match callee {
            Callee::BareName(name) => match self.aliases.resolve(name) {
                Some(path) if path != name => vec![path.to_string(), name.to_string()],
                _ => vec![name.to_string()],
            },
            Callee::SelfAttributeMethod { attribute, method } => {
                match self.attribute_types.get(attribute) {
                    Some(type_name) => vec![format!("{type_name}.{method}"), method.to_string()],
                    None => vec![method.to_string()],
                }
            }
            Callee::Method(method) => vec![method.to_string()],
            Callee::Other => Vec::new(),
        }
    }
}
