//! Bidirectional mapping between the IR and its canonical wire form.
//!
//! Every object on the wire is a JSON object carrying `name`, `schema`,
//! `path` and `doc`, plus variant-specific keys. A namespace payload is an
//! envelope of those four keys with one extra key per child, keyed by the
//! child's own name; the child payloads disambiguate themselves through
//! their own `schema` tag. The flat mixed-key shape is retained for
//! compatibility with existing schema files, so a child that shares a name
//! with an envelope key cannot be represented.

use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::namespace::{Namespace, Part};
use crate::types::Type;

fn take_string(map: &mut Map<String, Value>, key: &str) -> Result<String, CoreError> {
    match map.remove(key) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(CoreError::MalformedPayload(format!(
            "key `{key}` must be a string, got {other}"
        ))),
        None => Err(CoreError::MalformedPayload(format!("missing key `{key}`"))),
    }
}

fn take_path(map: &mut Map<String, Value>) -> Result<Vec<String>, CoreError> {
    match map.remove("path") {
        None => Ok(Vec::new()),
        Some(value) => Ok(serde_json::from_value(value)?),
    }
}

fn take_doc(map: &mut Map<String, Value>) -> Result<String, CoreError> {
    match map.remove("doc") {
        None => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(CoreError::MalformedPayload(format!(
            "key `doc` must be a string, got {other}"
        ))),
    }
}

impl Type {
    /// Wire form: `{name, schema, path, doc, <variant-specific keys>}`.
    pub fn to_value(&self) -> Result<Value, CoreError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Reconstruct a type from its wire form. Dispatches on the `schema`
    /// tag; a stray `deps` key (emitted by some producers) is ignored, as is
    /// any other unknown key. Namespace payloads are rejected here; use
    /// [`Part::from_value`] when the kind is not known up front.
    pub fn from_value(value: Value) -> Result<Type, CoreError> {
        Ok(serde_json::from_value(value)?)
    }
}

impl Namespace {
    /// Envelope `{name, schema: "namespace", path, doc}` plus one key per
    /// child, valued by the child's own wire form.
    pub fn to_value(&self) -> Result<Value, CoreError> {
        let mut map = Map::new();
        map.insert("name".to_string(), Value::String(self.name.clone()));
        map.insert("schema".to_string(), Value::String("namespace".to_string()));
        map.insert("path".to_string(), serde_json::to_value(&self.path)?);
        map.insert("doc".to_string(), Value::String(self.doc.clone()));
        for (name, part) in self.parts() {
            map.insert(name.clone(), part.to_value()?);
        }
        Ok(Value::Object(map))
    }

    /// Reconstruct a namespace tree: the envelope keys are popped and every
    /// remaining key is a child payload reconstructed recursively.
    pub fn from_value(value: Value) -> Result<Namespace, CoreError> {
        let Value::Object(mut map) = value else {
            return Err(CoreError::MalformedPayload(format!(
                "namespace payload must be an object, got {value}"
            )));
        };
        let schema = take_string(&mut map, "schema")?;
        if schema != "namespace" {
            return Err(CoreError::MalformedPayload(format!(
                "expected schema `namespace`, got `{schema}`"
            )));
        }
        let name = take_string(&mut map, "name")?;
        let path = take_path(&mut map)?;
        let doc = take_doc(&mut map)?;
        map.remove("deps");

        let mut ns = Namespace::with_path(name, path);
        ns.doc = doc;
        for (child_name, payload) in map {
            let part = Part::from_value(payload)?;
            ns.parts.insert(child_name, part);
        }
        Ok(ns)
    }
}

impl Part {
    pub fn to_value(&self) -> Result<Value, CoreError> {
        match self {
            Part::Type(t) => t.to_value(),
            Part::Namespace(ns) => ns.to_value(),
        }
    }

    /// Reconstruct any wire payload, leaf type or namespace, disambiguated
    /// by its `schema` tag.
    pub fn from_value(value: Value) -> Result<Part, CoreError> {
        let schema = value
            .get("schema")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                CoreError::MalformedPayload(format!("payload without a `schema` tag: {value}"))
            })?;
        if schema == "namespace" {
            Ok(Part::Namespace(Namespace::from_value(value)?))
        } else {
            Ok(Part::Type(Type::from_value(value)?))
        }
    }
}
