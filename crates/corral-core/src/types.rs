//! Schema type variants and their wire-facing attributes.
//!
//! Types never hold object links to one another. A `Sequence` names its
//! element type by fqn, a `Record` field names its item type by fqn, and
//! resolution to concrete types happens later, inside
//! [`TypeGraph`](crate::graph::TypeGraph). Keeping references string-keyed is
//! what makes the IR trivially serializable and lets the graph phase validate
//! a possibly cyclic type set without a live object graph.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Scalar width codes for [`TypeKind::Number`].
///
/// Codes follow the numpy convention: a kind letter (`i`nteger, `u`nsigned,
/// `f`loat) followed by the width in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Dtype {
    #[serde(rename = "i2")]
    I2,
    #[default]
    #[serde(rename = "i4")]
    I4,
    #[serde(rename = "i8")]
    I8,
    #[serde(rename = "u2")]
    U2,
    #[serde(rename = "u4")]
    U4,
    #[serde(rename = "u8")]
    U8,
    #[serde(rename = "f4")]
    F4,
    #[serde(rename = "f8")]
    F8,
}

impl Dtype {
    /// The wire code for this width, e.g. `"i4"`.
    pub fn code(&self) -> &'static str {
        match self {
            Dtype::I2 => "i2",
            Dtype::I4 => "i4",
            Dtype::I8 => "i8",
            Dtype::U2 => "u2",
            Dtype::U4 => "u4",
            Dtype::U8 => "u8",
            Dtype::F4 => "f4",
            Dtype::F8 => "f8",
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Dtype {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "i2" => Ok(Dtype::I2),
            "i4" => Ok(Dtype::I4),
            "i8" => Ok(Dtype::I8),
            "u2" => Ok(Dtype::U2),
            "u4" => Ok(Dtype::U4),
            "u8" => Ok(Dtype::U8),
            "f4" => Ok(Dtype::F4),
            "f8" => Ok(Dtype::F8),
            other => Err(CoreError::MalformedPayload(format!(
                "unknown dtype code `{other}`"
            ))),
        }
    }
}

/// A named slot in a [`TypeKind::Record`].
///
/// A field is not a type: it references its item type by fqn and is never
/// registered as a namespace member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    /// Fqn of the field's item type.
    pub item: String,
    /// Opaque default value; interpretation belongs to downstream object
    /// generators, not this layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc: String,
}

impl Field {
    /// `item` accepts anything that renders to an fqn, in particular a
    /// previously constructed [`Type`] or a plain string.
    pub fn new(
        name: impl Into<String>,
        item: impl ToString,
        default: Option<serde_json::Value>,
        doc: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            item: item.to_string(),
            default,
            doc: doc.into(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Variant payload, one per schema kind. The `schema` tag on the wire is the
/// lowercase variant name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schema", rename_all = "lowercase")]
pub enum TypeKind {
    Boolean,
    Number {
        #[serde(default)]
        dtype: Dtype,
    },
    String {
        /// Advisory regex constraint; not enforced at this layer.
        #[serde(default)]
        pattern: Option<String>,
        /// Advisory semantic tag, e.g. `"email"`.
        #[serde(default)]
        format: Option<String>,
    },
    Sequence {
        /// Fqn of the element type.
        items: String,
    },
    Record {
        #[serde(default)]
        fields: Vec<Field>,
    },
}

impl TypeKind {
    /// The schema-kind discriminant as it appears on the wire.
    pub fn schema(&self) -> &'static str {
        match self {
            TypeKind::Boolean => "boolean",
            TypeKind::Number { .. } => "number",
            TypeKind::String { .. } => "string",
            TypeKind::Sequence { .. } => "sequence",
            TypeKind::Record { .. } => "record",
        }
    }

    /// Fqns this kind depends on, in declaration order, duplicates preserved.
    ///
    /// Uniform across all variants: leaf kinds answer with an empty list so
    /// the graph walk never special-cases them.
    pub fn deps(&self) -> Vec<&str> {
        match self {
            TypeKind::Boolean | TypeKind::Number { .. } | TypeKind::String { .. } => Vec::new(),
            TypeKind::Sequence { items } => vec![items.as_str()],
            TypeKind::Record { fields } => fields.iter().map(|f| f.item.as_str()).collect(),
        }
    }
}

/// A schema type: a named, namespace-addressed descriptor of one kind.
///
/// `path` holds the ordered ancestor namespace segments, excluding the type's
/// own name. Types are constructed through their owning
/// [`Namespace`](crate::namespace::Namespace), which stamps `path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Type {
    pub name: String,
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub doc: String,
    #[serde(flatten)]
    pub kind: TypeKind,
}

impl Type {
    pub fn new(
        name: impl Into<String>,
        path: Vec<String>,
        doc: impl Into<String>,
        kind: TypeKind,
    ) -> Self {
        Self {
            name: name.into(),
            path,
            doc: doc.into(),
            kind,
        }
    }

    /// Fully-qualified name: dot-joined `path + [name]`, the sole addressing
    /// mechanism for this type.
    pub fn fqn(&self) -> String {
        let mut segments = self.path.clone();
        segments.push(self.name.clone());
        segments.join(".")
    }

    pub fn schema(&self) -> &'static str {
        self.kind.schema()
    }

    /// See [`TypeKind::deps`].
    pub fn deps(&self) -> Vec<&str> {
        self.kind.deps()
    }

    /// Look up a record field by name. Errors on non-record types and on
    /// unknown field names.
    pub fn field(&self, name: &str) -> Result<&Field, CoreError> {
        let missing = || CoreError::MissingKey {
            namespace: self.fqn(),
            key: name.to_string(),
        };
        match &self.kind {
            TypeKind::Record { fields } => {
                fields.iter().find(|f| f.name == name).ok_or_else(missing)
            }
            _ => Err(missing()),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fqn())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dtype_codes_round_trip() {
        for dtype in [
            Dtype::I2,
            Dtype::I4,
            Dtype::I8,
            Dtype::U2,
            Dtype::U4,
            Dtype::U8,
            Dtype::F4,
            Dtype::F8,
        ] {
            assert_eq!(dtype.code().parse::<Dtype>().unwrap(), dtype);
            assert_eq!(dtype.to_string(), dtype.code());
        }
        assert!("i3".parse::<Dtype>().is_err());
        assert_eq!(Dtype::default(), Dtype::I4);
    }

    #[test]
    fn display_is_the_fqn() {
        let ty = Type::new(
            "Count",
            vec!["top".to_string(), "base".to_string()],
            "",
            TypeKind::Number { dtype: Dtype::I4 },
        );
        assert_eq!(ty.to_string(), "top.base.Count");
        assert_eq!(ty.fqn(), "top.base.Count");

        let rootless = Type::new("Flag", vec![], "", TypeKind::Boolean);
        assert_eq!(rootless.to_string(), "Flag");
    }

    #[test]
    fn deps_are_uniform_across_variants() {
        assert!(TypeKind::Boolean.deps().is_empty());
        assert!(TypeKind::Number { dtype: Dtype::F8 }.deps().is_empty());
        assert!(TypeKind::String {
            pattern: None,
            format: None
        }
        .deps()
        .is_empty());

        let seq = TypeKind::Sequence {
            items: "a.b.Count".to_string(),
        };
        assert_eq!(seq.deps(), vec!["a.b.Count"]);

        // Declaration order, duplicates preserved.
        let rec = TypeKind::Record {
            fields: vec![
                Field::new("x", "a.b.Count", None, ""),
                Field::new("y", "a.b.Email", None, ""),
                Field::new("z", "a.b.Count", None, ""),
            ],
        };
        assert_eq!(rec.deps(), vec!["a.b.Count", "a.b.Email", "a.b.Count"]);
    }

    #[test]
    fn record_field_lookup() {
        let rec = Type::new(
            "Person",
            vec!["app".to_string()],
            "",
            TypeKind::Record {
                fields: vec![Field::new("email", "app.Email", None, "contact")],
            },
        );
        assert_eq!(rec.field("email").unwrap().item, "app.Email");
        assert!(matches!(
            rec.field("age"),
            Err(CoreError::MissingKey { .. })
        ));

        let not_a_record = Type::new("Flag", vec![], "", TypeKind::Boolean);
        assert!(not_a_record.field("anything").is_err());
    }

    #[test]
    fn field_item_accepts_types_and_strings() {
        let ty = Type::new(
            "Count",
            vec!["base".to_string()],
            "",
            TypeKind::Number { dtype: Dtype::I4 },
        );
        assert_eq!(Field::new("n", &ty, None, "").item, "base.Count");
        assert_eq!(Field::new("n", "base.Count", None, "").item, "base.Count");
    }
}
