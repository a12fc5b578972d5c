//! Hierarchical factory, registry, and dotted-name resolver for schema types.
//!
//! A namespace is the only construction path for types: each schema-kind
//! constructor stamps the new type's `path` with this namespace's own
//! segments and registers it under its name. Re-registration under an
//! existing name overwrites silently; there is no deletion.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::CoreError;
use crate::types::{Dtype, Field, Type, TypeKind};

/// A namespace member: either a registered type or a nested namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Type(Type),
    Namespace(Namespace),
}

impl Part {
    pub fn name(&self) -> &str {
        match self {
            Part::Type(t) => &t.name,
            Part::Namespace(ns) => &ns.name,
        }
    }

    /// The schema-kind discriminant of this member.
    pub fn schema(&self) -> &'static str {
        match self {
            Part::Type(t) => t.schema(),
            Part::Namespace(_) => "namespace",
        }
    }

    pub fn as_type(&self) -> Option<&Type> {
        match self {
            Part::Type(t) => Some(t),
            Part::Namespace(_) => None,
        }
    }

    pub fn as_namespace(&self) -> Option<&Namespace> {
        match self {
            Part::Type(_) => None,
            Part::Namespace(ns) => Some(ns),
        }
    }
}

/// Hierarchical grouping and addressing construct for schema types.
///
/// Purely a build-time organizing structure: generated runtime objects do not
/// carry it. Members live in `parts`, keyed by their own name.
#[derive(Debug, Clone, PartialEq)]
pub struct Namespace {
    pub name: String,
    pub path: Vec<String>,
    pub doc: String,
    pub(crate) parts: BTreeMap<String, Part>,
}

impl Namespace {
    /// Create a root namespace. A dotted `name` folds all but the final
    /// segment into `path`: `Namespace::new("app.sub")` has `name = "sub"`
    /// and `path = ["app"]`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_path(name, Vec::new())
    }

    /// Create a namespace below `path`. Dotted names fold as in [`new`].
    ///
    /// [`new`]: Namespace::new
    pub fn with_path(name: impl Into<String>, mut path: Vec<String>) -> Self {
        let dotted = name.into();
        let mut segments: Vec<&str> = dotted.split('.').collect();
        let name = segments.pop().unwrap_or_default().to_string();
        path.extend(segments.into_iter().map(str::to_string));
        Self {
            name,
            path,
            doc: String::new(),
            parts: BTreeMap::new(),
        }
    }

    /// Fully-qualified name: dot-joined `path + [name]`.
    pub fn fqn(&self) -> String {
        let mut segments = self.path.clone();
        segments.push(self.name.clone());
        segments.join(".")
    }

    /// The `path` stamped onto members of this namespace: `path + [name]`.
    fn child_path(&self) -> Vec<String> {
        let mut segments = self.path.clone();
        segments.push(self.name.clone());
        segments
    }

    /// Registered members, keyed by their own name.
    pub fn parts(&self) -> &BTreeMap<String, Part> {
        &self.parts
    }

    /// Normalize a dotted key into this namespace: a leading
    /// `"<this-namespace-fqn>."` prefix is stripped, so callers may pass
    /// fully-qualified or namespace-relative identifiers interchangeably.
    pub fn normalize(&self, key: &str) -> String {
        let prefix = format!("{}.", self.fqn());
        match key.strip_prefix(&prefix) {
            Some(rest) => rest.to_string(),
            None => key.to_string(),
        }
    }

    /// Normalize a key given as a segment sequence. See [`normalize`].
    ///
    /// [`normalize`]: Namespace::normalize
    pub fn normalize_segments<I, S>(&self, segments: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let key = segments
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(".");
        self.normalize(&key)
    }

    fn missing(&self, key: &str) -> CoreError {
        CoreError::MissingKey {
            namespace: self.fqn(),
            key: key.to_string(),
        }
    }

    /// Resolve a dotted key, walking `parts` segment by segment.
    pub fn get(&self, key: &str) -> Result<&Part, CoreError> {
        let key = self.normalize(key);
        let (first, rest) = match key.split_once('.') {
            Some((first, rest)) => (first, Some(rest)),
            None => (key.as_str(), None),
        };
        let part = self.parts.get(first).ok_or_else(|| self.missing(first))?;
        match (part, rest) {
            (part, None) => Ok(part),
            (Part::Namespace(ns), Some(rest)) => ns.get(rest),
            (Part::Type(_), Some(_)) => Err(self.missing(&key)),
        }
    }

    fn register(&mut self, ty: Type) -> Type {
        if self
            .parts
            .insert(ty.name.clone(), Part::Type(ty.clone()))
            .is_some()
        {
            tracing::debug!("overwrote part `{}` in `{}`", ty.name, self.fqn());
        }
        ty
    }

    /// Construct and register a boolean type.
    pub fn boolean(&mut self, name: &str, doc: &str) -> Type {
        self.register(Type::new(name, self.child_path(), doc, TypeKind::Boolean))
    }

    /// Construct and register a number type of the given scalar width.
    pub fn number(&mut self, name: &str, dtype: Dtype, doc: &str) -> Type {
        self.register(Type::new(
            name,
            self.child_path(),
            doc,
            TypeKind::Number { dtype },
        ))
    }

    /// Construct and register a string type. `pattern` and `format` are
    /// advisory annotations carried through to the wire form.
    pub fn string(
        &mut self,
        name: &str,
        pattern: Option<&str>,
        format: Option<&str>,
        doc: &str,
    ) -> Type {
        self.register(Type::new(
            name,
            self.child_path(),
            doc,
            TypeKind::String {
                pattern: pattern.map(str::to_string),
                format: format.map(str::to_string),
            },
        ))
    }

    /// Construct and register a sequence type. `items` accepts a constructed
    /// [`Type`] or an fqn string.
    pub fn sequence(&mut self, name: &str, items: impl ToString, doc: &str) -> Type {
        self.register(Type::new(
            name,
            self.child_path(),
            doc,
            TypeKind::Sequence {
                items: items.to_string(),
            },
        ))
    }

    /// Construct and register a record type with the given ordered fields.
    pub fn record(&mut self, name: &str, fields: Vec<Field>, doc: &str) -> Type {
        self.register(Type::new(
            name,
            self.child_path(),
            doc,
            TypeKind::Record { fields },
        ))
    }

    /// Construct and return a field. Fields are never registered as
    /// namespace members.
    pub fn field(
        &self,
        name: &str,
        item: impl ToString,
        default: Option<serde_json::Value>,
        doc: &str,
    ) -> Field {
        Field::new(name, item, default, doc)
    }

    /// Create or descend into a child namespace. Accepts a dotted name and
    /// is idempotent: existing namespaces along the chain are reused.
    pub fn namespace(&mut self, name: &str) -> &mut Namespace {
        self.subnamespace(name)
    }

    /// Idempotently create/descend a chain of child namespaces along a
    /// normalized dotted path, creating any missing segment. A segment
    /// occupied by a type is overwritten by a fresh namespace
    /// (last-write-wins, as with any re-registration).
    pub fn subnamespace(&mut self, path: &str) -> &mut Namespace {
        let path = self.normalize(path);
        if path.is_empty() {
            return self;
        }
        let mut ns = self;
        for segment in path.split('.') {
            ns = ns.descend(segment);
        }
        ns
    }

    fn descend(&mut self, segment: &str) -> &mut Namespace {
        let child_path = self.child_path();
        let part = match self.parts.entry(segment.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(Part::Namespace(Namespace::with_path(segment, child_path)))
            }
            Entry::Occupied(slot) => {
                let part = slot.into_mut();
                if !matches!(part, Part::Namespace(_)) {
                    *part = Part::Namespace(Namespace::with_path(segment, child_path));
                }
                part
            }
        };
        match part {
            Part::Namespace(ns) => ns,
            Part::Type(_) => unreachable!("descend always leaves a namespace part"),
        }
    }

    /// True iff `ty.path` starts with this namespace's own segments, i.e.
    /// the type belongs to this namespace or one of its descendants.
    pub fn contains(&self, ty: &Type) -> bool {
        let me = self.child_path();
        ty.path.len() >= me.len() && ty.path[..me.len()] == me[..]
    }

    /// File an externally constructed type into the correct (possibly newly
    /// created) sub-namespace. Fails unless the type's declared path places
    /// it under this namespace.
    pub fn add(&mut self, ty: Type) -> Result<(), CoreError> {
        if !self.contains(&ty) {
            return Err(CoreError::InvalidMembership {
                namespace: self.fqn(),
                fqn: ty.fqn(),
            });
        }
        let suffix = ty.path[self.child_path().len()..].join(".");
        let ns = self.subnamespace(&suffix);
        tracing::debug!("added `{}` under `{}`", ty.fqn(), ns.fqn());
        ns.register(ty);
        Ok(())
    }

    /// Non-namespace members. With `recur`, flattens the types of descendant
    /// namespaces too; sub-namespaces are never types themselves.
    pub fn types(&self, recur: bool) -> Vec<&Type> {
        let mut out = Vec::new();
        for part in self.parts.values() {
            match part {
                Part::Type(t) => out.push(t),
                Part::Namespace(ns) if recur => out.extend(ns.types(true)),
                Part::Namespace(_) => {}
            }
        }
        out
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fqn())
    }
}
