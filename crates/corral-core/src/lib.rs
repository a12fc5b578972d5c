//! Core intermediate representation and type system for corral
//!
//! The IR is a small structural type system (boolean, number, string,
//! sequence and record types organized in a hierarchical [`Namespace`])
//! with a bidirectional mapping to a plain JSON-object wire form and a
//! dependency-respecting linearization of a type set ([`TypeGraph`]).
//! Schema loaders feed the wire form in, object generators and code
//! emitters consume the tree and the topological order.

pub mod error;
pub mod graph;
pub mod namespace;
pub mod types;
pub mod wire;

pub use error::CoreError;
pub use graph::TypeGraph;
pub use namespace::{Namespace, Part};
pub use types::{Dtype, Field, Type, TypeKind};
