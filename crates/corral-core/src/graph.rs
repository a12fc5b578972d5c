//! Fqn-indexed dependency graph and topological ordering of a type set.
//!
//! Downstream emitters consume the order produced here: every dependency
//! strictly precedes its dependents, so definitions can be written out
//! sequentially. The ordering either covers the whole graph or fails;
//! no partial order is ever surfaced.

use std::collections::{BTreeMap, HashMap};

use crate::error::CoreError;
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// A set of types indexed by fqn. Fqn collisions resolve last-write-wins;
/// duplicate registration is not an error.
#[derive(Debug, Clone, Default)]
pub struct TypeGraph {
    nodes: BTreeMap<String, Type>,
}

impl TypeGraph {
    pub fn new(types: impl IntoIterator<Item = Type>) -> Self {
        let mut nodes = BTreeMap::new();
        for ty in types {
            let fqn = ty.fqn();
            if nodes.insert(fqn.clone(), ty).is_some() {
                tracing::debug!("graph entry `{fqn}` overwritten");
            }
        }
        Self { nodes }
    }

    pub fn get(&self, fqn: &str) -> Option<&Type> {
        self.nodes.get(fqn)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Type)> {
        self.nodes.iter().map(|(fqn, ty)| (fqn.as_str(), ty))
    }

    /// Depth-first topological ordering over the fqn keyset: a permutation
    /// of all keys in which every dependency precedes its dependents.
    ///
    /// A dependency fqn absent from the graph fails with
    /// [`CoreError::UndefinedReference`]; reaching a node already on the
    /// active search path fails with [`CoreError::CycleDetected`]. The walk
    /// keeps its own stack, so dependency chains deeper than the call stack
    /// are fine.
    pub fn toposort(&self) -> Result<Vec<String>, CoreError> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(self.nodes.len());

        for root in self.nodes.keys() {
            if marks.contains_key(root.as_str()) {
                continue;
            }
            self.visit(root, &mut marks, &mut order)?;
        }

        tracing::debug!("topologically sorted {} types", order.len());
        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        root: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        order: &mut Vec<String>,
    ) -> Result<(), CoreError> {
        // Each frame holds a node and a cursor into its dependency list.
        let mut stack: Vec<(&'a str, Vec<&'a str>, usize)> =
            vec![(root, self.nodes[root].deps(), 0)];
        marks.insert(root, Mark::InProgress);

        while let Some(top) = stack.len().checked_sub(1) {
            // Borrow the top frame only long enough to pick the next step.
            let (node, next_dep) = {
                let (node, deps, cursor) = &mut stack[top];
                if *cursor < deps.len() {
                    *cursor += 1;
                    (*node, Some(deps[*cursor - 1]))
                } else {
                    (*node, None)
                }
            };

            let Some(dep) = next_dep else {
                // All dependencies visited: the node is done and may be
                // emitted after them.
                marks.insert(node, Mark::Done);
                order.push(node.to_string());
                stack.pop();
                continue;
            };

            match marks.get(dep) {
                Some(Mark::Done) => {}
                Some(Mark::InProgress) => {
                    return Err(CoreError::CycleDetected {
                        fqn: dep.to_string(),
                    });
                }
                None => {
                    let ty =
                        self.nodes
                            .get(dep)
                            .ok_or_else(|| CoreError::UndefinedReference {
                                referrer: node.to_string(),
                                fqn: dep.to_string(),
                            })?;
                    marks.insert(dep, Mark::InProgress);
                    stack.push((dep, ty.deps(), 0));
                }
            }
        }
        Ok(())
    }
}

impl FromIterator<Type> for TypeGraph {
    fn from_iter<I: IntoIterator<Item = Type>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::Namespace;
    use crate::types::{Dtype, Field, TypeKind};

    fn pos(order: &[String], fqn: &str) -> usize {
        order
            .iter()
            .position(|o| o == fqn)
            .unwrap_or_else(|| panic!("{fqn} missing from {order:?}"))
    }

    #[test]
    fn indexes_by_fqn() {
        let mut ns = Namespace::new("top");
        let count = ns.number("Count", Dtype::I4, "");
        let graph: TypeGraph = vec![count.clone()].into_iter().collect();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.get("top.Count"), Some(&count));
        assert_eq!(graph.get("top.Missing"), None);
    }

    #[test]
    fn fqn_collisions_take_the_last_entry() {
        let mut ns = Namespace::new("top");
        let first = ns.boolean("Thing", "");
        let second = ns.number("Thing", Dtype::F4, "");
        let graph = TypeGraph::new(vec![first, second.clone()]);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.get("top.Thing"), Some(&second));
    }

    #[test]
    fn dependencies_come_first() {
        let mut top = Namespace::new("top");
        let count = top.namespace("base").number("Count", Dtype::I4, "");
        let counts = top
            .namespace("app")
            .sequence("Counts", &count, "");
        let person = top.namespace("app").record(
            "Person",
            vec![Field::new("counts", &counts, None, "")],
            "",
        );

        let graph = TypeGraph::new(vec![person, counts, count]);
        let order = graph.toposort().unwrap();
        assert_eq!(order.len(), 3);
        assert!(pos(&order, "top.base.Count") < pos(&order, "top.app.Counts"));
        assert!(pos(&order, "top.app.Counts") < pos(&order, "top.app.Person"));
    }

    #[test]
    fn two_cycle_is_rejected() {
        let a = Type::new(
            "A",
            vec!["top".to_string()],
            "",
            TypeKind::Sequence {
                items: "top.B".to_string(),
            },
        );
        let b = Type::new(
            "B",
            vec!["top".to_string()],
            "",
            TypeKind::Sequence {
                items: "top.A".to_string(),
            },
        );
        let graph = TypeGraph::new(vec![a, b]);
        assert!(matches!(
            graph.toposort(),
            Err(CoreError::CycleDetected { .. })
        ));
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let a = Type::new(
            "A",
            vec![],
            "",
            TypeKind::Record {
                fields: vec![Field::new("next", "A", None, "")],
            },
        );
        let graph = TypeGraph::new(vec![a]);
        assert!(matches!(
            graph.toposort(),
            Err(CoreError::CycleDetected { .. })
        ));
    }

    #[test]
    fn missing_dependency_is_an_undefined_reference() {
        let seq = Type::new(
            "Counts",
            vec!["top".to_string()],
            "",
            TypeKind::Sequence {
                items: "top.Count".to_string(),
            },
        );
        let err = TypeGraph::new(vec![seq]).toposort().unwrap_err();
        match err {
            CoreError::UndefinedReference { referrer, fqn } => {
                assert_eq!(referrer, "top.Counts");
                assert_eq!(fqn, "top.Count");
            }
            other => panic!("expected UndefinedReference, got {other}"),
        }
    }

    #[test]
    fn order_is_a_permutation_regardless_of_input_order() {
        let mut top = Namespace::new("top");
        let count = top.number("Count", Dtype::I4, "");
        let email = top.string("Email", None, Some("email"), "");
        let counts = top.sequence("Counts", &count, "");
        let person = top.record(
            "Person",
            vec![
                Field::new("email", &email, None, ""),
                Field::new("counts", &counts, None, ""),
            ],
            "",
        );

        let forward = TypeGraph::new(vec![
            count.clone(),
            email.clone(),
            counts.clone(),
            person.clone(),
        ]);
        let backward = TypeGraph::new(vec![person, counts, email, count]);

        for graph in [forward, backward] {
            let mut order = graph.toposort().unwrap();
            assert!(pos(&order, "top.Count") < pos(&order, "top.Counts"));
            assert!(pos(&order, "top.Counts") < pos(&order, "top.Person"));
            assert!(pos(&order, "top.Email") < pos(&order, "top.Person"));
            order.sort();
            order.dedup();
            assert_eq!(order.len(), 4);
        }
    }

    #[test]
    fn deep_chains_do_not_overflow_the_stack() {
        let mut types = vec![Type::new("T0", vec!["deep".to_string()], "", TypeKind::Boolean)];
        for i in 1..20_000 {
            types.push(Type::new(
                format!("T{i}"),
                vec!["deep".to_string()],
                "",
                TypeKind::Sequence {
                    items: format!("deep.T{}", i - 1),
                },
            ));
        }
        let graph = TypeGraph::new(types);
        let order = graph.toposort().unwrap();
        assert_eq!(order.len(), 20_000);
        assert_eq!(order.first().map(String::as_str), Some("deep.T0"));
    }
}
