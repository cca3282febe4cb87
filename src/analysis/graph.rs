//! Type-level dependency graph derived from one declaration tree.
//!
//! Nodes are the type names declared in the module (extensions fold into the
//! type they extend). Edges only connect names the module itself declares;
//! references to external or standard library types are not edges.

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use super::model::{DeclarationKind, DeclarationTree};

/// Why one type depends on another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeKind {
    /// Stored property annotated with the target type.
    FieldType,
    /// Target appears in the inheritance or conformance list.
    Inheritance,
    /// Constructor-style call of the target inside a method.
    Call,
    /// Static member access on the target inside a method.
    MemberAccess,
}

impl EdgeKind {
    /// Edges that make up the structural (compile-time) dependency graph.
    pub fn is_structural(&self) -> bool {
        matches!(self, EdgeKind::FieldType | EdgeKind::Inheritance)
    }
}

/// A type node with the first line it is declared on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNode {
    pub name: String,
    pub line: usize,
}

/// Directed dependency graph between the types of one module.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<TypeNode, EdgeKind>,
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Build the graph by scanning member types, inheritance lists and
    /// call/member-access expressions.
    pub fn build(tree: &DeclarationTree) -> Self {
        let mut graph = Self::default();

        for (_, decl) in tree.types() {
            graph.ensure_node(&decl.name, decl.span.start_line);
        }

        for (id, decl) in tree.iter() {
            match decl.kind {
                DeclarationKind::Class
                | DeclarationKind::Struct
                | DeclarationKind::Enum
                | DeclarationKind::Protocol
                | DeclarationKind::Actor
                | DeclarationKind::Extension => {
                    for supertype in &decl.supertypes {
                        graph.add_edge(&decl.name, supertype, EdgeKind::Inheritance);
                    }
                }
                DeclarationKind::Variable => {
                    if decl.modifiers.is_computed {
                        continue;
                    }
                    if let Some((_, owner)) = tree.enclosing_type(id) {
                        for type_ref in &decl.type_refs {
                            graph.add_edge(&owner.name, type_ref, EdgeKind::FieldType);
                        }
                    }
                }
                DeclarationKind::Function => {
                    let (Some((_, owner)), Some(body)) = (tree.enclosing_type(id), &decl.body)
                    else {
                        continue;
                    };
                    for callee in &body.constructed_types {
                        graph.add_edge(&owner.name, callee, EdgeKind::Call);
                    }
                    for access in &body.member_accesses {
                        if let Some(target) = access.base.type_name() {
                            graph.add_edge(&owner.name, target, EdgeKind::MemberAccess);
                        }
                    }
                }
                DeclarationKind::TypeAlias => {}
            }
        }

        graph
    }

    fn ensure_node(&mut self, name: &str, line: usize) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(TypeNode {
            name: name.to_string(),
            line,
        });
        self.index.insert(name.to_string(), idx);
        idx
    }

    fn add_edge(&mut self, from: &str, to: &str, kind: EdgeKind) {
        let (Some(&a), Some(&b)) = (self.index.get(from), self.index.get(to)) else {
            return;
        };
        let duplicate = self
            .graph
            .edges_connecting(a, b)
            .any(|e| *e.weight() == kind);
        if !duplicate {
            self.graph.add_edge(a, b, kind);
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_type(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Types in the order they were first declared.
    pub fn nodes(&self) -> impl Iterator<Item = &TypeNode> + '_ {
        self.graph.node_weights()
    }

    /// Distinct other types `name` reaches through edges of the given kinds.
    pub fn dependencies_of(&self, name: &str, kinds: &[EdgeKind]) -> BTreeSet<String> {
        let Some(&idx) = self.index.get(name) else {
            return BTreeSet::new();
        };
        self.graph
            .edges(idx)
            .filter(|e| kinds.contains(e.weight()) && e.target() != idx)
            .map(|e| self.graph[e.target()].name.clone())
            .collect()
    }

    /// Whether `name` has an edge of the given kind to `target`.
    pub fn has_edge(&self, name: &str, target: &str, kind: EdgeKind) -> bool {
        match (self.index.get(name), self.index.get(target)) {
            (Some(&a), Some(&b)) => self.graph.edges_connecting(a, b).any(|e| *e.weight() == kind),
            _ => false,
        }
    }

    /// Dependency cycles restricted to structural edges.
    ///
    /// Each strongly connected component with two or more members is one
    /// cycle; a type with a structural edge to itself is a cycle of one.
    /// Members are ordered by declaration line, cycles by their first member.
    pub fn structural_cycles(&self) -> Vec<Vec<TypeNode>> {
        let structural = self
            .graph
            .filter_map(|_, n| Some(n.clone()), |_, e| e.is_structural().then_some(*e));

        let mut cycles: Vec<Vec<TypeNode>> = tarjan_scc(&structural)
            .into_iter()
            .filter(|component| match component.as_slice() {
                [single] => structural.contains_edge(*single, *single),
                members => members.len() >= 2,
            })
            .map(|component| {
                let mut members: Vec<TypeNode> =
                    component.iter().map(|&i| structural[i].clone()).collect();
                members.sort_by(|a, b| (a.line, &a.name).cmp(&(b.line, &b.name)));
                members
            })
            .collect();

        cycles.sort_by(|a, b| {
            let key = |c: &Vec<TypeNode>| c.first().map(|n| (n.line, n.name.clone()));
            key(a).cmp(&key(b))
        });
        cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::model::{Declaration, FunctionBody, MemberAccess, AccessBase};

    fn type_with_field(tree: &mut DeclarationTree, name: &str, line: usize, field_type: &str) {
        let id = tree.add(
            Declaration::new(name, DeclarationKind::Class).with_span(line, line + 2),
            None,
        );
        tree.add(
            Declaration::new("link", DeclarationKind::Variable).with_type_refs([field_type]),
            Some(id),
        );
    }

    #[test]
    fn test_two_node_cycle() {
        let mut tree = DeclarationTree::new();
        type_with_field(&mut tree, "A", 1, "B");
        type_with_field(&mut tree, "B", 5, "A");

        let graph = DependencyGraph::build(&tree);
        let cycles = graph.structural_cycles();
        assert_eq!(cycles.len(), 1);
        let names: Vec<_> = cycles[0].iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_three_node_ring() {
        let mut tree = DeclarationTree::new();
        type_with_field(&mut tree, "A", 1, "B");
        type_with_field(&mut tree, "B", 5, "C");
        type_with_field(&mut tree, "C", 9, "A");

        let cycles = DependencyGraph::build(&tree).structural_cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 3);
    }

    #[test]
    fn test_acyclic_graph() {
        let mut tree = DeclarationTree::new();
        type_with_field(&mut tree, "A", 1, "B");
        type_with_field(&mut tree, "B", 5, "C");
        tree.add(Declaration::new("C", DeclarationKind::Struct).with_span(9, 10), None);

        let graph = DependencyGraph::build(&tree);
        assert!(graph.structural_cycles().is_empty());
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_self_loop() {
        let mut tree = DeclarationTree::new();
        type_with_field(&mut tree, "Node", 1, "Node");
        let cycles = DependencyGraph::build(&tree).structural_cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 1);
    }

    #[test]
    fn test_call_edges_are_not_structural() {
        let mut tree = DeclarationTree::new();
        let a = tree.add(Declaration::new("A", DeclarationKind::Class).with_span(1, 5), None);
        let body = FunctionBody {
            constructed_types: vec!["B".to_string()],
            member_accesses: vec![MemberAccess {
                base: AccessBase::Identifier("B".to_string()),
                segments: vec!["shared".to_string()],
                line: 3,
            }],
            ..Default::default()
        };
        tree.add(
            Declaration::new("run", DeclarationKind::Function).with_body(body),
            Some(a),
        );
        type_with_field(&mut tree, "B", 7, "A");

        let graph = DependencyGraph::build(&tree);
        assert!(graph.has_edge("A", "B", EdgeKind::Call));
        assert!(graph.has_edge("A", "B", EdgeKind::MemberAccess));
        assert!(graph.structural_cycles().is_empty());
    }

    #[test]
    fn test_external_types_are_ignored() {
        let mut tree = DeclarationTree::new();
        type_with_field(&mut tree, "A", 1, "String");
        let graph = DependencyGraph::build(&tree);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
    }
}
