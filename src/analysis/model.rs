//! Declaration tree extracted from a single source module.
//!
//! The tree is an arena: every [`Declaration`] lives in one `Vec` owned by the
//! [`DeclarationTree`] and refers to its parent by [`DeclId`] only. Children
//! are owned by position in the arena, so walking up to the enclosing scope
//! never creates a reference cycle.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Source line range (1-indexed, inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start_line: usize,
    pub end_line: usize,
}

impl Span {
    pub fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line: end_line.max(start_line),
        }
    }

    /// Number of lines covered by the span.
    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start_line == self.end_line {
            write!(f, "{}", self.start_line)
        } else {
            write!(f, "{}-{}", self.start_line, self.end_line)
        }
    }
}

/// Handle to a declaration inside a [`DeclarationTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeclId(pub usize);

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    /// Reference type (`class`).
    Class,
    /// Value type (`struct`).
    Struct,
    /// Sum type (`enum`).
    Enum,
    /// Interface type (`protocol`).
    Protocol,
    /// Concurrency-isolated type (`actor`).
    Actor,
    /// Extension of an existing type.
    Extension,
    Function,
    Variable,
    TypeAlias,
}

impl DeclarationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Class => "class",
            DeclarationKind::Struct => "struct",
            DeclarationKind::Enum => "enum",
            DeclarationKind::Protocol => "protocol",
            DeclarationKind::Actor => "actor",
            DeclarationKind::Extension => "extension",
            DeclarationKind::Function => "function",
            DeclarationKind::Variable => "variable",
            DeclarationKind::TypeAlias => "typealias",
        }
    }

    /// Types and extensions: anything that opens a member scope.
    pub fn is_type(&self) -> bool {
        match self {
            DeclarationKind::Class
            | DeclarationKind::Struct
            | DeclarationKind::Enum
            | DeclarationKind::Protocol
            | DeclarationKind::Actor
            | DeclarationKind::Extension => true,
            DeclarationKind::Function | DeclarationKind::Variable | DeclarationKind::TypeAlias => {
                false
            }
        }
    }

    /// Concrete types that can carry state and behavior (class, struct, actor).
    pub fn is_concrete_type(&self) -> bool {
        matches!(
            self,
            DeclarationKind::Class | DeclarationKind::Struct | DeclarationKind::Actor
        )
    }

    pub fn has_members(&self) -> bool {
        self.is_type()
    }

    /// Kinds that may declare an inheritance or conformance list.
    pub fn has_supertypes(&self) -> bool {
        match self {
            DeclarationKind::Class
            | DeclarationKind::Struct
            | DeclarationKind::Enum
            | DeclarationKind::Protocol
            | DeclarationKind::Actor
            | DeclarationKind::Extension => true,
            DeclarationKind::Function | DeclarationKind::Variable | DeclarationKind::TypeAlias => {
                false
            }
        }
    }

    pub fn is_isolated(&self) -> bool {
        matches!(self, DeclarationKind::Actor)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, DeclarationKind::Function)
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Access level, ordered from most to least restrictive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Private,
    FilePrivate,
    #[default]
    Internal,
    Public,
    Open,
}

impl AccessLevel {
    /// Parse a Swift access keyword (`private`, `fileprivate`, ...).
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "private" => Some(AccessLevel::Private),
            "fileprivate" => Some(AccessLevel::FilePrivate),
            "internal" => Some(AccessLevel::Internal),
            "public" => Some(AccessLevel::Public),
            "open" => Some(AccessLevel::Open),
            _ => None,
        }
    }

    pub fn is_private(&self) -> bool {
        matches!(self, AccessLevel::Private | AccessLevel::FilePrivate)
    }
}

/// Access and storage modifiers of a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub access: AccessLevel,
    /// Restricted setter access, e.g. `private(set)`.
    pub setter_access: Option<AccessLevel>,
    pub is_static: bool,
    pub is_override: bool,
    /// `var` rather than `let` (variables only).
    pub is_mutable: bool,
    /// Computed property with a getter body (variables only).
    pub is_computed: bool,
}

impl Modifiers {
    /// Access level that governs writes from outside the declaring scope.
    pub fn effective_setter_access(&self) -> AccessLevel {
        self.setter_access.unwrap_or(self.access).min(self.access)
    }
}

/// Receiver at the start of a member-access chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessBase {
    /// Explicit `self`.
    SelfRef,
    /// A plain identifier (`user.address.city` -> `user`).
    Identifier(String),
    /// Any other expression (literal, closure, call result...).
    Expression,
}

impl AccessBase {
    /// Receivers spelled with a leading capital refer to types (static access).
    pub fn type_name(&self) -> Option<&str> {
        match self {
            AccessBase::Identifier(name) if starts_uppercase(name) => Some(name),
            _ => None,
        }
    }
}

/// A maximal chain of member accesses such as `order.customer.address.city`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberAccess {
    pub base: AccessBase,
    /// Member names after the base, in source order.
    pub segments: Vec<String>,
    pub line: usize,
}

impl MemberAccess {
    /// Chain length excluding a leading `self`.
    pub fn chain_length(&self) -> usize {
        self.segments.len()
    }

    /// First member accessed, e.g. `customer` in `order.customer.address`.
    pub fn first_member(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }
}

/// A statement normalized for structural comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub line: usize,
    /// Token text with whitespace collapsed and literals replaced by placeholders.
    pub normalized: String,
}

/// Control flow information for cyclomatic complexity calculation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFlowInfo {
    pub if_count: usize,
    pub loop_count: usize,
    pub case_count: usize,
    pub and_count: usize,
    pub or_count: usize,
    pub ternary_count: usize,
    pub catch_count: usize,
}

impl ControlFlowInfo {
    /// CC = 1 + decision points.
    pub fn cyclomatic_complexity(&self) -> usize {
        1 + self.if_count
            + self.loop_count
            + self.case_count
            + self.and_count
            + self.or_count
            + self.ternary_count
            + self.catch_count
    }
}

/// Facts about a function body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionBody {
    pub span: Span,
    /// Statements at any nesting depth.
    pub statement_count: usize,
    /// Top-level statements in source order.
    pub statements: Vec<Statement>,
    /// Outermost member-access chains.
    pub member_accesses: Vec<MemberAccess>,
    /// Bare identifiers read or written without a receiver.
    pub identifiers: Vec<String>,
    /// Capitalized callees, i.e. constructor-style calls such as `Parser(...)`.
    pub constructed_types: Vec<String>,
    /// Body consists only of `throw`, `fatalError` or `preconditionFailure`.
    pub always_fails: bool,
    pub control_flow: ControlFlowInfo,
}

/// One node of the declaration tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
    pub modifiers: Modifiers,
    pub span: Span,
    /// Inheritance and conformance list.
    pub supertypes: Vec<String>,
    /// Type names mentioned in the annotation (variables) or signature (functions).
    pub type_refs: Vec<String>,
    pub body: Option<FunctionBody>,
    parent: Option<DeclId>,
    children: Vec<DeclId>,
}

impl Declaration {
    pub fn new(name: impl Into<String>, kind: DeclarationKind) -> Self {
        Self {
            name: name.into(),
            kind,
            modifiers: Modifiers::default(),
            span: Span::default(),
            supertypes: Vec::new(),
            type_refs: Vec::new(),
            body: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_span(mut self, start_line: usize, end_line: usize) -> Self {
        self.span = Span::new(start_line, end_line);
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_supertypes<I, S>(mut self, supertypes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supertypes = supertypes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_type_refs<I, S>(mut self, type_refs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_refs = type_refs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_body(mut self, body: FunctionBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn parent_id(&self) -> Option<DeclId> {
        self.parent
    }

    pub fn child_ids(&self) -> &[DeclId] {
        &self.children
    }

    /// `init` and `deinit` are functions but not behavior methods.
    pub fn is_initializer(&self) -> bool {
        self.kind == DeclarationKind::Function && (self.name == "init" || self.name == "deinit")
    }

    /// Stored (non-computed) variable.
    pub fn is_stored_property(&self) -> bool {
        self.kind == DeclarationKind::Variable && !self.modifiers.is_computed
    }

    /// Function that is not an initializer.
    pub fn is_behavior_method(&self) -> bool {
        self.kind == DeclarationKind::Function && !self.is_initializer()
    }
}

/// Members of a type gathered across its declaration and same-file extensions.
#[derive(Debug, Clone, Default)]
pub struct TypeMembers<'a> {
    pub methods: Vec<&'a Declaration>,
    pub stored_properties: Vec<&'a Declaration>,
    pub computed_properties: Vec<&'a Declaration>,
    pub nested_types: Vec<&'a Declaration>,
    pub initializers: Vec<&'a Declaration>,
}

impl<'a> TypeMembers<'a> {
    /// Methods plus stored and computed properties.
    pub fn member_count(&self) -> usize {
        self.methods.len() + self.stored_properties.len() + self.computed_properties.len()
    }

    /// Names of stored and computed properties, static ones included.
    pub fn property_names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.stored_properties
            .iter()
            .chain(self.computed_properties.iter())
            .map(|d| d.name.as_str())
    }
}

/// Declarations of one module, stored in an arena.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationTree {
    nodes: Vec<Declaration>,
    roots: Vec<DeclId>,
    /// Total lines in the source file.
    pub line_count: usize,
    /// Imported module names.
    pub imports: Vec<String>,
}

impl DeclarationTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration under `parent` (or at module level) and return its id.
    ///
    /// A parent id that is not part of this tree leaves the declaration
    /// reachable from the root list with a dangling parent handle, which
    /// [`DeclarationTree::validate`] reports.
    pub fn add(&mut self, mut decl: Declaration, parent: Option<DeclId>) -> DeclId {
        let id = DeclId(self.nodes.len());
        decl.parent = parent;
        decl.children.clear();
        self.nodes.push(decl);
        match parent.and_then(|p| self.nodes.get_mut(p.0).filter(|_| p != id)) {
            Some(owner) => owner.children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// First declaration whose parent handle does not resolve.
    pub fn validate(&self) -> Result<(), DeclId> {
        for (index, decl) in self.nodes.iter().enumerate() {
            if let Some(parent) = decl.parent {
                if parent.0 >= index {
                    return Err(DeclId(index));
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: DeclId) -> Option<&Declaration> {
        self.nodes.get(id.0)
    }

    pub fn parent(&self, id: DeclId) -> Option<&Declaration> {
        self.get(id)
            .and_then(|d| d.parent)
            .and_then(|p| self.get(p))
    }

    pub fn children(&self, id: DeclId) -> impl Iterator<Item = (DeclId, &Declaration)> + '_ {
        self.get(id)
            .map(|d| d.children.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(move |&c| self.get(c).map(|d| (c, d)))
    }

    /// Module-level declarations in source order.
    pub fn top_level(&self) -> impl Iterator<Item = (DeclId, &Declaration)> + '_ {
        self.roots
            .iter()
            .filter_map(move |&id| self.get(id).map(|d| (id, d)))
    }

    /// Depth-first, pre-order walk over every declaration.
    pub fn iter(&self) -> DepthFirst<'_> {
        DepthFirst {
            tree: self,
            stack: self.roots.iter().rev().copied().collect(),
        }
    }

    /// Whether a declaration sits inside a type or function scope.
    ///
    /// Walks parent handles until a type or function ancestor is found (nested)
    /// or the module root is reached (not nested).
    pub fn is_nested(&self, id: DeclId) -> bool {
        let mut current = self.get(id).and_then(|d| d.parent);
        while let Some(pid) = current {
            let Some(parent) = self.get(pid) else {
                return false;
            };
            if parent.kind.is_type() || parent.kind.is_callable() {
                return true;
            }
            current = parent.parent;
        }
        false
    }

    /// Nearest enclosing type or extension.
    pub fn enclosing_type(&self, id: DeclId) -> Option<(DeclId, &Declaration)> {
        let mut current = self.get(id).and_then(|d| d.parent);
        while let Some(pid) = current {
            let parent = self.get(pid)?;
            if parent.kind.is_type() {
                return Some((pid, parent));
            }
            current = parent.parent;
        }
        None
    }

    /// Declared types (excluding extensions) in depth-first order.
    pub fn types(&self) -> impl Iterator<Item = (DeclId, &Declaration)> + '_ {
        self.iter()
            .filter(|(_, d)| d.kind.is_type() && d.kind != DeclarationKind::Extension)
    }

    /// Functions and methods in depth-first order.
    pub fn functions(&self) -> impl Iterator<Item = (DeclId, &Declaration)> + '_ {
        self.iter().filter(|(_, d)| d.kind.is_callable())
    }

    /// Whether the module declares a type (not an extension) with this name.
    pub fn declares_type(&self, name: &str) -> bool {
        self.types().any(|(_, d)| d.name == name)
    }

    /// Ids of every declaration or extension that contributes members to `name`.
    pub fn type_parts(&self, name: &str) -> Vec<DeclId> {
        self.iter()
            .filter(|(_, d)| d.kind.is_type() && d.name == name)
            .map(|(id, _)| id)
            .collect()
    }

    /// Members of a type merged with its same-file extensions.
    pub fn members_of_type(&self, name: &str) -> TypeMembers<'_> {
        let mut members = TypeMembers::default();
        for part in self.type_parts(name) {
            for (_, child) in self.children(part) {
                match child.kind {
                    DeclarationKind::Function if child.is_initializer() => {
                        members.initializers.push(child)
                    }
                    DeclarationKind::Function => members.methods.push(child),
                    DeclarationKind::Variable if child.modifiers.is_computed => {
                        members.computed_properties.push(child)
                    }
                    DeclarationKind::Variable => members.stored_properties.push(child),
                    DeclarationKind::Class
                    | DeclarationKind::Struct
                    | DeclarationKind::Enum
                    | DeclarationKind::Protocol
                    | DeclarationKind::Actor
                    | DeclarationKind::Extension
                    | DeclarationKind::TypeAlias => members.nested_types.push(child),
                }
            }
        }
        members
    }

    /// Line span covering a type and all of its same-file extensions.
    pub fn type_extent(&self, name: &str) -> usize {
        self.type_parts(name)
            .iter()
            .filter_map(|&id| self.get(id))
            .map(|d| d.span.line_count())
            .sum()
    }
}

/// Depth-first iterator returned by [`DeclarationTree::iter`].
pub struct DepthFirst<'a> {
    tree: &'a DeclarationTree,
    stack: Vec<DeclId>,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = (DeclId, &'a Declaration);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            if let Some(decl) = self.tree.get(id) {
                self.stack.extend(decl.children.iter().rev().copied());
                return Some((id, decl));
            }
        }
        None
    }
}

/// One parsed unit: the file path plus its declaration tree.
#[derive(Debug, Clone)]
pub struct SourceModule {
    pub path: String,
    pub tree: DeclarationTree,
}

pub(crate) fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}
