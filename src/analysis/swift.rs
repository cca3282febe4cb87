//! Swift language analyzer using tree-sitter.
//!
//! Walks the concrete syntax tree once and builds a [`DeclarationTree`]:
//! types and extensions with their members, free functions and variables,
//! and for every function body the facts the detectors need (statement
//! counts, normalized statements, member-access chains, control flow).

use anyhow::Context;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

use super::model::{
    starts_uppercase, AccessBase, AccessLevel, ControlFlowInfo, DeclId, Declaration,
    DeclarationKind, DeclarationTree, FunctionBody, MemberAccess, Modifiers, Span, Statement,
};
use super::LanguageAnalyzer;
use crate::error::ParseError;

const CONTROL_FLOW_QUERY: &str = r#"
(if_statement) @if
(guard_statement) @guard
(for_statement) @for
(while_statement) @while
(repeat_while_statement) @repeat
(switch_entry) @case
(ternary_expression) @ternary
(conjunction_expression) @and
(disjunction_expression) @or
(catch_block) @catch
"#;

/// Bodies consisting of one of these are refusals, not implementations.
const FAILING_PREFIXES: &[&str] = &["fatalError(", "preconditionFailure(", "throw "];

pub struct SwiftAnalyzer {
    language: Language,
}

impl SwiftAnalyzer {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_swift::LANGUAGE.into(),
        }
    }

    fn create_parser(&self) -> anyhow::Result<Parser> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;
        Ok(parser)
    }

    fn build(&self, tree: &tree_sitter::Tree, source: &str) -> anyhow::Result<DeclarationTree> {
        let control_flow = Query::new(&self.language, CONTROL_FLOW_QUERY)
            .context("invalid control flow query")?;
        let mut builder = TreeBuilder {
            source: source.as_bytes(),
            control_flow: &control_flow,
            tree: DeclarationTree::new(),
        };
        builder.tree.line_count = source.lines().count();
        builder.visit_scope(tree.root_node(), None);
        Ok(builder.tree)
    }
}

impl Default for SwiftAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for SwiftAnalyzer {
    fn language_id(&self) -> &'static str {
        "swift"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["swift"]
    }

    fn parse(&self, source: &str, path: &str) -> Result<DeclarationTree, ParseError> {
        let mut parser = self
            .create_parser()
            .map_err(|e| ParseError::new(path, 0, e.to_string()))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ParseError::new(path, 0, "parser produced no tree"))?;

        let root = tree.root_node();
        if root.has_error() {
            let (line, reason) = match first_error(root) {
                Some(node) => (node.start_position().row + 1, describe_error(node, source)),
                None => (1, "syntax error".to_string()),
            };
            return Err(ParseError::new(path, line, reason));
        }

        self.build(&tree, source)
            .map_err(|e| ParseError::new(path, 0, format!("{:#}", e)))
    }
}

fn children_of(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

fn named_children_of(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn is_comment(node: Node<'_>) -> bool {
    matches!(node.kind(), "comment" | "multiline_comment")
}

fn span_of(node: Node<'_>) -> Span {
    Span::new(node.start_position().row + 1, node.end_position().row + 1)
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    children_of(node).into_iter().find_map(first_error)
}

fn describe_error(node: Node<'_>, source: &str) -> String {
    if node.is_missing() {
        return format!("missing `{}`", node.kind());
    }
    let text = node.utf8_text(source.as_bytes()).unwrap_or("").trim();
    let snippet: String = text.chars().take(40).collect();
    if snippet.is_empty() {
        "syntax error".to_string()
    } else {
        format!("syntax error near `{}`", snippet)
    }
}

/// Depth-first search for the first descendant (or self) of a kind.
fn find_descendant<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    if node.kind() == kind {
        return Some(node);
    }
    children_of(node)
        .into_iter()
        .find_map(|c| find_descendant(c, kind))
}

struct TreeBuilder<'a> {
    source: &'a [u8],
    control_flow: &'a Query,
    tree: DeclarationTree,
}

impl<'a> TreeBuilder<'a> {
    fn text(&self, node: Node<'_>) -> &'a str {
        node.utf8_text(self.source).unwrap_or("")
    }

    /// Add every declaration directly inside `node` under `parent`.
    fn visit_scope(&mut self, node: Node<'_>, parent: Option<DeclId>) {
        for child in named_children_of(node) {
            self.visit_declaration(child, parent);
        }
    }

    fn visit_declaration(&mut self, node: Node<'_>, parent: Option<DeclId>) {
        match node.kind() {
            "import_declaration" => {
                if let Some(module) = children_of(node).into_iter().find(|c| c.kind() == "identifier")
                {
                    let name = self.text(module).to_string();
                    if !self.tree.imports.contains(&name) {
                        self.tree.imports.push(name);
                    }
                }
            }
            "class_declaration" | "protocol_declaration" => self.add_type(node, parent),
            "function_declaration" | "init_declaration" | "deinit_declaration"
            | "protocol_function_declaration" => self.add_function(node, parent),
            "property_declaration" | "protocol_property_declaration" => {
                self.add_properties(node, parent)
            }
            "typealias_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    let decl = Declaration::new(self.text(name), DeclarationKind::TypeAlias)
                        .with_span(node.start_position().row + 1, node.end_position().row + 1)
                        .with_modifiers(self.modifiers(node));
                    self.tree.add(decl, parent);
                }
            }
            _ => {}
        }
    }

    fn type_kind(&self, node: Node<'_>) -> DeclarationKind {
        if node.kind() == "protocol_declaration" {
            return DeclarationKind::Protocol;
        }
        for child in children_of(node) {
            match child.kind() {
                "class" => return DeclarationKind::Class,
                "struct" => return DeclarationKind::Struct,
                "enum" => return DeclarationKind::Enum,
                "extension" => return DeclarationKind::Extension,
                "actor" => return DeclarationKind::Actor,
                _ => {}
            }
        }
        DeclarationKind::Class
    }

    /// Name of a (possibly qualified or generic) type reference.
    fn type_name(&self, node: Node<'_>) -> String {
        let user_type = find_descendant(node, "user_type").unwrap_or(node);
        let last = children_of(user_type)
            .into_iter()
            .filter(|c| c.kind() == "type_identifier")
            .last();
        match last {
            Some(ident) => self.text(ident).to_string(),
            None => {
                let text = self.text(node);
                text.split('<').next().unwrap_or(text).trim().to_string()
            }
        }
    }

    fn add_type(&mut self, node: Node<'_>, parent: Option<DeclId>) {
        let kind = self.type_kind(node);
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = if kind == DeclarationKind::Extension {
            self.type_name(name_node)
        } else {
            self.text(name_node).to_string()
        };

        let supertypes: Vec<String> = children_of(node)
            .into_iter()
            .filter(|c| c.kind() == "inheritance_specifier")
            .map(|c| self.type_name(c))
            .filter(|s| !s.is_empty())
            .collect();

        let decl = Declaration::new(name, kind)
            .with_span(node.start_position().row + 1, node.end_position().row + 1)
            .with_modifiers(self.modifiers(node))
            .with_supertypes(supertypes);
        let id = self.tree.add(decl, parent);

        let body = node.child_by_field_name("body").or_else(|| {
            children_of(node).into_iter().find(|c| {
                matches!(c.kind(), "class_body" | "enum_class_body" | "protocol_body")
            })
        });
        if let Some(body) = body {
            self.visit_scope(body, Some(id));
        }
    }

    fn modifiers(&self, node: Node<'_>) -> Modifiers {
        let mut modifiers = Modifiers::default();
        for group in children_of(node).into_iter().filter(|c| c.kind() == "modifiers") {
            for modifier in children_of(group) {
                let text: String = self
                    .text(modifier)
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect();
                if let Some(level) = text.strip_suffix("(set)") {
                    modifiers.setter_access = AccessLevel::parse(level);
                } else if let Some(level) = AccessLevel::parse(&text) {
                    modifiers.access = level;
                } else {
                    match text.as_str() {
                        "override" => modifiers.is_override = true,
                        "static" | "class" => modifiers.is_static = true,
                        _ => {}
                    }
                }
            }
        }
        modifiers
    }

    /// Type names used in a declaration outside its body.
    fn signature_types(&self, node: Node<'_>) -> Vec<String> {
        let mut names = Vec::new();
        for child in children_of(node) {
            if matches!(child.kind(), "function_body" | "modifiers" | "attribute") {
                continue;
            }
            self.collect_type_identifiers(child, &mut names);
        }
        names
    }

    fn collect_type_identifiers(&self, node: Node<'_>, out: &mut Vec<String>) {
        if node.kind() == "type_identifier" {
            let name = self.text(node).to_string();
            if !out.contains(&name) {
                out.push(name);
            }
            return;
        }
        for child in children_of(node) {
            self.collect_type_identifiers(child, out);
        }
    }

    fn add_function(&mut self, node: Node<'_>, parent: Option<DeclId>) {
        let name = match node.kind() {
            "init_declaration" => "init".to_string(),
            "deinit_declaration" => "deinit".to_string(),
            _ => match node.child_by_field_name("name") {
                Some(n) => self.text(n).to_string(),
                None => return,
            },
        };

        let body_node = node
            .child_by_field_name("body")
            .or_else(|| children_of(node).into_iter().find(|c| c.kind() == "function_body"));

        let mut decl = Declaration::new(name, DeclarationKind::Function)
            .with_span(node.start_position().row + 1, node.end_position().row + 1)
            .with_modifiers(self.modifiers(node))
            .with_type_refs(self.signature_types(node));
        if let Some(body) = body_node {
            decl = decl.with_body(self.function_body(body));
        }
        let id = self.tree.add(decl, parent);

        if let Some(body) = body_node {
            self.add_local_declarations(body, id);
        }
    }

    /// Functions and types declared inside a function body.
    fn add_local_declarations(&mut self, node: Node<'_>, owner: DeclId) {
        for child in named_children_of(node) {
            match child.kind() {
                "function_declaration" | "class_declaration" | "protocol_declaration" => {
                    self.visit_declaration(child, Some(owner))
                }
                _ => self.add_local_declarations(child, owner),
            }
        }
    }

    fn add_properties(&mut self, node: Node<'_>, parent: Option<DeclId>) {
        let mut modifiers = self.modifiers(node);
        let binding = find_descendant(node, "value_binding_pattern")
            .map(|b| self.text(b))
            .unwrap_or("");
        modifiers.is_mutable = binding.starts_with("var");
        modifiers.is_computed = node.kind() == "protocol_property_declaration"
            || children_of(node)
                .iter()
                .any(|c| c.kind() == "computed_property");

        let mut type_refs = Vec::new();
        for annotation in children_of(node)
            .into_iter()
            .filter(|c| c.kind() == "type_annotation")
        {
            self.collect_type_identifiers(annotation, &mut type_refs);
        }
        if type_refs.is_empty() {
            // `let repo = UserRepository()` has the constructed type
            if let Some(value) = node.child_by_field_name("value") {
                if value.kind() == "call_expression" {
                    if let Some(callee) = value.child(0) {
                        let name = self.text(callee);
                        if callee.kind() == "simple_identifier" && starts_uppercase(name) {
                            type_refs.push(name.to_string());
                        }
                    }
                }
            }
        }

        let mut cursor = node.walk();
        let names: Vec<Node<'_>> = node.children_by_field_name("name", &mut cursor).collect();
        for name_node in names {
            let Some(ident) = find_descendant(name_node, "simple_identifier") else {
                continue;
            };
            let decl = Declaration::new(self.text(ident), DeclarationKind::Variable)
                .with_span(node.start_position().row + 1, node.end_position().row + 1)
                .with_modifiers(modifiers.clone())
                .with_type_refs(type_refs.clone());
            self.tree.add(decl, parent);
        }
    }

    fn top_statements<'t>(&self, body: Node<'t>) -> Vec<Node<'t>> {
        children_of(body)
            .into_iter()
            .find(|c| c.kind() == "statements")
            .map(|s| {
                named_children_of(s)
                    .into_iter()
                    .filter(|n| !is_comment(*n))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn function_body(&self, body: Node<'_>) -> FunctionBody {
        let top = self.top_statements(body);

        let statements: Vec<Statement> = top
            .iter()
            .map(|s| Statement {
                line: s.start_position().row + 1,
                normalized: self.normalize(*s),
            })
            .collect();

        let always_fails = match top.as_slice() {
            [only] => {
                let text = self.text(*only).trim();
                FAILING_PREFIXES.iter().any(|p| text.starts_with(p)) || text == "throw"
            }
            _ => false,
        };

        let mut collector = ExprCollector {
            builder: self,
            accesses: Vec::new(),
            identifiers: Vec::new(),
            constructed: Vec::new(),
        };
        for statement in &top {
            collector.visit(*statement);
        }
        let ExprCollector {
            accesses,
            identifiers,
            constructed,
            ..
        } = collector;

        FunctionBody {
            span: span_of(body),
            statement_count: count_statements(body),
            statements,
            member_accesses: accesses,
            identifiers,
            constructed_types: constructed,
            always_fails,
            control_flow: self.control_flow(body),
        }
    }

    /// Leaf tokens joined by spaces, literals replaced by placeholders.
    fn normalize(&self, node: Node<'_>) -> String {
        let mut tokens = Vec::new();
        self.push_tokens(node, &mut tokens);
        tokens.join(" ")
    }

    fn push_tokens(&self, node: Node<'_>, out: &mut Vec<String>) {
        match node.kind() {
            "comment" | "multiline_comment" => {}
            "line_string_literal" | "multi_line_string_literal" | "raw_string_literal" => {
                out.push("$STR".to_string())
            }
            "integer_literal" | "real_literal" | "hex_literal" | "oct_literal" | "bin_literal" => {
                out.push("$NUM".to_string())
            }
            _ if node.child_count() == 0 => {
                let text = self.text(node).trim();
                if !text.is_empty() {
                    out.push(text.to_string());
                }
            }
            _ => {
                for child in children_of(node) {
                    self.push_tokens(child, out);
                }
            }
        }
    }

    fn control_flow(&self, body: Node<'_>) -> ControlFlowInfo {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(self.control_flow, body, self.source);
        let mut info = ControlFlowInfo::default();

        while let Some(m) = matches.next() {
            for capture in m.captures {
                let name = self.control_flow.capture_names()[capture.index as usize];
                match name {
                    "if" | "guard" => info.if_count += 1,
                    "for" | "while" | "repeat" => info.loop_count += 1,
                    "case" => info.case_count += 1,
                    "ternary" => info.ternary_count += 1,
                    "and" => info.and_count += 1,
                    "or" => info.or_count += 1,
                    "catch" => info.catch_count += 1,
                    _ => {}
                }
            }
        }

        info
    }
}

/// Statements at every depth, not counting nested declarations' bodies twice.
fn count_statements(node: Node<'_>) -> usize {
    let mut count = 0;
    for child in named_children_of(node) {
        if child.kind() == "statements" {
            count += named_children_of(child)
                .into_iter()
                .filter(|s| !is_comment(*s))
                .count();
        }
        count += count_statements(child);
    }
    count
}

/// Collects member-access chains, bare identifiers and constructor calls.
struct ExprCollector<'b, 'a> {
    builder: &'b TreeBuilder<'a>,
    accesses: Vec<MemberAccess>,
    identifiers: Vec<String>,
    constructed: Vec<String>,
}

impl<'b, 'a> ExprCollector<'b, 'a> {
    fn visit(&mut self, node: Node<'_>) {
        match node.kind() {
            "navigation_expression" => self.chain(node),
            "call_expression" => {
                let kids = children_of(node);
                let Some(callee) = kids.first().copied() else {
                    return;
                };
                match callee.kind() {
                    "navigation_expression" => {
                        self.chain(node);
                        return;
                    }
                    "simple_identifier" => {
                        let name = self.builder.text(callee);
                        if starts_uppercase(name) && !self.constructed.iter().any(|c| c == name) {
                            self.constructed.push(name.to_string());
                        }
                    }
                    _ => self.visit(callee),
                }
                for arg in kids.into_iter().skip(1) {
                    self.visit(arg);
                }
            }
            "simple_identifier" => {
                self.identifiers.push(self.builder.text(node).to_string());
            }
            // bindings, labels, types and nested declarations are not data accesses
            "pattern" | "value_argument_label" | "type_annotation" | "user_type"
            | "comment" | "multiline_comment" | "function_declaration" | "class_declaration"
            | "protocol_declaration" => {}
            _ => {
                for child in named_children_of(node) {
                    self.visit(child);
                }
            }
        }
    }

    /// Record the chain rooted at `top` and visit the arguments along it.
    fn chain(&mut self, top: Node<'_>) {
        let mut segments = Vec::new();
        let mut node = top;
        let base = loop {
            match node.kind() {
                "navigation_expression" => {
                    if let Some(suffix) = node.child_by_field_name("suffix") {
                        let member = suffix
                            .child_by_field_name("suffix")
                            .or_else(|| named_children_of(suffix).into_iter().last());
                        if let Some(member) = member {
                            segments.push(self.builder.text(member).to_string());
                        }
                    }
                    match node.child_by_field_name("target") {
                        Some(target) => node = target,
                        None => break AccessBase::Expression,
                    }
                }
                "call_expression" => {
                    let kids = children_of(node);
                    for arg in kids.iter().skip(1) {
                        self.visit(*arg);
                    }
                    match kids.first() {
                        Some(callee) => node = *callee,
                        None => break AccessBase::Expression,
                    }
                }
                "postfix_expression" => match node.named_child(0) {
                    Some(inner) => node = inner,
                    None => break AccessBase::Expression,
                },
                "self_expression" => break AccessBase::SelfRef,
                "simple_identifier" => {
                    break AccessBase::Identifier(self.builder.text(node).to_string())
                }
                _ => {
                    self.visit(node);
                    break AccessBase::Expression;
                }
            }
        };

        if segments.is_empty() {
            return;
        }
        segments.reverse();
        self.accesses.push(MemberAccess {
            base,
            segments,
            line: top.start_position().row + 1,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> DeclarationTree {
        SwiftAnalyzer::new().parse(source, "Test.swift").unwrap()
    }

    fn find<'t>(tree: &'t DeclarationTree, name: &str) -> &'t Declaration {
        tree.iter()
            .map(|(_, d)| d)
            .find(|d| d.name == name)
            .unwrap_or_else(|| panic!("{} not found", name))
    }

    #[test]
    fn test_extract_imports() {
        let tree = parse("import Foundation\nimport UIKit\n\nclass Test {}\n");
        assert_eq!(tree.imports, vec!["Foundation", "UIKit"]);
    }

    #[test]
    fn test_extract_declarations() {
        let source = r#"
class Cart: NSObject, Codable {
    private var items: [Item] = []
    let owner: User

    func add(_ item: Item) {
        items.append(item)
    }
}

struct Item {}

extension Cart {
    var isEmpty: Bool { return items.isEmpty }
}

protocol Store {
    func save()
}

func topLevelFunc() {}
let limit = 10
typealias Handler = () -> Void
"#;
        let tree = parse(source);

        let cart = find(&tree, "Cart");
        assert_eq!(cart.kind, DeclarationKind::Class);
        assert_eq!(cart.supertypes, vec!["NSObject", "Codable"]);
        assert_eq!(cart.span.start_line, 2);

        let items = find(&tree, "items");
        assert_eq!(items.modifiers.access, AccessLevel::Private);
        assert!(items.modifiers.is_mutable);
        assert_eq!(items.type_refs, vec!["Item"]);
        assert!(!find(&tree, "owner").modifiers.is_mutable);

        assert_eq!(find(&tree, "Item").kind, DeclarationKind::Struct);
        assert!(find(&tree, "isEmpty").modifiers.is_computed);
        assert_eq!(find(&tree, "Store").kind, DeclarationKind::Protocol);
        assert_eq!(find(&tree, "topLevelFunc").kind, DeclarationKind::Function);
        assert_eq!(find(&tree, "limit").kind, DeclarationKind::Variable);
        assert_eq!(find(&tree, "Handler").kind, DeclarationKind::TypeAlias);

        let members = tree.members_of_type("Cart");
        assert_eq!(members.methods.len(), 1);
        assert_eq!(members.stored_properties.len(), 2);
        assert_eq!(members.computed_properties.len(), 1);
        assert!(tree.type_parts("Cart").len() == 2);
    }

    #[test]
    fn test_modifiers() {
        let source = r#"
public class Account {
    public private(set) var balance: Int = 0
    static var shared = Account()

    override func copy() -> Any {
        return self
    }
}
"#;
        let tree = parse(source);
        let balance = find(&tree, "balance");
        assert_eq!(balance.modifiers.access, AccessLevel::Public);
        assert_eq!(balance.modifiers.setter_access, Some(AccessLevel::Private));
        assert!(find(&tree, "shared").modifiers.is_static);
        assert_eq!(find(&tree, "shared").type_refs, vec!["Account"]);
        assert!(find(&tree, "copy").modifiers.is_override);
    }

    #[test]
    fn test_function_body_facts() {
        let source = r#"
class Shipping {
    var rate: Double = 1.0

    func cost(order: Order) -> Double {
        let city = order.customer.address.city
        if city.isEmpty && rate > 0 {
            return 0
        }
        for item in order.items {
            print(item)
        }
        return self.rate * 2
    }
}
"#;
        let tree = parse(source);
        let body = find(&tree, "cost").body.clone().unwrap();

        assert_eq!(body.statements.len(), 4);
        assert!(body.statement_count >= 6);
        assert_eq!(body.control_flow.if_count, 1);
        assert_eq!(body.control_flow.loop_count, 1);
        assert_eq!(body.control_flow.and_count, 1);
        assert_eq!(body.control_flow.cyclomatic_complexity(), 4);

        let longest = body
            .member_accesses
            .iter()
            .max_by_key(|a| a.chain_length())
            .unwrap();
        assert_eq!(longest.base, AccessBase::Identifier("order".to_string()));
        assert_eq!(longest.segments, vec!["customer", "address", "city"]);
        assert_eq!(longest.line, 6);

        assert!(body
            .member_accesses
            .iter()
            .any(|a| a.base == AccessBase::SelfRef && a.segments == vec!["rate"]));
        assert!(body.identifiers.iter().any(|i| i == "rate"));
        assert!(!body.always_fails);
    }

    #[test]
    fn test_always_failing_bodies() {
        let source = r#"
class Base {
    func run() {}
}

class Broken: Base {
    override func run() {
        fatalError("not supported")
    }
}
"#;
        let tree = parse(source);
        let broken_run = tree
            .iter()
            .filter(|(_, d)| d.name == "run")
            .map(|(_, d)| d)
            .last()
            .unwrap();
        assert!(broken_run.modifiers.is_override);
        assert!(broken_run.body.as_ref().unwrap().always_fails);
    }

    #[test]
    fn test_literals_are_normalized() {
        let source = r#"
func a() {
    let x = 42
    print("hello")
}

func b() {
    let x = 7
    print("world")
}
"#;
        let tree = parse(source);
        let a = find(&tree, "a").body.clone().unwrap();
        let b = find(&tree, "b").body.clone().unwrap();
        assert_eq!(a.statements.len(), 2);
        assert_eq!(
            a.statements.iter().map(|s| &s.normalized).collect::<Vec<_>>(),
            b.statements.iter().map(|s| &s.normalized).collect::<Vec<_>>()
        );
        assert!(a.statements[0].normalized.contains("$NUM"));
    }

    #[test]
    fn test_constructor_calls() {
        let source = r#"
class Factory {
    func make() -> Widget {
        let parser = Parser()
        return Widget(parser: parser)
    }
}
"#;
        let tree = parse(source);
        let body = find(&tree, "make").body.clone().unwrap();
        assert_eq!(body.constructed_types, vec!["Parser", "Widget"]);
    }

    #[test]
    fn test_local_functions_are_nested() {
        let source = r#"
func outer() {
    func inner() {}
    inner()
}
"#;
        let tree = parse(source);
        let (inner_id, _) = tree.iter().find(|(_, d)| d.name == "inner").unwrap();
        assert!(tree.is_nested(inner_id));
        assert_eq!(tree.top_level().count(), 1);
    }

    #[test]
    fn test_syntax_error_is_reported_with_line() {
        let err = SwiftAnalyzer::new()
            .parse("class Good {}\n\nclass Broken {\n  func (\n", "Bad.swift")
            .unwrap_err();
        assert_eq!(err.path, "Bad.swift");
        assert!(err.line >= 1);
        assert!(!err.reason.is_empty());
    }
}
