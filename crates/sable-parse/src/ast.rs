//! Arena-allocated syntax tree.
//!
//! Nodes refer to each other by [`NodeId`]. A node's `parent` is a plain
//! index used for upward diagnostic aggregation and containment search; the
//! arena owns every node. Incremental reparsing never removes slots, it
//! marks replaced subtrees as retired instead, so ids handed out earlier stay
//! valid.

use std::fmt::Write as _;
use std::ops::{Index, Range};

use sable_errors::ParseError;
use sable_span::TextEdit;
use sable_tokenizer::{Splice, Token};
use text_size::TextRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Grammar rule that produced a node; re-invoked to rebuild it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Rule {
    Name,
    Literal,
    Path,
    Expression,
    ExpressionStatement,
    Parameter,
    FunctionDeclaration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Identifier { name: String },
    NumericLiteral { text: String },
    StringLiteral { value: String, terminated: bool },
    MemberAccess { object: NodeId, property: NodeId },
    Binary { lhs: NodeId, op: &'static str, rhs: NodeId },
    Parameter { name: Option<NodeId>, ty: Option<NodeId> },
    FunctionDeclaration { name: Option<NodeId>, params: Vec<NodeId>, return_type: Option<NodeId> },
    ExpressionStatement { expr: NodeId },
}

impl Node {
    /// Direct children in source order.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Self::Identifier { .. } | Self::NumericLiteral { .. } | Self::StringLiteral { .. } => {
                Vec::new()
            }
            Self::MemberAccess { object, property } => vec![*object, *property],
            Self::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            Self::Parameter { name, ty } => name.iter().chain(ty).copied().collect(),
            Self::FunctionDeclaration { name, params, return_type } => {
                name.iter().chain(params).chain(return_type).copied().collect()
            }
            Self::ExpressionStatement { expr } => vec![*expr],
        }
    }

    fn label(&self) -> String {
        match self {
            Self::Identifier { name } => format!("Identifier {name:?}"),
            Self::NumericLiteral { text } => format!("NumericLiteral {text}"),
            Self::StringLiteral { value, terminated: true } => format!("StringLiteral {value:?}"),
            Self::StringLiteral { value, terminated: false } => {
                format!("StringLiteral {value:?} (unterminated)")
            }
            Self::MemberAccess { .. } => "MemberAccess".to_owned(),
            Self::Binary { op, .. } => format!("Binary {op}"),
            Self::Parameter { .. } => "Parameter".to_owned(),
            Self::FunctionDeclaration { .. } => "FunctionDeclaration".to_owned(),
            Self::ExpressionStatement { .. } => "ExpressionStatement".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    kind: Node,
    range: TextRange,
    parent: Option<NodeId>,
    diagnostics: Vec<ParseError>,
    pub(crate) tokens: Range<usize>,
    pub(crate) rule: Rule,
    retired: bool,
}

impl NodeData {
    pub(crate) fn new(kind: Node, range: TextRange, tokens: Range<usize>, rule: Rule) -> Self {
        Self { kind, range, parent: None, diagnostics: Vec::new(), tokens, rule, retired: false }
    }

    pub fn kind(&self) -> &Node {
        &self.kind
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Diagnostics collected while this node's own rule was matched.
    pub fn diagnostics(&self) -> &[ParseError] {
        &self.diagnostics
    }

    pub fn children(&self) -> Vec<NodeId> {
        self.kind.children()
    }

    /// Index of the first token of the node and one past its last.
    pub fn token_range(&self) -> Range<usize> {
        self.tokens.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ast {
    nodes: Vec<NodeData>,
}

impl Ast {
    /// Every live node, in allocation order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| !node.retired)
            .map(|(index, _)| NodeId::new(index))
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.index()).filter(|node| !node.retired)
    }

    /// Name of an identifier, or of the identifier naming a declaration.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self[id].kind {
            Node::Identifier { name } => Some(name),
            Node::Parameter { name, .. } | Node::FunctionDeclaration { name, .. } => {
                self.name((*name)?)
            }
            _ => None,
        }
    }

    pub fn params(&self, id: NodeId) -> &[NodeId] {
        match &self[id].kind {
            Node::FunctionDeclaration { params, .. } => params,
            _ => &[],
        }
    }

    /// Pre-order walk of the subtree rooted at `id`.
    pub fn walk(&self, id: NodeId, f: &mut impl FnMut(NodeId, &NodeData)) {
        let node = &self[id];
        f(id, node);
        for child in node.children() {
            self.walk(child, f);
        }
    }

    pub(crate) fn raw_len(&self) -> usize {
        self.nodes.len()
    }

    /// Slots left behind by patches.
    pub(crate) fn retired_len(&self) -> usize {
        self.nodes.iter().filter(|node| node.retired).count()
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
    }

    pub(crate) fn alloc(&mut self, node: NodeData) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        for child in node.children() {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes.push(node);
        id
    }

    pub(crate) fn attach(&mut self, id: NodeId, diagnostics: Vec<ParseError>) {
        self.nodes[id.index()].diagnostics.extend(diagnostics);
    }

    pub(crate) fn retire(&mut self, id: NodeId) {
        self.nodes[id.index()].retired = true;
        for child in self.nodes[id.index()].children() {
            self.retire(child);
        }
    }

    /// Moves the content of `fresh` into `old`, keeping `old`'s id and
    /// parent. The previous subtree of `old` is retired.
    pub(crate) fn replace(&mut self, old: NodeId, fresh: NodeId) {
        for child in self[old].children() {
            self.retire(child);
        }

        let data = self.nodes[fresh.index()].clone();
        self.nodes[fresh.index()].retired = true;
        for child in data.children() {
            self.nodes[child.index()].parent = Some(old);
        }

        let slot = &mut self.nodes[old.index()];
        slot.kind = data.kind;
        slot.range = data.range;
        slot.diagnostics = data.diagnostics;
        slot.tokens = data.tokens;
        slot.rule = data.rule;
    }

    /// Brings token indices, ranges and diagnostics in line with a spliced
    /// token array.
    ///
    /// Nodes that only partially overlap the replaced tokens keep stale
    /// values, and nodes whose every token was removed keep their old text
    /// range; both lie inside whatever gets rebuilt.
    pub(crate) fn shift(&mut self, tokens: &[Token], splice: Splice, edit: TextEdit) {
        let removed_end = splice.head + splice.deleted;
        let moved = |index: usize| index - splice.deleted + splice.inserted;

        for node in self.nodes.iter_mut().filter(|node| !node.retired) {
            let Range { start, end } = node.tokens;
            let after = start >= removed_end;
            let spans = start <= splice.head && end > splice.head && end >= removed_end;

            if after {
                node.tokens = moved(start)..moved(end);
            } else if spans {
                node.tokens.end = moved(end);
            }

            if (after || spans) && !node.tokens.is_empty() && node.tokens.end <= tokens.len() {
                let first = tokens[node.tokens.start];
                let last = tokens[node.tokens.end - 1];
                node.range = TextRange::new(first.start(), last.end());
            }

            for error in &mut node.diagnostics {
                error.shift(edit);
            }
        }
    }

    /// Indented dump of the subtree at `id`, one node per line, each followed
    /// by its diagnostics.
    pub fn dump(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, id, 0);
        out
    }

    fn dump_into(&self, out: &mut String, id: NodeId, depth: usize) {
        let node = &self[id];
        let indent = "  ".repeat(depth);
        let range = node.range;
        _ = writeln!(
            out,
            "{indent}{} @{}..{}",
            node.kind.label(),
            u32::from(range.start()),
            u32::from(range.end())
        );
        for error in &node.diagnostics {
            _ = writeln!(out, "{indent}  {}", dump_error(error));
        }
        for child in node.children() {
            self.dump_into(out, child, depth + 1);
        }
    }
}

impl Index<NodeId> for Ast {
    type Output = NodeData;

    fn index(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }
}

pub(crate) fn dump_error(error: &ParseError) -> String {
    let range = error.range();
    format!(
        "! {} @{}..{} {}",
        error.code(),
        u32::from(range.start()),
        u32::from(range.end()),
        error.message()
    )
}
