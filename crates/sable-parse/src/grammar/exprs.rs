use sable_tokenizer::{Token, TokenKind, unescape};

use super::path;
use crate::ast::{Node, NodeId, Rule};
use crate::combinators::lr_binary;
use crate::parser::Parser;
use crate::pattern::{Builder, Pattern, Slot, Step, create_pattern};

#[derive(Default)]
struct StatementBuilder {
    expr: Slot<NodeId>,
}

impl Builder for StatementBuilder {
    fn build(self) -> Option<Node> {
        let expr = self.expr.into_inner()?;
        Some(Node::ExpressionStatement { expr })
    }
}

const STATEMENT_STEPS: &[Step<StatementBuilder>] = &[Step::required("expression", expression)];

const STATEMENT: Pattern<StatementBuilder> =
    create_pattern(Rule::ExpressionStatement, STATEMENT_STEPS);

fn expression(p: &mut Parser<'_>, b: &mut StatementBuilder) -> bool {
    b.expr.fill(expr(p))
}

pub(crate) fn statement(p: &mut Parser<'_>) -> Option<NodeId> {
    STATEMENT.parse(p)
}

pub(crate) fn expr(p: &mut Parser<'_>) -> Option<NodeId> {
    lr_binary(p, Rule::Expression, primary, is_binary_operator, primary, binary)
}

fn is_binary_operator(token: Token) -> bool {
    matches!(token.kind, TokenKind::Operator(_) | TokenKind::Assign(_) | TokenKind::Relational(_))
}

fn binary(lhs: NodeId, op: Token, rhs: NodeId) -> Node {
    Node::Binary { lhs, op: op.kind.symbol().unwrap_or_default(), rhs }
}

fn primary(p: &mut Parser<'_>) -> Option<NodeId> {
    path(p).or_else(|| literal(p))
}

pub(crate) fn literal(p: &mut Parser<'_>) -> Option<NodeId> {
    let token = p.current()?;
    let raw = token.text(p.text());
    let kind = match token.kind {
        TokenKind::Number => Node::NumericLiteral { text: raw.to_owned() },
        TokenKind::String { terminated } => {
            Node::StringLiteral { value: unescape(raw), terminated }
        }
        _ => return None,
    };

    let m = p.start();
    p.advance();
    m.complete(p, kind, Rule::Literal)
}
