use sable_errors::ParseErrorKind;
use sable_tokenizer::Token;
use text_size::TextRange;

use crate::ast::{Node, NodeId, Rule};
use crate::parser::Parser;

/// Applies `item` until the input ends or `is_end` holds at a token the
/// item rejected. Rejected tokens are reported and skipped one at a time.
pub(crate) fn read_array(
    p: &mut Parser<'_>,
    mut item: impl FnMut(&mut Parser<'_>) -> Option<NodeId>,
    is_end: impl Fn(Token) -> bool,
) -> Vec<NodeId> {
    let mut items = Vec::new();

    while let Some(token) = p.current() {
        if let Some(node) = item(p) {
            items.push(node);
            continue;
        }

        if is_end(token) {
            break;
        }

        p.report(ParseErrorKind::UnexpectedToken);
        p.advance();
    }

    items
}

/// Reads a separated list up to `is_end` or the end of input.
///
/// * two items in a row: `MissedListSeparator` at the second item;
/// * a separator where an item was due: `ExtraListSeparator`;
/// * neither item nor separator: `UnexpectedToken`, and the token is skipped;
/// * a separator right before the end: `TrailingListSeparator`.
pub(crate) fn read_array_sep(
    p: &mut Parser<'_>,
    mut item: impl FnMut(&mut Parser<'_>) -> Option<NodeId>,
    is_separator: impl Fn(Token) -> bool,
    is_end: impl Fn(Token) -> bool,
) -> Vec<NodeId> {
    let mut items = Vec::new();
    let mut after_separator = true;
    let mut dangling: Option<TextRange> = None;

    while let Some(token) = p.current() {
        if is_end(token) {
            break;
        }

        if let Some(node) = item(p) {
            if !after_separator {
                let start = p.ast()[node].range().start();
                p.report_at(ParseErrorKind::MissedListSeparator, TextRange::empty(start));
            }
            items.push(node);
            after_separator = false;
            dangling = None;
            continue;
        }

        if is_separator(token) {
            if after_separator {
                p.report(ParseErrorKind::ExtraListSeparator);
            }
            p.advance();
            after_separator = true;
            dangling = Some(token.range);
            continue;
        }

        p.report(ParseErrorKind::UnexpectedToken);
        p.advance();
        dangling = None;
    }

    if let Some(range) = dangling {
        p.report_at(ParseErrorKind::TrailingListSeparator, range);
    }

    items
}

/// Left-associative chain `head (op tail)*`, folding every step into a new
/// head with `factory`. An operator whose right side fails to match is left
/// unconsumed.
pub(crate) fn lr_binary(
    p: &mut Parser<'_>,
    rule: Rule,
    head: fn(&mut Parser<'_>) -> Option<NodeId>,
    is_operator: fn(Token) -> bool,
    tail: fn(&mut Parser<'_>) -> Option<NodeId>,
    factory: fn(NodeId, Token, NodeId) -> Node,
) -> Option<NodeId> {
    let mut lhs = head(p)?;

    while let Some(op) = p.current().filter(|&token| is_operator(token)) {
        let checkpoint = p.checkpoint();
        p.advance();

        let Some(rhs) = tail(p) else {
            p.restore(checkpoint);
            break;
        };
        p.commit(checkpoint);

        let m = p.precede(lhs);
        lhs = m.complete(p, factory(lhs, op, rhs), rule)?;
    }

    Some(lhs)
}
