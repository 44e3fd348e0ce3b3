use sable_tokenizer::{Punct, Token};

use crate::ast::{Node, NodeId, Rule};
use crate::combinators::lr_binary;
use crate::parser::Parser;

pub(crate) mod exprs;
pub(crate) mod items;
pub(crate) mod types;

/// Runs `rule` at the cursor, the way it ran when its node was first built.
pub(crate) fn rerun(p: &mut Parser<'_>, rule: Rule) -> Option<NodeId> {
    match rule {
        Rule::Name => name(p),
        Rule::Literal => exprs::literal(p),
        Rule::Path => path(p),
        Rule::Expression => exprs::expr(p),
        Rule::ExpressionStatement => exprs::statement(p),
        Rule::Parameter => items::parameter(p),
        Rule::FunctionDeclaration => items::function(p),
    }
}

pub(crate) fn name(p: &mut Parser<'_>) -> Option<NodeId> {
    let token = p.current().filter(Token::is_name)?;
    let name = token.text(p.text()).to_owned();

    let m = p.start();
    p.advance();
    m.complete(p, Node::Identifier { name }, Rule::Name)
}

/// `a.b.c`, folded left into nested member accesses.
pub(crate) fn path(p: &mut Parser<'_>) -> Option<NodeId> {
    lr_binary(p, Rule::Path, name, is_dot, name, member_access)
}

fn is_dot(token: Token) -> bool {
    token.is_punct(Punct::Dot)
}

fn member_access(object: NodeId, _: Token, property: NodeId) -> Node {
    Node::MemberAccess { object, property }
}
