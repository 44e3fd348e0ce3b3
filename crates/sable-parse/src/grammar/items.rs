use sable_errors::ParseErrorKind;
use sable_tokenizer::{Punct, Token};

use super::{exprs, name, types};
use crate::ast::{Node, NodeId, Rule};
use crate::combinators::{read_array, read_array_sep};
use crate::parser::Parser;
use crate::pattern::{Builder, Pattern, Slot, Step, create_pattern};

/// Top-level items up to the end of input.
pub(crate) fn module(p: &mut Parser<'_>) -> Vec<NodeId> {
    read_array(p, item, |_| false)
}

fn item(p: &mut Parser<'_>) -> Option<NodeId> {
    exprs::statement(p).or_else(|| function(p))
}

#[derive(Default)]
struct FunctionBuilder {
    name: Slot<NodeId>,
    params: Slot<Vec<NodeId>>,
    return_type: Slot<NodeId>,
}

impl Builder for FunctionBuilder {
    fn build(self) -> Option<Node> {
        Some(Node::FunctionDeclaration {
            name: self.name.into_inner(),
            params: self.params.into_inner().unwrap_or_default(),
            return_type: self.return_type.into_inner(),
        })
    }
}

const FUNCTION_STEPS: &[Step<FunctionBuilder>] = &[
    Step::required("`func`", func_keyword),
    Step::required("function name", function_name),
    Step::required("parameter list", function_params),
    Step::optional("return type", return_type),
];

const FUNCTION: Pattern<FunctionBuilder> =
    create_pattern(Rule::FunctionDeclaration, FUNCTION_STEPS);

/// `func name(params)` with an optional `: Type` after the parameters.
pub(crate) fn function(p: &mut Parser<'_>) -> Option<NodeId> {
    FUNCTION.parse(p)
}

fn func_keyword(p: &mut Parser<'_>, _: &mut FunctionBuilder) -> bool {
    p.eat_keyword("func")
}

fn function_name(p: &mut Parser<'_>, b: &mut FunctionBuilder) -> bool {
    b.name.fill(name(p))
}

fn function_params(p: &mut Parser<'_>, b: &mut FunctionBuilder) -> bool {
    b.params.fill(param_list(p))
}

fn return_type(p: &mut Parser<'_>, b: &mut FunctionBuilder) -> bool {
    b.return_type.fill(types::ascription(p))
}

fn param_list(p: &mut Parser<'_>) -> Option<Vec<NodeId>> {
    if !p.eat_punct(Punct::LeftParen) {
        return None;
    }

    let params = read_array_sep(p, parameter, is_comma, is_right_paren);

    if !p.eat_punct(Punct::RightParen) {
        if p.eof() {
            p.report(ParseErrorKind::UnexpectedEndOfFile);
        } else {
            p.report(ParseErrorKind::ExpectedToken("`)`"));
        }
    }

    Some(params)
}

fn is_comma(token: Token) -> bool {
    token.is_punct(Punct::Comma)
}

fn is_right_paren(token: Token) -> bool {
    token.is_punct(Punct::RightParen)
}

#[derive(Default)]
struct ParameterBuilder {
    name: Slot<NodeId>,
    ty: Slot<NodeId>,
}

impl Builder for ParameterBuilder {
    fn build(self) -> Option<Node> {
        Some(Node::Parameter { name: self.name.into_inner(), ty: self.ty.into_inner() })
    }
}

const PARAMETER_STEPS: &[Step<ParameterBuilder>] = &[
    Step::required("parameter name", parameter_name),
    Step::optional("parameter type", parameter_type),
];

const PARAMETER: Pattern<ParameterBuilder> = create_pattern(Rule::Parameter, PARAMETER_STEPS);

/// `name` or `name: Type`.
pub(crate) fn parameter(p: &mut Parser<'_>) -> Option<NodeId> {
    PARAMETER.parse(p)
}

fn parameter_name(p: &mut Parser<'_>, b: &mut ParameterBuilder) -> bool {
    b.name.fill(name(p))
}

fn parameter_type(p: &mut Parser<'_>, b: &mut ParameterBuilder) -> bool {
    b.ty.fill(types::ascription(p))
}
