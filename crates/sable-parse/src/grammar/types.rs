use sable_tokenizer::Punct;

use super::path;
use crate::ast::NodeId;
use crate::parser::Parser;

/// `: Type`, where a type is a possibly qualified name.
pub(crate) fn ascription(p: &mut Parser<'_>) -> Option<NodeId> {
    if !p.eat_punct(Punct::Colon) {
        return None;
    }
    path(p)
}
