use expect_test::{Expect, expect};
use sable_errors::ParseErrorKind;
use sable_span::TextEdit;
use sable_tokenizer::{PullList, TokenArray, Tokenizer};
use text_size::TextRange;

use crate::ast::{Ast, Rule};
use crate::parser::Parser;
use crate::{Node, Parse, Reparse, get_parse_errors, parse};

const TWO_FUNCTIONS: &str = "func a()\n\nfunc b(X, Y)";

fn parse_text(text: &str) -> Parse {
    parse(text, &TokenArray::new(text))
}

fn check(text: &str, expect: Expect) {
    expect.assert_eq(&parse_text(text).debug_dump());
}

/// Applies an edit incrementally and checks the result against a fresh
/// parse of the edited text.
fn edit(text: &str, start: u32, end: u32, replacement: &str) -> (Parse, Reparse) {
    let mut tokens = TokenArray::new(text);
    let mut parse = parse(text, &tokens);

    let range = TextRange::new(start.into(), end.into());
    let mut edited = text.to_owned();
    edited.replace_range(std::ops::Range::<usize>::from(range), replacement);
    let text_edit = TextEdit::replace(range, replacement);

    let splice = tokens.apply_edit(&edited, text_edit);
    let reparse = parse.reparse(&edited, &tokens, splice, text_edit);
    assert_eq!(parse.debug_dump(), parse_text(&edited).debug_dump());
    (parse, reparse)
}

#[test]
fn two_declarations() {
    let parse = parse_text(TWO_FUNCTIONS);
    let ast = parse.ast();

    assert_eq!(parse.items().len(), 2);
    assert_eq!(ast.name(parse.items()[0]), Some("a"));
    assert!(ast.params(parse.items()[0]).is_empty());
    assert_eq!(ast.name(parse.items()[1]), Some("b"));
    let params = ast.params(parse.items()[1]).iter().map(|&param| ast.name(param));
    assert_eq!(params.collect::<Vec<_>>(), [Some("X"), Some("Y")]);
    assert!(parse.syntax_errors().is_empty());

    check(
        TWO_FUNCTIONS,
        expect![[r#"
            FunctionDeclaration @0..8
              Identifier "a" @5..6
            FunctionDeclaration @10..22
              Identifier "b" @15..16
              Parameter @17..18
                Identifier "X" @17..18
              Parameter @20..21
                Identifier "Y" @20..21
        "#]],
    );
}

#[test]
fn extra_and_trailing_separators() {
    let parse = parse_text("func c(x, , y, )");
    assert_eq!(parse.items().len(), 1);
    assert_eq!(parse.ast().name(parse.items()[0]), Some("c"));

    let kinds = parse.syntax_errors().into_iter().map(|error| error.kind().clone());
    assert_eq!(
        kinds.collect::<Vec<_>>(),
        [ParseErrorKind::ExtraListSeparator, ParseErrorKind::TrailingListSeparator]
    );

    check(
        "func c(x, , y, )",
        expect![[r#"
            FunctionDeclaration @0..16
              ! 1005 @10..11 extra separator in a list
              ! 1004 @13..14 trailing separator at the end of a list
              Identifier "c" @5..6
              Parameter @7..8
                Identifier "x" @7..8
              Parameter @12..13
                Identifier "y" @12..13
        "#]],
    );
}

#[test]
fn missed_separator() {
    let parse = parse_text("func d(x y)");
    let params = parse.ast().params(parse.items()[0]);
    assert_eq!(params.len(), 2);

    check(
        "func d(x y)",
        expect![[r#"
            FunctionDeclaration @0..11
              ! 1003 @9..10 missing separator between list items
              Identifier "d" @5..6
              Parameter @7..8
                Identifier "x" @7..8
              Parameter @9..10
                Identifier "y" @9..10
        "#]],
    );
}

#[test]
fn return_type() {
    check(
        "func f(a): A.B",
        expect![[r#"
            FunctionDeclaration @0..14
              Identifier "f" @5..6
              Parameter @7..8
                Identifier "a" @7..8
              MemberAccess @11..14
                Identifier "A" @11..12
                Identifier "B" @13..14
        "#]],
    );
}

#[test]
fn end_of_file_after_threshold() {
    check(
        "func e(",
        expect![[r#"
            FunctionDeclaration @0..7
              ! 1008 @7..8 unexpected end of file
              Identifier "e" @5..6
        "#]],
    );
}

#[test]
fn end_of_file_below_threshold() {
    check(
        "func",
        expect![[r#"
            ! 1006 @0..4 unexpected token
        "#]],
    );
}

#[test]
fn binary_expressions_fold_left() {
    check(
        r#"x = 1 + a.b * "hi""#,
        expect![[r#"
            ExpressionStatement @0..18
              Binary * @0..18
                Binary + @0..11
                  Binary = @0..5
                    Identifier "x" @0..1
                    NumericLiteral 1 @4..5
                  MemberAccess @8..11
                    Identifier "a" @8..9
                    Identifier "b" @10..11
                StringLiteral "hi" @14..18
        "#]],
    );
}

#[test]
fn unterminated_string_operand() {
    check(
        r#"x + "ab"#,
        expect![[r#"
            ExpressionStatement @0..7
              Binary + @0..7
                Identifier "x" @0..1
                StringLiteral "ab" (unterminated) @4..7
        "#]],
    );
}

#[test]
fn stray_tokens_between_items() {
    check(
        ")\nfoo",
        expect![[r#"
            ExpressionStatement @2..5
              Identifier "foo" @2..5
            ! 1006 @0..1 unexpected token
        "#]],
    );
}

#[test]
fn parent_links() {
    let parse = parse_text("func f(a)");
    let ast = parse.ast();
    let function = parse.items()[0];
    let param = ast.params(function)[0];

    assert_eq!(ast[function].parent(), None);
    assert_eq!(ast[param].parent(), Some(function));
    for child in ast[param].children() {
        assert_eq!(ast[child].parent(), Some(param));
    }
    assert_eq!(parse.nodes().count(), 4);
}

#[test]
fn parsing_is_idempotent() {
    let tokens = TokenArray::new("func c(x, , y, )\nfunc d(x y): A.B");
    let first = parse("func c(x, , y, )\nfunc d(x y): A.B", &tokens);
    let second = parse("func c(x, , y, )\nfunc d(x y): A.B", &tokens);
    assert_eq!(first, second);
}

#[test]
fn pull_list_parses_like_token_array() {
    let list = PullList::new(Tokenizer::new(TWO_FUNCTIONS));
    let pulled = parse(TWO_FUNCTIONS, &list);

    assert_eq!(pulled, parse_text(TWO_FUNCTIONS));
    assert_eq!(list.pulled(), 13);
}

#[test]
fn errors_are_merged_by_offset() {
    let text = "func a(x y)\n@";
    let tokens = TokenArray::new(text);
    let parse = parse(text, &tokens);

    let errors = get_parse_errors(tokens.errors(), &parse);
    let codes = errors.iter().map(|error| error.code()).collect::<Vec<_>>();
    assert_eq!(codes, [1003, 1001]);
}

#[test]
fn lexical_errors_lead_at_the_same_offset() {
    let text = "func a(\"";
    let tokens = TokenArray::new(text);
    let parse = parse(text, &tokens);

    let errors = get_parse_errors(tokens.errors(), &parse);
    let codes = errors.iter().map(|error| (error.code(), u32::from(error.offset())));
    assert_eq!(codes.collect::<Vec<_>>(), [(1002, 7), (1006, 7), (1008, 8)]);
}

#[test]
#[should_panic(expected = "diagnostic reported outside of any error frame")]
fn report_without_frame() {
    let tokens = TokenArray::new("x");
    let mut p = Parser::new("x", &tokens, Ast::default());
    p.report(ParseErrorKind::UnexpectedToken);
}

#[test]
#[should_panic(expected = "error frames must be popped innermost first")]
fn frames_pop_innermost_first() {
    let tokens = TokenArray::new("x");
    let mut p = Parser::new("x", &tokens, Ast::default());
    let outer = p.push_frame();
    let _inner = p.push_frame();
    p.take_frame(outer);
}

#[test]
#[should_panic(expected = "Checkpoint must be either restored or committed")]
fn dangling_checkpoint() {
    let tokens = TokenArray::new("x");
    let mut p = Parser::new("x", &tokens, Ast::default());
    drop(p.checkpoint());
}

#[test]
fn restore_drops_speculative_nodes() {
    let tokens = TokenArray::new("a b");
    let mut p = Parser::new("a b", &tokens, Ast::default());

    let checkpoint = p.checkpoint();
    assert!(crate::grammar::name(&mut p).is_some());
    p.restore(checkpoint);

    assert_eq!(p.ast().nodes().count(), 0);
    assert!(p.at(|token| token.range == TextRange::new(0.into(), 1.into())));
    assert_eq!(p.finish(), Ast::default());
}

#[test]
fn single_token_edit_patches_in_place() {
    let before = parse_text(TWO_FUNCTIONS);
    let (parse, reparse) = edit(TWO_FUNCTIONS, 5, 6, "z");

    let Reparse::Patched(id) = reparse else { panic!("expected a patch, got {reparse:?}") };
    assert_eq!(parse.ast()[id].kind(), &Node::Identifier { name: "z".to_owned() });
    assert_eq!(parse.items(), before.items());
    assert_eq!(parse.ast().name(parse.items()[0]), Some("z"));
    assert_eq!(parse.ast().name(parse.items()[1]), Some("b"));
    assert!(parse.syntax_errors().is_empty());
}

#[test]
fn multi_token_edit_climbs_to_parameter() {
    let (parse, reparse) = edit("func f(x, y)", 10, 11, "z: A.B");

    let Reparse::Patched(id) = reparse else { panic!("expected a patch, got {reparse:?}") };
    assert!(matches!(parse.ast()[id].kind(), Node::Parameter { ty: Some(_), .. }));
    assert_eq!(parse.ast().name(id), Some("z"));
}

#[test]
fn edits_keep_diagnostics_in_place() {
    let (parse, reparse) = edit("func d(x y)\nfunc c(x, )", 5, 6, "dd");

    assert!(matches!(reparse, Reparse::Patched(_)));
    let codes = parse.syntax_errors().iter().map(|error| error.code()).collect::<Vec<_>>();
    assert_eq!(codes, [1003, 1004]);
}

#[test]
fn whitespace_edit_only_shifts() {
    let (parse, reparse) = edit("func a()", 4, 4, " ");

    assert_eq!(reparse, Reparse::Shifted);
    assert_eq!(parse.ast()[parse.items()[0]].range(), TextRange::new(0.into(), 9.into()));
}

#[test]
fn uncovered_edit_reparses_everything() {
    let (parse, reparse) = edit("a\nb", 1, 1, " +");

    assert_eq!(reparse, Reparse::Full);
    assert_eq!(parse.items().len(), 1);
}

#[test]
fn deleting_across_items() {
    let (parse, reparse) = edit(TWO_FUNCTIONS, 6, 16, "");

    assert_eq!(reparse, Reparse::Full);
    assert_eq!(parse.items().len(), 1);
    assert_eq!(parse.ast().params(parse.items()[0]).len(), 2);
    assert!(parse.syntax_errors().is_empty());
}

#[test]
fn deleting_a_parameter_patches_the_declaration() {
    let (parse, reparse) = edit("func b(X, Y)", 10, 11, "");

    let Reparse::Patched(id) = reparse else { panic!("expected a patch, got {reparse:?}") };
    assert_eq!(id, parse.items()[0]);
    assert_eq!(parse.ast().params(id).len(), 1);
    let codes = parse.syntax_errors().iter().map(|error| error.code()).collect::<Vec<_>>();
    assert_eq!(codes, [1004]);
}

#[test]
fn deleting_the_last_statement() {
    let (parse, reparse) = edit("a b", 2, 3, "");

    assert_eq!(reparse, Reparse::Full);
    assert_eq!(parse.items().len(), 1);
}

#[test]
fn deleting_the_first_statement() {
    let (parse, reparse) = edit("a b", 0, 2, "");

    assert_eq!(reparse, Reparse::Full);
    assert_eq!(parse.items().len(), 1);
    assert_eq!(parse.ast()[parse.items()[0]].range(), TextRange::new(0.into(), 1.into()));
}

#[test]
fn typing_a_fraction() {
    edit("x = ", 4, 4, "1");
    edit("x = 1", 5, 5, ".");
    let (parse, _) = edit("x = 1.", 6, 6, "5");

    assert!(parse.debug_dump().contains("NumericLiteral 1.5 @4..7"));
    assert!(parse.syntax_errors().is_empty());
}

#[test]
fn patched_node_takes_the_rule_of_its_replacement() {
    let (parse, reparse) = edit("a + b", 1, 4, ".");

    let Reparse::Patched(id) = reparse else { panic!("expected a patch, got {reparse:?}") };
    assert!(matches!(parse.ast()[id].kind(), Node::MemberAccess { .. }));
    assert_eq!(parse.ast()[id].rule, Rule::Path);
}

#[test]
fn retired_slots_are_dropped_by_a_full_reparse() {
    let mut text = "func a()".to_owned();
    let mut tokens = TokenArray::new(&text);
    let mut parse = parse(&text, &tokens);

    let mut outcomes = Vec::new();
    for name in ["b", "c", "d", "e"] {
        let range = TextRange::new(5.into(), 6.into());
        text.replace_range(5..6, name);
        let text_edit = TextEdit::replace(range, name);
        let splice = tokens.apply_edit(&text, text_edit);
        outcomes.push(parse.reparse(&text, &tokens, splice, text_edit));
    }

    let patched = outcomes.iter().map(|r| matches!(r, Reparse::Patched(_))).collect::<Vec<_>>();
    assert_eq!(patched, [true, true, true, false]);
    assert_eq!(parse.ast().raw_len(), 2);
    assert_eq!(parse.ast().name(parse.items()[0]), Some("e"));
}
