use std::hint::black_box;

use codspeed_criterion_compat::{
    BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main,
};
use sable_span::TextEdit;
use sable_tokenizer::TokenArray;
use text_size::{TextRange, TextSize};

fn sources() -> Vec<(&'static str, String)> {
    let simple = "func main(args: List.String): Unit\nx = 1 + 2\n".to_owned();
    let medium = (0..200)
        .map(|i| format!("func f{i}(a, b: A.B, c): R\nx{i} = a.b * {i} + \"s{i}\"\n"))
        .collect::<String>();
    let broken = (0..200)
        .map(|i| format!("func g{i}(a b, , c, )\ny{i} = ) {i}\n"))
        .collect::<String>();
    vec![("simple", simple), ("medium", medium), ("broken", broken)]
}

fn benchmark_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for (name, text) in sources() {
        let tokens = TokenArray::new(&text);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("full", name), &text, |b, text| {
            b.iter(|| black_box(sable_parse::parse(text, &tokens)));
        });
    }

    group.finish();
}

/// Renames the parameter `b` of the middle declaration and brings tokens and
/// tree up to date.
fn benchmark_edit(c: &mut Criterion) {
    let mut group = c.benchmark_group("edit");

    for (name, text) in sources().into_iter().skip(1) {
        let Some(offset) = text[text.len() / 2..].find("(a, b").map(|i| i + text.len() / 2 + 4)
        else {
            continue;
        };
        let range = TextRange::at(TextSize::new(offset as u32), TextSize::new(1));
        let mut edited = text.clone();
        edited.replace_range(offset..offset + 1, "renamed");
        let edit = TextEdit::replace(range, "renamed");

        let tokens = TokenArray::new(&text);
        let parse = sable_parse::parse(&text, &tokens);

        group.bench_function(BenchmarkId::new("single_token", name), |b| {
            b.iter_batched(
                || (tokens.clone(), parse.clone()),
                |(mut tokens, mut parse)| {
                    let splice = tokens.apply_edit(&edited, edit);
                    black_box(parse.reparse(&edited, &tokens, splice, edit))
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_parser, benchmark_edit);
criterion_main!(benches);
