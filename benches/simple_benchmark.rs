use criterion::{Criterion, criterion_group, criterion_main};
use simple_lang::parser::{TokenRegistry, Tokenizer};
use simple_lang::{LanguageConfig, Message, SimpleLanguage, SimpleValue};
use std::hint::black_box;

const TEMPLATE: &str = "Hello ${header.name}, your order ${body.id} ships on ${date:now:yyyy-MM-dd}";
const PREDICATE: &str = "${header.priority} in 'high,urgent' && ${body.total} > 100";

fn message() -> Message {
    Message::new()
        .with_body(SimpleValue::object([
            ("id", SimpleValue::from(4711)),
            ("total", SimpleValue::from(250)),
        ]))
        .with_header("name", "Claus")
        .with_header("priority", "high")
}

fn benchmark_tokenizer(c: &mut Criterion) {
    let registry = TokenRegistry::with_defaults();

    c.bench_function("tokenizer", |b| {
        b.iter(|| {
            let mut tokenizer = Tokenizer::new(&registry, black_box(TEMPLATE), true);
            black_box(tokenizer.tokenize_all().len())
        })
    });
}

fn benchmark_compile(c: &mut Criterion) {
    let uncached = SimpleLanguage::with_config(LanguageConfig::disabled_cache());
    let cached = SimpleLanguage::new();

    let mut group = c.benchmark_group("compile");
    group.bench_function("template_uncached", |b| {
        b.iter(|| black_box(uncached.compile_expression(black_box(TEMPLATE))))
    });
    group.bench_function("predicate_uncached", |b| {
        b.iter(|| black_box(uncached.compile_predicate(black_box(PREDICATE))))
    });
    group.bench_function("template_cached", |b| {
        b.iter(|| black_box(cached.compile_expression(black_box(TEMPLATE))))
    });
    group.finish();
}

fn benchmark_evaluate(c: &mut Criterion) {
    let language = SimpleLanguage::new();
    let message = message();

    for (i, text) in ["${body}", "${header.name}", "${body.id}", TEMPLATE]
        .into_iter()
        .enumerate()
    {
        let Ok(expression) = language.compile_expression(text) else {
            continue;
        };
        c.bench_function(&format!("expr_{i}_evaluate"), |b| {
            b.iter(|| black_box(expression.evaluate(black_box(&message))))
        });
    }

    for (i, text) in ["${body.total} > 100", "${header.name} regex 'C.*s'", PREDICATE]
        .into_iter()
        .enumerate()
    {
        let Ok(predicate) = language.compile_predicate(text) else {
            continue;
        };
        c.bench_function(&format!("predicate_{i}_matches"), |b| {
            b.iter(|| black_box(predicate.matches(black_box(&message))))
        });
    }
}

criterion_group!(
    benches,
    benchmark_tokenizer,
    benchmark_compile,
    benchmark_evaluate
);
criterion_main!(benches);
