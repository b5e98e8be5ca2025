use chart_option::api::{CompilerConfig, OptionCompiler};
use chart_option::core::{ChartConfig, ChartType, Row};
use chart_option::serialize_option;
use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::{Value, json};
use std::hint::black_box;

fn sample_rows(count: usize) -> Vec<Row> {
    (0..count)
        .map(|i| {
            let mut row = Row::new();
            row.insert("day".to_owned(), Value::String(format!("d{i}")));
            row.insert("sales".to_owned(), json!(100 + (i * 37) % 250));
            row.insert("cost".to_owned(), json!(60 + (i * 11) % 90));
            row
        })
        .collect()
}

fn compiler() -> OptionCompiler {
    OptionCompiler::new(CompilerConfig::default()).expect("default compiler")
}

fn bench_generate_bar_1k(c: &mut Criterion) {
    let compiler = compiler();
    let rows = sample_rows(1_000);
    let config = ChartConfig::new();

    c.bench_function("generate_bar_1k", |b| {
        b.iter(|| compiler.generate(black_box(&ChartType::Bar), black_box(&rows), &config))
    });
}

fn bench_serialize_and_parse_round_trip(c: &mut Criterion) {
    let compiler = compiler();
    let option = compiler.generate(&ChartType::Line, &sample_rows(200), &ChartConfig::new());
    let text = serialize_option(&option);

    c.bench_function("serialize_option_200_rows", |b| {
        b.iter(|| serialize_option(black_box(&option)))
    });
    c.bench_function("parse_option_200_rows", |b| {
        b.iter(|| compiler.parse(black_box(&text)).expect("parse"))
    });
}

fn bench_interpolate_expression_template(c: &mut Criterion) {
    let compiler = compiler();
    let rows = sample_rows(500);
    let template = r#"
        const total = $DATA.reduce((sum, r) => sum + r.sales, 0);
        option = {
          title: { text: `Total ${total}` },
          xAxis: { type: 'category', data: $DATA.map((r) => r.day) },
          series: [{ type: 'bar', data: $DATA.map((r) => r.sales - r.cost) }],
        };
    "#;

    c.bench_function("interpolate_expression_template_500", |b| {
        b.iter(|| compiler.interpolate(black_box(template), black_box(&rows)))
    });
}

criterion_group!(
    benches,
    bench_generate_bar_1k,
    bench_serialize_and_parse_round_trip,
    bench_interpolate_expression_template
);
criterion_main!(benches);
