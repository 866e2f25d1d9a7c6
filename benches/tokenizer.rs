use std::fmt::Write;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use dataset_fixture::{
    assertion::{DbAssertion, DiffCollectingFailureHandler},
    dataset::csv_set,
    tokenizer::CsvParser,
};

fn generate_orders(rows: usize) -> String {
    let mut text = String::from("ID,CUSTOMER_ID,AMOUNT,NOTE,UPDATED_AT\n");
    for i in 0..rows {
        let note = match i % 3 {
            0 => "plain note".to_string(),
            1 => format!("\"quoted, \\\"note\\\" {i}\""),
            _ => "null".to_string(),
        };
        let day = (i % 28) + 1;
        writeln!(
            text,
            "{i}, {customer} ,{amount}.{cents:02},{note},2024-01-{day:02} 10:00:00",
            customer = i % 97,
            amount = i % 1000,
            cents = i % 100,
        )
        .expect("write row");
    }
    text
}

fn bench_tokenizer(c: &mut Criterion) {
    let document = generate_orders(20_000);
    let mut group = c.benchmark_group("tokenizer");

    group.bench_function("parse_line", |b| {
        let mut parser = CsvParser::new();
        b.iter(|| {
            parser
                .parse_line(r#"12, 34 ,"quoted, \"value\"",plain\,escaped,2024-01-01"#)
                .expect("parse line")
        });
    });

    group.bench_function("parse_str_20k_rows", |b| {
        b.iter_batched(
            CsvParser::new,
            |mut parser| parser.parse_str(&document, "orders").expect("parse document"),
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_compare(c: &mut Criterion) {
    let mut parser = CsvParser::new();
    let records = parser
        .parse_str(&generate_orders(20_000), "orders")
        .expect("parse document");
    let expected = csv_set::table_from_records("ORDERS", records.clone()).expect("expected");
    let actual = csv_set::table_from_records("ORDERS", records).expect("actual");
    let assertion = DbAssertion::new();

    c.bench_function("compare_20k_rows", |b| {
        b.iter(|| {
            let mut handler = DiffCollectingFailureHandler::new();
            assertion
                .assert_equals_table(&expected, &actual, &mut handler)
                .expect("compare");
            handler.len()
        });
    });
}

criterion_group!(benches, bench_tokenizer, bench_compare);
criterion_main!(benches);
