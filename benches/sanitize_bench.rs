use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sql_sanitizer::sanitizer::{
    decode_hex_literals, quote_table_names, standard_passes, strip_sqlite_statements,
    trim_trailing_column,
};
use std::borrow::Cow;
use std::hint::black_box;

fn generate_dirty_dump(rows: usize) -> Vec<u8> {
    let mut data = Vec::new();

    data.extend_from_slice(b"PRAGMA foreign_keys=OFF;\n");
    data.extend_from_slice(b"BEGIN TRANSACTION;\n");
    data.extend_from_slice(b"CREATE TABLE users (id INTEGER, name TEXT, avatar BLOB);\n");
    data.extend_from_slice(b"CREATE TABLE alert_rule (id INTEGER, title TEXT, version INTEGER);\n");

    for i in 0..rows {
        let stmt = format!("INSERT INTO users VALUES({},'User {}',X'DEADBEEF');\n", i, i);
        data.extend_from_slice(stmt.as_bytes());
    }

    for i in 0..rows / 10 {
        let stmt = format!(
            "INSERT INTO alert_rule VALUES({},'Rule {}',{});\n",
            i,
            i,
            i % 5
        );
        data.extend_from_slice(stmt.as_bytes());
    }

    data.extend_from_slice(b"DELETE FROM sqlite_sequence;\n");
    data.extend_from_slice(b"COMMIT;\n");

    data
}

fn generate_quoted_dump(rows: usize) -> Vec<u8> {
    let mut data = Vec::new();

    for i in 0..rows {
        let stmt = format!(
            "INSERT INTO \"alert_rule\" VALUES({},'Rule {}',{});\n",
            i,
            i,
            i % 5
        );
        data.extend_from_slice(stmt.as_bytes());
    }

    data
}

fn generate_clean_dump(rows: usize) -> Vec<u8> {
    let mut data = Vec::new();

    for i in 0..rows {
        let stmt = format!("INSERT INTO \"users\" VALUES({},'User {}','data');\n", i, i);
        data.extend_from_slice(stmt.as_bytes());
    }

    data
}

fn run_pipeline(data: &[u8]) -> u64 {
    let passes = standard_passes();
    let mut current = data.to_vec();
    let mut total = 0u64;

    for pass in &passes {
        let out = pass.apply(&current);
        total += out.matches;
        if let Cow::Owned(next) = out.data {
            current = next;
        }
    }

    total
}

fn bench_pipeline_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_throughput");

    for rows in [1000, 10000, 50000] {
        let data = generate_dirty_dump(rows);
        let data_size = data.len();

        group.throughput(Throughput::Bytes(data_size as u64));
        group.bench_with_input(
            BenchmarkId::new("standard_passes", format!("{}_rows", rows)),
            &data,
            |b, data| b.iter(|| black_box(run_pipeline(data))),
        );
    }

    group.finish();
}

fn bench_individual_passes(c: &mut Criterion) {
    let dirty = generate_dirty_dump(10000);
    let quoted = generate_quoted_dump(10000);
    let clean = generate_clean_dump(10000);
    let tables = vec![
        "alert_rule".to_string(),
        "alert_rule_version".to_string(),
    ];

    let mut group = c.benchmark_group("passes");

    group.bench_function("strip", |b| {
        b.iter(|| black_box(strip_sqlite_statements(black_box(&dirty))).matches)
    });

    group.bench_function("strip_no_matches", |b| {
        b.iter(|| black_box(strip_sqlite_statements(black_box(&clean))).matches)
    });

    group.bench_function("quote_tables", |b| {
        b.iter(|| black_box(quote_table_names(black_box(&dirty))).matches)
    });

    group.bench_function("hex_decode", |b| {
        b.iter(|| black_box(decode_hex_literals(black_box(&dirty))).matches)
    });

    group.bench_function("trim_columns", |b| {
        b.iter(|| black_box(trim_trailing_column(black_box(&quoted), &tables)).matches)
    });

    group.finish();
}

fn bench_trim_table_scaling(c: &mut Criterion) {
    let data = generate_quoted_dump(10000);
    let data_size = data.len();

    let mut group = c.benchmark_group("trim_tables");
    group.throughput(Throughput::Bytes(data_size as u64));

    for count in [1, 2, 8] {
        let mut tables = vec!["alert_rule".to_string()];
        tables.extend((1..count).map(|i| format!("table_{}", i)));

        group.bench_with_input(
            BenchmarkId::new("trim", format!("{}_tables", count)),
            &tables,
            |b, tables| b.iter(|| black_box(trim_trailing_column(&data, tables)).matches),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_pipeline_throughput,
    bench_individual_passes,
    bench_trim_table_scaling,
);

criterion_main!(benches);
