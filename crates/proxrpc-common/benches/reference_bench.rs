// Criterion benchmarks for proxrpc-common reference codecs
//
// Run benchmarks with:
//   cargo bench -p proxrpc-common
//
// For detailed output with plots:
//   cargo bench -p proxrpc-common -- --save-baseline main

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use proxrpc_common::{InputStream, OutputStream, Properties, ReferenceFactory};

const WELL_KNOWN: &str = "greeter";
const ADAPTER: &str = "office/printer -f admin -s @ PrinterAdapter";
const DIRECT: &str =
    "printer -o:tcp -h 10.0.0.5 -p 4061 -t 500:tcp -h 10.0.0.6 -p 4061 -z:udp -h \"::1\" -p 4062";

fn bench_string_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("string_parse");
    let factory = ReferenceFactory::new();

    group.bench_function("well_known", |b| {
        b.iter(|| factory.create(black_box(WELL_KNOWN)));
    });

    group.bench_function("adapter", |b| {
        b.iter(|| factory.create(black_box(ADAPTER)));
    });

    group.bench_function("direct_three_endpoints", |b| {
        b.iter(|| factory.create(black_box(DIRECT)));
    });

    group.finish();
}

fn bench_string_print(c: &mut Criterion) {
    let mut group = c.benchmark_group("string_print");
    let factory = ReferenceFactory::new();

    for (name, input) in [("adapter", ADAPTER), ("direct", DIRECT)] {
        let reference = factory.create(input).ok().flatten();
        group.bench_function(name, |b| {
            b.iter(|| black_box(&reference).as_ref().map(|r| r.to_string()));
        });
    }

    group.finish();
}

fn bench_binary_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("binary_round_trip");
    let factory = ReferenceFactory::new();

    for (name, input) in [("adapter", ADAPTER), ("direct", DIRECT)] {
        let reference = factory.create(input).ok().flatten();

        group.bench_function(format!("write_{}", name), |b| {
            b.iter(|| {
                let mut out = OutputStream::new();
                factory.write(black_box(reference.as_ref()), &mut out).map(|_| out.len())
            });
        });

        let mut out = OutputStream::new();
        let _ = factory.write(reference.as_ref(), &mut out);
        let bytes = out.into_bytes();
        group.bench_function(format!("read_{}", name), |b| {
            b.iter(|| {
                let mut input = InputStream::new(black_box(&bytes));
                factory.read(&mut input)
            });
        });
    }

    group.finish();
}

fn bench_properties(c: &mut Criterion) {
    let mut group = c.benchmark_group("properties");

    group.bench_function("parse_line", |b| {
        let props = Properties::new();
        b.iter(|| props.parse_line(black_box(r"Proxrpc.RetryIntervals = \ 0 100 500 # backoff")));
    });

    group.bench_function("get_property_as_int", |b| {
        let props = Properties::new();
        props.set_property("Proxrpc.Trace.Retry", "2");
        b.iter(|| props.get_property_as_int(black_box("Proxrpc.Trace.Retry")));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_string_parse,
    bench_string_print,
    bench_binary_round_trip,
    bench_properties
);
criterion_main!(benches);
