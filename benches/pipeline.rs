use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use umlgen::config::LayoutConfig;
use umlgen::diagram::build_graph;
use umlgen::extract::extract_diagram;
use umlgen::layout::compute_layout;
use umlgen::render::render_svg;
use umlgen::schema::{Diagram, DiagramType};
use umlgen::theme::Theme;

fn fixture(name: &str) -> &'static str {
    match name {
        "activity" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/activity.json"
        )),
        "sequence" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/sequence.json"
        )),
        "class" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/class.json"
        )),
        "use_case" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/use_case.json"
        )),
        _ => panic!("unknown fixture"),
    }
}

fn kind(name: &str) -> DiagramType {
    match name {
        "activity" => DiagramType::Activity,
        "sequence" => DiagramType::Sequence,
        "class" => DiagramType::Class,
        "use_case" => DiagramType::UseCase,
        _ => panic!("unknown fixture"),
    }
}

const FIXTURES: [&str; 4] = ["activity", "sequence", "class", "use_case"];

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract");
    for name in FIXTURES {
        let wrapped = format!("Here is the diagram:\n```json\n{}\n```", fixture(name));
        group.bench_with_input(BenchmarkId::from_parameter(name), &wrapped, |b, raw| {
            b.iter(|| {
                let value = extract_diagram(black_box(raw)).expect("extract failed");
                black_box(value);
            });
        });
    }
    group.finish();
}

fn bench_build_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_graph");
    for name in FIXTURES {
        let value = extract_diagram(fixture(name)).expect("extract failed");
        let diagram = Diagram::from_value(kind(name), &value).expect("schema mismatch");
        group.bench_with_input(BenchmarkId::from_parameter(name), &diagram, |b, diagram| {
            b.iter(|| {
                let graph = build_graph(black_box(diagram)).expect("build failed");
                black_box(graph.nodes.len());
            });
        });
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_and_render");
    let theme = Theme::classic();
    let config = LayoutConfig::default();
    for name in FIXTURES {
        let value = extract_diagram(fixture(name)).expect("extract failed");
        let diagram = Diagram::from_value(kind(name), &value).expect("schema mismatch");
        let graph = build_graph(&diagram).expect("build failed");
        group.bench_with_input(BenchmarkId::from_parameter(name), &graph, |b, graph| {
            b.iter(|| {
                let layout = compute_layout(black_box(graph), &theme, &config);
                let svg = render_svg(&layout, &theme, &config);
                black_box(svg.len());
            });
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_extract, bench_build_graph, bench_end_to_end
);
criterion_main!(benches);
