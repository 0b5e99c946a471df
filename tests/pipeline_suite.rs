use std::path::Path;

use umlgen::config::LayoutConfig;
use umlgen::diagram::build_graph;
use umlgen::extract::extract_diagram;
use umlgen::layout::compute_layout;
use umlgen::render::render_svg;
use umlgen::schema::{Diagram, DiagramType};
use umlgen::theme::Theme;

fn render_fixture(rel: &str, kind: DiagramType) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(rel);
    let raw = std::fs::read_to_string(&path).expect("fixture read failed");
    let value = extract_diagram(&raw).expect("extract failed");
    let diagram = Diagram::from_value(kind, &value).expect("schema mismatch");
    let graph = build_graph(&diagram).expect("graph build failed");
    let layout = compute_layout(&graph, &Theme::classic(), &LayoutConfig::default());
    render_svg(&layout, &Theme::classic(), &LayoutConfig::default())
}

#[test]
fn all_diagram_types_render_non_empty_svg() {
    // Keep this list explicit so new diagram types must be added intentionally.
    let candidates = [
        ("activity.json", DiagramType::Activity),
        ("sequence.json", DiagramType::Sequence),
        ("class.json", DiagramType::Class),
        ("use_case.json", DiagramType::UseCase),
    ];

    for (fixture, kind) in candidates {
        let svg = render_fixture(fixture, kind);
        assert!(svg.contains("<svg"), "{fixture}: missing <svg tag");
        assert!(svg.contains("</svg>"), "{fixture}: missing </svg tag");
        assert!(svg.len() > 200, "{fixture}: suspiciously small output");
    }
}

#[test]
fn activity_fixture_keeps_decision_branches() {
    let svg = render_fixture("activity.json", DiagramType::Activity);
    assert!(svg.contains("Credentials valid?"));
    assert!(svg.contains("Yes"));
    assert!(svg.contains("No"));
    assert!(svg.contains("<polygon"));
}

#[test]
fn class_fixture_renders_empty_compartments() {
    let svg = render_fixture("class.json", DiagramType::Class);
    assert!(svg.contains("AuditLog"));
    assert!(svg.contains("login()"));
}

#[test]
fn rendering_twice_is_byte_identical() {
    let first = render_fixture("sequence.json", DiagramType::Sequence);
    let second = render_fixture("sequence.json", DiagramType::Sequence);
    assert_eq!(first, second);
}

#[cfg(feature = "png")]
#[test]
fn png_output_is_non_empty() {
    use umlgen::config::Config;
    use umlgen::render::write_png;

    let svg = render_fixture("use_case.json", DiagramType::UseCase);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("use_case_diagram.png");
    write_png(&svg, &path, &Config::default().render).unwrap();
    let metadata = std::fs::metadata(&path).unwrap();
    assert!(metadata.len() > 0);
}

#[cfg(feature = "png")]
#[test]
fn download_uri_wraps_png_bytes() {
    use umlgen::config::Config;
    use umlgen::render::{png_data_uri, write_png};

    let svg = render_fixture("class.json", DiagramType::Class);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("class_diagram.png");
    write_png(&svg, &path, &Config::default().render).unwrap();
    let uri = png_data_uri(&path).unwrap();
    assert!(uri.starts_with("data:image/png;base64,"));
    assert!(uri.len() > 100);
}
