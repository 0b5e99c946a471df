use crate::config::LayoutConfig;
#[cfg(feature = "png")]
use crate::config::RenderConfig;
use crate::error::Error;
use crate::ir::{EdgeStyle, NodeShape};
use crate::layout::{section_offsets, EdgeLayout, Layout, NodeLayout, TextBlock};
use crate::theme::Theme;
use base64::Engine;
use std::path::Path;

/// Suggested filename for the download artifact.
pub const DOWNLOAD_FILE_NAME: &str = "uml_diagram.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Svg,
    Png,
}

impl serde::Serialize for ImageFormat {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.extension())
    }
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Svg => "svg",
            ImageFormat::Png => "png",
        }
    }
}

/// Serialize a computed layout to SVG. Pure: equal layouts produce
/// byte-identical markup.
pub fn render_svg(layout: &Layout, theme: &Theme, config: &LayoutConfig) -> String {
    let mut svg = String::new();
    let width = layout.width.max(200.0);
    let height = layout.height.max(200.0);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker>",
        theme.line_color
    ));
    svg.push_str("</defs>");

    for edge in &layout.edges {
        if edge.style == EdgeStyle::Invisible {
            continue;
        }
        svg.push_str(&edge_svg(edge, theme));
        if let Some(label) = &edge.label {
            let (x, y) = edge_midpoint(edge);
            let rect_x = x - label.width / 2.0 - 6.0;
            let rect_y = y - label.height / 2.0 - 4.0;
            svg.push_str(&format!(
                "<rect x=\"{rect_x:.2}\" y=\"{rect_y:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"6\" ry=\"6\" fill=\"{}\" stroke=\"{}\" stroke-width=\"0.8\"/>",
                label.width + 12.0,
                label.height + 8.0,
                theme.edge_label_background,
                theme.node_border
            ));
            svg.push_str(&text_block_svg(x, y, label, theme, config));
        }
    }

    for node in layout.nodes.values() {
        svg.push_str(&node_svg(node, theme, config));
    }

    svg.push_str("</svg>");
    svg
}

fn edge_svg(edge: &EdgeLayout, theme: &Theme) -> String {
    let d = points_to_path(&edge.points);
    let marker = if edge.directed {
        " marker-end=\"url(#arrow)\""
    } else {
        ""
    };
    let dasharray = if edge.style == EdgeStyle::Dashed {
        " stroke-dasharray=\"6 4\""
    } else {
        ""
    };
    format!(
        "<path d=\"{d}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.4\"{dasharray}{marker}/>",
        theme.line_color
    )
}

fn node_svg(node: &NodeLayout, theme: &Theme, config: &LayoutConfig) -> String {
    let mut svg = String::new();
    let (cx, cy) = (node.x + node.width / 2.0, node.y + node.height / 2.0);

    match node.shape {
        NodeShape::Box => {
            svg.push_str(&format!(
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.4\"/>",
                node.x, node.y, node.width, node.height, theme.node_fill, theme.node_border
            ));
            svg.push_str(&text_block_svg(cx, cy, &node.label, theme, config));
        }
        NodeShape::RoundRect => {
            svg.push_str(&format!(
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"10\" ry=\"10\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.4\"/>",
                node.x, node.y, node.width, node.height, theme.activity_fill, theme.node_border
            ));
            svg.push_str(&text_block_svg(cx, cy, &node.label, theme, config));
        }
        NodeShape::Diamond => {
            svg.push_str(&format!(
                "<polygon points=\"{:.2},{:.2} {:.2},{:.2} {:.2},{:.2} {:.2},{:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.4\"/>",
                cx,
                node.y,
                node.x + node.width,
                cy,
                cx,
                node.y + node.height,
                node.x,
                cy,
                theme.decision_fill,
                theme.node_border
            ));
            svg.push_str(&text_block_svg(cx, cy, &node.label, theme, config));
        }
        NodeShape::Circle => {
            svg.push_str(&format!(
                "<circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{:.2}\" fill=\"{}\" stroke=\"{}\"/>",
                node.width / 2.0,
                theme.terminal_fill,
                theme.node_border
            ));
        }
        NodeShape::DoubleCircle => {
            let r = node.width / 2.0;
            svg.push_str(&format!(
                "<circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{r:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.4\"/>",
                theme.node_border
            ));
            svg.push_str(&format!(
                "<circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{:.2}\" fill=\"{}\" stroke=\"none\"/>",
                (r - 3.5).max(2.0),
                theme.terminal_fill
            ));
        }
        NodeShape::Ellipse => {
            svg.push_str(&format!(
                "<ellipse cx=\"{cx:.2}\" cy=\"{cy:.2}\" rx=\"{:.2}\" ry=\"{:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.4\"/>",
                node.width / 2.0,
                node.height / 2.0,
                theme.ellipse_fill,
                theme.node_border
            ));
            svg.push_str(&text_block_svg(cx, cy, &node.label, theme, config));
        }
        NodeShape::Record => {
            svg.push_str(&record_svg(node, theme, config));
        }
    }

    svg
}

/// Record node: outer rect, divider lines between compartments, name
/// centered in the first compartment, entries left-aligned below. Empty
/// compartments keep their slot.
fn record_svg(node: &NodeLayout, theme: &Theme, config: &LayoutConfig) -> String {
    let mut svg = String::new();
    svg.push_str(&format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.4\"/>",
        node.x, node.y, node.width, node.height, theme.node_fill, theme.node_border
    ));

    let offsets = section_offsets(node, config);
    for offset in offsets.iter().take(node.sections.len().saturating_sub(1)) {
        let y = node.y + offset;
        svg.push_str(&format!(
            "<line x1=\"{:.2}\" y1=\"{y:.2}\" x2=\"{:.2}\" y2=\"{y:.2}\" stroke=\"{}\" stroke-width=\"1.0\"/>",
            node.x,
            node.x + node.width,
            theme.node_border
        ));
    }

    let mut section_top = node.y;
    for (idx, section) in node.sections.iter().enumerate() {
        let slot = section.height + config.node_padding_y * 0.6;
        if idx == 0 {
            // Name compartment, centered.
            let cx = node.x + node.width / 2.0;
            let cy = section_top + slot / 2.0;
            svg.push_str(&text_block_svg(cx, cy, section, theme, config));
        } else {
            let x = node.x + 6.0;
            let mut line_y = section_top + theme.font_size;
            for line in &section.lines {
                svg.push_str(&format!(
                    "<text x=\"{x:.2}\" y=\"{line_y:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
                    theme.font_family,
                    theme.font_size,
                    theme.text_color,
                    escape_xml(line)
                ));
                line_y += theme.font_size * config.label_line_height;
            }
        }
        section_top += slot;
    }

    svg
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    if points.is_empty() {
        return String::new();
    }
    let mut d = String::new();
    d.push_str(&format!("M {:.2} {:.2}", points[0].0, points[0].1));
    for point in points.iter().skip(1) {
        d.push_str(&format!(" L {:.2} {:.2}", point.0, point.1));
    }
    d
}

fn text_block_svg(x: f32, y: f32, label: &TextBlock, theme: &Theme, config: &LayoutConfig) -> String {
    let total_height = label.lines.len() as f32 * theme.font_size * config.label_line_height;
    let start_y = y - total_height / 2.0 + theme.font_size;
    let mut text = String::new();

    text.push_str(&format!(
        "<text x=\"{x:.2}\" y=\"{start_y:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">",
        theme.font_family, theme.font_size, theme.text_color
    ));
    for (idx, line) in label.lines.iter().enumerate() {
        let dy = if idx == 0 {
            0.0
        } else {
            theme.font_size * config.label_line_height
        };
        text.push_str(&format!(
            "<tspan x=\"{x:.2}\" dy=\"{dy:.2}\">{}</tspan>",
            escape_xml(line)
        ));
    }
    text.push_str("</text>");
    text
}

fn edge_midpoint(edge: &EdgeLayout) -> (f32, f32) {
    if edge.points.len() >= 4 {
        let p1 = edge.points[1];
        let p2 = edge.points[2];
        ((p1.0 + p2.0) / 2.0, (p1.1 + p2.1) / 2.0)
    } else if edge.points.len() >= 2 {
        let p1 = edge.points[0];
        let p2 = edge.points[edge.points.len() - 1];
        ((p1.0 + p2.0) / 2.0, (p1.1 + p2.1) / 2.0)
    } else {
        (0.0, 0.0)
    }
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

pub fn write_svg(svg: &str, path: &Path) -> Result<(), Error> {
    std::fs::write(path, svg)?;
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_png(svg: &str, path: &Path, render_cfg: &RenderConfig) -> Result<(), Error> {
    let mut opt = usvg::Options::default();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .unwrap_or(usvg::Size::from_wh(800.0, 600.0).unwrap());

    let tree = usvg::Tree::from_str(svg, &opt)
        .map_err(|e| Error::Render(format!("svg rasterization failed: {e}")))?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| Error::Render("failed to allocate pixmap".to_string()))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap
        .save_png(path)
        .map_err(|e| Error::Render(format!("png write failed: {e}")))?;
    Ok(())
}

/// Base64 data URI of a rendered PNG, for the download action.
pub fn png_data_uri(path: &Path) -> Result<String, Error> {
    let bytes = std::fs::read(path)?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:image/png;base64,{encoded}"))
}
