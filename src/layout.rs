//! Positions the graph description: measures labels, sizes nodes by shape,
//! ranks them with dagre, and routes edges as straight segments clipped to
//! node borders. Pure with respect to its inputs.

use crate::config::LayoutConfig;
use crate::ir::{Direction, EdgeStyle, Graph, NodeShape};
use crate::theme::Theme;
use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct NodeLayout {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub label: TextBlock,
    /// Measured record compartments; empty unless the shape is `Record`.
    pub sections: Vec<TextBlock>,
    pub shape: NodeShape,
}

impl NodeLayout {
    fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone)]
pub struct EdgeLayout {
    pub from: String,
    pub to: String,
    pub label: Option<TextBlock>,
    pub points: Vec<(f32, f32)>,
    pub directed: bool,
    pub style: EdgeStyle,
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub nodes: BTreeMap<String, NodeLayout>,
    pub edges: Vec<EdgeLayout>,
    pub width: f32,
    pub height: f32,
}

pub fn compute_layout(graph: &Graph, theme: &Theme, config: &LayoutConfig) -> Layout {
    let mut nodes = BTreeMap::new();

    for id in &graph.order {
        let Some(node) = graph.nodes.get(id) else {
            continue;
        };
        let label = measure_label(&node.label, theme, config);
        let sections = node
            .sections
            .iter()
            .map(|lines| measure_section(lines, theme, config))
            .collect::<Vec<_>>();
        let (width, height) = shape_size(node.shape, &label, &sections, config);
        nodes.insert(
            id.clone(),
            NodeLayout {
                id: id.clone(),
                x: 0.0,
                y: 0.0,
                width,
                height,
                label,
                sections,
                shape: node.shape,
            },
        );
    }

    assign_positions(graph, &mut nodes, config);

    let edges = route_edges(graph, &nodes, theme, config);

    let mut width = 0.0f32;
    let mut height = 0.0f32;
    for node in nodes.values() {
        width = width.max(node.x + node.width);
        height = height.max(node.y + node.height);
    }
    for edge in &edges {
        for (x, y) in &edge.points {
            width = width.max(*x);
            height = height.max(*y);
        }
    }

    Layout {
        nodes,
        edges,
        width: width + config.margin,
        height: height + config.margin,
    }
}

fn assign_positions(graph: &Graph, nodes: &mut BTreeMap<String, NodeLayout>, config: &LayoutConfig) {
    if nodes.is_empty() {
        return;
    }

    let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
        DagreGraph::new(Some(GraphOption {
            directed: Some(true),
            multigraph: Some(false),
            compound: Some(false),
        }));

    let mut graph_config = DagreConfig::default();
    graph_config.rankdir = Some(rankdir(graph.direction).to_string());
    graph_config.nodesep = Some(config.node_spacing);
    graph_config.ranksep = Some(config.rank_spacing);
    graph_config.marginx = Some(config.margin);
    graph_config.marginy = Some(config.margin);
    dagre_graph.set_graph(graph_config);

    for (order, id) in graph.order.iter().enumerate() {
        let Some(layout) = nodes.get(id) else {
            continue;
        };
        let mut node = DagreNode::default();
        node.width = layout.width;
        node.height = layout.height;
        node.order = Some(order);
        dagre_graph.set_node(id.clone(), Some(node));
    }

    // Dedupe on (from, to): parallel edges share one ranking constraint.
    // Self-loops are routed locally and never reach dagre.
    let mut edge_set: HashSet<(String, String)> = HashSet::new();
    for edge in &graph.edges {
        if edge.from == edge.to {
            continue;
        }
        if !nodes.contains_key(&edge.from) || !nodes.contains_key(&edge.to) {
            continue;
        }
        if !edge_set.insert((edge.from.clone(), edge.to.clone())) {
            continue;
        }
        let edge_label = DagreEdge::default();
        let _ = dagre_graph.set_edge(&edge.from, &edge.to, Some(edge_label), None);
    }

    dagre_layout::run_layout(&mut dagre_graph);

    for id in &graph.order {
        let Some(dagre_node) = dagre_graph.node(id) else {
            continue;
        };
        if let Some(node) = nodes.get_mut(id) {
            node.x = dagre_node.x - node.width / 2.0;
            node.y = dagre_node.y - node.height / 2.0;
        }
    }
}

fn route_edges(
    graph: &Graph,
    nodes: &BTreeMap<String, NodeLayout>,
    theme: &Theme,
    config: &LayoutConfig,
) -> Vec<EdgeLayout> {
    // Index parallel edges per unordered node pair so they fan out instead
    // of stacking.
    let mut pair_totals: HashMap<(String, String), usize> = HashMap::new();
    for edge in &graph.edges {
        *pair_totals.entry(pair_key(&edge.from, &edge.to)).or_insert(0) += 1;
    }
    let mut pair_seen: HashMap<(String, String), usize> = HashMap::new();

    let mut edges = Vec::with_capacity(graph.edges.len());
    for edge in &graph.edges {
        let (Some(from), Some(to)) = (nodes.get(&edge.from), nodes.get(&edge.to)) else {
            continue;
        };

        let key = pair_key(&edge.from, &edge.to);
        let index = {
            let seen = pair_seen.entry(key.clone()).or_insert(0);
            let current = *seen;
            *seen += 1;
            current
        };
        let total = pair_totals.get(&key).copied().unwrap_or(1);

        let points = if edge.from == edge.to {
            self_loop_points(from)
        } else {
            segment_points(from, to, index, total, config)
        };

        let label = edge
            .label
            .as_ref()
            .map(|text| measure_label(text, theme, config));

        edges.push(EdgeLayout {
            from: edge.from.clone(),
            to: edge.to.clone(),
            label,
            points,
            directed: edge.directed,
            style: edge.style,
        });
    }
    edges
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Straight segment between node borders, shifted perpendicular for
/// parallel edges.
fn segment_points(
    from: &NodeLayout,
    to: &NodeLayout,
    index: usize,
    total: usize,
    config: &LayoutConfig,
) -> Vec<(f32, f32)> {
    let (x1, y1) = from.center();
    let (x2, y2) = to.center();
    let dx = x2 - x1;
    let dy = y2 - y1;
    let len = (dx * dx + dy * dy).sqrt().max(f32::EPSILON);

    let offset = (index as f32 - (total as f32 - 1.0) / 2.0) * config.parallel_edge_gap;
    let (ox, oy) = (-dy / len * offset, dx / len * offset);

    let start = clip_to_border(from, dx, dy);
    let end = clip_to_border(to, -dx, -dy);
    vec![(start.0 + ox, start.1 + oy), (end.0 + ox, end.1 + oy)]
}

/// Walk from the node center along (dx, dy) until the bounding box border.
fn clip_to_border(node: &NodeLayout, dx: f32, dy: f32) -> (f32, f32) {
    let (cx, cy) = node.center();
    let half_w = node.width / 2.0;
    let half_h = node.height / 2.0;

    let tx = if dx.abs() > f32::EPSILON {
        half_w / dx.abs()
    } else {
        f32::INFINITY
    };
    let ty = if dy.abs() > f32::EPSILON {
        half_h / dy.abs()
    } else {
        f32::INFINITY
    };
    let t = tx.min(ty);
    if !t.is_finite() {
        return (cx, cy);
    }
    (cx + dx * t, cy + dy * t)
}

fn self_loop_points(node: &NodeLayout) -> Vec<(f32, f32)> {
    let (_, cy) = node.center();
    let right = node.x + node.width;
    let reach = 18.0;
    vec![
        (right, cy - 6.0),
        (right + reach, cy - 6.0),
        (right + reach, cy + 6.0),
        (right, cy + 6.0),
    ]
}

fn rankdir(direction: Direction) -> &'static str {
    match direction {
        Direction::TopDown => "tb",
        Direction::LeftRight => "lr",
    }
}

fn measure_label(text: &str, theme: &Theme, config: &LayoutConfig) -> TextBlock {
    let mut lines = Vec::new();
    for line in text.replace("\\n", "\n").split('\n') {
        lines.extend(wrap_line(line.trim(), config.max_label_width_chars));
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    block_from_lines(lines, theme, config)
}

/// Record compartments keep one entry per line and are never wrapped, so
/// attribute and method signatures stay intact.
fn measure_section(entries: &[String], theme: &Theme, config: &LayoutConfig) -> TextBlock {
    block_from_lines(entries.to_vec(), theme, config)
}

fn block_from_lines(lines: Vec<String>, theme: &Theme, config: &LayoutConfig) -> TextBlock {
    let max_len = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let approx_char_width = theme.font_size * 0.45;
    let width = max_len as f32 * approx_char_width;
    let height = lines.len().max(1) as f32 * theme.font_size * config.label_line_height;
    TextBlock {
        lines,
        width,
        height,
    }
}

fn wrap_line(line: &str, max_chars: usize) -> Vec<String> {
    if line.chars().count() <= max_chars {
        return vec![line.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if candidate.chars().count() > max_chars {
            if !current.is_empty() {
                lines.push(current.clone());
                current.clear();
            }
            current.push_str(word);
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn shape_size(
    shape: NodeShape,
    label: &TextBlock,
    sections: &[TextBlock],
    config: &LayoutConfig,
) -> (f32, f32) {
    let label_empty = label.lines.iter().all(|l| l.trim().is_empty());
    let mut width = label.width + config.node_padding_x * 2.0;
    let mut height = label.height + config.node_padding_y * 2.0;

    match shape {
        NodeShape::Diamond => {
            width *= 1.4;
            height *= 1.4;
        }
        NodeShape::Circle => {
            let size = if label_empty {
                (config.node_padding_y * 1.4).max(14.0)
            } else {
                width.max(height)
            };
            width = size;
            height = size;
        }
        NodeShape::DoubleCircle => {
            let size = if label_empty {
                (config.node_padding_y * 1.8).max(18.0)
            } else {
                width.max(height)
            };
            width = size;
            height = size;
        }
        NodeShape::RoundRect => {
            width *= 1.1;
            height *= 1.05;
        }
        NodeShape::Ellipse => {
            width *= 1.3;
            height *= 1.2;
        }
        NodeShape::Record => {
            let widest = sections
                .iter()
                .map(|s| s.width)
                .fold(label.width, f32::max);
            width = widest + config.node_padding_x;
            height = sections
                .iter()
                .map(|s| s.height + config.node_padding_y * 0.6)
                .sum::<f32>()
                .max(height);
        }
        NodeShape::Box => {}
    }

    (width, height)
}

/// Running heights of record compartments, used by the renderer to place
/// divider lines.
pub fn section_offsets(node: &NodeLayout, config: &LayoutConfig) -> Vec<f32> {
    let mut offsets = Vec::new();
    let mut cursor = 0.0;
    for section in &node.sections {
        cursor += section.height + config.node_padding_y * 0.6;
        offsets.push(cursor);
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Edge, Graph, NodeShape};

    fn small_graph() -> Graph {
        let mut graph = Graph::new(Direction::LeftRight);
        graph.add_node("a", "Alpha", NodeShape::Box);
        graph.add_node("b", "Beta", NodeShape::Box);
        graph.edges.push(Edge::arrow("a", "b", Some("go".into())));
        graph
    }

    #[test]
    fn layout_places_and_sizes_nodes() {
        let layout = compute_layout(&small_graph(), &Theme::classic(), &LayoutConfig::default());
        assert_eq!(layout.nodes.len(), 2);
        for node in layout.nodes.values() {
            assert!(node.width > 0.0 && node.height > 0.0);
        }
        assert!(layout.width > 0.0 && layout.height > 0.0);
    }

    #[test]
    fn left_right_rank_follows_edge_direction() {
        let layout = compute_layout(&small_graph(), &Theme::classic(), &LayoutConfig::default());
        assert!(layout.nodes["a"].x < layout.nodes["b"].x);
    }

    #[test]
    fn edges_get_border_clipped_points() {
        let layout = compute_layout(&small_graph(), &Theme::classic(), &LayoutConfig::default());
        assert_eq!(layout.edges.len(), 1);
        let edge = &layout.edges[0];
        assert_eq!(edge.points.len(), 2);
        // Starts at or beyond the source border, not its center.
        let a = &layout.nodes["a"];
        assert!(edge.points[0].0 >= a.x + a.width - 1.0);
    }

    #[test]
    fn parallel_edges_are_offset_apart() {
        let mut graph = small_graph();
        graph.edges.push(Edge::arrow("a", "b", Some("again".into())));
        let layout = compute_layout(&graph, &Theme::classic(), &LayoutConfig::default());
        assert_eq!(layout.edges.len(), 2);
        assert_ne!(layout.edges[0].points, layout.edges[1].points);
    }

    #[test]
    fn self_loops_route_locally() {
        let mut graph = Graph::new(Direction::TopDown);
        graph.add_node("only", "Only", NodeShape::RoundRect);
        graph.edges.push(Edge::arrow("only", "only", None));
        let layout = compute_layout(&graph, &Theme::classic(), &LayoutConfig::default());
        assert_eq!(layout.edges[0].points.len(), 4);
    }

    #[test]
    fn long_labels_wrap() {
        let theme = Theme::classic();
        let mut config = LayoutConfig::default();
        config.max_label_width_chars = 8;
        let block = measure_label("this is a long label", &theme, &config);
        assert!(block.lines.len() > 1);
    }

    #[test]
    fn empty_circle_gets_fixed_terminal_size() {
        let theme = Theme::classic();
        let config = LayoutConfig::default();
        let label = measure_label("", &theme, &config);
        let (w, h) = shape_size(NodeShape::Circle, &label, &[], &config);
        assert_eq!(w, h);
        assert!(w <= config.node_padding_y * 1.4 + 1.0);
    }
}
