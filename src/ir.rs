use std::collections::BTreeMap;

/// Rank direction handed to the layout engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    TopDown,
    LeftRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape {
    Box,
    RoundRect,
    Diamond,
    Circle,
    DoubleCircle,
    Ellipse,
    Record,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeStyle {
    Solid,
    Dashed,
    /// Participates in layout (ordering) but is never drawn.
    Invisible,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub shape: NodeShape,
    /// Compartments for `Record` nodes: name, attributes, methods. Empty
    /// for every other shape.
    pub sections: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
    pub directed: bool,
    pub style: EdgeStyle,
}

impl Edge {
    pub fn arrow(from: &str, to: &str, label: Option<String>) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            label,
            directed: true,
            style: EdgeStyle::Solid,
        }
    }
}

/// Declarative node/edge description fed to the layout and render stages.
/// Building one of these is deterministic for a given diagram record, so
/// re-rendering the same record always hands the backend identical input.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    pub direction: Direction,
    pub nodes: BTreeMap<String, Node>,
    /// Declaration order of node ids; the layout engine uses it to keep
    /// same-rank nodes in a stable left-to-right order.
    pub order: Vec<String>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            nodes: BTreeMap::new(),
            order: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn add_node(&mut self, id: &str, label: &str, shape: NodeShape) {
        if !self.nodes.contains_key(id) {
            self.order.push(id.to_string());
        }
        self.nodes.insert(
            id.to_string(),
            Node {
                id: id.to_string(),
                label: label.to_string(),
                shape,
                sections: Vec::new(),
            },
        );
    }

    pub fn add_record_node(&mut self, id: &str, sections: Vec<Vec<String>>) {
        if !self.nodes.contains_key(id) {
            self.order.push(id.to_string());
        }
        self.nodes.insert(
            id.to_string(),
            Node {
                id: id.to_string(),
                label: id.to_string(),
                shape: NodeShape::Record,
                sections,
            },
        );
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_order(&self, id: &str) -> Option<usize> {
        self.order.iter().position(|n| n == id)
    }
}
