use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub background: String,
    pub node_fill: String,
    pub node_border: String,
    pub text_color: String,
    pub line_color: String,
    pub edge_label_background: String,
    /// Rounded activity rectangles.
    pub activity_fill: String,
    /// Decision diamonds.
    pub decision_fill: String,
    /// Start and final pseudo-nodes.
    pub terminal_fill: String,
    /// Use case ellipses.
    pub ellipse_fill: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "Helvetica, Arial, sans-serif".to_string(),
            font_size: 13.0,
            background: "#FFFFFF".to_string(),
            node_fill: "#FFFFFF".to_string(),
            node_border: "#333333".to_string(),
            text_color: "#1C2430".to_string(),
            line_color: "#333333".to_string(),
            edge_label_background: "#FFFFFF".to_string(),
            activity_fill: "#BBDEFB".to_string(),
            decision_fill: "#D3D3D3".to_string(),
            terminal_fill: "#000000".to_string(),
            ellipse_fill: "#F8FAFF".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
