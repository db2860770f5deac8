//! Layout configuration.
//!
//! `LayoutOptions` is an immutable value handed to every stage; nothing here is mutated during a
//! layout call. Per-call scale and margin state lives in [`crate::breadth::LayoutState`].

use serde::{Deserialize, Serialize};

/// Radius added to every circular link arc on top of half the link width.
pub const BASE_RADIUS: f64 = 10.0;
/// Distance between the outermost node edge and a circular link's vertical extent.
pub const VERTICAL_MARGIN: f64 = 25.0;
/// Horizontal run a circular link takes out of (and into) a node before it starts to arc.
pub const NODE_BUFFER: f64 = 5.0;
/// Damping applied to the vertical scale so arcs have room to curve.
pub const SCALE_DAMPING: f64 = 0.3;
/// Number of link sort / node nudge rounds after node placement.
pub const LINK_SORTING_ITERATIONS: usize = 4;
/// Extra clearance when a node is nudged off a link passing through its column.
pub const OVERLAP_CLEARANCE: f64 = 10.0;
/// Per-pass decay of the relaxation step size.
pub const ALPHA_DECAY: f64 = 0.99;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Extent {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn mid_y(&self) -> f64 {
        (self.y0 + self.y1) / 2.0
    }
}

impl Default for Extent {
    fn default() -> Self {
        Self::from_size(600.0, 400.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodePadding {
    /// Fixed vertical gap between stacked nodes.
    Fixed(f64),
    /// Gap derived from the extent height: `height * ratio / (count + 1)`, minimised over columns.
    Ratio(f64),
}

impl Default for NodePadding {
    fn default() -> Self {
        NodePadding::Fixed(8.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeAlign {
    Left,
    Right,
    #[default]
    Justify,
    Center,
}

impl std::str::FromStr for NodeAlign {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "justify" => Ok(Self::Justify),
            "center" => Ok(Self::Center),
            other => Err(format!("unknown node alignment: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutOptions {
    pub node_width: f64,
    pub node_padding: NodePadding,
    pub extent: Extent,
    /// Relaxation passes over node breadths.
    pub iterations: usize,
    /// Gap between stacked circular links sharing a detour lane.
    pub circular_link_gap: f64,
    pub align: NodeAlign,
    /// Classify circular links by node rank instead of searching for circuits.
    pub sort_nodes: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            node_width: 24.0,
            node_padding: NodePadding::default(),
            extent: Extent::default(),
            iterations: 32,
            circular_link_gap: 2.0,
            align: NodeAlign::Justify,
            sort_nodes: false,
        }
    }
}

impl LayoutOptions {
    pub fn from_json_str(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
