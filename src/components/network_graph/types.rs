//! Domain data handed to the network viewer by the portal.
//!
//! These types mirror the JSON the gene/interaction services return. The
//! engine treats them as read-only: it copies what it needs into its own
//! render elements and hands the originals back through click callbacks.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Semantic class of a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
	/// A gene of the focal genome.
	#[default]
	Primary,
	/// An ortholog overlaid from another genome.
	Ortholog,
}

/// Semantic class of an edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
	/// A protein-protein interaction.
	#[default]
	Primary,
	/// A link between a gene and one of its orthologs.
	Ortholog,
}

/// Which layout family the viewer uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
	/// Neighborhood of the genes the user is exploring.
	#[default]
	Focused,
	/// Overview of the whole network.
	Global,
}

/// A point in graph (world) coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Position {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

impl Position {
	/// Creates a position.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean distance to another point.
	pub fn distance(&self, other: &Position) -> f64 {
		let (dx, dy) = (self.x - other.x, self.y - other.y);
		(dx * dx + dy * dy).sqrt()
	}
}

/// A gene (or ortholog) in the interaction network.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
	/// Unique within one rendered graph.
	pub id: String,
	/// Missing means primary.
	#[serde(rename = "type", default)]
	pub node_type: Option<NodeType>,
	/// Declared position. `None` lets the layout decide.
	#[serde(default)]
	pub position: Option<Position>,
	/// Preferred label.
	#[serde(default)]
	pub display_label: Option<String>,
	/// Label used when there is no display label.
	#[serde(default)]
	pub locus_tag: Option<String>,
	/// Number of known orthologs.
	#[serde(default)]
	pub ortholog_count: Option<u32>,
	/// Derived from `ortholog_count` when missing.
	#[serde(default)]
	pub has_orthologs: Option<bool>,
	/// 0 for the root or unexpanded nodes.
	#[serde(default)]
	pub expansion_level: Option<u32>,
	/// Remaining domain attributes, passed back untouched in callbacks.
	#[serde(flatten)]
	pub attributes: Map<String, Value>,
}

impl GraphNode {
	/// Shorthand for a plain primary node.
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			..Default::default()
		}
	}

	/// Builder-style setter for the expansion level.
	pub fn with_level(mut self, level: u32) -> Self {
		self.expansion_level = Some(level);
		self
	}
}

/// An interaction (or orthology link) between two nodes.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
	/// Missing or duplicate ids are replaced during preparation.
	#[serde(default)]
	pub id: Option<String>,
	/// Source node id.
	pub source: String,
	/// Target node id.
	pub target: String,
	/// Interaction score. Non-positive or missing values render as weight 1.
	#[serde(default)]
	pub weight: Option<f64>,
	/// Missing means primary.
	#[serde(rename = "type", default)]
	pub edge_type: Option<EdgeType>,
	/// Free-form orthology relation, such as `one2many`.
	#[serde(default)]
	pub orthology_type: Option<String>,
	/// Level the edge was added at. Defaults to the larger endpoint level.
	#[serde(default)]
	pub expansion_level: Option<u32>,
	/// Remaining domain attributes, passed back untouched in callbacks.
	#[serde(flatten)]
	pub attributes: Map<String, Value>,
}

impl GraphEdge {
	/// Shorthand for a weighted primary edge.
	pub fn new(source: impl Into<String>, target: impl Into<String>, weight: f64) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			weight: Some(weight),
			..Default::default()
		}
	}
}

/// One step of the user's expansion history.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpansionPathEntry {
	/// Id of the expanded node.
	pub node_id: String,
}

/// Everything the viewer consumes from its parent for one render.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphProps {
	/// Nodes to draw.
	pub nodes: Vec<GraphNode>,
	/// Edges to draw.
	pub edges: Vec<GraphEdge>,
	/// Ortholog overlay toggle.
	pub show_orthologs: bool,
	/// Layout family.
	pub view_mode: ViewMode,
	/// Newest expansion level. Older levels off the path are faded.
	pub current_expansion_level: u32,
	/// Expanded nodes, oldest first.
	pub expansion_path: Vec<ExpansionPathEntry>,
	/// Id of the node the parent considers selected.
	pub selected_node: Option<String>,
}
