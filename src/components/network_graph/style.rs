//! Visual encoding of nodes and edges.
//!
//! Base styles are a pure function of an element and the current view flags.
//! Selection, fading and superseded state are classes applied on top at draw
//! time (see [`node_opacity`] and [`edge_opacity`]), so toggling them never
//! recomputes this table.

use super::instance::{Class, ClassSet};
use super::prepare::{RenderEdge, RenderNode};
use super::types::{EdgeType, GraphEdge, NodeType, ViewMode};

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
	/// Alpha, 0.0 to 1.0.
	pub a: f64,
}

impl Color {
	/// Opaque color from RGB components.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Color with explicit alpha.
	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Same color with alpha replaced.
	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Lighten the color by a factor (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 + (255.0 - self.r as f64) * f) as u8,
			g: (self.g as f64 + (255.0 - self.g as f64) * f) as u8,
			b: (self.b as f64 + (255.0 - self.b as f64) * f) as u8,
			a: self.a,
		}
	}

	/// CSS color string: hex when opaque, `rgba()` otherwise.
	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Node outline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Shape {
	/// Primary genes.
	#[default]
	Circle,
	/// Orthologs.
	Diamond,
}

/// Base visual attributes of a node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeStyle {
	/// Fill color.
	pub fill: Color,
	/// Outline shape.
	pub shape: Shape,
	/// Diameter in world units.
	pub size: f64,
}

impl Default for NodeStyle {
	fn default() -> Self {
		Self {
			fill: Color::rgb(128, 128, 128),
			shape: Shape::Circle,
			size: 20.0,
		}
	}
}

/// Base visual attributes of an edge.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeStyle {
	/// Stroke color.
	pub color: Color,
	/// Stroke width in world units.
	pub width: f64,
	/// Drawn with a dash pattern.
	pub dashed: bool,
}

impl Default for EdgeStyle {
	fn default() -> Self {
		Self {
			color: Color::rgb(128, 128, 128),
			width: 1.0,
			dashed: false,
		}
	}
}

/// Observed weight span, used to normalize edge widths.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreRange {
	/// Smallest positive weight.
	pub min: f64,
	/// Largest positive weight.
	pub max: f64,
}

impl Default for ScoreRange {
	fn default() -> Self {
		Self { min: 0.0, max: 1.0 }
	}
}

impl ScoreRange {
	/// Derives the range from the positive weights of an edge set.
	///
	/// No positive weights gives `{0, 1}`; a single distinct value `v` gives
	/// `{0.9v, 1.1v}`.
	pub fn from_edges(edges: &[GraphEdge]) -> Self {
		Self::from_weights(edges.iter().filter_map(|e| e.weight))
	}

	/// Same as [`ScoreRange::from_edges`], over raw weights.
	pub fn from_weights(weights: impl IntoIterator<Item = f64>) -> Self {
		let (min, max) = weights
			.into_iter()
			.filter(|w| w.is_finite() && *w > 0.0)
			.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), w| {
				(lo.min(w), hi.max(w))
			});

		if !min.is_finite() {
			Self::default()
		} else if max - min < f64::EPSILON * max {
			Self {
				min: min * 0.9,
				max: max * 1.1,
			}
		} else {
			Self { min, max }
		}
	}
}

/// View state that affects base styles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewFlags {
	/// Ortholog overlay toggle.
	pub show_orthologs: bool,
	/// Weight span for edge widths.
	pub score_range: ScoreRange,
	/// Current layout family.
	pub view_mode: ViewMode,
}

impl Default for ViewFlags {
	fn default() -> Self {
		Self {
			show_orthologs: false,
			score_range: ScoreRange::default(),
			view_mode: ViewMode::Focused,
		}
	}
}

/// Colors, sizes and class overlays.
#[derive(Clone, Debug)]
pub struct Theme {
	/// Canvas fill.
	pub background: Color,
	/// Primary genes.
	pub primary_fill: Color,
	/// Primary genes that have orthologs, when the overlay is on.
	pub has_orthologs_fill: Color,
	/// Ortholog nodes.
	pub ortholog_fill: Color,
	/// Primary node diameter.
	pub node_size: f64,
	/// Ortholog node diameter.
	pub ortholog_size: f64,
	/// Node size multiplier in the global overview.
	pub global_size_factor: f64,
	/// Interaction edges.
	pub primary_edge: Color,
	/// Ortholog links.
	pub ortholog_edge: Color,
	/// Stroke of the selected edge.
	pub selected_edge: Color,
	/// Ring around the selected node.
	pub selected_ring: Color,
	/// Label text.
	pub label: Color,
	/// Narrowest edge stroke.
	pub edge_min_width: f64,
	/// Widest edge stroke.
	pub edge_max_width: f64,
	/// Opacity of faded elements.
	pub faded_opacity: f64,
	/// Opacity of superseded elements.
	pub superseded_opacity: f64,
}

impl Default for Theme {
	fn default() -> Self {
		Self {
			background: Color::rgb(250, 250, 252),
			primary_fill: Color::rgb(52, 120, 190),
			has_orthologs_fill: Color::rgb(46, 150, 110),
			ortholog_fill: Color::rgb(230, 140, 40),
			node_size: 22.0,
			ortholog_size: 14.0,
			global_size_factor: 0.7,
			primary_edge: Color::rgb(150, 160, 175),
			ortholog_edge: Color::rgb(230, 140, 40),
			selected_edge: Color::rgb(220, 50, 60),
			selected_ring: Color::rgb(220, 50, 60),
			label: Color::rgb(40, 44, 52),
			edge_min_width: 1.0,
			edge_max_width: 8.0,
			faded_opacity: 0.15,
			superseded_opacity: 0.35,
		}
	}
}

/// Base style of a node under the current view flags.
pub fn resolve_node_style(node: &RenderNode, flags: &ViewFlags, theme: &Theme) -> NodeStyle {
	let (fill, shape, size) = match node.node_type {
		NodeType::Ortholog => (theme.ortholog_fill, Shape::Diamond, theme.ortholog_size),
		NodeType::Primary if flags.show_orthologs && node.has_orthologs => {
			(theme.has_orthologs_fill, Shape::Circle, theme.node_size)
		}
		NodeType::Primary => (theme.primary_fill, Shape::Circle, theme.node_size),
	};
	let size = match flags.view_mode {
		ViewMode::Global => size * theme.global_size_factor,
		ViewMode::Focused => size,
	};
	NodeStyle { fill, shape, size }
}

/// Base style of an edge under the current view flags.
pub fn resolve_edge_style(edge: &RenderEdge, flags: &ViewFlags, theme: &Theme) -> EdgeStyle {
	let (color, dashed) = match edge.edge_type {
		EdgeType::Ortholog => (theme.ortholog_edge, true),
		EdgeType::Primary => (theme.primary_edge, false),
	};
	EdgeStyle {
		color,
		width: edge_width(edge.weight, &flags.score_range, theme),
		dashed,
	}
}

/// Width grows with the square root of the weight, bounded by the theme.
///
/// The scale maps the top of the score range to the maximum width.
pub fn edge_width(weight: f64, range: &ScoreRange, theme: &Theme) -> f64 {
	let scale = theme.edge_max_width / range.max.max(0.01).sqrt();
	(weight.max(0.01).sqrt() * scale).clamp(theme.edge_min_width, theme.edge_max_width)
}

/// Opacity implied by a node's classes.
pub fn node_opacity(classes: &ClassSet, theme: &Theme) -> f64 {
	class_opacity(classes, theme)
}

/// Opacity implied by an edge's classes. A selected edge is always opaque.
pub fn edge_opacity(classes: &ClassSet, theme: &Theme) -> f64 {
	if classes.contains(Class::Selected) {
		return 1.0;
	}
	class_opacity(classes, theme)
}

fn class_opacity(classes: &ClassSet, theme: &Theme) -> f64 {
	let mut opacity: f64 = 1.0;
	if classes.contains(Class::Faded) {
		opacity = opacity.min(theme.faded_opacity);
	}
	if classes.contains(Class::Superseded) {
		opacity = opacity.min(theme.superseded_opacity);
	}
	opacity
}
