//! Canvas rendering for the network graph.
//!
//! Draws straight from the live instance: resolved base styles, with class
//! state (faded, superseded, selected, label-hidden) layered on top at draw
//! time. Passes, in z-order:
//! 1. Background (screen space)
//! 2. Edges, selected edges last (world space)
//! 3. Nodes, then selection rings and labels on top

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::instance::{Class, GraphInstance, NodeElement};
use super::prepare::RenderNode;
use super::style::{self, Shape, Theme};
use super::types::NodeType;
use super::zoom::ScaledValues;

/// Dash pattern for ortholog edges, in screen pixels.
const DASH: (f64, f64) = (6.0, 4.0);

/// Renders the complete graph to the canvas.
pub fn render(
	instance: &GraphInstance,
	ctx: &CanvasRenderingContext2d,
	theme: &Theme,
	show_orthologs: bool,
) {
	let container = instance.container();
	let t = &instance.transform;
	let scale = ScaledValues::new(t.k);

	ctx.set_fill_style_str(&theme.background.to_css());
	ctx.fill_rect(0.0, 0.0, container.width, container.height);

	ctx.save();
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);

	draw_edges(instance, ctx, &scale, theme);
	draw_nodes(instance, ctx, &scale, theme, show_orthologs);

	ctx.restore();
}

fn draw_edges(
	instance: &GraphInstance,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
) {
	let nodes = instance.nodes();
	let (selected, plain): (Vec<_>, Vec<_>) = instance
		.edges()
		.iter()
		.partition(|edge| edge.classes.contains(Class::Selected));

	for edge in plain.into_iter().chain(selected) {
		let a = nodes[edge.source].position;
		let b = nodes[edge.target].position;
		if a.distance(&b) < 0.001 {
			continue;
		}

		let color = if edge.classes.contains(Class::Selected) {
			theme.selected_edge
		} else {
			edge.style.color
		};
		ctx.set_global_alpha(style::edge_opacity(&edge.classes, theme));
		ctx.set_stroke_style_str(&color.to_css());
		ctx.set_line_width(edge.style.width.max(1.0 / scale.k));
		if edge.style.dashed {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(DASH.0 / scale.k),
				&JsValue::from_f64(DASH.1 / scale.k),
			));
		} else {
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}

		ctx.begin_path();
		ctx.move_to(a.x, a.y);
		ctx.line_to(b.x, b.y);
		ctx.stroke();
	}

	let _ = ctx.set_line_dash(&js_sys::Array::new());
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(
	instance: &GraphInstance,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
	show_orthologs: bool,
) {
	for node in instance.nodes() {
		draw_node(ctx, node, scale, theme);
	}

	// Rings and labels sit above every node body.
	ctx.set_font(&scale.label_font);
	for node in instance.nodes() {
		let (x, y) = (node.position.x, node.position.y);
		let radius = node_radius(node, scale);
		let alpha = style::node_opacity(&node.classes, theme);

		if node.classes.contains(Class::Selected) {
			ctx.set_global_alpha(alpha);
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + scale.ring_offset, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(&theme.selected_ring.to_css());
			ctx.set_line_width(scale.ring_width);
			ctx.stroke();
		}

		if !node.classes.contains(Class::LabelHidden) {
			ctx.set_global_alpha(alpha);
			ctx.set_fill_style_str(&theme.label.to_css());
			let text = label_text(&node.data, show_orthologs);
			let _ = ctx.fill_text(&text, x + radius + scale.label_offset, y + 3.0 / scale.k);
		}
	}
	ctx.set_global_alpha(1.0);
}

fn node_radius(node: &NodeElement, scale: &ScaledValues) -> f64 {
	(node.style.size / 2.0).max(scale.node_min_size / 2.0)
}

fn draw_node(
	ctx: &CanvasRenderingContext2d,
	node: &NodeElement,
	scale: &ScaledValues,
	theme: &Theme,
) {
	let (x, y) = (node.position.x, node.position.y);
	let radius = node_radius(node, scale);

	ctx.set_global_alpha(style::node_opacity(&node.classes, theme));
	ctx.begin_path();
	match node.style.shape {
		Shape::Circle => {
			let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		}
		Shape::Diamond => {
			ctx.move_to(x, y - radius);
			ctx.line_to(x + radius, y);
			ctx.line_to(x, y + radius);
			ctx.line_to(x - radius, y);
			ctx.close_path();
		}
	}
	ctx.set_fill_style_str(&node.style.fill.to_css());
	ctx.fill();

	ctx.set_stroke_style_str(&node.style.fill.lighten(0.35).to_css());
	ctx.set_line_width(1.0 / scale.k);
	ctx.stroke();
	ctx.set_global_alpha(1.0);
}

/// Label drawn next to a node. With the ortholog overlay on, primary nodes
/// that have orthologs carry their count.
pub fn label_text(node: &RenderNode, show_orthologs: bool) -> String {
	let hint = show_orthologs
		&& node.node_type == NodeType::Primary
		&& node.has_orthologs
		&& node.ortholog_count > 0;
	if hint {
		format!("{} ({})", node.label, node.ortholog_count)
	} else {
		node.label.clone()
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;
	use crate::components::network_graph::positions::PositionCache;
	use crate::components::network_graph::prepare::prepare_nodes;
	use crate::components::network_graph::types::GraphNode;

	#[test]
	fn ortholog_count_follows_overlay() {
		let mut with = GraphNode::new("b0001");
		with.display_label = Some("dnaK".into());
		with.ortholog_count = Some(4);
		let without = GraphNode::new("b0002");

		let nodes = prepare_nodes(&[with, without], &HashSet::new(), &PositionCache::default(), false);
		assert_eq!(label_text(&nodes[0], true), "dnaK (4)");
		assert_eq!(label_text(&nodes[0], false), "dnaK");
		assert_eq!(label_text(&nodes[1], true), "b0002");
	}
}
