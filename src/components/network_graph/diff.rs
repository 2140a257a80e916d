//! Decides whether a render keeps the live instance or rebuilds it.
//!
//! Structural identity is captured in a [`RenderKey`]: order-independent
//! fingerprints of the node id set and the (source, target) edge set. Anything
//! else (positions, selection, fading, styling flags) never forces a rebuild.

use super::types::{GraphEdge, GraphNode, ViewMode};

/// Fingerprint of one render's structure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderKey {
	/// Layout family.
	pub view_mode: ViewMode,
	/// Sorted node ids.
	pub node_key: String,
	/// Sorted `source->target` pairs.
	pub edge_key: String,
	/// Number of nodes.
	pub node_count: usize,
	/// Number of edges.
	pub edge_count: usize,
}

impl RenderKey {
	/// Fingerprints a node and edge set under a view mode.
	pub fn new(nodes: &[GraphNode], edges: &[GraphEdge], view_mode: ViewMode) -> Self {
		let mut node_ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
		node_ids.sort_unstable();

		let mut edge_ids: Vec<String> = edges
			.iter()
			.map(|e| format!("{}->{}", e.source, e.target))
			.collect();
		edge_ids.sort_unstable();

		Self {
			view_mode,
			node_key: node_ids.join("|"),
			edge_key: edge_ids.join("|"),
			node_count: nodes.len(),
			edge_count: edges.len(),
		}
	}
}

/// Outcome of comparing the previous and next keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RebuildDecision {
	/// Keep the live instance; apply non-structural updates only.
	Keep,
	/// Destroy the live instance (if any) and build a new one.
	Rebuild,
	/// The node set is empty: destroy and show no graph.
	Teardown,
}

/// Compares keys. A missing instance always rebuilds, and an empty edge set alone never does.
pub fn decide(previous: Option<&RenderKey>, next: &RenderKey, has_instance: bool) -> RebuildDecision {
	if next.node_count == 0 {
		return RebuildDecision::Teardown;
	}
	let Some(previous) = previous.filter(|_| has_instance) else {
		return RebuildDecision::Rebuild;
	};

	let view_changed = previous.view_mode != next.view_mode;
	let nodes_changed = previous.node_key != next.node_key;
	let edges_changed = previous.edge_key != next.edge_key && next.edge_count > 0;

	if view_changed || nodes_changed || edges_changed {
		RebuildDecision::Rebuild
	} else {
		RebuildDecision::Keep
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn nodes(ids: &[&str]) -> Vec<GraphNode> {
		ids.iter().map(|id| GraphNode::new(*id)).collect()
	}

	fn edges(pairs: &[(&str, &str)]) -> Vec<GraphEdge> {
		pairs.iter().map(|(s, t)| GraphEdge::new(*s, *t, 1.0)).collect()
	}

	fn key(ids: &[&str], pairs: &[(&str, &str)], mode: ViewMode) -> RenderKey {
		RenderKey::new(&nodes(ids), &edges(pairs), mode)
	}

	#[test]
	fn reordering_does_not_change_key() {
		let a = key(&["a", "b", "c"], &[("a", "b"), ("b", "c")], ViewMode::Focused);
		let b = key(&["c", "a", "b"], &[("b", "c"), ("a", "b")], ViewMode::Focused);
		assert_eq!(a, b);
		assert_eq!(decide(Some(&a), &b, true), RebuildDecision::Keep);
	}

	#[test]
	fn missing_instance_always_rebuilds() {
		let a = key(&["a"], &[], ViewMode::Focused);
		assert_eq!(decide(Some(&a), &a, false), RebuildDecision::Rebuild);
		assert_eq!(decide(None, &a, false), RebuildDecision::Rebuild);
	}

	#[test]
	fn view_mode_change_rebuilds() {
		let a = key(&["a"], &[], ViewMode::Focused);
		let b = key(&["a"], &[], ViewMode::Global);
		assert_eq!(decide(Some(&a), &b, true), RebuildDecision::Rebuild);
	}

	#[test]
	fn structural_changes() {
		let base = key(&["a", "b"], &[("a", "b")], ViewMode::Focused);
		let more_nodes = key(&["a", "b", "c"], &[("a", "b")], ViewMode::Focused);
		let other_edges = key(&["a", "b"], &[("b", "a")], ViewMode::Focused);
		let no_edges = key(&["a", "b"], &[], ViewMode::Focused);
		let no_nodes = key(&[], &[], ViewMode::Focused);

		assert_eq!(decide(Some(&base), &more_nodes, true), RebuildDecision::Rebuild);
		assert_eq!(decide(Some(&base), &other_edges, true), RebuildDecision::Rebuild);
		// Edges vanishing alone is not a rebuild.
		assert_eq!(decide(Some(&base), &no_edges, true), RebuildDecision::Keep);
		assert_eq!(decide(Some(&base), &no_nodes, true), RebuildDecision::Teardown);
		assert_eq!(decide(None, &no_nodes, false), RebuildDecision::Teardown);
	}

	#[test]
	fn positions_and_labels_do_not_rebuild() {
		let plain = nodes(&["a", "b"]);
		let mut moved = plain.clone();
		moved[0].position = Some(crate::components::network_graph::types::Position::new(1.0, 2.0));
		moved[1].display_label = Some("renamed".into());
		let e = edges(&[("a", "b")]);

		let before = RenderKey::new(&plain, &e, ViewMode::Focused);
		let after = RenderKey::new(&moved, &e, ViewMode::Focused);
		assert_eq!(decide(Some(&before), &after, true), RebuildDecision::Keep);
	}
}
