//! Click-driven highlight and selection.
//!
//! Each function computes every class change for one interaction as a single
//! [`ClassBatch`], which the caller applies in one go.

use super::instance::{Class, ClassBatch, ElementRef, GraphInstance};

/// Fades everything outside the node's one-hop neighborhood and clears any
/// edge selection.
pub fn highlight_neighborhood(instance: &GraphInstance, node: usize) -> ClassBatch {
	let (keep_nodes, keep_edges) = instance.neighborhood(node);
	let mut batch = ClassBatch::default();
	for i in 0..instance.nodes().len() {
		batch.set(ElementRef::Node(i), Class::Faded, !keep_nodes.contains(&i));
	}
	for i in 0..instance.edges().len() {
		batch.set(ElementRef::Edge(i), Class::Faded, !keep_edges.contains(&i));
		if instance.has_class(ElementRef::Edge(i), Class::Selected) {
			batch.remove(ElementRef::Edge(i), Class::Selected);
		}
	}
	batch
}

/// Selects one edge, deselecting whichever edge was selected before.
pub fn select_edge(instance: &GraphInstance, edge: usize) -> ClassBatch {
	let mut batch = ClassBatch::default();
	for element in instance.elements_with(Class::Selected) {
		if matches!(element, ElementRef::Edge(i) if i != edge) {
			batch.remove(element, Class::Selected);
		}
	}
	batch.add(ElementRef::Edge(edge), Class::Selected);
	batch
}

/// Returns every element to the neutral state: nothing faded, nothing selected.
pub fn clear_highlight(instance: &GraphInstance) -> ClassBatch {
	let mut batch = ClassBatch::default();
	for element in instance.elements_with(Class::Faded) {
		batch.remove(element, Class::Faded);
	}
	for element in instance.elements_with(Class::Selected) {
		batch.remove(element, Class::Selected);
	}
	batch
}

/// Marks the parent's selected node, unmarking any other node.
pub fn mark_selected_node(instance: &GraphInstance, selected: Option<&str>) -> ClassBatch {
	let target = selected.and_then(|id| instance.node_index(id));
	let mut batch = ClassBatch::default();
	for element in instance.elements_with(Class::Selected) {
		if let ElementRef::Node(i) = element {
			if Some(i) != target {
				batch.remove(element, Class::Selected);
			}
		}
	}
	if let Some(i) = target {
		if !instance.has_class(ElementRef::Node(i), Class::Selected) {
			batch.add(ElementRef::Node(i), Class::Selected);
		}
	}
	batch
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;
	use crate::components::network_graph::config::EngineConfig;
	use crate::components::network_graph::instance::Container;
	use crate::components::network_graph::positions::PositionCache;
	use crate::components::network_graph::prepare::{prepare_edges, prepare_nodes};
	use crate::components::network_graph::types::{GraphEdge, GraphNode};

	/// a - b - c - d
	fn chain() -> GraphInstance {
		let nodes = prepare_nodes(
			&["a", "b", "c", "d"].map(GraphNode::new),
			&HashSet::new(),
			&PositionCache::default(),
			false,
		);
		let edges = prepare_edges(
			&[
				GraphEdge::new("a", "b", 1.0),
				GraphEdge::new("b", "c", 1.0),
				GraphEdge::new("c", "d", 1.0),
			],
			&HashSet::new(),
		);
		GraphInstance::new(Container::new(800.0, 600.0), nodes, edges, &EngineConfig::default())
			.unwrap()
	}

	fn faded(instance: &GraphInstance) -> Vec<ElementRef> {
		instance.elements_with(Class::Faded)
	}

	#[test]
	fn neighborhood_stays_unfaded() {
		let mut instance = chain();
		let batch = highlight_neighborhood(&instance, 1);
		instance.apply_batch(batch);
		assert_eq!(faded(&instance), [ElementRef::Node(3), ElementRef::Edge(2)]);
	}

	#[test]
	fn at_most_one_selected_edge() {
		let mut instance = chain();
		for edge in [0, 2, 1, 1] {
			let batch = select_edge(&instance, edge);
			instance.apply_batch(batch);
			let selected = instance.elements_with(Class::Selected);
			assert_eq!(selected, [ElementRef::Edge(edge)]);
		}
	}

	#[test]
	fn clear_removes_fade_and_selection() {
		let mut instance = chain();
		let batch = mark_selected_node(&instance, Some("a"));
		instance.apply_batch(batch);
		let batch = highlight_neighborhood(&instance, 2);
		instance.apply_batch(batch);
		let batch = select_edge(&instance, 0);
		instance.apply_batch(batch);

		let batch = clear_highlight(&instance);
		instance.apply_batch(batch);
		assert!(faded(&instance).is_empty());
		assert!(instance.elements_with(Class::Selected).is_empty());
	}

	#[test]
	fn node_click_clears_edge_selection() {
		let mut instance = chain();
		let batch = select_edge(&instance, 2);
		instance.apply_batch(batch);
		let batch = highlight_neighborhood(&instance, 0);
		instance.apply_batch(batch);
		assert!(!instance.has_class(ElementRef::Edge(2), Class::Selected));
	}

	#[test]
	fn selected_node_moves() {
		let mut instance = chain();
		let batch = mark_selected_node(&instance, Some("b"));
		instance.apply_batch(batch);
		let batch = mark_selected_node(&instance, Some("d"));
		instance.apply_batch(batch);
		assert_eq!(instance.elements_with(Class::Selected), [ElementRef::Node(3)]);
		let batch = mark_selected_node(&instance, None);
		instance.apply_batch(batch);
		assert!(instance.elements_with(Class::Selected).is_empty());
	}
}
