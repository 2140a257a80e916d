//! Expansion-path fading.
//!
//! Nodes and edges from older expansion levels that are not on the current
//! expansion path are marked [`Class::Superseded`]. This is a plain attribute
//! pass over the live instance and runs whenever the level, the path or the
//! element data changes, whether or not the instance was rebuilt.

use std::collections::HashSet;

use super::instance::{Class, ClassBatch, ElementRef, GraphInstance};

/// Classes that bring `Superseded` in line with the level and path.
///
/// Elements below `current_level` that are off the path are superseded.
pub fn superseded_batch(
	instance: &GraphInstance,
	current_level: u32,
	path_node_ids: &HashSet<String>,
) -> ClassBatch {
	let nodes = instance.nodes();
	let mut batch = ClassBatch::default();

	let on_path: Vec<bool> = nodes
		.iter()
		.map(|n| path_node_ids.contains(&n.data.id))
		.collect();

	for (i, node) in nodes.iter().enumerate() {
		let superseded = node.data.expansion_level < current_level && !on_path[i];
		if node.classes.contains(Class::Superseded) != superseded {
			batch.set(ElementRef::Node(i), Class::Superseded, superseded);
		}
	}

	for (i, edge) in instance.edges().iter().enumerate() {
		let level = edge.data.expansion_level.unwrap_or_else(|| {
			nodes[edge.source]
				.data
				.expansion_level
				.max(nodes[edge.target].data.expansion_level)
		});
		let superseded = level < current_level && !on_path[edge.source] && !on_path[edge.target];
		if edge.classes.contains(Class::Superseded) != superseded {
			batch.set(ElementRef::Edge(i), Class::Superseded, superseded);
		}
	}
	batch
}
