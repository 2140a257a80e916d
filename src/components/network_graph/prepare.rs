//! Conversion of domain nodes and edges into render elements.
//!
//! Preparation is pure: it never touches the caller's data and yields the same
//! output for the same input, so it is safe to run on every render.

use std::collections::HashSet;

use super::positions::PositionCache;
use super::types::{EdgeType, GraphEdge, GraphNode, NodeType, Position};

/// Render-side copy of a [`GraphNode`].
#[derive(Clone, Debug, PartialEq)]
pub struct RenderNode {
	/// Node id.
	pub id: String,
	/// Display label after the fallback chain.
	pub label: String,
	/// Primary or ortholog.
	pub node_type: NodeType,
	/// Whether the node has known orthologs.
	pub has_orthologs: bool,
	/// Number of known orthologs.
	pub ortholog_count: u32,
	/// Normalized level, 0 when the graph has no expansion levels.
	pub expansion_level: u32,
	/// True if the node is on the expansion path.
	pub on_expansion_path: bool,
	/// `None` means a new node the active layout should place.
	pub position: Option<Position>,
	/// Locked nodes are not moved by layout passes.
	pub locked: bool,
}

/// Render-side copy of a [`GraphEdge`].
#[derive(Clone, Debug, PartialEq)]
pub struct RenderEdge {
	/// Unique render id.
	pub id: String,
	/// Source node id.
	pub source: String,
	/// Target node id.
	pub target: String,
	/// Always positive.
	pub weight: f64,
	/// Primary or ortholog link.
	pub edge_type: EdgeType,
	/// Orthology relation, if any.
	pub orthology_type: Option<String>,
	/// Explicit level, if the edge declared one.
	pub expansion_level: Option<u32>,
	/// True if either endpoint is on the expansion path.
	pub on_expansion_path: bool,
}

/// True when any node was introduced by an expansion step.
pub fn has_expansion_levels(nodes: &[GraphNode]) -> bool {
	nodes
		.iter()
		.any(|node| node.expansion_level.is_some_and(|level| level > 0))
}

/// Converts domain nodes into render nodes.
///
/// Cached positions win over declared ones.
pub fn prepare_nodes(
	nodes: &[GraphNode],
	path_node_ids: &HashSet<String>,
	existing_positions: &PositionCache,
	has_expansion_levels: bool,
) -> Vec<RenderNode> {
	nodes
		.iter()
		.map(|node| {
			let label = node
				.display_label
				.clone()
				.or_else(|| node.locus_tag.clone())
				.unwrap_or_else(|| node.id.clone());
			let ortholog_count = node.ortholog_count.unwrap_or(0);

			RenderNode {
				id: node.id.clone(),
				label,
				node_type: node.node_type.unwrap_or_default(),
				has_orthologs: node.has_orthologs.unwrap_or(ortholog_count > 0),
				ortholog_count,
				expansion_level: if has_expansion_levels {
					node.expansion_level.unwrap_or(0)
				} else {
					0
				},
				on_expansion_path: path_node_ids.contains(&node.id),
				position: existing_positions.get(&node.id).or(node.position),
				locked: false,
			}
		})
		.collect()
}

/// Converts domain edges into render edges with unique ids and positive weights.
pub fn prepare_edges(edges: &[GraphEdge], path_node_ids: &HashSet<String>) -> Vec<RenderEdge> {
	let mut used_ids: HashSet<String> = HashSet::with_capacity(edges.len());

	edges
		.iter()
		.enumerate()
		.map(|(index, edge)| {
			// Explicit ids win unless they collide with one already handed out.
			let id = match &edge.id {
				Some(id) if !id.is_empty() && !used_ids.contains(id) => id.clone(),
				_ => synthesize_id(index, &used_ids),
			};
			used_ids.insert(id.clone());

			RenderEdge {
				id,
				source: edge.source.clone(),
				target: edge.target.clone(),
				weight: edge.weight.filter(|w| *w > 0.0 && w.is_finite()).unwrap_or(1.0),
				edge_type: edge.edge_type.unwrap_or_default(),
				orthology_type: edge.orthology_type.clone(),
				expansion_level: edge.expansion_level,
				on_expansion_path: path_node_ids.contains(&edge.source)
					|| path_node_ids.contains(&edge.target),
			}
		})
		.collect()
}

fn synthesize_id(index: usize, used: &HashSet<String>) -> String {
	let mut id = format!("edge-{index}");
	let mut suffix = 1;
	while used.contains(&id) {
		id = format!("edge-{index}-{suffix}");
		suffix += 1;
	}
	id
}

#[cfg(test)]
mod tests {
	use super::*;

	fn path(ids: &[&str]) -> HashSet<String> {
		ids.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn label_falls_back_to_locus_tag_then_id() {
		let nodes = vec![
			GraphNode {
				display_label: Some("dnaA".into()),
				locus_tag: Some("PA0001".into()),
				..GraphNode::new("a")
			},
			GraphNode {
				locus_tag: Some("PA0002".into()),
				..GraphNode::new("b")
			},
			GraphNode::new("c"),
		];
		let prepared = prepare_nodes(&nodes, &HashSet::new(), &PositionCache::default(), false);
		let labels: Vec<_> = prepared.iter().map(|n| n.label.as_str()).collect();
		assert_eq!(labels, ["dnaA", "PA0002", "c"]);
		assert!(prepared.iter().all(|n| n.node_type == NodeType::Primary));
	}

	#[test]
	fn positions_only_come_from_cache_or_declaration() {
		let mut cache = PositionCache::default();
		cache.insert("a", Position::new(10.0, 20.0));
		let nodes = vec![
			GraphNode::new("a"),
			GraphNode {
				position: Some(Position::new(5.0, 5.0)),
				..GraphNode::new("b")
			},
			GraphNode::new("c"),
		];
		let prepared = prepare_nodes(&nodes, &HashSet::new(), &cache, true);
		assert_eq!(prepared[0].position, Some(Position::new(10.0, 20.0)));
		assert_eq!(prepared[1].position, Some(Position::new(5.0, 5.0)));
		assert_eq!(prepared[2].position, None);
	}

	#[test]
	fn expansion_levels_ignored_without_history() {
		let nodes = vec![GraphNode::new("a").with_level(3)];
		let flat = prepare_nodes(&nodes, &path(&["a"]), &PositionCache::default(), false);
		let expanded = prepare_nodes(&nodes, &path(&["a"]), &PositionCache::default(), true);
		assert_eq!(flat[0].expansion_level, 0);
		assert_eq!(expanded[0].expansion_level, 3);
		assert!(flat[0].on_expansion_path);
	}

	#[test]
	fn has_orthologs_derived_from_count() {
		let nodes = vec![GraphNode {
			ortholog_count: Some(4),
			..GraphNode::new("a")
		}];
		let prepared = prepare_nodes(&nodes, &HashSet::new(), &PositionCache::default(), false);
		assert!(prepared[0].has_orthologs);
	}

	#[test]
	fn edge_ids_are_unique_and_weights_positive() {
		let edges = vec![
			GraphEdge {
				id: Some("e1".into()),
				..GraphEdge::new("a", "b", 0.0)
			},
			GraphEdge {
				id: Some("e1".into()),
				..GraphEdge::new("a", "b", -2.0)
			},
			GraphEdge {
				id: Some("edge-1".into()),
				..GraphEdge::new("b", "c", 3.0)
			},
			GraphEdge {
				weight: None,
				..GraphEdge::new("c", "d", 0.0)
			},
		];
		let prepared = prepare_edges(&edges, &path(&["d"]));
		let ids: HashSet<_> = prepared.iter().map(|e| e.id.clone()).collect();
		assert_eq!(ids.len(), 4);
		assert_eq!(prepared[0].id, "e1");
		assert_eq!(prepared[1].id, "edge-1");
		assert_eq!(prepared[2].id, "edge-2");
		assert_eq!(prepared[0].weight, 1.0);
		assert_eq!(prepared[1].weight, 1.0);
		assert_eq!(prepared[2].weight, 3.0);
		assert!(prepared[3].on_expansion_path);
		assert!(!prepared[0].on_expansion_path);
	}

	#[test]
	fn preparation_is_idempotent() {
		let nodes = vec![GraphNode::new("a"), GraphNode::new("b").with_level(1)];
		let edges = vec![GraphEdge::new("a", "b", 2.0), GraphEdge::new("a", "b", 2.0)];
		let ids = path(&["a"]);
		let cache = PositionCache::default();

		assert_eq!(
			prepare_nodes(&nodes, &ids, &cache, true),
			prepare_nodes(&nodes, &ids, &cache, true)
		);
		assert_eq!(prepare_edges(&edges, &ids), prepare_edges(&edges, &ids));
	}
}
