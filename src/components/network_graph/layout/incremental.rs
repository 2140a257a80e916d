//! Anchored placement of newly expanded nodes.
//!
//! Previously placed (locked) nodes enter the `force_graph` simulation as
//! anchors, so only the new material moves. New nodes spawn on a small ring
//! around the placed neighbors they attach to.

use std::collections::HashMap;
use std::f64::consts::TAU;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use crate::components::network_graph::config::IncrementalConfig;
use crate::components::network_graph::instance::GraphInstance;
use crate::components::network_graph::types::Position;

const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;
const STEP_DT: f32 = 0.016;

/// Anchored placement of newly expanded nodes.
pub struct IncrementalLayout {
	graph: ForceGraph<usize, ()>,
	new_nodes: Vec<String>,
	steps: usize,
	steps_per_frame: usize,
	steps_done: usize,
}

impl IncrementalLayout {
	/// Spawns new nodes around their locked neighbors and anchors the rest.
	pub fn new(instance: &mut GraphInstance, config: &IncrementalConfig) -> Self {
		let spawn = spawn_positions(instance, config.spawn_radius);
		for (&i, &position) in &spawn {
			instance.set_position_at(i, position);
		}

		let mut graph = ForceGraph::new(SimulationParameters {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		});
		let mut idx: Vec<DefaultNodeIdx> = Vec::with_capacity(instance.nodes().len());
		let mut new_nodes = Vec::new();

		for (i, node) in instance.nodes().iter().enumerate() {
			let is_new = !node.data.locked;
			if is_new {
				new_nodes.push(node.data.id.clone());
			}
			idx.push(graph.add_node(NodeData {
				x: node.position.x as f32,
				y: node.position.y as f32,
				mass: 10.0,
				is_anchor: !is_new,
				user_data: i,
			}));
		}
		for edge in instance.edges() {
			if edge.source != edge.target {
				graph.add_edge(idx[edge.source], idx[edge.target], EdgeData::default());
			}
		}

		Self {
			graph,
			new_nodes,
			steps: config.steps,
			steps_per_frame: config.steps_per_frame.max(1),
			steps_done: 0,
		}
	}

	/// Ids of the nodes this run places.
	pub fn new_nodes(&self) -> &[String] {
		&self.new_nodes
	}

	/// Runs one frame of updates. Returns true once finished.
	pub fn step(&mut self, instance: &mut GraphInstance) -> bool {
		if self.new_nodes.is_empty() {
			return true;
		}
		let remaining = self.steps.saturating_sub(self.steps_done);
		for _ in 0..remaining.min(self.steps_per_frame) {
			self.graph.update(STEP_DT);
			self.steps_done += 1;
		}
		self.graph.visit_nodes(|node| {
			if !node.data.is_anchor {
				let (x, y) = (node.x() as f64, node.y() as f64);
				if x.is_finite() && y.is_finite() {
					instance.set_position_at(node.data.user_data, Position::new(x, y));
				}
			}
		});
		self.steps_done >= self.steps
	}
}

/// Initial coordinates for every unlocked node, keyed by node index.
///
/// A new node spawns around the centroid of its locked neighbors; one with no
/// locked neighbor spawns around the centroid of all locked nodes, further out.
fn spawn_positions(instance: &GraphInstance, radius: f64) -> HashMap<usize, Position> {
	let nodes = instance.nodes();
	let locked: Vec<usize> = (0..nodes.len()).filter(|&i| nodes[i].data.locked).collect();
	let centroid = |indices: &[usize]| -> Option<Position> {
		if indices.is_empty() {
			return None;
		}
		let (sx, sy) = indices.iter().fold((0.0, 0.0), |(sx, sy), &i| {
			(sx + nodes[i].position.x, sy + nodes[i].position.y)
		});
		let n = indices.len() as f64;
		Some(Position::new(sx / n, sy / n))
	};
	let overall = centroid(&locked).unwrap_or_default();

	let mut spawned_around: HashMap<(i64, i64), usize> = HashMap::new();
	let mut result = HashMap::new();
	for (i, node) in nodes.iter().enumerate() {
		if node.data.locked {
			continue;
		}
		if let Some(declared) = node.data.position {
			result.insert(i, declared);
			continue;
		}

		let anchors: Vec<usize> = instance
			.edges()
			.iter()
			.filter_map(|edge| match (edge.source == i, edge.target == i) {
				(true, false) => Some(edge.target),
				(false, true) => Some(edge.source),
				_ => None,
			})
			.filter(|&j| nodes[j].data.locked)
			.collect();
		let (center, r) = match centroid(&anchors) {
			Some(c) => (c, radius),
			None => (overall, radius * 2.0),
		};

		let key = (center.x.round() as i64, center.y.round() as i64);
		let slot = spawned_around.entry(key).or_insert(0);
		let angle = (*slot as f64 * GOLDEN_ANGLE) % TAU;
		*slot += 1;
		result.insert(i, Position::new(center.x + r * angle.cos(), center.y + r * angle.sin()));
	}
	result
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;
	use crate::components::network_graph::config::EngineConfig;
	use crate::components::network_graph::instance::Container;
	use crate::components::network_graph::positions::{PositionCache, apply_positions};
	use crate::components::network_graph::prepare::{prepare_edges, prepare_nodes};
	use crate::components::network_graph::types::{GraphEdge, GraphNode};

	fn expanded_instance() -> GraphInstance {
		let mut cache = PositionCache::default();
		cache.insert("a", Position::new(-50.0, 0.0));
		cache.insert("b", Position::new(50.0, 0.0));
		let domain = [
			GraphNode::new("a"),
			GraphNode::new("b"),
			GraphNode::new("c").with_level(1),
			GraphNode::new("d").with_level(1),
		];
		let mut nodes = prepare_nodes(&domain, &HashSet::new(), &cache, true);
		apply_positions(&mut nodes, &cache);
		let edges = prepare_edges(
			&[
				GraphEdge::new("a", "b", 1.0),
				GraphEdge::new("b", "c", 1.0),
				GraphEdge::new("b", "d", 1.0),
			],
			&HashSet::new(),
		);
		GraphInstance::new(Container::new(800.0, 600.0), nodes, edges, &EngineConfig::default())
			.unwrap()
	}

	#[test]
	fn new_nodes_spawn_near_their_anchor() {
		let instance = expanded_instance();
		let spawn = spawn_positions(&instance, 90.0);
		assert_eq!(spawn.len(), 2);
		let b = Position::new(50.0, 0.0);
		for position in spawn.values() {
			assert!((position.distance(&b) - 90.0).abs() < 1e-6);
		}
		assert_ne!(spawn[&2], spawn[&3]);
	}

	#[test]
	fn only_unlocked_nodes_move() {
		let mut instance = expanded_instance();
		let mut layout = IncrementalLayout::new(&mut instance, &IncrementalConfig::default());
		assert_eq!(layout.new_nodes(), ["c".to_string(), "d".to_string()]);

		let mut frames = 0;
		while !layout.step(&mut instance) {
			frames += 1;
			assert!(frames < 1000);
		}
		assert_eq!(instance.position("a"), Some(Position::new(-50.0, 0.0)));
		assert_eq!(instance.position("b"), Some(Position::new(50.0, 0.0)));
		let c = instance.position("c").unwrap();
		assert!(c.x.is_finite() && c.y.is_finite());
	}
}
