//! Deterministic tiered cloud for the global overview.
//!
//! Nodes are ranked by weighted degree and poured into concentric rings around
//! a configured center, most central first. Each ring holds only as many nodes
//! as fit at the minimum spacing, and consecutive rings are that same spacing
//! apart, so no two nodes end up closer than `min_distance`. Coordinates are
//! computed analytically and then animated to as a preset.

use std::cmp::Ordering;
use std::f64::consts::{PI, TAU};

use crate::components::network_graph::config::CloudConfig;
use crate::components::network_graph::instance::GraphInstance;
use crate::components::network_graph::types::Position;

const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Weighted degree of every node: the sum of its incident edge weights.
pub fn centrality(instance: &GraphInstance) -> Vec<f64> {
	let mut scores = vec![0.0; instance.nodes().len()];
	for edge in instance.edges() {
		scores[edge.source] += edge.data.weight;
		if edge.target != edge.source {
			scores[edge.target] += edge.data.weight;
		}
	}
	scores
}

/// Target coordinates for nodes given their ids and centrality scores.
///
/// Ties are broken by id, so the result only depends on the node/edge set and
/// not on input order.
pub fn tiered_positions(ids: &[&str], scores: &[f64], config: &CloudConfig) -> Vec<Position> {
	let mut order: Vec<usize> = (0..ids.len()).collect();
	order.sort_by(|&a, &b| {
		scores[b]
			.partial_cmp(&scores[a])
			.unwrap_or(Ordering::Equal)
			.then_with(|| ids[a].cmp(ids[b]))
	});

	let spacing = config.min_distance.max(1.0);
	let mut positions = vec![config.center; ids.len()];
	let mut rest = order.as_slice();

	// The most central node sits at the center.
	if let Some((&hub, tail)) = rest.split_first() {
		positions[hub] = config.center;
		rest = tail;
	}

	let mut tier = 1;
	while !rest.is_empty() {
		let radius = config.base_radius.max(spacing) + (tier - 1) as f64 * spacing;
		let count = ring_capacity(radius, spacing).min(rest.len());
		let (ring, tail) = rest.split_at(count);
		let phase = (tier as f64 * GOLDEN_ANGLE) % TAU;

		for (slot, &node) in ring.iter().enumerate() {
			let angle = phase + slot as f64 * TAU / count as f64;
			positions[node] = Position::new(
				config.center.x + radius * angle.cos(),
				config.center.y + radius * angle.sin(),
			);
		}
		rest = tail;
		tier += 1;
	}
	positions
}

/// Largest node count whose neighbors on a ring are at least `spacing` apart.
fn ring_capacity(radius: f64, spacing: f64) -> usize {
	let half_chord = (spacing / (2.0 * radius)).min(1.0);
	let capacity = (PI / half_chord.asin()).floor() as usize;
	capacity.max(1)
}

fn smooth_step(t: f64) -> f64 {
	t * t * (3.0 - 2.0 * t)
}

/// Animates every node from its current coordinate to its tier coordinate.
pub struct CloudLayout {
	from: Vec<Position>,
	to: Vec<Position>,
	duration_ms: f64,
	started_at: Option<f64>,
}

impl CloudLayout {
	/// Computes tier targets and records where each node starts.
	pub fn new(instance: &mut GraphInstance, config: &CloudConfig) -> Self {
		let ids: Vec<&str> = instance.nodes().iter().map(|n| n.data.id.as_str()).collect();
		let to = tiered_positions(&ids, &centrality(instance), config);
		// Nodes with no prior coordinate start at the center instead of the origin.
		let from = instance
			.nodes()
			.iter()
			.map(|n| {
				if n.data.position.is_some() || n.data.locked {
					n.position
				} else {
					config.center
				}
			})
			.collect();

		Self {
			from,
			to,
			duration_ms: config.animation_ms.max(0.0),
			started_at: None,
		}
	}

	/// Final coordinates, in node order.
	pub fn targets(&self) -> &[Position] {
		&self.to
	}

	/// Moves nodes along the eased path. Returns true once they arrive.
	pub fn step(&mut self, instance: &mut GraphInstance, now_ms: f64) -> bool {
		let started = *self.started_at.get_or_insert(now_ms);
		let t = if self.duration_ms > 0.0 {
			((now_ms - started) / self.duration_ms).clamp(0.0, 1.0)
		} else {
			1.0
		};
		let eased = smooth_step(t);

		for (i, (from, to)) in self.from.iter().zip(&self.to).enumerate() {
			let position = if t >= 1.0 {
				*to
			} else {
				Position::new(
					from.x + (to.x - from.x) * eased,
					from.y + (to.y - from.y) * eased,
				)
			};
			instance.set_position_at(i, position);
		}
		t >= 1.0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn star(n: usize) -> (Vec<String>, Vec<f64>) {
		let ids = (0..n).map(|i| format!("n{i:03}")).collect();
		let scores = (0..n).map(|i| if i == 0 { n as f64 } else { 1.0 }).collect();
		(ids, scores)
	}

	#[test]
	fn most_central_node_at_center() {
		let (ids, scores) = star(12);
		let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
		let config = CloudConfig::default();
		let positions = tiered_positions(&ids, &scores, &config);
		assert_eq!(positions[0], config.center);
		for p in &positions[1..] {
			assert!(p.distance(&config.center) >= config.base_radius - 1e-9);
		}
	}

	#[test]
	fn minimum_distance_is_respected() {
		let (ids, scores) = star(300);
		let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
		let config = CloudConfig::default();
		let positions = tiered_positions(&ids, &scores, &config);
		for i in 0..positions.len() {
			for j in (i + 1)..positions.len() {
				assert!(
					positions[i].distance(&positions[j]) >= config.min_distance - 1e-6,
					"{i} and {j} overlap"
				);
			}
		}
	}

	#[test]
	fn independent_of_input_order() {
		let ids = ["b", "a", "c", "d"];
		let scores = [1.0, 1.0, 3.0, 0.0];
		let config = CloudConfig::default();
		let forward = tiered_positions(&ids, &scores, &config);

		let reversed_ids = ["d", "c", "a", "b"];
		let reversed_scores = [0.0, 3.0, 1.0, 1.0];
		let backward = tiered_positions(&reversed_ids, &reversed_scores, &config);

		for (i, id) in ids.iter().enumerate() {
			let j = reversed_ids.iter().position(|r| r == id).unwrap();
			assert_eq!(forward[i], backward[j]);
		}
	}

	#[test]
	fn ring_capacity_keeps_chord_spacing() {
		for radius in [36.0, 80.0, 116.0, 500.0] {
			let n = ring_capacity(radius, 36.0);
			let chord = 2.0 * radius * (PI / n as f64).sin();
			assert!(n == 1 || chord >= 36.0 - 1e-9);
		}
	}
}
