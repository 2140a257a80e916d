//! Force-directed layout with weight-dependent edge lengths.

use std::collections::hash_map::DefaultHasher;
use std::f64::consts::TAU;
use std::hash::{Hash, Hasher};

use crate::components::network_graph::config::ForceConfig;
use crate::components::network_graph::instance::GraphInstance;
use crate::components::network_graph::types::Position;

const MIN_TEMPERATURE: f64 = 0.5;
const MIN_DISTANCE: f64 = 0.5;

/// Strong edges pull their endpoints closer, but never below 70 units.
pub fn ideal_edge_length(weight: f64) -> f64 {
	(140.0 - weight.min(1.0) * 60.0).max(70.0)
}

/// Deterministic jitter in `[-1, 1]` per axis, derived from the node id.
fn stable_pair(id: &str) -> (f64, f64) {
	let mut hasher = DefaultHasher::new();
	id.hash(&mut hasher);
	let hash = hasher.finish();

	let x = (hash & 0xffff_ffff) as f64 / u32::MAX as f64;
	let y = ((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64;
	((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

/// Fruchterman-Reingold style simulation over every unlocked node.
pub struct ForceLayout {
	positions: Vec<Position>,
	locked: Vec<bool>,
	/// (source, target, ideal length)
	springs: Vec<(usize, usize, f64)>,
	config: ForceConfig,
	temperature: f64,
	iteration: usize,
}

impl ForceLayout {
	/// Seeds unplaced nodes on a jittered ring and captures the springs.
	pub fn new(instance: &mut GraphInstance, config: &ForceConfig) -> Self {
		let n = instance.nodes().len();
		let ring = (n as f64).sqrt() * 40.0 + 40.0;
		let mut positions = Vec::with_capacity(n);
		let mut locked = Vec::with_capacity(n);

		for (i, node) in instance.nodes().iter().enumerate() {
			let position = match node.data.position {
				Some(p) => p,
				None => {
					let angle = (i as f64 / n.max(1) as f64) * TAU;
					let (jx, jy) = stable_pair(&node.data.id);
					Position::new(angle.cos() * ring + jx * 20.0, angle.sin() * ring + jy * 20.0)
				}
			};
			positions.push(position);
			locked.push(node.data.locked);
		}
		for (i, &position) in positions.iter().enumerate() {
			instance.set_position_at(i, position);
		}

		let springs = instance
			.edges()
			.iter()
			.filter(|edge| edge.source != edge.target)
			.map(|edge| (edge.source, edge.target, ideal_edge_length(edge.data.weight)))
			.collect();

		Self {
			positions,
			locked,
			springs,
			config: config.clone(),
			temperature: config.initial_temperature,
			iteration: 0,
		}
	}

	/// Iterations run so far.
	pub fn iterations_done(&self) -> usize {
		self.iteration
	}

	/// Runs one frame's worth of iterations. Returns true once finished.
	pub fn step(&mut self, instance: &mut GraphInstance) -> bool {
		let budget = self.config.iterations_per_frame.max(1);
		for _ in 0..budget {
			if self.is_done() {
				break;
			}
			self.iterate();
		}
		for (i, &position) in self.positions.iter().enumerate() {
			instance.set_position_at(i, position);
		}
		self.is_done()
	}

	fn is_done(&self) -> bool {
		self.iteration >= self.config.iterations || self.positions.len() < 2
	}

	fn iterate(&mut self) {
		let n = self.positions.len();
		let mut disp = vec![(0.0_f64, 0.0_f64); n];

		for i in 0..n {
			for j in (i + 1)..n {
				let (dx, dy) = (
					self.positions[i].x - self.positions[j].x,
					self.positions[i].y - self.positions[j].y,
				);
				let distance = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
				let force = self.config.repulsion / (distance * distance);
				let (fx, fy) = (dx / distance * force, dy / distance * force);
				disp[i].0 += fx;
				disp[i].1 += fy;
				disp[j].0 -= fx;
				disp[j].1 -= fy;
			}
		}

		for &(from, to, ideal) in &self.springs {
			let (dx, dy) = (
				self.positions[from].x - self.positions[to].x,
				self.positions[from].y - self.positions[to].y,
			);
			let distance = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
			let force = (distance - ideal) * self.config.spring;
			let (fx, fy) = (dx / distance * force, dy / distance * force);
			disp[from].0 -= fx;
			disp[from].1 -= fy;
			disp[to].0 += fx;
			disp[to].1 += fy;
		}

		for (i, d) in disp.iter_mut().enumerate() {
			d.0 -= self.positions[i].x * self.config.gravity;
			d.1 -= self.positions[i].y * self.config.gravity;
		}

		for (i, (dx, dy)) in disp.into_iter().enumerate() {
			if self.locked[i] {
				continue;
			}
			let length = (dx * dx + dy * dy).sqrt();
			if length > 0.0 {
				let capped = length.min(self.temperature);
				self.positions[i].x += dx / length * capped;
				self.positions[i].y += dy / length * capped;
			}
		}

		self.temperature = (self.temperature * self.config.cooling).max(MIN_TEMPERATURE);
		self.iteration += 1;
	}
}
