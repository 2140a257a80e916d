//! Carries on-screen node coordinates across an instance rebuild.

use std::collections::HashMap;

use super::instance::GraphInstance;
use super::prepare::RenderNode;
use super::types::Position;

/// Node id to coordinate map captured right before a rebuild.
///
/// Lives for a single rebuild cycle and is dropped once applied.
#[derive(Clone, Debug, Default)]
pub struct PositionCache {
	positions: HashMap<String, Position>,
}

impl PositionCache {
	/// Records the position of node `id`.
	pub fn insert(&mut self, id: impl Into<String>, position: Position) {
		self.positions.insert(id.into(), position);
	}

	/// Cached position of node `id`.
	pub fn get(&self, id: &str) -> Option<Position> {
		self.positions.get(id).copied()
	}

	/// Number of cached nodes.
	pub fn len(&self) -> usize {
		self.positions.len()
	}

	/// True when nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.positions.is_empty()
	}
}

/// Reads the live coordinates of every node in the instance.
pub fn preserve_positions(instance: &GraphInstance) -> PositionCache {
	let mut cache = PositionCache::default();
	for node in instance.nodes() {
		cache.insert(node.data.id.clone(), node.position);
	}
	cache
}

/// Writes cached coordinates onto matching nodes and locks them.
///
/// Nodes without a cache entry stay unlocked so the active layout places them.
/// Returns the number of nodes that were restored.
pub fn apply_positions(nodes: &mut [RenderNode], cache: &PositionCache) -> usize {
	let mut restored = 0;
	for node in nodes.iter_mut() {
		if let Some(position) = cache.get(&node.id) {
			node.position = Some(position);
			node.locked = true;
			restored += 1;
		}
	}
	restored
}
