//! Layout strategies.
//!
//! Three mutually exclusive algorithms, chosen from the view mode and whether
//! the user has expanded nodes:
//!
//! - [`ForceLayout`]: physical simulation for a fresh focused graph.
//! - [`IncrementalLayout`]: places only newly expanded nodes around locked,
//!   previously placed ones, then frames the new material.
//! - [`CloudLayout`]: deterministic concentric tiers for the global overview.
//!
//! A run is advanced a bounded amount per animation frame by the engine, so
//! layout never blocks the UI thread. Completion is reported by
//! [`LayoutProgress::Stopped`]; there is no cancellation, a superseded run is
//! simply dropped together with its instance.

mod cloud;
mod force;
mod incremental;

pub use cloud::{CloudLayout, centrality, tiered_positions};
pub use force::{ForceLayout, ideal_edge_length};
pub use incremental::IncrementalLayout;

use super::config::EngineConfig;
use super::instance::{FitTarget, GraphInstance};
use super::types::ViewMode;

/// Which algorithm a rebuild runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutKind {
	/// Full force simulation.
	ForceDirected,
	/// Places new nodes around locked ones.
	Incremental,
	/// Concentric tiers for the global overview.
	TieredCloud,
}

impl LayoutKind {
	/// Picks the layout for a rebuild.
	pub fn select(view_mode: ViewMode, has_expansion_levels: bool) -> Self {
		match (view_mode, has_expansion_levels) {
			(ViewMode::Global, _) => LayoutKind::TieredCloud,
			(ViewMode::Focused, true) => LayoutKind::Incremental,
			(ViewMode::Focused, false) => LayoutKind::ForceDirected,
		}
	}
}

/// Result of advancing a run by one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutProgress {
	/// More frames are needed.
	Running,
	/// The run finished.
	Stopped,
}

/// An in-flight layout bound to one instance.
pub enum LayoutRun {
	/// A force run.
	Force(ForceLayout),
	/// An incremental run.
	Incremental(IncrementalLayout),
	/// A cloud run.
	Cloud(CloudLayout),
}

impl LayoutRun {
	/// Prepares a run, writing initial placements into the instance.
	pub fn start(kind: LayoutKind, instance: &mut GraphInstance, config: &EngineConfig) -> Self {
		match kind {
			LayoutKind::ForceDirected => LayoutRun::Force(ForceLayout::new(instance, &config.force)),
			LayoutKind::Incremental => {
				LayoutRun::Incremental(IncrementalLayout::new(instance, &config.incremental))
			}
			LayoutKind::TieredCloud => LayoutRun::Cloud(CloudLayout::new(instance, &config.cloud)),
		}
	}

	/// Which algorithm this run is.
	pub fn kind(&self) -> LayoutKind {
		match self {
			LayoutRun::Force(_) => LayoutKind::ForceDirected,
			LayoutRun::Incremental(_) => LayoutKind::Incremental,
			LayoutRun::Cloud(_) => LayoutKind::TieredCloud,
		}
	}

	/// Advances the run by one frame.
	pub fn step(&mut self, instance: &mut GraphInstance, now_ms: f64) -> LayoutProgress {
		let done = match self {
			LayoutRun::Force(run) => run.step(instance),
			LayoutRun::Incremental(run) => run.step(instance),
			LayoutRun::Cloud(run) => run.step(instance, now_ms),
		};
		if done {
			LayoutProgress::Stopped
		} else {
			LayoutProgress::Running
		}
	}

	/// What the viewport is fitted to once the run stops.
	pub fn fit_target(&self) -> FitTarget {
		match self {
			LayoutRun::Incremental(run) if !run.new_nodes().is_empty() => {
				FitTarget::Nodes(run.new_nodes().to_vec())
			}
			_ => FitTarget::All,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strategy_selection() {
		assert_eq!(LayoutKind::select(ViewMode::Focused, false), LayoutKind::ForceDirected);
		assert_eq!(LayoutKind::select(ViewMode::Focused, true), LayoutKind::Incremental);
		assert_eq!(LayoutKind::select(ViewMode::Global, false), LayoutKind::TieredCloud);
		assert_eq!(LayoutKind::select(ViewMode::Global, true), LayoutKind::TieredCloud);
	}
}
