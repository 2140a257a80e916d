//! Tunable engine parameters.
//!
//! All values have working defaults; hosts may override any subset through a
//! JSON document (see [`EngineConfig::from_json`]).

use serde::Deserialize;

use super::error::GraphError;
use super::types::Position;

/// Viewport fitting.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FitConfig {
	/// Screen pixels kept free around fitted elements.
	pub padding: f64,
	/// Zoom used when the fitted bounds have no extent (a single node).
	pub single_node_zoom: f64,
	/// Lower zoom bound for fits and wheel zoom.
	pub min_zoom: f64,
	/// Upper zoom bound for fits and wheel zoom.
	pub max_zoom: f64,
}

impl Default for FitConfig {
	fn default() -> Self {
		Self {
			padding: 30.0,
			single_node_zoom: 1.5,
			min_zoom: 0.05,
			max_zoom: 4.0,
		}
	}
}

/// Force-directed simulation constants. Empirically tuned, not data-derived.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForceConfig {
	/// Node-node repulsion strength.
	pub repulsion: f64,
	/// Pull toward the layout center.
	pub gravity: f64,
	/// Edge spring stiffness.
	pub spring: f64,
	/// Hard cap on iterations per run.
	pub iterations: usize,
	/// Iterations executed per animation frame.
	pub iterations_per_frame: usize,
	/// Maximum displacement per iteration at the start of a run.
	pub initial_temperature: f64,
	/// Per-iteration temperature multiplier.
	pub cooling: f64,
}

impl Default for ForceConfig {
	fn default() -> Self {
		Self {
			repulsion: 12000.0,
			gravity: 0.01,
			spring: 0.08,
			iterations: 1200,
			iterations_per_frame: 60,
			initial_temperature: 80.0,
			cooling: 0.996,
		}
	}
}

/// Placement of freshly expanded nodes around already-placed ones.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IncrementalConfig {
	/// Simulation updates to run with previously-placed nodes anchored.
	pub steps: usize,
	/// Updates executed per animation frame.
	pub steps_per_frame: usize,
	/// Distance from the anchoring neighbor at which new nodes spawn.
	pub spawn_radius: f64,
}

impl Default for IncrementalConfig {
	fn default() -> Self {
		Self {
			steps: 240,
			steps_per_frame: 40,
			spawn_radius: 90.0,
		}
	}
}

/// Tiered cloud used by the global overview.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CloudConfig {
	/// Center of the innermost tier.
	pub center: Position,
	/// Radius of the innermost ring.
	pub base_radius: f64,
	/// Minimum distance between any two placed nodes; also the ring spacing.
	pub min_distance: f64,
	/// Duration of the preset animation to the computed coordinates.
	pub animation_ms: f64,
}

impl Default for CloudConfig {
	fn default() -> Self {
		Self {
			center: Position::new(0.0, 0.0),
			base_radius: 80.0,
			min_distance: 36.0,
			animation_ms: 600.0,
		}
	}
}

/// Zoom thresholds above which labels of a node class are drawn.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelConfig {
	/// Zoom above which primary labels show.
	pub primary_min_zoom: f64,
	/// Zoom above which ortholog labels show.
	pub ortholog_min_zoom: f64,
	/// Multiplier applied to both thresholds in the global overview.
	pub global_factor: f64,
	/// Above this many nodes only selected and path nodes keep labels when zoomed out.
	pub dense_node_count: usize,
	/// Quiet period before a label pass runs.
	pub debounce_ms: f64,
}

impl Default for LabelConfig {
	fn default() -> Self {
		Self {
			primary_min_zoom: 0.6,
			ortholog_min_zoom: 1.2,
			global_factor: 1.5,
			dense_node_count: 400,
			debounce_ms: 100.0,
		}
	}
}

/// Complete engine configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
	/// Viewport fitting.
	pub fit: FitConfig,
	/// Force layout.
	pub force: ForceConfig,
	/// Incremental placement.
	pub incremental: IncrementalConfig,
	/// Global cloud layout.
	pub cloud: CloudConfig,
	/// Label density.
	pub labels: LabelConfig,
}

impl EngineConfig {
	/// Parses a (possibly partial) JSON configuration.
	pub fn from_json(text: &str) -> Result<Self, GraphError> {
		Ok(serde_json::from_str(text)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_json_keeps_defaults() {
		let config = EngineConfig::from_json(r#"{ "fit": { "padding": 50 }, "labels": { "debounceMs": 250 } }"#)
			.unwrap();
		assert_eq!(config.fit.padding, 50.0);
		assert_eq!(config.fit.max_zoom, 4.0);
		assert_eq!(config.labels.debounce_ms, 250.0);
		assert_eq!(config.force.iterations, 1200);
	}

	#[test]
	fn invalid_json_is_an_error() {
		assert!(matches!(
			EngineConfig::from_json("{ fit: "),
			Err(GraphError::DataParse(_))
		));
	}
}
