//! Zoom-dependent label density and screen-space sizing.
//!
//! Labels are shown or hidden per node class depending on the zoom level.
//! Recomputing that for every node on every wheel event is wasteful, so the
//! pass is debounced through a [`Debouncer`]: zoom events only (re)schedule it,
//! and it runs once the events stop for the configured window.
//!
//! # Coordinate Spaces
//!
//! - **World-space**: graph coordinates; sizes scale with zoom.
//! - **Screen-space**: canvas pixels; sizes stay constant regardless of zoom.

use super::config::LabelConfig;
use super::instance::{Class, ClassBatch, ElementRef, GraphInstance};
use super::types::{NodeType, ViewMode};

/// Defines how a visual property scales with zoom level.
#[derive(Clone, Debug)]
pub enum ScaleBehavior {
	/// Constant screen-space size (pixels). Unaffected by zoom.
	Screen,
	/// World-space scaling, clamped to min/max screen-space bounds.
	Clamped {
		/// Smallest on-screen size in pixels.
		min_screen: f64,
		/// Largest on-screen size in pixels.
		max_screen: f64,
	},
}

impl ScaleBehavior {
	/// Compute the world-space value for a given base value and zoom level.
	pub fn apply(&self, base: f64, k: f64) -> f64 {
		match self {
			ScaleBehavior::Screen => base / k,
			ScaleBehavior::Clamped {
				min_screen,
				max_screen,
			} => base.clamp(min_screen / k, max_screen / k),
		}
	}
}

/// Pre-computed world-space sizes for one frame.
#[derive(Clone, Debug)]
pub struct ScaledValues {
	/// Zoom factor the values were computed for.
	pub k: f64,
	/// CSS font for labels.
	pub label_font: String,
	/// Gap between a node and its label.
	pub label_offset: f64,
	/// Selection ring stroke width.
	pub ring_width: f64,
	/// Gap between a node and its selection ring.
	pub ring_offset: f64,
	/// Scales a base node size so nodes never shrink below a few pixels.
	pub node_min_size: f64,
}

impl ScaledValues {
	/// Computes the sizes for zoom factor `k`.
	pub fn new(k: f64) -> Self {
		let label_size = ScaleBehavior::Clamped {
			min_screen: 9.0,
			max_screen: 16.0,
		}
		.apply(11.0, k);
		Self {
			k,
			label_font: format!("{}px sans-serif", label_size),
			label_offset: ScaleBehavior::Screen.apply(4.0, k),
			ring_width: ScaleBehavior::Screen.apply(2.5, k),
			ring_offset: ScaleBehavior::Screen.apply(3.0, k),
			node_min_size: ScaleBehavior::Screen.apply(4.0, k),
		}
	}
}

/// Whether a node's label should be drawn at zoom `k`.
///
/// Selected nodes and nodes on the expansion path always keep their label.
/// Faded nodes never show one.
#[allow(clippy::too_many_arguments)]
pub fn label_visible(
	node_type: NodeType,
	pinned: bool,
	faded: bool,
	k: f64,
	show_orthologs: bool,
	view_mode: ViewMode,
	node_count: usize,
	config: &LabelConfig,
) -> bool {
	if faded {
		return false;
	}
	if pinned {
		return true;
	}
	let factor = match view_mode {
		ViewMode::Global => config.global_factor,
		ViewMode::Focused => 1.0,
	};
	let dense = if node_count > config.dense_node_count {
		2.0
	} else {
		1.0
	};
	let threshold = match node_type {
		NodeType::Primary => config.primary_min_zoom,
		NodeType::Ortholog if show_orthologs => config.ortholog_min_zoom,
		NodeType::Ortholog => return false,
	};
	k >= threshold * factor * dense
}

/// Computes the label-hidden class for every node at the instance's zoom.
pub fn label_batch(
	instance: &GraphInstance,
	show_orthologs: bool,
	view_mode: ViewMode,
	config: &LabelConfig,
) -> ClassBatch {
	let k = instance.transform.k;
	let count = instance.nodes().len();
	let mut batch = ClassBatch::default();
	for (i, node) in instance.nodes().iter().enumerate() {
		let pinned = node.classes.contains(Class::Selected) || node.data.on_expansion_path;
		let visible = label_visible(
			node.data.node_type,
			pinned,
			node.classes.contains(Class::Faded),
			k,
			show_orthologs,
			view_mode,
			count,
			config,
		);
		if node.classes.contains(Class::LabelHidden) == visible {
			batch.set(ElementRef::Node(i), Class::LabelHidden, !visible);
		}
	}
	batch
}

/// Identifies one scheduled callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebounceToken(u64);

/// Coalesces bursts of events into one callback after a quiet window.
///
/// Time is passed in explicitly; the owner polls with [`Debouncer::take_due`]
/// from its frame loop. Cancelling invalidates any outstanding token, so a late
/// callback can never fire after teardown.
#[derive(Clone, Debug)]
pub struct Debouncer {
	window_ms: f64,
	next_token: u64,
	pending: Option<(DebounceToken, f64)>,
}

impl Debouncer {
	/// Creates an idle debouncer with the given quiet window.
	pub fn new(window_ms: f64) -> Self {
		Self {
			window_ms,
			next_token: 0,
			pending: None,
		}
	}

	/// (Re)schedules the callback to fire `window_ms` after `now_ms`.
	pub fn schedule(&mut self, now_ms: f64) -> DebounceToken {
		self.next_token += 1;
		let token = DebounceToken(self.next_token);
		self.pending = Some((token, now_ms + self.window_ms));
		token
	}

	/// Drops any pending callback.
	pub fn cancel(&mut self) {
		self.pending = None;
	}

	/// True while a callback is scheduled.
	pub fn is_pending(&self) -> bool {
		self.pending.is_some()
	}

	/// Whether `token` is still the live schedule.
	pub fn is_current(&self, token: DebounceToken) -> bool {
		self.pending.is_some_and(|(t, _)| t == token)
	}

	/// Consumes the pending callback if its window has elapsed.
	pub fn take_due(&mut self, now_ms: f64) -> Option<DebounceToken> {
		match self.pending {
			Some((token, due)) if now_ms >= due => {
				self.pending = None;
				Some(token)
			}
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn debouncer_coalesces_bursts() {
		let mut debouncer = Debouncer::new(100.0);
		let first = debouncer.schedule(0.0);
		debouncer.schedule(40.0);
		let last = debouncer.schedule(80.0);

		assert!(!debouncer.is_current(first));
		assert_eq!(debouncer.take_due(120.0), None);
		assert_eq!(debouncer.take_due(180.0), Some(last));
		assert_eq!(debouncer.take_due(500.0), None);
	}

	#[test]
	fn cancelled_token_never_fires() {
		let mut debouncer = Debouncer::new(100.0);
		let token = debouncer.schedule(0.0);
		debouncer.cancel();
		assert!(!debouncer.is_current(token));
		assert_eq!(debouncer.take_due(1_000.0), None);
	}

	#[test]
	fn labels_follow_zoom_and_class() {
		let config = LabelConfig::default();
		let visible = |node_type, k, show, mode| {
			label_visible(node_type, false, false, k, show, mode, 10, &config)
		};

		assert!(!visible(NodeType::Primary, 0.3, false, ViewMode::Focused));
		assert!(visible(NodeType::Primary, 0.8, false, ViewMode::Focused));
		assert!(!visible(NodeType::Primary, 0.8, false, ViewMode::Global));
		assert!(!visible(NodeType::Ortholog, 3.0, false, ViewMode::Focused));
		assert!(!visible(NodeType::Ortholog, 1.0, true, ViewMode::Focused));
		assert!(visible(NodeType::Ortholog, 1.3, true, ViewMode::Focused));
	}

	#[test]
	fn pinned_and_faded_override_zoom() {
		let config = LabelConfig::default();
		assert!(label_visible(
			NodeType::Ortholog,
			true,
			false,
			0.05,
			false,
			ViewMode::Global,
			5000,
			&config
		));
		assert!(!label_visible(
			NodeType::Primary,
			true,
			true,
			4.0,
			true,
			ViewMode::Focused,
			1,
			&config
		));
	}

	#[test]
	fn dense_graphs_raise_threshold() {
		let config = LabelConfig::default();
		let sparse = label_visible(NodeType::Primary, false, false, 1.0, false, ViewMode::Focused, 10, &config);
		let dense = label_visible(NodeType::Primary, false, false, 1.0, false, ViewMode::Focused, 1000, &config);
		assert!(sparse);
		assert!(!dense);
	}

	#[test]
	fn screen_behavior_counteracts_zoom() {
		assert_eq!(ScaleBehavior::Screen.apply(4.0, 2.0), 2.0);
		let clamped = ScaleBehavior::Clamped {
			min_screen: 9.0,
			max_screen: 16.0,
		};
		assert_eq!(clamped.apply(11.0, 0.5), 18.0);
		assert_eq!(clamped.apply(11.0, 1.0), 11.0);
		assert_eq!(clamped.apply(11.0, 4.0), 4.0);
	}
}
