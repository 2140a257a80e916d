//! The viewer's core state machine.
//!
//! [`GraphEngine`] owns the single live [`GraphInstance`] and decides, on
//! every update from the parent, whether to keep it (applying selection,
//! fading and styling in place) or to destroy it and build a new one with
//! preserved positions and a freshly chosen layout. It is driven from one
//! thread: updates, pointer input and animation-frame ticks all come through
//! `&mut self`, and every entry point checks that an instance exists before
//! touching it.
//!
//! The engine is generic over the host's pointer-event type `E`, which it
//! passes through verbatim to click callbacks.

use std::collections::HashSet;

use log::{debug, info, warn};

use super::config::EngineConfig;
use super::diff::{self, RebuildDecision, RenderKey};
use super::fading;
use super::instance::{Container, EventKind, FitTarget, GraphInstance};
use super::interaction;
use super::layout::{LayoutKind, LayoutProgress, LayoutRun};
use super::positions::{PositionCache, apply_positions, preserve_positions};
use super::prepare::{RenderEdge, RenderNode, has_expansion_levels, prepare_edges, prepare_nodes};
use super::style::{ScoreRange, Theme, ViewFlags};
use super::types::{GraphEdge, GraphNode, GraphProps, Position};
use super::zoom::{self, Debouncer};

/// Callback invoked with the clicked domain node and the raw event.
pub type NodeCallback<E> = Box<dyn FnMut(&GraphNode, E)>;
/// Callback invoked with the clicked domain edge and the raw event.
pub type EdgeCallback<E> = Box<dyn FnMut(&GraphEdge, E)>;

/// Pointer travel (screen pixels) beyond which a press is a drag, not a click.
const CLICK_SLOP: f64 = 4.0;
const WHEEL_ZOOM_IN: f64 = 1.1;
const WHEEL_ZOOM_OUT: f64 = 0.9;

/// Lifecycle of the live instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderPhase {
	/// No instance: empty data or construction failed.
	NoGraph,
	/// A fresh instance exists and its layout is still running.
	Rebuilding,
	/// The instance reflects the current data and is idle.
	Stable,
}

/// The element records handed to the most recent instance.
#[derive(Clone, Debug, Default)]
pub struct RenderedElements {
	/// Prepared nodes, in data order.
	pub nodes: Vec<RenderNode>,
	/// Prepared edges, in data order.
	pub edges: Vec<RenderEdge>,
}

#[derive(Clone, Debug, Default)]
struct Gesture {
	pressed: bool,
	moved: bool,
	start_x: f64,
	start_y: f64,
}

/// Owns the live instance and turns parent updates and pointer input into
/// changes on it.
pub struct GraphEngine<E> {
	config: EngineConfig,
	theme: Theme,
	container: Container,
	instance: Option<GraphInstance>,
	layout: Option<LayoutRun>,
	/// Listeners this engine attached to the live instance.
	attached: Vec<EventKind>,
	phase: RenderPhase,
	key: Option<RenderKey>,
	props: GraphProps,
	path_ids: HashSet<String>,
	flags: ViewFlags,
	fade_state: Option<(u32, Vec<String>)>,
	label_debounce: Debouncer,
	gesture: Gesture,
	rendered: RenderedElements,
	on_node_click: Option<NodeCallback<E>>,
	on_edge_click: Option<EdgeCallback<E>>,
}

impl<E> GraphEngine<E> {
	/// Creates an engine with no graph. Nothing is built until [`update`](Self::update).
	pub fn new(container: Container, config: EngineConfig, theme: Theme) -> Self {
		let label_debounce = Debouncer::new(config.labels.debounce_ms);
		Self {
			config,
			theme,
			container,
			instance: None,
			layout: None,
			attached: Vec::new(),
			phase: RenderPhase::NoGraph,
			key: None,
			props: GraphProps::default(),
			path_ids: HashSet::new(),
			flags: ViewFlags::default(),
			fade_state: None,
			label_debounce,
			gesture: Gesture::default(),
			rendered: RenderedElements::default(),
			on_node_click: None,
			on_edge_click: None,
		}
	}

	/// Registers (or removes) the node callback.
	pub fn set_on_node_click(&mut self, callback: Option<NodeCallback<E>>) {
		self.on_node_click = callback;
	}

	/// Registers (or removes) the edge callback. Edge hits are only tested
	/// while one is registered.
	pub fn set_on_edge_click(&mut self, callback: Option<EdgeCallback<E>>) {
		self.on_edge_click = callback;
		let wanted = self.on_edge_click.is_some();
		let Some(instance) = self.instance.as_mut() else {
			return;
		};
		let listening = instance.is_listening(EventKind::EdgeTap);
		if wanted && !listening {
			instance.on(EventKind::EdgeTap);
			self.attached.push(EventKind::EdgeTap);
		} else if !wanted && listening {
			if let Err(e) = instance.off(EventKind::EdgeTap) {
				warn!("ppi-graph: {}", e);
			}
			self.attached.retain(|&k| k != EventKind::EdgeTap);
		}
	}

	/// Current lifecycle phase.
	pub fn phase(&self) -> RenderPhase {
		self.phase
	}

	/// True while a layout run is in flight.
	pub fn is_layout_running(&self) -> bool {
		self.layout.is_some()
	}

	/// The algorithm of the in-flight layout run, if any.
	pub fn layout_kind(&self) -> Option<LayoutKind> {
		self.layout.as_ref().map(LayoutRun::kind)
	}

	/// Elements most recently handed to the instance.
	pub fn last_rendered(&self) -> &RenderedElements {
		&self.rendered
	}

	/// Escape hatch to the live instance for advanced host integration.
	pub fn instance(&self) -> Option<&GraphInstance> {
		self.instance.as_ref()
	}

	/// Theme used for styling and drawing.
	pub fn theme(&self) -> &Theme {
		&self.theme
	}

	/// Whether the ortholog overlay is on.
	pub fn show_orthologs(&self) -> bool {
		self.flags.show_orthologs
	}

	/// Reconciles the live instance with new data from the parent.
	pub fn update(&mut self, props: GraphProps, now_ms: f64) {
		let key = RenderKey::new(&props.nodes, &props.edges, props.view_mode);
		let decision = diff::decide(self.key.as_ref(), &key, self.instance.is_some());
		let edges_vanished = self
			.key
			.as_ref()
			.is_some_and(|previous| previous.edge_count > 0 && key.edge_count == 0);
		let flags = ViewFlags {
			show_orthologs: props.show_orthologs,
			score_range: ScoreRange::from_edges(&props.edges),
			view_mode: props.view_mode,
		};
		let restyle = flags != self.flags;

		self.path_ids = props
			.expansion_path
			.iter()
			.map(|entry| entry.node_id.clone())
			.collect();
		self.props = props;
		self.flags = flags;
		self.key = Some(key);
		debug!("ppi-graph: update decision {:?}", decision);

		match decision {
			RebuildDecision::Teardown => {
				self.teardown();
				self.rendered = RenderedElements::default();
				return;
			}
			RebuildDecision::Rebuild => self.rebuild(),
			RebuildDecision::Keep => {
				self.refresh(restyle, edges_vanished);
				// Selection and path membership pin labels.
				self.label_debounce.schedule(now_ms);
			}
		}
		self.apply_selection();
		self.apply_fading();
	}

	fn rebuild(&mut self) {
		if self.layout.is_some() {
			debug!("ppi-graph: superseding in-flight layout");
		}
		let cache = self
			.instance
			.as_ref()
			.map(preserve_positions)
			.unwrap_or_default();
		self.teardown();

		let has_levels = has_expansion_levels(&self.props.nodes);
		let mut nodes = prepare_nodes(&self.props.nodes, &self.path_ids, &cache, has_levels);
		let restored = apply_positions(&mut nodes, &cache);
		let edges = prepare_edges(&self.props.edges, &self.path_ids);
		self.rendered = RenderedElements {
			nodes: nodes.clone(),
			edges: edges.clone(),
		};

		let mut instance = match GraphInstance::new(self.container, nodes, edges, &self.config) {
			Ok(instance) => instance,
			Err(e) => {
				warn!("ppi-graph: failed to create graph instance: {}", e);
				return;
			}
		};
		instance.restyle(&self.flags, &self.theme);

		let kind = LayoutKind::select(self.props.view_mode, has_levels);
		let layout = LayoutRun::start(kind, &mut instance, &self.config);
		self.attach_listeners(&mut instance);
		info!(
			"ppi-graph: built instance with {} nodes, {} edges ({} restored), {:?} layout",
			instance.nodes().len(),
			instance.edges().len(),
			restored,
			kind
		);

		self.instance = Some(instance);
		self.layout = Some(layout);
		self.fade_state = None;
		self.phase = RenderPhase::Rebuilding;
		self.apply_labels();
	}

	fn attach_listeners(&mut self, instance: &mut GraphInstance) {
		let mut kinds = vec![
			EventKind::NodeTap,
			EventKind::BackgroundTap,
			EventKind::Zoom,
			EventKind::LayoutStop,
		];
		if self.on_edge_click.is_some() {
			kinds.push(EventKind::EdgeTap);
		}
		for &kind in &kinds {
			instance.on(kind);
		}
		self.attached = kinds;
	}

	/// Non-structural update of the live instance; never re-runs layout.
	fn refresh(&mut self, restyle: bool, edges_vanished: bool) {
		let Some(instance) = self.instance.as_mut() else {
			return;
		};
		if edges_vanished {
			instance.clear_edges();
		}

		let has_levels = has_expansion_levels(&self.props.nodes);
		let nodes = prepare_nodes(
			&self.props.nodes,
			&self.path_ids,
			&PositionCache::default(),
			has_levels,
		);
		let edges = prepare_edges(&self.props.edges, &self.path_ids);
		let changed = instance.refresh_data(&nodes, &edges);
		if changed || restyle {
			instance.restyle(&self.flags, &self.theme);
		}
		if changed {
			// Levels or path membership may have moved under an unchanged path.
			self.fade_state = None;
		}
		self.rendered = RenderedElements { nodes, edges };
		if edges_vanished {
			self.rendered.edges.clear();
		}
	}

	fn apply_selection(&mut self) {
		if let Some(instance) = self.instance.as_mut() {
			let batch = interaction::mark_selected_node(instance, self.props.selected_node.as_deref());
			instance.apply_batch(batch);
		}
	}

	fn apply_fading(&mut self) {
		let Some(instance) = self.instance.as_mut() else {
			return;
		};
		let mut path: Vec<String> = self.path_ids.iter().cloned().collect();
		path.sort_unstable();
		let state = (self.props.current_expansion_level, path);
		if self.fade_state.as_ref() == Some(&state) {
			return;
		}
		let batch = fading::superseded_batch(instance, state.0, &self.path_ids);
		instance.apply_batch(batch);
		self.fade_state = Some(state);
	}

	fn apply_labels(&mut self) {
		if let Some(instance) = self.instance.as_mut() {
			let batch = zoom::label_batch(
				instance,
				self.flags.show_orthologs,
				self.flags.view_mode,
				&self.config.labels,
			);
			instance.apply_batch(batch);
		}
	}

	/// Advances layout and pending debounced work. Returns true if a repaint
	/// is needed.
	pub fn tick(&mut self, now_ms: f64) -> bool {
		let Some(instance) = self.instance.as_mut() else {
			return false;
		};
		let mut repaint = false;

		if let Some(layout) = self.layout.as_mut() {
			repaint = true;
			if layout.step(instance, now_ms) == LayoutProgress::Stopped {
				let target = layout.fit_target();
				info!("ppi-graph: {:?} layout stopped", layout.kind());
				self.layout = None;
				self.phase = RenderPhase::Stable;
				if instance.is_listening(EventKind::LayoutStop) {
					instance.fit(target);
					self.label_debounce.schedule(now_ms);
				}
			}
		}

		if self.label_debounce.take_due(now_ms).is_some() {
			debug!("ppi-graph: label density pass");
			self.apply_labels();
			repaint = true;
		}
		repaint
	}

	/// Dispatches a click at a screen point.
	///
	/// Nodes win over edges; edges are only considered while an edge callback
	/// is registered; anything else is a background click. Every applied
	/// highlight schedules a label pass.
	pub fn click(&mut self, sx: f64, sy: f64, event: E, now_ms: f64) {
		if std::mem::take(&mut self.gesture.moved) {
			return;
		}
		let Some(instance) = self.instance.as_mut() else {
			return;
		};

		if let Some(i) = instance.node_at(sx, sy) {
			if !instance.is_listening(EventKind::NodeTap) {
				return;
			}
			let batch = interaction::highlight_neighborhood(instance, i);
			instance.apply_batch(batch);
			self.label_debounce.schedule(now_ms);

			let id = &instance.nodes()[i].data.id;
			match self.props.nodes.iter().find(|node| &node.id == id) {
				Some(node) => {
					if let Some(callback) = self.on_node_click.as_mut() {
						callback(node, event);
					}
				}
				None => debug!("ppi-graph: clicked node {} is no longer in the data", id),
			}
			return;
		}

		if instance.is_listening(EventKind::EdgeTap) {
			if let Some(i) = instance.edge_at(sx, sy) {
				let batch = interaction::select_edge(instance, i);
				instance.apply_batch(batch);
				self.label_debounce.schedule(now_ms);

				// Rendered edges mirror the data one to one.
				let data = &instance.edges()[i].data;
				let found = self
					.rendered
					.edges
					.iter()
					.position(|edge| edge.id == data.id)
					.and_then(|j| self.props.edges.get(j))
					.filter(|edge| edge.source == data.source && edge.target == data.target)
					.or_else(|| {
						self.props
							.edges
							.iter()
							.find(|edge| edge.source == data.source && edge.target == data.target)
					});
				match (found, self.on_edge_click.as_mut()) {
					(Some(edge), Some(callback)) => callback(edge, event),
					(None, _) => debug!("ppi-graph: clicked edge {} is no longer in the data", data.id),
					_ => {}
				}
				return;
			}
		}

		if instance.is_listening(EventKind::BackgroundTap) {
			let batch = interaction::clear_highlight(instance);
			instance.apply_batch(batch);
			self.label_debounce.schedule(now_ms);
		}
	}

	/// Starts a node drag, or a pan when no node is under the pointer.
	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		self.gesture = Gesture {
			pressed: true,
			moved: false,
			start_x: sx,
			start_y: sy,
		};
		let layout_running = self.layout.is_some();
		let Some(instance) = self.instance.as_mut() else {
			return;
		};
		// Nodes are owned by the layout while it runs; pan instead.
		match instance.node_at(sx, sy).filter(|_| !layout_running) {
			Some(i) => {
				instance.drag.active = true;
				instance.drag.node_idx = Some(i);
				instance.drag.start_x = sx;
				instance.drag.start_y = sy;
				instance.drag.node_start = instance.nodes()[i].position;
			}
			None => {
				instance.pan.active = true;
				instance.pan.start_x = sx;
				instance.pan.start_y = sy;
				instance.pan.transform_start_x = instance.transform.x;
				instance.pan.transform_start_y = instance.transform.y;
			}
		}
	}

	/// Returns true if the view changed.
	pub fn pointer_move(&mut self, sx: f64, sy: f64) -> bool {
		if !self.gesture.pressed {
			return false;
		}
		let (dx, dy) = (sx - self.gesture.start_x, sy - self.gesture.start_y);
		if (dx * dx + dy * dy).sqrt() > CLICK_SLOP {
			self.gesture.moved = true;
		}
		let Some(instance) = self.instance.as_mut() else {
			return false;
		};

		if instance.drag.active {
			if let Some(i) = instance.drag.node_idx {
				let k = instance.transform.k;
				let start = instance.drag.node_start;
				instance.set_position_at(i, Position::new(start.x + dx / k, start.y + dy / k));
				instance.set_locked(i, true);
				return true;
			}
		} else if instance.pan.active {
			instance.transform.x = instance.pan.transform_start_x + dx;
			instance.transform.y = instance.pan.transform_start_y + dy;
			return true;
		}
		false
	}

	/// Ends any drag or pan.
	pub fn pointer_up(&mut self) {
		self.gesture.pressed = false;
		if let Some(instance) = self.instance.as_mut() {
			instance.drag.active = false;
			instance.drag.node_idx = None;
			instance.pan.active = false;
		}
	}

	/// Wheel zoom around the cursor; schedules a debounced label pass.
	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64, now_ms: f64) {
		let Some(instance) = self.instance.as_mut() else {
			return;
		};
		let factor = if delta_y > 0.0 {
			WHEEL_ZOOM_OUT
		} else {
			WHEEL_ZOOM_IN
		};
		instance.zoom_at(sx, sy, factor, self.config.fit.min_zoom, self.config.fit.max_zoom);
		if instance.is_listening(EventKind::Zoom) {
			self.label_debounce.schedule(now_ms);
		}
	}

	/// Adopts a new container size. The next rebuild uses it too.
	pub fn resize(&mut self, container: Container) {
		self.container = container;
		if let Some(instance) = self.instance.as_mut() {
			instance.resize(container);
		}
	}

	/// Fits the viewport to every element with the standard padding.
	pub fn reset_view(&mut self) {
		if let Some(instance) = self.instance.as_mut() {
			instance.fit(FitTarget::All);
		}
	}

	/// Fits the viewport to all current nodes, or resets it if there are none.
	pub fn fit_to_nodes(&mut self) {
		let ids: Vec<String> = self.rendered.nodes.iter().map(|n| n.id.clone()).collect();
		if ids.is_empty() {
			self.reset_view();
			return;
		}
		if let Some(instance) = self.instance.as_mut() {
			instance.fit(FitTarget::Nodes(ids));
		}
	}

	/// Destroys the live instance, abandoning any running layout and pending
	/// label pass. Safe to call repeatedly.
	pub fn teardown(&mut self) {
		self.label_debounce.cancel();
		self.layout = None;
		let attached = std::mem::take(&mut self.attached);
		if let Some(instance) = self.instance.take() {
			match instance.destroy(&attached) {
				Ok(()) => debug!("ppi-graph: instance destroyed"),
				Err(e) => warn!("ppi-graph: instance teardown failed: {}", e),
			}
		}
		self.gesture = Gesture::default();
		self.phase = RenderPhase::NoGraph;
	}
}

impl<E> Drop for GraphEngine<E> {
	fn drop(&mut self) {
		self.teardown();
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;
	use crate::components::network_graph::instance::{Class, ElementRef};
	use crate::components::network_graph::types::{EdgeType, ExpansionPathEntry, ViewMode};

	type Engine = GraphEngine<u32>;

	fn engine() -> Engine {
		GraphEngine::new(
			Container::new(800.0, 600.0),
			EngineConfig::default(),
			Theme::default(),
		)
	}

	fn props(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> GraphProps {
		GraphProps {
			nodes,
			edges,
			..Default::default()
		}
	}

	fn scenario_graph() -> GraphProps {
		props(
			vec![GraphNode::new("A"), GraphNode::new("B"), GraphNode::new("C")],
			vec![GraphEdge::new("A", "B", 1.0), GraphEdge::new("B", "C", 5.0)],
		)
	}

	fn settle(engine: &mut Engine, now: &mut f64) {
		let mut frames = 0;
		while engine.is_layout_running() {
			*now += 16.0;
			engine.tick(*now);
			frames += 1;
			assert!(frames < 10_000, "layout never stopped");
		}
	}

	fn screen_of(engine: &Engine, id: &str) -> (f64, f64) {
		let instance = engine.instance().unwrap();
		let p = instance.position(id).unwrap();
		let t = &instance.transform;
		(p.x * t.k + t.x, p.y * t.k + t.y)
	}

	fn class_count(engine: &Engine, class: Class) -> usize {
		engine.instance().unwrap().elements_with(class).len()
	}

	#[test]
	fn scenario_a_force_layout_fits_everything() {
		let mut engine = engine();
		let mut now = 0.0;
		engine.update(scenario_graph(), now);
		assert_eq!(engine.layout_kind(), Some(LayoutKind::ForceDirected));
		assert_eq!(engine.phase(), RenderPhase::Rebuilding);

		settle(&mut engine, &mut now);
		assert_eq!(engine.phase(), RenderPhase::Stable);
		let instance = engine.instance().unwrap();
		assert_eq!(instance.last_fit(), Some(&FitTarget::All));
		assert_eq!(class_count(&engine, Class::Faded), 0);
		assert_eq!(class_count(&engine, Class::Selected), 0);

		// Every node is inside the viewport after fitting.
		for id in ["A", "B", "C"] {
			let (x, y) = screen_of(&engine, id);
			assert!((0.0..=800.0).contains(&x) && (0.0..=600.0).contains(&y));
		}
	}

	#[test]
	fn scenario_b_click_then_background() {
		let mut engine = engine();
		let clicked = Rc::new(RefCell::new(Vec::new()));
		let sink = clicked.clone();
		engine.set_on_node_click(Some(Box::new(move |node: &GraphNode, event: u32| {
			sink.borrow_mut().push((node.id.clone(), event));
		})));

		let mut now = 0.0;
		engine.update(scenario_graph(), now);
		settle(&mut engine, &mut now);

		let (x, y) = screen_of(&engine, "B");
		engine.click(x, y, 7, now);
		assert_eq!(*clicked.borrow(), [("B".to_string(), 7)]);
		assert_eq!(class_count(&engine, Class::Faded), 0);

		engine.click(2.0, 2.0, 8, now);
		assert_eq!(class_count(&engine, Class::Faded), 0);
		assert_eq!(clicked.borrow().len(), 1);
	}

	#[test]
	fn scenario_c_expansion_keeps_prior_positions() {
		let mut engine = engine();
		let mut now = 0.0;
		engine.update(
			props(
				vec![GraphNode::new("A"), GraphNode::new("B")],
				vec![GraphEdge::new("A", "B", 1.0)],
			),
			now,
		);
		settle(&mut engine, &mut now);
		let a = engine.instance().unwrap().position("A").unwrap();
		let b = engine.instance().unwrap().position("B").unwrap();

		engine.update(
			props(
				vec![
					GraphNode::new("A"),
					GraphNode::new("B"),
					GraphNode::new("C").with_level(1),
				],
				vec![GraphEdge::new("A", "B", 1.0), GraphEdge::new("B", "C", 1.0)],
			),
			now,
		);
		assert_eq!(engine.layout_kind(), Some(LayoutKind::Incremental));
		// No jump at rebuild time.
		assert_eq!(engine.instance().unwrap().position("A"), Some(a));
		assert_eq!(engine.instance().unwrap().position("B"), Some(b));

		settle(&mut engine, &mut now);
		let instance = engine.instance().unwrap();
		assert_eq!(instance.position("A"), Some(a));
		assert_eq!(instance.position("B"), Some(b));
		let c = instance.position("C").unwrap();
		assert!(c.distance(&a) > 1.0 && c.distance(&b) > 1.0);
		assert_eq!(instance.last_fit(), Some(&FitTarget::Nodes(vec!["C".to_string()])));
	}

	#[test]
	fn click_fades_outside_neighborhood() {
		let mut engine = engine();
		let mut now = 0.0;
		engine.update(
			props(
				["a", "b", "c", "d"].map(GraphNode::new).to_vec(),
				vec![
					GraphEdge::new("a", "b", 1.0),
					GraphEdge::new("b", "c", 1.0),
					GraphEdge::new("c", "d", 1.0),
				],
			),
			now,
		);
		settle(&mut engine, &mut now);

		let (x, y) = screen_of(&engine, "a");
		engine.click(x, y, 0, now);
		let instance = engine.instance().unwrap();
		assert!(instance.has_class(ElementRef::Node(2), Class::Faded));
		assert!(instance.has_class(ElementRef::Node(3), Class::Faded));
		assert!(!instance.has_class(ElementRef::Node(1), Class::Faded));
		let repaints = instance.repaints();

		engine.click(2.0, 2.0, 0, now);
		let instance = engine.instance().unwrap();
		assert_eq!(class_count(&engine, Class::Faded), 0);
		assert_eq!(instance.repaints(), repaints + 1);
	}

	#[test]
	fn edge_clicks_need_a_callback() {
		let mut engine = engine();
		let mut now = 0.0;
		engine.update(
			props(
				vec![GraphNode::new("a"), GraphNode::new("b")],
				vec![GraphEdge::new("a", "b", 2.0)],
			),
			now,
		);
		settle(&mut engine, &mut now);
		let (ax, ay) = screen_of(&engine, "a");
		let (bx, by) = screen_of(&engine, "b");
		let (mx, my) = ((ax + bx) / 2.0, (ay + by) / 2.0);

		engine.click(mx, my, 0, now);
		assert_eq!(class_count(&engine, Class::Selected), 0);

		let clicked = Rc::new(RefCell::new(Vec::new()));
		let sink = clicked.clone();
		engine.set_on_edge_click(Some(Box::new(move |edge: &GraphEdge, _| {
			sink.borrow_mut().push((edge.source.clone(), edge.target.clone()));
		})));
		engine.click(mx, my, 0, now);
		assert_eq!(*clicked.borrow(), [("a".to_string(), "b".to_string())]);
		assert!(engine.instance().unwrap().has_class(ElementRef::Edge(0), Class::Selected));

		engine.click(2.0, 2.0, 0, now);
		assert_eq!(class_count(&engine, Class::Selected), 0);
	}

	#[test]
	fn stale_lookup_skips_callback() {
		let mut engine = engine();
		let calls = Rc::new(RefCell::new(0));
		let sink = calls.clone();
		engine.set_on_node_click(Some(Box::new(move |_: &GraphNode, _| {
			*sink.borrow_mut() += 1;
		})));
		let mut now = 0.0;
		engine.update(scenario_graph(), now);
		settle(&mut engine, &mut now);

		// Parent data drifts away from the instance without a rebuild.
		engine.props.nodes.retain(|n| n.id != "B");
		let (x, y) = screen_of(&engine, "B");
		engine.click(x, y, 0, now);
		assert_eq!(*calls.borrow(), 0);
	}

	#[test]
	fn unchanged_structure_keeps_instance() {
		let mut engine = engine();
		let mut now = 0.0;
		engine.update(scenario_graph(), now);
		settle(&mut engine, &mut now);
		let before = engine.instance().unwrap().position("A");

		let mut next = scenario_graph();
		next.nodes.reverse();
		next.nodes[0].position = Some(Position::new(999.0, 999.0));
		next.selected_node = Some("C".into());
		engine.update(next, now);

		assert!(!engine.is_layout_running());
		assert_eq!(engine.phase(), RenderPhase::Stable);
		assert_eq!(engine.instance().unwrap().position("A"), before);
		let c = engine.instance().unwrap().node_index("C").unwrap();
		assert!(engine.instance().unwrap().has_class(ElementRef::Node(c), Class::Selected));
	}

	#[test]
	fn empty_nodes_tear_down() {
		let mut engine = engine();
		let mut now = 0.0;
		engine.update(scenario_graph(), now);
		settle(&mut engine, &mut now);

		engine.update(GraphProps::default(), now);
		assert!(engine.instance().is_none());
		assert_eq!(engine.phase(), RenderPhase::NoGraph);
		assert!(engine.last_rendered().nodes.is_empty());
		assert!(!engine.tick(now + 16.0));

		engine.update(scenario_graph(), now);
		assert!(engine.instance().is_some());
	}

	#[test]
	fn construction_failure_leaves_no_graph() {
		let mut engine: Engine =
			GraphEngine::new(Container::new(0.0, 0.0), EngineConfig::default(), Theme::default());
		engine.update(scenario_graph(), 0.0);
		assert!(engine.instance().is_none());
		assert_eq!(engine.phase(), RenderPhase::NoGraph);
		engine.click(10.0, 10.0, 0, 0.0);
		engine.reset_view();

		engine.resize(Container::new(800.0, 600.0));
		engine.update(scenario_graph(), 0.0);
		assert!(engine.instance().is_some());
	}

	#[test]
	fn new_structure_supersedes_running_layout() {
		let mut engine = engine();
		let mut now = 0.0;
		engine.update(scenario_graph(), now);
		now += 16.0;
		engine.tick(now);
		assert!(engine.is_layout_running());

		let mut next = scenario_graph();
		next.nodes.push(GraphNode::new("D"));
		engine.update(next, now);
		assert!(engine.is_layout_running());
		assert_eq!(engine.instance().unwrap().nodes().len(), 4);
		settle(&mut engine, &mut now);
		assert_eq!(engine.phase(), RenderPhase::Stable);
	}

	#[test]
	fn view_mode_switch_runs_cloud_layout() {
		let mut engine = engine();
		let mut now = 0.0;
		engine.update(scenario_graph(), now);
		settle(&mut engine, &mut now);

		let mut global = scenario_graph();
		global.view_mode = ViewMode::Global;
		engine.update(global, now);
		assert_eq!(engine.layout_kind(), Some(LayoutKind::TieredCloud));
		settle(&mut engine, &mut now);
		// B has the largest weighted degree and sits at the cloud center.
		let center = EngineConfig::default().cloud.center;
		assert_eq!(engine.instance().unwrap().position("B"), Some(center));
	}

	#[test]
	fn zoom_label_pass_is_debounced() {
		let mut engine = engine();
		let mut now = 0.0;
		engine.update(scenario_graph(), now);
		settle(&mut engine, &mut now);
		now += 200.0;
		engine.tick(now);

		for _ in 0..20 {
			engine.wheel(400.0, 300.0, 1.0, now);
			now += 10.0;
			engine.tick(now);
		}
		// Zoomed far out, but the pass has not run yet.
		assert_eq!(class_count(&engine, Class::LabelHidden), 0);

		now += 150.0;
		engine.tick(now);
		assert_eq!(class_count(&engine, Class::LabelHidden), 3);
	}

	#[test]
	fn teardown_cancels_pending_label_pass() {
		let mut engine = engine();
		let mut now = 0.0;
		engine.update(scenario_graph(), now);
		settle(&mut engine, &mut now);
		engine.wheel(400.0, 300.0, 1.0, now);
		engine.teardown();
		assert!(!engine.label_debounce.is_pending());
		assert!(!engine.tick(now + 500.0));
	}

	#[test]
	fn fading_follows_expansion_state_without_rebuild() {
		let mut engine = engine();
		let mut now = 0.0;
		let mut data = props(
			vec![
				GraphNode::new("root"),
				GraphNode::new("x").with_level(1),
				GraphNode::new("y").with_level(1),
			],
			vec![GraphEdge::new("root", "x", 1.0), GraphEdge::new("root", "y", 1.0)],
		);
		data.current_expansion_level = 1;
		engine.update(data.clone(), now);
		settle(&mut engine, &mut now);
		let root = engine.instance().unwrap().node_index("root").unwrap();
		assert!(engine.instance().unwrap().has_class(ElementRef::Node(root), Class::Superseded));

		data.expansion_path = vec![ExpansionPathEntry {
			node_id: "root".into(),
		}];
		engine.update(data, now);
		assert!(!engine.is_layout_running());
		assert_eq!(class_count(&engine, Class::Superseded), 0);
	}

	#[test]
	fn dragging_is_not_a_click() {
		let mut engine = engine();
		let calls = Rc::new(RefCell::new(0));
		let sink = calls.clone();
		engine.set_on_node_click(Some(Box::new(move |_: &GraphNode, _| {
			*sink.borrow_mut() += 1;
		})));
		let mut now = 0.0;
		engine.update(scenario_graph(), now);
		settle(&mut engine, &mut now);

		let (x, y) = screen_of(&engine, "A");
		engine.pointer_down(x, y);
		assert!(engine.pointer_move(x + 30.0, y));
		engine.pointer_up();
		engine.click(x + 30.0, y, 0, now);
		assert_eq!(*calls.borrow(), 0);

		let (nx, _) = screen_of(&engine, "A");
		assert!((nx - (x + 30.0)).abs() < 1e-6);
		assert!(engine.instance().unwrap().node("A").unwrap().data.locked);
	}

	#[test]
	fn edges_vanishing_are_cleared_in_place() {
		let mut engine = engine();
		let mut now = 0.0;
		engine.update(scenario_graph(), now);
		settle(&mut engine, &mut now);

		let mut next = scenario_graph();
		next.edges.clear();
		engine.update(next, now);
		assert!(!engine.is_layout_running());
		assert!(engine.instance().unwrap().edges().is_empty());
		assert!(engine.last_rendered().edges.is_empty());
	}

	#[test]
	fn fit_to_nodes_without_instance_is_noop() {
		let mut engine = engine();
		engine.fit_to_nodes();
		engine.update(scenario_graph(), 0.0);
		engine.fit_to_nodes();
		let ids: Vec<String> = ["A", "B", "C"].map(String::from).to_vec();
		assert_eq!(engine.instance().unwrap().last_fit(), Some(&FitTarget::Nodes(ids)));
	}

	#[test]
	fn parallel_edges_survive_selection_updates() {
		let mut engine = engine();
		let mut now = 0.0;
		let mut ortholog = GraphEdge::new("A", "B", 5.0);
		ortholog.edge_type = Some(EdgeType::Ortholog);
		let mut data = props(
			vec![GraphNode::new("A"), GraphNode::new("B")],
			vec![GraphEdge::new("A", "B", 1.0), ortholog],
		);
		engine.update(data.clone(), now);
		settle(&mut engine, &mut now);
		let edges = |engine: &Engine| -> Vec<(String, EdgeType)> {
			engine
				.instance()
				.unwrap()
				.edges()
				.iter()
				.map(|e| (e.data.id.clone(), e.data.edge_type))
				.collect()
		};
		let before = edges(&engine);
		assert_eq!(before[0].1, EdgeType::Primary);
		assert_eq!(before[1].1, EdgeType::Ortholog);
		assert_ne!(before[0].0, before[1].0);
		let repaints = engine.instance().unwrap().repaints();

		data.selected_node = Some("A".into());
		engine.update(data.clone(), now);
		data.selected_node = None;
		engine.update(data, now);
		assert!(!engine.is_layout_running());
		assert_eq!(edges(&engine), before);
		// Only the two selection batches repainted; nothing was restyled.
		assert_eq!(engine.instance().unwrap().repaints(), repaints + 2);
	}

	#[test]
	fn clicks_schedule_label_pass() {
		let mut engine = engine();
		let mut now = 0.0;
		engine.update(
			props(
				["a", "b", "c", "d"].map(GraphNode::new).to_vec(),
				vec![
					GraphEdge::new("a", "b", 1.0),
					GraphEdge::new("b", "c", 1.0),
					GraphEdge::new("c", "d", 1.0),
				],
			),
			now,
		);
		settle(&mut engine, &mut now);
		now += 200.0;
		engine.tick(now);
		let hidden = |engine: &Engine| engine.instance().unwrap().elements_with(Class::LabelHidden);
		let baseline = hidden(&engine);

		let (x, y) = screen_of(&engine, "a");
		engine.click(x, y, 0, now);
		assert!(engine.label_debounce.is_pending());
		now += 150.0;
		assert!(engine.tick(now));
		let instance = engine.instance().unwrap();
		assert!(instance.has_class(ElementRef::Node(2), Class::LabelHidden));
		assert!(instance.has_class(ElementRef::Node(3), Class::LabelHidden));

		engine.click(2.0, 2.0, 0, now);
		now += 150.0;
		engine.tick(now);
		assert_eq!(hidden(&engine), baseline);
	}

	#[test]
	fn level_change_refreshes_superseded_in_place() {
		let mut engine = engine();
		let mut now = 0.0;
		let mut data = props(
			vec![
				GraphNode::new("root"),
				GraphNode::new("x").with_level(1),
				GraphNode::new("y").with_level(1),
			],
			vec![GraphEdge::new("root", "x", 1.0), GraphEdge::new("root", "y", 1.0)],
		);
		data.current_expansion_level = 1;
		engine.update(data.clone(), now);
		settle(&mut engine, &mut now);
		let x = engine.instance().unwrap().node_index("x").unwrap();
		assert!(!engine.instance().unwrap().has_class(ElementRef::Node(x), Class::Superseded));

		// Same structure, level and path; only x's own level moves.
		data.nodes[1].expansion_level = Some(0);
		engine.update(data.clone(), now);
		assert!(!engine.is_layout_running());
		assert!(engine.instance().unwrap().has_class(ElementRef::Node(x), Class::Superseded));

		data.nodes[1].expansion_level = Some(1);
		engine.update(data, now);
		assert!(!engine.instance().unwrap().has_class(ElementRef::Node(x), Class::Superseded));
	}
}
