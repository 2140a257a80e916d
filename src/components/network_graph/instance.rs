//! The live rendering instance.
//!
//! Owns the render elements, their visual classes, the pan/zoom transform and
//! the set of event listeners the engine attached to it. An instance is built
//! for one node/edge structure and destroyed wholesale when that structure
//! changes; nothing but the engine ever holds it.

use std::collections::{HashMap, HashSet};

use super::config::{EngineConfig, FitConfig};
use super::error::GraphError;
use super::prepare::{RenderEdge, RenderNode};
use super::style::{self, EdgeStyle, NodeStyle, Theme, ViewFlags};
use super::types::Position;

/// Screen-space size of the element hosting the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Container {
	/// Width in CSS pixels.
	pub width: f64,
	/// Height in CSS pixels.
	pub height: f64,
}

impl Container {
	/// Creates a container of the given size.
	pub const fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	fn is_valid(&self) -> bool {
		self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
	}
}

/// Visual state flags layered on top of the base style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Class {
	/// Outside the clicked node's neighborhood.
	Faded,
	/// Clicked node or edge.
	Selected,
	/// Belongs to an older expansion level and is off the expansion path.
	Superseded,
	/// Label suppressed by the zoom pass.
	LabelHidden,
}

impl Class {
	const fn bit(self) -> u8 {
		match self {
			Class::Faded => 1,
			Class::Selected => 1 << 1,
			Class::Superseded => 1 << 2,
			Class::LabelHidden => 1 << 3,
		}
	}
}

/// Compact set of [`Class`] flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClassSet(u8);

impl ClassSet {
	/// True if `class` is set.
	pub fn contains(&self, class: Class) -> bool {
		self.0 & class.bit() != 0
	}

	/// Turns `class` on or off.
	pub fn set(&mut self, class: Class, on: bool) {
		if on {
			self.0 |= class.bit();
		} else {
			self.0 &= !class.bit();
		}
	}
}

/// Address of one element inside an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementRef {
	/// Index into [`GraphInstance::nodes`].
	Node(usize),
	/// Index into [`GraphInstance::edges`].
	Edge(usize),
}

/// Class mutations applied together, producing a single repaint.
#[derive(Clone, Debug, Default)]
pub struct ClassBatch {
	changes: Vec<(ElementRef, Class, bool)>,
}

impl ClassBatch {
	/// Turns `class` on for `element`.
	pub fn add(&mut self, element: ElementRef, class: Class) {
		self.changes.push((element, class, true));
	}

	/// Turns `class` off for `element`.
	pub fn remove(&mut self, element: ElementRef, class: Class) {
		self.changes.push((element, class, false));
	}

	/// Sets `class` on `element` to `on`.
	pub fn set(&mut self, element: ElementRef, class: Class, on: bool) {
		self.changes.push((element, class, on));
	}

	/// Number of queued changes.
	pub fn len(&self) -> usize {
		self.changes.len()
	}

	/// True when nothing is queued.
	pub fn is_empty(&self) -> bool {
		self.changes.is_empty()
	}
}

/// Events the engine can subscribe to on an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
	/// A node was clicked.
	NodeTap,
	/// An edge was clicked.
	EdgeTap,
	/// The empty canvas was clicked.
	BackgroundTap,
	/// The zoom level changed.
	Zoom,
	/// A layout run finished.
	LayoutStop,
}

/// A node as drawn.
#[derive(Clone, Debug)]
pub struct NodeElement {
	/// Prepared data the element was built from.
	pub data: RenderNode,
	/// Current position in graph coordinates.
	pub position: Position,
	/// Base style before classes are applied.
	pub style: NodeStyle,
	/// Visual state flags.
	pub classes: ClassSet,
}

/// An edge as drawn, with endpoints resolved to node indices.
#[derive(Clone, Debug)]
pub struct EdgeElement {
	/// Prepared data the element was built from.
	pub data: RenderEdge,
	/// Index of the source node.
	pub source: usize,
	/// Index of the target node.
	pub target: usize,
	/// Base style before classes are applied.
	pub style: EdgeStyle,
	/// Visual state flags.
	pub classes: ClassSet,
}

/// Pan and zoom transform applied to the entire graph view.
#[derive(Clone, Debug)]
pub struct ViewTransform {
	/// Horizontal offset in screen pixels.
	pub x: f64,
	/// Vertical offset in screen pixels.
	pub y: f64,
	/// Zoom factor (1.0 = 100%).
	pub k: f64,
}

/// Tracks an in-progress node drag operation.
#[derive(Clone, Debug, Default)]
pub struct DragState {
	/// True between press and release on a node.
	pub active: bool,
	/// Node being dragged, if any.
	pub node_idx: Option<usize>,
	/// Screen x of the press.
	pub start_x: f64,
	/// Screen y of the press.
	pub start_y: f64,
	/// Node position when the drag began.
	pub node_start: Position,
}

/// Tracks an in-progress canvas pan operation.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	/// True between press and release on the background.
	pub active: bool,
	/// Screen x of the press.
	pub start_x: f64,
	/// Screen y of the press.
	pub start_y: f64,
	/// Transform x when the pan began.
	pub transform_start_x: f64,
	/// Transform y when the pan began.
	pub transform_start_y: f64,
}

/// What the viewport was last fitted to.
#[derive(Clone, Debug, PartialEq)]
pub enum FitTarget {
	/// Every node.
	All,
	/// The nodes with these ids.
	Nodes(Vec<String>),
}

/// Minimum hit radius in screen pixels, so tiny nodes stay clickable.
const MIN_HIT_PX: f64 = 6.0;
const EDGE_HIT_PX: f64 = 4.0;

/// Elements, classes and view state of one rendered graph.
pub struct GraphInstance {
	container: Container,
	fit_config: FitConfig,
	nodes: Vec<NodeElement>,
	edges: Vec<EdgeElement>,
	index: HashMap<String, usize>,
	listeners: HashSet<EventKind>,
	/// Current pan and zoom.
	pub transform: ViewTransform,
	/// In-progress node drag.
	pub drag: DragState,
	/// In-progress background pan.
	pub pan: PanState,
	last_fit: Option<FitTarget>,
	repaints: u64,
}

impl GraphInstance {
	/// Builds an instance for the given elements.
	///
	/// Edges whose endpoints are not part of `nodes` are dropped. Nodes
	/// without a position start at the origin until a layout places them.
	pub fn new(
		container: Container,
		nodes: Vec<RenderNode>,
		edges: Vec<RenderEdge>,
		config: &EngineConfig,
	) -> Result<Self, GraphError> {
		if !container.is_valid() {
			return Err(GraphError::InvalidContainer {
				width: container.width,
				height: container.height,
			});
		}

		let mut index = HashMap::with_capacity(nodes.len());
		let nodes: Vec<NodeElement> = nodes
			.into_iter()
			.enumerate()
			.map(|(i, data)| {
				index.insert(data.id.clone(), i);
				NodeElement {
					position: data.position.unwrap_or_default(),
					data,
					style: NodeStyle::default(),
					classes: ClassSet::default(),
				}
			})
			.collect();

		let mut dropped = 0;
		let edges = edges
			.into_iter()
			.filter_map(|data| match (index.get(&data.source), index.get(&data.target)) {
				(Some(&source), Some(&target)) => Some(EdgeElement {
					data,
					source,
					target,
					style: EdgeStyle::default(),
					classes: ClassSet::default(),
				}),
				_ => {
					dropped += 1;
					None
				}
			})
			.collect();
		if dropped > 0 {
			log::warn!("ppi-graph: dropped {} edges with unknown endpoints", dropped);
		}

		Ok(Self {
			container,
			fit_config: config.fit.clone(),
			nodes,
			edges,
			index,
			listeners: HashSet::new(),
			transform: ViewTransform {
				x: container.width / 2.0,
				y: container.height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			last_fit: None,
			repaints: 0,
		})
	}

	/// Current container size.
	pub fn container(&self) -> Container {
		self.container
	}

	/// Adopts a new container size. Invalid sizes are ignored.
	pub fn resize(&mut self, container: Container) {
		if container.is_valid() {
			self.container = container;
		}
	}

	/// Node elements in insertion order.
	pub fn nodes(&self) -> &[NodeElement] {
		&self.nodes
	}

	/// Edge elements in insertion order.
	pub fn edges(&self) -> &[EdgeElement] {
		&self.edges
	}

	/// Index of the node with the given id.
	pub fn node_index(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	/// The node with the given id.
	pub fn node(&self, id: &str) -> Option<&NodeElement> {
		self.node_index(id).map(|i| &self.nodes[i])
	}

	/// Index of the edge with the given render id.
	pub fn edge_index(&self, id: &str) -> Option<usize> {
		self.edges.iter().position(|edge| edge.data.id == id)
	}

	/// Position of the node with the given id.
	pub fn position(&self, id: &str) -> Option<Position> {
		self.node(id).map(|node| node.position)
	}

	/// Moves a node by id. Returns false if there is no such node.
	pub fn set_position(&mut self, id: &str, position: Position) -> bool {
		match self.node_index(id) {
			Some(i) => {
				self.nodes[i].position = position;
				true
			}
			None => false,
		}
	}

	pub(crate) fn set_position_at(&mut self, index: usize, position: Position) {
		if let Some(node) = self.nodes.get_mut(index) {
			node.position = position;
		}
	}

	/// Locks or unlocks the node at `index` against layout moves.
	pub fn set_locked(&mut self, index: usize, locked: bool) {
		if let Some(node) = self.nodes.get_mut(index) {
			node.data.locked = locked;
		}
	}

	/// Copies non-structural data (labels, types, weights, path membership)
	/// onto matching elements, leaving positions and locks alone. Returns true
	/// if anything changed.
	pub fn refresh_data(&mut self, nodes: &[RenderNode], edges: &[RenderEdge]) -> bool {
		let mut changed = false;
		for fresh in nodes {
			let Some(&i) = self.index.get(&fresh.id) else {
				continue;
			};
			let data = &mut self.nodes[i].data;
			let updated = RenderNode {
				position: data.position,
				locked: data.locked,
				..fresh.clone()
			};
			if *data != updated {
				*data = updated;
				changed = true;
			}
		}

		// Match by id first, then by endpoints for records whose id moved.
		// Each live edge is claimed at most once.
		let mut claimed = vec![false; self.edges.len()];
		let mut pending = Vec::new();
		for fresh in edges {
			match self.edges.iter().position(|e| e.data.id == fresh.id) {
				Some(i) if !claimed[i] => {
					claimed[i] = true;
					changed |= self.refresh_edge(i, fresh);
				}
				_ => pending.push(fresh),
			}
		}
		for fresh in pending {
			let slot = self.edges.iter().enumerate().position(|(i, e)| {
				!claimed[i] && e.data.source == fresh.source && e.data.target == fresh.target
			});
			if let Some(i) = slot {
				claimed[i] = true;
				changed |= self.refresh_edge(i, fresh);
			}
		}
		changed
	}

	fn refresh_edge(&mut self, index: usize, fresh: &RenderEdge) -> bool {
		let edge = &mut self.edges[index];
		if edge.data == *fresh {
			return false;
		}
		edge.data = fresh.clone();
		true
	}

	/// Removes every edge without touching node positions.
	pub fn clear_edges(&mut self) {
		self.edges.clear();
		self.repaints += 1;
	}

	/// Recomputes base styles for all elements.
	pub fn restyle(&mut self, flags: &ViewFlags, theme: &Theme) {
		for node in &mut self.nodes {
			node.style = style::resolve_node_style(&node.data, flags, theme);
		}
		for edge in &mut self.edges {
			edge.style = style::resolve_edge_style(&edge.data, flags, theme);
		}
		self.repaints += 1;
	}

	/// True if `element` carries `class`.
	pub fn has_class(&self, element: ElementRef, class: Class) -> bool {
		self.classes(element).is_some_and(|c| c.contains(class))
	}

	fn classes(&self, element: ElementRef) -> Option<&ClassSet> {
		match element {
			ElementRef::Node(i) => self.nodes.get(i).map(|n| &n.classes),
			ElementRef::Edge(i) => self.edges.get(i).map(|e| &e.classes),
		}
	}

	/// Every element currently carrying `class`.
	pub fn elements_with(&self, class: Class) -> Vec<ElementRef> {
		let nodes = self
			.nodes
			.iter()
			.enumerate()
			.filter(|(_, n)| n.classes.contains(class))
			.map(|(i, _)| ElementRef::Node(i));
		let edges = self
			.edges
			.iter()
			.enumerate()
			.filter(|(_, e)| e.classes.contains(class))
			.map(|(i, _)| ElementRef::Edge(i));
		nodes.chain(edges).collect()
	}

	/// Applies all class changes of a batch, counting one repaint.
	pub fn apply_batch(&mut self, batch: ClassBatch) {
		if batch.is_empty() {
			return;
		}
		for (element, class, on) in batch.changes {
			let classes = match element {
				ElementRef::Node(i) => self.nodes.get_mut(i).map(|n| &mut n.classes),
				ElementRef::Edge(i) => self.edges.get_mut(i).map(|e| &mut e.classes),
			};
			if let Some(classes) = classes {
				classes.set(class, on);
			}
		}
		self.repaints += 1;
	}

	/// Number of repaints requested so far.
	pub fn repaints(&self) -> u64 {
		self.repaints
	}

	/// The node itself, its incident edges and their endpoints.
	pub fn neighborhood(&self, node: usize) -> (HashSet<usize>, HashSet<usize>) {
		let mut nodes = HashSet::from([node]);
		let mut edges = HashSet::new();
		for (i, edge) in self.edges.iter().enumerate() {
			if edge.source == node || edge.target == node {
				edges.insert(i);
				nodes.insert(edge.source);
				nodes.insert(edge.target);
			}
		}
		(nodes, edges)
	}

	/// Subscribes to `kind`.
	pub fn on(&mut self, kind: EventKind) {
		self.listeners.insert(kind);
	}

	/// Unsubscribes from `kind`, failing if it was never attached.
	pub fn off(&mut self, kind: EventKind) -> Result<(), GraphError> {
		if self.listeners.remove(&kind) {
			Ok(())
		} else {
			Err(GraphError::ListenerNotAttached(kind))
		}
	}

	/// True while subscribed to `kind`.
	pub fn is_listening(&self, kind: EventKind) -> bool {
		self.listeners.contains(&kind)
	}

	/// Tears the instance down, detaching the given listeners first.
	///
	/// Every listener is detached even if one fails; the first failure is
	/// reported.
	pub fn destroy(mut self, attached: &[EventKind]) -> Result<(), GraphError> {
		let mut result = Ok(());
		for &kind in attached {
			if let Err(e) = self.off(kind) {
				if result.is_ok() {
					result = Err(e);
				}
			}
		}
		self.nodes.clear();
		self.edges.clear();
		result
	}

	/// Target of the most recent successful fit.
	pub fn last_fit(&self) -> Option<&FitTarget> {
		self.last_fit.as_ref()
	}

	/// Fits the viewport to the target nodes. Returns false if nothing matched.
	pub fn fit(&mut self, target: FitTarget) -> bool {
		let indices: Vec<usize> = match &target {
			FitTarget::All => (0..self.nodes.len()).collect(),
			FitTarget::Nodes(ids) => ids.iter().filter_map(|id| self.node_index(id)).collect(),
		};
		if indices.is_empty() {
			return false;
		}

		let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
		let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
		for &i in &indices {
			let node = &self.nodes[i];
			let r = node.style.size / 2.0;
			min_x = min_x.min(node.position.x - r);
			min_y = min_y.min(node.position.y - r);
			max_x = max_x.max(node.position.x + r);
			max_y = max_y.max(node.position.y + r);
		}

		let config = &self.fit_config;
		let (w, h) = (max_x - min_x, max_y - min_y);
		let avail_w = (self.container.width - 2.0 * config.padding).max(1.0);
		let avail_h = (self.container.height - 2.0 * config.padding).max(1.0);
		let k = if w < 1.0 && h < 1.0 {
			config.single_node_zoom
		} else {
			(avail_w / w.max(1.0)).min(avail_h / h.max(1.0))
		}
		.clamp(config.min_zoom, config.max_zoom);

		let (cx, cy) = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
		self.transform = ViewTransform {
			x: self.container.width / 2.0 - cx * k,
			y: self.container.height / 2.0 - cy * k,
			k,
		};
		self.last_fit = Some(target);
		self.repaints += 1;
		true
	}

	/// Zooms by `factor` keeping the screen point under the cursor fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64, min_k: f64, max_k: f64) {
		let new_k = (self.transform.k * factor).clamp(min_k, max_k);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// Converts a screen point to graph coordinates.
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> Position {
		Position::new(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Topmost node under a screen point.
	pub fn node_at(&self, sx: f64, sy: f64) -> Option<usize> {
		let p = self.screen_to_graph(sx, sy);
		let min_hit = MIN_HIT_PX / self.transform.k;
		// Later nodes are drawn on top, so the last hit wins.
		self.nodes
			.iter()
			.enumerate()
			.rev()
			.find(|(_, node)| node.position.distance(&p) <= (node.style.size / 2.0).max(min_hit))
			.map(|(i, _)| i)
	}

	/// Nearest edge within hit tolerance of a screen point.
	pub fn edge_at(&self, sx: f64, sy: f64) -> Option<usize> {
		let p = self.screen_to_graph(sx, sy);
		let tolerance = EDGE_HIT_PX / self.transform.k;
		self.edges
			.iter()
			.enumerate()
			.map(|(i, edge)| {
				let a = self.nodes[edge.source].position;
				let b = self.nodes[edge.target].position;
				(i, segment_distance(&p, &a, &b), edge.style.width / 2.0)
			})
			.filter(|(_, d, half_width)| *d <= half_width.max(tolerance))
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(i, _, _)| i)
	}
}

fn segment_distance(p: &Position, a: &Position, b: &Position) -> f64 {
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let len_sq = dx * dx + dy * dy;
	if len_sq < 1e-12 {
		return p.distance(a);
	}
	let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
	p.distance(&Position::new(a.x + t * dx, a.y + t * dy))
}
