//! Leptos component wrapping the network graph canvas.
//!
//! The component owns one [`GraphEngine`] in a local stored value, feeds it the
//! reactive `data` signal, and forwards mouse and wheel input to it. An
//! animation loop runs via `requestAnimationFrame`, ticking the engine and
//! repainting each frame. Unmounting cancels the pending frame, removes the
//! window resize listener and tears the engine down, abandoning any running
//! layout or pending label pass.

use std::cell::Cell;
use std::rc::Rc;

use leptos::prelude::*;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::config::EngineConfig;
use super::engine::{GraphEngine, RenderedElements};
use super::instance::{Container, GraphInstance};
use super::render;
use super::style::Theme;
use super::types::{GraphEdge, GraphNode, GraphProps};

type Engine = StoredValue<GraphEngine<MouseEvent>, LocalStorage>;
type FrameCallback = StoredValue<Option<Closure<dyn FnMut()>>, LocalStorage>;
type Frames = StoredValue<FrameLoop, LocalStorage>;

/// Imperative access to a mounted graph, handed out through `on_ready`.
///
/// Every method is a no-op (or returns a neutral value) once the component
/// has been unmounted or while no graph is shown.
#[derive(Clone, Copy)]
pub struct GraphHandle {
	engine: Engine,
}

impl GraphHandle {
	/// Fits the viewport to every element.
	pub fn reset_view(&self) {
		self.engine.try_update_value(|e| e.reset_view());
	}

	/// Fits the viewport to all current nodes, or resets it if there are none.
	pub fn fit_to_nodes(&self) {
		self.engine.try_update_value(|e| e.fit_to_nodes());
	}

	/// True while a layout run is animating.
	pub fn is_layout_running(&self) -> bool {
		self.engine
			.try_with_value(|e| e.is_layout_running())
			.unwrap_or(false)
	}

	/// The element records most recently handed to the renderer.
	pub fn last_rendered(&self) -> RenderedElements {
		self.engine
			.try_with_value(|e| e.last_rendered().clone())
			.unwrap_or_default()
	}

	/// Runs `f` against the live instance, if there is one.
	pub fn with_instance<R>(&self, f: impl FnOnce(&GraphInstance) -> R) -> Option<R> {
		self.engine.try_with_value(|e| e.instance().map(f)).flatten()
	}
}

fn now_ms() -> f64 {
	web_sys::window()
		.and_then(|w| w.performance())
		.map(|p| p.now())
		.unwrap_or(0.0)
}

/// Bookkeeping for the `requestAnimationFrame` loop.
#[derive(Debug, Default)]
struct FrameLoop {
	pending: Option<i32>,
	stopped: bool,
}

impl FrameLoop {
	fn is_running(&self) -> bool {
		!self.stopped
	}

	fn requested(&mut self, id: i32) {
		self.pending = Some(id);
	}

	/// Marks the pending frame as delivered. Returns false once stopped.
	fn fired(&mut self) -> bool {
		self.pending = None;
		!self.stopped
	}

	/// Stops the loop, returning the frame that still has to be cancelled.
	fn stop(&mut self) -> Option<i32> {
		self.stopped = true;
		self.pending.take()
	}
}

fn request_frame(animate: FrameCallback, frames: Frames) {
	if !frames.try_with_value(FrameLoop::is_running).unwrap_or(false) {
		return;
	}
	let Some(window) = web_sys::window() else {
		return;
	};
	let id = animate
		.try_with_value(|cb| {
			cb.as_ref()
				.and_then(|cb| window.request_animation_frame(cb.as_ref().unchecked_ref()).ok())
		})
		.flatten();
	if let Some(id) = id {
		frames.try_update_value(|f| f.requested(id));
	}
}

/// Stops the frame loop, detaches the window listener and tears the engine
/// down. Closures are dropped after the browser has released them.
fn unmount(engine: Engine, animate: FrameCallback, resize_cb: FrameCallback, frames: Frames) {
	let frame = frames.try_update_value(FrameLoop::stop).flatten();
	let resize = resize_cb.try_update_value(Option::take).flatten();
	if frame.is_some() || resize.is_some() {
		if let Some(window) = web_sys::window() {
			if let Some(id) = frame {
				let _ = window.cancel_animation_frame(id);
			}
			if let Some(cb) = &resize {
				let _ = window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}
	}
	drop(resize);
	animate.try_update_value(|cb| drop(cb.take()));
	engine.try_update_value(|e| e.teardown());
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	let w = window.inner_width().ok()?.as_f64()?;
	let h = window.inner_height().ok()?.as_f64()?;
	Some((w, h))
}

fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok()??.dyn_into().ok()
}

/// Renders an interactive protein-protein interaction network on a canvas.
///
/// Pass graph data via the reactive `data` signal. Structural changes (the
/// node set, the edge set or the view mode) rebuild the graph with preserved
/// positions; everything else is applied in place. The component sizes itself
/// to its parent container by default; set `fullscreen = true` to fill the
/// viewport and resize automatically with the window.
#[component]
pub fn NetworkGraph(
	/// Graph data and view state from the parent.
	#[prop(into)]
	data: Signal<GraphProps>,
	/// Called with the clicked node and the raw event.
	#[prop(optional, into)]
	on_node_click: Option<Callback<(GraphNode, MouseEvent)>>,
	/// Called with the clicked edge and the raw event. Edges are only
	/// clickable while this is set.
	#[prop(optional, into)]
	on_edge_click: Option<Callback<(GraphEdge, MouseEvent)>>,
	/// Receives the imperative handle once, at mount.
	#[prop(optional, into)]
	on_ready: Option<Callback<GraphHandle>>,
	/// Engine tuning. Defaults apply when omitted.
	#[prop(optional)]
	config: Option<EngineConfig>,
	/// Colors and sizes. Defaults apply when omitted.
	#[prop(optional)]
	theme: Option<Theme>,
	/// Fill the viewport and follow window resizes.
	#[prop(default = false)]
	fullscreen: bool,
	/// Fixed width in pixels; the parent's width otherwise.
	#[prop(default = None)]
	width: Option<f64>,
	/// Fixed height in pixels; the parent's height otherwise.
	#[prop(default = None)]
	height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();

	let mut engine = GraphEngine::new(
		Container::new(0.0, 0.0),
		config.unwrap_or_default(),
		theme.unwrap_or_default(),
	);
	if let Some(callback) = on_node_click {
		engine.set_on_node_click(Some(Box::new(move |node: &GraphNode, ev| {
			callback.run((node.clone(), ev))
		})));
	}
	if let Some(callback) = on_edge_click {
		engine.set_on_edge_click(Some(Box::new(move |edge: &GraphEdge, ev| {
			callback.run((edge.clone(), ev))
		})));
	}
	let engine: Engine = StoredValue::new_local(engine);
	if let Some(callback) = on_ready {
		callback.run(GraphHandle { engine });
	}

	let mounted = Rc::new(Cell::new(false));
	let animate: FrameCallback = StoredValue::new_local(None);
	let resize_cb: FrameCallback = StoredValue::new_local(None);
	let frames: Frames = StoredValue::new_local(FrameLoop::default());

	on_cleanup(move || unmount(engine, animate, resize_cb, frames));

	Effect::new(move |_| {
		let props = data.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();

		if !mounted.replace(true) {
			let Some(window) = web_sys::window() else {
				return;
			};
			let (w, h) = if fullscreen {
				window_size(&window).unwrap_or((800.0, 600.0))
			} else {
				let parent = canvas.parent_element();
				(
					width.unwrap_or_else(|| parent.as_ref().map_or(800.0, |p| p.client_width() as f64)),
					height.unwrap_or_else(|| parent.as_ref().map_or(600.0, |p| p.client_height() as f64)),
				)
			};
			canvas.set_width(w as u32);
			canvas.set_height(h as u32);
			engine.update_value(|e| e.resize(Container::new(w, h)));

			let Some(ctx) = context_2d(&canvas) else {
				warn!("ppi-graph: canvas has no 2d context");
				return;
			};

			if fullscreen {
				let canvas_resize = canvas.clone();
				let cb: Closure<dyn FnMut()> = Closure::new(move || {
					let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
						return;
					};
					canvas_resize.set_width(nw as u32);
					canvas_resize.set_height(nh as u32);
					engine.try_update_value(|e| e.resize(Container::new(nw, nh)));
				});
				let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
				resize_cb.try_update_value(|slot| *slot = Some(cb));
			}

			let cb: Closure<dyn FnMut()> = Closure::new(move || {
				if !frames.try_update_value(FrameLoop::fired).unwrap_or(false) {
					return;
				}
				let alive = engine
					.try_update_value(|e| {
						e.tick(now_ms());
						match e.instance() {
							Some(instance) => render::render(instance, &ctx, e.theme(), e.show_orthologs()),
							None => ctx.clear_rect(0.0, 0.0, canvas.width() as f64, canvas.height() as f64),
						}
					})
					.is_some();
				if alive {
					request_frame(animate, frames);
				}
			});
			animate.try_update_value(|slot| *slot = Some(cb));
			request_frame(animate, frames);
		}

		engine.update_value(|e| e.update(props, now_ms()));
	});

	let on_mousedown = move |ev: MouseEvent| {
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			engine.update_value(|e| e.pointer_down(x, y));
		}
	};

	let on_mousemove = move |ev: MouseEvent| {
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			engine.update_value(|e| {
				e.pointer_move(x, y);
			});
		}
	};

	let on_mouseup = move |_: MouseEvent| {
		engine.update_value(|e| e.pointer_up());
	};

	let on_mouseleave = move |_: MouseEvent| {
		engine.update_value(|e| e.pointer_up());
	};

	let on_click = move |ev: MouseEvent| {
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			engine.update_value(|e| e.click(x, y, ev, now_ms()));
		}
	};

	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			engine.update_value(|e| e.wheel(x, y, ev.delta_y(), now_ms()));
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="network-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:click=on_click
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stopping_hands_back_the_pending_frame() {
		let mut frames = FrameLoop::default();
		frames.requested(3);
		assert!(frames.fired());
		frames.requested(4);

		assert_eq!(frames.stop(), Some(4));
		assert!(!frames.is_running());
		// A frame already queued by the browser must not reschedule.
		assert!(!frames.fired());
		assert_eq!(frames.stop(), None);
	}

	#[test]
	fn unmount_cleanup_tears_the_engine_down() {
		let owner = Owner::new();
		let (engine, frames) = owner.with(|| {
			let engine: Engine = StoredValue::new_local(GraphEngine::new(
				Container::new(800.0, 600.0),
				EngineConfig::default(),
				Theme::default(),
			));
			engine.update_value(|e| {
				e.update(
					GraphProps {
						nodes: vec![GraphNode::new("a")],
						..Default::default()
					},
					0.0,
				)
			});
			let animate: FrameCallback = StoredValue::new_local(None);
			let resize_cb: FrameCallback = StoredValue::new_local(None);
			let frames: Frames = StoredValue::new_local(FrameLoop::default());
			on_cleanup(move || unmount(engine, animate, resize_cb, frames));
			(engine, frames)
		});
		let handle = GraphHandle { engine };
		assert!(handle.is_layout_running());
		assert_eq!(handle.with_instance(|i| i.nodes().len()), Some(1));

		owner.cleanup();
		assert!(handle.with_instance(|i| i.nodes().len()).is_none());
		assert!(!handle.is_layout_running());
		assert_ne!(frames.try_with_value(FrameLoop::is_running), Some(true));
	}
}
