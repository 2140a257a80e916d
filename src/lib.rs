//! ppi-graph: Interactive protein-protein interaction network viewer.
//!
//! This crate provides a WASM-based network component for the genome portal.
//! It renders genes, their interactions and overlaid orthologs, and keeps the
//! picture stable while the user expands the network step by step.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, MouseEvent, Window};

pub mod components;

pub use components::network_graph::{
	EngineConfig, GraphEdge, GraphEngine, GraphError, GraphHandle, GraphNode, GraphProps,
	NetworkGraph, Theme, ViewMode,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("ppi-graph: logging initialized");
}

/// Text content of the `<script>` element with the given id.
fn script_text(id: &str) -> Option<String> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(id)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

/// Load graph data from a script element with id="graph-data".
/// Expected format: JSON with { nodes: [...], edges: [...], ... }
fn load_graph_data() -> Option<GraphProps> {
	let json_text = script_text("graph-data")?;
	match serde_json::from_str::<GraphProps>(&json_text).map_err(GraphError::from) {
		Ok(data) => {
			info!(
				"ppi-graph: loaded {} nodes, {} edges",
				data.nodes.len(),
				data.edges.len()
			);
			Some(data)
		}
		Err(e) => {
			warn!("ppi-graph: {}", e);
			None
		}
	}
}

/// Load engine overrides from a script element with id="graph-config".
fn load_config() -> EngineConfig {
	let Some(json_text) = script_text("graph-config") else {
		return EngineConfig::default();
	};
	EngineConfig::from_json(&json_text).unwrap_or_else(|e| {
		warn!("ppi-graph: ignoring graph config: {}", e);
		EngineConfig::default()
	})
}

/// Main application component.
/// Loads graph data from DOM and renders the network with view controls.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let base = load_graph_data().unwrap_or_default();
	let config = load_config();

	let view_mode = RwSignal::new(base.view_mode);
	let show_orthologs = RwSignal::new(base.show_orthologs);
	let selected = RwSignal::new(base.selected_node.clone());
	let handle = StoredValue::new_local(None::<GraphHandle>);

	let data = Signal::derive(move || GraphProps {
		view_mode: view_mode.get(),
		show_orthologs: show_orthologs.get(),
		selected_node: selected.get(),
		..base.clone()
	});

	let on_node_click = move |(node, _): (GraphNode, MouseEvent)| {
		info!("ppi-graph: selected {}", node.id);
		selected.set(Some(node.id));
	};
	let on_edge_click = move |(edge, _): (GraphEdge, MouseEvent)| {
		info!(
			"ppi-graph: interaction {} - {} ({:?})",
			edge.source, edge.target, edge.weight
		);
	};
	let on_ready = move |h: GraphHandle| handle.set_value(Some(h));

	let toggle_view = move |_| {
		view_mode.update(|mode| {
			*mode = match *mode {
				ViewMode::Focused => ViewMode::Global,
				ViewMode::Global => ViewMode::Focused,
			}
		})
	};
	let toggle_orthologs = move |_| show_orthologs.update(|show| *show = !*show);
	let reset_view = move |_| handle.with_value(|h| h.iter().for_each(GraphHandle::reset_view));
	let fit_nodes = move |_| handle.with_value(|h| h.iter().for_each(GraphHandle::fit_to_nodes));

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Interaction Network" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<NetworkGraph
				data=data
				on_node_click=on_node_click
				on_edge_click=on_edge_click
				on_ready=on_ready
				config=config
				fullscreen=true
			/>
			<div class="graph-overlay">
				<h1>"Interaction Network"</h1>
				<p class="subtitle">"Click a gene to highlight its partners. Scroll to zoom. Drag to pan."</p>
				<div class="graph-controls">
					<button on:click=toggle_view>
						{move || match view_mode.get() {
							ViewMode::Focused => "Global view",
							ViewMode::Global => "Focused view",
						}}
					</button>
					<button on:click=toggle_orthologs>
						{move || if show_orthologs.get() { "Hide orthologs" } else { "Show orthologs" }}
					</button>
					<button on:click=reset_view>"Reset view"</button>
					<button on:click=fit_nodes>"Fit nodes"</button>
				</div>
			</div>
		</div>
	}
}
