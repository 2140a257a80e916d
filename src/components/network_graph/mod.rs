//! Interactive protein-protein interaction network viewer.
//!
//! Renders a gene/ortholog interaction network on an HTML canvas with:
//! - Three layout strategies: force-directed for a fresh graph, incremental
//!   placement around locked nodes after an expansion, and a deterministic
//!   tiered cloud for the global overview
//! - Position preservation across structural rebuilds
//! - Click-driven neighborhood highlighting and edge selection
//! - Expansion-path fading and zoom-dependent label density
//!
//! The [`GraphEngine`] holds all of this as plain Rust state and can be driven
//! without a browser; [`NetworkGraph`] is the Leptos wrapper that feeds it
//! DOM input and animation frames.
//!
//! # Example
//!
//! ```ignore
//! use ppi_graph::{GraphEdge, GraphNode, GraphProps, NetworkGraph};
//!
//! let props = GraphProps {
//!     nodes: vec![GraphNode::new("PA0001"), GraphNode::new("PA0002")],
//!     edges: vec![GraphEdge::new("PA0001", "PA0002", 0.9)],
//!     ..Default::default()
//! };
//!
//! view! {
//!     <NetworkGraph
//!         data=Signal::derive(move || props.clone())
//!         on_node_click=move |(node, _ev)| log::info!("clicked {}", node.id)
//!         fullscreen=true
//!     />
//! }
//! ```

mod component;
pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod fading;
pub mod instance;
pub mod interaction;
pub mod layout;
pub mod positions;
pub mod prepare;
mod render;
pub mod style;
pub mod types;
pub mod zoom;

pub use component::{GraphHandle, NetworkGraph};
pub use config::EngineConfig;
pub use engine::{GraphEngine, RenderPhase, RenderedElements};
pub use error::GraphError;
pub use style::Theme;
pub use types::{EdgeType, ExpansionPathEntry, GraphEdge, GraphNode, GraphProps, NodeType, Position, ViewMode};
