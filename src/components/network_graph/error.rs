//! Errors raised inside the viewer.
//!
//! None of these escape the engine: construction and teardown failures are
//! logged and swallowed so a broken visualization never takes the host page
//! down with it.

use thiserror::Error;

use super::instance::EventKind;

/// Failures the engine handles locally.
#[derive(Error, Debug)]
pub enum GraphError {
	/// The container has no usable size.
	#[error("invalid container size {width}x{height}")]
	InvalidContainer {
		/// Rejected width.
		width: f64,
		/// Rejected height.
		height: f64,
	},

	/// A listener was detached without having been attached.
	#[error("listener for {0:?} was not attached")]
	ListenerNotAttached(EventKind),

	/// Graph data or configuration JSON did not parse.
	#[error("failed to parse graph data: {0}")]
	DataParse(#[from] serde_json::Error),
}
