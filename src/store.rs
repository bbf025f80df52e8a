//! Graph state store and the refresh pipeline feeding it.
//!
//! The store holds the last committed graph plus loading/error status. Canvas
//! interactions arrive as [`GraphEvent`]s and edit local state directly; a
//! refresh rebuilds everything from the server and discards those edits.

use std::cell::RefCell;

use leptos::prelude::{RwSignal, Update};
use log::{info, warn};

use crate::graph::{Edge, Graph, Node, Position, build_graph};
use crate::routing::{Fetcher, RoutingTransport, Sleeper};

/// Shown when a failure carries no message of its own.
pub const UNKNOWN_FETCH_ERROR: &str = "Unknown error while fetching routing data";

/// Interactions reported by the rendering surface.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphEvent {
	/// A card was dragged to `position`.
	NodePositionChanged {
		/// Node that moved.
		id: String,
		/// New top-left corner.
		position: Position,
	},
	/// A card was removed. The canvas never emits this itself.
	NodeRemoved {
		/// Node to drop, along with its edges.
		id: String,
	},
	/// A card was clicked.
	NodeSelected {
		/// Node that was clicked.
		id: String,
	},
	/// Empty canvas was clicked.
	SelectionCleared,
	/// A connection was drawn between two cards.
	EdgeCreated {
		/// Card the gesture started on.
		source: String,
		/// Card the gesture ended on.
		target: String,
	},
	/// A selected edge was deleted.
	EdgeDeleted {
		/// Edge to drop.
		id: String,
	},
}

/// Current graph plus refresh status.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphStore {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	loading: bool,
	error: Option<String>,
	node_count: usize,
	edge_count: usize,
	manual_edges: u64,
}

impl GraphStore {
	/// Nodes as last committed or edited.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// Edges as last committed or edited, including hand-drawn ones.
	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	/// A refresh is in flight.
	pub fn loading(&self) -> bool {
		self.loading
	}

	/// Message from the last failed refresh.
	pub fn error(&self) -> Option<&str> {
		self.error.as_deref()
	}

	/// Topics in the last committed build.
	pub fn node_count(&self) -> usize {
		self.node_count
	}

	/// Connections in the last committed build. Local edits do not change it.
	pub fn edge_count(&self) -> usize {
		self.edge_count
	}

	/// Mark a refresh as started and clear the previous error.
	pub fn begin_refresh(&mut self) {
		self.loading = true;
		self.error = None;
	}

	/// Mark the refresh as settled.
	pub fn finish_refresh(&mut self) {
		self.loading = false;
	}

	/// Replace nodes, edges and counts in one step.
	pub fn commit(&mut self, graph: Graph) {
		self.node_count = graph.nodes.len();
		self.edge_count = graph.edges.len();
		self.nodes = graph.nodes;
		self.edges = graph.edges;
	}

	/// Record a failed refresh. The previous graph stays on screen.
	pub fn fail(&mut self, message: &str) {
		let message = message.trim();
		self.error = Some(if message.is_empty() {
			UNKNOWN_FETCH_ERROR.to_string()
		} else {
			message.to_string()
		});
	}

	/// Drop everything, as on logout.
	pub fn clear(&mut self) {
		*self = Self::default();
	}

	/// Apply a canvas interaction. Returns whether the store changed.
	///
	/// Selection events belong to [`crate::selection::Selection`] and are ignored here.
	pub fn apply(&mut self, event: &GraphEvent) -> bool {
		match event {
			GraphEvent::NodePositionChanged { id, position } => {
				match self.nodes.iter_mut().find(|n| &n.id == id) {
					Some(node) if node.position != *position => {
						node.position = *position;
						true
					}
					_ => false,
				}
			}
			GraphEvent::NodeRemoved { id } => {
				let before = self.nodes.len();
				self.nodes.retain(|n| &n.id != id);
				self.nodes.len() != before
			}
			GraphEvent::EdgeDeleted { id } => {
				let before = self.edges.len();
				self.edges.retain(|e| &e.id != id);
				self.edges.len() != before
			}
			GraphEvent::EdgeCreated { source, target } => {
				self.manual_edges += 1;
				self.edges.push(Edge {
					id: format!("manual-{}-{source}-{target}", self.manual_edges),
					source: source.clone(),
					target: target.clone(),
					label: String::new(),
					flow: None,
					animated: false,
				});
				true
			}
			GraphEvent::NodeSelected { .. } | GraphEvent::SelectionCleared => false,
		}
	}
}

/// Somewhere a [`GraphStore`] lives: a reactive signal in the app, a `RefCell` in tests.
pub trait StoreCell {
	/// Run `f` against the stored value.
	fn update_store(&self, f: impl FnOnce(&mut GraphStore));
}

impl StoreCell for RefCell<GraphStore> {
	fn update_store(&self, f: impl FnOnce(&mut GraphStore)) {
		f(&mut self.borrow_mut());
	}
}

impl StoreCell for RwSignal<GraphStore> {
	fn update_store(&self, f: impl FnOnce(&mut GraphStore)) {
		// A disposed signal means the view is gone; nothing left to update.
		let _ = self.try_update(f);
	}
}

/// Clears `loading` however the refresh ends, including when its future is dropped.
struct LoadingGuard<'a, C: StoreCell>(&'a C);

impl<C: StoreCell> Drop for LoadingGuard<'_, C> {
	fn drop(&mut self) {
		self.0.update_store(GraphStore::finish_refresh);
	}
}

/// Fetch, build and commit. No-op without a credential.
///
/// Concurrent refreshes are not serialised; the last one to finish wins.
pub async fn refresh<C, T, S>(store: &C, fetcher: &Fetcher<T, S>, credential: Option<&str>)
where
	C: StoreCell,
	T: RoutingTransport,
	S: Sleeper,
{
	let Some(credential) = credential.filter(|c| !c.is_empty()) else {
		return;
	};

	store.update_store(GraphStore::begin_refresh);
	let _loading = LoadingGuard(store);

	match fetcher.fetch(credential).await {
		Ok(doc) => {
			let graph = build_graph(&doc);
			info!(
				"flow-suite: loaded {} topics, {} connections",
				graph.nodes.len(),
				graph.edges.len()
			);
			store.update_store(|s| s.commit(graph));
		}
		Err(err) => {
			warn!("flow-suite: refresh failed: {err}");
			store.update_store(|s| s.fail(&err.to_string()));
		}
	}
}
