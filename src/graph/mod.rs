//! Node/edge graph derived from a routing document.
//!
//! These are the collections the store holds and the canvas draws. Nodes are
//! keyed by topic key, edges by `e-{source}-{target}-{flow}` with a `~n`
//! suffix when two distinct edges format to the same id.

mod builder;

pub use builder::{build_graph, edge_id, grid_position};

use serde::{Deserialize, Serialize};

use crate::routing::Topic;

/// Canvas-space position of a node's top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
	/// Horizontal canvas coordinate.
	pub x: f64,
	/// Vertical canvas coordinate.
	pub y: f64,
}

/// One topic on the canvas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
	/// Topic key. Unique within a graph.
	pub id: String,
	/// Display name, the topic key when unnamed.
	pub label: String,
	/// Top-left corner on the canvas.
	pub position: Position,
	/// The source topic, kept whole for the detail panel.
	pub topic: Topic,
}

/// A directed connection between two topics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
	/// Unique within a graph; see [`edge_id`].
	pub id: String,
	/// Source topic key.
	pub source: String,
	/// Target topic key. May name a topic that does not exist.
	pub target: String,
	/// Flow action or key; empty for hand-drawn edges.
	pub label: String,
	/// Originating flow key. `None` for edges drawn by hand on the canvas.
	pub flow: Option<String>,
	/// Draw with the moving dash pattern.
	pub animated: bool,
}

/// A complete build result.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
	/// One node per topic, in document order.
	pub nodes: Vec<Node>,
	/// One edge per distinct (source, target, flow).
	pub edges: Vec<Edge>,
}
