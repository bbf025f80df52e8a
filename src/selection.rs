//! Node selection and the edge-validity filter.

use std::collections::HashSet;

use crate::graph::{Edge, Node};
use crate::store::GraphEvent;

/// At most one selected node, by id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection(Option<String>);

impl Selection {
	/// Id of the selected node.
	pub fn selected(&self) -> Option<&str> {
		self.0.as_deref()
	}

	/// Select `id`, or deselect it if it is already selected.
	pub fn toggle(&mut self, id: &str) {
		if self.selected() == Some(id) {
			self.0 = None;
		} else {
			self.0 = Some(id.to_string());
		}
	}

	/// Deselect.
	pub fn clear(&mut self) {
		self.0 = None;
	}

	/// Apply a canvas interaction. Returns whether the selection changed.
	pub fn apply(&mut self, event: &GraphEvent) -> bool {
		let before = self.0.clone();
		match event {
			GraphEvent::NodeSelected { id } => self.toggle(id),
			GraphEvent::SelectionCleared => self.clear(),
			GraphEvent::NodeRemoved { id } if self.selected() == Some(id.as_str()) => self.clear(),
			_ => {}
		}
		self.0 != before
	}

	/// The selected node, if it is still part of `nodes`.
	pub fn node<'a>(&self, nodes: &'a [Node]) -> Option<&'a Node> {
		let id = self.selected()?;
		nodes.iter().find(|n| n.id == id)
	}
}

/// Edges whose source and target both exist in `nodes`, in their original order.
pub fn valid_edges(nodes: &[Node], edges: &[Edge]) -> Vec<Edge> {
	let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
	edges
		.iter()
		.filter(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
		.cloned()
		.collect()
}
