//! Routing document to graph transformation.
//!
//! Pure and infallible: malformed optional fields are dropped, never reported.

use std::collections::HashSet;

use indexmap::IndexMap;

use super::{Edge, Graph, Node, Position};
use crate::config::{GRID_CELL_HEIGHT, GRID_CELL_WIDTH, GRID_COLUMNS};
use crate::routing::RoutingDocument;

/// Grid placement for the `index`-th topic: four columns, filled row by row.
pub fn grid_position(index: usize) -> Position {
	let (col, row) = (index % GRID_COLUMNS, index / GRID_COLUMNS);
	Position {
		x: col as f64 * GRID_CELL_WIDTH,
		y: row as f64 * GRID_CELL_HEIGHT,
	}
}

/// Display id for the edge `source --flow--> target`.
pub fn edge_id(source: &str, target: &str, flow: &str) -> String {
	format!("e-{source}-{target}-{flow}")
}

/// Build one node per topic and one edge per (flow, target) pair.
///
/// Edge identity is the `(source, target, flow)` triple; a repeated triple
/// replaces the earlier edge's content but keeps its slot and id. Keys may
/// contain `-`, so two distinct triples can format to the same
/// [`edge_id`]; the later one gets a `~n` suffix.
///
/// Edges pointing at undeclared topics are kept here; pruning them is the
/// job of [`crate::selection::valid_edges`].
pub fn build_graph(doc: &RoutingDocument) -> Graph {
	let mut nodes = Vec::with_capacity(doc.topics.len());
	let mut edges: IndexMap<(&str, &str, &str), Edge> = IndexMap::new();
	let mut ids: HashSet<String> = HashSet::new();

	for (index, (key, topic)) in doc.topics.iter().enumerate() {
		nodes.push(Node {
			id: key.clone(),
			label: topic.display_name(key).to_string(),
			position: grid_position(index),
			topic: topic.clone(),
		});

		for (flow_key, flow) in &topic.flows {
			let label = flow.label(flow_key);
			for target in flow.to.iter() {
				let identity = (key.as_str(), target, flow_key.as_str());
				let id = match edges.get(&identity) {
					Some(existing) => existing.id.clone(),
					None => unique_id(&mut ids, edge_id(key, target, flow_key)),
				};
				edges.insert(
					identity,
					Edge {
						id,
						source: key.clone(),
						target: target.to_string(),
						label: label.to_string(),
						flow: Some(flow_key.clone()),
						animated: true,
					},
				);
			}
		}
	}

	Graph {
		nodes,
		edges: edges.into_values().collect(),
	}
}

fn unique_id(taken: &mut HashSet<String>, base: String) -> String {
	let mut id = base.clone();
	let mut n = 1;
	while taken.contains(&id) {
		n += 1;
		id = format!("{base}~{n}");
	}
	taken.insert(id.clone());
	id
}

#[cfg(test)]
mod tests {
	use super::*;

	fn doc(json: &str) -> RoutingDocument {
		serde_json::from_str(json).unwrap()
	}

	#[test]
	fn topics_without_flows_yield_nodes_only() {
		let graph = build_graph(&doc(r#"{"topics": {"A": {}, "B": {}}}"#));
		let ids: Vec<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, vec!["A", "B"]);
		assert!(graph.edges.is_empty());
	}

	#[test]
	fn list_target_expands_into_one_edge_per_target() {
		let graph = build_graph(&doc(
			r#"{"topics": {
				"S": {"flows": {"split": {"to": ["X", "Y"], "action": "copy"}}},
				"X": {}, "Y": {}
			}}"#,
		));
		assert_eq!(graph.edges.len(), 2);
		assert_eq!(graph.edges[0].id, "e-S-X-split");
		assert_eq!(graph.edges[0].target, "X");
		assert_eq!(graph.edges[1].target, "Y");
		assert!(graph.edges.iter().all(|e| e.label == "copy" && e.source == "S"));
		assert!(graph.edges.iter().all(|e| e.flow.as_deref() == Some("split")));
	}

	#[test]
	fn label_falls_back_to_flow_key() {
		let graph = build_graph(&doc(r#"{"topics": {"S": {"flows": {"relay": {"to": "T"}}}}}"#));
		assert_eq!(graph.edges[0].label, "relay");
	}

	#[test]
	fn node_label_falls_back_to_topic_key() {
		let graph = build_graph(&doc(r#"{"topics": {"raw": {}, "named": {"name": "Pretty"}}}"#));
		assert_eq!(graph.nodes[0].label, "raw");
		assert_eq!(graph.nodes[1].label, "Pretty");
	}

	#[test]
	fn undeclared_targets_stay_in_raw_output() {
		let graph = build_graph(&doc(r#"{"topics": {"S": {"flows": {"f": {"to": "ghost"}}}}}"#));
		assert_eq!(graph.nodes.len(), 1);
		assert_eq!(graph.edges.len(), 1);
		assert_eq!(graph.edges[0].target, "ghost");
	}

	#[test]
	fn empty_targets_are_skipped() {
		let graph = build_graph(&doc(
			r#"{"topics": {"S": {"flows": {
				"a": {"to": ""},
				"b": {"to": [null, ""]},
				"c": {}
			}}}}"#,
		));
		assert!(graph.edges.is_empty());
	}

	#[test]
	fn duplicate_edges_collapse() {
		let graph = build_graph(&doc(r#"{"topics": {"S": {"flows": {"f": {"to": ["T", "T"]}}}}}"#));
		assert_eq!(graph.edges.len(), 1);
		assert_eq!(graph.edges[0].id, "e-S-T-f");
	}

	#[test]
	fn hyphenated_keys_do_not_merge_distinct_edges() {
		let graph = build_graph(&doc(
			r#"{"topics": {
				"a-b": {"flows": {"f": {"to": "c"}}},
				"a": {"flows": {"f": {"to": "b-c"}}},
				"c": {}, "b-c": {}
			}}"#,
		));
		assert_eq!(graph.edges.len(), 2);
		assert_eq!(graph.edges[0].source, "a-b");
		assert_eq!(graph.edges[0].target, "c");
		assert_eq!(graph.edges[1].source, "a");
		assert_eq!(graph.edges[1].target, "b-c");
		assert_eq!(graph.edges[0].id, "e-a-b-c-f");
		assert_eq!(graph.edges[1].id, "e-a-b-c-f~2");
	}

	#[test]
	fn malformed_fields_still_build() {
		let graph = build_graph(&doc(
			r#"{"topics": {
				"a": {"name": 5, "flows": {"f": {"to": ["b", 5], "action": 7}}},
				"b": {"flows": []}
			}}"#,
		));
		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.nodes[0].label, "a");
		assert_eq!(graph.edges.len(), 1);
		assert_eq!(graph.edges[0].target, "b");
		assert_eq!(graph.edges[0].label, "f");
	}

	#[test]
	fn grid_wraps_after_four_columns() {
		assert_eq!(grid_position(0), Position { x: 0.0, y: 0.0 });
		assert_eq!(grid_position(3), Position { x: 1050.0, y: 0.0 });
		assert_eq!(grid_position(4), Position { x: 0.0, y: 250.0 });
		assert_eq!(grid_position(9), Position { x: 350.0, y: 500.0 });
	}

	#[test]
	fn building_twice_is_identical() {
		let input = doc(
			r#"{"topics": {
				"in": {"type": "input", "flows": {"go": {"to": ["mid", "out"]}}},
				"mid": {"flows": {"next": {"to": "out", "action": "pass"}}},
				"out": {"type": "output"}
			}}"#,
		);
		assert_eq!(build_graph(&input), build_graph(&input));
	}
}
