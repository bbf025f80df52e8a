//! Canvas interaction state: view transform, gestures and hit testing.
//!
//! Graph data itself lives in the store; this only tracks how it is being
//! looked at and what the pointer is doing to it.

use crate::graph::{Edge, Node, Position};

use super::scale::{ScaleConfig, ScaledValues};

/// Pan and zoom transform applied to the entire graph view.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	/// Horizontal screen offset.
	pub x: f64,
	/// Vertical screen offset.
	pub y: f64,
	/// Zoom factor, clamped to the configured range.
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

/// Axis-aligned box in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
	/// Left edge.
	pub x: f64,
	/// Top edge.
	pub y: f64,
	/// Horizontal extent.
	pub width: f64,
	/// Vertical extent.
	pub height: f64,
}

impl Rect {
	/// Whether the point lies inside or on the border.
	pub fn contains(&self, px: f64, py: f64) -> bool {
		px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
	}

	/// Where incoming edges attach.
	pub fn top_center(&self) -> (f64, f64) {
		(self.x + self.width / 2.0, self.y)
	}

	/// Where outgoing edges leave.
	pub fn bottom_center(&self) -> (f64, f64) {
		(self.x + self.width / 2.0, self.y + self.height)
	}
}

/// World-space card bounds for `node`. Badge and description rows add height.
pub fn node_rect(node: &Node, config: &ScaleConfig) -> Rect {
	let mut height = config.node.base_height;
	if node.topic.kind.is_some() {
		height += config.node.badge_height;
	}
	if node.topic.description.as_deref().is_some_and(|d| !d.is_empty()) {
		height += config.node.description_height;
	}
	Rect {
		x: node.position.x,
		y: node.position.y,
		width: config.node.width,
		height,
	}
}

/// Endpoints of an edge, from the source's bottom to the target's top.
pub fn edge_endpoints(
	edge: &Edge,
	nodes: &[Node],
	config: &ScaleConfig,
) -> Option<((f64, f64), (f64, f64))> {
	let rect = |id: &str| nodes.iter().find(|n| n.id == id).map(|n| node_rect(n, config));
	let (source, target) = (rect(&edge.source)?, rect(&edge.target)?);
	Some((source.bottom_center(), target.top_center()))
}

/// Distance from `(px, py)` to the segment `a`-`b`.
fn segment_distance(px: f64, py: f64, a: (f64, f64), b: (f64, f64)) -> f64 {
	let (dx, dy) = (b.0 - a.0, b.1 - a.1);
	let len_sq = dx * dx + dy * dy;
	let t = if len_sq < f64::EPSILON {
		0.0
	} else {
		(((px - a.0) * dx + (py - a.1) * dy) / len_sq).clamp(0.0, 1.0)
	};
	let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
	((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

/// A card being dragged.
#[derive(Clone, Debug, PartialEq)]
pub struct DragState {
	/// Card being moved.
	pub node_id: String,
	/// Pointer x at press, screen space.
	pub start_x: f64,
	/// Pointer y at press, screen space.
	pub start_y: f64,
	/// Card position at press.
	pub node_start: Position,
	/// Set once the pointer travels past the click threshold.
	pub moved: bool,
}

/// A background pan in progress.
#[derive(Clone, Debug, PartialEq)]
pub struct PanState {
	/// Pointer x at press, screen space.
	pub start_x: f64,
	/// Pointer y at press, screen space.
	pub start_y: f64,
	/// Transform x at press.
	pub transform_start_x: f64,
	/// Transform y at press.
	pub transform_start_y: f64,
	/// Set once the pointer travels past the click threshold.
	pub moved: bool,
}

/// A shift-drag from one card towards another.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectState {
	/// Card the connection starts from.
	pub source_id: String,
	/// Pointer position in world space.
	pub cursor: (f64, f64),
}

/// What the primary button is currently doing.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Gesture {
	/// No button held.
	#[default]
	Idle,
	/// Moving a card.
	Drag(DragState),
	/// Moving the view.
	Pan(PanState),
	/// Drawing a connection.
	Connect(ConnectState),
	/// Pressed on an edge; released without further effect.
	EdgePress,
}

/// Pointer travel (screen pixels) separating a click from a drag.
pub const CLICK_THRESHOLD: f64 = 3.0;

/// Interaction state for one mounted canvas.
#[derive(Clone, Debug, Default)]
pub struct CanvasState {
	/// Current pan and zoom.
	pub transform: ViewTransform,
	/// Active pointer gesture.
	pub gesture: Gesture,
	/// Edge picked for deletion with Delete/Backspace.
	pub selected_edge: Option<String>,
	/// Fit the graph into view on the next frame that has nodes.
	pub pending_fit: bool,
	/// Canvas width in pixels.
	pub width: f64,
	/// Canvas height in pixels.
	pub height: f64,
	/// Seconds of animation, drives the edge dash offset.
	pub flow_time: f64,
}

impl CanvasState {
	/// Fresh state for a `width` x `height` canvas, fitting on first data.
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			width,
			height,
			pending_fit: true,
			..Default::default()
		}
	}

	/// Screen pixel to world coordinates.
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Topmost card under the screen point. Later cards are drawn on top.
	pub fn node_at<'a>(
		&self,
		sx: f64,
		sy: f64,
		nodes: &'a [Node],
		config: &ScaleConfig,
	) -> Option<&'a Node> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		nodes
			.iter()
			.rev()
			.find(|node| node_rect(node, config).contains(gx, gy))
	}

	/// Closest edge within the hit tolerance of the screen point.
	pub fn edge_at<'a>(
		&self,
		sx: f64,
		sy: f64,
		nodes: &[Node],
		edges: &'a [Edge],
		config: &ScaleConfig,
	) -> Option<&'a Edge> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let radius = ScaledValues::new(config, self.transform.k).edge_hit_radius;
		edges
			.iter()
			.filter_map(|edge| {
				let (a, b) = edge_endpoints(edge, nodes, config)?;
				let distance = segment_distance(gx, gy, a, b);
				(distance <= radius).then_some((distance, edge))
			})
			.min_by(|x, y| x.0.total_cmp(&y.0))
			.map(|(_, edge)| edge)
	}

	/// Zoom by `factor` keeping the screen point `(sx, sy)` fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64, config: &ScaleConfig) {
		let new_k = (self.transform.k * factor).clamp(config.min_zoom, config.max_zoom);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// Center all cards in the viewport, leaving `fit_padding` on each side.
	/// Returns false when there is nothing to fit.
	pub fn fit_to(&mut self, nodes: &[Node], config: &ScaleConfig) -> bool {
		let Some(bounds) = nodes
			.iter()
			.map(|n| node_rect(n, config))
			.reduce(|a, b| {
				let (x, y) = (a.x.min(b.x), a.y.min(b.y));
				Rect {
					x,
					y,
					width: (a.x + a.width).max(b.x + b.width) - x,
					height: (a.y + a.height).max(b.y + b.height) - y,
				}
			})
		else {
			return false;
		};

		let usable = 1.0 - 2.0 * config.fit_padding;
		let k = (self.width * usable / bounds.width)
			.min(self.height * usable / bounds.height)
			.clamp(config.min_zoom, config.max_zoom);
		self.transform = ViewTransform {
			x: self.width / 2.0 - (bounds.x + bounds.width / 2.0) * k,
			y: self.height / 2.0 - (bounds.y + bounds.height / 2.0) * k,
			k,
		};
		true
	}

	/// Track a new canvas size.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Advance the animation clock by `dt` seconds.
	pub fn tick(&mut self, dt: f64) {
		self.flow_time += dt;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::build_graph;

	fn graph() -> (Vec<Node>, Vec<Edge>) {
		let doc = serde_json::from_str(
			r#"{"topics": {
				"a": {"flows": {"f": {"to": "b"}}},
				"b": {"type": "output", "description": "sink"}
			}}"#,
		)
		.unwrap();
		let graph = build_graph(&doc);
		(graph.nodes, graph.edges)
	}

	#[test]
	fn card_height_grows_with_badge_and_description() {
		let config = ScaleConfig::default();
		let (nodes, _) = graph();
		assert_eq!(node_rect(&nodes[0], &config).height, 44.0);
		assert_eq!(node_rect(&nodes[1], &config).height, 78.0);
	}

	#[test]
	fn node_hit_test_respects_transform() {
		let config = ScaleConfig::default();
		let (nodes, _) = graph();
		let mut state = CanvasState::new(800.0, 600.0);
		assert_eq!(state.node_at(10.0, 10.0, &nodes, &config).map(|n| n.id.as_str()), Some("a"));
		assert_eq!(state.node_at(360.0, 10.0, &nodes, &config).map(|n| n.id.as_str()), Some("b"));
		assert!(state.node_at(200.0, 10.0, &nodes, &config).is_none());

		state.transform = ViewTransform {
			x: 100.0,
			y: 0.0,
			k: 0.5,
		};
		assert_eq!(state.node_at(110.0, 5.0, &nodes, &config).map(|n| n.id.as_str()), Some("a"));
		assert!(state.node_at(50.0, 5.0, &nodes, &config).is_none());
	}

	#[test]
	fn edge_hit_test_uses_attachment_points() {
		let config = ScaleConfig::default();
		let (nodes, edges) = graph();
		let state = CanvasState::new(800.0, 600.0);
		// Segment runs from (90, 44) to (440, 0); its midpoint is (265, 22).
		assert_eq!(
			state.edge_at(265.0, 24.0, &nodes, &edges, &config).map(|e| e.id.as_str()),
			Some("e-a-b-f")
		);
		assert!(state.edge_at(265.0, 60.0, &nodes, &edges, &config).is_none());
	}

	#[test]
	fn zoom_keeps_anchor_point_and_clamps() {
		let config = ScaleConfig::default();
		let mut state = CanvasState::new(800.0, 600.0);
		let before = state.screen_to_graph(200.0, 100.0);
		state.zoom_at(200.0, 100.0, 1.1, &config);
		let after = state.screen_to_graph(200.0, 100.0);
		assert!((before.0 - after.0).abs() < 1e-9 && (before.1 - after.1).abs() < 1e-9);

		for _ in 0..100 {
			state.zoom_at(0.0, 0.0, 1.1, &config);
		}
		assert_eq!(state.transform.k, 2.0);
	}

	#[test]
	fn fit_centers_the_graph() {
		let config = ScaleConfig::default();
		let (nodes, _) = graph();
		let mut state = CanvasState::new(1000.0, 800.0);
		assert!(state.fit_to(&nodes, &config));

		// Bounds are 530 x 78; width limits the zoom.
		let k = state.transform.k;
		assert!((k - 800.0 / 530.0).abs() < 1e-9);
		let (cx, cy) = state.screen_to_graph(500.0, 400.0);
		assert!((cx - 265.0).abs() < 1e-9 && (cy - 39.0).abs() < 1e-9);

		assert!(!state.fit_to(&[], &config));
	}
}
