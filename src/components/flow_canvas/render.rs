//! Canvas rendering for the flow graph.
//!
//! Draw order:
//! 1. Background fill and dot grid (world space, culled to the viewport)
//! 2. Edges, arrowheads, then edge label plates
//! 3. Connect rubber band
//! 4. Topic cards, the selected one last

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::graph::{Edge, Node};

use super::scale::{ScaleConfig, ScaledValues};
use super::state::{CanvasState, Gesture, Rect, edge_endpoints, node_rect};
use super::theme::{Theme, type_color};

/// Everything needed to draw one frame.
pub struct Frame<'a> {
	/// View transform, gesture and edge selection.
	pub state: &'a CanvasState,
	/// Cards to draw, in stacking order.
	pub nodes: &'a [Node],
	/// Edges already filtered to existing endpoints.
	pub edges: &'a [Edge],
	/// Id of the selected node.
	pub selected: Option<&'a str>,
	/// Geometry and zoom scaling.
	pub config: &'a ScaleConfig,
	/// Colours and fonts.
	pub theme: &'a Theme,
}

/// Renders the complete graph to the canvas.
pub fn render(frame: &Frame<'_>, ctx: &CanvasRenderingContext2d) {
	let state = frame.state;
	let scale = ScaledValues::new(frame.config, state.transform.k);

	ctx.set_fill_style_str(&frame.theme.background.to_css());
	ctx.fill_rect(0.0, 0.0, state.width, state.height);

	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);

	draw_dots(frame, ctx, &scale);
	draw_edges(frame, ctx, &scale);
	if let Gesture::Connect(connect) = &state.gesture {
		draw_connect_preview(frame, ctx, &scale, &connect.source_id, connect.cursor);
	}
	draw_nodes(frame, ctx, &scale);

	ctx.restore();
}

fn draw_dots(frame: &Frame<'_>, ctx: &CanvasRenderingContext2d, scale: &ScaledValues) {
	if scale.dot_alpha < 0.01 {
		return;
	}
	let state = frame.state;
	let gap = frame.config.dots.effective_gap(state.transform.k);
	let (x0, y0) = state.screen_to_graph(0.0, 0.0);
	let (x1, y1) = state.screen_to_graph(state.width, state.height);

	ctx.set_fill_style_str(&frame.theme.dots.with_alpha(scale.dot_alpha).to_css());
	ctx.begin_path();
	let mut y = (y0 / gap).floor() * gap;
	while y <= y1 {
		let mut x = (x0 / gap).floor() * gap;
		while x <= x1 {
			ctx.move_to(x + scale.dot_radius, y);
			let _ = ctx.arc(x, y, scale.dot_radius, 0.0, 2.0 * PI);
			x += gap;
		}
		y += gap;
	}
	ctx.fill();
}

fn draw_edges(frame: &Frame<'_>, ctx: &CanvasRenderingContext2d, scale: &ScaledValues) {
	let dash_offset = ScaledValues::dash_offset(frame.state.flow_time, frame.config.edge.flow_speed);
	let mut labels = Vec::new();

	for edge in frame.edges {
		let Some((from, to)) = edge_endpoints(edge, frame.nodes, frame.config) else {
			continue;
		};
		let selected = frame.state.selected_edge.as_deref() == Some(edge.id.as_str());
		let color = if selected {
			frame.theme.edge.selected
		} else {
			frame.theme.edge.color
		};

		ctx.set_stroke_style_str(&color.to_css());
		ctx.set_line_width(if selected {
			scale.edge_width * 1.5
		} else {
			scale.edge_width
		});
		if edge.animated {
			let (dash, gap) = frame.config.edge.dash_pattern;
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(dash),
				&JsValue::from_f64(gap),
			));
			ctx.set_line_dash_offset(dash_offset);
		} else {
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}

		// Stop the line at the arrowhead's base so the dash never pokes through.
		let (dx, dy) = (to.0 - from.0, to.1 - from.1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}
		let (ux, uy) = (dx / dist, dy / dist);
		ctx.begin_path();
		ctx.move_to(from.0, from.1);
		ctx.line_to(to.0 - ux * scale.arrow_size, to.1 - uy * scale.arrow_size);
		ctx.stroke();

		let _ = ctx.set_line_dash(&js_sys::Array::new());
		ctx.set_fill_style_str(&color.to_css());
		draw_arrowhead(ctx, to, (ux, uy), scale.arrow_size);

		if !edge.label.is_empty() {
			labels.push((&edge.label, ((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0)));
		}
	}

	if scale.edge_label_alpha > 0.01 {
		ctx.set_global_alpha(scale.edge_label_alpha);
		for (label, center) in labels {
			draw_edge_label(frame, ctx, label, center);
		}
		ctx.set_global_alpha(1.0);
	}
}

fn draw_arrowhead(ctx: &CanvasRenderingContext2d, tip: (f64, f64), dir: (f64, f64), size: f64) {
	let (ux, uy) = dir;
	let (back_x, back_y) = (tip.0 - ux * size, tip.1 - uy * size);
	let (px, py) = (-uy * size * 0.5, ux * size * 0.5);

	ctx.begin_path();
	ctx.move_to(tip.0, tip.1);
	ctx.line_to(back_x + px, back_y + py);
	ctx.line_to(back_x - px, back_y - py);
	ctx.close_path();
	ctx.fill();
}

fn draw_edge_label(
	frame: &Frame<'_>,
	ctx: &CanvasRenderingContext2d,
	label: &str,
	(cx, cy): (f64, f64),
) {
	let size = frame.config.edge.label_size;
	ctx.set_font(&format!("500 {size}px {}", frame.theme.font_family));
	let width = ctx
		.measure_text(label)
		.map(|m| m.width())
		.unwrap_or(label.len() as f64 * size * 0.6);
	let padding = 4.0;
	let plate = Rect {
		x: cx - width / 2.0 - padding,
		y: cy - size / 2.0 - padding,
		width: width + padding * 2.0,
		height: size + padding * 2.0,
	};

	ctx.set_fill_style_str(&frame.theme.edge.label_background.to_css());
	rounded_rect(ctx, plate, 4.0);
	ctx.fill();

	ctx.set_fill_style_str(&frame.theme.edge.label.to_css());
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let _ = ctx.fill_text(label, cx, cy);
}

fn draw_connect_preview(
	frame: &Frame<'_>,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	source_id: &str,
	cursor: (f64, f64),
) {
	let Some(source) = frame.nodes.iter().find(|n| n.id == source_id) else {
		return;
	};
	let from = node_rect(source, frame.config).bottom_center();

	ctx.set_stroke_style_str(&frame.theme.edge.connect_preview.to_css());
	ctx.set_line_width(scale.edge_width);
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(4.0 / scale.k),
		&JsValue::from_f64(4.0 / scale.k),
	));
	ctx.begin_path();
	ctx.move_to(from.0, from.1);
	ctx.line_to(cursor.0, cursor.1);
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_nodes(frame: &Frame<'_>, ctx: &CanvasRenderingContext2d, scale: &ScaledValues) {
	let mut selected = None;
	for node in frame.nodes {
		if frame.selected == Some(node.id.as_str()) {
			selected = Some(node);
		} else {
			draw_node(frame, ctx, scale, node, false);
		}
	}
	if let Some(node) = selected {
		draw_node(frame, ctx, scale, node, true);
	}
}

fn draw_node(
	frame: &Frame<'_>,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	node: &Node,
	selected: bool,
) {
	let theme = &frame.theme.node;
	let config = &frame.config.node;
	let rect = node_rect(node, frame.config);
	let accent = type_color(node.topic.kind.as_deref());
	let connecting_to = matches!(&frame.state.gesture, Gesture::Connect(c) if c.source_id != node.id);

	if selected {
		let ring = scale.border_width * 2.0;
		ctx.set_fill_style_str(&theme.selection_ring.to_css());
		rounded_rect(
			ctx,
			Rect {
				x: rect.x - ring,
				y: rect.y - ring,
				width: rect.width + ring * 2.0,
				height: rect.height + ring * 2.0,
			},
			config.corner_radius + ring,
		);
		ctx.fill();
	}

	let fill = if selected { theme.fill_selected } else { theme.fill };
	ctx.set_fill_style_str(&fill.to_css());
	rounded_rect(ctx, rect, config.corner_radius);
	ctx.fill();

	let border = if selected {
		theme.border_selected
	} else if connecting_to {
		accent.lighten(0.3)
	} else {
		accent
	};
	ctx.set_stroke_style_str(&border.to_css());
	ctx.set_line_width(scale.border_width);
	ctx.stroke();

	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let center_x = rect.x + rect.width / 2.0;
	let mut y = rect.y + 12.0;

	if let Some(kind) = node.topic.kind.as_deref() {
		let badge = kind.to_uppercase();
		ctx.set_font(&format!("600 {}px {}", config.badge_size, frame.theme.font_family));
		let width = ctx
			.measure_text(&badge)
			.map(|m| m.width())
			.unwrap_or(badge.len() as f64 * config.badge_size * 0.7)
			+ 12.0;
		ctx.set_fill_style_str(&accent.to_css());
		rounded_rect(
			ctx,
			Rect {
				x: center_x - width / 2.0,
				y: y - 6.0,
				width,
				height: 13.0,
			},
			6.5,
		);
		ctx.fill();
		ctx.set_fill_style_str(&theme.badge_text.to_css());
		let _ = ctx.fill_text(&badge, center_x, y + 0.5);
		y += config.badge_height;
	}

	ctx.set_font(&format!("700 {}px {}", config.label_size, frame.theme.font_family));
	ctx.set_fill_style_str(&theme.label.to_css());
	let _ = ctx.fill_text_with_max_width(&node.label, center_x, y + 10.0, rect.width - 16.0);
	y += 22.0;

	if let Some(description) = node.topic.description.as_deref().filter(|d| !d.is_empty()) {
		ctx.set_font(&format!("{}px {}", config.description_size, frame.theme.font_family));
		ctx.set_fill_style_str(&theme.description.to_css());
		let _ = ctx.fill_text_with_max_width(description, center_x, y + 4.0, rect.width - 16.0);
	}
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, rect: Rect, radius: f64) {
	let r = radius.min(rect.width / 2.0).min(rect.height / 2.0);
	let (x, y, w, h) = (rect.x, rect.y, rect.width, rect.height);
	ctx.begin_path();
	ctx.move_to(x + r, y);
	let _ = ctx.arc_to(x + w, y, x + w, y + h, r);
	let _ = ctx.arc_to(x + w, y + h, x, y + h, r);
	let _ = ctx.arc_to(x, y + h, x, y, r);
	let _ = ctx.arc_to(x, y, x + w, y, r);
	ctx.close_path();
}
