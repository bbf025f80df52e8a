//! Visual theming for the flow canvas.
//!
//! Topic cards are coloured by their `type` tag; everything else comes from
//! a single dark slate theme.

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
	/// Opacity in `0.0..=1.0`.
	pub a: f64,
}

impl Color {
	/// Opaque colour.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Colour with explicit opacity.
	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Same colour, new opacity.
	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Lighten the color by a factor (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 + (255.0 - self.r as f64) * f) as u8,
			g: (self.g as f64 + (255.0 - self.g as f64) * f) as u8,
			b: (self.b as f64 + (255.0 - self.b as f64) * f) as u8,
			a: self.a,
		}
	}

	/// CSS colour string: `#rrggbb` when opaque, `rgba(..)` otherwise.
	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Accent for topics without a known type.
pub const DEFAULT_TYPE_COLOR: Color = Color::rgb(0x3b, 0x82, 0xf6);

/// Accent colour for a topic `type` tag.
pub fn type_color(kind: Option<&str>) -> Color {
	match kind {
		Some("input") => Color::rgb(0x25, 0x63, 0xeb),
		Some("output") => Color::rgb(0x16, 0xa3, 0x4a),
		Some("processor") => Color::rgb(0x93, 0x33, 0xea),
		Some("filter") => Color::rgb(0xea, 0x58, 0x0c),
		_ => DEFAULT_TYPE_COLOR,
	}
}

/// Card colours.
#[derive(Clone, Debug)]
pub struct NodeStyle {
	/// Card background.
	pub fill: Color,
	/// Background of the selected card.
	pub fill_selected: Color,
	/// Border of the selected card; unselected cards use their type colour.
	pub border_selected: Color,
	/// Outer ring drawn around the selected card.
	pub selection_ring: Color,
	/// Topic name.
	pub label: Color,
	/// Description text.
	pub description: Color,
	/// Text inside the type badge.
	pub badge_text: Color,
}

/// Connection colours.
#[derive(Clone, Debug)]
pub struct EdgeStyle {
	/// Default stroke.
	pub color: Color,
	/// Stroke of the edge picked for deletion.
	pub selected: Color,
	/// Label text.
	pub label: Color,
	/// Plate behind the label.
	pub label_background: Color,
	/// Rubber band drawn while connecting two cards.
	pub connect_preview: Color,
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	/// Canvas fill.
	pub background: Color,
	/// Backdrop dots.
	pub dots: Color,
	/// Card colours.
	pub node: NodeStyle,
	/// Connection colours.
	pub edge: EdgeStyle,
	/// CSS font family for all text.
	pub font_family: &'static str,
}

impl Default for Theme {
	fn default() -> Self {
		Self {
			background: Color::rgb(0x0f, 0x17, 0x2a),
			dots: Color::rgb(0x33, 0x41, 0x55),
			node: NodeStyle {
				fill: Color::rgb(0x1e, 0x29, 0x3b),
				fill_selected: Color::rgb(0x1e, 0x3a, 0x5f),
				border_selected: Color::rgb(0x60, 0xa5, 0xfa),
				selection_ring: Color::rgba(0x60, 0xa5, 0xfa, 0.27),
				label: Color::rgb(0xf1, 0xf5, 0xf9),
				description: Color::rgb(0x94, 0xa3, 0xb8),
				badge_text: Color::rgb(0xff, 0xff, 0xff),
			},
			edge: EdgeStyle {
				color: Color::rgb(0x94, 0xa3, 0xb8),
				selected: Color::rgb(0x60, 0xa5, 0xfa),
				label: Color::rgb(0xcb, 0xd5, 0xe1),
				label_background: Color::rgb(0x1e, 0x29, 0x3b),
				connect_preview: Color::rgba(0x60, 0xa5, 0xfa, 0.8),
			},
			font_family: "system-ui, sans-serif",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn known_types_have_distinct_accents() {
		assert_eq!(type_color(Some("output")).to_css(), "#16a34a");
		assert_eq!(type_color(Some("filter")).to_css(), "#ea580c");
		assert_eq!(type_color(Some("queue")), DEFAULT_TYPE_COLOR);
		assert_eq!(type_color(None).to_css(), "#3b82f6");
	}

	#[test]
	fn translucent_colors_render_as_rgba() {
		assert_eq!(
			Color::rgb(1, 2, 3).with_alpha(0.5).to_css(),
			"rgba(1, 2, 3, 0.5)"
		);
		assert_eq!(Color::rgb(0, 0, 0).lighten(1.0).to_css(), "#ffffff");
	}
}
