//! Zoom-dependent sizing for canvas visuals.
//!
//! Cards and their text live in world space and simply scale with zoom.
//! Strokes, arrowheads and hit tolerances are expressed per [`ScaleBehavior`]
//! so they stay legible across the 0.1x..2x zoom range.

/// Defines how a visual property scales with zoom level `k`.
#[derive(Clone, Debug)]
pub enum ScaleBehavior {
	/// Constant world-space size. Appears larger when zoomed in.
	World,
	/// Constant screen-space size (pixels). Unaffected by zoom.
	Screen,
	/// World-space scaling, clamped to min/max screen-space bounds.
	Clamped {
		/// Smallest on-screen size in pixels.
		min_screen: f64,
		/// Largest on-screen size in pixels.
		max_screen: f64,
	},
}

impl ScaleBehavior {
	/// World-space value for `base` at zoom `k`, ready to draw after the canvas transform.
	pub fn apply(&self, base: f64, k: f64) -> f64 {
		match self {
			ScaleBehavior::World => base,
			ScaleBehavior::Screen => base / k,
			ScaleBehavior::Clamped {
				min_screen,
				max_screen,
			} => base.clamp(min_screen / k, max_screen / k),
		}
	}
}

/// Fades an element between two zoom levels.
#[derive(Clone, Debug)]
pub struct Fade {
	/// Zoom at or below which the element is invisible.
	pub zero_alpha_k: f64,
	/// Zoom at or above which the element is fully opaque.
	pub full_alpha_k: f64,
}

impl Fade {
	/// Opacity in `0.0..=1.0` at zoom `k`.
	pub fn apply(&self, k: f64) -> f64 {
		if self.zero_alpha_k == self.full_alpha_k {
			return 1.0;
		}
		((k - self.zero_alpha_k) / (self.full_alpha_k - self.zero_alpha_k)).clamp(0.0, 1.0)
	}
}

/// Card geometry in world units.
#[derive(Clone, Debug)]
pub struct NodeScaleConfig {
	/// Card width.
	pub width: f64,
	/// Height of a card showing only its label.
	pub base_height: f64,
	/// Extra height for the type badge row.
	pub badge_height: f64,
	/// Extra height for the description row.
	pub description_height: f64,
	/// Card corner radius.
	pub corner_radius: f64,
	/// Card outline thickness.
	pub border_width: ScaleBehavior,
	/// Topic name font size.
	pub label_size: f64,
	/// Description font size.
	pub description_size: f64,
	/// Type badge font size.
	pub badge_size: f64,
}

/// Edge stroke, arrowhead and label sizing.
#[derive(Clone, Debug)]
pub struct EdgeScaleConfig {
	/// Stroke width in screen pixels (before behavior).
	pub line_width: f64,
	/// How the stroke width follows zoom.
	pub line_behavior: ScaleBehavior,
	/// Arrowhead length in world units (before behavior).
	pub arrow_size: f64,
	/// How the arrowhead follows zoom.
	pub arrow_behavior: ScaleBehavior,
	/// Dash pattern (dash, gap) in world units for animated edges.
	pub dash_pattern: (f64, f64),
	/// Dash travel speed in world units per second.
	pub flow_speed: f64,
	/// Edge label font size.
	pub label_size: f64,
	/// Edge labels disappear when zoomed far out.
	pub label_fade: Fade,
	/// Click tolerance around the line, in screen pixels.
	pub hit_tolerance: f64,
}

/// Dotted backdrop.
#[derive(Clone, Debug)]
pub struct DotScaleConfig {
	/// Spacing in world units.
	pub gap: f64,
	/// Closest the dots may get on screen, in pixels. Zooming out past it
	/// doubles the world spacing, so the dot count per frame stays bounded.
	pub min_screen_gap: f64,
	/// Dot radius in screen pixels.
	pub radius: f64,
	/// Dots disappear when zoomed far out.
	pub fade: Fade,
}

impl DotScaleConfig {
	/// World-space spacing at zoom `k`: `gap` doubled until it spans `min_screen_gap`.
	pub fn effective_gap(&self, k: f64) -> f64 {
		let mut gap = self.gap;
		if gap <= 0.0 || k <= 0.0 {
			return gap;
		}
		while gap * k < self.min_screen_gap {
			gap *= 2.0;
		}
		gap
	}
}

/// Complete scale configuration for the canvas.
#[derive(Clone, Debug)]
pub struct ScaleConfig {
	/// Card sizing.
	pub node: NodeScaleConfig,
	/// Edge sizing.
	pub edge: EdgeScaleConfig,
	/// Backdrop sizing.
	pub dots: DotScaleConfig,
	/// Furthest zoom out.
	pub min_zoom: f64,
	/// Furthest zoom in.
	pub max_zoom: f64,
	/// Fraction of the viewport left empty around the graph by fit-view.
	pub fit_padding: f64,
}

impl Default for ScaleConfig {
	fn default() -> Self {
		Self {
			node: NodeScaleConfig {
				width: 180.0,
				base_height: 44.0,
				badge_height: 18.0,
				description_height: 16.0,
				corner_radius: 8.0,
				border_width: ScaleBehavior::Clamped {
					min_screen: 1.0,
					max_screen: 4.0,
				},
				label_size: 13.0,
				description_size: 10.0,
				badge_size: 9.0,
			},
			edge: EdgeScaleConfig {
				line_width: 2.0,
				line_behavior: ScaleBehavior::Clamped {
					min_screen: 1.0,
					max_screen: 4.0,
				},
				arrow_size: 10.0,
				arrow_behavior: ScaleBehavior::Clamped {
					min_screen: 4.0,
					max_screen: 20.0,
				},
				dash_pattern: (5.0, 5.0),
				flow_speed: 20.0,
				label_size: 12.0,
				label_fade: Fade {
					zero_alpha_k: 0.25,
					full_alpha_k: 0.5,
				},
				hit_tolerance: 6.0,
			},
			dots: DotScaleConfig {
				gap: 16.0,
				min_screen_gap: 12.0,
				radius: 1.0,
				fade: Fade {
					zero_alpha_k: 0.2,
					full_alpha_k: 0.5,
				},
			},
			min_zoom: 0.1,
			max_zoom: 2.0,
			fit_padding: 0.1,
		}
	}
}

/// Pre-computed world-space values for one frame at zoom `k`.
#[derive(Clone, Debug)]
pub struct ScaledValues {
	/// Zoom these values were computed for.
	pub k: f64,
	/// Card outline width.
	pub border_width: f64,
	/// Edge stroke width.
	pub edge_width: f64,
	/// Arrowhead length.
	pub arrow_size: f64,
	/// Edge label opacity.
	pub edge_label_alpha: f64,
	/// Edge click tolerance.
	pub edge_hit_radius: f64,
	/// Backdrop dot radius.
	pub dot_radius: f64,
	/// Backdrop dot opacity.
	pub dot_alpha: f64,
}

impl ScaledValues {
	/// Resolve every zoom-dependent size for `k`.
	pub fn new(config: &ScaleConfig, k: f64) -> Self {
		Self {
			k,
			border_width: config.node.border_width.apply(2.0, k),
			edge_width: config.edge.line_behavior.apply(config.edge.line_width, k),
			arrow_size: config.edge.arrow_behavior.apply(config.edge.arrow_size, k),
			edge_label_alpha: config.edge.label_fade.apply(k),
			edge_hit_radius: ScaleBehavior::Screen.apply(config.edge.hit_tolerance, k),
			dot_radius: ScaleBehavior::Screen.apply(config.dots.radius, k),
			dot_alpha: config.dots.fade.apply(k),
		}
	}

	/// Dash offset for the flow animation.
	pub fn dash_offset(flow_time: f64, flow_speed: f64) -> f64 {
		-flow_time * flow_speed
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clamped_behavior_bounds_screen_size() {
		let clamped = ScaleBehavior::Clamped {
			min_screen: 4.0,
			max_screen: 20.0,
		};
		// At k = 0.1 a 10-unit arrow would be 1px on screen; clamp to 4px.
		assert!((clamped.apply(10.0, 0.1) * 0.1 - 4.0).abs() < 1e-9);
		assert_eq!(clamped.apply(10.0, 1.0), 10.0);
		assert!((clamped.apply(10.0, 4.0) * 4.0 - 20.0).abs() < 1e-9);
		assert_eq!(ScaleBehavior::World.apply(3.0, 2.0), 3.0);
	}

	#[test]
	fn fade_interpolates_between_thresholds() {
		let fade = Fade {
			zero_alpha_k: 0.25,
			full_alpha_k: 0.5,
		};
		assert_eq!(fade.apply(0.1), 0.0);
		assert!((fade.apply(0.375) - 0.5).abs() < 1e-9);
		assert_eq!(fade.apply(1.0), 1.0);
	}

	#[test]
	fn dot_spacing_doubles_when_zoomed_out() {
		let dots = ScaleConfig::default().dots;
		assert_eq!(dots.effective_gap(1.0), 16.0);
		assert_eq!(dots.effective_gap(0.5), 32.0);
		assert_eq!(dots.effective_gap(0.21), 64.0);

		// Worst visible case on a 1920x1080 canvas stays around 15k dots.
		for k in [0.1, 0.21, 0.3, 0.74, 1.0, 2.0] {
			let screen_gap = dots.effective_gap(k) * k;
			assert!(screen_gap >= dots.min_screen_gap);
			let count = (1920.0 / screen_gap + 1.0) * (1080.0 / screen_gap + 1.0);
			assert!(count < 16_000.0, "k = {k}: {count} dots");
		}
	}

	#[test]
	fn hit_radius_is_constant_on_screen() {
		let config = ScaleConfig::default();
		let near = ScaledValues::new(&config, 2.0);
		let far = ScaledValues::new(&config, 0.5);
		assert_eq!(near.edge_hit_radius * 2.0, far.edge_hit_radius * 0.5);
	}
}
