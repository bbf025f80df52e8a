//! Leptos component wrapping the flow canvas.
//!
//! The component owns only view state (transform, gestures). Graph data comes
//! in through signals and every edit goes back out as a [`GraphEvent`]; the
//! canvas never mutates nodes or edges itself. An animation loop runs via
//! `requestAnimationFrame` until the component is unmounted.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent};

use super::render::{self, Frame};
use super::scale::ScaleConfig;
use super::state::{CLICK_THRESHOLD, CanvasState, ConnectState, DragState, Gesture, PanState};
use super::theme::Theme;
use crate::graph::{Edge, Node, Position};
use crate::store::GraphEvent;

/// Bundles interaction state with visual configuration.
struct CanvasContext {
	state: CanvasState,
	scale: ScaleConfig,
	theme: Theme,
}

type SharedContext = Rc<RefCell<Option<CanvasContext>>>;

fn travelled(from_x: f64, from_y: f64, x: f64, y: f64) -> bool {
	(x - from_x).hypot(y - from_y) > CLICK_THRESHOLD
}

/// Canvas-local pointer position for a mouse event.
fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?;
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn parent_size(canvas: &HtmlCanvasElement) -> (f64, f64) {
	canvas
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.unwrap_or((800.0, 600.0))
}

/// Renders topic cards and their connections on a canvas element.
///
/// - click a card: `NodeSelected`; click empty canvas: `SelectionCleared`
/// - drag a card: `NodePositionChanged` on every move
/// - shift-drag from one card onto another: `EdgeCreated`
/// - click an edge, then Delete or Backspace: `EdgeDeleted`
/// - wheel zooms around the pointer, dragging the background pans
///
/// Bumping `fit_requests` re-fits the view; the first non-empty graph is
/// fitted automatically.
#[component]
pub fn FlowCanvas(
	#[prop(into)] nodes: Signal<Vec<Node>>,
	#[prop(into)] edges: Signal<Vec<Edge>>,
	#[prop(into)] selected: Signal<Option<String>>,
	#[prop(into)] fit_requests: Signal<u32>,
	on_event: Callback<GraphEvent>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: SharedContext = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	// Disposed with this component; the frame loop and resize handler check it.
	let mounted = StoredValue::new(());
	let (context_init, animate_init, resize_cb_init) =
		(context.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if context_init.borrow().is_some() {
			return;
		}
		let Some(window) = web_sys::window() else {
			return;
		};
		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			log::warn!("flow-suite: canvas 2d context unavailable");
			return;
		};

		let (w, h) = parent_size(&canvas);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		*context_init.borrow_mut() = Some(CanvasContext {
			state: CanvasState::new(w, h),
			scale: ScaleConfig::default(),
			theme: Theme::default(),
		});

		let (context_resize, canvas_resize) = (context_init.clone(), canvas.clone());
		*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
			if mounted.try_get_value().is_none() {
				return;
			}
			let (nw, nh) = parent_size(&canvas_resize);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			if let Some(ref mut c) = *context_resize.borrow_mut() {
				c.state.resize(nw, nh);
			}
		}));
		if let Some(ref cb) = *resize_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let (context_anim, animate_inner, resize_anim) =
			(context_init.clone(), animate_init.clone(), resize_cb_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if mounted.try_get_value().is_none() {
				// Unmounted: detach from the window and let the loop lapse.
				if let (Some(cb), Some(win)) = (resize_anim.borrow_mut().take(), web_sys::window()) {
					let _ = win.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
				}
				return;
			}
			if let Some(ref mut c) = *context_anim.borrow_mut() {
				c.state.tick(0.016);
				nodes.with_untracked(|nodes| {
					if c.state.pending_fit && c.state.fit_to(nodes, &c.scale) {
						c.state.pending_fit = false;
					}
					edges.with_untracked(|edges| {
						selected.with_untracked(|selected| {
							let frame = Frame {
								state: &c.state,
								nodes,
								edges,
								selected: selected.as_deref(),
								config: &c.scale,
								theme: &c.theme,
							};
							render::render(&frame, &ctx);
						})
					})
				});
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let context_fit = context.clone();
	Effect::new(move |previous: Option<u32>| {
		let requests = fit_requests.get();
		if previous.is_some() {
			if let Some(ref mut c) = *context_fit.borrow_mut() {
				c.state.pending_fit = true;
			}
		}
		requests
	});

	let context_md = context.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(canvas) = canvas_ref.get_untracked() {
			let _ = canvas.focus();
		}

		if let Some(ref mut c) = *context_md.borrow_mut() {
			nodes.with_untracked(|nodes| {
				edges.with_untracked(|edges| {
					c.state.gesture = if let Some(node) = c.state.node_at(x, y, nodes, &c.scale) {
						c.state.selected_edge = None;
						if ev.shift_key() {
							Gesture::Connect(ConnectState {
								source_id: node.id.clone(),
								cursor: c.state.screen_to_graph(x, y),
							})
						} else {
							Gesture::Drag(DragState {
								node_id: node.id.clone(),
								start_x: x,
								start_y: y,
								node_start: node.position,
								moved: false,
							})
						}
					} else if let Some(edge) = c.state.edge_at(x, y, nodes, edges, &c.scale) {
						c.state.selected_edge = Some(edge.id.clone());
						Gesture::EdgePress
					} else {
						c.state.selected_edge = None;
						Gesture::Pan(PanState {
							start_x: x,
							start_y: y,
							transform_start_x: c.state.transform.x,
							transform_start_y: c.state.transform.y,
							moved: false,
						})
					};
				})
			});
		}
	};

	let context_mm = context.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let mut event = None;

		if let Some(ref mut c) = *context_mm.borrow_mut() {
			let cursor = c.state.screen_to_graph(x, y);
			let k = c.state.transform.k;
			match &mut c.state.gesture {
				Gesture::Drag(drag) => {
					drag.moved |= travelled(drag.start_x, drag.start_y, x, y);
					if drag.moved {
						event = Some(GraphEvent::NodePositionChanged {
							id: drag.node_id.clone(),
							position: Position {
								x: drag.node_start.x + (x - drag.start_x) / k,
								y: drag.node_start.y + (y - drag.start_y) / k,
							},
						});
					}
				}
				Gesture::Pan(pan) => {
					pan.moved |= travelled(pan.start_x, pan.start_y, x, y);
					c.state.transform.x = pan.transform_start_x + (x - pan.start_x);
					c.state.transform.y = pan.transform_start_y + (y - pan.start_y);
				}
				Gesture::Connect(connect) => connect.cursor = cursor,
				Gesture::Idle | Gesture::EdgePress => {}
			}
		}

		if let Some(event) = event {
			on_event.run(event);
		}
	};

	let context_mu = context.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let point = pointer(canvas_ref, &ev);
		let mut event = None;

		if let Some(ref mut c) = *context_mu.borrow_mut() {
			event = match std::mem::take(&mut c.state.gesture) {
				Gesture::Drag(drag) if !drag.moved => Some(GraphEvent::NodeSelected { id: drag.node_id }),
				Gesture::Pan(pan) if !pan.moved => Some(GraphEvent::SelectionCleared),
				Gesture::Connect(connect) => point.and_then(|(x, y)| {
					nodes.with_untracked(|nodes| {
						c.state
							.node_at(x, y, nodes, &c.scale)
							.filter(|target| target.id != connect.source_id)
							.map(|target| GraphEvent::EdgeCreated {
								source: connect.source_id.clone(),
								target: target.id.clone(),
							})
					})
				}),
				_ => None,
			};
		}

		if let Some(event) = event {
			on_event.run(event);
		}
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_ml.borrow_mut() {
			c.state.gesture = Gesture::Idle;
		}
	};

	let context_kd = context.clone();
	let on_keydown = move |ev: KeyboardEvent| {
		let mut event = None;
		if let Some(ref mut c) = *context_kd.borrow_mut() {
			match ev.key().as_str() {
				"Delete" | "Backspace" => {
					if let Some(id) = c.state.selected_edge.take() {
						ev.prevent_default();
						event = Some(GraphEvent::EdgeDeleted { id });
					}
				}
				"Escape" => {
					c.state.selected_edge = None;
					c.state.gesture = Gesture::Idle;
				}
				_ => {}
			}
		}
		if let Some(event) = event {
			on_event.run(event);
		}
	};

	let context_wh = context.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			c.state.zoom_at(x, y, factor, &c.scale);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="flow-canvas"
			tabindex="0"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:keydown=on_keydown
			on:wheel=on_wheel
			style="display: block; width: 100%; height: 100%; outline: none; cursor: grab;"
		/>
	}
}
