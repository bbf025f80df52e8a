//! Topic routing canvas.
//!
//! Renders topic cards and their flow connections on an HTML canvas with:
//! - Grid-placed cards coloured by topic type
//! - Animated directed edges with arrowheads and label plates
//! - Pan, zoom and fit-to-view
//! - Card dragging, selection and hand-drawn connections
//!
//! The component never edits graph data itself; interactions come back out as
//! [`GraphEvent`](crate::store::GraphEvent)s for the store and selection to apply.
//!
//! # Example
//!
//! ```ignore
//! view! {
//!     <FlowCanvas
//!         nodes=nodes
//!         edges=edges
//!         selected=selected
//!         fit_requests=fit
//!         on_event=Callback::new(move |event| handle(event))
//!     />
//! }
//! ```

mod component;
mod render;
pub mod scale;
mod state;
pub mod theme;

pub use component::FlowCanvas;
pub use theme::Theme;
