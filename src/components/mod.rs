//! View components.

pub mod detail_panel;
pub mod flow_canvas;
pub mod header;
pub mod login;

pub use detail_panel::NodeDetailPanel;
pub use flow_canvas::FlowCanvas;
pub use header::FlowHeader;
pub use login::LoginScreen;
