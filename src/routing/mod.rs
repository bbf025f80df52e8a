//! Routing document model and retrieval.

mod fetch;
mod types;
pub mod web;

pub use fetch::{FetchError, Fetcher, RawResponse, RoutingTransport, Sleeper};
pub use types::{FlowDefinition, FlowTargets, RoutingDocument, Topic};
