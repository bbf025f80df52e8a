//! flow-suite: live topic-routing graph for the MC routing API.
//!
//! Fetches the routing document with the user's API key, turns topics and
//! flows into a node/edge graph and renders it on an interactive canvas.
//! A server-push subscription triggers a refresh whenever routing changes.

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;
pub mod config;
pub mod graph;
pub mod live;
pub mod routing;
pub mod selection;
pub mod storage;
pub mod store;

use components::{FlowCanvas, FlowHeader, LoginScreen, NodeDetailPanel};
use config::{EndpointOverrides, Endpoints};
use live::LiveUpdates;
use live::web::{EventSourceTransport, TimerScheduler};
use routing::Fetcher;
use routing::web::{BrowserTransport, TimeoutSleeper};
use selection::{Selection, valid_edges};
use storage::{CredentialStore, LoginError};
use store::{GraphEvent, GraphStore};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("flow-suite: logging initialized");
}

/// Resolve endpoints, applying a `<script id="flow-config">` JSON override if the page has one.
fn load_config() -> Endpoints {
	let endpoints = Endpoints::default();
	let Some(json_text) = config_script() else {
		return endpoints;
	};

	match serde_json::from_str::<EndpointOverrides>(&json_text) {
		Ok(overrides) => {
			let endpoints = endpoints.with_overrides(overrides);
			info!("flow-suite: using routing endpoint {}", endpoints.api_url);
			endpoints
		}
		Err(e) => {
			warn!("flow-suite: failed to parse flow-config: {}", e);
			endpoints
		}
	}
}

fn config_script() -> Option<String> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("flow-config")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

/// Main application component.
///
/// Shows the login form until a credential is stored, then the routing graph.
/// The credential drives everything else: setting it starts a refresh and a
/// live-update session, clearing it tears both down.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let endpoints = load_config();
	let credential = RwSignal::new(storage::LocalStorage::default().get());
	let store = RwSignal::new(GraphStore::default());
	let selection = RwSignal::new(Selection::default());
	let fit_requests = RwSignal::new(0u32);

	let nodes = Memo::new(move |_| store.with(|s| s.nodes().to_vec()));
	let edges = Memo::new(move |_| store.with(|s| valid_edges(s.nodes(), s.edges())));
	let selected = Memo::new(move |_| selection.with(|s| s.selected().map(str::to_string)));
	let selected_node =
		Memo::new(move |_| selection.with(|sel| store.with(|s| sel.node(s.nodes()).cloned())));

	let fetcher = StoredValue::new(Fetcher::new(
		BrowserTransport,
		TimeoutSleeper,
		endpoints.api_url.clone(),
	));
	let refresh = move || {
		let credential = credential.get_untracked();
		let fetcher = fetcher.get_value();
		spawn_local(async move {
			store::refresh(&store, &fetcher, credential.as_deref()).await;
		});
	};

	let live = StoredValue::new_local(LiveUpdates::new(
		EventSourceTransport,
		TimerScheduler,
		endpoints,
		refresh,
	));

	Effect::new(move |_| {
		let current = credential.get();
		let signed_in = current.is_some();
		live.with_value(|live| live.set_credential(current));
		if signed_in {
			refresh();
		}
	});

	on_cleanup(move || {
		live.try_with_value(|live| live.teardown());
	});

	let on_login = Callback::new(move |input: String| -> Result<(), LoginError> {
		let key = storage::login(&storage::LocalStorage::default(), &input)?;
		info!("flow-suite: credential stored");
		credential.set(Some(key));
		Ok(())
	});

	let on_logout = Callback::new(move |_: ()| {
		storage::logout(&storage::LocalStorage::default());
		credential.set(None);
		store.update(GraphStore::clear);
		selection.update(Selection::clear);
		info!("flow-suite: logged out");
	});

	let on_event = Callback::new(move |event: GraphEvent| {
		selection.maybe_update(|s| s.apply(&event));
		store.maybe_update(|s| s.apply(&event));
	});

	let on_fit = Callback::new(move |_: ()| fit_requests.update(|n| *n += 1));
	let on_refresh = Callback::new(move |_: ()| refresh());
	let on_close = Callback::new(move |_: ()| selection.update(Selection::clear));

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Topic Routing" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Show
			when=move || credential.with(Option::is_some)
			fallback=move || view! { <LoginScreen on_login=on_login /> }
		>
			<div class="flow-suite">
				<FlowHeader
					loading=Signal::derive(move || store.with(GraphStore::loading))
					error=Signal::derive(move || store.with(|s| s.error().map(str::to_string)))
					node_count=Signal::derive(move || store.with(GraphStore::node_count))
					edge_count=Signal::derive(move || store.with(GraphStore::edge_count))
					on_fit=on_fit
					on_refresh=on_refresh
					on_logout=on_logout
				/>
				<div class="flow-body">
					<div class="canvas-container">
						<FlowCanvas
							nodes=nodes
							edges=edges
							selected=selected
							fit_requests=fit_requests
							on_event=on_event
						/>
					</div>
					<NodeDetailPanel node=selected_node on_close=on_close />
				</div>
			</div>
		</Show>
	}
}
