//! Toolbar above the canvas: title, status badges, counts and actions.

use leptos::prelude::*;

/// "N topics | M connections", shown only for a settled, successful, non-empty build.
pub fn stats_text(loading: bool, error: Option<&str>, topics: usize, connections: usize) -> Option<String> {
	if loading || error.is_some() || topics == 0 {
		return None;
	}
	Some(format!("{topics} topics | {connections} connections"))
}

/// Toolbar with status badges and the Fit, Refresh and Logout actions.
#[component]
pub fn FlowHeader(
	#[prop(into)] loading: Signal<bool>,
	#[prop(into)] error: Signal<Option<String>>,
	#[prop(into)] node_count: Signal<usize>,
	#[prop(into)] edge_count: Signal<usize>,
	on_fit: Callback<()>,
	on_refresh: Callback<()>,
	on_logout: Callback<()>,
) -> impl IntoView {
	let stats = move || {
		error.with(|error| {
			stats_text(
				loading.get(),
				error.as_deref(),
				node_count.get(),
				edge_count.get(),
			)
		})
	};

	view! {
		<header class="flow-header">
			<h1>"Topic Routing"</h1>
			<Show when=move || loading.get()>
				<span class="badge badge-loading">"Loading..."</span>
			</Show>
			<Show when=move || error.with(Option::is_some)>
				<span class="badge badge-error" title=move || error.get().unwrap_or_default()>
					{move || format!("Error: {}", error.get().unwrap_or_default())}
				</span>
			</Show>
			{move || stats().map(|text| view! { <span class="stats">{text}</span> })}
			<div class="actions">
				<button on:click=move |_| on_fit.run(())>"Fit"</button>
				<button
					disabled=move || loading.get()
					on:click=move |_| on_refresh.run(())
				>
					"Refresh"
				</button>
				<button class="logout" on:click=move |_| on_logout.run(())>"Logout"</button>
			</div>
		</header>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stats_only_for_settled_non_empty_builds() {
		assert_eq!(
			stats_text(false, None, 3, 2).as_deref(),
			Some("3 topics | 2 connections")
		);
		assert_eq!(stats_text(true, None, 3, 2), None);
		assert_eq!(stats_text(false, Some("HTTP 500: boom"), 3, 2), None);
		assert_eq!(stats_text(false, None, 0, 0), None);
	}
}
