//! Credential entry form shown while logged out.

use leptos::ev::SubmitEvent;
use leptos::prelude::*;

use crate::storage::LoginError;

/// API key form. `on_login` validates and stores the key; a rejection is shown inline.
#[component]
pub fn LoginScreen(on_login: Callback<String, Result<(), LoginError>>) -> impl IntoView {
	let input = RwSignal::new(String::new());
	let error = RwSignal::new(None::<String>);

	let on_submit = move |ev: SubmitEvent| {
		ev.prevent_default();
		match on_login.run(input.get_untracked()) {
			Ok(()) => {
				error.set(None);
				input.set(String::new());
			}
			Err(e) => error.set(Some(e.to_string())),
		}
	};

	view! {
		<div class="login-screen">
			<form class="login-card" on:submit=on_submit>
				<h1>"Topic Routing"</h1>
				<p class="subtitle">"Enter your API key to view the routing graph."</p>
				<input
					type="password"
					class="login-input"
					placeholder="API key"
					autocomplete="off"
					prop:value=move || input.get()
					on:input=move |ev| input.set(event_target_value(&ev))
				/>
				<Show when=move || error.with(Option::is_some)>
					<p class="login-error">{move || error.get().unwrap_or_default()}</p>
				</Show>
				<button type="submit" class="login-button">"Connect"</button>
			</form>
		</div>
	}
}
