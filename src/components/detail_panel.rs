//! Side panel describing the selected topic and its flows.

use leptos::prelude::*;

use crate::components::flow_canvas::theme::type_color;
use crate::graph::Node;
use crate::routing::Topic;

/// One flow as listed in the panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowRow {
	/// Flow key within the topic.
	pub key: String,
	/// Action tag, when the flow has a non-empty one.
	pub action: Option<String>,
	/// Non-empty target keys in document order.
	pub targets: Vec<String>,
}

/// Flows of `topic` in document order.
pub fn flow_rows(topic: &Topic) -> Vec<FlowRow> {
	topic
		.flows
		.iter()
		.map(|(key, flow)| FlowRow {
			key: key.clone(),
			action: flow.action.clone().filter(|a| !a.is_empty()),
			targets: flow.to.iter().map(str::to_string).collect(),
		})
		.collect()
}

/// Details of the selected topic. Renders nothing while `node` is `None`.
#[component]
pub fn NodeDetailPanel(#[prop(into)] node: Signal<Option<Node>>, on_close: Callback<()>) -> impl IntoView {
	move || {
		node.get().map(|node| {
			let name = node.topic.display_name(&node.id).to_string();
			let kind = node.topic.kind.clone();
			let description = node.topic.description.clone().filter(|d| !d.is_empty());
			let rows = flow_rows(&node.topic);

			view! {
				<aside class="detail-panel">
					<div class="detail-header">
						<h2>{name}</h2>
						<button class="close" title="Close" on:click=move |_| on_close.run(())>
							"×"
						</button>
					</div>
					<code class="topic-key">{node.id.clone()}</code>
					{kind.map(|kind| {
						let style = format!("background: {}", type_color(Some(&kind)).to_css());
						view! { <span class="type-badge" style=style>{kind}</span> }
					})}
					{description.map(|text| view! { <p class="description">{text}</p> })}
					<h3>"Flows"</h3>
					{if rows.is_empty() {
						view! { <p class="placeholder">"no flows configured"</p> }.into_any()
					} else {
						view! {
							<ul class="flow-list">
								{rows
									.into_iter()
									.map(|row| {
										view! {
											<li class="flow">
												<span class="flow-key">{row.key}</span>
												{row.action.map(|action| view! { <span class="chip action">{action}</span> })}
												{row
													.targets
													.into_iter()
													.map(|target| view! { <span class="chip target">{"→ "}{target}</span> })
													.collect_view()}
											</li>
										}
									})
									.collect_view()}
							</ul>
						}
							.into_any()
					}}
				</aside>
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rows_follow_document_order_with_fallbacks() {
		let topic: Topic = serde_json::from_str(
			r#"{"flows": {
				"z": {"to": ["a", "", "b"], "action": "forward"},
				"m": {"to": "c", "name": "Mirror", "action": ""},
				"n": {}
			}}"#,
		)
		.unwrap();
		let rows = flow_rows(&topic);

		assert_eq!(rows.len(), 3);
		assert_eq!(rows[0].key, "z");
		assert_eq!(rows[0].targets, vec!["a", "b"]);
		assert_eq!(rows[0].action.as_deref(), Some("forward"));
		assert_eq!(rows[1].action, None);
		assert_eq!(rows[2].key, "n");
		assert!(rows[2].targets.is_empty());
	}

	#[test]
	fn topic_without_flows_has_no_rows() {
		assert!(flow_rows(&Topic::default()).is_empty());
	}
}
