//! Wire shape of the routing document served by the MC API.
//!
//! Every struct keeps unrecognised fields in `extra` so newer servers never
//! break decoding. Key order of `topics` and `flows` follows the document.

use indexmap::IndexMap;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The full topic/flow graph description.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingDocument {
	/// Topics by key, in document order.
	#[serde(default, deserialize_with = "lenient_map")]
	pub topics: IndexMap<String, Topic>,
	/// Server-side revision tag.
	#[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
	pub version: Option<String>,
	/// Last modification time as sent by the server.
	#[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
	pub updated_at: Option<String>,
}

/// A named routing endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Topic {
	/// Display label. Falls back to the topic key when absent.
	#[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Category tag, only used to pick a colour.
	#[serde(
		rename = "type",
		default,
		deserialize_with = "lenient_string",
		skip_serializing_if = "Option::is_none"
	)]
	pub kind: Option<String>,
	/// Free text shown on the card and in the detail panel.
	#[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Routing rules by flow key, in document order.
	#[serde(default, deserialize_with = "lenient_map")]
	pub flows: IndexMap<String, FlowDefinition>,
	/// Fields this client does not interpret.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// A routing rule inside a topic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowDefinition {
	/// Target topic keys.
	#[serde(default)]
	pub to: FlowTargets,
	/// Edge label. Falls back to the flow key when absent.
	#[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
	pub action: Option<String>,
	/// Server-side routing predicate, displayed only.
	#[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
	pub condition: Option<String>,
	/// Fields this client does not interpret.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// The `to` field: a single topic key or an ordered list of them.
///
/// Non-string list entries are skipped. Anything else the server sends
/// decodes as [`FlowTargets::Malformed`] and yields no targets.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlowTargets {
	/// Absent or `null`.
	#[default]
	Missing,
	/// A single topic key.
	One(String),
	/// A list of topic keys, possibly with junk entries.
	Many(Vec<Value>),
	/// Any other JSON value.
	Malformed(Value),
}

/// Keep a field only when it holds a string; any other JSON value reads as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(match Value::deserialize(deserializer)? {
		Value::String(text) => Some(text),
		_ => None,
	})
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Entry<T> {
	Valid(T),
	Invalid(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MapOrJunk<T> {
	Map(IndexMap<String, Entry<T>>),
	Junk(IgnoredAny),
}

/// Keyed collection that never fails: a non-object reads as empty and an
/// entry that does not decode is replaced by its default, keeping its key.
fn lenient_map<'de, D, T>(deserializer: D) -> Result<IndexMap<String, T>, D::Error>
where
	D: Deserializer<'de>,
	T: Default + DeserializeOwned,
{
	Ok(match MapOrJunk::<T>::deserialize(deserializer)? {
		MapOrJunk::Map(entries) => entries
			.into_iter()
			.map(|(key, entry)| match entry {
				Entry::Valid(value) => (key, value),
				Entry::Invalid(_) => (key, T::default()),
			})
			.collect(),
		MapOrJunk::Junk(_) => IndexMap::new(),
	})
}

impl FlowTargets {
	/// Target keys in order, with empty and non-string entries skipped.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		let (one, many): (Option<&str>, &[Value]) = match self {
			FlowTargets::One(target) => (Some(target.as_str()), &[]),
			FlowTargets::Many(targets) => (None, targets.as_slice()),
			FlowTargets::Missing | FlowTargets::Malformed(_) => (None, &[]),
		};
		one.into_iter()
			.chain(many.iter().filter_map(Value::as_str))
			.filter(|target| !target.is_empty())
	}
}

impl Topic {
	/// Resolved display label for the topic stored under `key`.
	pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
		self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(key)
	}
}

impl FlowDefinition {
	/// Resolved edge label for the flow stored under `key`.
	pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
		self.action.as_deref().filter(|a| !a.is_empty()).unwrap_or(key)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decodes_scalar_and_list_targets() {
		let doc: RoutingDocument = serde_json::from_str(
			r#"{
				"topics": {
					"orders": {"flows": {"ship": {"to": "shipping"}}},
					"shipping": {"flows": {"fanout": {"to": ["a", "", null, "b"]}}}
				}
			}"#,
		)
		.unwrap();

		let ship = &doc.topics["orders"].flows["ship"];
		assert_eq!(ship.to.iter().collect::<Vec<_>>(), vec!["shipping"]);
		let fanout = &doc.topics["shipping"].flows["fanout"];
		assert_eq!(fanout.to.iter().collect::<Vec<_>>(), vec!["a", "b"]);
	}

	#[test]
	fn keeps_document_key_order() {
		let doc: RoutingDocument =
			serde_json::from_str(r#"{"topics": {"zeta": {}, "alpha": {}, "mid": {}}}"#).unwrap();
		let keys: Vec<_> = doc.topics.keys().map(String::as_str).collect();
		assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
	}

	#[test]
	fn tolerates_unknown_and_odd_fields() {
		let doc: RoutingDocument = serde_json::from_str(
			r#"{
				"version": "7",
				"topics": {
					"t": {
						"type": "filter",
						"owner": "ops",
						"flows": {
							"nowhere": {"condition": "x > 1"},
							"weird": {"to": 42, "priority": 3}
						}
					}
				}
			}"#,
		)
		.unwrap();

		let topic = &doc.topics["t"];
		assert_eq!(topic.kind.as_deref(), Some("filter"));
		assert_eq!(topic.extra["owner"], "ops");
		assert_eq!(topic.flows["nowhere"].to, FlowTargets::Missing);
		assert_eq!(topic.flows["weird"].to.iter().count(), 0);
		assert_eq!(topic.flows["weird"].extra["priority"], 3);
	}

	#[test]
	fn missing_topics_is_an_empty_document() {
		let doc: RoutingDocument = serde_json::from_str(r#"{"updated_at": "now"}"#).unwrap();
		assert!(doc.topics.is_empty());
		let doc: RoutingDocument =
			serde_json::from_str(r#"{"topics": {"t": {"flows": null}}}"#).unwrap();
		assert!(doc.topics["t"].flows.is_empty());
	}

	#[test]
	fn labels_fall_back_to_keys() {
		let topic = Topic::default();
		assert_eq!(topic.display_name("orders"), "orders");
		let flow = FlowDefinition {
			action: Some("forward".into()),
			..Default::default()
		};
		assert_eq!(flow.label("ship"), "forward");
		assert_eq!(FlowDefinition::default().label("ship"), "ship");
	}

	#[test]
	fn mistyped_optional_fields_read_as_absent() {
		let doc: RoutingDocument = serde_json::from_str(
			r#"{
				"version": 3,
				"topics": {
					"a": {"name": 5, "type": ["x"], "description": false, "flows": {
						"f": {"to": "b", "action": 7, "condition": {}}
					}},
					"b": {}
				}
			}"#,
		)
		.unwrap();

		assert_eq!(doc.version, None);
		let a = &doc.topics["a"];
		assert_eq!(a.display_name("a"), "a");
		assert_eq!(a.kind, None);
		assert_eq!(a.description, None);
		let flow = &a.flows["f"];
		assert_eq!(flow.label("f"), "f");
		assert_eq!(flow.condition, None);
		assert_eq!(flow.to.iter().collect::<Vec<_>>(), vec!["b"]);
	}

	#[test]
	fn non_object_collections_read_as_empty() {
		let doc: RoutingDocument =
			serde_json::from_str(r#"{"topics": {"a": {"flows": []}, "b": {"flows": "none"}}}"#).unwrap();
		assert!(doc.topics["a"].flows.is_empty());
		assert!(doc.topics["b"].flows.is_empty());

		let doc: RoutingDocument = serde_json::from_str(r#"{"topics": [1, 2]}"#).unwrap();
		assert!(doc.topics.is_empty());
	}

	#[test]
	fn malformed_entries_keep_their_key() {
		let doc: RoutingDocument = serde_json::from_str(
			r#"{"topics": {"a": 5, "b": {"flows": {"f": "oops", "g": {"to": "a"}}}, "c": null}}"#,
		)
		.unwrap();

		let keys: Vec<_> = doc.topics.keys().map(String::as_str).collect();
		assert_eq!(keys, vec!["a", "b", "c"]);
		assert_eq!(doc.topics["a"], Topic::default());
		let flows = &doc.topics["b"].flows;
		assert_eq!(flows["f"].to.iter().count(), 0);
		assert_eq!(flows["g"].to.iter().collect::<Vec<_>>(), vec!["a"]);
	}

	#[test]
	fn mixed_target_lists_keep_string_entries() {
		let flow: FlowDefinition =
			serde_json::from_str(r#"{"to": ["b", 5, {"k": 1}, "", "c", true]}"#).unwrap();
		assert_eq!(flow.to.iter().collect::<Vec<_>>(), vec!["b", "c"]);
	}

	#[test]
	fn flow_order_follows_document() {
		let topic: Topic =
			serde_json::from_str(r#"{"flows": {"zz": {}, "aa": {}, "mm": {"to": 1}}}"#).unwrap();
		let keys: Vec<_> = topic.flows.keys().map(String::as_str).collect();
		assert_eq!(keys, vec!["zz", "aa", "mm"]);
	}
}
