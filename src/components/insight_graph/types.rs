use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Read any JSON value and keep it only if it has the expected shape; null
/// or mistyped fields fall back to the default.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: DeserializeOwned + Default,
{
	let value = Value::deserialize(deserializer)?;
	Ok(T::deserialize(value).unwrap_or_default())
}

/// A record list where unreadable items are skipped rather than failing the
/// whole snapshot.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
	D: Deserializer<'de>,
	T: DeserializeOwned,
{
	let Value::Array(items) = Value::deserialize(deserializer)? else {
		return Ok(Vec::new());
	};
	Ok(items.into_iter().filter_map(|item| T::deserialize(item).ok()).collect())
}

/// Identifier of an input record. Journaling clients hand out either a
/// millisecond timestamp or an opaque string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
	/// Numeric id, typically `Date.now()` at creation.
	Number(i64),
	/// Free-form id.
	Text(String),
}

impl Default for RecordId {
	fn default() -> Self {
		RecordId::Text(String::new())
	}
}

impl fmt::Display for RecordId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RecordId::Number(n) => write!(f, "{n}"),
			RecordId::Text(s) => f.write_str(s),
		}
	}
}

/// Record timestamp: RFC 3339 text or milliseconds since the epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
	/// Milliseconds since the Unix epoch.
	Millis(i64),
	/// RFC 3339 date-time.
	Text(String),
}

/// A journal entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entry {
	/// Unique id; the node key is `entry-{id}`.
	#[serde(deserialize_with = "lenient")]
	pub id: RecordId,
	/// Training mode name, matched with [`Mode::parse`].
	#[serde(deserialize_with = "lenient")]
	pub mode: Option<String>,
	/// Free text of the entry.
	#[serde(deserialize_with = "lenient")]
	pub text: Option<String>,
	/// Name of the mental model the entry applies.
	#[serde(deserialize_with = "lenient")]
	pub model: Option<String>,
	/// When the entry was written.
	#[serde(deserialize_with = "lenient")]
	pub ts: Option<Timestamp>,
}

/// A named mental model from the catalog.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Model {
	/// Catalog key, referenced by [`Entry::model`].
	#[serde(deserialize_with = "lenient")]
	pub name: String,
	/// One-line description, shown as the model node's full text.
	#[serde(deserialize_with = "lenient")]
	pub desc: Option<String>,
	/// Catalog grouping, e.g. `Thinking`.
	#[serde(deserialize_with = "lenient")]
	pub category: Option<String>,
}

/// A second-brain note.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Note {
	/// Unique id.
	#[serde(deserialize_with = "lenient")]
	pub id: RecordId,
	/// Note category, `type` on the wire.
	#[serde(rename = "type", deserialize_with = "lenient")]
	pub kind: Option<String>,
	/// Note body.
	#[serde(deserialize_with = "lenient")]
	pub content: Option<String>,
	/// Creation time.
	#[serde(deserialize_with = "lenient")]
	pub ts: Option<Timestamp>,
}

/// The whole record snapshot a graph is built from. Supplied wholesale on
/// every rebuild.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordSource {
	/// Journal entries in input order.
	#[serde(deserialize_with = "lenient_list")]
	pub entries: Vec<Entry>,
	/// The model catalog.
	#[serde(deserialize_with = "lenient_list")]
	pub models: Vec<Model>,
	/// Second-brain notes; carried along but not drawn.
	#[serde(deserialize_with = "lenient_list")]
	pub notes: Vec<Note>,
}

impl RecordSource {
	/// Parse a `{ "entries": [...], "models": [...], "notes": [...] }` document.
	/// Every top-level array and every record field is optional.
	pub fn from_json(json: &str) -> Result<Self> {
		Ok(serde_json::from_str(json)?)
	}

	/// Build the graph for this snapshot.
	pub fn build(&self) -> Graph {
		super::builder::build(&self.entries, &self.models, &self.notes)
	}
}

/// Training modes; each gets one cluster node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
	/// Facts without interpretation.
	Observe,
	/// Recurring connections.
	Pattern,
	/// Better questions.
	Question,
	/// Something done about it.
	Action,
}

impl Mode {
	/// All modes in cluster emission order.
	pub const ALL: [Mode; 4] = [Mode::Observe, Mode::Pattern, Mode::Question, Mode::Action];

	/// Wire name, also used in node keys.
	pub fn as_str(self) -> &'static str {
		match self {
			Mode::Observe => "observe",
			Mode::Pattern => "pattern",
			Mode::Question => "question",
			Mode::Action => "action",
		}
	}

	/// Case-insensitive lookup; unknown names yield `None`.
	pub fn parse(name: &str) -> Option<Mode> {
		let name = name.trim();
		Mode::ALL
			.into_iter()
			.find(|m| m.as_str().eq_ignore_ascii_case(name))
	}
}

impl fmt::Display for Mode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Closed set of node kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeGroup {
	/// The root `me` node.
	Core,
	/// A mode cluster.
	Mode,
	/// A journal entry.
	Entry,
	/// A mental model.
	Model,
	/// A topic keyword.
	Keyword,
}

/// Static node attributes. Owned by the builder; the layout engine keeps
/// kinetic state separately, indexed the same way.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
	/// Unique within one graph.
	pub key: String,
	/// Kind of node.
	pub group: NodeGroup,
	/// Drawing size and collision extent.
	pub radius: f64,
	/// Display text; truncated for entries.
	pub label: String,
	/// Untruncated entry text or model description.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub full_text: Option<String>,
	/// Training mode of an entry.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub mode: Option<Mode>,
	/// Entry date, `YYYY-MM-DD`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub date: Option<String>,
}

impl Node {
	/// A node with no optional attributes set.
	pub fn new(key: impl Into<String>, group: NodeGroup, radius: f64, label: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			group,
			radius,
			label: label.into(),
			full_text: None,
			mode: None,
			date: None,
		}
	}
}

/// Weighted link between two node keys. Direction is bookkeeping only.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Link {
	/// Key of the cause side.
	pub source: String,
	/// Key of the effect side.
	pub target: String,
	/// Positive weight scaling the spring.
	pub strength: f64,
}

/// Nodes in insertion order with a key index, plus the link list.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Graph {
	nodes: Vec<Node>,
	links: Vec<Link>,
	#[serde(skip)]
	index: HashMap<String, usize>,
}

impl Graph {
	/// Insert `node` unless its key is taken. Returns whether it was inserted.
	pub fn insert_node(&mut self, node: Node) -> bool {
		if self.index.contains_key(&node.key) {
			return false;
		}
		self.index.insert(node.key.clone(), self.nodes.len());
		self.nodes.push(node);
		true
	}

	/// Append a link. Parallel links are kept; their forces add up.
	pub fn link(&mut self, source: &str, target: &str, strength: f64) {
		self.links.push(Link {
			source: source.to_owned(),
			target: target.to_owned(),
			strength,
		});
	}

	/// Whether a node with `key` exists.
	pub fn contains(&self, key: &str) -> bool {
		self.index.contains_key(key)
	}

	/// Insertion index of `key`.
	pub fn index_of(&self, key: &str) -> Option<usize> {
		self.index.get(key).copied()
	}

	/// Node by key.
	pub fn node(&self, key: &str) -> Option<&Node> {
		self.index_of(key).map(|i| &self.nodes[i])
	}

	/// Nodes in insertion order.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// Links in insertion order.
	pub fn links(&self) -> &[Link] {
		&self.links
	}

	/// Keys linked to `key` in either direction, without duplicates.
	pub fn neighbors(&self, key: &str) -> Vec<&str> {
		let mut out: Vec<&str> = Vec::new();
		for link in &self.links {
			let other = if link.source == key {
				&link.target
			} else if link.target == key {
				&link.source
			} else {
				continue;
			};
			if !out.contains(&other.as_str()) {
				out.push(other);
			}
		}
		out
	}
}

/// One node as handed to the renderer: the [`Node`] attributes plus its
/// position after the last tick.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[allow(missing_docs)]
#[serde(rename_all = "camelCase")]
pub struct NodeFrame {
	pub key: String,
	pub group: NodeGroup,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub mode: Option<Mode>,
	pub radius: f64,
	pub label: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub full_text: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub date: Option<String>,
	pub x: f64,
	pub y: f64,
}

/// One link as handed to the renderer, [`Link`] under its wire names.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[allow(missing_docs)]
#[serde(rename_all = "camelCase")]
pub struct LinkFrame {
	pub source_key: String,
	pub target_key: String,
	pub weight: f64,
}

/// A fully integrated snapshot of the layout plus interaction pointers.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
	/// Every node, in graph order.
	pub nodes: Vec<NodeFrame>,
	/// Every link; empty once disposed.
	pub links: Vec<LinkFrame>,
	/// Key of the inspected node.
	pub selected: Option<String>,
	/// Key of the node being dragged.
	pub dragged: Option<String>,
}
