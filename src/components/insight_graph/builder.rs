//! Derives the node/link graph from a record snapshot.
//!
//! Pure and total: identical input always yields an identical graph, and
//! missing or odd fields degrade to defaults instead of failing.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::types::{Entry, Graph, Mode, Model, Node, NodeGroup, Note, Timestamp};

/// Key of the root node.
pub const CENTER_KEY: &str = "me";

/// Topic vocabulary, matched case-insensitively as substrings, in this order.
pub const KEYWORDS: [&str; 9] = [
	"focus", "sleep", "anxiety", "energy", "habit", "decision", "fear", "goal", "time",
];

/// Entry labels keep at most this many UTF-16 code units before the ellipsis.
pub const LABEL_MAX_CHARS: usize = 20;
const ELLIPSIS: &str = "...";

const CENTER_RADIUS: f64 = 30.0;
const MODE_RADIUS: f64 = 20.0;
const MODEL_RADIUS: f64 = 15.0;
const KEYWORD_RADIUS: f64 = 12.0;
const ENTRY_RADIUS: f64 = 8.0;

const MODE_WEIGHT: f64 = 2.0;
const ENTRY_MODE_WEIGHT: f64 = 1.0;
const MODEL_CENTER_WEIGHT: f64 = 1.0;
const ENTRY_MODEL_WEIGHT: f64 = 3.0;
const KEYWORD_WEIGHT: f64 = 2.0;

/// Key of a mode cluster node.
pub fn mode_key(mode: Mode) -> String {
	format!("mode-{mode}")
}

/// Key of the node for a named model.
pub fn model_key(name: &str) -> String {
	format!("model-{name}")
}

/// Key of a topic keyword node.
pub fn keyword_key(keyword: &str) -> String {
	format!("keyword-{keyword}")
}

/// Build the graph: center, mode clusters, then entries in input order with
/// their lazily created model and keyword nodes. Notes are part of the
/// snapshot but do not contribute nodes.
pub fn build(entries: &[Entry], models: &[Model], _notes: &[Note]) -> Graph {
	let mut graph = Graph::default();
	graph.insert_node(Node::new(CENTER_KEY, NodeGroup::Core, CENTER_RADIUS, "Me"));

	for mode in Mode::ALL {
		let key = mode_key(mode);
		// Clusters carry no mode of their own; only entries are colored by mode.
		graph.insert_node(Node::new(key.as_str(), NodeGroup::Mode, MODE_RADIUS, mode.as_str()));
		graph.link(CENTER_KEY, &key, MODE_WEIGHT);
	}

	let catalog: HashMap<&str, &Model> = models.iter().map(|m| (m.name.as_str(), m)).collect();
	for entry in entries {
		add_entry(&mut graph, entry, &catalog);
	}
	graph
}

fn add_entry(graph: &mut Graph, entry: &Entry, catalog: &HashMap<&str, &Model>) {
	let key = format!("entry-{}", entry.id);
	let text = entry.text.as_deref().unwrap_or_default();
	let mode = entry.mode.as_deref().and_then(Mode::parse);

	let inserted = graph.insert_node(Node {
		full_text: (!text.is_empty()).then(|| text.to_owned()),
		mode,
		date: entry.ts.as_ref().and_then(format_date),
		..Node::new(key.as_str(), NodeGroup::Entry, ENTRY_RADIUS, truncate_label(text))
	});
	// Duplicate ids: first occurrence wins.
	if !inserted {
		return;
	}

	match mode {
		Some(mode) => graph.link(&mode_key(mode), &key, ENTRY_MODE_WEIGHT),
		None => graph.link(CENTER_KEY, &key, ENTRY_MODE_WEIGHT),
	}

	if let Some(name) = entry.model.as_deref().filter(|n| !n.trim().is_empty()) {
		let target = model_key(name);
		if !graph.contains(&target) {
			graph.insert_node(Node {
				full_text: catalog.get(name).and_then(|m| m.desc.clone()),
				..Node::new(target.as_str(), NodeGroup::Model, MODEL_RADIUS, name)
			});
			graph.link(CENTER_KEY, &target, MODEL_CENTER_WEIGHT);
		}
		graph.link(&key, &target, ENTRY_MODEL_WEIGHT);
	}

	let lowered = text.to_lowercase();
	for keyword in KEYWORDS.into_iter().filter(|kw| lowered.contains(kw)) {
		let target = keyword_key(keyword);
		if !graph.contains(&target) {
			graph.insert_node(Node::new(target.as_str(), NodeGroup::Keyword, KEYWORD_RADIUS, keyword));
		}
		graph.link(&key, &target, KEYWORD_WEIGHT);
	}
}

/// Cut `text` to [`LABEL_MAX_CHARS`] UTF-16 code units and append `...`,
/// the way journaling clients measure string length. A surrogate pair that
/// would straddle the limit is dropped whole.
pub fn truncate_label(text: &str) -> String {
	if text.encode_utf16().count() <= LABEL_MAX_CHARS {
		return text.to_owned();
	}
	let mut units = 0;
	let cut = text
		.char_indices()
		.find(|(_, c)| {
			units += c.len_utf16();
			units > LABEL_MAX_CHARS
		})
		.map_or(text.len(), |(i, _)| i);
	format!("{}{ELLIPSIS}", &text[..cut])
}

/// Calendar date (UTC, `YYYY-MM-DD`) of a record timestamp.
fn format_date(ts: &Timestamp) -> Option<String> {
	let utc: DateTime<Utc> = match ts {
		Timestamp::Millis(ms) => DateTime::from_timestamp_millis(*ms)?,
		Timestamp::Text(text) => DateTime::parse_from_rfc3339(text.trim())
			.ok()?
			.with_timezone(&Utc),
	};
	Some(utc.format("%Y-%m-%d").to_string())
}
