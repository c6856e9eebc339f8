//! Colors shared by the canvas renderer and the legend.

use super::types::{Mode, NodeGroup};

/// Canvas fill behind the graph.
pub const BACKGROUND: &str = "#111114";
/// Link stroke.
pub const LINK_COLOR: &str = "rgba(113, 113, 122, 0.6)";
/// Stroke of links touching the selection.
pub const LINK_HIGHLIGHT: &str = "rgba(100, 255, 218, 0.9)";
/// Node outline.
pub const NODE_STROKE: &str = "#ffffff";

const MODEL: &str = "#bd93f9";
const KEYWORD: &str = "#ffb86c";
const CORE: &str = "#ffffff";
const ENTRY_FALLBACK: &str = "#50fa7b";
const MODE_FALLBACK: &str = "#8be9fd";

/// Legend rows, in display order.
pub const LEGEND: [(&str, &str); 6] = [
	("Observe", "#64ffda"),
	("Pattern", "#bb86fc"),
	("Question", "#ff79c6"),
	("Action", "#f1fa8c"),
	("Model", MODEL),
	("Logic", KEYWORD),
];

/// Color of a training mode, as shown in the legend.
pub fn mode_color(mode: Mode) -> &'static str {
	match mode {
		Mode::Observe => "#64ffda",
		Mode::Pattern => "#bb86fc",
		Mode::Question => "#ff79c6",
		Mode::Action => "#f1fa8c",
	}
}

/// Fill color of a node. Entries take their mode's color; clusters and
/// mode-less entries use a fixed fallback.
pub fn node_color(group: NodeGroup, mode: Option<Mode>) -> &'static str {
	match (group, mode) {
		(NodeGroup::Core, _) => CORE,
		(NodeGroup::Mode | NodeGroup::Entry, Some(mode)) => mode_color(mode),
		(NodeGroup::Mode, None) => MODE_FALLBACK,
		(NodeGroup::Entry, None) => ENTRY_FALLBACK,
		(NodeGroup::Model, _) => MODEL,
		(NodeGroup::Keyword, _) => KEYWORD,
	}
}
