//! Mental-model graph: records in, an interactive force-directed canvas out.
//!
//! Everything but `component` and `render` is plain Rust and runs outside a
//! browser, which is how the layout engine and the interaction rules are
//! tested.

mod builder;
mod component;
mod config;
mod forces;
mod interaction;
pub mod palette;
mod render;
mod simulation;
mod state;
mod types;

pub use builder::{CENTER_KEY, KEYWORDS, LABEL_MAX_CHARS, build, keyword_key, mode_key, model_key, truncate_label};
pub use component::InsightGraph;
pub use config::SimulationConfig;
pub use interaction::{ClickTarget, InteractionController, PointerEvent};
pub use simulation::{Body, Phase, Simulation};
pub use state::{CLICK_TOLERANCE, HIT_SLOP, InsightGraphState, Selection, ViewTransform};
pub use types::{
	Entry, Frame, Graph, Link, LinkFrame, Mode, Model, Node, NodeFrame, NodeGroup, Note, RecordId, RecordSource,
	Timestamp,
};
