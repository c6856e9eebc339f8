//! Pointer-driven dragging and selection. The controller is the only writer
//! of pin state; the simulation just honours whatever pins are set when the
//! next tick starts.

use log::debug;

use super::simulation::Simulation;

/// What a click landed on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickTarget {
	/// A node, by key.
	Node(String),
	/// Empty canvas.
	Background,
}

/// Pointer events at the component boundary, in graph coordinates.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum PointerEvent {
	/// Press-and-move began on node `key` at `(x, y)`.
	DragStart { key: String, x: f64, y: f64 },
	/// The dragged node should now sit at `(x, y)`.
	DragMove { key: String, x: f64, y: f64 },
	/// The pointer released node `key` at `(x, y)`.
	DragEnd { key: String, x: f64, y: f64 },
	/// A press that did not travel.
	Click(ClickTarget),
}

/// Tracks the dragged and the selected node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InteractionController {
	selected: Option<String>,
	dragged: Option<String>,
}

impl InteractionController {
	/// Nothing dragged, nothing selected.
	pub fn new() -> Self {
		Self::default()
	}

	/// Pin `key` where it currently is and reheat the layout. A drag already
	/// in progress on another node is ended first.
	pub fn begin_drag(&mut self, sim: &mut Simulation, key: &str) -> bool {
		let Some((x, y)) = sim.position(key) else {
			return false;
		};
		if let Some(previous) = self.dragged.take() {
			if previous != key {
				sim.unpin(&previous);
			}
		}
		sim.pin(key, x, y);
		sim.set_dragging(true);
		sim.reheat();
		debug!("drag started on {key}");
		self.dragged = Some(key.to_owned());
		true
	}

	/// Move the pin of the node being dragged. Ignored for any other key.
	pub fn update_drag(&mut self, sim: &mut Simulation, key: &str, x: f64, y: f64) -> bool {
		if self.dragged.as_deref() != Some(key) {
			return false;
		}
		sim.pin(key, x, y)
	}

	/// Release the dragged node back to the simulation.
	pub fn end_drag(&mut self, sim: &mut Simulation, key: &str) -> bool {
		if self.dragged.as_deref() != Some(key) {
			return false;
		}
		self.dragged = None;
		sim.unpin(key);
		sim.set_dragging(false);
		debug!("drag ended on {key}");
		true
	}

	/// Set or clear the inspected node. Unknown keys leave the selection as
	/// is. Does not touch an ongoing drag.
	pub fn select(&mut self, sim: &Simulation, key: Option<&str>) -> bool {
		if sim.is_disposed() {
			return false;
		}
		match key {
			Some(key) if !sim.contains(key) => false,
			Some(key) => {
				self.selected = Some(key.to_owned());
				true
			}
			None => {
				self.selected = None;
				true
			}
		}
	}

	/// Dispatch one boundary event.
	pub fn handle(&mut self, sim: &mut Simulation, event: PointerEvent) -> bool {
		match event {
			PointerEvent::DragStart { key, .. } => self.begin_drag(sim, &key),
			PointerEvent::DragMove { key, x, y } => self.update_drag(sim, &key, x, y),
			PointerEvent::DragEnd { key, .. } => self.end_drag(sim, &key),
			PointerEvent::Click(ClickTarget::Node(key)) => self.select(sim, Some(&key)),
			PointerEvent::Click(ClickTarget::Background) => self.select(sim, None),
		}
	}

	/// Key of the inspected node.
	pub fn selected(&self) -> Option<&str> {
		self.selected.as_deref()
	}

	/// Key of the node being dragged.
	pub fn dragged(&self) -> Option<&str> {
		self.dragged.as_deref()
	}
}
