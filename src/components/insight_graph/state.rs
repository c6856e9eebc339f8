use std::collections::HashSet;

use log::debug;

use super::config::SimulationConfig;
use super::interaction::{ClickTarget, InteractionController, PointerEvent};
use super::simulation::Simulation;
use super::types::{Frame, Graph, LinkFrame, Node, NodeFrame};

/// World-space slack around a node's rim that still counts as a hit.
pub const HIT_SLOP: f64 = 4.0;
/// Screen pixels a press may travel and still count as a click.
pub const CLICK_TOLERANCE: f64 = 3.0;
const MIN_ZOOM: f64 = 0.1;
const MAX_ZOOM: f64 = 10.0;

/// Graph-to-screen mapping: `screen = graph * k + (x, y)`.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	/// Horizontal offset in screen pixels.
	pub x: f64,
	/// Vertical offset in screen pixels.
	pub y: f64,
	/// Zoom factor.
	pub k: f64,
}

/// A press on a node. `moved` flips once it travels far enough to be a drag.
#[derive(Clone, Debug, Default)]
struct DragState {
	key: Option<String>,
	start_x: f64,
	start_y: f64,
	grab_dx: f64,
	grab_dy: f64,
	moved: bool,
}

#[derive(Clone, Debug, Default)]
struct PanState {
	active: bool,
	start_x: f64,
	start_y: f64,
	transform_start_x: f64,
	transform_start_y: f64,
	moved: bool,
}

/// Tooltip contents for the selected node.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
	/// Node label.
	pub label: String,
	/// Untruncated text, for entries and described models.
	pub full_text: Option<String>,
	/// Entry date, `YYYY-MM-DD`.
	pub date: Option<String>,
}

/// Everything the canvas needs between frames: the graph, its running
/// simulation, the interaction controller and the view.
pub struct InsightGraphState {
	/// The graph being shown.
	pub graph: Graph,
	/// Its layout, indexed like `graph`.
	pub simulation: Simulation,
	/// Drag and selection.
	pub controller: InteractionController,
	/// Current pan and zoom.
	pub transform: ViewTransform,
	drag: DragState,
	pan: PanState,
	/// Canvas width in pixels.
	pub width: f64,
	/// Canvas height in pixels.
	pub height: f64,
	highlighted: HashSet<String>,
}

impl InsightGraphState {
	/// Seed a simulation for `graph` on a `width` x `height` canvas, with the
	/// layout center in the middle of the canvas.
	pub fn new(graph: Graph, config: SimulationConfig, width: f64, height: f64) -> Self {
		let (cx, cy) = config.center;
		let simulation = Simulation::new(&graph, config);
		debug!(
			"insight graph built: {} nodes, {} links",
			graph.nodes().len(),
			graph.links().len()
		);
		Self {
			graph,
			simulation,
			controller: InteractionController::new(),
			transform: ViewTransform {
				x: width / 2.0 - cx,
				y: height / 2.0 - cy,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			width,
			height,
			highlighted: HashSet::new(),
		}
	}

	/// Swap in a freshly built graph. The old simulation is disposed and a new
	/// one seeded; the view stays put and the selection survives if its key
	/// still exists.
	pub fn rebuild(&mut self, graph: Graph) {
		let selected = self.controller.selected().map(str::to_owned);
		let config = self.simulation.config().clone();
		self.simulation.dispose();
		self.simulation = Simulation::new(&graph, config);
		self.graph = graph;
		self.controller = InteractionController::new();
		self.controller.select(&self.simulation, selected.as_deref());
		self.drag = DragState::default();
		self.refresh_highlight();
		debug!(
			"insight graph rebuilt: {} nodes, {} links",
			self.graph.nodes().len(),
			self.graph.links().len()
		);
	}

	/// Tear down: the simulation releases its state and stops ticking.
	pub fn dispose(&mut self) {
		self.simulation.dispose();
		self.controller = InteractionController::new();
		self.drag = DragState::default();
		self.pan = PanState::default();
		self.highlighted.clear();
	}

	/// Advance the layout one frame.
	pub fn tick(&mut self) -> bool {
		self.simulation.tick()
	}

	/// Canvas pixel to graph coordinates.
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Topmost node under a screen point. Nodes are drawn in graph order, so
	/// later nodes win.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<String> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		self.simulation
			.bodies()
			.iter()
			.enumerate()
			.rev()
			.find(|(_, body)| {
				let (dx, dy) = (body.x - gx, body.y - gy);
				(dx * dx + dy * dy).sqrt() < body.radius + HIT_SLOP
			})
			.map(|(i, _)| self.graph.nodes()[i].key.clone())
	}

	/// Press: on a node this arms a drag, on the background a pan. The drag
	/// only starts (pinning and reheating the layout) once the pointer moves
	/// past [`CLICK_TOLERANCE`], so a plain click leaves the layout alone.
	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let hit = self
			.node_at_position(sx, sy)
			.and_then(|key| self.simulation.position(&key).map(|pos| (key, pos)));

		if let Some((key, (nx, ny))) = hit {
			self.drag = DragState {
				key: Some(key),
				start_x: sx,
				start_y: sy,
				grab_dx: nx - gx,
				grab_dy: ny - gy,
				moved: false,
			};
		} else {
			self.pan = PanState {
				active: true,
				start_x: sx,
				start_y: sy,
				transform_start_x: self.transform.x,
				transform_start_y: self.transform.y,
				moved: false,
			};
		}
	}

	/// Drag the armed node or pan the view.
	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if let Some(key) = self.drag.key.clone() {
			let (gx, gy) = self.screen_to_graph(sx, sy);
			if !self.drag.moved {
				if !beyond_click(self.drag.start_x, self.drag.start_y, sx, sy) {
					return;
				}
				self.drag.moved = true;
				self.controller.handle(
					&mut self.simulation,
					PointerEvent::DragStart {
						key: key.clone(),
						x: gx,
						y: gy,
					},
				);
			}
			self.controller.handle(
				&mut self.simulation,
				PointerEvent::DragMove {
					key,
					x: gx + self.drag.grab_dx,
					y: gy + self.drag.grab_dy,
				},
			);
		} else if self.pan.active {
			self.pan.moved |= beyond_click(self.pan.start_x, self.pan.start_y, sx, sy);
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		}
	}

	/// Finish a press. A press that barely moved is a click: on a node it
	/// selects it, on the background it clears the selection.
	pub fn pointer_up(&mut self, sx: f64, sy: f64) {
		let drag = std::mem::take(&mut self.drag);
		if let Some(key) = drag.key {
			if drag.moved {
				let (gx, gy) = self.screen_to_graph(sx, sy);
				self.controller
					.handle(&mut self.simulation, PointerEvent::DragEnd { key, x: gx, y: gy });
			} else {
				self.controller
					.handle(&mut self.simulation, PointerEvent::Click(ClickTarget::Node(key)));
			}
		} else if self.pan.active && !self.pan.moved {
			self.controller
				.handle(&mut self.simulation, PointerEvent::Click(ClickTarget::Background));
		}
		self.pan = PanState::default();
		self.refresh_highlight();
	}

	/// Pointer left the canvas: release any drag without clicking.
	pub fn pointer_leave(&mut self) {
		let drag = std::mem::take(&mut self.drag);
		if let (Some(key), true) = (drag.key, drag.moved) {
			self.controller.end_drag(&mut self.simulation, &key);
		}
		self.pan = PanState::default();
	}

	/// Zoom around the pointer so the point under it stays fixed.
	pub fn zoom(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// New canvas size; the view shifts so the graph stays centered.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.transform.x += (width - self.width) / 2.0;
		self.transform.y += (height - self.height) / 2.0;
		self.width = width;
		self.height = height;
	}

	/// The selected node's attributes.
	pub fn selected_node(&self) -> Option<&Node> {
		self.controller.selected().and_then(|key| self.graph.node(key))
	}

	/// Tooltip contents for the selected node, if any.
	pub fn selection(&self) -> Option<Selection> {
		self.selected_node().map(|node| Selection {
			label: node.label.clone(),
			full_text: node.full_text.clone(),
			date: node.date.clone(),
		})
	}

	/// Whether `key` is the selected node or one of its neighbours.
	pub fn is_highlighted(&self, key: &str) -> bool {
		self.highlighted.contains(key)
	}

	/// Whether anything is selected, so the rest should be dimmed.
	pub fn has_highlight(&self) -> bool {
		!self.highlighted.is_empty()
	}

	fn refresh_highlight(&mut self) {
		self.highlighted.clear();
		if let Some(key) = self.controller.selected() {
			self.highlighted.insert(key.to_owned());
			self.highlighted
				.extend(self.graph.neighbors(key).into_iter().map(str::to_owned));
		}
	}

	/// Snapshot for the renderer: static attributes joined with the current
	/// positions. Empty once disposed.
	pub fn frame(&self) -> Frame {
		let nodes = self
			.graph
			.nodes()
			.iter()
			.zip(self.simulation.bodies())
			.map(|(node, body)| NodeFrame {
				key: node.key.clone(),
				group: node.group,
				mode: node.mode,
				radius: node.radius,
				label: node.label.clone(),
				full_text: node.full_text.clone(),
				date: node.date.clone(),
				x: body.x,
				y: body.y,
			})
			.collect();
		let links = if self.simulation.is_disposed() {
			Vec::new()
		} else {
			self.graph
				.links()
				.iter()
				.map(|link| LinkFrame {
					source_key: link.source.clone(),
					target_key: link.target.clone(),
					weight: link.strength,
				})
				.collect()
		};
		Frame {
			nodes,
			links,
			selected: self.controller.selected().map(str::to_owned),
			dragged: self.controller.dragged().map(str::to_owned),
		}
	}
}

fn beyond_click(x0: f64, y0: f64, x1: f64, y1: f64) -> bool {
	let (dx, dy) = (x1 - x0, y1 - y0);
	(dx * dx + dy * dy).sqrt() > CLICK_TOLERANCE
}

#[cfg(test)]
mod tests {
	use float_cmp::approx_eq;
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::components::insight_graph::builder::build;
	use crate::components::insight_graph::types::{Entry, RecordId};

	// 800x600 canvas: graph origin sits at screen (400, 300), and `me` is
	// seeded at graph (100, 0), i.e. screen (500, 300).
	fn state() -> InsightGraphState {
		InsightGraphState::new(build(&[], &[], &[]), SimulationConfig::default(), 800.0, 600.0)
	}

	fn with_entry() -> Graph {
		let entries = vec![Entry {
			id: RecordId::Number(7),
			mode: Some("action".into()),
			text: Some("Protect sleep".into()),
			..Entry::default()
		}];
		build(&entries, &[], &[])
	}

	#[test]
	fn hit_testing_uses_node_radius() {
		let s = state();
		assert_eq!(s.node_at_position(500.0, 300.0).as_deref(), Some("me"));
		assert_eq!(s.node_at_position(532.0, 300.0).as_deref(), Some("me"));
		assert_eq!(s.node_at_position(536.0, 300.0), None);
		assert_eq!(s.node_at_position(400.0, 300.0), None);
	}

	#[test]
	fn click_on_node_selects_it() {
		let mut s = state();
		s.pointer_down(500.0, 300.0);
		s.pointer_move(501.0, 300.0);
		assert_eq!(s.controller.dragged(), None);
		s.pointer_up(501.0, 300.0);
		assert_eq!(s.controller.selected(), Some("me"));
		assert_eq!(s.controller.dragged(), None);
		assert_eq!(s.simulation.pinned("me"), None);
		assert!(s.is_highlighted("me"));
		assert!(s.is_highlighted("mode-action"));
	}

	#[test]
	fn click_leaves_a_cooling_layout_alone() {
		let mut s = state();
		s.simulation.run(300);
		let cooling = s.simulation.cooling();
		let (x, y) = s.simulation.position("me").unwrap();
		let (sx, sy) = (s.transform.x + x, s.transform.y + y);
		s.pointer_down(sx, sy);
		assert_eq!(s.simulation.pinned("me"), None);
		assert_eq!(s.simulation.cooling(), cooling);
		s.pointer_up(sx + 1.0, sy);
		assert_eq!(s.simulation.cooling(), cooling);
		assert!(!s.simulation.is_dragging());
		assert_eq!(s.controller.selected(), Some("me"));
	}

	#[test]
	fn drag_starts_past_click_tolerance() {
		let mut s = state();
		s.simulation.run(300);
		let (x, y) = s.simulation.position("me").unwrap();
		let (sx, sy) = (s.transform.x + x, s.transform.y + y);
		s.pointer_down(sx, sy);
		s.pointer_move(sx + 2.0, sy);
		assert_eq!(s.controller.dragged(), None);
		s.pointer_move(sx + 10.0, sy);
		assert_eq!(s.controller.dragged(), Some("me"));
		let (px, py) = s.simulation.pinned("me").unwrap();
		assert!(approx_eq!(f64, px, x + 10.0, epsilon = 1e-9));
		assert!(approx_eq!(f64, py, y, epsilon = 1e-9));
		assert!(s.simulation.is_dragging());
	}

	#[test]
	fn drag_moves_without_selecting() {
		let mut s = state();
		s.pointer_down(500.0, 300.0);
		s.pointer_move(540.0, 320.0);
		s.tick();
		assert_eq!(s.simulation.position("me"), Some((140.0, 20.0)));
		assert_eq!(s.frame().dragged.as_deref(), Some("me"));
		s.pointer_up(540.0, 320.0);
		assert_eq!(s.controller.selected(), None);
		assert_eq!(s.simulation.pinned("me"), None);
	}

	#[test]
	fn grab_offset_keeps_node_under_pointer() {
		let mut s = state();
		s.pointer_down(510.0, 305.0);
		s.pointer_move(520.0, 305.0);
		s.tick();
		let (x, y) = s.simulation.position("me").unwrap();
		assert!(approx_eq!(f64, x, 110.0, epsilon = 1e-9));
		assert!(approx_eq!(f64, y, 0.0, epsilon = 1e-9));
	}

	#[test]
	fn background_click_clears_selection() {
		let mut s = state();
		s.pointer_down(500.0, 300.0);
		s.pointer_up(500.0, 300.0);
		assert!(s.selection().is_some());
		s.pointer_down(20.0, 20.0);
		s.pointer_up(21.0, 21.0);
		assert_eq!(s.selection(), None);
		assert!(!s.has_highlight());
	}

	#[test]
	fn background_drag_pans_and_keeps_selection() {
		let mut s = state();
		s.pointer_down(500.0, 300.0);
		s.pointer_up(500.0, 300.0);
		s.pointer_down(20.0, 20.0);
		s.pointer_move(70.0, 40.0);
		s.pointer_up(70.0, 40.0);
		assert_eq!(s.transform, ViewTransform { x: 450.0, y: 320.0, k: 1.0 });
		assert_eq!(s.controller.selected(), Some("me"));
	}

	#[test]
	fn zoom_keeps_pointer_anchor_and_clamps() {
		let mut s = state();
		let anchor = s.screen_to_graph(300.0, 200.0);
		s.zoom(300.0, 200.0, -1.0);
		assert!(approx_eq!(f64, s.transform.k, 1.1, epsilon = 1e-12));
		let after = s.screen_to_graph(300.0, 200.0);
		assert!(approx_eq!(f64, anchor.0, after.0, epsilon = 1e-9));
		assert!(approx_eq!(f64, anchor.1, after.1, epsilon = 1e-9));
		for _ in 0..100 {
			s.zoom(300.0, 200.0, 1.0);
		}
		assert_eq!(s.transform.k, 0.1);
	}

	#[test]
	fn leaving_the_canvas_releases_the_drag() {
		let mut s = state();
		s.pointer_down(500.0, 300.0);
		s.pointer_move(520.0, 300.0);
		assert_eq!(s.controller.dragged(), Some("me"));
		s.pointer_leave();
		assert_eq!(s.controller.dragged(), None);
		assert_eq!(s.simulation.pinned("me"), None);
		assert_eq!(s.controller.selected(), None);
	}

	#[test]
	fn selection_exposes_tooltip_details() {
		let mut s = InsightGraphState::new(with_entry(), SimulationConfig::default(), 800.0, 600.0);
		s.controller.select(&s.simulation, Some("entry-7"));
		assert_eq!(
			s.selection(),
			Some(Selection {
				label: "Protect sleep".into(),
				full_text: Some("Protect sleep".into()),
				date: None,
			})
		);
	}

	#[test]
	fn rebuild_keeps_surviving_selection() {
		let mut s = state();
		s.controller.select(&s.simulation, Some("mode-pattern"));
		s.simulation.run(100);
		s.rebuild(with_entry());
		assert_eq!(s.controller.selected(), Some("mode-pattern"));
		assert_eq!(s.simulation.tick_count(), 0);
		assert_eq!(s.frame().nodes.len(), 7);

		s.controller.select(&s.simulation, Some("entry-7"));
		s.rebuild(build(&[], &[], &[]));
		assert_eq!(s.controller.selected(), None);
	}

	#[test]
	fn frame_joins_attributes_and_positions() {
		let mut s = InsightGraphState::new(with_entry(), SimulationConfig::default(), 800.0, 600.0);
		s.tick();
		let frame = s.frame();
		assert_eq!(frame.nodes.len(), s.graph.nodes().len());
		assert_eq!(frame.links.len(), s.graph.links().len());
		let entry = frame.nodes.iter().find(|n| n.key == "entry-7").unwrap();
		assert_eq!((entry.x, entry.y), s.simulation.position("entry-7").unwrap());
		assert_eq!(entry.radius, 8.0);
		assert_eq!(frame.links[4].source_key, "mode-action");
		assert_eq!(frame.links[4].target_key, "entry-7");
	}

	#[test]
	fn disposed_state_is_inert() {
		let mut s = state();
		s.dispose();
		assert!(!s.tick());
		s.pointer_down(500.0, 300.0);
		s.pointer_up(500.0, 300.0);
		assert_eq!(s.frame(), Frame::default());
	}
}
