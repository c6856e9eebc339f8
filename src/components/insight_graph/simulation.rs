//! The layout engine: a fixed-step force simulation over one graph.
//!
//! Kinetic state lives here, indexed like the graph's node list, so links
//! are plain index pairs. The cooling factor scales every force and decays
//! geometrically; once it drops below the stop threshold the layout is
//! settled and ticks become no-ops until something reheats it.

use std::collections::HashMap;
use std::f64::consts::PI;

use log::debug;

use super::config::SimulationConfig;
use super::forces;
use super::types::Graph;

/// Lifecycle of a simulation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
	/// Seeded, not ticked yet.
	Initializing,
	/// Advancing one frame per tick.
	Ticking,
	/// Cooled below the stop threshold; ticks are skipped.
	Settled,
	/// Torn down; every call is a no-op.
	Disposed,
}

/// Kinetic state of one node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Body {
	/// Position, horizontal.
	pub x: f64,
	/// Position, vertical.
	pub y: f64,
	/// Velocity, horizontal, in units per time step.
	pub vx: f64,
	/// Velocity, vertical.
	pub vy: f64,
	/// Collision extent.
	pub radius: f64,
	pub(crate) pin: Option<(f64, f64)>,
}

impl Body {
	/// Externally held position, if the node is pinned.
	pub fn pin(&self) -> Option<(f64, f64)> {
		self.pin
	}

	pub(crate) fn inverse_mass(&self) -> f64 {
		if self.pin.is_some() {
			0.0
		} else {
			1.0 / self.radius.max(1.0).powi(2)
		}
	}
}

/// A link resolved to body indices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Spring {
	pub(crate) source: usize,
	pub(crate) target: usize,
	pub(crate) weight: f64,
}

/// Force simulation over one graph.
pub struct Simulation {
	config: SimulationConfig,
	bodies: Vec<Body>,
	springs: Vec<Spring>,
	index: HashMap<String, usize>,
	forces: Vec<(f64, f64)>,
	cooling: f64,
	dragging: bool,
	ticks: u64,
	phase: Phase,
}

impl Simulation {
	/// Seed every node of `graph` on a ring around the configured center with
	/// zero velocity. Links naming unknown keys are dropped.
	pub fn new(graph: &Graph, config: SimulationConfig) -> Self {
		let nodes = graph.nodes();
		let count = nodes.len().max(1) as f64;
		let (cx, cy) = config.center;

		let bodies: Vec<Body> = nodes
			.iter()
			.enumerate()
			.map(|(i, node)| {
				let angle = i as f64 * 2.0 * PI / count;
				Body {
					x: cx + config.seed_radius * angle.cos(),
					y: cy + config.seed_radius * angle.sin(),
					radius: if node.radius.is_finite() && node.radius > 0.0 {
						node.radius
					} else {
						1.0
					},
					..Body::default()
				}
			})
			.collect();

		let springs = graph
			.links()
			.iter()
			.filter_map(|link| {
				Some(Spring {
					source: graph.index_of(&link.source)?,
					target: graph.index_of(&link.target)?,
					weight: link.strength,
				})
			})
			.collect();

		let index = nodes
			.iter()
			.enumerate()
			.map(|(i, node)| (node.key.clone(), i))
			.collect();

		Self {
			forces: vec![(0.0, 0.0); bodies.len()],
			bodies,
			springs,
			index,
			cooling: config.cooling_start,
			dragging: false,
			ticks: 0,
			phase: Phase::Initializing,
			config,
		}
	}

	/// Advance one frame. Returns `false` without touching anything when
	/// settled or disposed.
	pub fn tick(&mut self) -> bool {
		match self.phase {
			Phase::Settled | Phase::Disposed => return false,
			Phase::Initializing => self.phase = Phase::Ticking,
			Phase::Ticking => {}
		}

		let config = &self.config;
		let target = if self.dragging { config.drag_cooling } else { 0.0 };
		self.cooling += (target - self.cooling) * (1.0 - config.cooling_decay);
		let cooling = self.cooling;

		self.forces.fill((0.0, 0.0));
		forces::repulsion(
			&self.bodies,
			config.charge * cooling,
			config.min_distance,
			&mut self.forces,
		);
		forces::attraction(
			&self.bodies,
			&self.springs,
			config.link_stiffness * cooling,
			config.link_distance,
			config.min_distance,
			&mut self.forces,
		);
		forces::centering(
			&self.bodies,
			config.center,
			config.center_strength * cooling,
			&mut self.forces,
		);
		integrate(&mut self.bodies, &self.forces, config);
		forces::collide(
			&mut self.bodies,
			config.collision_margin,
			config.collision_iterations,
		);

		self.ticks += 1;
		if !self.dragging && self.cooling < config.cooling_stop {
			self.phase = Phase::Settled;
			debug!("layout settled after {} ticks", self.ticks);
		}
		true
	}

	/// Tick until settled or `max_ticks` frames have run. Returns the number
	/// of frames advanced.
	pub fn run(&mut self, max_ticks: usize) -> usize {
		let mut advanced = 0;
		while advanced < max_ticks && self.tick() {
			advanced += 1;
		}
		advanced
	}

	/// Raise the cooling factor back to its start value and resume ticking.
	pub fn reheat(&mut self) {
		if self.phase == Phase::Disposed {
			return;
		}
		self.cooling = self.config.cooling_start;
		self.resume();
	}

	/// While dragging, cooling relaxes toward `drag_cooling` instead of zero
	/// and the layout never settles.
	pub(crate) fn set_dragging(&mut self, dragging: bool) {
		if self.phase == Phase::Disposed {
			return;
		}
		self.dragging = dragging;
		if dragging {
			self.resume();
		}
	}

	/// Hold `key` at `(x, y)` from the next tick on. Non-finite targets are
	/// ignored.
	pub(crate) fn pin(&mut self, key: &str, x: f64, y: f64) -> bool {
		if !x.is_finite() || !y.is_finite() {
			return false;
		}
		let Some(&i) = self.index.get(key) else {
			return false;
		};
		self.bodies[i].pin = Some((x, y));
		self.resume();
		true
	}

	/// Release `key`. It restarts from rest rather than from any velocity it
	/// had before the pin.
	pub(crate) fn unpin(&mut self, key: &str) -> bool {
		let Some(&i) = self.index.get(key) else {
			return false;
		};
		let body = &mut self.bodies[i];
		body.pin = None;
		body.vx = 0.0;
		body.vy = 0.0;
		self.resume();
		true
	}

	fn resume(&mut self) {
		if self.phase == Phase::Settled {
			self.phase = Phase::Ticking;
		}
	}

	/// Drop all per-node state. Later calls are no-ops.
	pub fn dispose(&mut self) {
		self.bodies.clear();
		self.springs.clear();
		self.index.clear();
		self.forces.clear();
		self.dragging = false;
		self.phase = Phase::Disposed;
	}

	/// Current lifecycle phase.
	pub fn phase(&self) -> Phase {
		self.phase
	}

	/// Whether the layout has cooled down.
	pub fn is_settled(&self) -> bool {
		self.phase == Phase::Settled
	}

	/// Whether [`Simulation::dispose`] ran.
	pub fn is_disposed(&self) -> bool {
		self.phase == Phase::Disposed
	}

	/// Whether a drag holds the cooling factor up.
	pub fn is_dragging(&self) -> bool {
		self.dragging
	}

	/// Current cooling factor.
	pub fn cooling(&self) -> f64 {
		self.cooling
	}

	/// Frames advanced so far.
	pub fn tick_count(&self) -> u64 {
		self.ticks
	}

	/// Settings this run was seeded with.
	pub fn config(&self) -> &SimulationConfig {
		&self.config
	}

	/// Bodies in graph node order.
	pub fn bodies(&self) -> &[Body] {
		&self.bodies
	}

	/// Position of `key` in [`Simulation::bodies`].
	pub fn index_of(&self, key: &str) -> Option<usize> {
		self.index.get(key).copied()
	}

	/// Whether `key` has a body. False for everything once disposed.
	pub fn contains(&self, key: &str) -> bool {
		self.index.contains_key(key)
	}

	/// Last integrated position of `key`.
	pub fn position(&self, key: &str) -> Option<(f64, f64)> {
		self.index_of(key).map(|i| (self.bodies[i].x, self.bodies[i].y))
	}

	/// Pin target of `key`, if it is held.
	pub fn pinned(&self, key: &str) -> Option<(f64, f64)> {
		self.index_of(key).and_then(|i| self.bodies[i].pin)
	}
}

/// Semi-implicit Euler step with friction and a speed clamp. Pinned bodies
/// snap to their pin and stay at rest.
fn integrate(bodies: &mut [Body], forces: &[(f64, f64)], config: &SimulationConfig) {
	let (dt, friction, max_speed) = (config.time_step, config.friction, config.max_speed);
	for (body, &(fx, fy)) in bodies.iter_mut().zip(forces) {
		if let Some((px, py)) = body.pin {
			(body.x, body.y, body.vx, body.vy) = (px, py, 0.0, 0.0);
			continue;
		}
		let (mut vx, mut vy) = ((body.vx + fx * dt) * friction, (body.vy + fy * dt) * friction);
		let speed = (vx * vx + vy * vy).sqrt();
		if !speed.is_finite() {
			(vx, vy) = (0.0, 0.0);
		} else if speed > max_speed {
			let scale = max_speed / speed;
			(vx, vy) = (vx * scale, vy * scale);
		}
		(body.vx, body.vy) = (vx, vy);
		body.x += vx * dt;
		body.y += vy * dt;
	}
}

#[cfg(test)]
mod tests {
	use float_cmp::approx_eq;

	use super::*;
	use crate::components::insight_graph::builder::build;
	use crate::components::insight_graph::types::{Entry, Model, Node, NodeGroup, RecordId};

	const TOLERANCE: f64 = 0.5;

	fn journal() -> Graph {
		let texts = [
			("observe", "Slept badly, low energy all morning", Some("Feedback Loops")),
			("pattern", "Anxiety before every decision meeting", Some("Inversion")),
			("question", "What if focus is a habit not a trait?", None),
			("action", "Block time for deep work", Some("Leverage")),
			("observe", "Fear of missing the goal again", Some("Inversion")),
			("pattern", "Sleep debt compounds", Some("Compounding")),
			("question", "Is the anxiety about time or about status?", None),
			("action", "Ten minute walk after lunch for energy", Some("Leverage")),
		];
		let entries: Vec<Entry> = texts
			.iter()
			.cycle()
			.take(24)
			.enumerate()
			.map(|(i, (mode, text, model))| Entry {
				id: RecordId::Number(i as i64),
				mode: Some((*mode).to_owned()),
				text: Some((*text).to_owned()),
				model: model.map(str::to_owned),
				ts: None,
			})
			.collect();
		let models = vec![Model {
			name: "Inversion".into(),
			..Model::default()
		}];
		build(&entries, &models, &[])
	}

	fn pair(weight_a: f64, weight_b: f64) -> Graph {
		let mut graph = Graph::default();
		for key in ["a", "b", "c", "d"] {
			graph.insert_node(Node::new(key, NodeGroup::Entry, 8.0, key));
		}
		graph.link("a", "b", weight_a);
		graph.link("c", "d", weight_b);
		graph
	}

	fn gap(sim: &Simulation, a: &str, b: &str) -> f64 {
		let ((ax, ay), (bx, by)) = (sim.position(a).unwrap(), sim.position(b).unwrap());
		((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
	}

	fn worst_overlap(sim: &Simulation) -> f64 {
		let bodies = sim.bodies();
		let mut worst = f64::MIN;
		for (i, a) in bodies.iter().enumerate() {
			for b in &bodies[i + 1..] {
				let d = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
				worst = worst.max(a.radius + b.radius - d);
			}
		}
		worst
	}

	#[test]
	fn seeds_on_a_ring_at_rest() {
		let sim = Simulation::new(&build(&[], &[], &[]), SimulationConfig::default());
		assert_eq!(sim.phase(), Phase::Initializing);
		assert_eq!(sim.bodies().len(), 5);
		for body in sim.bodies() {
			let r = (body.x.powi(2) + body.y.powi(2)).sqrt();
			assert!(approx_eq!(f64, r, 100.0, epsilon = 1e-9));
			assert_eq!((body.vx, body.vy), (0.0, 0.0));
		}
		assert_eq!(sim.bodies()[0].radius, 30.0);
	}

	#[test]
	fn cooling_decays_geometrically() {
		let mut sim = Simulation::new(&journal(), SimulationConfig::default());
		assert!(sim.tick());
		assert_eq!(sim.phase(), Phase::Ticking);
		assert!(approx_eq!(f64, sim.cooling(), 0.99, epsilon = 1e-12));
		sim.tick();
		assert!(approx_eq!(f64, sim.cooling(), 0.99 * 0.99, epsilon = 1e-12));
	}

	#[test]
	fn cooling_never_rises_without_a_drag() {
		let mut sim = Simulation::new(&journal(), SimulationConfig::default());
		let mut previous = sim.cooling();
		while sim.tick() {
			assert!(sim.cooling() <= previous);
			previous = sim.cooling();
		}
	}

	#[test]
	fn settles_and_stops_ticking() {
		let mut sim = Simulation::new(&journal(), SimulationConfig::default());
		let ticks = sim.run(5_000);
		assert!(ticks < 5_000, "never settled");
		assert!(sim.is_settled());
		assert!(sim.cooling() < sim.config().cooling_stop);
		let before = sim.bodies().to_vec();
		assert!(!sim.tick());
		assert_eq!(sim.tick_count(), ticks as u64);
		assert_eq!(sim.bodies(), &before[..]);
	}

	#[test]
	fn settled_layout_has_no_overlap() {
		let mut sim = Simulation::new(&journal(), SimulationConfig::default());
		sim.run(5_000);
		assert!(worst_overlap(&sim) <= TOLERANCE, "overlap {}", worst_overlap(&sim));
		assert!(sim.bodies().iter().all(|b| b.x.is_finite() && b.y.is_finite()));
	}

	#[test]
	fn identical_input_gives_identical_layout() {
		let (mut a, mut b) = (
			Simulation::new(&journal(), SimulationConfig::default()),
			Simulation::new(&journal(), SimulationConfig::default()),
		);
		a.run(300);
		b.run(300);
		assert_eq!(a.bodies(), b.bodies());
	}

	#[test]
	fn heavier_links_settle_shorter() {
		let mut sim = Simulation::new(&pair(1.0, 3.0), SimulationConfig::default());
		sim.run(5_000);
		assert!(gap(&sim, "c", "d") < gap(&sim, "a", "b"));
	}

	#[test]
	fn pinned_body_holds_its_pin_every_tick() {
		let mut sim = Simulation::new(&journal(), SimulationConfig::default());
		sim.run(50);
		assert!(sim.pin("me", 250.0, -40.0));
		sim.set_dragging(true);
		sim.reheat();
		for _ in 0..200 {
			sim.tick();
			assert_eq!(sim.position("me"), Some((250.0, -40.0)));
		}
	}

	#[test]
	fn unpinned_body_restarts_from_rest() {
		let mut sim = Simulation::new(&journal(), SimulationConfig::default());
		sim.run(20);
		sim.pin("entry-3", 0.0, 0.0);
		sim.tick();
		assert!(sim.unpin("entry-3"));
		let body = &sim.bodies()[sim.index_of("entry-3").unwrap()];
		assert_eq!((body.vx, body.vy), (0.0, 0.0));
		assert_eq!(sim.pinned("entry-3"), None);
	}

	#[test]
	fn pinned_body_still_pushes_neighbours() {
		let mut graph = Graph::default();
		graph.insert_node(Node::new("a", NodeGroup::Keyword, 10.0, "a"));
		graph.insert_node(Node::new("b", NodeGroup::Keyword, 10.0, "b"));
		let config = SimulationConfig {
			center_strength: 0.0,
			..SimulationConfig::default()
		};
		let mut sim = Simulation::new(&graph, config);
		let (bx, by) = sim.position("b").unwrap();
		sim.pin("a", bx + 30.0, by);
		sim.tick();
		let before = sim.position("b").unwrap();
		sim.tick();
		let after = sim.position("b").unwrap();
		assert_eq!(sim.position("a"), Some((bx + 30.0, by)));
		assert!(after.0 < before.0 - 1.0, "b should be pushed away from the pin");
	}

	#[test]
	fn coincident_nodes_separate() {
		let mut graph = Graph::default();
		for key in ["a", "b", "c"] {
			graph.insert_node(Node::new(key, NodeGroup::Entry, 8.0, key));
		}
		let mut sim = Simulation::new(&graph, SimulationConfig::default());
		for key in ["a", "b", "c"] {
			sim.pin(key, 5.0, 5.0);
		}
		sim.tick();
		for key in ["a", "b", "c"] {
			sim.unpin(key);
		}
		sim.reheat();
		sim.run(5_000);
		assert!(worst_overlap(&sim) <= TOLERANCE);
	}

	#[test]
	fn pin_wakes_a_settled_layout() {
		let mut sim = Simulation::new(&journal(), SimulationConfig::default());
		sim.run(5_000);
		assert!(sim.is_settled());
		assert!(sim.pin("mode-action", 10.0, 10.0));
		assert_eq!(sim.phase(), Phase::Ticking);
		assert!(sim.tick());
		assert_eq!(sim.position("mode-action"), Some((10.0, 10.0)));
	}

	#[test]
	fn dragging_keeps_the_layout_warm() {
		let mut sim = Simulation::new(&journal(), SimulationConfig::default());
		sim.set_dragging(true);
		sim.run(2_000);
		assert!(!sim.is_settled());
		assert!(sim.cooling() >= sim.config().drag_cooling);
		sim.set_dragging(false);
		sim.run(5_000);
		assert!(sim.is_settled());
	}

	#[test]
	fn unknown_keys_and_bad_pins_are_ignored() {
		let mut sim = Simulation::new(&journal(), SimulationConfig::default());
		assert!(!sim.pin("nope", 1.0, 1.0));
		assert!(!sim.pin("me", f64::NAN, 1.0));
		assert!(!sim.unpin("nope"));
		assert_eq!(sim.pinned("me"), None);
	}

	#[test]
	fn links_to_missing_nodes_are_dropped() {
		let mut graph = pair(1.0, 1.0);
		graph.link("a", "ghost", 2.0);
		let sim = Simulation::new(&graph, SimulationConfig::default());
		assert_eq!(sim.springs.len(), 2);
	}

	#[test]
	fn disposed_simulation_is_inert() {
		let mut sim = Simulation::new(&journal(), SimulationConfig::default());
		sim.tick();
		sim.dispose();
		assert_eq!(sim.phase(), Phase::Disposed);
		assert!(!sim.tick());
		assert!(!sim.pin("me", 0.0, 0.0));
		sim.reheat();
		assert_eq!(sim.phase(), Phase::Disposed);
		assert!(sim.bodies().is_empty());
		assert_eq!(sim.position("me"), None);
	}

	#[test]
	fn empty_graph_ticks_harmlessly() {
		let mut sim = Simulation::new(&Graph::default(), SimulationConfig::default());
		assert!(sim.tick());
		assert!(sim.bodies().is_empty());
	}
}
