use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tuning knobs of the layout engine. Every field has a default, so a JSON
/// override only needs the fields it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
	/// Pairwise charge; force is `charge * cooling / d²`, negative repels.
	pub charge: f64,
	/// Spring rest length.
	pub link_distance: f64,
	/// Spring constant per unit of link weight.
	pub link_stiffness: f64,
	/// Point every node is weakly pulled toward.
	pub center: (f64, f64),
	/// Pull toward `center` per unit of distance.
	pub center_strength: f64,
	/// Extra gap kept between node rims.
	pub collision_margin: f64,
	/// Relaxation passes over overlapping pairs per tick.
	pub collision_iterations: usize,
	/// Distance floor for coincident or near-coincident points.
	pub min_distance: f64,
	/// Integrator step.
	pub time_step: f64,
	/// Velocity multiplier per tick, in (0, 1).
	pub friction: f64,
	/// Initial cooling factor, also the value a drag reheats to.
	pub cooling_start: f64,
	/// Geometric decay of the cooling factor per tick, in (0, 1).
	pub cooling_decay: f64,
	/// Below this (and with no drag active) the layout is settled.
	pub cooling_stop: f64,
	/// Level the cooling factor relaxes toward while a node is dragged.
	pub drag_cooling: f64,
	/// Per-tick speed clamp.
	pub max_speed: f64,
	/// Radius of the ring nodes are seeded on.
	pub seed_radius: f64,
}

impl Default for SimulationConfig {
	fn default() -> Self {
		Self {
			charge: -3000.0,
			link_distance: 50.0,
			link_stiffness: 0.05,
			center: (0.0, 0.0),
			center_strength: 0.02,
			collision_margin: 5.0,
			collision_iterations: 3,
			min_distance: 1.0,
			time_step: 1.0,
			friction: 0.6,
			cooling_start: 1.0,
			cooling_decay: 0.99,
			cooling_stop: 0.001,
			drag_cooling: 0.3,
			max_speed: 50.0,
			seed_radius: 100.0,
		}
	}
}

impl SimulationConfig {
	/// Parse and validate a JSON override document.
	pub fn from_json(json: &str) -> Result<Self> {
		let config: Self = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	/// Reject values the integrator cannot work with.
	pub fn validate(&self) -> Result<()> {
		let scalars = [
			("charge", self.charge),
			("link_distance", self.link_distance),
			("link_stiffness", self.link_stiffness),
			("center.x", self.center.0),
			("center.y", self.center.1),
			("center_strength", self.center_strength),
			("collision_margin", self.collision_margin),
			("min_distance", self.min_distance),
			("time_step", self.time_step),
			("friction", self.friction),
			("cooling_start", self.cooling_start),
			("cooling_decay", self.cooling_decay),
			("cooling_stop", self.cooling_stop),
			("drag_cooling", self.drag_cooling),
			("max_speed", self.max_speed),
			("seed_radius", self.seed_radius),
		];
		if let Some((name, _)) = scalars.iter().find(|(_, v)| !v.is_finite()) {
			return Err(invalid(format!("{name} must be finite")));
		}
		for (name, value) in [("friction", self.friction), ("cooling_decay", self.cooling_decay)] {
			if value <= 0.0 || value >= 1.0 {
				return Err(invalid(format!("{name} must lie in (0, 1), got {value}")));
			}
		}
		for (name, value) in [
			("min_distance", self.min_distance),
			("time_step", self.time_step),
			("max_speed", self.max_speed),
			("seed_radius", self.seed_radius),
		] {
			if value <= 0.0 {
				return Err(invalid(format!("{name} must be positive, got {value}")));
			}
		}
		if self.cooling_stop <= 0.0 || self.cooling_stop >= self.cooling_start {
			return Err(invalid(format!(
				"cooling_stop must lie in (0, cooling_start), got {}",
				self.cooling_stop
			)));
		}
		Ok(())
	}
}

fn invalid(message: String) -> Error {
	Error::InvalidConfig(message)
}
