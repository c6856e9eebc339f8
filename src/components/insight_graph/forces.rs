//! Force kernels over the body list. Repulsion, attraction and centering add
//! into a per-body force buffer; collision corrects positions in place.
//! Callers pre-scale strengths by the cooling factor.

use super::simulation::{Body, Spring};

const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;
const EPSILON: f64 = 1e-9;

/// Unit vector from body `a` to body `b` and their distance. Coincident
/// bodies get a fixed direction derived from the pair so they still separate.
pub(crate) fn direction(bodies: &[Body], a: usize, b: usize) -> (f64, f64, f64) {
	let (dx, dy) = (bodies[b].x - bodies[a].x, bodies[b].y - bodies[a].y);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < EPSILON {
		let angle = (a * 31 + b * 17 + 1) as f64 * GOLDEN_ANGLE;
		return (angle.cos(), angle.sin(), 0.0);
	}
	(dx / dist, dy / dist, dist)
}

/// n-body charge over every unordered pair: `charge / d²` along the line
/// between centers, `d` floored at `min_distance`.
pub(crate) fn repulsion(bodies: &[Body], charge: f64, min_distance: f64, forces: &mut [(f64, f64)]) {
	for a in 0..bodies.len() {
		for b in a + 1..bodies.len() {
			let (ux, uy, dist) = direction(bodies, a, b);
			let d = dist.max(min_distance);
			let f = charge / (d * d);
			forces[a].0 += ux * f;
			forces[a].1 += uy * f;
			forces[b].0 -= ux * f;
			forces[b].1 -= uy * f;
		}
	}
}

/// Hooke springs along links, `stiffness * weight * (d - rest)`. Links with a
/// non-positive or non-finite weight, and self links, pull nothing.
pub(crate) fn attraction(
	bodies: &[Body],
	springs: &[Spring],
	stiffness: f64,
	rest: f64,
	min_distance: f64,
	forces: &mut [(f64, f64)],
) {
	for spring in springs {
		let (s, t) = (spring.source, spring.target);
		if s == t || !spring.weight.is_finite() || spring.weight <= 0.0 {
			continue;
		}
		let (ux, uy, dist) = direction(bodies, s, t);
		let f = stiffness * spring.weight * (dist.max(min_distance) - rest);
		forces[s].0 += ux * f;
		forces[s].1 += uy * f;
		forces[t].0 -= ux * f;
		forces[t].1 -= uy * f;
	}
}

/// Linear pull of every body toward `center`.
pub(crate) fn centering(bodies: &[Body], center: (f64, f64), strength: f64, forces: &mut [(f64, f64)]) {
	for (body, force) in bodies.iter().zip(forces.iter_mut()) {
		force.0 += (center.0 - body.x) * strength;
		force.1 += (center.1 - body.y) * strength;
	}
}

/// Push overlapping pairs apart until their rims are `margin` apart. The
/// overlap is split by inverse mass, so pinned bodies never move and large
/// ones move less. Stops early once a pass finds nothing to fix.
pub(crate) fn collide(bodies: &mut [Body], margin: f64, iterations: usize) {
	for _ in 0..iterations {
		let mut moved = false;
		for a in 0..bodies.len() {
			for b in a + 1..bodies.len() {
				let (wa, wb) = (bodies[a].inverse_mass(), bodies[b].inverse_mass());
				if wa + wb <= 0.0 {
					continue;
				}
				let reach = bodies[a].radius + bodies[b].radius + margin;
				let (ux, uy, dist) = direction(bodies, a, b);
				if dist >= reach {
					continue;
				}
				let (overlap, total) = (reach - dist, wa + wb);
				let (sa, sb) = (overlap * wa / total, overlap * wb / total);
				bodies[a].x -= ux * sa;
				bodies[a].y -= uy * sa;
				bodies[b].x += ux * sb;
				bodies[b].y += uy * sb;
				moved = true;
			}
		}
		if !moved {
			break;
		}
	}
}
