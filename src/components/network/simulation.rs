//! One tick of particle physics.
//!
//! Pure numeric state advance: the same particles, pointer, clock and delta
//! always produce the same result. Forces and velocities are in px per 60 Hz
//! frame, so a delta of one frame (≈16.7 ms) integrates them once.

use std::f64::consts::TAU;

use super::config::NetworkConfig;
use super::particles::Particle;
use super::types::PointerState;
use super::viewport::Viewport;

/// Length of the reference frame the per-frame constants are tuned for.
pub const FRAME_MS: f64 = 1000.0 / 60.0;

/// Pointer influence on one particle for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerForce {
	/// Horizontal component added to velocity per frame.
	pub fx: f64,
	/// Vertical component added to velocity per frame.
	pub fy: f64,
	/// Force magnitude before direction is applied.
	pub magnitude: f64,
	/// `1 - distance / interaction_radius`, in `(0, 1]`.
	pub falloff: f64,
}

/// Attraction (hovering) or repulsion (engaged) towards/away from the pointer.
///
/// `None` when the pointer is inactive or at or beyond the interaction radius.
/// A particle sitting exactly under the pointer is pushed along its phase
/// angle so repulsion still separates it.
pub fn pointer_force(
	particle: &Particle,
	pointer: &PointerState,
	config: &NetworkConfig,
) -> Option<PointerForce> {
	if !pointer.active {
		return None;
	}
	let (dx, dy) = (pointer.x - particle.x, pointer.y - particle.y);
	let dist = (dx * dx + dy * dy).sqrt();
	let radius = config.interaction_radius.max(1.0);
	if dist >= radius {
		return None;
	}

	let falloff = 1.0 - dist / radius;
	let (ux, uy) = if dist > 1e-9 {
		(dx / dist, dy / dist)
	} else {
		(particle.phase.cos(), particle.phase.sin())
	};
	let (magnitude, sign) = if pointer.engaged {
		(config.repel_strength * falloff, -1.0)
	} else {
		(config.attract_strength * falloff, 1.0)
	};

	Some(PointerForce {
		fx: ux * magnitude * sign,
		fy: uy * magnitude * sign,
		magnitude,
		falloff,
	})
}

/// Advance every particle by `dt_ms`, clamped to `config.max_frame_ms`.
///
/// `clock_ms` is the simulation time at the start of the tick and drives the
/// wander term.
pub fn step(
	particles: &mut [Particle],
	pointer: &PointerState,
	viewport: &Viewport,
	config: &NetworkConfig,
	clock_ms: f64,
	dt_ms: f64,
) {
	let dt = dt_ms.clamp(0.0, config.max_frame_ms) / FRAME_MS;
	let damping = config.damping.powf(dt);
	let grow = 1.0 - (1.0 - config.growth_rate).powf(dt);
	let relax = 1.0 - (1.0 - config.relax_rate).powf(dt);
	let radius_cap = config.radius_max * config.growth_ceiling;
	let (w, h) = (viewport.width, viewport.height);

	for (i, p) in particles.iter_mut().enumerate() {
		let fi = i as f64;

		// wander
		p.vx += (clock_ms * 0.00028 + fi).cos() * config.wander_strength * dt;
		p.vy += (clock_ms * 0.00026 - fi).sin() * config.wander_strength * dt;

		match pointer_force(p, pointer, config) {
			Some(force) => {
				p.vx += force.fx * dt;
				p.vy += force.fy * dt;
				let target =
					(p.origin_radius * (1.0 + force.falloff * config.growth_factor)).min(radius_cap);
				p.base_radius += (target - p.base_radius) * grow;
			}
			None => p.base_radius += (p.origin_radius - p.base_radius) * relax,
		}

		p.vx *= damping;
		p.vy *= damping;

		let speed = (p.vx * p.vx + p.vy * p.vy).sqrt();
		if speed > config.max_velocity {
			let s = config.max_velocity / speed;
			p.vx *= s;
			p.vy *= s;
		}

		p.x += p.vx * dt;
		p.y += p.vy * dt;

		if p.x < 0.0 {
			p.x = 0.0;
			p.vx = -p.vx * config.bounce;
		} else if p.x > w {
			p.x = w;
			p.vx = -p.vx * config.bounce;
		}
		if p.y < 0.0 {
			p.y = 0.0;
			p.vy = -p.vy * config.bounce;
		} else if p.y > h {
			p.y = h;
			p.vy = -p.vy * config.bounce;
		}

		p.phase = (p.phase + config.breath_speed * dt) % TAU;
		p.radius = (p.base_radius * (1.0 + config.breath_amplitude * p.phase.sin()))
			.clamp(config.radius_min, radius_cap);
	}
}
