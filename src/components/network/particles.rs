//! The particle store: generation of the simulated node set.
//!
//! Particles are laid out in a few loose gaussian clusters plus a uniform
//! sprinkle, which reads as organic density instead of a flat random field.
//! The whole set is rebuilt on every resize or restart; nothing is added or
//! removed mid-run.

use std::f64::consts::TAU;

use super::config::NetworkConfig;
use super::viewport::Viewport;

/// A single simulated node.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
	/// Horizontal position in canvas-local pixels.
	pub x: f64,
	/// Vertical position.
	pub y: f64,
	/// Horizontal velocity in px per 60 Hz frame.
	pub vx: f64,
	/// Vertical velocity.
	pub vy: f64,
	/// Rendered radius: `base_radius` modulated by breathing.
	pub radius: f64,
	/// Radius before breathing; grows near the pointer.
	pub base_radius: f64,
	/// Radius assigned at generation, which growth relaxes back to.
	pub origin_radius: f64,
	/// Alpha multiplier in `[0, 1]`.
	pub opacity: f64,
	/// Breathing phase in radians.
	pub phase: f64,
}

/// Opacity factors are drawn from `[OPACITY_MIN, 1]`.
const OPACITY_MIN: f64 = 0.55;
/// Cluster centers stay inside this central fraction of each axis.
const CLUSTER_REGION: f64 = 0.75;

/// Number of particles for a viewport: desktop tier at or above the breakpoint.
pub fn node_count(viewport: &Viewport, config: &NetworkConfig) -> usize {
	if viewport.width >= config.breakpoint {
		config.nodes_desktop
	} else {
		config.nodes_mobile
	}
}

/// Owns the particle set and the generator that seeds it.
pub struct ParticleStore {
	/// Current particle set, in generation order.
	pub particles: Vec<Particle>,
	rng: fastrand::Rng,
}

impl ParticleStore {
	/// Empty store whose layouts are reproducible for a given `seed`.
	pub fn new(seed: u64) -> Self {
		Self {
			particles: Vec::new(),
			rng: fastrand::Rng::with_seed(seed),
		}
	}

	/// Number of particles.
	pub fn len(&self) -> usize {
		self.particles.len()
	}

	/// Whether the store holds no particles.
	pub fn is_empty(&self) -> bool {
		self.particles.is_empty()
	}

	/// Replace the set with `count` freshly generated particles.
	pub fn regenerate(&mut self, count: usize, viewport: &Viewport, config: &NetworkConfig) {
		let (w, h) = (viewport.width, viewport.height);
		let rng = &mut self.rng;

		let clustered = ((count as f64) * config.cluster_share).round() as usize;
		let cluster_count = rng.usize(
			config.cluster_count_min..=config.cluster_count_max.max(config.cluster_count_min),
		);
		let margin = (1.0 - CLUSTER_REGION) / 2.0;
		let centers: Vec<(f64, f64)> = (0..cluster_count)
			.map(|_| {
				(
					w * (margin + rng.f64() * CLUSTER_REGION),
					h * (margin + rng.f64() * CLUSTER_REGION),
				)
			})
			.collect();
		let (spread_x, spread_y) = (w * config.cluster_spread, h * config.cluster_spread);

		self.particles.clear();
		self.particles.reserve(count);
		for i in 0..count {
			let (x, y) = if i < clustered && !centers.is_empty() {
				let (cx, cy) = centers[i % centers.len()];
				(cx + gaussian(rng) * spread_x, cy + gaussian(rng) * spread_y)
			} else {
				(rng.f64() * w, rng.f64() * h)
			};
			let radius = config.radius_min + rng.f64() * (config.radius_max - config.radius_min);

			self.particles.push(Particle {
				x: x.clamp(0.0, w),
				y: y.clamp(0.0, h),
				vx: (rng.f64() - 0.5) * config.initial_speed,
				vy: (rng.f64() - 0.5) * config.initial_speed,
				radius,
				base_radius: radius,
				origin_radius: radius,
				opacity: OPACITY_MIN + rng.f64() * (1.0 - OPACITY_MIN),
				phase: rng.f64() * TAU,
			});
		}
	}
}

/// Standard normal sample (Box-Muller).
fn gaussian(rng: &mut fastrand::Rng) -> f64 {
	let u1 = rng.f64().max(f64::MIN_POSITIVE);
	let u2 = rng.f64();
	(-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn generate(count: usize, w: f64, h: f64, seed: u64) -> ParticleStore {
		let mut store = ParticleStore::new(seed);
		store.regenerate(count, &Viewport::fit(w, h, 1.0), &NetworkConfig::default());
		store
	}

	#[test]
	fn desktop_tier_at_breakpoint_width() {
		let config = NetworkConfig::default();
		assert_eq!(node_count(&Viewport::fit(1000.0, 500.0, 1.0), &config), 42);
		assert_eq!(node_count(&Viewport::fit(900.0, 300.0, 1.0), &config), 42);
		assert_eq!(node_count(&Viewport::fit(899.0, 1200.0, 1.0), &config), 18);
	}

	#[test]
	fn particles_start_inside_bounds_with_valid_attributes() {
		let config = NetworkConfig::default();
		let store = generate(200, 640.0, 360.0, 7);
		assert_eq!(store.len(), 200);
		for p in &store.particles {
			assert!((0.0..=640.0).contains(&p.x));
			assert!((0.0..=360.0).contains(&p.y));
			assert!(p.radius >= config.radius_min && p.radius <= config.radius_max);
			assert_eq!(p.radius, p.base_radius);
			assert!((OPACITY_MIN..=1.0).contains(&p.opacity));
			assert!(p.vx.abs() <= config.initial_speed / 2.0);
			assert!((0.0..TAU).contains(&p.phase));
		}
	}

	#[test]
	fn same_seed_same_layout() {
		assert_eq!(
			generate(42, 1000.0, 500.0, 99).particles,
			generate(42, 1000.0, 500.0, 99).particles
		);
	}

	#[test]
	fn clustered_layout_is_denser_than_uniform() {
		// Mean nearest-neighbour distance of a clustered set sits well below
		// that of a uniform one over the same area.
		let nearest = |store: &ParticleStore| {
			let ps = &store.particles;
			ps.iter()
				.enumerate()
				.map(|(i, a)| {
					ps.iter()
						.enumerate()
						.filter(|(j, _)| *j != i)
						.map(|(_, b)| ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt())
						.fold(f64::INFINITY, f64::min)
				})
				.sum::<f64>()
				/ ps.len() as f64
		};

		let config = NetworkConfig::default();
		let uniform_config = NetworkConfig {
			cluster_share: 0.0,
			..config.clone()
		};
		let viewport = Viewport::fit(1200.0, 800.0, 1.0);
		let (mut clustered_total, mut uniform_total) = (0.0, 0.0);
		for seed in 0..8 {
			let mut clustered = ParticleStore::new(seed);
			clustered.regenerate(120, &viewport, &config);
			let mut uniform = ParticleStore::new(seed);
			uniform.regenerate(120, &viewport, &uniform_config);
			clustered_total += nearest(&clustered);
			uniform_total += nearest(&uniform);
		}
		assert!(clustered_total < uniform_total);
	}

	#[test]
	fn regenerate_replaces_the_set() {
		let mut store = generate(30, 500.0, 500.0, 3);
		store.regenerate(5, &Viewport::fit(500.0, 500.0, 1.0), &NetworkConfig::default());
		assert_eq!(store.len(), 5);
	}
}
