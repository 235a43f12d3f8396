//! The parameter table for one run of the network.
//!
//! A [`NetworkConfig`] is never mutated while a run is in progress; changing
//! anything means swapping the whole table and restarting. Every field has a
//! default so a page only needs to supply the values it wants to change.

use serde::Deserialize;

use super::theme::Palette;

/// Tunable parameters for density, physics and visuals.
///
/// Velocities and forces are expressed per 60 Hz frame; the simulation scales
/// them by the real elapsed time.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkConfig {
	/// Particle count when the viewport is at least `breakpoint` wide.
	pub nodes_desktop: usize,
	/// Particle count below the breakpoint.
	pub nodes_mobile: usize,
	/// Width (px) separating the two density tiers.
	pub breakpoint: f64,

	/// Maximum separation (px) at which two particles are linked.
	pub connect_distance: f64,
	/// Distance (px) within which the pointer pushes or pulls particles.
	pub interaction_radius: f64,

	/// Smallest generated radius, px.
	pub radius_min: f64,
	/// Largest generated radius, px.
	pub radius_max: f64,
	/// How much a particle's radius grows at zero pointer distance (1.6 = +160%).
	pub growth_factor: f64,
	/// Upper bound on grown radius, as a multiple of `radius_max`.
	pub growth_ceiling: f64,
	/// Fraction of the gap to the grown radius closed per frame.
	pub growth_rate: f64,
	/// Fraction of the gap back to the original radius closed per frame.
	pub relax_rate: f64,
	/// Relative amplitude of the breathing oscillation.
	pub breath_amplitude: f64,
	/// Breathing phase advance (radians) per frame.
	pub breath_speed: f64,

	/// Spread of initial velocity components around zero.
	pub initial_speed: f64,
	/// Speed cap, px per frame.
	pub max_velocity: f64,
	/// Velocity multiplier applied once per frame.
	pub damping: f64,
	/// Amplitude of the deterministic drift acceleration.
	pub wander_strength: f64,
	/// Pointer attraction while hovering.
	pub attract_strength: f64,
	/// Pointer repulsion while engaged.
	pub repel_strength: f64,
	/// Fraction of normal velocity kept when bouncing off an edge.
	pub bounce: f64,

	/// Link alpha at zero distance for fully opaque particles.
	pub link_base_alpha: f64,
	/// Links never render fainter than this.
	pub link_min_alpha: f64,
	/// Opacity multiplier for links whose midpoint sits on the pointer.
	pub hover_alpha_boost: f64,
	/// Link stroke width, px.
	pub line_width: f64,
	/// Halo radius as a multiple of the particle radius.
	pub halo_factor: f64,
	/// Smallest halo radius, px.
	pub halo_min_radius: f64,
	/// Extra halo scale at zero pointer distance.
	pub halo_hover_growth: f64,
	/// Alpha at the halo center (before hover scaling).
	pub halo_alpha: f64,
	/// Core fill alpha before the particle's opacity factor.
	pub core_alpha: f64,
	/// How far sampled core colors are lifted towards white.
	pub sample_core_lift: f64,

	/// Longest frame delta (ms) the simulation will integrate in one tick.
	pub max_frame_ms: f64,
	/// Frame-rate ceiling.
	pub target_fps: f64,

	/// Share of particles placed in clusters; the rest are uniform.
	pub cluster_share: f64,
	/// Smallest cluster count.
	pub cluster_count_min: usize,
	/// Largest cluster count.
	pub cluster_count_max: usize,
	/// Cluster standard deviation as a fraction of the viewport size.
	pub cluster_spread: f64,

	/// Tint links and particles from the hero background image.
	pub sampling: bool,
	/// Sample raster size as a fraction of the viewport.
	pub sample_scale: f64,
	/// Texels with less alpha coverage than this fall back to the palette.
	pub coverage_floor: f64,

	/// Animate even when the environment prefers reduced motion.
	pub reduced_motion_override: bool,
	/// Canvas opacity while showing the static reduced-motion frame.
	pub reduced_opacity: f64,

	/// Fallback palette name (`ice` or `ember`).
	pub palette: String,
}

impl Default for NetworkConfig {
	fn default() -> Self {
		Self {
			nodes_desktop: 42,
			nodes_mobile: 18,
			breakpoint: 900.0,
			connect_distance: 180.0,
			interaction_radius: 180.0,
			radius_min: 1.8,
			radius_max: 4.2,
			growth_factor: 1.6,
			growth_ceiling: 2.4,
			growth_rate: 0.02,
			relax_rate: 0.02,
			breath_amplitude: 0.06,
			breath_speed: 0.018,
			initial_speed: 0.3,
			max_velocity: 1.6,
			damping: 0.995,
			wander_strength: 0.0014,
			attract_strength: 0.045,
			repel_strength: 0.28,
			bounce: 0.45,
			link_base_alpha: 0.16,
			link_min_alpha: 0.035,
			hover_alpha_boost: 2.6,
			line_width: 1.2,
			halo_factor: 18.0,
			halo_min_radius: 8.0,
			halo_hover_growth: 1.4,
			halo_alpha: 0.18,
			core_alpha: 0.85,
			sample_core_lift: 0.6,
			max_frame_ms: 48.0,
			target_fps: 60.0,
			cluster_share: 0.78,
			cluster_count_min: 3,
			cluster_count_max: 5,
			cluster_spread: 0.12,
			sampling: true,
			sample_scale: 0.25,
			coverage_floor: 0.12,
			reduced_motion_override: false,
			reduced_opacity: 0.45,
			palette: "ice".to_string(),
		}
	}
}

impl NetworkConfig {
	/// Parse a (possibly partial) JSON override table.
	pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str::<Self>(text).map(Self::sanitized)
	}

	/// Repair values that would break the particle invariants.
	///
	/// Radii stay positive with `min <= max`, the growth ceiling never shrinks
	/// particles, damping and restitution stay in `[0, 1]`, and every distance
	/// and rate is usable as a divisor.
	pub fn sanitized(mut self) -> Self {
		self.radius_min = finite_or(self.radius_min, 1.8).max(0.1);
		self.radius_max = finite_or(self.radius_max, 4.2).max(self.radius_min);
		self.growth_ceiling = finite_or(self.growth_ceiling, 1.0).max(1.0);
		self.growth_factor = finite_or(self.growth_factor, 0.0).max(0.0);
		self.growth_rate = finite_or(self.growth_rate, 0.02).clamp(0.0, 1.0);
		self.relax_rate = finite_or(self.relax_rate, 0.02).clamp(0.0, 1.0);
		self.damping = finite_or(self.damping, 0.995).clamp(0.0, 1.0);
		self.bounce = finite_or(self.bounce, 0.45).clamp(0.0, 1.0);
		self.max_velocity = finite_or(self.max_velocity, 1.6).max(0.0);
		self.connect_distance = finite_or(self.connect_distance, 180.0).max(1.0);
		self.interaction_radius = finite_or(self.interaction_radius, 180.0).max(1.0);
		self.link_min_alpha = finite_or(self.link_min_alpha, 0.0).clamp(0.0, 1.0);
		self.hover_alpha_boost = finite_or(self.hover_alpha_boost, 1.0).max(1.0);
		self.max_frame_ms = finite_or(self.max_frame_ms, 48.0).max(1.0);
		self.target_fps = finite_or(self.target_fps, 60.0).max(1.0);
		self.cluster_share = finite_or(self.cluster_share, 0.0).clamp(0.0, 1.0);
		self.cluster_count_min = self.cluster_count_min.max(1);
		self.cluster_count_max = self.cluster_count_max.max(self.cluster_count_min);
		self.sample_scale = finite_or(self.sample_scale, 0.25).clamp(0.01, 1.0);
		self.coverage_floor = finite_or(self.coverage_floor, 0.0).clamp(0.0, 1.0);
		self.reduced_opacity = finite_or(self.reduced_opacity, 0.45).clamp(0.0, 1.0);
		self
	}

	/// Minimum interval between simulated frames, in milliseconds.
	pub fn frame_budget_ms(&self) -> f64 {
		1000.0 / self.target_fps
	}

	/// The fallback palette, defaulting to `ice` for unknown names.
	pub fn palette(&self) -> Palette {
		Palette::named(&self.palette).unwrap_or_default()
	}
}

fn finite_or(value: f64, fallback: f64) -> f64 {
	if value.is_finite() { value } else { fallback }
}
