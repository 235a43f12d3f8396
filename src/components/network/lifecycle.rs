//! Run state, frame scheduling and the degradation policy.
//!
//! The [`Controller`] owns every piece of per-run state and is driven entirely
//! by its host: frame callbacks, resizes, visibility changes and pointer
//! events arrive as method calls, and the controller asks the host for frames
//! and sample loads through the [`Host`] trait. Nothing here touches the DOM
//! directly, so the whole state machine runs under plain unit tests.

use log::{debug, info, warn};

use super::config::NetworkConfig;
use super::particles::{Particle, ParticleStore, node_count};
use super::pointer::PointerController;
use super::render::{Scene, Surface, render};
use super::sampling::{SampleRequest, SampleSlot};
use super::simulation;
use super::theme::Palette;
use super::types::{RenderStats, RunState};
use super::viewport::Viewport;

/// Frames may arrive this much earlier than the budget and still count.
const FRAME_SLACK_MS: f64 = 1.0;

/// What the controller needs from its environment.
pub trait Host {
	/// Environment asks for reduced motion.
	fn prefers_reduced_motion(&self) -> bool;
	/// Container content box `(width, height)` in CSS pixels and the device
	/// pixel ratio.
	fn container_size(&self) -> (f64, f64, f64);
	/// Background image URL of the hero container, if any.
	fn background_url(&self) -> Option<String>;
	/// Schedule one frame callback (no-op if one is already pending).
	fn request_frame(&mut self);
	/// Cancel the pending frame callback, if any.
	fn cancel_frame(&mut self);
	/// Start decoding an image into the request's slot.
	fn load_samples(&mut self, request: SampleRequest);
	/// Drop whatever keeps frame callbacks alive. Called once, after the
	/// last frame was cancelled.
	fn release(&mut self) {}
}

/// One activation of the network over a surface.
pub struct Controller<S, H> {
	config: NetworkConfig,
	palette: Palette,
	surface: S,
	host: H,
	viewport: Viewport,
	store: ParticleStore,
	pointer: PointerController,
	samples: SampleSlot,
	/// Explicit sampling source; overrides the hero's computed background.
	sample_url: Option<String>,
	run: RunState,
	/// Set by [`shutdown`](Controller::shutdown); the controller never runs again.
	released: bool,
	hidden: bool,
	clock_ms: f64,
	last_frame: Option<f64>,
	stats: RenderStats,
	render_passes: u64,
}

impl<S: Surface, H: Host> Controller<S, H> {
	/// Idle controller; `seed` fixes the particle layouts.
	pub fn new(config: NetworkConfig, surface: S, host: H, seed: u64) -> Self {
		let config = config.sanitized();
		Self {
			palette: config.palette(),
			config,
			surface,
			host,
			viewport: Viewport::default(),
			store: ParticleStore::new(seed),
			pointer: PointerController::default(),
			samples: SampleSlot::default(),
			sample_url: None,
			run: RunState::Idle,
			released: false,
			hidden: false,
			clock_ms: 0.0,
			last_frame: None,
			stats: RenderStats::default(),
			render_passes: 0,
		}
	}

	/// Begin a run: static single paint under reduced motion, animated loop
	/// otherwise. No-op while a run is already active.
	pub fn start(&mut self) {
		if self.run.is_active() || self.released {
			return;
		}
		self.run = RunState::Starting;
		self.resize();

		if self.host.prefers_reduced_motion() && !self.config.reduced_motion_override {
			self.run = RunState::ReducedStatic;
			self.surface.set_opacity(self.config.reduced_opacity);
			self.render_frame();
			info!(
				"hero-network: reduced motion, static render of {} particles",
				self.store.len()
			);
			return;
		}

		self.run = RunState::Running;
		self.surface.set_opacity(1.0);
		self.clock_ms = 0.0;
		self.last_frame = None;
		self.refresh_sampling();
		if !self.hidden {
			self.host.request_frame();
		}
		info!("hero-network: running with {} particles", self.store.len());
	}

	/// Stop the run and cancel the pending frame. Restart with [`start`](Self::start).
	pub fn stop(&mut self) {
		self.host.cancel_frame();
		if self.run != RunState::Idle {
			self.run = RunState::Stopped;
		}
		info!("hero-network: stopped");
	}

	/// Stop for good and let the host free its frame callback. Used when the
	/// owning element goes away; later calls to [`start`](Self::start) are ignored.
	pub fn shutdown(&mut self) {
		if self.released {
			return;
		}
		self.stop();
		self.released = true;
		self.host.release();
		debug!("hero-network: released");
	}

	/// A sample buffer was installed in [`samples`](Self::samples). A static
	/// render repaints so the tint shows up; a running loop picks it up on its
	/// next frame anyway.
	pub fn on_samples_installed(&mut self) {
		if self.run == RunState::ReducedStatic {
			self.render_frame();
		}
	}

	/// Display refresh callback with its timestamp in milliseconds.
	pub fn on_frame(&mut self, now_ms: f64) {
		if self.run != RunState::Running || self.hidden {
			return;
		}

		if let Some(last) = self.last_frame {
			let elapsed = now_ms - last;
			if elapsed < self.config.frame_budget_ms() - FRAME_SLACK_MS {
				self.host.request_frame();
				return;
			}
			self.advance(elapsed);
		}
		self.last_frame = Some(now_ms);

		self.render_frame();
		self.host.request_frame();
	}

	/// Re-fit to the container, regenerate particles and restart sampling.
	/// The run state is left as it was.
	pub fn on_resize(&mut self) {
		self.resize();
		match self.run {
			RunState::Running => {
				self.refresh_sampling();
				self.host.cancel_frame();
				if !self.hidden {
					self.host.request_frame();
				}
			}
			RunState::ReducedStatic => self.render_frame(),
			_ => {}
		}
	}

	/// Document visibility changed; pauses and resumes frame scheduling only.
	pub fn set_hidden(&mut self, hidden: bool) {
		if hidden == self.hidden {
			return;
		}
		self.hidden = hidden;
		if hidden {
			self.host.cancel_frame();
		} else if self.run == RunState::Running {
			// the first frame after resuming only re-anchors the clock
			self.last_frame = None;
			self.host.request_frame();
		}
	}

	/// Fresh particle set for the current viewport.
	pub fn regenerate(&mut self) {
		let count = node_count(&self.viewport, &self.config);
		self.store.regenerate(count, &self.viewport, &self.config);
		if self.run == RunState::ReducedStatic {
			self.render_frame();
		}
	}

	/// Sample from `url` instead of the hero background, now and after every
	/// later resize. Turns sampling on for this run if the config had it off.
	pub fn force_sampling(&mut self, url: String) {
		if !self.config.sampling {
			warn!("hero-network: sampling was disabled, enabling it for {url}");
			self.config.sampling = true;
		}
		self.sample_url = Some(url);
		self.refresh_sampling();
	}

	/// Toggle the reduced-motion override; an active run restarts under the
	/// new policy.
	pub fn set_reduced_motion_override(&mut self, force_animation: bool) {
		let config = NetworkConfig {
			reduced_motion_override: force_animation,
			..self.config.clone()
		};
		self.set_config(config);
	}

	/// Swap the whole parameter table, restarting an active run.
	pub fn set_config(&mut self, config: NetworkConfig) {
		let config = config.sanitized();
		if config == self.config {
			return;
		}
		let was_active = self.run.is_active();
		if was_active {
			self.stop();
		}
		self.palette = config.palette();
		self.config = config;
		if was_active {
			self.start();
		}
	}

	/// Pointer input, fed by the host's event listeners.
	pub fn pointer_mut(&mut self) -> &mut PointerController {
		&mut self.pointer
	}

	/// Current run state.
	pub fn run_state(&self) -> RunState {
		self.run
	}

	/// Current particles.
	pub fn particles(&self) -> &[Particle] {
		&self.store.particles
	}

	/// Particles in the current set.
	pub fn particle_count(&self) -> usize {
		self.store.len()
	}

	/// Links drawn by the most recent render pass.
	pub fn link_count(&self) -> usize {
		self.stats.links
	}

	/// Render passes since construction.
	pub fn render_passes(&self) -> u64 {
		self.render_passes
	}

	/// Viewport of the last resize.
	pub fn viewport(&self) -> &Viewport {
		&self.viewport
	}

	/// Active parameter table.
	pub fn config(&self) -> &NetworkConfig {
		&self.config
	}

	/// Sample slot shared with pending loads.
	pub fn samples(&self) -> &SampleSlot {
		&self.samples
	}

	/// The environment.
	pub fn host(&self) -> &H {
		&self.host
	}

	/// The environment, mutably.
	pub fn host_mut(&mut self) -> &mut H {
		&mut self.host
	}

	/// The drawing surface.
	pub fn surface(&self) -> &S {
		&self.surface
	}

	fn resize(&mut self) {
		let (w, h, dpr) = self.host.container_size();
		self.viewport = Viewport::fit(w, h, dpr);
		self.surface.configure(&self.viewport);
		self.pointer.clamp_to(&self.viewport);
		self.samples.invalidate();
		let count = node_count(&self.viewport, &self.config);
		self.store.regenerate(count, &self.viewport, &self.config);
		debug!(
			"hero-network: viewport {}x{} @{}x, {} particles",
			self.viewport.width, self.viewport.height, self.viewport.dpr, count
		);
	}

	fn advance(&mut self, elapsed_ms: f64) {
		let dt = elapsed_ms.clamp(0.0, self.config.max_frame_ms);
		simulation::step(
			&mut self.store.particles,
			self.pointer.state(),
			&self.viewport,
			&self.config,
			self.clock_ms,
			dt,
		);
		self.clock_ms += dt;
	}

	fn render_frame(&mut self) {
		let samples = if self.config.sampling {
			self.samples.current()
		} else {
			None
		};
		let scene = Scene {
			viewport: &self.viewport,
			particles: &self.store.particles,
			pointer: self.pointer.state(),
			samples: samples.as_deref(),
			palette: &self.palette,
			config: &self.config,
		};
		self.stats = render(&mut self.surface, &scene);
		self.render_passes += 1;
	}

	fn refresh_sampling(&mut self) {
		if !self.config.sampling {
			return;
		}
		let generation = self.samples.invalidate();
		let Some(url) = self
			.sample_url
			.clone()
			.or_else(|| self.host.background_url())
		else {
			debug!("hero-network: no background image, using fallback palette");
			return;
		};
		self.host.load_samples(SampleRequest::new(
			url,
			self.samples.clone(),
			generation,
			&self.viewport,
			self.config.sample_scale,
		));
	}
}
