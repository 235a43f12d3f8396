//! Drawing the network for one frame.
//!
//! Rendering runs in three passes for correct z-ordering:
//! 1. Clear the full surface
//! 2. Links between every pair within connect distance
//! 3. Particles on top: soft radial halo, then a solid core
//!
//! Colors come from the sample buffer where it has coverage and from the
//! fallback [`Palette`] everywhere else. Pairwise linking is O(n²), which is
//! what keeps the desktop particle count modest.

use std::f64::consts::TAU;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::config::NetworkConfig;
use super::error::NetworkError;
use super::particles::Particle;
use super::sampling::SampleBuffer;
use super::theme::{Color, Palette};
use super::types::{PointerState, RenderStats};
use super::viewport::Viewport;

/// The drawing operations the renderer needs, in logical coordinates.
pub trait Surface {
	/// Size the backing store for a viewport and install the DPR transform.
	fn configure(&mut self, viewport: &Viewport);
	/// Opacity of the whole drawing element.
	fn set_opacity(&mut self, opacity: f64);
	fn clear(&mut self, width: f64, height: f64);
	fn line(&mut self, from: (f64, f64), to: (f64, f64), color: Color, width: f64);
	/// Filled circle with a radial gradient from the center outwards.
	fn halo(&mut self, center: (f64, f64), radius: f64, stops: &[(f64, Color)]);
	fn circle(&mut self, center: (f64, f64), radius: f64, color: Color);
}

/// Everything one render pass reads.
pub struct Scene<'a> {
	/// Logical drawing area.
	pub viewport: &'a Viewport,
	/// Particles to draw.
	pub particles: &'a [Particle],
	/// Pointer for hover effects.
	pub pointer: &'a PointerState,
	/// `None` while sampling is unavailable.
	pub samples: Option<&'a SampleBuffer>,
	/// Fallback colors.
	pub palette: &'a Palette,
	/// Drawing parameters.
	pub config: &'a NetworkConfig,
}

/// Renders the complete network to the surface.
pub fn render<S: Surface + ?Sized>(surface: &mut S, scene: &Scene<'_>) -> RenderStats {
	surface.clear(scene.viewport.width, scene.viewport.height);
	let links = draw_links(surface, scene);
	draw_particles(surface, scene);
	RenderStats {
		particles: scene.particles.len(),
		links,
	}
}

/// Link opacity from separation and the two particles' opacity factors.
///
/// Linear in `1 - distance / connect_distance`, floored at `link_min_alpha`
/// and never above 1.
pub fn link_opacity(distance: f64, a_opacity: f64, b_opacity: f64, config: &NetworkConfig) -> f64 {
	let base = (1.0 - distance / config.connect_distance).max(0.0)
		* a_opacity
		* b_opacity
		* config.link_base_alpha;
	base.max(config.link_min_alpha).min(1.0)
}

/// `1 - d / reach` for a point within `reach` of an active pointer.
pub fn pointer_proximity(x: f64, y: f64, pointer: &PointerState, reach: f64) -> Option<f64> {
	if !pointer.active {
		return None;
	}
	let d = ((x - pointer.x).powi(2) + (y - pointer.y).powi(2)).sqrt();
	(d <= reach).then(|| 1.0 - d / reach)
}

/// Opacity multiplier for a link whose midpoint is near the pointer.
pub fn hover_boost(mid_x: f64, mid_y: f64, pointer: &PointerState, config: &NetworkConfig) -> f64 {
	pointer_proximity(mid_x, mid_y, pointer, config.connect_distance)
		.map_or(1.0, |t| 1.0 + t * (config.hover_alpha_boost - 1.0))
}

/// Sampled color at a point, if the buffer has enough coverage there.
fn sampled(scene: &Scene<'_>, x: f64, y: f64) -> Option<Color> {
	scene
		.samples
		.and_then(|s| s.color_at(x, y, scene.config.coverage_floor))
}

fn draw_links<S: Surface + ?Sized>(surface: &mut S, scene: &Scene<'_>) -> usize {
	let config = scene.config;
	let reach2 = config.connect_distance * config.connect_distance;
	let ps = scene.particles;
	let mut count = 0;

	for (i, a) in ps.iter().enumerate() {
		for b in &ps[i + 1..] {
			let (dx, dy) = (a.x - b.x, a.y - b.y);
			let d2 = dx * dx + dy * dy;
			if d2 > reach2 {
				continue;
			}

			let (mx, my) = ((a.x + b.x) * 0.5, (a.y + b.y) * 0.5);
			let alpha = (link_opacity(d2.sqrt(), a.opacity, b.opacity, config)
				* hover_boost(mx, my, scene.pointer, config))
			.min(1.0);
			let color = sampled(scene, mx, my).unwrap_or(scene.palette.link);

			surface.line((a.x, a.y), (b.x, b.y), color.with_alpha(alpha), config.line_width);
			count += 1;
		}
	}
	count
}

fn draw_particles<S: Surface + ?Sized>(surface: &mut S, scene: &Scene<'_>) {
	let config = scene.config;

	for p in scene.particles {
		let halo_scale = 1.0
			+ pointer_proximity(p.x, p.y, scene.pointer, config.connect_distance)
				.map_or(0.0, |t| t * config.halo_hover_growth);
		let halo_radius = (p.radius * config.halo_factor).max(config.halo_min_radius) * halo_scale;
		let halo_alpha = config.halo_alpha * halo_scale * p.opacity;

		let tint = sampled(scene, p.x, p.y);
		let halo = tint.unwrap_or(scene.palette.halo);
		surface.halo(
			(p.x, p.y),
			halo_radius,
			&[
				(0.0, halo.with_alpha(halo_alpha)),
				(0.25, halo.with_alpha(halo_alpha / 3.0)),
				(1.0, halo.with_alpha(0.0)),
			],
		);

		let core = tint.map_or(scene.palette.core, |c| c.lighten(config.sample_core_lift));
		surface.circle((p.x, p.y), p.radius, core.with_alpha(config.core_alpha * p.opacity));
	}
}

/// [`Surface`] backed by an HTML canvas 2D context.
pub struct CanvasSurface {
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
	/// Wrap a canvas; fails without a 2D context.
	pub fn new(canvas: HtmlCanvasElement) -> Result<Self, NetworkError> {
		let ctx: CanvasRenderingContext2d = canvas
			.get_context("2d")?
			.ok_or(NetworkError::MissingContext)?
			.dyn_into()
			.map_err(|_| NetworkError::MissingContext)?;
		Ok(Self { canvas, ctx })
	}
}

impl Surface for CanvasSurface {
	fn configure(&mut self, viewport: &Viewport) {
		self.canvas.set_width(viewport.pixel_width);
		self.canvas.set_height(viewport.pixel_height);
		let style = self.canvas.style();
		let _ = style.set_property("width", &format!("{}px", viewport.width));
		let _ = style.set_property("height", &format!("{}px", viewport.height));
		let _ = self
			.ctx
			.set_transform(viewport.dpr, 0.0, 0.0, viewport.dpr, 0.0, 0.0);
	}

	fn set_opacity(&mut self, opacity: f64) {
		let _ = self
			.canvas
			.style()
			.set_property("opacity", &format!("{opacity}"));
	}

	fn clear(&mut self, width: f64, height: f64) {
		self.ctx.clear_rect(0.0, 0.0, width, height);
	}

	fn line(&mut self, from: (f64, f64), to: (f64, f64), color: Color, width: f64) {
		self.ctx.set_stroke_style_str(&color.to_css());
		self.ctx.set_line_width(width);
		self.ctx.begin_path();
		self.ctx.move_to(from.0, from.1);
		self.ctx.line_to(to.0, to.1);
		self.ctx.stroke();
	}

	fn halo(&mut self, center: (f64, f64), radius: f64, stops: &[(f64, Color)]) {
		let (x, y) = center;
		let Ok(gradient) = self.ctx.create_radial_gradient(x, y, 0.0, x, y, radius) else {
			return;
		};
		for (offset, color) in stops {
			let _ = gradient.add_color_stop(*offset as f32, &color.to_css());
		}

		self.ctx.begin_path();
		let _ = self.ctx.arc(x, y, radius, 0.0, TAU);
		#[allow(deprecated)]
		self.ctx.set_fill_style(&gradient);
		self.ctx.fill();
	}

	fn circle(&mut self, center: (f64, f64), radius: f64, color: Color) {
		self.ctx.set_fill_style_str(&color.to_css());
		self.ctx.begin_path();
		let _ = self.ctx.arc(center.0, center.1, radius, 0.0, TAU);
		self.ctx.fill();
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;

	/// One recorded drawing call.
	#[derive(Clone, Debug, PartialEq)]
	pub(crate) enum Op {
		Configure(Viewport),
		Opacity(f64),
		Clear,
		Line(Color),
		Halo(Vec<(f64, Color)>),
		Circle(Color),
	}

	/// Surface that records calls instead of drawing.
	#[derive(Debug, Default)]
	pub(crate) struct Recorder {
		pub ops: Vec<Op>,
	}

	impl Recorder {
		pub fn clears(&self) -> usize {
			self.ops.iter().filter(|op| **op == Op::Clear).count()
		}
	}

	impl Surface for Recorder {
		fn configure(&mut self, viewport: &Viewport) {
			self.ops.push(Op::Configure(*viewport));
		}
		fn set_opacity(&mut self, opacity: f64) {
			self.ops.push(Op::Opacity(opacity));
		}
		fn clear(&mut self, _: f64, _: f64) {
			self.ops.push(Op::Clear);
		}
		fn line(&mut self, _: (f64, f64), _: (f64, f64), color: Color, _: f64) {
			self.ops.push(Op::Line(color));
		}
		fn halo(&mut self, _: (f64, f64), _: f64, stops: &[(f64, Color)]) {
			self.ops.push(Op::Halo(stops.to_vec()));
		}
		fn circle(&mut self, _: (f64, f64), _: f64, color: Color) {
			self.ops.push(Op::Circle(color));
		}
	}

	fn particle(x: f64, y: f64, opacity: f64) -> Particle {
		Particle {
			x,
			y,
			vx: 0.0,
			vy: 0.0,
			radius: 2.0,
			base_radius: 2.0,
			origin_radius: 2.0,
			opacity,
			phase: 0.0,
		}
	}

	#[test]
	fn link_at_connect_distance_is_floored() {
		let config = NetworkConfig::default();
		let raw = (1.0 - config.connect_distance / config.connect_distance) * config.link_base_alpha;
		assert_eq!(raw, 0.0);
		assert_eq!(
			link_opacity(config.connect_distance, 1.0, 1.0, &config),
			config.link_min_alpha
		);
	}

	#[test]
	fn link_opacity_is_within_floor_and_one() {
		let config = NetworkConfig {
			link_base_alpha: 5.0,
			..NetworkConfig::default()
		};
		for step in 0..=36 {
			let d = step as f64 * 5.0;
			for &(a, b) in &[(0.55, 0.55), (1.0, 1.0), (0.7, 0.9)] {
				let o = link_opacity(d, a, b, &config);
				assert!(o >= config.link_min_alpha && o <= 1.0, "{d} {a} {b} -> {o}");
			}
		}
		assert_eq!(link_opacity(0.0, 1.0, 1.0, &config), 1.0);
	}

	#[test]
	fn hover_boost_is_linear_in_midpoint_distance() {
		let config = NetworkConfig::default();
		let pointer = PointerState {
			x: 0.0,
			y: 0.0,
			active: true,
			engaged: false,
		};
		assert_eq!(hover_boost(0.0, 0.0, &pointer, &config), config.hover_alpha_boost);
		let half = hover_boost(config.connect_distance / 2.0, 0.0, &pointer, &config);
		assert!((half - (1.0 + (config.hover_alpha_boost - 1.0) / 2.0)).abs() < 1e-12);
		assert_eq!(hover_boost(500.0, 0.0, &pointer, &config), 1.0);
		let idle = PointerState::default();
		assert_eq!(hover_boost(0.0, 0.0, &idle, &config), 1.0);
	}

	#[test]
	fn draws_links_then_particles_after_clear() {
		let config = NetworkConfig::default();
		let palette = Palette::default();
		let viewport = Viewport::fit(400.0, 300.0, 1.0);
		let particles = [particle(10.0, 10.0, 1.0), particle(50.0, 10.0, 1.0), particle(390.0, 290.0, 1.0)];
		let pointer = PointerState::default();
		let scene = Scene {
			viewport: &viewport,
			particles: &particles,
			pointer: &pointer,
			samples: None,
			palette: &palette,
			config: &config,
		};

		let mut rec = Recorder::default();
		let stats = render(&mut rec, &scene);
		assert_eq!(stats, RenderStats { particles: 3, links: 1 });
		assert_eq!(rec.ops[0], Op::Clear);
		assert!(matches!(rec.ops[1], Op::Line(_)));
		let kinds: Vec<_> = rec.ops[2..]
			.iter()
			.map(|op| matches!(op, Op::Halo(_)))
			.collect();
		assert_eq!(kinds, [true, false, true, false, true, false]);
	}

	#[test]
	fn unavailable_sampling_paints_fallback_palette() {
		let config = NetworkConfig::default();
		let palette = Palette::ember();
		let viewport = Viewport::fit(400.0, 300.0, 1.0);
		let particles = [particle(100.0, 100.0, 0.8), particle(160.0, 120.0, 0.6)];
		let pointer = PointerState {
			x: 120.0,
			y: 110.0,
			active: true,
			engaged: false,
		};
		let scene = Scene {
			viewport: &viewport,
			particles: &particles,
			pointer: &pointer,
			samples: None,
			palette: &palette,
			config: &config,
		};

		let mut rec = Recorder::default();
		render(&mut rec, &scene);
		for op in &rec.ops {
			match op {
				Op::Line(c) => assert_eq!(*c, palette.link.with_alpha(c.a)),
				Op::Circle(c) => assert_eq!(*c, palette.core.with_alpha(c.a)),
				Op::Halo(stops) => {
					for (_, c) in stops {
						assert_eq!(*c, palette.halo.with_alpha(c.a));
					}
				}
				Op::Clear => {}
				other => panic!("unexpected op {other:?}"),
			}
		}
		let expected_core = palette.core.with_alpha(config.core_alpha * 0.8);
		assert!(rec.ops.contains(&Op::Circle(expected_core)));
	}

	#[test]
	fn sampled_colors_tint_where_covered() {
		let config = NetworkConfig::default();
		let palette = Palette::ice();
		let viewport = Viewport::fit(200.0, 100.0, 1.0);
		// left half opaque red, right half transparent
		let mut data = Vec::new();
		for _ in 0..2 {
			data.extend_from_slice(&[200, 10, 10, 255, 0, 0, 0, 0]);
		}
		let samples = SampleBuffer::from_rgba(2, 2, 200.0, 100.0, data).expect("raster");
		let particles = [particle(20.0, 50.0, 1.0), particle(180.0, 50.0, 1.0)];
		let pointer = PointerState::default();
		let scene = Scene {
			viewport: &viewport,
			particles: &particles,
			pointer: &pointer,
			samples: Some(&samples),
			palette: &palette,
			config: &config,
		};

		let mut rec = Recorder::default();
		render(&mut rec, &scene);
		let cores: Vec<Color> = rec
			.ops
			.iter()
			.filter_map(|op| match op {
				Op::Circle(c) => Some(*c),
				_ => None,
			})
			.collect();
		let red = Color::rgb(200, 10, 10).lighten(config.sample_core_lift);
		assert_eq!(cores[0], red.with_alpha(config.core_alpha));
		assert_eq!(cores[1], palette.core.with_alpha(config.core_alpha));
	}
}
