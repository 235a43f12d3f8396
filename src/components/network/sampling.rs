//! Ambient colors sampled from the hero's background image.
//!
//! The image is decoded once per viewport size and drawn, cover-fitted, into a
//! small offscreen raster. Lookups map canvas coordinates onto that raster and
//! return the nearest texel. Any failure along the way leaves the slot empty
//! and the renderer uses the fallback palette.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use super::error::{NetworkError, describe};
use super::theme::Color;
use super::viewport::Viewport;

/// One raster cell: color channels plus alpha coverage in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Texel {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
	/// Alpha as coverage in `[0, 1]`.
	pub coverage: f64,
}

/// Downscaled RGBA raster covering the whole viewport.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleBuffer {
	width: u32,
	height: u32,
	view_width: f64,
	view_height: f64,
	data: Vec<u8>,
}

impl SampleBuffer {
	/// Wrap raw RGBA bytes (row-major, 4 bytes per texel) covering a
	/// `view_width` × `view_height` logical viewport.
	pub fn from_rgba(
		width: u32,
		height: u32,
		view_width: f64,
		view_height: f64,
		data: Vec<u8>,
	) -> Result<Self, NetworkError> {
		let expected = width as usize * height as usize * 4;
		if width == 0 || height == 0 || data.len() != expected {
			return Err(NetworkError::RasterSize {
				expected,
				actual: data.len(),
			});
		}
		Ok(Self {
			width,
			height,
			view_width: view_width.max(1.0),
			view_height: view_height.max(1.0),
			data,
		})
	}

	/// Raster width in texels.
	pub fn width(&self) -> u32 {
		self.width
	}

	/// Raster height in texels.
	pub fn height(&self) -> u32 {
		self.height
	}

	/// Nearest texel for a canvas-local point; out-of-range points clamp to
	/// the edge.
	pub fn texel(&self, x: f64, y: f64) -> Texel {
		let tx = index(x / self.view_width, self.width);
		let ty = index(y / self.view_height, self.height);
		let i = (ty * self.width as usize + tx) * 4;
		Texel {
			r: self.data[i],
			g: self.data[i + 1],
			b: self.data[i + 2],
			coverage: self.data[i + 3] as f64 / 255.0,
		}
	}

	/// Opaque color at a point, or `None` where coverage is below `floor`.
	pub fn color_at(&self, x: f64, y: f64, floor: f64) -> Option<Color> {
		let t = self.texel(x, y);
		(t.coverage >= floor).then_some(Color::rgb(t.r, t.g, t.b))
	}
}

fn index(fraction: f64, len: u32) -> usize {
	let last = len.saturating_sub(1) as f64;
	let i = (fraction * len as f64).floor();
	if i.is_nan() { 0 } else { i.clamp(0.0, last) as usize }
}

#[derive(Default)]
struct SlotInner {
	generation: u64,
	buffer: Option<Rc<SampleBuffer>>,
	on_install: Option<Rc<dyn Fn()>>,
}

impl fmt::Debug for SlotInner {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SlotInner")
			.field("generation", &self.generation)
			.field("buffer", &self.buffer)
			.field("on_install", &self.on_install.is_some())
			.finish()
	}
}

/// Shared, atomically replaced home of the current sample buffer.
///
/// Each invalidation bumps a generation counter; a load that completes after
/// the viewport changed again carries a stale generation and is dropped.
#[derive(Clone, Debug, Default)]
pub struct SampleSlot(Rc<RefCell<SlotInner>>);

impl SampleSlot {
	/// Drop the current buffer and return the generation new loads must carry.
	pub fn invalidate(&self) -> u64 {
		let mut inner = self.0.borrow_mut();
		inner.generation += 1;
		inner.buffer = None;
		inner.generation
	}

	/// Install a finished buffer if it still matches the current generation.
	/// The install hook runs after the slot is updated.
	pub fn install(&self, generation: u64, buffer: SampleBuffer) -> bool {
		let hook = {
			let mut inner = self.0.borrow_mut();
			if inner.generation != generation {
				return false;
			}
			inner.buffer = Some(Rc::new(buffer));
			inner.on_install.clone()
		};
		if let Some(hook) = hook {
			hook();
		}
		true
	}

	/// Run `hook` after every successful [`install`](Self::install).
	pub fn set_on_install(&self, hook: impl Fn() + 'static) {
		self.0.borrow_mut().on_install = Some(Rc::new(hook));
	}

	/// Remove the install hook.
	pub fn clear_on_install(&self) {
		self.0.borrow_mut().on_install = None;
	}

	/// Generation that an install must match.
	pub fn generation(&self) -> u64 {
		self.0.borrow().generation
	}

	/// The buffer renderers should use, if sampling is available.
	pub fn current(&self) -> Option<Rc<SampleBuffer>> {
		self.0.borrow().buffer.clone()
	}
}

/// Everything an asynchronous load needs to produce and install a buffer.
#[derive(Clone, Debug)]
pub struct SampleRequest {
	/// Image to decode.
	pub url: String,
	/// Where the finished buffer goes.
	pub slot: SampleSlot,
	/// Slot generation at request time.
	pub generation: u64,
	/// Raster width in texels.
	pub width: u32,
	/// Raster height in texels.
	pub height: u32,
	/// Logical viewport width the raster covers.
	pub view_width: f64,
	/// Logical viewport height.
	pub view_height: f64,
}

impl SampleRequest {
	/// Request a raster at `scale` of `viewport`.
	pub fn new(url: String, slot: SampleSlot, generation: u64, viewport: &Viewport, scale: f64) -> Self {
		let (width, height) = raster_size(viewport, scale);
		Self {
			url,
			slot,
			generation,
			width,
			height,
			view_width: viewport.width,
			view_height: viewport.height,
		}
	}
}

/// Raster dimensions for a viewport at the given fraction of full size.
pub fn raster_size(viewport: &Viewport, scale: f64) -> (u32, u32) {
	(
		((viewport.width * scale).round() as u32).max(1),
		((viewport.height * scale).round() as u32).max(1),
	)
}

/// Extract the first `url(...)` from a CSS `background-image` value.
///
/// Handles single/double/no quotes and multi-layer values such as
/// `linear-gradient(...), url("hero.jpg")`. A quoted URL runs to its closing
/// quote, so it may contain parentheses. Returns `None` for `none`, gradients
/// without an image, empty and malformed values.
pub fn parse_css_url(value: &str) -> Option<String> {
	let start = value.find("url(")? + "url(".len();
	let rest = value[start..].trim_start();
	let url = match rest.chars().next()? {
		quote @ ('"' | '\'') => {
			let body = &rest[1..];
			&body[..body.find(quote)?]
		}
		_ => &rest[..rest.find(')')?],
	};
	let url = url.trim();
	(!url.is_empty()).then(|| url.to_string())
}

/// Source rectangle `(sx, sy, sw, sh)` that covers a `dst_w` × `dst_h` area
/// the way CSS `background-size: cover` centered would.
pub fn cover_crop(src_w: f64, src_h: f64, dst_w: f64, dst_h: f64) -> (f64, f64, f64, f64) {
	if src_w <= 0.0 || src_h <= 0.0 || dst_w <= 0.0 || dst_h <= 0.0 {
		return (0.0, 0.0, src_w.max(0.0), src_h.max(0.0));
	}
	let scale = (dst_w / src_w).max(dst_h / src_h);
	let (sw, sh) = (dst_w / scale, dst_h / scale);
	((src_w - sw) / 2.0, (src_h - sh) / 2.0, sw, sh)
}

/// Decode the requested image and read it back as a [`SampleBuffer`].
///
/// Cross-origin images are requested with CORS; if the server does not allow
/// it the canvas is tainted and readback fails with
/// [`NetworkError::PixelReadBlocked`].
pub async fn decode(request: &SampleRequest) -> Result<SampleBuffer, NetworkError> {
	let document = web_sys::window()
		.and_then(|w| w.document())
		.ok_or(NetworkError::MissingWindow)?;

	let image = HtmlImageElement::new()?;
	image.set_cross_origin(Some("anonymous"));
	image.set_src(&request.url);
	JsFuture::from(image.decode())
		.await
		.map_err(|e| NetworkError::ImageLoad {
			url: request.url.clone(),
			reason: describe(&e),
		})?;

	let canvas: HtmlCanvasElement = document
		.create_element("canvas")?
		.dyn_into()
		.map_err(|_| NetworkError::MissingContext)?;
	canvas.set_width(request.width);
	canvas.set_height(request.height);
	let ctx: CanvasRenderingContext2d = canvas
		.get_context("2d")?
		.ok_or(NetworkError::MissingContext)?
		.dyn_into()
		.map_err(|_| NetworkError::MissingContext)?;

	let (w, h) = (request.width as f64, request.height as f64);
	let (sx, sy, sw, sh) = cover_crop(
		image.natural_width() as f64,
		image.natural_height() as f64,
		w,
		h,
	);
	ctx.draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
		&image, sx, sy, sw, sh, 0.0, 0.0, w, h,
	)?;

	let pixels = ctx
		.get_image_data(0.0, 0.0, w, h)
		.map_err(|e| NetworkError::PixelReadBlocked {
			url: request.url.clone(),
			reason: describe(&e),
		})?;

	SampleBuffer::from_rgba(
		request.width,
		request.height,
		request.view_width,
		request.view_height,
		pixels.data().0,
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	/// 2×2 raster: red, green / blue, transparent white.
	fn quad() -> SampleBuffer {
		let data = vec![
			255, 0, 0, 255, 0, 255, 0, 255, //
			0, 0, 255, 255, 255, 255, 255, 10,
		];
		SampleBuffer::from_rgba(2, 2, 200.0, 100.0, data).expect("2x2 raster")
	}

	#[test]
	fn lookup_maps_canvas_space_to_nearest_texel() {
		let buf = quad();
		assert_eq!(buf.color_at(10.0, 10.0, 0.1), Some(Color::rgb(255, 0, 0)));
		assert_eq!(buf.color_at(150.0, 20.0, 0.1), Some(Color::rgb(0, 255, 0)));
		assert_eq!(buf.color_at(99.0, 99.0, 0.1), Some(Color::rgb(0, 0, 255)));
		// clamped at the far edge and beyond
		assert_eq!(buf.color_at(-40.0, 500.0, 0.1), Some(Color::rgb(0, 0, 255)));
	}

	#[test]
	fn low_coverage_reads_as_absent() {
		let buf = quad();
		let t = buf.texel(199.0, 99.0);
		assert_eq!((t.r, t.g, t.b), (255, 255, 255));
		assert!(t.coverage < 0.05);
		assert_eq!(buf.color_at(199.0, 99.0, 0.12), None);
		assert!(buf.color_at(199.0, 99.0, 0.0).is_some());
	}

	#[test]
	fn raster_size_mismatch_is_rejected() {
		assert!(matches!(
			SampleBuffer::from_rgba(2, 2, 10.0, 10.0, vec![0; 15]),
			Err(NetworkError::RasterSize {
				expected: 16,
				actual: 15
			})
		));
		assert!(SampleBuffer::from_rgba(0, 2, 10.0, 10.0, Vec::new()).is_err());
	}

	#[test]
	fn stale_generation_is_not_installed() {
		let slot = SampleSlot::default();
		let first = slot.invalidate();
		let second = slot.invalidate();
		assert!(!slot.install(first, quad()));
		assert!(slot.current().is_none());
		assert!(slot.install(second, quad()));
		assert!(slot.current().is_some());
		slot.invalidate();
		assert!(slot.current().is_none());
	}

	#[test]
	fn install_hook_fires_only_for_current_generation() {
		use std::cell::Cell;

		let slot = SampleSlot::default();
		let fired = Rc::new(Cell::new(0));
		let counter = fired.clone();
		// the hook may read the slot it was called from
		let observed = slot.clone();
		slot.set_on_install(move || {
			assert!(observed.current().is_some());
			counter.set(counter.get() + 1);
		});

		let stale = slot.invalidate();
		let current = slot.invalidate();
		assert!(!slot.install(stale, quad()));
		assert_eq!(fired.get(), 0);
		assert!(slot.install(current, quad()));
		assert_eq!(fired.get(), 1);

		slot.clear_on_install();
		let next = slot.invalidate();
		assert!(slot.install(next, quad()));
		assert_eq!(fired.get(), 1);
	}

	#[test]
	fn parses_css_background_values() {
		assert_eq!(parse_css_url(r#"url("/static/hero.jpg")"#).as_deref(), Some("/static/hero.jpg"));
		assert_eq!(parse_css_url("url('a b.png')").as_deref(), Some("a b.png"));
		assert_eq!(parse_css_url("url( img.webp )").as_deref(), Some("img.webp"));
		assert_eq!(
			parse_css_url(r#"linear-gradient(red, blue), url("https://cdn.example/x.jpg")"#).as_deref(),
			Some("https://cdn.example/x.jpg")
		);
		assert_eq!(
			parse_css_url(r#"url("https://x.test/hero(1).jpg")"#).as_deref(),
			Some("https://x.test/hero(1).jpg")
		);
		assert_eq!(parse_css_url("url('shots/(night) sky.png')").as_deref(), Some("shots/(night) sky.png"));
		assert_eq!(parse_css_url("none"), None);
		assert_eq!(parse_css_url("url()"), None);
		assert_eq!(parse_css_url("url(\"broken"), None);
		assert_eq!(parse_css_url(""), None);
	}

	#[test]
	fn cover_crop_centers_the_overflowing_axis() {
		// wide image into a square: crop the sides
		assert_eq!(cover_crop(400.0, 200.0, 100.0, 100.0), (100.0, 0.0, 200.0, 200.0));
		// tall image into a wide area: crop top and bottom
		assert_eq!(cover_crop(100.0, 400.0, 200.0, 100.0), (0.0, 175.0, 100.0, 50.0));
	}

	#[test]
	fn request_uses_scaled_raster() {
		let viewport = Viewport::fit(1000.0, 500.0, 2.0);
		let req = SampleRequest::new("x.jpg".into(), SampleSlot::default(), 3, &viewport, 0.25);
		assert_eq!((req.width, req.height), (250, 125));
		assert_eq!((req.view_width, req.view_height), (1000.0, 500.0));
	}
}
