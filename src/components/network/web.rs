//! Browser side of the network: the [`Host`] implementation, DOM event
//! wiring and the handle returned from activation.
//!
//! Frames come from `requestAnimationFrame`, sizes from the canvas's parent,
//! the sampling source from the hero's computed `background-image`. Pointer
//! listeners sit on the parent so the whole hero is interactive.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
	AddEventListenerOptions, Element, Event, EventTarget, HtmlCanvasElement, MouseEvent, TouchEvent,
	Window,
};

use super::config::NetworkConfig;
use super::error::NetworkError;
use super::lifecycle::{Controller, Host};
use super::pointer::CanvasRect;
use super::render::CanvasSurface;
use super::sampling::{self, SampleRequest, parse_css_url};

/// Controller wired to a real canvas and window.
pub type WebController = Controller<CanvasSurface, WebHost>;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// [`Host`] backed by the browser window.
pub struct WebHost {
	window: Window,
	canvas: HtmlCanvasElement,
	/// Element whose content box sizes the canvas.
	container: Element,
	/// Element whose background image is sampled.
	hero: Element,
	animate: FrameCallback,
	pending: Option<i32>,
}

impl WebHost {
	/// The scheduled frame has fired; a new one may be requested.
	pub fn frame_delivered(&mut self) {
		self.pending = None;
	}

	/// Canvas bounding box in client coordinates.
	pub fn canvas_rect(&self) -> CanvasRect {
		let rect = self.canvas.get_bounding_client_rect();
		CanvasRect {
			left: rect.left(),
			top: rect.top(),
			width: rect.width(),
			height: rect.height(),
		}
	}
}

impl Host for WebHost {
	fn prefers_reduced_motion(&self) -> bool {
		self.window
			.match_media("(prefers-reduced-motion: reduce)")
			.ok()
			.flatten()
			.is_some_and(|query| query.matches())
	}

	fn container_size(&self) -> (f64, f64, f64) {
		let rect = self.container.get_bounding_client_rect();
		(rect.width(), rect.height(), self.window.device_pixel_ratio())
	}

	fn background_url(&self) -> Option<String> {
		let style = self.window.get_computed_style(&self.hero).ok().flatten()?;
		let value = style.get_property_value("background-image").ok()?;
		let url = parse_css_url(&value);
		if url.is_none() {
			debug!("hero-network: {}", NetworkError::NoBackgroundImage);
		}
		url
	}

	fn request_frame(&mut self) {
		if self.pending.is_some() {
			return;
		}
		if let Some(ref cb) = *self.animate.borrow() {
			self.pending = self
				.window
				.request_animation_frame(cb.as_ref().unchecked_ref())
				.ok();
		}
	}

	fn cancel_frame(&mut self) {
		if let Some(id) = self.pending.take() {
			let _ = self.window.cancel_animation_frame(id);
		}
	}

	fn release(&mut self) {
		// breaks the controller -> host -> closure -> controller chain
		let callback = self.animate.borrow_mut().take();
		drop(callback);
	}

	fn load_samples(&mut self, request: SampleRequest) {
		spawn_local(async move {
			match sampling::decode(&request).await {
				Ok(buffer) => {
					if request.slot.install(request.generation, buffer) {
						info!(
							"hero-network: sampling {} at {}x{}",
							request.url, request.width, request.height
						);
					} else {
						debug!("hero-network: dropped stale samples for {}", request.url);
					}
				}
				Err(e) => warn!("hero-network: sampling unavailable, using palette: {e}"),
			}
		});
	}
}

/// A DOM listener that detaches itself when dropped.
struct Listener {
	target: EventTarget,
	kind: &'static str,
	callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
	fn attach(
		target: &EventTarget,
		kind: &'static str,
		handler: impl FnMut(Event) + 'static,
	) -> Option<Self> {
		let callback = Closure::<dyn FnMut(Event)>::new(handler);
		let options = AddEventListenerOptions::new();
		options.set_passive(true);
		target
			.add_event_listener_with_callback_and_add_event_listener_options(
				kind,
				callback.as_ref().unchecked_ref(),
				&options,
			)
			.ok()?;
		Some(Self {
			target: target.clone(),
			kind,
			callback,
		})
	}
}

impl Drop for Listener {
	fn drop(&mut self) {
		let _ = self
			.target
			.remove_event_listener_with_callback(self.kind, self.callback.as_ref().unchecked_ref());
	}
}

/// Everything one activation owns. Dropping it shuts the controller down.
struct Activation {
	controller: Rc<RefCell<WebController>>,
	_listeners: Vec<Listener>,
}

impl Drop for Activation {
	fn drop(&mut self) {
		match self.controller.try_borrow_mut() {
			Ok(mut controller) => {
				controller.samples().clear_on_install();
				controller.shutdown();
			}
			Err(_) => warn!("hero-network: dropped inside a callback, shutdown skipped"),
		}
	}
}

/// Explicit diagnostic handle for one activation.
///
/// Cloning is cheap. When the last clone is gone the frame loop is cancelled
/// and DOM listeners are detached.
#[wasm_bindgen]
#[derive(Clone)]
pub struct NetworkHandle {
	inner: Rc<Activation>,
}

impl NetworkHandle {
	fn controller(&self) -> &RefCell<WebController> {
		&self.inner.controller
	}
}

#[wasm_bindgen]
impl NetworkHandle {
	/// Begin a run (animated, or a single static paint under reduced motion).
	pub fn start(&self) {
		self.controller().borrow_mut().start();
	}

	/// Cancel the pending frame; `start` resumes with fresh particles.
	pub fn stop(&self) {
		self.controller().borrow_mut().stop();
	}

	/// Replace the particle set for the current viewport.
	pub fn regenerate(&self) {
		self.controller().borrow_mut().regenerate();
	}

	/// Sample colors from `url` instead of the hero background.
	#[wasm_bindgen(js_name = forceSampling)]
	pub fn force_sampling(&self, url: String) {
		self.controller().borrow_mut().force_sampling(url);
	}

	/// Animate even when reduced motion is preferred (restarts the run).
	#[wasm_bindgen(js_name = setReducedMotionOverride)]
	pub fn set_reduced_motion_override(&self, force_animation: bool) {
		self.controller()
			.borrow_mut()
			.set_reduced_motion_override(force_animation);
	}

	/// Particles in the current set.
	#[wasm_bindgen(js_name = particleCount)]
	pub fn particle_count(&self) -> usize {
		self.controller().borrow().particle_count()
	}

	/// Links drawn by the most recent render pass.
	#[wasm_bindgen(js_name = linkCount)]
	pub fn link_count(&self) -> usize {
		self.controller().borrow().link_count()
	}

	/// Run state name: `idle`, `starting`, `running`, `reduced-static` or `stopped`.
	#[wasm_bindgen(js_name = runState)]
	pub fn run_state(&self) -> String {
		self.controller().borrow().run_state().to_string()
	}

	/// Render passes since activation.
	#[wasm_bindgen(js_name = renderPasses)]
	pub fn render_passes(&self) -> f64 {
		self.controller().borrow().render_passes() as f64
	}
}

/// Activate the network on a canvas. Returns `None` (after logging why) when
/// the environment cannot host it.
pub fn activate(canvas: HtmlCanvasElement, config: NetworkConfig) -> Option<NetworkHandle> {
	match try_activate(canvas, config) {
		Ok(handle) => Some(handle),
		Err(e) => {
			warn!("hero-network: not activated: {e}");
			None
		}
	}
}

fn try_activate(
	canvas: HtmlCanvasElement,
	config: NetworkConfig,
) -> Result<NetworkHandle, NetworkError> {
	let window = web_sys::window().ok_or(NetworkError::MissingWindow)?;
	let document = window.document().ok_or(NetworkError::MissingWindow)?;
	let container = canvas
		.parent_element()
		.ok_or(NetworkError::MissingContainer)?;
	let hero = canvas
		.closest(".hero")
		.ok()
		.flatten()
		.unwrap_or_else(|| container.clone());
	let surface = CanvasSurface::new(canvas.clone())?;

	let animate: FrameCallback = Rc::new(RefCell::new(None));
	let host = WebHost {
		window: window.clone(),
		canvas,
		container: container.clone(),
		hero,
		animate: animate.clone(),
		pending: None,
	};
	let seed = (js_sys::Math::random() * u64::MAX as f64) as u64;
	let controller = Rc::new(RefCell::new(Controller::new(config, surface, host, seed)));

	let frame_controller = Rc::downgrade(&controller);
	*animate.borrow_mut() = Some(Closure::new(move |now: f64| {
		let Some(controller) = frame_controller.upgrade() else {
			return;
		};
		let mut c = controller.borrow_mut();
		c.host_mut().frame_delivered();
		c.on_frame(now);
	}));

	let install_controller = Rc::downgrade(&controller);
	controller.borrow().samples().set_on_install(move || {
		if let Some(controller) = install_controller.upgrade() {
			if let Ok(mut c) = controller.try_borrow_mut() {
				c.on_samples_installed();
			}
		}
	});

	let mut listeners = Vec::new();

	let c = controller.clone();
	listeners.extend(Listener::attach(&window, "resize", move |_| {
		c.borrow_mut().on_resize();
	}));

	let (c, doc) = (controller.clone(), document.clone());
	listeners.extend(Listener::attach(&document, "visibilitychange", move |_| {
		c.borrow_mut().set_hidden(doc.hidden());
	}));

	for (kind, engage) in [
		("mousemove", false),
		("touchmove", false),
		("pointerdown", true),
	] {
		let c = controller.clone();
		listeners.extend(Listener::attach(&container, kind, move |ev| {
			let mut c = c.borrow_mut();
			let rect = c.host().canvas_rect();
			let Some((x, y)) = client_point(&ev) else {
				return;
			};
			if engage {
				c.pointer_mut().on_down(x, y, rect);
			} else {
				c.pointer_mut().on_move(x, y, rect);
			}
		}));
	}

	let c = controller.clone();
	listeners.extend(Listener::attach(&container, "pointerup", move |_| {
		c.borrow_mut().pointer_mut().on_up();
	}));

	for kind in ["mouseleave", "touchend"] {
		let c = controller.clone();
		listeners.extend(Listener::attach(&container, kind, move |_| {
			c.borrow_mut().pointer_mut().on_leave();
		}));
	}

	// wait a frame so the hero's layout has been applied before sizing
	let start_controller = Rc::downgrade(&controller);
	let start = Closure::once_into_js(move || {
		if let Some(controller) = start_controller.upgrade() {
			controller.borrow_mut().start();
		}
	});
	window.request_animation_frame(start.unchecked_ref())?;

	info!("hero-network: activated with {} listeners", listeners.len());
	Ok(NetworkHandle {
		inner: Rc::new(Activation {
			controller,
			_listeners: listeners,
		}),
	})
}

/// Client coordinates of a mouse/pointer event or the first touch point.
fn client_point(event: &Event) -> Option<(f64, f64)> {
	if event.type_().starts_with("touch") {
		let touch = event.dyn_ref::<TouchEvent>()?.touches().get(0)?;
		return Some((touch.client_x() as f64, touch.client_y() as f64));
	}
	event
		.dyn_ref::<MouseEvent>()
		.map(|m| (m.client_x() as f64, m.client_y() as f64))
}
