//! Leptos component wrapping the network canvas.
//!
//! The component only renders the `<canvas>`; once it is mounted an effect
//! hands it to [`activate`], which owns sizing, input and the animation loop.
//! The handle lives in the component's reactive owner, so unmounting drops it
//! and the frame loop shuts down with it.

use leptos::prelude::*;
use log::debug;
use web_sys::HtmlCanvasElement;

use super::config::NetworkConfig;
use super::web::{NetworkHandle, activate};

/// Called with the diagnostic handle once the network is live.
pub type ReadyCallback = Box<dyn Fn(NetworkHandle)>;

/// Animated particle network filling its parent element.
///
/// Place it as the first child of a `.hero` section; the hero's background
/// image, when readable, tints the particles.
#[component]
pub fn NetworkCanvas(
	#[prop(optional)] config: Option<NetworkConfig>,
	#[prop(optional)] on_ready: Option<ReadyCallback>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let handle = StoredValue::new_local(None::<NetworkHandle>);

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if handle.with_value(Option::is_some) {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(active) = activate(canvas, config.clone().unwrap_or_default()) else {
			return;
		};
		debug!("hero-network: canvas mounted");
		if let Some(ready) = &on_ready {
			ready(active.clone());
		}
		handle.set_value(Some(active));
	});

	on_cleanup(move || {
		if let Some(active) = handle.try_update_value(Option::take).flatten() {
			active.stop();
			debug!("hero-network: canvas unmounted");
		}
	});

	view! {
		<canvas
			node_ref=canvas_ref
			class="network-canvas"
			aria-hidden="true"
			style="position: absolute; inset: 0; display: block; pointer-events: none;"
		/>
	}
}
