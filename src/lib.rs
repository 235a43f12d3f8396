//! hero-network: animated, pointer-reactive particle network for hero sections.
//!
//! This crate provides a WASM canvas component that draws drifting particles
//! linked by proximity lines, reacting to the pointer and tinted from the
//! hero's background image.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, debug, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, HtmlScriptElement, Window};

pub mod components;

pub use components::network::{
	NetworkCanvas, NetworkConfig, NetworkError, NetworkHandle, RunState, activate,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("hero-network: logging initialized");
}

/// Load overrides from a script element with id="network-config".
/// Expected format: a JSON object with camelCase [`NetworkConfig`] fields.
fn load_config() -> Option<NetworkConfig> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("network-config")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	match NetworkConfig::from_json(&json_text) {
		Ok(config) => {
			info!(
				"hero-network: loaded config ({} / {} nodes)",
				config.nodes_desktop, config.nodes_mobile
			);
			Some(config)
		}
		Err(e) => {
			warn!("hero-network: {}", NetworkError::from(e));
			None
		}
	}
}

/// Activate the network on an existing canvas, for pages not built with
/// Leptos. `selector` defaults to `canvas.network-canvas`.
#[wasm_bindgen(js_name = activateNetwork)]
pub fn activate_network(selector: Option<String>) -> Option<NetworkHandle> {
	let selector = selector.unwrap_or_else(|| "canvas.network-canvas".to_owned());
	let document = web_sys::window()?.document()?;
	let Some(element) = document.query_selector(&selector).ok().flatten() else {
		warn!("hero-network: no element matches {selector}");
		return None;
	};
	let canvas: HtmlCanvasElement = match element.dyn_into() {
		Ok(canvas) => canvas,
		Err(_) => {
			warn!("hero-network: {selector} is not a canvas");
			return None;
		}
	};
	activate(canvas, load_config().unwrap_or_default())
}

/// Main application component.
/// Loads config overrides from the DOM and renders the hero with its network.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let config = load_config().unwrap_or_default();
	// the run starts on the next frame, so counts are still empty here
	let on_ready: components::network::ReadyCallback = Box::new(|_: NetworkHandle| {
		debug!("hero-network: handle ready");
	});

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Network" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<section class="hero" style="position: relative; min-height: 100vh; overflow: hidden;">
			<NetworkCanvas config=config on_ready=on_ready />
			<div class="hero-content">
				<h1>"Connected"</h1>
				<p class="subtitle">"Move the pointer over the network. Press to pull it in."</p>
			</div>
		</section>
	}
}
