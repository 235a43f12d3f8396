//! Failure taxonomy for the network effect.
//!
//! None of these ever reach the page: activation failures abort quietly and
//! asset failures fall back to the fixed palette. They exist so that internal
//! steps can use `?` and the log line says what actually went wrong.

use wasm_bindgen::JsValue;

/// Everything that can go wrong while activating or sampling.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
	/// No `window`/`document` (not running in a browser).
	#[error("no browser window or document available")]
	MissingWindow,
	/// The canvas is detached, so there is no hero to size against.
	#[error("network canvas has no parent container")]
	MissingContainer,
	/// `getContext("2d")` returned nothing.
	#[error("2d drawing context unavailable")]
	MissingContext,
	/// The hero's computed `background-image` holds no `url(...)`.
	#[error("hero container has no background image")]
	NoBackgroundImage,
	/// The image failed to load or decode.
	#[error("failed to load background image {url}: {reason}")]
	ImageLoad { url: String, reason: String },
	/// `getImageData` threw, usually a tainted (cross-origin) canvas.
	#[error("pixel readback blocked for {url}: {reason}")]
	PixelReadBlocked { url: String, reason: String },
	/// Pixel readback returned an unexpected number of bytes.
	#[error("sample raster is {actual} bytes, expected {expected}")]
	RasterSize { expected: usize, actual: usize },
	/// Page-supplied config JSON did not parse.
	#[error("invalid network config: {0}")]
	Config(#[from] serde_json::Error),
	/// Any other thrown JS value.
	#[error("{0}")]
	Js(String),
}

impl From<JsValue> for NetworkError {
	fn from(value: JsValue) -> Self {
		Self::Js(describe(&value))
	}
}

/// Best-effort human readable form of a thrown JS value.
pub(crate) fn describe(value: &JsValue) -> String {
	value.as_string().unwrap_or_else(|| format!("{value:?}"))
}
