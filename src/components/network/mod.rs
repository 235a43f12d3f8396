//! Pointer-reactive particle network for a hero section.
//!
//! Particles drift inside the canvas, link to neighbours within a connect
//! distance and are pulled toward or pushed away from the pointer. Colors come
//! from the hero's background image when it can be read, otherwise from a
//! fixed palette.
//!
//! - [`lifecycle::Controller`] is the state machine (start/stop, frames,
//!   resize, visibility) and is generic over a [`render::Surface`] and a
//!   [`lifecycle::Host`] so it runs outside the browser in tests.
//! - [`web`] supplies the browser host and the [`NetworkHandle`] diagnostics.
//! - [`NetworkCanvas`] is the Leptos entry point.
//!
//! # Example
//!
//! ```ignore
//! use hero_network::NetworkCanvas;
//!
//! view! {
//!     <section class="hero">
//!         <NetworkCanvas />
//!         <h1>"Hello"</h1>
//!     </section>
//! }
//! ```

mod component;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod particles;
pub mod pointer;
pub mod render;
pub mod sampling;
pub mod simulation;
pub mod theme;
pub mod types;
pub mod viewport;
pub mod web;

pub use component::{NetworkCanvas, ReadyCallback};
pub use config::NetworkConfig;
pub use error::NetworkError;
pub use types::{PointerState, RunState};
pub use web::{NetworkHandle, activate};
