//! Small shared records: pointer state, run state and frame statistics.

use std::fmt;

/// Where the pointer is and what it is doing, in canvas-local coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerState {
	/// Canvas-local horizontal position.
	pub x: f64,
	/// Canvas-local vertical position.
	pub y: f64,
	/// Pointer is over the interactive region.
	pub active: bool,
	/// Primary button or touch is held down.
	pub engaged: bool,
}

/// Lifecycle of one activation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunState {
	/// Not started yet.
	#[default]
	Idle,
	/// Sizing and generating before the first paint.
	Starting,
	/// Animated frame loop.
	Running,
	/// Single static paint, no frame loop.
	ReducedStatic,
	/// Stopped until `start` is called again.
	Stopped,
}

impl RunState {
	/// Whether a run is in progress (animated or static).
	pub fn is_active(self) -> bool {
		matches!(self, RunState::Running | RunState::ReducedStatic)
	}
}

impl fmt::Display for RunState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			RunState::Idle => "idle",
			RunState::Starting => "starting",
			RunState::Running => "running",
			RunState::ReducedStatic => "reduced-static",
			RunState::Stopped => "stopped",
		};
		f.write_str(name)
	}
}

/// What the last render pass drew.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
	/// Particles drawn.
	pub particles: usize,
	/// Links drawn.
	pub links: usize,
}
