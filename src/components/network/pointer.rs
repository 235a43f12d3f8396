//! Mouse and touch input folded into a single [`PointerState`].

use super::types::PointerState;
use super::viewport::Viewport;

/// Canvas bounding box in client coordinates (as from `getBoundingClientRect`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CanvasRect {
	/// Left edge in client pixels.
	pub left: f64,
	/// Top edge in client pixels.
	pub top: f64,
	/// Width in CSS pixels.
	pub width: f64,
	/// Height in CSS pixels.
	pub height: f64,
}

/// Owns the pointer state; everything else only reads it.
#[derive(Clone, Debug, Default)]
pub struct PointerController {
	state: PointerState,
}

impl PointerController {
	/// Current pointer state.
	pub fn state(&self) -> &PointerState {
		&self.state
	}

	/// `mousemove` / `touchmove` (first touch point).
	pub fn on_move(&mut self, client_x: f64, client_y: f64, rect: CanvasRect) {
		let (x, y) = local(client_x, client_y, rect);
		self.state.x = x;
		self.state.y = y;
		self.state.active = true;
	}

	/// `pointerdown`: engages at the pressed position.
	pub fn on_down(&mut self, client_x: f64, client_y: f64, rect: CanvasRect) {
		self.on_move(client_x, client_y, rect);
		self.state.engaged = true;
	}

	/// `pointerup`
	pub fn on_up(&mut self) {
		self.state.engaged = false;
	}

	/// `mouseleave` / `touchend`
	pub fn on_leave(&mut self) {
		self.state = PointerState::default();
	}

	/// Keep the last position inside a (possibly smaller) new viewport.
	pub fn clamp_to(&mut self, viewport: &Viewport) {
		let (x, y) = viewport.clamp_point(self.state.x, self.state.y);
		self.state.x = x;
		self.state.y = y;
	}
}

fn local(client_x: f64, client_y: f64, rect: CanvasRect) -> (f64, f64) {
	(
		(client_x - rect.left).clamp(0.0, rect.width.max(0.0)),
		(client_y - rect.top).clamp(0.0, rect.height.max(0.0)),
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	const RECT: CanvasRect = CanvasRect {
		left: 20.0,
		top: 100.0,
		width: 400.0,
		height: 200.0,
	};

	#[test]
	fn move_converts_to_canvas_space_and_clamps() {
		let mut pointer = PointerController::default();
		pointer.on_move(120.0, 150.0, RECT);
		assert_eq!(
			*pointer.state(),
			PointerState {
				x: 100.0,
				y: 50.0,
				active: true,
				engaged: false
			}
		);
		pointer.on_move(900.0, 0.0, RECT);
		assert_eq!((pointer.state().x, pointer.state().y), (400.0, 0.0));
	}

	#[test]
	fn press_and_release() {
		let mut pointer = PointerController::default();
		pointer.on_down(30.0, 110.0, RECT);
		assert!(pointer.state().engaged && pointer.state().active);
		assert_eq!((pointer.state().x, pointer.state().y), (10.0, 10.0));
		pointer.on_up();
		assert!(!pointer.state().engaged);
		assert!(pointer.state().active);
	}

	#[test]
	fn leave_resets_to_inactive() {
		let mut pointer = PointerController::default();
		pointer.on_down(30.0, 110.0, RECT);
		pointer.on_leave();
		assert_eq!(*pointer.state(), PointerState::default());
	}

	#[test]
	fn clamp_to_shrunk_viewport() {
		let mut pointer = PointerController::default();
		pointer.on_move(420.0, 300.0, RECT);
		pointer.clamp_to(&Viewport::fit(150.0, 80.0, 1.0));
		assert_eq!((pointer.state().x, pointer.state().y), (150.0, 80.0));
	}
}
