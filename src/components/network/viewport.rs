//! Canvas sizing and device-pixel-ratio scaling.
//!
//! All drawing happens in logical (CSS pixel) coordinates. The backing store
//! is `logical * dpr` pixels, and the surface installs a transform so callers
//! never see the difference.

/// Smallest logical width handed to the rest of the system.
pub const MIN_WIDTH: f64 = 100.0;
/// Smallest logical height handed to the rest of the system.
pub const MIN_HEIGHT: f64 = 60.0;

/// Logical and backing-store dimensions of the drawing surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	/// Logical width in CSS pixels.
	pub width: f64,
	/// Logical height in CSS pixels.
	pub height: f64,
	/// Device pixel ratio, never below 1.
	pub dpr: f64,
	/// Backing store width in device pixels.
	pub pixel_width: u32,
	/// Backing store height in device pixels.
	pub pixel_height: u32,
}

impl Viewport {
	/// Fit a viewport to a container's content box.
	///
	/// A collapsed or mid-layout container (zero, negative or NaN extent) is
	/// clamped up to the minimum usable size rather than rejected.
	pub fn fit(container_width: f64, container_height: f64, dpr: f64) -> Self {
		let width = usable(container_width).floor().max(MIN_WIDTH);
		let height = usable(container_height).floor().max(MIN_HEIGHT);
		let dpr = if dpr.is_finite() { dpr.max(1.0) } else { 1.0 };
		Self {
			width,
			height,
			dpr,
			pixel_width: (width * dpr).floor() as u32,
			pixel_height: (height * dpr).floor() as u32,
		}
	}

	/// Whether `(x, y)` lies within the logical bounds, inclusive.
	pub fn contains(&self, x: f64, y: f64) -> bool {
		(0.0..=self.width).contains(&x) && (0.0..=self.height).contains(&y)
	}

	/// Clamp a point into the logical bounds.
	pub fn clamp_point(&self, x: f64, y: f64) -> (f64, f64) {
		(x.clamp(0.0, self.width), y.clamp(0.0, self.height))
	}
}

impl Default for Viewport {
	fn default() -> Self {
		Self::fit(MIN_WIDTH, MIN_HEIGHT, 1.0)
	}
}

fn usable(extent: f64) -> f64 {
	if extent.is_finite() { extent } else { 0.0 }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn scales_backing_store_by_dpr() {
		let vp = Viewport::fit(1000.4, 500.9, 2.0);
		assert_eq!((vp.width, vp.height), (1000.0, 500.0));
		assert_eq!((vp.pixel_width, vp.pixel_height), (2000, 1000));
	}

	#[test]
	fn collapsed_container_is_clamped() {
		let vp = Viewport::fit(0.0, f64::NAN, 0.5);
		assert_eq!((vp.width, vp.height), (MIN_WIDTH, MIN_HEIGHT));
		assert_eq!(vp.dpr, 1.0);
		assert_eq!((vp.pixel_width, vp.pixel_height), (100, 60));
	}

	#[test]
	fn fit_is_idempotent() {
		assert_eq!(Viewport::fit(812.0, 433.0, 1.5), Viewport::fit(812.0, 433.0, 1.5));
	}

	#[test]
	fn clamp_point_stays_inside() {
		let vp = Viewport::fit(200.0, 100.0, 1.0);
		assert_eq!(vp.clamp_point(-5.0, 150.0), (0.0, 100.0));
		assert!(vp.contains(200.0, 0.0));
		assert!(!vp.contains(200.1, 0.0));
	}
}
