//! Colors and the fallback palette.
//!
//! When the hero image cannot be sampled every link, halo and core is painted
//! from a [`Palette`]. Sampled colors reuse [`Color`] so both paths share the
//! same alpha handling.

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
	/// Alpha in `[0, 1]`.
	pub a: f64,
}

impl Color {
	/// Opaque color.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Color with alpha.
	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Same channels, alpha clamped into `[0, 1]`.
	pub fn with_alpha(self, a: f64) -> Self {
		Self {
			a: a.clamp(0.0, 1.0),
			..self
		}
	}

	/// Lighten the color by a factor (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 + (255.0 - self.r as f64) * f) as u8,
			g: (self.g as f64 + (255.0 - self.g as f64) * f) as u8,
			b: (self.b as f64 + (255.0 - self.b as f64) * f) as u8,
			a: self.a,
		}
	}

	/// CSS color string: hex when opaque, `rgba()` otherwise.
	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {:.4})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Fixed colors used whenever no sampled color is available.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
	/// Link stroke color; alpha is replaced per link.
	pub link: Color,
	/// Halo gradient color; alpha is replaced per gradient stop.
	pub halo: Color,
	/// Solid core color.
	pub core: Color,
}

impl Palette {
	/// Cool cyan links with near-white cores (default)
	pub fn ice() -> Self {
		Self {
			link: Color::rgb(140, 200, 255),
			halo: Color::rgb(150, 210, 255),
			core: Color::rgb(235, 245, 255),
		}
	}

	/// Warm amber variant for light-on-dark art
	pub fn ember() -> Self {
		Self {
			link: Color::rgb(255, 186, 130),
			halo: Color::rgb(255, 170, 110),
			core: Color::rgb(255, 240, 225),
		}
	}

	/// Look up a palette by name, as used in page config.
	pub fn named(name: &str) -> Option<Self> {
		match name {
			"ice" => Some(Self::ice()),
			"ember" => Some(Self::ember()),
			_ => None,
		}
	}
}

impl Default for Palette {
	fn default() -> Self {
		Self::ice()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn with_alpha_keeps_channels_and_clamps() {
		let c = Color::rgb(10, 20, 30).with_alpha(1.7);
		assert_eq!((c.r, c.g, c.b), (10, 20, 30));
		assert_eq!(c.a, 1.0);
		assert_eq!(Color::rgb(1, 2, 3).with_alpha(-0.5).a, 0.0);
	}

	#[test]
	fn css_uses_hex_when_opaque() {
		assert_eq!(Color::rgb(255, 0, 16).to_css(), "#ff0010");
		assert_eq!(
			Color::rgba(140, 200, 255, 0.25).to_css(),
			"rgba(140, 200, 255, 0.2500)"
		);
	}

	#[test]
	fn lighten_moves_towards_white() {
		let c = Color::rgb(100, 0, 200).lighten(0.5);
		assert_eq!((c.r, c.g, c.b), (177, 127, 227));
	}

	#[test]
	fn named_palettes() {
		assert_eq!(Palette::named("ember"), Some(Palette::ember()));
		assert_eq!(Palette::named("nope"), None);
		assert_eq!(Palette::default(), Palette::ice());
	}
}
