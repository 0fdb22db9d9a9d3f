use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Sub};

/// Four-axis actor pose: lean, turn, twist, tilt (degrees)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pose([f64; 4]);

impl Pose {
	pub const ZERO: Self = Self([0.0; 4]);

	pub const fn new(axes: [f64; 4]) -> Self {
		Self(axes)
	}

	pub const fn lean(&self) -> f64 {
		self.0[0]
	}

	pub const fn turn(&self) -> f64 {
		self.0[1]
	}

	pub const fn twist(&self) -> f64 {
		self.0[2]
	}

	pub const fn tilt(&self) -> f64 {
		self.0[3]
	}

	pub const fn axes(&self) -> [f64; 4] {
		self.0
	}

	/// Component-wise comparison within `tolerance`
	pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
		self.0.iter().zip(other.0.iter()).all(|(a, b)| (a - b).abs() <= tolerance)
	}

	fn map2(self, other: Self, f: impl Fn(f64, f64) -> f64) -> Self {
		let mut out = [0.0; 4];
		for (i, slot) in out.iter_mut().enumerate() {
			*slot = f(self.0[i], other.0[i]);
		}
		Self(out)
	}
}

impl Add for Pose {
	type Output = Self;

	fn add(self, rhs: Self) -> Self {
		self.map2(rhs, |a, b| a + b)
	}
}

impl Sub for Pose {
	type Output = Self;

	fn sub(self, rhs: Self) -> Self {
		self.map2(rhs, |a, b| a - b)
	}
}

impl Div<f64> for Pose {
	type Output = Self;

	fn div(self, rhs: f64) -> Self {
		Self(self.0.map(|axis| axis / rhs))
	}
}
