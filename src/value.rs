//! Operand value types shared by the instruction codec, the program models,
//! and the runtime state.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Reference to an entry of an externally-owned resource catalog.
///
/// Image and palette operands are 12-bit sign-extended values: a negative
/// operand means "no image" / "default palette", anything else is an index
/// into the owning sprite's catalog. Out-of-range indices degrade to
/// [`ResourceRef::None`] when resolved against [`CatalogBounds`] at runtime,
/// they are not an error.
///
/// [`CatalogBounds`]: crate::state::CatalogBounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceRef {
	/// No resource ("none" image / "default" palette).
	None,
	/// Index into the owning sprite's catalog.
	Index(u16),
}

impl ResourceRef {
	/// Decodes a 12-bit sign-extended operand into a resource reference.
	pub fn from_operand(operand: u16) -> Self {
		let value = sign_extend_12(operand);
		if value < 0 {
			Self::None
		} else {
			Self::Index(value as u16)
		}
	}

	/// Encodes the reference back into a 12-bit operand.
	///
	/// [`ResourceRef::None`] encodes as 0xFFF (-1); indices are masked to
	/// 12 bits.
	pub fn to_operand(self) -> u16 {
		match self {
			Self::None => constants::OPERAND_MASK,
			Self::Index(index) => index & constants::OPERAND_MASK,
		}
	}

	/// Returns the catalog index, if any.
	pub fn index(self) -> Option<u16> {
		match self {
			Self::None => None,
			Self::Index(index) => Some(index),
		}
	}
}

impl std::fmt::Display for ResourceRef {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::None => write!(f, "none"),
			Self::Index(index) => write!(f, "#{index}"),
		}
	}
}

/// Axis selector of a `SetScale` instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleMode {
	/// Apply the percentage to all three axes.
	Uniform,
	/// Apply the percentage to the X axis only.
	X,
	/// Apply the percentage to the Y axis only.
	Y,
	/// Apply the percentage to the Z axis only.
	Z,
}

impl ScaleMode {
	/// Decodes the 12-bit mode operand. Values above 3 are not a scale mode.
	pub fn from_operand(operand: u16) -> Option<Self> {
		match operand {
			0 => Some(Self::Uniform),
			1 => Some(Self::X),
			2 => Some(Self::Y),
			3 => Some(Self::Z),
			_ => None,
		}
	}

	/// Encodes the mode back into its operand value.
	pub fn to_operand(self) -> u16 {
		match self {
			Self::Uniform => 0,
			Self::X => 1,
			Self::Y => 2,
			Self::Z => 3,
		}
	}
}

/// Per-tick position offset of an animated part.
///
/// The flag bit is carried verbatim from the instruction stream; the
/// original engine uses it to switch the interpretation of the offset and
/// the runtime state preserves it for the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionDelta {
	/// Interpretation flag (bit 0 of the instruction's first word).
	pub flag: bool,
	/// X offset.
	pub dx: i16,
	/// Y offset.
	pub dy: i16,
	/// Z offset.
	pub dz: i16,
}

impl PositionDelta {
	/// Creates a position delta.
	pub fn new(flag: bool, dx: i16, dy: i16, dz: i16) -> Self {
		Self {
			flag,
			dx,
			dy,
			dz,
		}
	}

	/// Returns `true` if this delta leaves the part where it is.
	pub fn is_identity(&self) -> bool {
		*self == Self::default()
	}
}

/// Per-tick rotation of an animated part, in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rotation {
	/// Rotation around the X axis.
	pub rx: i16,
	/// Rotation around the Y axis.
	pub ry: i16,
	/// Rotation around the Z axis.
	pub rz: i16,
}

impl Rotation {
	/// Creates a rotation.
	pub fn new(rx: i16, ry: i16, rz: i16) -> Self {
		Self {
			rx,
			ry,
			rz,
		}
	}

	/// Returns `true` if all three angles are zero.
	pub fn is_zero(&self) -> bool {
		*self == Self::default()
	}
}

/// Per-tick scale of an animated part, in percent per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleTriple {
	/// X-axis scale percentage.
	pub x: u16,
	/// Y-axis scale percentage.
	pub y: u16,
	/// Z-axis scale percentage.
	pub z: u16,
}

impl Default for ScaleTriple {
	fn default() -> Self {
		Self {
			x: constants::SCALE_DEFAULT,
			y: constants::SCALE_DEFAULT,
			z: constants::SCALE_DEFAULT,
		}
	}
}

impl ScaleTriple {
	/// Creates a per-axis scale.
	pub fn new(x: u16, y: u16, z: u16) -> Self {
		Self {
			x,
			y,
			z,
		}
	}

	/// Creates a uniform scale.
	pub fn uniform(percent: u16) -> Self {
		Self::new(percent, percent, percent)
	}

	/// Returns `true` if every axis sits at the default 100%.
	pub fn is_default(&self) -> bool {
		*self == Self::default()
	}

	/// Returns `true` if all three axes share the same percentage.
	pub fn is_uniform(&self) -> bool {
		self.x == self.y && self.y == self.z
	}

	/// Applies one `SetScale` instruction to this triple.
	pub fn apply(&mut self, mode: ScaleMode, percent: u16) {
		match mode {
			ScaleMode::Uniform => *self = Self::uniform(percent),
			ScaleMode::X => self.x = percent,
			ScaleMode::Y => self.y = percent,
			ScaleMode::Z => self.z = percent,
		}
	}
}

/// Sign-extends a 12-bit operand to an `i16`.
pub(crate) fn sign_extend_12(operand: u16) -> i16 {
	(((operand & constants::OPERAND_MASK) << 4) as i16) >> 4
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_sign_extend_12() {
		assert_eq!(sign_extend_12(0x000), 0);
		assert_eq!(sign_extend_12(0x001), 1);
		assert_eq!(sign_extend_12(0x7FF), 2047);
		assert_eq!(sign_extend_12(0x800), -2048);
		assert_eq!(sign_extend_12(0xFFF), -1);
	}

	#[test]
	fn test_resource_ref_from_operand() {
		assert_eq!(ResourceRef::from_operand(0x000), ResourceRef::Index(0));
		assert_eq!(ResourceRef::from_operand(0x001), ResourceRef::Index(1));
		assert_eq!(ResourceRef::from_operand(0xFFF), ResourceRef::None);
		assert_eq!(ResourceRef::from_operand(0x800), ResourceRef::None);
	}

	#[test]
	fn test_resource_ref_round_trip() {
		assert_eq!(ResourceRef::None.to_operand(), 0xFFF);
		assert_eq!(ResourceRef::Index(42).to_operand(), 42);
		assert_eq!(ResourceRef::from_operand(ResourceRef::Index(42).to_operand()), ResourceRef::Index(42));
	}

	#[test]
	fn test_scale_mode_operands() {
		for mode in [ScaleMode::Uniform, ScaleMode::X, ScaleMode::Y, ScaleMode::Z] {
			assert_eq!(ScaleMode::from_operand(mode.to_operand()), Some(mode));
		}
		assert_eq!(ScaleMode::from_operand(4), None);
	}

	#[test]
	fn test_scale_triple_apply() {
		let mut scale = ScaleTriple::default();
		assert!(scale.is_default());

		scale.apply(ScaleMode::X, 150);
		assert_eq!(scale, ScaleTriple::new(150, 100, 100));
		assert!(!scale.is_uniform());

		scale.apply(ScaleMode::Uniform, 80);
		assert_eq!(scale, ScaleTriple::uniform(80));
		assert!(scale.is_uniform());
	}
}
