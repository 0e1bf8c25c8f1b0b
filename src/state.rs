//! Per-tick runtime output state and the resource-catalog interface.

use serde::{Deserialize, Serialize};

use crate::value::{PositionDelta, ResourceRef, Rotation, ScaleTriple};

/// Sizes of the index-addressable resource catalogs owned by the
/// surrounding sprite container.
///
/// The interpreter only ever consumes catalogs by integer index; it never
/// touches the handles themselves. An out-of-range index resolves to "no
/// image" / "default palette" / "no parent" rather than erroring, matching
/// the original engine. The default bounds are unbounded, which keeps every
/// authored index as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogBounds {
	/// Number of image handles in the owning sprite.
	pub images: usize,
	/// Number of palette handles in the owning sprite.
	pub palettes: usize,
	/// Number of sibling animated parts.
	pub parts: usize,
}

impl Default for CatalogBounds {
	fn default() -> Self {
		Self::unbounded()
	}
}

impl CatalogBounds {
	/// Creates bounds from concrete catalog sizes.
	pub fn new(images: usize, palettes: usize, parts: usize) -> Self {
		Self {
			images,
			palettes,
			parts,
		}
	}

	/// Bounds that accept any index.
	pub fn unbounded() -> Self {
		Self {
			images: usize::MAX,
			palettes: usize::MAX,
			parts: usize::MAX,
		}
	}

	/// Resolves an image operand against the image catalog.
	pub fn resolve_image(&self, image: ResourceRef) -> Option<u16> {
		image.index().filter(|&index| (index as usize) < self.images)
	}

	/// Resolves a palette operand against the palette catalog.
	pub fn resolve_palette(&self, palette: ResourceRef) -> Option<u16> {
		palette.index().filter(|&index| (index as usize) < self.palettes)
	}

	/// Resolves a parent part index against the part catalog.
	pub fn resolve_parent(&self, part: u8) -> Option<u8> {
		((part as usize) < self.parts).then_some(part)
	}
}

/// Computed per-tick state of one animated part.
///
/// Both interpreters mutate one of these in place each tick; the external
/// renderer reads it after `step()`. The state is recreated from defaults
/// on `reset()` and has no lifecycle of its own.
///
/// Position, rotation, and scale are transient: they snap back to identity
/// at the start of every non-waiting step and only persist across ticks
/// while the interpreter is holding on a Wait. Image, palette, parent, and
/// the notify value persist until overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeState {
	/// Active image catalog index, if any.
	pub image: Option<u16>,
	/// Active palette catalog index; `None` means the default palette.
	pub palette: Option<u16>,
	/// Parent part index, if the part is linked to a sibling.
	pub parent: Option<u8>,
	/// Position offset for this tick.
	pub position: PositionDelta,
	/// Rotation for this tick, in degrees.
	pub rotation: Rotation,
	/// Scale for this tick, in percent per axis.
	pub scale: ScaleTriple,
	/// Last value written by a `SetNotify` instruction.
	pub notify: u8,
	/// Last value written by a `SetUnknown` instruction.
	pub unknown: u8,
	/// Set when a backward branch cycles without a real hold (see the
	/// interpreter documentation); cleared only by `reset()`.
	pub complete: bool,

	/// Remaining delay, in half-ticks.
	pub(crate) delay: u16,
	/// Remaining Loop repeats.
	pub(crate) repeat: u16,
	/// Keyframes executed since the last Goto.
	pub(crate) keys_since_branch: u32,
}

impl RuntimeState {
	/// Creates a state with all defaults (scale at 100%).
	pub fn new() -> Self {
		Self::default()
	}

	/// Snaps the transient transform fields back to identity.
	pub(crate) fn reset_transients(&mut self) {
		self.position = PositionDelta::default();
		self.rotation = Rotation::default();
		self.scale = ScaleTriple::default();
	}

	/// Remaining hold time of the current Wait, in half-ticks.
	pub fn remaining_delay(&self) -> u16 {
		self.delay
	}

	/// Remaining repeats of the innermost active Loop.
	pub fn remaining_repeats(&self) -> u16 {
		self.repeat
	}

	/// Keyframes executed since the last Goto was taken.
	pub fn keyframes_since_branch(&self) -> u32 {
		self.keys_since_branch
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_state() {
		let state = RuntimeState::new();
		assert_eq!(state.image, None);
		assert_eq!(state.palette, None);
		assert_eq!(state.parent, None);
		assert!(state.position.is_identity());
		assert!(state.rotation.is_zero());
		assert!(state.scale.is_default());
		assert!(!state.complete);
	}

	#[test]
	fn test_unbounded_catalog_keeps_indices() {
		let bounds = CatalogBounds::default();
		assert_eq!(bounds.resolve_image(ResourceRef::Index(9999)), Some(9999));
		assert_eq!(bounds.resolve_image(ResourceRef::None), None);
	}

	#[test]
	fn test_out_of_range_resolves_to_none() {
		let bounds = CatalogBounds::new(4, 2, 3);
		assert_eq!(bounds.resolve_image(ResourceRef::Index(3)), Some(3));
		assert_eq!(bounds.resolve_image(ResourceRef::Index(4)), None);
		assert_eq!(bounds.resolve_palette(ResourceRef::Index(2)), None);
		assert_eq!(bounds.resolve_parent(2), Some(2));
		assert_eq!(bounds.resolve_parent(3), None);
	}

	#[test]
	fn test_reset_transients() {
		let mut state = RuntimeState::new();
		state.position = PositionDelta::new(true, 1, 2, 3);
		state.rotation = Rotation::new(90, 0, 0);
		state.scale = ScaleTriple::uniform(50);
		state.image = Some(7);

		state.reset_transients();
		assert!(state.position.is_identity());
		assert!(state.rotation.is_zero());
		assert!(state.scale.is_default());
		// Resource state is not transient.
		assert_eq!(state.image, Some(7));
	}
}
