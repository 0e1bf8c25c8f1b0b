//! Keyframe (grouped) program representation.
//!
//! Where the linear model mirrors the instruction stream 1:1, the keyframe
//! model bundles every run of state changes that happen on the same tick,
//! together with the Wait that holds them, into a single [`Keyframe`]. The
//! result is the representation an editor timeline works with: one element
//! per visual "pose", with parent links, notifications, and branches
//! standing alone between poses.
//!
//! Each stateful field of a keyframe is independently optional, so "not
//! set" (inherit whatever the part currently shows) is distinguishable
//! from "explicitly cleared" (`ResourceRef::None`). A keyframe with
//! duration 0 is a *fragment*: it carries data, and its resource fields
//! still apply when executed, but its transform fields never do - it is a
//! marker, not a timed pose.
//!
//! Branches reference keyframes by stable [`KeyId`], never by position, so
//! reordering or deleting elements can at worst leave a branch dangling
//! ("missing" in inspection output, fatal only when encoding).
//!
//! # Examples
//!
//! ```
//! use partanim::keyframe::{Keyframe, KeyframeElement, KeyframeProgram};
//! use partanim::value::ResourceRef;
//!
//! let mut program = KeyframeProgram::new();
//!
//! let mut pose = Keyframe::new("idle", 10);
//! pose.image = Some(ResourceRef::Index(0));
//! let idle = program.push_keyframe(pose);
//!
//! // Loop back to the pose forever.
//! program.push(KeyframeElement::Goto { target: idle });
//!
//! assert_eq!(program.len(), 2);
//! assert_eq!(program.key_index(idle), Some(0));
//! ```

pub mod interpreter;

use serde::{Deserialize, Serialize};

use crate::value::{PositionDelta, ResourceRef, Rotation, ScaleTriple};

pub use interpreter::KeyframeInterpreter;

/// Stable identity of a [`Keyframe`] within one program.
///
/// Allocated by the owning [`KeyframeProgram`] and never reused.
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct KeyId(u32);

impl KeyId {
	/// Reconstructs an id from its raw value.
	pub fn from_raw(raw: u32) -> Self {
		Self(raw)
	}

	/// Returns the raw id value.
	pub fn into_raw(self) -> u32 {
		self.0
	}
}

impl std::fmt::Display for KeyId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "K{}", self.0)
	}
}

/// One timed pose of an animated part.
///
/// Every field except `name` and `duration` is optional; absent fields
/// leave the corresponding runtime state untouched when the keyframe
/// executes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyframe {
	/// Display name; becomes the label name when converted to linear form.
	pub name: String,
	/// Hold duration in ticks (0..=4095). Duration 0 marks a fragment.
	pub duration: u16,
	/// Image to select, if set. `Some(ResourceRef::None)` explicitly
	/// clears the image.
	pub image: Option<ResourceRef>,
	/// Palette to select, if set. `Some(ResourceRef::None)` explicitly
	/// restores the default palette.
	pub palette: Option<ResourceRef>,
	/// Value for the engine's unidentified state byte, if set.
	pub unknown: Option<u8>,
	/// Position offset for the hold, if set.
	pub position: Option<PositionDelta>,
	/// Rotation for the hold, if set.
	pub rotation: Option<Rotation>,
	/// Scale for the hold, if set.
	pub scale: Option<ScaleTriple>,
}

impl Keyframe {
	/// Creates a keyframe with no fields set.
	pub fn new(name: impl Into<String>, duration: u16) -> Self {
		Self {
			name: name.into(),
			duration,
			..Self::default()
		}
	}

	/// Returns `true` if this is a zero-duration fragment.
	pub fn is_fragment(&self) -> bool {
		self.duration == 0
	}

	/// Returns `true` if no optional field is set.
	pub fn is_empty(&self) -> bool {
		self.image.is_none()
			&& self.palette.is_none()
			&& self.unknown.is_none()
			&& self.position.is_none()
			&& self.rotation.is_none()
			&& self.scale.is_none()
	}
}

/// One element of a keyframe program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyframeElement {
	/// A timed pose (or a zero-duration fragment).
	Keyframe {
		/// Stable identity referenced by `Goto`/`Loop`.
		id: KeyId,
		/// The pose data.
		key: Keyframe,
	},
	/// Link the part to a sibling part.
	Parent {
		/// Sibling part index.
		part: u8,
	},
	/// Publish a notification byte to the surrounding animation.
	Notify {
		/// Notification value.
		value: u8,
	},
	/// Unconditional branch to a keyframe.
	Goto {
		/// Target keyframe.
		target: KeyId,
	},
	/// Bounded branch to a keyframe; the body runs `count + 1` times.
	Loop {
		/// Target keyframe.
		target: KeyId,
		/// Extra repeats.
		count: u16,
	},
}

impl KeyframeElement {
	/// Returns the target keyframe of a branch element.
	pub fn branch_target(&self) -> Option<KeyId> {
		match self {
			Self::Goto {
				target,
			}
			| Self::Loop {
				target,
				..
			} => Some(*target),
			_ => None,
		}
	}
}

/// A complete keyframe animation program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyframeProgram {
	elements: Vec<KeyframeElement>,
	next_key: u32,
}

impl KeyframeProgram {
	/// Creates an empty program.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a program from pre-assembled elements.
	///
	/// The internal key-id allocator starts past the highest id present in
	/// `elements` (keyframes and branch targets alike), so subsequently
	/// allocated keys never collide.
	pub fn from_elements(elements: Vec<KeyframeElement>) -> Self {
		let next_key = elements
			.iter()
			.filter_map(|element| match element {
				KeyframeElement::Keyframe {
					id,
					..
				} => Some(id.0),
				_ => element.branch_target().map(|id| id.0),
			})
			.max()
			.map_or(0, |max| max + 1);
		Self {
			elements,
			next_key,
		}
	}

	/// Returns the elements in program order.
	pub fn elements(&self) -> &[KeyframeElement] {
		&self.elements
	}

	/// Returns mutable access to the elements for structural edits.
	///
	/// After editing, call [`unresolved_branches`] to re-validate branch
	/// targets.
	///
	/// [`unresolved_branches`]: Self::unresolved_branches
	pub fn elements_mut(&mut self) -> &mut Vec<KeyframeElement> {
		&mut self.elements
	}

	/// Number of elements.
	pub fn len(&self) -> usize {
		self.elements.len()
	}

	/// Returns `true` if the program has no elements.
	pub fn is_empty(&self) -> bool {
		self.elements.is_empty()
	}

	/// Appends a non-keyframe element.
	pub fn push(&mut self, element: KeyframeElement) {
		self.elements.push(element);
	}

	/// Appends a keyframe, allocating its stable id.
	pub fn push_keyframe(&mut self, key: Keyframe) -> KeyId {
		let id = self.allocate_key();
		self.elements.push(KeyframeElement::Keyframe {
			id,
			key,
		});
		id
	}

	/// Allocates a fresh keyframe id without inserting an element.
	///
	/// A branch to an id that never receives a keyframe stays dangling,
	/// which the model tolerates (it renders as "missing").
	pub fn allocate_key(&mut self) -> KeyId {
		let id = KeyId(self.next_key);
		self.next_key += 1;
		id
	}

	/// Returns the element index of the keyframe with the given id.
	pub fn key_index(&self, id: KeyId) -> Option<usize> {
		self.elements.iter().position(|element| {
			matches!(element, KeyframeElement::Keyframe { id: key, .. } if *key == id)
		})
	}

	/// Returns the number of keyframe elements (fragments included).
	pub fn keyframe_count(&self) -> usize {
		self.elements
			.iter()
			.filter(|element| {
				matches!(
					element,
					KeyframeElement::Keyframe {
						..
					}
				)
			})
			.count()
	}

	/// Re-validation pass: indices of branch elements whose target
	/// keyframe no longer exists.
	pub fn unresolved_branches(&self) -> Vec<usize> {
		self.elements
			.iter()
			.enumerate()
			.filter_map(|(index, element)| {
				element.branch_target().and_then(|target| {
					self.key_index(target).is_none().then_some(index)
				})
			})
			.collect()
	}

	fn key_name(&self, id: KeyId) -> Option<&str> {
		self.elements.iter().find_map(|element| match element {
			KeyframeElement::Keyframe {
				id: key,
				key: frame,
			} if *key == id => Some(frame.name.as_str()),
			_ => None,
		})
	}
}

impl std::fmt::Display for KeyframeProgram {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		for element in &self.elements {
			match element {
				KeyframeElement::Keyframe {
					key,
					..
				} => {
					if key.is_fragment() {
						writeln!(f, "fragment {}", key.name)?;
					} else {
						writeln!(f, "keyframe {} ({} ticks)", key.name, key.duration)?;
					}
				}
				KeyframeElement::Parent {
					part,
				} => writeln!(f, "parent {part}")?,
				KeyframeElement::Notify {
					value,
				} => writeln!(f, "notify {value}")?,
				KeyframeElement::Goto {
					target,
				} => {
					writeln!(f, "goto {}", self.key_name(*target).unwrap_or("<missing>"))?;
				}
				KeyframeElement::Loop {
					target,
					count,
				} => writeln!(
					f,
					"loop {} x{}",
					self.key_name(*target).unwrap_or("<missing>"),
					count
				)?,
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_push_keyframe_allocates_sequential_ids() {
		let mut program = KeyframeProgram::new();
		let first = program.push_keyframe(Keyframe::new("a", 1));
		let second = program.push_keyframe(Keyframe::new("b", 2));

		assert_ne!(first, second);
		assert_eq!(program.key_index(first), Some(0));
		assert_eq!(program.key_index(second), Some(1));
		assert_eq!(program.keyframe_count(), 2);
	}

	#[test]
	fn test_fragment_detection() {
		assert!(Keyframe::new("marker", 0).is_fragment());
		assert!(!Keyframe::new("pose", 1).is_fragment());
	}

	#[test]
	fn test_unresolved_branch_after_delete() {
		let mut program = KeyframeProgram::new();
		let target = program.push_keyframe(Keyframe::new("a", 1));
		program.push(KeyframeElement::Goto {
			target,
		});
		assert!(program.unresolved_branches().is_empty());

		program.elements_mut().remove(0);
		assert_eq!(program.unresolved_branches(), vec![0]);
		assert!(program.to_string().contains("<missing>"));
	}

	#[test]
	fn test_dangling_allocation_is_tolerated() {
		let mut program = KeyframeProgram::new();
		let dangling = program.allocate_key();
		program.push(KeyframeElement::Goto {
			target: dangling,
		});
		assert_eq!(program.unresolved_branches(), vec![0]);
	}

	#[test]
	fn test_json_round_trip() {
		// Keyframe programs are editor documents; they persist as JSON.
		let mut program = KeyframeProgram::new();
		let mut key = Keyframe::new("idle", 10);
		key.image = Some(crate::value::ResourceRef::Index(3));
		let idle = program.push_keyframe(key);
		program.push(KeyframeElement::Loop {
			target: idle,
			count: 2,
		});

		let json = serde_json::to_string(&program).expect("serialize should succeed");
		let reloaded: KeyframeProgram =
			serde_json::from_str(&json).expect("deserialize should succeed");
		assert_eq!(reloaded, program);

		// The id allocator state survives, so new keys never collide.
		let mut reloaded = reloaded;
		assert_ne!(reloaded.allocate_key(), idle);
	}
}
