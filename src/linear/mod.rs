//! Linear (assembly-like) program representation.
//!
//! A [`LinearProgram`] mirrors the raw instruction stream 1:1: every
//! instruction becomes one element, in order, and every branch target
//! becomes a symbolic [`LinearElement::Label`] inserted at the target's
//! element boundary. Branches store a [`LabelId`] instead of a live
//! reference, so structural edits (insert/delete/reorder) can never leave
//! the program with a dangling pointer - at worst a branch references an id
//! with no surviving Label, which renders as "missing" and only becomes an
//! error if the program is encoded in that state.
//!
//! # Decoding
//!
//! Decoding scans the words left to right. Every distinct Goto/Loop target
//! offset reserves one Label, named from the caller-supplied name table
//! when present, otherwise synthesized from the raw offset. Labels land
//! immediately before the element starting at their offset; a target that
//! falls strictly inside a multi-word instruction lands immediately before
//! that instruction (never mid-instruction) and keeps its raw-offset name.
//!
//! # Examples
//!
//! ```
//! use partanim::linear::{LabelNames, LinearElement, LinearProgram};
//!
//! // SetImage(2), Wait(10), Goto 0x0000
//! let words = [0x1002, 0x000A, 0x2000];
//! let program = LinearProgram::decode(&words, &LabelNames::new())?;
//!
//! assert_eq!(program.len(), 4); // a Label was inserted at offset 0
//! assert!(matches!(program.elements()[0], LinearElement::Label { .. }));
//!
//! let (encoded, _names) = program.encode()?;
//! assert_eq!(encoded, words);
//! # Ok::<(), partanim::ScriptError>(())
//! ```

pub mod interpreter;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::ScriptError;
use crate::instruction::Instruction;
use crate::value::{PositionDelta, ResourceRef, Rotation, ScaleMode};

pub use interpreter::LinearInterpreter;

/// Advisory mapping from absolute word offsets to human-readable label
/// names. Offsets absent from the map are still valid branch targets and
/// receive synthetic hexadecimal names.
pub type LabelNames = BTreeMap<usize, String>;

/// Stable identity of a [`LinearElement::Label`] within one program.
///
/// Ids are allocated by the owning [`LinearProgram`] and are never reused,
/// so they stay valid across structural edits. A branch whose label was
/// deleted simply fails to resolve.
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LabelId(u32);

impl LabelId {
	/// Reconstructs an id from its raw value.
	pub fn from_raw(raw: u32) -> Self {
		Self(raw)
	}

	/// Returns the raw id value.
	pub fn into_raw(self) -> u32 {
		self.0
	}
}

impl std::fmt::Display for LabelId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "L{}", self.0)
	}
}

/// One element of a linear program.
///
/// The first nine variants mirror the wire instructions; `Label` is pure
/// metadata (it occupies zero words) and `Goto`/`Loop` reference labels
/// symbolically instead of by word offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinearElement {
	/// Hold the current state for `count` ticks.
	Wait {
		/// Hold duration (1..=4095).
		count: u16,
	},
	/// Select the part's active image.
	SetImage {
		/// Image catalog reference.
		image: ResourceRef,
	},
	/// Select the part's active palette.
	SetPalette {
		/// Palette catalog reference.
		palette: ResourceRef,
	},
	/// Set the part's position offset for the current hold.
	SetPosition {
		/// Offset and interpretation flag.
		position: PositionDelta,
	},
	/// Set the part's rotation for the current hold.
	SetRotation {
		/// Rotation in degrees.
		rotation: Rotation,
	},
	/// Set the part's scale for the current hold.
	SetScale {
		/// Axis selector.
		mode: ScaleMode,
		/// Scale percentage.
		percent: u16,
	},
	/// Link the part to a sibling part.
	SetParent {
		/// Sibling part index.
		part: u8,
	},
	/// Publish a notification byte to the surrounding animation.
	SetNotify {
		/// Notification value.
		value: u8,
	},
	/// Set the engine's unidentified state byte.
	SetUnknown {
		/// Raw byte value.
		value: u8,
	},
	/// Branch target marker. Occupies no words when encoded.
	Label {
		/// Stable identity referenced by `Goto`/`Loop`.
		id: LabelId,
		/// Human-readable name, possibly synthesized from a raw offset.
		name: String,
	},
	/// Unconditional branch to a label.
	Goto {
		/// Target label.
		target: LabelId,
	},
	/// Bounded branch to a label; the body runs `count + 1` times.
	Loop {
		/// Target label.
		target: LabelId,
		/// Extra repeats.
		count: u16,
	},
}

impl LinearElement {
	/// Number of words this element occupies when encoded.
	pub fn word_len(&self) -> usize {
		match self {
			Self::Label {
				..
			} => 0,
			Self::SetPosition {
				..
			} => 4,
			Self::SetRotation {
				..
			} => 3,
			Self::SetScale {
				..
			}
			| Self::Loop {
				..
			} => 2,
			_ => 1,
		}
	}

	/// Returns `true` for the branch elements (Goto and Loop).
	pub fn is_branch(&self) -> bool {
		matches!(
			self,
			Self::Goto {
				..
			} | Self::Loop {
				..
			}
		)
	}

	/// Returns the target label of a branch element.
	pub fn branch_target(&self) -> Option<LabelId> {
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

	/// Converts a non-branch, non-label element back into its wire
	/// instruction.
	pub fn as_instruction(&self) -> Option<Instruction> {
		let instruction = match *self {
			Self::Wait {
				count,
			} => Instruction::Wait {
				count,
			},
			Self::SetImage {
				image,
			} => Instruction::SetImage {
				image,
			},
			Self::SetPalette {
				palette,
			} => Instruction::SetPalette {
				palette,
			},
			Self::SetPosition {
				position,
			} => Instruction::SetPosition {
				position,
			},
			Self::SetRotation {
				rotation,
			} => Instruction::SetRotation {
				rotation,
			},
			Self::SetScale {
				mode,
				percent,
			} => Instruction::SetScale {
				mode,
				percent,
			},
			Self::SetParent {
				part,
			} => Instruction::SetParent {
				part,
			},
			Self::SetNotify {
				value,
			} => Instruction::SetNotify {
				value,
			},
			Self::SetUnknown {
				value,
			} => Instruction::SetUnknown {
				value,
			},
			Self::Label {
				..
			}
			| Self::Goto {
				..
			}
			| Self::Loop {
				..
			} => return None,
		};
		Some(instruction)
	}

	/// Builds the element mirroring a non-branch wire instruction.
	fn from_instruction(instruction: Instruction) -> Option<Self> {
		let element = match instruction {
			Instruction::Wait {
				count,
			} => Self::Wait {
				count,
			},
			Instruction::SetImage {
				image,
			} => Self::SetImage {
				image,
			},
			Instruction::SetPalette {
				palette,
			} => Self::SetPalette {
				palette,
			},
			Instruction::SetPosition {
				position,
			} => Self::SetPosition {
				position,
			},
			Instruction::SetRotation {
				rotation,
			} => Self::SetRotation {
				rotation,
			},
			Instruction::SetScale {
				mode,
				percent,
			} => Self::SetScale {
				mode,
				percent,
			},
			Instruction::SetParent {
				part,
			} => Self::SetParent {
				part,
			},
			Instruction::SetNotify {
				value,
			} => Self::SetNotify {
				value,
			},
			Instruction::SetUnknown {
				value,
			} => Self::SetUnknown {
				value,
			},
			Instruction::Goto {
				..
			}
			| Instruction::Loop {
				..
			} => return None,
		};
		Some(element)
	}
}

/// A complete linear animation program.
///
/// Owns its elements; branches relate to labels purely by [`LabelId`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearProgram {
	elements: Vec<LinearElement>,
	next_label: u32,
}

impl LinearProgram {
	/// Creates an empty program.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a program from pre-assembled elements.
	///
	/// The internal label-id allocator starts past the highest id present
	/// in `elements` (labels and branch targets alike), so subsequently
	/// allocated labels never collide.
	pub fn from_elements(elements: Vec<LinearElement>) -> Self {
		let next_label = elements
			.iter()
			.filter_map(|element| match element {
				LinearElement::Label {
					id,
					..
				} => Some(id.0),
				_ => element.branch_target().map(|id| id.0),
			})
			.max()
			.map_or(0, |max| max + 1);
		Self {
			elements,
			next_label,
		}
	}

	/// Returns the elements in program order.
	pub fn elements(&self) -> &[LinearElement] {
		&self.elements
	}

	/// Returns mutable access to the elements for structural edits.
	///
	/// After editing, call [`unresolved_branches`] to re-validate branch
	/// targets.
	///
	/// [`unresolved_branches`]: Self::unresolved_branches
	pub fn elements_mut(&mut self) -> &mut Vec<LinearElement> {
		&mut self.elements
	}

	/// Number of elements (labels included).
	pub fn len(&self) -> usize {
		self.elements.len()
	}

	/// Returns `true` if the program has no elements.
	pub fn is_empty(&self) -> bool {
		self.elements.is_empty()
	}

	/// Appends an element.
	pub fn push(&mut self, element: LinearElement) {
		self.elements.push(element);
	}

	/// Allocates a fresh label id without inserting a Label element.
	///
	/// Useful for forward references: allocate first, branch to it, then
	/// insert the Label later.
	pub fn allocate_label(&mut self) -> LabelId {
		let id = LabelId(self.next_label);
		self.next_label += 1;
		id
	}

	/// Appends a Label element with a freshly allocated id.
	pub fn push_label(&mut self, name: impl Into<String>) -> LabelId {
		let id = self.allocate_label();
		self.elements.push(LinearElement::Label {
			id,
			name: name.into(),
		});
		id
	}

	/// Returns the element index of the Label with the given id.
	pub fn label_index(&self, id: LabelId) -> Option<usize> {
		self.elements.iter().position(|element| {
			matches!(element, LinearElement::Label { id: label, .. } if *label == id)
		})
	}

	/// Returns the name of the Label with the given id.
	pub fn label_name(&self, id: LabelId) -> Option<&str> {
		self.elements.iter().find_map(|element| match element {
			LinearElement::Label {
				id: label,
				name,
			} if *label == id => Some(name.as_str()),
			_ => None,
		})
	}

	/// Re-validation pass: indices of branch elements whose target label
	/// no longer exists. Run after structural edits; a non-empty result
	/// makes [`encode`](Self::encode) fail.
	pub fn unresolved_branches(&self) -> Vec<usize> {
		let labels: HashSet<LabelId> = self
			.elements
			.iter()
			.filter_map(|element| match element {
				LinearElement::Label {
					id,
					..
				} => Some(*id),
				_ => None,
			})
			.collect();
		self.elements
			.iter()
			.enumerate()
			.filter_map(|(index, element)| {
				element.branch_target().and_then(|target| {
					(!labels.contains(&target)).then_some(index)
				})
			})
			.collect()
	}

	/// Decodes a raw word sequence into a linear program.
	///
	/// `names` optionally maps absolute word offsets to label names; it is
	/// consumed at decode time only and never required for correct
	/// execution.
	///
	/// # Errors
	///
	/// Any malformed instruction aborts decoding with the offending offset;
	/// see [`Instruction::decode`].
	pub fn decode(words: &[u16], names: &LabelNames) -> Result<Self, ScriptError> {
		let mut instructions: Vec<(usize, Instruction)> = Vec::new();
		let mut offset = 0;
		while offset < words.len() {
			let (instruction, len) = Instruction::decode(words, offset)?;
			instructions.push((offset, instruction));
			offset += len;
		}
		let total_words = offset;

		// Every distinct branch target reserves one label.
		let targets: BTreeSet<usize> = instructions
			.iter()
			.filter_map(|(_, instruction)| instruction.branch_target().map(usize::from))
			.collect();

		// Plan label placement: element index, id, and name per target.
		let mut next_label = 0u32;
		let mut label_of_target: BTreeMap<usize, LabelId> = BTreeMap::new();
		let mut labels_at_index: BTreeMap<usize, Vec<(LabelId, String)>> = BTreeMap::new();
		for &target in &targets {
			let id = LabelId(next_label);
			next_label += 1;
			label_of_target.insert(target, id);

			let (index, exact) = if target >= total_words {
				(instructions.len(), false)
			} else {
				// Index of the element whose start offset is the largest
				// one not exceeding the target.
				let index = instructions.partition_point(|(start, _)| *start <= target) - 1;
				(index, instructions[index].0 == target)
			};
			let name = if exact {
				names
					.get(&target)
					.cloned()
					.unwrap_or_else(|| synthetic_label_name(target))
			} else {
				// Mid-instruction target: clamp to the preceding boundary
				// but keep the raw offset as the name.
				synthetic_label_name(target)
			};
			labels_at_index.entry(index).or_default().push((id, name));
		}

		let mut elements = Vec::with_capacity(instructions.len() + targets.len());
		for (index, (_, instruction)) in instructions.iter().enumerate() {
			if let Some(labels) = labels_at_index.get(&index) {
				for (id, name) in labels {
					elements.push(LinearElement::Label {
						id: *id,
						name: name.clone(),
					});
				}
			}
			let element = match *instruction {
				Instruction::Goto {
					target,
				} => LinearElement::Goto {
					target: label_of_target[&usize::from(target)],
				},
				Instruction::Loop {
					target,
					count,
				} => LinearElement::Loop {
					target: label_of_target[&usize::from(target)],
					count,
				},
				other => LinearElement::from_instruction(other)
					.unwrap_or_else(|| unreachable!("non-branch instruction")),
			};
			elements.push(element);
		}
		if let Some(labels) = labels_at_index.get(&instructions.len()) {
			for (id, name) in labels {
				elements.push(LinearElement::Label {
					id: *id,
					name: name.clone(),
				});
			}
		}

		Ok(Self {
			elements,
			next_label,
		})
	}

	/// Encodes the program back into words plus a name table.
	///
	/// The returned name table contains only the offsets of labels that
	/// are still referenced by some branch; unreferenced labels are pure
	/// metadata and leave no trace in the output.
	///
	/// # Errors
	///
	/// [`ScriptError::UnresolvedLabel`] if a branch references a deleted
	/// label, [`ScriptError::TargetOutOfRange`] if a label sits past the
	/// 12-bit offset range.
	pub fn encode(&self) -> Result<(Vec<u16>, LabelNames), ScriptError> {
		// Pass 1: word offset of every element.
		let mut label_offsets: HashMap<LabelId, usize> = HashMap::new();
		let mut offset = 0usize;
		for element in &self.elements {
			if let LinearElement::Label {
				id,
				..
			} = element
			{
				label_offsets.insert(*id, offset);
			}
			offset += element.word_len();
		}

		// Pass 2: emission.
		let mut words = Vec::with_capacity(offset);
		let mut referenced: HashSet<LabelId> = HashSet::new();
		for (index, element) in self.elements.iter().enumerate() {
			match element {
				LinearElement::Label {
					..
				} => {}
				LinearElement::Goto {
					target,
				} => {
					let target_offset = self.resolve_target(&label_offsets, index, *target)?;
					referenced.insert(*target);
					Instruction::Goto {
						target: target_offset,
					}
					.encode_into(&mut words);
				}
				LinearElement::Loop {
					target,
					count,
				} => {
					let target_offset = self.resolve_target(&label_offsets, index, *target)?;
					referenced.insert(*target);
					Instruction::Loop {
						target: target_offset,
						count: *count,
					}
					.encode_into(&mut words);
				}
				other => {
					let instruction = other
						.as_instruction()
						.unwrap_or_else(|| unreachable!("state element"));
					instruction.encode_into(&mut words);
				}
			}
		}

		let mut names = LabelNames::new();
		for element in &self.elements {
			if let LinearElement::Label {
				id,
				name,
			} = element
			{
				if referenced.contains(id) {
					names.insert(label_offsets[id], name.clone());
				}
			}
		}

		Ok((words, names))
	}

	fn resolve_target(
		&self,
		label_offsets: &HashMap<LabelId, usize>,
		index: usize,
		target: LabelId,
	) -> Result<u16, ScriptError> {
		let offset = *label_offsets.get(&target).ok_or(ScriptError::UnresolvedLabel {
			index,
			label: target,
		})?;
		if offset > constants::TARGET_MAX {
			return Err(ScriptError::TargetOutOfRange {
				offset,
			});
		}
		Ok(offset as u16)
	}
}

impl std::fmt::Display for LinearProgram {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		for element in &self.elements {
			match element {
				LinearElement::Label {
					name,
					..
				} => writeln!(f, "{name}:")?,
				LinearElement::Goto {
					target,
				} => {
					writeln!(f, "\tGoto {}", self.label_name(*target).unwrap_or("<missing>"))?;
				}
				LinearElement::Loop {
					target,
					count,
				} => writeln!(
					f,
					"\tLoop {} x{}",
					self.label_name(*target).unwrap_or("<missing>"),
					count
				)?,
				other => {
					let instruction = other
						.as_instruction()
						.unwrap_or_else(|| unreachable!("state element"));
					writeln!(f, "\t{instruction}")?;
				}
			}
		}
		Ok(())
	}
}

/// Synthesizes a hexadecimal label name from a raw word offset.
fn synthetic_label_name(offset: usize) -> String {
	format!("0x{offset:04X}")
}
