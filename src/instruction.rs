//! Animation bytecode instruction codec.
//!
//! An animation program is an ordered sequence of 16-bit words. The high
//! nibble of the first word selects the opcode; the remaining bits and any
//! following words hold the operands:
//!
//! | Opcode | Words | Meaning |
//! |--------|-------|---------|
//! | `0x0`  | 1 | Wait: low 12 bits = tick count; 0 decodes to 4095 |
//! | `0x1`  | 1 | `SetImage`: low 12 bits sign-extended; negative = no image |
//! | `0x2`  | 1 | Goto: low 12 bits = absolute word offset |
//! | `0x3`  | 4 | `SetPosition`: bit 0 = flag; words 1-3 = signed dx, dy, dz |
//! | `0x4`  | 3 | `SetRotation`: low 12 bits sign-extended = rx; words 1-2 = ry, rz |
//! | `0x5`  | 2 | `SetScale`: low 12 bits = axis mode; word 1 = percent |
//! | `0x6`  | 1 | `SetPalette`: low 12 bits sign-extended; negative = default |
//! | `0x7`  | 2 | Loop: low 12 bits = target word offset; word 1 = repeat count |
//! | `0x80` | 1 | `SetUnknown`: low byte = value |
//! | `0x81` | 1 | `SetParent`: low byte = sibling part index |
//! | `0x82` | 1 | `SetNotify`: low byte = value |
//!
//! Every other top-nibble or `0x8` sub-type combination is a malformed
//! program and fails decoding with the offending word offset. Encoding is
//! the exact inverse of decoding at the instruction level; at the program
//! level a decode/encode round trip may move labels around but always
//! preserves execution behavior.
//!
//! # Examples
//!
//! ```
//! use partanim::instruction::Instruction;
//! use partanim::value::ResourceRef;
//!
//! let words = [0x1002, 0x0004];
//! let (instr, len) = Instruction::decode(&words, 0)?;
//! assert_eq!(instr, Instruction::SetImage { image: ResourceRef::Index(2) });
//! assert_eq!(len, 1);
//!
//! let (wait, _) = Instruction::decode(&words, 1)?;
//! assert_eq!(wait, Instruction::Wait { count: 4 });
//! # Ok::<(), partanim::ScriptError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::ScriptError;
use crate::value::{PositionDelta, ResourceRef, Rotation, ScaleMode, sign_extend_12};

/// One decoded animation bytecode instruction.
///
/// Instructions are immutable value types; the linear program model wraps
/// them with symbolic labels, the keyframe model regroups them into timed
/// bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
	/// Hold the current state for `count` ticks (1..=4095).
	Wait {
		/// Hold duration. An encoded count of 0 decodes as 4095.
		count: u16,
	},

	/// Select the part's active image.
	SetImage {
		/// Image catalog reference.
		image: ResourceRef,
	},

	/// Branch to an absolute word offset.
	Goto {
		/// Absolute word offset of the branch target.
		target: u16,
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

	/// Select the part's active palette.
	SetPalette {
		/// Palette catalog reference.
		palette: ResourceRef,
	},

	/// Branch to an absolute word offset a bounded number of times.
	Loop {
		/// Absolute word offset of the loop body start.
		target: u16,
		/// Extra repeats; the body runs `count + 1` times in total.
		count: u16,
	},

	/// Set the byte of runtime state whose purpose the original engine
	/// never revealed. Carried verbatim so programs round-trip.
	SetUnknown {
		/// Raw byte value.
		value: u8,
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
}

impl Instruction {
	/// Number of 16-bit words this instruction occupies.
	pub fn word_len(&self) -> usize {
		match self {
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

	/// Returns `true` for the branch instructions (Goto and Loop).
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

	/// Returns the absolute word offset a branch instruction targets.
	pub fn branch_target(&self) -> Option<u16> {
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

	/// Decodes one instruction starting at `offset` words into `words`.
	///
	/// Returns the instruction and the number of words it consumed.
	///
	/// # Errors
	///
	/// [`ScriptError::UnknownOpcode`] for unassigned top nibbles or `0x8`
	/// sub-types, [`ScriptError::InvalidScaleMode`] for a `SetScale` mode
	/// above 3, and [`ScriptError::TruncatedInstruction`] when a multi-word
	/// instruction runs past the end of the program.
	pub fn decode(words: &[u16], offset: usize) -> Result<(Self, usize), ScriptError> {
		let Some(&word) = words.get(offset) else {
			return Err(ScriptError::TruncatedInstruction {
				offset,
				needed: 1,
				available: 0,
			});
		};
		let opcode = word >> 12;
		let operand = word & constants::OPERAND_MASK;

		let instruction = match opcode {
			constants::OP_WAIT => {
				let count = if operand == 0 { constants::WAIT_MAX } else { operand };
				Self::Wait {
					count,
				}
			}
			constants::OP_SET_IMAGE => Self::SetImage {
				image: ResourceRef::from_operand(operand),
			},
			constants::OP_GOTO => Self::Goto {
				target: operand,
			},
			constants::OP_SET_POSITION => {
				let rest = Self::operands(words, offset, 4)?;
				Self::SetPosition {
					position: PositionDelta::new(
						operand & 1 != 0,
						rest[0] as i16,
						rest[1] as i16,
						rest[2] as i16,
					),
				}
			}
			constants::OP_SET_ROTATION => {
				let rest = Self::operands(words, offset, 3)?;
				Self::SetRotation {
					rotation: Rotation::new(sign_extend_12(operand), rest[0] as i16, rest[1] as i16),
				}
			}
			constants::OP_SET_SCALE => {
				let rest = Self::operands(words, offset, 2)?;
				let mode = ScaleMode::from_operand(operand).ok_or(ScriptError::InvalidScaleMode {
					offset,
					mode: operand,
				})?;
				Self::SetScale {
					mode,
					percent: rest[0],
				}
			}
			constants::OP_SET_PALETTE => Self::SetPalette {
				palette: ResourceRef::from_operand(operand),
			},
			constants::OP_LOOP => {
				let rest = Self::operands(words, offset, 2)?;
				Self::Loop {
					target: operand,
					count: rest[0],
				}
			}
			constants::OP_BYTE => {
				let value = (word & 0x00FF) as u8;
				match (word >> 8) & 0x0F {
					constants::SUB_SET_UNKNOWN => Self::SetUnknown {
						value,
					},
					constants::SUB_SET_PARENT => Self::SetParent {
						part: value,
					},
					constants::SUB_SET_NOTIFY => Self::SetNotify {
						value,
					},
					_ => {
						return Err(ScriptError::UnknownOpcode {
							offset,
							word,
						});
					}
				}
			}
			_ => {
				return Err(ScriptError::UnknownOpcode {
					offset,
					word,
				});
			}
		};

		Ok((instruction, instruction.word_len()))
	}

	/// Encodes the instruction, appending its words to `out`.
	pub fn encode_into(&self, out: &mut Vec<u16>) {
		match self {
			Self::Wait {
				count,
			} => out.push((constants::OP_WAIT << 12) | (count & constants::OPERAND_MASK)),
			Self::SetImage {
				image,
			} => out.push((constants::OP_SET_IMAGE << 12) | image.to_operand()),
			Self::Goto {
				target,
			} => out.push((constants::OP_GOTO << 12) | (target & constants::OPERAND_MASK)),
			Self::SetPosition {
				position,
			} => {
				out.push((constants::OP_SET_POSITION << 12) | u16::from(position.flag));
				out.push(position.dx as u16);
				out.push(position.dy as u16);
				out.push(position.dz as u16);
			}
			Self::SetRotation {
				rotation,
			} => {
				out.push(
					(constants::OP_SET_ROTATION << 12)
						| (rotation.rx as u16 & constants::OPERAND_MASK),
				);
				out.push(rotation.ry as u16);
				out.push(rotation.rz as u16);
			}
			Self::SetScale {
				mode,
				percent,
			} => {
				out.push((constants::OP_SET_SCALE << 12) | mode.to_operand());
				out.push(*percent);
			}
			Self::SetPalette {
				palette,
			} => out.push((constants::OP_SET_PALETTE << 12) | palette.to_operand()),
			Self::Loop {
				target,
				count,
			} => {
				out.push((constants::OP_LOOP << 12) | (target & constants::OPERAND_MASK));
				out.push(*count);
			}
			Self::SetUnknown {
				value,
			} => out.push((constants::OP_BYTE << 12) | (constants::SUB_SET_UNKNOWN << 8) | u16::from(*value)),
			Self::SetParent {
				part,
			} => out.push((constants::OP_BYTE << 12) | (constants::SUB_SET_PARENT << 8) | u16::from(*part)),
			Self::SetNotify {
				value,
			} => out.push((constants::OP_BYTE << 12) | (constants::SUB_SET_NOTIFY << 8) | u16::from(*value)),
		}
	}

	/// Reads the trailing operand words of a multi-word instruction.
	fn operands(words: &[u16], offset: usize, needed: usize) -> Result<&[u16], ScriptError> {
		let available = words.len() - offset;
		if available < needed {
			return Err(ScriptError::TruncatedInstruction {
				offset,
				needed,
				available,
			});
		}
		Ok(&words[offset + 1..offset + needed])
	}
}

impl std::fmt::Display for Instruction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Wait {
				count,
			} => write!(f, "Wait({count})"),
			Self::SetImage {
				image,
			} => write!(f, "SetImage({image})"),
			Self::Goto {
				target,
			} => write!(f, "Goto({target:#06X})"),
			Self::SetPosition {
				position,
			} => write!(
				f,
				"SetPosition(flag={}, {}, {}, {})",
				position.flag, position.dx, position.dy, position.dz
			),
			Self::SetRotation {
				rotation,
			} => write!(f, "SetRotation({}, {}, {})", rotation.rx, rotation.ry, rotation.rz),
			Self::SetScale {
				mode,
				percent,
			} => write!(f, "SetScale({mode:?}, {percent}%)"),
			Self::SetPalette {
				palette,
			} => write!(f, "SetPalette({palette})"),
			Self::Loop {
				target,
				count,
			} => write!(f, "Loop({target:#06X}, {count})"),
			Self::SetUnknown {
				value,
			} => write!(f, "SetUnknown({value})"),
			Self::SetParent {
				part,
			} => write!(f, "SetParent({part})"),
			Self::SetNotify {
				value,
			} => write!(f, "SetNotify({value})"),
		}
	}
}
