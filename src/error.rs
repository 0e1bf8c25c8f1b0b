//! Error types for animation bytecode decoding, encoding, and conversion.

use thiserror::Error;

use crate::linear::LabelId;

/// Errors that can occur when decoding or encoding animation programs.
#[derive(Debug, Error)]
pub enum ScriptError {
	/// The top nibble (or 0x8 sub-type) of an instruction word does not
	/// name any known instruction.
	#[error("Unknown opcode: word {word:#06X} at word offset {offset:#06X}")]
	UnknownOpcode {
		/// Word offset of the offending instruction
		offset: usize,
		/// The raw instruction word
		word: u16,
	},

	/// A `SetScale` instruction carries a mode operand outside 0..=3.
	#[error("Invalid scale mode {mode} at word offset {offset:#06X}")]
	InvalidScaleMode {
		/// Word offset of the offending instruction
		offset: usize,
		/// The raw mode operand
		mode: u16,
	},

	/// A multi-word instruction extends past the end of the program.
	#[error(
		"Truncated instruction at word offset {offset:#06X}: needs {needed} words, {available} remain"
	)]
	TruncatedInstruction {
		/// Word offset of the offending instruction
		offset: usize,
		/// Number of words the instruction requires
		needed: usize,
		/// Number of words remaining in the program
		available: usize,
	},

	/// A Goto/Loop element references a label that no longer exists in the
	/// program. Tolerated in the model, fatal at encode time.
	#[error("Branch at element {index} references missing label {label}")]
	UnresolvedLabel {
		/// Index of the branching element
		index: usize,
		/// The dangling label id
		label: LabelId,
	},

	/// A branch target's word offset does not fit the 12-bit operand field.
	#[error("Branch target offset {offset:#06X} exceeds the 12-bit operand range")]
	TargetOutOfRange {
		/// The unencodable word offset
		offset: usize,
	},
}
