//! Animation bytecode constants.
//!
//! Opcode values, operand widths, and interpreter safety limits shared by
//! the codec, the two program models, and the interpreters.

/// Opcode for the Wait instruction (hold current state for N ticks).
pub const OP_WAIT: u16 = 0x0;

/// Opcode for the `SetImage` instruction.
pub const OP_SET_IMAGE: u16 = 0x1;

/// Opcode for the Goto instruction (absolute word-offset branch).
pub const OP_GOTO: u16 = 0x2;

/// Opcode for the `SetPosition` instruction (4 words).
pub const OP_SET_POSITION: u16 = 0x3;

/// Opcode for the `SetRotation` instruction (3 words).
pub const OP_SET_ROTATION: u16 = 0x4;

/// Opcode for the `SetScale` instruction (2 words).
pub const OP_SET_SCALE: u16 = 0x5;

/// Opcode for the `SetPalette` instruction.
pub const OP_SET_PALETTE: u16 = 0x6;

/// Opcode for the Loop instruction (2 words: target offset + repeat count).
pub const OP_LOOP: u16 = 0x7;

/// Opcode shared by the byte-operand instructions; bits 8-11 select the
/// sub-type (see [`SUB_SET_UNKNOWN`], [`SUB_SET_PARENT`], [`SUB_SET_NOTIFY`]).
pub const OP_BYTE: u16 = 0x8;

/// Sub-type of [`OP_BYTE`] for `SetUnknown` (0x80xx).
pub const SUB_SET_UNKNOWN: u16 = 0x0;

/// Sub-type of [`OP_BYTE`] for `SetParent` (0x81xx).
pub const SUB_SET_PARENT: u16 = 0x1;

/// Sub-type of [`OP_BYTE`] for `SetNotify` (0x82xx).
pub const SUB_SET_NOTIFY: u16 = 0x2;

/// Mask selecting the 12-bit operand of a single-word instruction.
pub const OPERAND_MASK: u16 = 0x0FFF;

/// Maximum Wait count / keyframe duration. An encoded Wait count of zero
/// decodes to this value.
pub const WAIT_MAX: u16 = 0x0FFF;

/// Largest word offset a Goto/Loop instruction can encode.
pub const TARGET_MAX: usize = 0x0FFF;

/// Default scale percentage for every axis.
pub const SCALE_DEFAULT: u16 = 100;

/// Default cap on elements executed within a single interpreter step.
///
/// A program that never reaches a Wait (or a keyframe with a non-zero
/// duration) would otherwise spin `step()` forever.
pub const DEFAULT_STEP_CAP: usize = 1024;

/// Default cap on iterations of the timing analyzer walk.
pub const DEFAULT_TIMING_CAP: usize = 1024;
