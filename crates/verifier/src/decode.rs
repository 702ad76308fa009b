// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! x86-64 instruction decoding
//!
//! Splits raw code into structured x86-64 instructions using the `yaxpeax-x86`
//! crate. Each record keeps its exact encoding bytes so feature classification
//! sees what the CPU will execute.

use cpu_features::FeatureInstruction;
use yaxpeax_arch::{Decoder, LengthedInstruction, U8Reader};
use yaxpeax_x86::long_mode::{InstDecoder, Instruction, Opcode};

use crate::error::DecodeError;

/// A decoded instruction with its location information
#[derive(Debug)]
pub struct DecodedInstruction {
    /// Offset from start of code section (in bytes)
    pub offset: usize,
    /// The raw encoding, prefixes included
    bytes: Vec<u8>,
    /// The decoded instruction
    pub instruction: Instruction,
    /// Mnemonic string (for FeatureInstruction trait)
    mnemonic: String,
}

impl DecodedInstruction {
    /// Returns the opcode of this instruction
    pub fn opcode(&self) -> Opcode {
        self.instruction.opcode()
    }
}

impl FeatureInstruction for DecodedInstruction {
    fn location(&self) -> usize {
        self.offset
    }

    fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    fn encoding(&self) -> &[u8] {
        &self.bytes
    }
}

/// Streaming decoder over a code segment.
///
/// Yields instructions in address order. After the first decode error the
/// iterator is exhausted.
pub struct Instructions<'a> {
    code: &'a [u8],
    offset: usize,
    decoder: InstDecoder,
    failed: bool,
}

impl<'a> Instructions<'a> {
    pub fn new(code: &'a [u8]) -> Self {
        Self {
            code,
            offset: 0,
            decoder: InstDecoder::default(),
            failed: false,
        }
    }
}

impl Iterator for Instructions<'_> {
    type Item = Result<DecodedInstruction, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.code.len() {
            return None;
        }

        let offset = self.offset;
        let remaining = &self.code[offset..];
        let mut reader = U8Reader::new(remaining);

        let instruction = match self.decoder.decode(&mut reader) {
            Ok(instruction) => instruction,
            Err(e) => {
                self.failed = true;
                return Some(Err(DecodeError::InvalidInstruction {
                    offset,
                    message: format!("{:?}", e),
                }));
            }
        };

        let length = instruction.len().to_const() as usize;
        if length == 0 || length > remaining.len() {
            self.failed = true;
            return Some(Err(DecodeError::InvalidInstruction {
                offset,
                message: format!("bad instruction length {length}"),
            }));
        }

        self.offset += length;
        let mnemonic = instruction.opcode().to_string();
        Some(Ok(DecodedInstruction {
            offset,
            bytes: remaining[..length].to_vec(),
            instruction,
            mnemonic,
        }))
    }
}

/// Decode all instructions from a byte slice
///
/// Returns the first decode error if any instruction is malformed or the code
/// ends in the middle of an instruction.
pub fn decode_instructions(code: &[u8]) -> Result<Vec<DecodedInstruction>, DecodeError> {
    Instructions::new(code).collect()
}

/// Test-only wrapper that panics on decode failure.
#[cfg(test)]
pub(crate) fn decode_instructions_unchecked(code: &[u8]) -> Vec<DecodedInstruction> {
    decode_instructions(code).expect("decode failed")
}

#[cfg(test)]
mod tests {
    use cpu_features::{CpuFeature, CpuFeatures, FeatureInstruction};
    use yaxpeax_x86::long_mode::Opcode;

    use super::{Instructions, decode_instructions_unchecked as decode};
    use crate::DecodeError;

    #[test]
    fn test_decode_nop() {
        let instructions = decode(&[0x90]);

        assert_eq!(instructions.len(), 1);
        assert_eq!(instructions[0].opcode(), Opcode::NOP);
        assert_eq!(instructions[0].offset, 0);
        assert_eq!(instructions[0].mnemonic(), "nop");
        assert!(instructions[0].required_features().is_empty());
    }

    #[test]
    fn test_variable_length_offsets() {
        let code = [
            0x90, // nop
            0x48, 0x89, 0xc8, // mov rax, rcx
            0xf3, 0x0f, 0xb8, 0xc1, // popcnt eax, ecx
            0xc3, // ret
        ];
        let instructions = decode(&code);

        let offsets: Vec<_> = instructions.iter().map(|i| i.offset).collect();
        assert_eq!(offsets, vec![0, 1, 4, 8]);
        assert_eq!(instructions[2].encoding(), &[0xf3, 0x0f, 0xb8, 0xc1]);
    }

    #[test]
    fn test_required_features_from_encoding() {
        let code = [
            0x0f, 0xbd, 0xc1, // bsr eax, ecx
            0xf3, 0x0f, 0xbd, 0xc1, // lzcnt eax, ecx
        ];
        let instructions = decode(&code);

        assert_eq!(instructions[0].opcode(), Opcode::BSR);
        assert!(instructions[0].required_features().is_empty());

        assert_eq!(instructions[1].opcode(), Opcode::LZCNT);
        assert_eq!(
            instructions[1].required_features(),
            CpuFeatures::from(CpuFeature::Lzcnt)
        );
    }

    #[test]
    fn test_decode_vex() {
        // vpaddd ymm0, ymm0, ymm1
        let instructions = decode(&[0xc5, 0xfd, 0xfe, 0xc1]);

        assert_eq!(instructions.len(), 1);
        assert_eq!(
            instructions[0].required_features(),
            CpuFeatures::from_slice(&[CpuFeature::Avx, CpuFeature::Avx2])
        );
    }

    #[test]
    fn test_truncated_instruction_error() {
        // nop, then an escape byte with nothing after it
        let code = [0x90, 0x0f];
        let result = crate::decode_instructions(&code);

        assert!(matches!(
            result,
            Err(DecodeError::InvalidInstruction { offset: 1, .. })
        ));
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let mut instructions = Instructions::new(&[0x90, 0x0f]);

        assert!(matches!(instructions.next(), Some(Ok(_))));
        assert!(matches!(instructions.next(), Some(Err(_))));
        assert!(instructions.next().is_none());
    }

    #[test]
    fn test_empty_code() {
        assert!(decode(&[]).is_empty());
    }
}
