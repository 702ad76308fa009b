// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Trait abstraction for feature checking
//!
//! The [`FeatureInstruction`] trait is the interface the check state needs
//! from an instruction record. It is implemented by:
//! - Binary: `DecodedInstruction` (in verifier)
//! - Tests: hand-built records with a fixed feature set

use crate::{CpuFeatures, x86};

/// Information about an instruction needed for CPU feature checking.
///
/// # Requirements
///
/// Every item in the instruction stream must be one complete, decoded
/// instruction. `location` must be stable for the lifetime of the check so
/// diagnostics point back into the original code.
///
/// # Default Implementations
///
/// [`required_features`](Self::required_features) classifies
/// [`encoding`](Self::encoding) with [`x86::classify`], so every instruction
/// source shares one classification table.
pub trait FeatureInstruction {
    /// Byte offset of this instruction within the code being validated.
    fn location(&self) -> usize;

    /// Mnemonic, for diagnostics.
    fn mnemonic(&self) -> &str;

    /// Raw encoding bytes of this instruction.
    fn encoding(&self) -> &[u8];

    /// CPU features this instruction needs in order to execute.
    #[inline]
    fn required_features(&self) -> CpuFeatures {
        x86::classify(self.encoding())
    }
}
