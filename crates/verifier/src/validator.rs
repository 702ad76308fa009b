// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! CPU feature validation of x86-64 code segments
//!
//! Provides [`Validator`], which owns the diagnostic sink for one run and
//! scopes a [`CpuCheckState`] to it.

use cpu_features::FeaturePolicy;
use log::info;

use crate::{
    DecodedInstruction,
    cpu_check::CpuCheckState,
    decode::Instructions,
    error::{DecodeError, VerificationResult},
};

/// Validator for x86-64 native code
pub struct Validator<'a> {
    instructions: &'a [DecodedInstruction],
    policy: &'a FeaturePolicy,
}

impl<'a> Validator<'a> {
    /// Create a validator for already-decoded instructions.
    pub fn new(instructions: &'a [DecodedInstruction], policy: &'a FeaturePolicy) -> Self {
        Self {
            instructions,
            policy,
        }
    }

    /// Run the CPU feature check over every instruction
    pub fn verify(&self) -> VerificationResult {
        let mut result = VerificationResult::default();
        let mut state = CpuCheckState::new(self.policy);

        for instruction in self.instructions {
            state.check(instruction, &mut result);
        }

        finish(&state, &mut result, self.instructions.len());
        result
    }

    /// Decode and check `code` in one pass.
    ///
    /// A decode error aborts the run; diagnostics gathered before it are
    /// discarded.
    pub fn verify_code(
        code: &[u8],
        policy: &FeaturePolicy,
    ) -> Result<VerificationResult, DecodeError> {
        let mut result = VerificationResult::default();
        let mut state = CpuCheckState::new(policy);
        let mut count = 0;

        for instruction in Instructions::new(code) {
            state.check(&instruction?, &mut result);
            count += 1;
        }

        finish(&state, &mut result, count);
        Ok(result)
    }
}

fn finish(state: &CpuCheckState<'_>, result: &mut VerificationResult, count: usize) {
    result.set_required_features(state.observed());
    info!(
        "checked {count} instructions: requires [{}], {} unsupported",
        state.observed(),
        result.errors().len()
    );
}
