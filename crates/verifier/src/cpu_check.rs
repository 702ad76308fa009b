// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! CPU feature compatibility checking
//!
//! [`CpuCheckState`] tracks, for one validation run, which unsupported
//! features have already been reported. Every instruction is checked against
//! the policy, but each unsupported feature is reported only once, at the
//! first instruction that needs it.

use cpu_features::{CpuFeatures, FeatureInstruction, FeaturePolicy};
use log::{debug, trace};

use crate::error::{VerificationError, VerificationResult};

/// Per-run feature-requirement state.
///
/// Created at the start of validating one code segment and dropped at the end.
/// The reported flags only ever go from unset to set.
#[derive(Debug)]
pub struct CpuCheckState<'a> {
    policy: &'a FeaturePolicy,
    /// Unsupported features that already have a diagnostic
    reported: CpuFeatures,
    /// Every feature required so far, permitted or not
    observed: CpuFeatures,
}

impl<'a> CpuCheckState<'a> {
    pub fn new(policy: &'a FeaturePolicy) -> Self {
        Self {
            policy,
            reported: CpuFeatures::empty(),
            observed: CpuFeatures::empty(),
        }
    }

    /// Check one instruction, pushing a diagnostic to `result` for every
    /// unsupported feature not reported earlier in this run.
    ///
    /// Diagnostics for a multi-feature instruction follow canonical feature
    /// order.
    pub fn check<I: FeatureInstruction>(&mut self, instruction: &I, result: &mut VerificationResult) {
        let required = instruction.required_features();
        if required.is_empty() {
            return;
        }
        self.observed |= required;

        for feature in required.iter() {
            if self.policy.permits(feature) {
                continue;
            }

            if self.reported.contains(feature) {
                trace!(
                    "{:#x}: {} requires {feature} (already reported)",
                    instruction.location(),
                    instruction.mnemonic()
                );
                continue;
            }

            debug!(
                "{:#x}: {} requires unsupported feature {feature}",
                instruction.location(),
                instruction.mnemonic()
            );
            self.reported.insert(feature);
            result.extend([VerificationError::UnsupportedCpuFeature {
                offset: instruction.location(),
                mnemonic: instruction.mnemonic().to_string(),
                feature,
            }]);
        }
    }

    /// Unsupported features reported so far.
    pub fn reported(&self) -> CpuFeatures {
        self.reported
    }

    /// Features required by every instruction checked so far.
    pub fn observed(&self) -> CpuFeatures {
        self.observed
    }
}
