// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for CPU feature verification

use cpu_features::{CpuFeature, CpuFeatures};
use thiserror::Error;

/// Errors that abort decoding of a code segment
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid instruction at offset {offset:#x}: {message}")]
    InvalidInstruction { offset: usize, message: String },
}

/// Errors locating the code section of an object file
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to parse object file: {0}")]
    Parse(object::Error),

    #[error("no code section found (expected .text or __text)")]
    MissingCodeSection,

    #[error("failed to read code section: {0}")]
    SectionData(object::Error),
}

/// Errors discovered during verification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("unsupported cpu feature at {offset:#x}: {mnemonic} requires {feature}")]
    UnsupportedCpuFeature {
        offset: usize,
        mnemonic: String,
        feature: CpuFeature,
    },
}

/// Result of verification containing any errors found
#[derive(Debug, Default)]
pub struct VerificationResult {
    errors: Vec<VerificationError>,
    required: CpuFeatures,
}

impl VerificationResult {
    /// Returns true if verification passed with no errors
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the list of verification errors
    pub fn errors(&self) -> &[VerificationError] {
        &self.errors
    }

    /// Consumes the result and returns the errors
    pub fn into_errors(self) -> Vec<VerificationError> {
        self.errors
    }

    /// Every feature required by the checked code, permitted or not
    pub fn required_features(&self) -> CpuFeatures {
        self.required
    }

    pub(crate) fn extend(&mut self, errors: impl IntoIterator<Item = VerificationError>) {
        self.errors.extend(errors);
    }

    pub(crate) fn set_required_features(&mut self, required: CpuFeatures) {
        self.required = required;
    }
}
