// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! CPU feature verifier for x86-64 binaries
//!
//! Checks that sandboxed machine code only uses CPU capabilities the target
//! execution environment is guaranteed to provide. Code that executes an
//! instruction from a missing extension would fault (`#UD`) or, for aliased
//! encodings such as `lzcnt`/`bsr`, silently compute something else.
//!
//! # Verification Checklist
//!
//! | Check | Description |
//! |-------|-------------|
//! | **Decodability** | Every byte belongs to a well-formed x86-64 instruction |
//! | **CPU features** | Every required feature is permitted by the [`FeaturePolicy`] |
//!
//! Each unsupported feature is reported once, at the first instruction that
//! requires it. All diagnostics are hard errors.
//!
//! # Usage
//!
//! ```
//! use verifier::{FeaturePolicy, Validator};
//!
//! let policy: FeaturePolicy = "x86-64-v2".parse().unwrap();
//! // popcnt eax, ecx
//! let result = Validator::verify_code(&[0xf3, 0x0f, 0xb8, 0xc1], &policy).unwrap();
//! assert!(result.is_ok());
//! ```

mod cpu_check;
mod decode;
mod error;
mod load;
mod validator;

pub use cpu_check::CpuCheckState;
pub use cpu_features::{CpuFeature, CpuFeatures, FeaturePolicy, MicroarchLevel, PolicyError};
pub use decode::{DecodedInstruction, Instructions, decode_instructions};
pub use error::{DecodeError, LoadError, VerificationError, VerificationResult};
pub use load::{CODE_SECTIONS, code_section};
pub use validator::Validator;
