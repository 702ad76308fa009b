// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! CPU feature model for x86-64 sandbox validation
//!
//! This crate provides:
//! - **Feature enumeration**: a closed, canonically ordered set of ISA
//!   extensions and a compact bitset over it
//! - **Policies**: the permitted-feature set of a sandbox target, usually
//!   built from an x86-64 micro-architecture level
//! - **Encoding classification**: which features an instruction encoding
//!   requires
//!
//! # Modules
//!
//! - [`policy`]: `FeaturePolicy` and micro-architecture levels
//! - [`x86`]: Opcode classification table
//! - [`traits`]: `FeatureInstruction` trait

mod feature;
pub mod policy;
pub mod traits;
pub mod x86;

pub use feature::{CpuFeature, CpuFeatures};
pub use policy::{FeaturePolicy, MicroarchLevel, PolicyError};
pub use traits::FeatureInstruction;
